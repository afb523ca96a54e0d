pub mod response_sender;
