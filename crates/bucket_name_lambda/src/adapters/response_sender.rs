/// Delivers a serialized custom-resource response to CloudFormation.
pub trait ResponseSender {
    fn send_response(&self, url: &str, body: &[u8]) -> Result<(), String>;
}

impl<F> ResponseSender for F
where
    F: Fn(&str, &[u8]) -> Result<(), String>,
{
    fn send_response(&self, url: &str, body: &[u8]) -> Result<(), String> {
        self(url, body)
    }
}
