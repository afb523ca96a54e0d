//! Lambda integration for the bucket-name custom resource.
//!
//! This crate owns runtime integration details (the CloudFormation response
//! document, its delivery to the pre-signed `ResponseURL`, logging and
//! environment configuration). Naming behavior lives in `bucket_name_core`.

pub mod adapters;
pub mod config;
pub mod handlers;
pub mod logging;
