//! Bucket-name custom resource domain.
//!
//! This crate owns the lifecycle event contract, the random token generator,
//! and the create/update/delete behaviors. It intentionally excludes the Lambda
//! runtime and the CloudFormation response transport.

pub mod contract;
pub mod error;
pub mod lifecycle;
pub mod token;
