//! Create/update/delete behaviors for the bucket-name custom resource.
//!
//! Only Create does any work: it reads `bucket_prefix`, appends a random token,
//! lowercases the result and stores it under `bucket_name`. Update and Delete
//! never fail, so stack teardown is never blocked by this resource.

use rand::rngs::OsRng;
use rand::RngCore;

use crate::contract::{LifecycleEvent, RequestType, ResponseData, BUCKET_NAME_FIELD};
use crate::error::BucketNameError;
use crate::token::generate_token_with;

const COMPONENT: &str = "lifecycle_handler";

pub fn build_bucket_name(prefix: &str, token: &str) -> String {
    format!("{prefix}-{token}").to_lowercase()
}

pub fn on_create(event: &LifecycleEvent, data: &mut ResponseData) -> Result<(), BucketNameError> {
    on_create_with_rng(event, data, &mut OsRng)
}

pub fn on_create_with_rng(
    event: &LifecycleEvent,
    data: &mut ResponseData,
    rng: &mut impl RngCore,
) -> Result<(), BucketNameError> {
    tracing::info!(
        component = COMPONENT,
        event = "bucket_name_requested",
        request_id = %event.request_id,
        "Received request to build a random bucket name"
    );

    let prefix = event.bucket_prefix()?;
    let token = generate_token_with(rng)?;
    let bucket_name = build_bucket_name(prefix, &token);

    tracing::info!(
        component = COMPONENT,
        event = "bucket_name_generated",
        request_id = %event.request_id,
        bucket_name = %bucket_name,
    );
    data.set(BUCKET_NAME_FIELD, bucket_name);
    Ok(())
}

pub fn on_update(event: &LifecycleEvent, _data: &mut ResponseData) {
    tracing::debug!(
        component = COMPONENT,
        event = "update_ignored",
        request_id = %event.request_id,
    );
}

pub fn on_delete(event: &LifecycleEvent, _data: &mut ResponseData) {
    tracing::debug!(
        component = COMPONENT,
        event = "delete_ignored",
        request_id = %event.request_id,
    );
}

pub fn dispatch(event: &LifecycleEvent, data: &mut ResponseData) -> Result<(), BucketNameError> {
    dispatch_with_rng(event, data, &mut OsRng)
}

/// Runs exactly one behavior for the event's request type.
///
/// Create failures are logged at error level and returned unchanged.
pub fn dispatch_with_rng(
    event: &LifecycleEvent,
    data: &mut ResponseData,
    rng: &mut impl RngCore,
) -> Result<(), BucketNameError> {
    match event.request_type {
        RequestType::Create => on_create_with_rng(event, data, rng).inspect_err(|error| {
            tracing::error!(
                component = COMPONENT,
                event = "create_failed",
                request_id = %event.request_id,
                error = %error,
            );
        }),
        RequestType::Update => {
            on_update(event, data);
            Ok(())
        }
        RequestType::Delete => {
            on_delete(event, data);
            Ok(())
        }
    }
}
