use std::time::{Duration, SystemTime, UNIX_EPOCH};

use bucket_name_core::contract::{LifecycleEvent, RequestType, ResponseData};
use bucket_name_core::error::BucketNameError;
use bucket_name_core::lifecycle::dispatch_with_rng;
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::adapters::response_sender::ResponseSender;

const COMPONENT: &str = "custom_resource";
const PHYSICAL_ID_SUFFIX_LENGTH: usize = 8;
const PHYSICAL_ID_ALPHABET: &[u8; 62] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
const PHYSICAL_ID_REJECTION_BOUND: u8 =
    (256 / PHYSICAL_ID_ALPHABET.len() * PHYSICAL_ID_ALPHABET.len()) as u8;

/// Time kept in reserve to report `FAILED` before the Lambda deadline.
pub const DEADLINE_MARGIN: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum ResponseStatus {
    Success,
    Failed,
}

impl ResponseStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::Failed => "FAILED",
        }
    }
}

/// The document CloudFormation expects at the pre-signed `ResponseURL`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct CustomResourceResponse {
    pub status: ResponseStatus,
    pub reason: String,
    pub physical_resource_id: String,
    pub stack_id: String,
    pub request_id: String,
    pub logical_resource_id: String,
    pub data: ResponseData,
}

/// Per-invocation details supplied by the Lambda runtime.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvocationContext {
    pub aws_request_id: String,
    pub log_stream_name: String,
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("malformed custom resource event: {0}")]
    MalformedEvent(String),
    #[error("failed to serialize custom resource response: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("failed to deliver custom resource response: {0}")]
    Delivery(String),
}

/// Parses and handles a raw event.
///
/// An event that does not parse is still answered with `FAILED` whenever it
/// carries a `ResponseURL`; only URL-less events become `MalformedEvent`.
pub fn handle_custom_resource_event(
    payload: Value,
    invocation: &InvocationContext,
    sender: &dyn ResponseSender,
) -> Result<CustomResourceResponse, TransportError> {
    match LifecycleEvent::deserialize(&payload) {
        Ok(event) => handle_lifecycle_event(&event, invocation, sender, &mut OsRng),
        Err(error) => {
            let reason = format!("malformed custom resource event: {error}");
            tracing::error!(
                component = COMPONENT,
                event = "malformed_event",
                aws_request_id = %invocation.aws_request_id,
                error = %error,
            );
            report_raw_failure(&payload, &reason, sender)
        }
    }
}

/// Dispatches the event, then reports the outcome to CloudFormation.
///
/// A failed Create is still a successful delivery: the returned response
/// carries `FAILED` and the error text as `Reason`.
pub fn handle_lifecycle_event(
    event: &LifecycleEvent,
    invocation: &InvocationContext,
    sender: &dyn ResponseSender,
    rng: &mut impl RngCore,
) -> Result<CustomResourceResponse, TransportError> {
    if event.response_url.trim().is_empty() {
        return Err(TransportError::MalformedEvent(
            "ResponseURL is required".to_string(),
        ));
    }

    tracing::info!(
        component = COMPONENT,
        event = "request_received",
        request_type = event.request_type.as_str(),
        request_id = %event.request_id,
        logical_resource_id = %event.logical_resource_id,
        aws_request_id = %invocation.aws_request_id,
    );

    let mut data = ResponseData::new();
    let outcome = dispatch_with_rng(event, &mut data, rng);
    let response = build_response(event, &outcome, data, invocation, rng);
    deliver(&event.response_url, response, sender)
}

/// Best-effort `FAILED` answer built straight from the raw payload.
///
/// Used when the event cannot be parsed or the invocation is about to time
/// out. Without a `ResponseURL` there is nobody to answer.
pub fn report_raw_failure(
    payload: &Value,
    reason: &str,
    sender: &dyn ResponseSender,
) -> Result<CustomResourceResponse, TransportError> {
    let field = |name: &str| {
        payload
            .get(name)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };

    let response_url = field("ResponseURL");
    if response_url.trim().is_empty() {
        return Err(TransportError::MalformedEvent(reason.to_string()));
    }

    let stack_id = field("StackId");
    let logical_resource_id = field("LogicalResourceId");
    let physical_resource_id = match field("PhysicalResourceId") {
        existing if !existing.is_empty() => existing,
        _ => fallback_physical_resource_id(&stack_id, &logical_resource_id),
    };

    let response = CustomResourceResponse {
        status: ResponseStatus::Failed,
        reason: reason.to_string(),
        physical_resource_id,
        stack_id,
        request_id: field("RequestId"),
        logical_resource_id,
        data: ResponseData::new(),
    };
    deliver(&response_url, response, sender)
}

fn deliver(
    url: &str,
    response: CustomResourceResponse,
    sender: &dyn ResponseSender,
) -> Result<CustomResourceResponse, TransportError> {
    let body = serde_json::to_vec(&response)?;
    sender.send_response(url, &body).map_err(|error| {
        tracing::error!(
            component = COMPONENT,
            event = "response_delivery_failed",
            request_id = %response.request_id,
            error = %error,
        );
        TransportError::Delivery(error)
    })?;

    tracing::info!(
        component = COMPONENT,
        event = "response_sent",
        request_id = %response.request_id,
        status = response.status.as_str(),
        physical_resource_id = %response.physical_resource_id,
    );
    Ok(response)
}

pub fn build_response(
    event: &LifecycleEvent,
    outcome: &Result<(), BucketNameError>,
    data: ResponseData,
    invocation: &InvocationContext,
    rng: &mut impl RngCore,
) -> CustomResourceResponse {
    let (status, reason, data) = match outcome {
        Ok(()) => (
            ResponseStatus::Success,
            format!(
                "See the details in CloudWatch Log Stream: {}",
                invocation.log_stream_name
            ),
            data,
        ),
        Err(error) => (ResponseStatus::Failed, error.to_string(), ResponseData::new()),
    };

    CustomResourceResponse {
        status,
        reason,
        physical_resource_id: physical_resource_id(event, rng),
        stack_id: event.stack_id.clone(),
        request_id: event.request_id.clone(),
        logical_resource_id: event.logical_resource_id.clone(),
        data,
    }
}

fn physical_resource_id(event: &LifecycleEvent, rng: &mut impl RngCore) -> String {
    match (&event.physical_resource_id, event.request_type) {
        (Some(existing), RequestType::Update | RequestType::Delete) if !existing.is_empty() => {
            existing.clone()
        }
        _ => generate_physical_resource_id(&event.stack_id, &event.logical_resource_id, rng),
    }
}

/// `<stack-name>_<logical-id>_<8 alphanumerics>`, where the stack name is the
/// second `/` segment of the stack ARN.
///
/// Falls back to `<stack-name>_<logical-id>` when the random source fails, so
/// a response can always be sent.
pub fn generate_physical_resource_id(
    stack_id: &str,
    logical_resource_id: &str,
    rng: &mut impl RngCore,
) -> String {
    let base = fallback_physical_resource_id(stack_id, logical_resource_id);
    match physical_id_suffix(rng) {
        Ok(suffix) => format!("{base}_{suffix}"),
        Err(error) => {
            tracing::warn!(
                component = COMPONENT,
                event = "physical_id_suffix_unavailable",
                error = %error,
            );
            base
        }
    }
}

fn fallback_physical_resource_id(stack_id: &str, logical_resource_id: &str) -> String {
    let stack_name = stack_id.split('/').nth(1).unwrap_or(stack_id);
    format!("{stack_name}_{logical_resource_id}")
}

fn physical_id_suffix(rng: &mut impl RngCore) -> Result<String, rand::Error> {
    let mut suffix = String::with_capacity(PHYSICAL_ID_SUFFIX_LENGTH);
    let mut buffer = [0u8; PHYSICAL_ID_SUFFIX_LENGTH * 2];

    while suffix.len() < PHYSICAL_ID_SUFFIX_LENGTH {
        rng.try_fill_bytes(&mut buffer)?;
        for byte in buffer {
            if suffix.len() == PHYSICAL_ID_SUFFIX_LENGTH {
                break;
            }
            if byte < PHYSICAL_ID_REJECTION_BOUND {
                let index = usize::from(byte) % PHYSICAL_ID_ALPHABET.len();
                suffix.push(char::from(PHYSICAL_ID_ALPHABET[index]));
            }
        }
    }

    Ok(suffix)
}

/// Time left before the invocation should give up and report `FAILED`.
///
/// `deadline_ms` is the Lambda deadline in milliseconds since the Unix epoch.
pub fn time_until_deadline(deadline_ms: u64, now: SystemTime) -> Duration {
    let now_ms = now
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or_default();
    Duration::from_millis(deadline_ms.saturating_sub(now_ms)).saturating_sub(DEADLINE_MARGIN)
}
