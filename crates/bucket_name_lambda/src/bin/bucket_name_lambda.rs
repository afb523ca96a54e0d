use std::sync::Arc;
use std::time::{Duration, SystemTime};

use bucket_name_lambda::adapters::response_sender::ResponseSender;
use bucket_name_lambda::config::HandlerConfig;
use bucket_name_lambda::handlers::custom_resource::{
    handle_custom_resource_event, report_raw_failure, time_until_deadline, InvocationContext,
};
use bucket_name_lambda::logging::init_logging;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::{json, Value};

struct HttpResponseSender {
    client: reqwest::Client,
    timeout: Duration,
}

impl ResponseSender for HttpResponseSender {
    fn send_response(&self, url: &str, body: &[u8]) -> Result<(), String> {
        let client = self.client.clone();
        let target_url = url.to_string();
        let body_bytes = body.to_vec();
        let timeout = self.timeout;

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                // Pre-signed S3 URLs are signed without a content type.
                let response = client
                    .put(target_url)
                    .header(reqwest::header::CONTENT_TYPE, "")
                    .timeout(timeout)
                    .body(body_bytes)
                    .send()
                    .await
                    .map_err(|error| format!("failed to send response: {error}"))?;

                let status = response.status();
                if status.is_success() {
                    Ok(())
                } else {
                    Err(format!("response endpoint returned {status}"))
                }
            })
        })
    }
}

async fn handle_request(
    event: LambdaEvent<Value>,
    sender: Arc<HttpResponseSender>,
) -> Result<Value, Error> {
    let invocation = InvocationContext {
        aws_request_id: event.context.request_id.clone(),
        log_stream_name: event.context.env_config.log_stream.clone(),
    };
    let budget = time_until_deadline(event.context.deadline, SystemTime::now());

    let payload = event.payload;
    let watchdog_payload = payload.clone();
    let worker_sender = Arc::clone(&sender);
    let worker = tokio::task::spawn_blocking(move || {
        handle_custom_resource_event(payload, &invocation, worker_sender.as_ref())
    });

    let response = match tokio::time::timeout(budget, worker).await {
        Ok(joined) => joined
            .map_err(|error| Error::from(format!("custom resource handler task failed: {error}")))?
            .map_err(|error| Error::from(error.to_string()))?,
        Err(_) => {
            tracing::error!(
                component = "lambda_entry",
                event = "deadline_reached",
                budget_ms = budget.as_millis() as u64,
            );
            tokio::task::spawn_blocking(move || {
                report_raw_failure(
                    &watchdog_payload,
                    "Lambda invocation reached its deadline before completing",
                    sender.as_ref(),
                )
            })
            .await
            .map_err(|error| Error::from(format!("deadline report task failed: {error}")))?
            .map_err(|error| Error::from(error.to_string()))?
        }
    };

    Ok(json!({
        "status": response.status.as_str(),
        "physical_resource_id": response.physical_resource_id,
    }))
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    let config = HandlerConfig::from_env().map_err(|error| Error::from(error.to_string()))?;
    init_logging(&config);

    let sender = Arc::new(HttpResponseSender {
        client: reqwest::Client::new(),
        timeout: config.response_timeout,
    });

    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| {
        handle_request(event, Arc::clone(&sender))
    }))
    .await
}
