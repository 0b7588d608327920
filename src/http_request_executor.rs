use std::time::{Duration, Instant};

use reqwest::blocking::Client;
use tracing::{debug, warn};

use crate::config::Settings;
use crate::errors::{HarnessError, HarnessResult};
use crate::http_request::RequestSpec;
use crate::http_response::{ResponseBody, ResponseResult};

/// Owns the blocking client every request of a run goes through.
pub struct ExecutionContext {
    client: Client,
}

impl ExecutionContext {
    pub fn new() -> HarnessResult<ExecutionContext> {
        return ExecutionContext::with_timeout(None);
    }

    /// `None` keeps reqwest's default timeout.
    pub fn with_timeout(timeout: Option<Duration>) -> HarnessResult<ExecutionContext> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(HarnessError::Client)?;
        return Ok(ExecutionContext { client });
    }

    pub fn from_settings(settings: &Settings) -> HarnessResult<ExecutionContext> {
        return ExecutionContext::with_timeout(settings.timeout);
    }
}

/// Performs exactly one round trip for `spec`. Never retries.
pub fn execute_http_request(spec: &RequestSpec, context: &ExecutionContext) -> HarnessResult<ResponseResult> {
    let url = spec.full_url();
    debug!(method = %spec.method(), url = %url, "sending request");

    let mut req = context
        .client
        .request(spec.method().to_reqwest(), url.clone())
        .headers(spec.headers().clone());
    if let Some(body) = spec.body() {
        req = req.json(body);
    }

    let started = Instant::now();
    let res = req.send().map_err(|e| HarnessError::transport(url.as_str(), e))?;
    let status = res.status();

    if !spec.tolerate_error_status() && (status.is_client_error() || status.is_server_error()) {
        warn!(url = %url, status = status.as_u16(), "error status not tolerated");
        return Err(HarnessError::ErrorStatus { url: url.to_string(), status: status.as_u16() });
    }

    let headers = res.headers().clone();
    let bytes = res.bytes().map_err(|e| HarnessError::transport(url.as_str(), e))?;
    let duration = started.elapsed();

    debug!(
        url = %url,
        status = status.as_u16(),
        bytes = bytes.len(),
        elapsed_ms = duration.as_millis() as u64,
        "received response"
    );

    return Ok(ResponseResult::new(
        status.as_u16(),
        headers,
        ResponseBody::from_bytes(bytes.to_vec()),
        duration,
    ));
}
