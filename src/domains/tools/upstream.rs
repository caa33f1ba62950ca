//! Upstream HTTP plumbing shared by every tool definition.
//!
//! Each call builds its own `reqwest::Client`, so no connection outlives the
//! request that opened it. Transport failures are translated into the error
//! taxonomy here, once; nothing is retried.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error};

use super::error::StructuredError;

/// Identifies which upstream call is being made, for error context.
#[derive(Debug, Clone, Copy)]
pub struct UpstreamCall<'a> {
    /// Human name of the upstream API (e.g. "OpenWeatherMap").
    pub api: &'a str,
    /// Operation name recorded in error data (e.g. "get_weather").
    pub operation: &'a str,
}

/// Raw upstream answer: status plus body text.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: u16,
    pub body: String,
}

impl UpstreamResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decode the body, translating failures into ExternalApiError.
    pub fn json<T: DeserializeOwned>(&self, call: UpstreamCall<'_>) -> Result<T, StructuredError> {
        serde_json::from_str(&self.body).map_err(|e| {
            error!("Malformed response from {}.{}: {}", call.api, call.operation, e);
            StructuredError::upstream_failure(call.api, call.operation, e)
        })
    }

    /// Body as JSON when it parses, otherwise as plain text.
    pub fn body_value(&self) -> Value {
        serde_json::from_str(&self.body).unwrap_or_else(|_| Value::String(self.body.clone()))
    }

    /// Map a non-2xx status into the taxonomy.
    pub fn status_error(&self, call: UpstreamCall<'_>) -> StructuredError {
        match self.status {
            401 => StructuredError::api_key_invalid(call.api),
            429 => StructuredError::rate_limited(call.api),
            status => StructuredError::upstream_status(call.api, status, self.body_value()),
        }
    }
}

/// Issues GET requests to upstream APIs.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    timeout: Duration,
}

impl UpstreamClient {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// GET `url` with the given query parameters.
    ///
    /// Returns the response whatever its status; only failures to obtain a
    /// response at all become errors.
    pub async fn get(
        &self,
        call: UpstreamCall<'_>,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<UpstreamResponse, StructuredError> {
        let encoded = serde_urlencoded::to_string(query)
            .map_err(|e| StructuredError::upstream_failure(call.api, call.operation, e))?;
        let full_url = if encoded.is_empty() {
            url.to_string()
        } else {
            format!("{url}?{encoded}")
        };

        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| StructuredError::upstream_failure(call.api, call.operation, e))?;

        debug!("GET {} ({}.{})", url, call.api, call.operation);
        let response = client
            .get(full_url)
            .send()
            .await
            .map_err(|e| transport_error(call, e))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| transport_error(call, e))?;
        debug!("{}.{} answered {} ({} bytes)", call.api, call.operation, status, body.len());

        Ok(UpstreamResponse { status, body })
    }
}

impl Default for UpstreamClient {
    fn default() -> Self {
        Self::new(Duration::from_secs(10))
    }
}

fn transport_error(call: UpstreamCall<'_>, err: reqwest::Error) -> StructuredError {
    error!("External API error in {}.{}: {}", call.api, call.operation, err);
    match err.status().map(|s| s.as_u16()) {
        Some(401) => {
            StructuredError::api_key_invalid(call.api).with_data("operation", call.operation)
        }
        Some(429) => StructuredError::rate_limited(call.api).with_data("operation", call.operation),
        _ => StructuredError::upstream_failure(call.api, call.operation, err),
    }
}
