//! HTTP transport for the remote operation gateway.
//!
//! One SOAP 1.1 POST per invocation against the v1.5 API endpoint. No
//! retries: transient failures surface as
//! [`ApiError::GatewayUnavailable`](crate::ApiError::GatewayUnavailable)
//! and retry policy stays with the caller.

mod envelope;
mod fault;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use crate::error::{ApiError, Result};
use crate::gateway::SoapGateway;

use envelope::{build_envelope, parse_envelope, EnvelopeError, SoapResponse, OPERATION_NS};
use fault::map_fault;

/// Endpoint of the v1.5 SOAP API.
pub(crate) const API_ENDPOINT: &str = "https://apiconnector.com/API.asmx";

/// Default connect timeout (seconds).
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
/// Default per-request timeout (seconds).
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Longest response body echoed into debug logs.
const MAX_LOGGED_BODY: usize = 2048;

/// Production [`SoapGateway`] over HTTPS.
///
/// Credentials are injected as `username`/`password` parameters on every
/// invocation, which is how the v1.5 API authenticates.
pub struct HttpSoapGateway {
    client: Client,
    endpoint: String,
    username: String,
    password: String,
}

impl HttpSoapGateway {
    /// Create a gateway with the default timeouts.
    ///
    /// Fails with [`ApiError::Validation`] when either credential is empty,
    /// before any remote call is possible.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Result<Self> {
        Self::with_timeout(
            username,
            password,
            Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        )
    }

    /// Create a gateway with a caller-specified per-request timeout.
    ///
    /// Expiry of the timeout surfaces as [`ApiError::GatewayUnavailable`].
    pub fn with_timeout(
        username: impl Into<String>,
        password: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let username = username.into();
        let password = password.into();
        if username.trim().is_empty() || password.trim().is_empty() {
            return Err(ApiError::Validation {
                field: "credentials".to_string(),
                detail: "username and password must not be empty".to_string(),
            });
        }

        let client = Client::builder()
            .connect_timeout(Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS))
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::GatewayUnavailable {
                operation: "<init>".to_string(),
                detail: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            endpoint: API_ENDPOINT.to_string(),
            username,
            password,
        })
    }

    /// Point the gateway at a different endpoint (staging, local stub).
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl SoapGateway for HttpSoapGateway {
    async fn invoke(&self, operation: &str, params: Value) -> Result<Value> {
        let params = inject_credentials(params, &self.username, &self.password)
            .map_err(|detail| ApiError::Validation {
                field: "parameters".to_string(),
                detail,
            })?;

        let body = build_envelope(operation, &params).map_err(|e| ApiError::Parse {
            operation: operation.to_string(),
            detail: e.to_string(),
        })?;

        log::debug!("POST {} SOAPAction={operation}", self.endpoint);

        let response = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "text/xml; charset=utf-8")
            .header("SOAPAction", format!("\"{OPERATION_NS}{operation}\""))
            .body(body)
            .send()
            .await
            .map_err(|e| {
                let detail = if e.is_timeout() {
                    format!("request timed out: {e}")
                } else {
                    e.to_string()
                };
                ApiError::GatewayUnavailable {
                    operation: operation.to_string(),
                    detail,
                }
            })?;

        let status = response.status().as_u16();
        log::debug!("[{operation}] Response Status: {status}");

        let text = response
            .text()
            .await
            .map_err(|e| ApiError::GatewayUnavailable {
                operation: operation.to_string(),
                detail: format!("failed to read response body: {e}"),
            })?;

        log::debug!("[{operation}] Response Body: {}", truncate_for_log(&text));

        // SOAP faults arrive with HTTP 500, so the body is decoded before
        // the status is judged.
        match parse_envelope(operation, &text) {
            Ok(SoapResponse::Result(value)) => Ok(value),
            Ok(SoapResponse::Fault(raw)) => {
                let err = map_fault(operation, raw);
                if err.is_expected() {
                    log::warn!("[{operation}] {err}");
                } else {
                    log::error!("[{operation}] {err}");
                }
                Err(err)
            }
            Err(parse_err) => {
                if (500..=599).contains(&status) || status == 429 {
                    log::warn!("[{operation}] Server error (HTTP {status})");
                    Err(ApiError::GatewayUnavailable {
                        operation: operation.to_string(),
                        detail: format!("HTTP {status}: {}", truncate_for_log(&text)),
                    })
                } else {
                    log::error!("[{operation}] Undecodable response: {parse_err}");
                    Err(map_parse_error(operation, &parse_err))
                }
            }
        }
    }
}

/// Add `username`/`password` to the parameter object. The supplied params
/// must be an object or null.
fn inject_credentials(
    params: Value,
    username: &str,
    password: &str,
) -> std::result::Result<Value, String> {
    let mut object = match params {
        Value::Object(object) => object,
        Value::Null => serde_json::Map::new(),
        other => return Err(format!("parameters must be an object, got {other}")),
    };
    object.insert("username".to_string(), Value::String(username.to_string()));
    object.insert("password".to_string(), Value::String(password.to_string()));
    Ok(Value::Object(object))
}

fn map_parse_error(operation: &str, e: &EnvelopeError) -> ApiError {
    ApiError::Parse {
        operation: operation.to_string(),
        detail: e.to_string(),
    }
}

/// Cap a body for debug logging.
fn truncate_for_log(text: &str) -> &str {
    match text.char_indices().nth(MAX_LOGGED_BODY) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
