//! Shared test helpers.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::env;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;

use dotmailer_client::{ApiError, DotmailerClient, SoapGateway};

/// Skip the test when the named environment variables are missing.
#[macro_export]
macro_rules! skip_if_no_credentials {
    ($($var:expr),+) => {
        $(
            if std::env::var($var).is_err() {
                eprintln!("skipping test: missing environment variable {}", $var);
                return;
            }
        )+
    };
}

/// Assert that an `Option` is `Some` and unwrap it (failing the test otherwise).
#[macro_export]
macro_rules! require_some {
    ($expr:expr $(,)?) => {{
        let opt = $expr;
        assert!(opt.is_some(), "expected Some(..), got None");
        let Some(val) = opt else {
            return;
        };
        val
    }};
    ($expr:expr, $($msg:tt)+) => {{
        let opt = $expr;
        assert!(opt.is_some(), "{}", format_args!($($msg)+));
        let Some(val) = opt else {
            return;
        };
        val
    }};
}

/// Assert that a `Result` is `Ok` and unwrap it (failing the test otherwise).
#[macro_export]
macro_rules! require_ok {
    ($expr:expr $(,)?) => {{
        let res = $expr;
        assert!(res.is_ok(), "expected Ok(..), got {res:?}");
        let Ok(val) = res else {
            return;
        };
        val
    }};
    ($expr:expr, $($msg:tt)+) => {{
        let res = $expr;
        assert!(
            res.is_ok(),
            "{}: {res:?}",
            format_args!($($msg)+)
        );
        let Ok(val) = res else {
            return;
        };
        val
    }};
}

/// Scripted [`SoapGateway`] double.
///
/// Responses are consumed in FIFO order; every invocation is recorded with
/// its operation name and parameters so tests can assert on the wire shape.
pub struct MockGateway {
    responses: Mutex<VecDeque<Result<Value, ApiError>>>,
    calls: Mutex<Vec<(String, Value)>>,
}

impl MockGateway {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
        })
    }

    /// Queue a successful decoded result.
    pub fn enqueue_ok(&self, value: Value) {
        if let Ok(mut responses) = self.responses.lock() {
            responses.push_back(Ok(value));
        }
    }

    /// Queue a failure.
    pub fn enqueue_err(&self, err: ApiError) {
        if let Ok(mut responses) = self.responses.lock() {
            responses.push_back(Err(err));
        }
    }

    /// All invocations recorded so far, in order.
    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }

    /// Number of invocations recorded so far.
    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|calls| calls.len()).unwrap_or(0)
    }
}

#[async_trait]
impl SoapGateway for MockGateway {
    async fn invoke(&self, operation: &str, params: Value) -> Result<Value, ApiError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((operation.to_string(), params));
        }
        let next = self
            .responses
            .lock()
            .ok()
            .and_then(|mut responses| responses.pop_front());
        next.unwrap_or_else(|| {
            Err(ApiError::GatewayUnavailable {
                operation: operation.to_string(),
                detail: "no scripted response".to_string(),
            })
        })
    }
}

/// Client over a fresh [`MockGateway`]; returns both halves.
pub fn mock_client() -> (DotmailerClient, Arc<MockGateway>) {
    let gateway = MockGateway::new();
    let client = DotmailerClient::with_gateway(Arc::clone(&gateway) as Arc<dyn SoapGateway>);
    (client, gateway)
}

/// Live test context built from `DOTMAILER_USERNAME` / `DOTMAILER_PASSWORD`.
pub struct TestContext {
    pub client: DotmailerClient,
}

impl TestContext {
    pub fn from_env() -> Option<Self> {
        let username = env::var("DOTMAILER_USERNAME").ok()?;
        let password = env::var("DOTMAILER_PASSWORD").ok()?;
        let client = DotmailerClient::new(username, password).ok()?;
        Some(Self { client })
    }
}

/// Unique name for remote artifacts created by live tests.
pub fn generate_test_name(prefix: &str) -> String {
    let uuid = uuid::Uuid::new_v4();
    format!("_test-{prefix}-{}", &uuid.to_string()[..8])
}

/// Unique throwaway email address for live tests.
pub fn generate_test_email() -> String {
    let uuid = uuid::Uuid::new_v4();
    format!("_test-{}@example.com", &uuid.to_string()[..8])
}
