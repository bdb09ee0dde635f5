use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

/// A raw SOAP fault as received from the transport, before mapping to a
/// typed [`ApiError`](crate::ApiError).
#[derive(Debug, Clone)]
pub struct RawFault {
    /// Fault code (e.g. `"soap:Server"` or a vendor `ERROR_*` string).
    pub code: Option<String>,
    /// Raw fault message.
    pub message: String,
}

impl RawFault {
    /// Fault with a message only.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    /// Fault with both code and message.
    pub fn with_code(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            message: message.into(),
        }
    }

    /// The vendor fault token for mapping purposes.
    ///
    /// dotMailer faults put the `ERROR_*` token in the fault string, with
    /// the generic SOAP code (`soap:Server`) in the fault code, so the
    /// message is checked first.
    pub fn vendor_token(&self) -> &str {
        let token = self
            .message
            .split_whitespace()
            .find(|w| w.starts_with("ERROR_"));
        match token {
            Some(t) => t.trim_end_matches(['.', ',']),
            None => self.code.as_deref().unwrap_or(""),
        }
    }
}

/// The remote operation gateway: a generic RPC seam capable of invoking a
/// named remote operation with a parameter mapping.
///
/// `params` is a flat JSON object mapping parameter name to a scalar value.
/// On success the returned [`Value`] is the decoded content of the
/// operation's result element. Faults and transport failures are translated
/// into [`ApiError`](crate::ApiError) by the implementation.
///
/// The production implementation is
/// [`HttpSoapGateway`](crate::HttpSoapGateway); tests substitute a
/// scripted double.
#[async_trait]
pub trait SoapGateway: Send + Sync {
    /// Invoke a named remote operation. One network round trip, no retries.
    async fn invoke(&self, operation: &str, params: Value) -> Result<Value>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vendor_token_from_message() {
        let fault = RawFault::with_code(
            "soap:Server",
            "Server was unable to process request. ---> ERROR_CONTACT_NOT_FOUND",
        );
        assert_eq!(fault.vendor_token(), "ERROR_CONTACT_NOT_FOUND");
    }

    #[test]
    fn vendor_token_strips_trailing_punctuation() {
        let fault = RawFault::new("Request failed: ERROR_INVALID_LOGIN.");
        assert_eq!(fault.vendor_token(), "ERROR_INVALID_LOGIN");
    }

    #[test]
    fn vendor_token_falls_back_to_code() {
        let fault = RawFault::with_code("soap:Client", "malformed envelope");
        assert_eq!(fault.vendor_token(), "soap:Client");
    }

    #[test]
    fn vendor_token_empty_when_nothing_usable() {
        let fault = RawFault::new("no token here");
        assert_eq!(fault.vendor_token(), "");
    }
}
