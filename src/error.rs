use serde::{Deserialize, Serialize};

/// Unified error type for all dotMailer API operations.
///
/// Variants carrying an `operation` field identify which remote operation
/// produced the error. All variants are serializable for structured error
/// reporting.
///
/// # Local vs. remote errors
///
/// [`Validation`](Self::Validation) and [`UnsupportedFormat`](Self::UnsupportedFormat)
/// are raised before any remote call is made. Everything else is mapped from
/// a gateway fault at the boundary, with the originating fault message
/// preserved for diagnostics.
///
/// # Retryable Errors
///
/// Only [`GatewayUnavailable`](Self::GatewayUnavailable) represents a
/// transient transport failure that may succeed on retry. Nothing is retried
/// inside this crate; retry policy belongs to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "code")]
pub enum ApiError {
    /// Malformed or missing local input, detected before any remote call.
    Validation {
        /// Name of the offending field or parameter.
        field: String,
        /// Description of what's wrong.
        detail: String,
    },

    /// An import format tag that is not one of the recognized formats.
    ///
    /// Raised before any remote call is made.
    UnsupportedFormat {
        /// The unrecognized format tag as supplied.
        format: String,
    },

    /// The supplied API credentials were rejected by the remote service.
    InvalidCredentials {
        /// Original fault message from the API, if available.
        raw_message: Option<String>,
    },

    /// The remote service explicitly rejected a well-formed request
    /// (duplicate address book, suppressed contact, malformed import
    /// payload, and similar).
    RemoteRejection {
        /// Remote operation that was invoked.
        operation: String,
        /// Raw fault code from the API, if available.
        raw_code: Option<String>,
        /// Original fault message from the API.
        raw_message: String,
    },

    /// A referenced entity does not exist remotely, for operations where
    /// absence is a hard failure (e.g. polling an unknown import token).
    ///
    /// Lookups where absence is an expected outcome return `Ok(None)`
    /// instead of this error.
    NotFound {
        /// Remote operation that was invoked.
        operation: String,
        /// What kind of entity was missing (`"contact"`, `"address book"`, ...).
        entity: String,
        /// Original fault message from the API, if available.
        raw_message: Option<String>,
    },

    /// Transport-level failure: connection error, DNS failure, or a request
    /// timeout. The request may never have reached the remote service.
    ///
    /// This is the only transient variant; callers may retry with their own
    /// backoff.
    GatewayUnavailable {
        /// Remote operation that was invoked.
        operation: String,
        /// Error details.
        detail: String,
    },

    /// A response was received but could not be interpreted.
    Parse {
        /// Remote operation that was invoked.
        operation: String,
        /// Details about the parse failure.
        detail: String,
    },
}

impl ApiError {
    /// Whether this error reflects expected behavior (bad user input, a
    /// missing entity) rather than a defect or outage, for log levelling.
    ///
    /// `true` means log at `warn`, `false` at `error`.
    #[must_use]
    pub fn is_expected(&self) -> bool {
        matches!(
            self,
            Self::Validation { .. }
                | Self::UnsupportedFormat { .. }
                | Self::InvalidCredentials { .. }
                | Self::RemoteRejection { .. }
                | Self::NotFound { .. }
        )
    }

    /// Whether retrying the same request later could succeed without any
    /// change to the input.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::GatewayUnavailable { .. })
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation { field, detail } => {
                write!(f, "Invalid input '{field}': {detail}")
            }
            Self::UnsupportedFormat { format } => {
                write!(f, "Unsupported import format: {format}")
            }
            Self::InvalidCredentials { raw_message } => {
                if let Some(msg) = raw_message {
                    write!(f, "Invalid credentials: {msg}")
                } else {
                    write!(f, "Invalid credentials")
                }
            }
            Self::RemoteRejection {
                operation,
                raw_message,
                ..
            } => {
                write!(f, "[{operation}] Rejected by remote service: {raw_message}")
            }
            Self::NotFound {
                operation,
                entity,
                raw_message,
            } => {
                if let Some(msg) = raw_message {
                    write!(f, "[{operation}] {entity} not found: {msg}")
                } else {
                    write!(f, "[{operation}] {entity} not found")
                }
            }
            Self::GatewayUnavailable { operation, detail } => {
                write!(f, "[{operation}] Gateway unavailable: {detail}")
            }
            Self::Parse { operation, detail } => {
                write!(f, "[{operation}] Parse error: {detail}")
            }
        }
    }
}

impl std::error::Error for ApiError {}

/// Convenience type alias for `Result<T, ApiError>`.
pub type Result<T> = std::result::Result<T, ApiError>;
