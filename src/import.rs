//! Bulk contact import: submission and progress polling.
//!
//! An import is submitted once and then owned entirely by the remote
//! service; this module only submits the payload and polls the returned
//! progress token. There is no cancellation and no internal retry or
//! waiting — callers poll with their own backoff.

use std::fmt;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::{ApiError, Result};
use crate::gateway::SoapGateway;

/// Recognized bulk-payload formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ImportFormat {
    /// Comma-separated values, header row = data label names.
    Csv,
    /// The vendor's XML contact format.
    Xml,
}

impl ImportFormat {
    /// Parse a format tag, failing with [`ApiError::UnsupportedFormat`] on
    /// anything other than `"CSV"` or `"XML"` (case-insensitive).
    pub fn parse(tag: &str) -> Result<Self> {
        match tag.to_ascii_uppercase().as_str() {
            "CSV" => Ok(Self::Csv),
            "XML" => Ok(Self::Xml),
            _ => Err(ApiError::UnsupportedFormat {
                format: tag.to_string(),
            }),
        }
    }

    /// The wire tag for this format.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Csv => "CSV",
            Self::Xml => "XML",
        }
    }
}

/// Progress state of an import job, as reported by the remote service.
///
/// The job lifecycle is `NotFinished` (repeatedly) and then either
/// `Finished` or one of the error-kind terminal states.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImportStatus {
    /// Still being processed; poll again later.
    NotFinished,
    /// Completed successfully.
    Finished,
    /// Rejected by the vendor's abuse watchdog.
    RejectedByWatchdog,
    /// The payload did not match the declared format.
    InvalidFileFormat,
    /// The import would exceed the account's contact limit.
    ExceedsAllowedContactLimit,
    /// Bulk import is not available on this account plan.
    NotAvailableInThisVersion,
    /// A status string this crate does not recognize, preserved verbatim.
    Unknown(String),
}

impl ImportStatus {
    /// Parse the remote status string. Unrecognized values are preserved in
    /// [`Unknown`](Self::Unknown) rather than failing, so new remote states
    /// degrade gracefully.
    pub fn parse(value: &str) -> Self {
        match value {
            "NotFinished" => Self::NotFinished,
            "Finished" => Self::Finished,
            "RejectedByWatchdog" => Self::RejectedByWatchdog,
            "InvalidFileFormat" => Self::InvalidFileFormat,
            "ExceedsAllowedContactLimit" => Self::ExceedsAllowedContactLimit,
            "NotAvailableInThisVersion" => Self::NotAvailableInThisVersion,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// Whether the job has stopped, successfully or not.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::NotFinished)
    }

    /// Whether the job stopped in an error state.
    pub fn is_error(&self) -> bool {
        self.is_terminal() && !matches!(self, Self::Finished)
    }
}

/// Opaque token identifying an asynchronous import job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImportToken(String);

impl ImportToken {
    /// Wrap a raw progress identifier.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw progress identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ImportToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Submits bulk contact payloads and polls their progress tokens.
///
/// Holds no state of its own; each call is a single remote invocation.
/// Concurrent use against different tokens or address books is safe.
pub struct ImportOrchestrator {
    gateway: Arc<dyn SoapGateway>,
}

impl ImportOrchestrator {
    /// Create an orchestrator over the given gateway.
    pub fn new(gateway: Arc<dyn SoapGateway>) -> Self {
        Self { gateway }
    }

    /// Submit a bulk payload for asynchronous import into an address book.
    ///
    /// The format tag is validated locally first: an unrecognized tag fails
    /// with [`ApiError::UnsupportedFormat`] without issuing a remote call.
    /// A missing address book surfaces as [`ApiError::NotFound`]; a payload
    /// the service cannot accept as [`ApiError::RemoteRejection`].
    pub async fn submit(
        &self,
        address_book_id: i64,
        payload: &[u8],
        format: &str,
    ) -> Result<ImportToken> {
        let format = ImportFormat::parse(format)?;

        let params = json!({
            "addressbookID": address_book_id,
            "data": BASE64.encode(payload),
            "dataType": format.as_str(),
        });

        let response = self
            .gateway
            .invoke("AddContactsToAddressBookWithProgress", params)
            .await?;

        match response.as_str() {
            Some(token) if !token.is_empty() => Ok(ImportToken::new(token)),
            _ => Err(ApiError::Parse {
                operation: "AddContactsToAddressBookWithProgress".to_string(),
                detail: format!("expected a progress id, got {response}"),
            }),
        }
    }

    /// Check the current state of a previously submitted import.
    ///
    /// A single non-blocking status check; callers poll repeatedly with
    /// their own backoff. An unrecognized token surfaces as
    /// [`ApiError::NotFound`], not as a transport error.
    pub async fn poll_status(&self, token: &ImportToken) -> Result<ImportStatus> {
        let params = json!({ "progressID": token.as_str() });

        let response = self
            .gateway
            .invoke("GetContactImportProgress", params)
            .await?;

        match response.as_str() {
            Some(status) => Ok(ImportStatus::parse(status)),
            None => Err(ApiError::Parse {
                operation: "GetContactImportProgress".to_string(),
                detail: format!("expected a status string, got {response}"),
            }),
        }
    }
}

/// Build a CSV payload from a header row and data rows.
///
/// Header names are the account's data label names (plus fixed attribute
/// names such as `Email`). Every cell is quoted; embedded quotes are
/// doubled per RFC 4180.
pub fn csv_payload<S: AsRef<str>>(header: &[S], rows: &[Vec<String>]) -> String {
    fn write_row<S: AsRef<str>>(out: &mut String, cells: impl Iterator<Item = S>) {
        let mut first = true;
        for cell in cells {
            if !first {
                out.push(',');
            }
            first = false;
            out.push('"');
            out.push_str(&cell.as_ref().replace('"', "\"\""));
            out.push('"');
        }
        out.push('\n');
    }

    let mut out = String::new();
    write_row(&mut out, header.iter().map(AsRef::as_ref));
    for row in rows {
        write_row(&mut out, row.iter().map(String::as_str));
    }
    out
}
