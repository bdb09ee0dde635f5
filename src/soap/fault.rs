//! dotMailer fault mapping.
//!
//! The service reports failures as SOAP faults whose fault string carries a
//! vendor `ERROR_*` token. This table translates those tokens into typed
//! [`ApiError`] variants; the originating fault message is preserved on
//! every mapped error.

use crate::error::ApiError;
use crate::gateway::RawFault;

/// Map a raw SOAP fault for the given operation into a typed error.
///
/// Reference: fault reasons observed from the v1.5 API
/// (`https://apiconnector.com/API.asmx`). Unmapped tokens fall back to
/// [`ApiError::RemoteRejection`] with the fault text intact.
pub(crate) fn map_fault(operation: &str, fault: RawFault) -> ApiError {
    let token = fault.vendor_token().to_string();

    match token.as_str() {
        // Authentication
        "ERROR_INVALID_LOGIN" | "ERROR_UNKNOWN_LOGIN" => ApiError::InvalidCredentials {
            raw_message: Some(fault.message),
        },

        // Missing entities
        "ERROR_CONTACT_NOT_FOUND" => not_found(operation, "contact", fault),
        "ERROR_ADDRESSBOOK_NOT_FOUND" => not_found(operation, "address book", fault),
        "ERROR_DATAFIELD_NOTFOUND" => not_found(operation, "data label", fault),
        "ERROR_CAMPAIGN_NOT_FOUND" => not_found(operation, "campaign", fault),
        "ERROR_IMPORT_NOTFOUND" | "ERROR_IMPORT_NOT_FOUND" => {
            not_found(operation, "import", fault)
        }

        // Explicit rejections of well-formed requests
        "ERROR_INVALID_EMAIL"
        | "ERROR_CONTACT_INVALID"
        | "ERROR_CONTACT_SUPPRESSED"
        | "ERROR_ADDRESSBOOK_DUPLICATE"
        | "ERROR_ADDRESSBOOK_INVALID"
        | "ERROR_ADDRESSBOOK_LIMITEXCEEDED"
        | "ERROR_ADDRESSBOOK_NOTWRITABLE"
        | "ERROR_INVALID_CONTACT_IMPORT"
        | "ERROR_IMPORT_TOOMANYACTIVEIMPORTS"
        | "ERROR_APIUSAGE_EXCEEDED" => ApiError::RemoteRejection {
            operation: operation.to_string(),
            raw_code: Some(token),
            raw_message: fault.message,
        },

        // Anything else is still a remote rejection; keep whatever code the
        // fault carried for diagnostics.
        _ => ApiError::RemoteRejection {
            operation: operation.to_string(),
            raw_code: if token.is_empty() { fault.code } else { Some(token) },
            raw_message: fault.message,
        },
    }
}

fn not_found(operation: &str, entity: &str, fault: RawFault) -> ApiError {
    ApiError::NotFound {
        operation: operation.to_string(),
        entity: entity.to_string(),
        raw_message: Some(fault.message),
    }
}
