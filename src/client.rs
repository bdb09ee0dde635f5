//! High-level operations over the remote operation gateway.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::error::{ApiError, Result};
use crate::fields::{self, WireContact};
use crate::gateway::SoapGateway;
use crate::import::{ImportOrchestrator, ImportStatus, ImportToken};
use crate::soap::HttpSoapGateway;
use crate::types::{AddressBook, Contact, DataLabel, FieldMap};

/// Client for the dotMailer v1.5 API.
///
/// Holds no state beyond the gateway; every operation is a single
/// synchronous remote call, safe to issue concurrently.
pub struct DotmailerClient {
    gateway: Arc<dyn SoapGateway>,
    imports: ImportOrchestrator,
}

impl DotmailerClient {
    /// Connect with account API credentials over HTTPS.
    ///
    /// Fails with [`ApiError::Validation`] when either credential is empty.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Result<Self> {
        let gateway = Arc::new(HttpSoapGateway::new(username, password)?);
        Ok(Self::with_gateway(gateway))
    }

    /// Like [`new`](Self::new) with a caller-specified per-request timeout.
    pub fn with_timeout(
        username: impl Into<String>,
        password: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let gateway = Arc::new(HttpSoapGateway::with_timeout(username, password, timeout)?);
        Ok(Self::with_gateway(gateway))
    }

    /// Build a client over an existing gateway (test doubles, staging
    /// endpoints).
    pub fn with_gateway(gateway: Arc<dyn SoapGateway>) -> Self {
        let imports = ImportOrchestrator::new(Arc::clone(&gateway));
        Self { gateway, imports }
    }

    // ── Contacts ─────────────────────────────────────────────────────────

    /// Create a contact from fixed attributes and custom fields.
    ///
    /// `attributes` must contain `Email`; enumerated attributes are
    /// validated locally before the remote call.
    pub async fn create_contact(
        &self,
        attributes: &FieldMap,
        custom_fields: &FieldMap,
    ) -> Result<Contact> {
        self.send_contact("CreateContact", attributes, custom_fields, None)
            .await
    }

    /// Update an existing contact, matched remotely by email address.
    pub async fn update_contact(
        &self,
        attributes: &FieldMap,
        custom_fields: &FieldMap,
    ) -> Result<Contact> {
        self.send_contact("UpdateContact", attributes, custom_fields, None)
            .await
    }

    /// Create or update a contact and add it to an address book.
    pub async fn add_contact_to_address_book(
        &self,
        attributes: &FieldMap,
        custom_fields: &FieldMap,
        address_book_id: i64,
    ) -> Result<Contact> {
        self.send_contact(
            "AddContactToAddressBook",
            attributes,
            custom_fields,
            Some(address_book_id),
        )
        .await
    }

    /// Look up a contact by email address.
    ///
    /// Absence is an expected outcome and returns `Ok(None)`.
    pub async fn get_contact_by_email(&self, email: &str) -> Result<Option<Contact>> {
        if email.trim().is_empty() {
            return Err(ApiError::Validation {
                field: "email".to_string(),
                detail: "must not be empty".to_string(),
            });
        }
        let res = self
            .gateway
            .invoke("GetContactByEmail", json!({ "email": email }))
            .await
            .and_then(|value| decode_contact("GetContactByEmail", value));
        optional(res)
    }

    /// Look up a contact by its numeric identifier.
    ///
    /// Absence is an expected outcome and returns `Ok(None)`.
    pub async fn get_contact_by_id(&self, id: i64) -> Result<Option<Contact>> {
        let res = self
            .gateway
            .invoke("GetContactById", json!({ "id": id }))
            .await
            .and_then(|value| decode_contact("GetContactById", value));
        optional(res)
    }

    // ── Address books ────────────────────────────────────────────────────

    /// Create a new address book with the given display name.
    pub async fn create_address_book(&self, name: &str) -> Result<AddressBook> {
        if name.trim().is_empty() {
            return Err(ApiError::Validation {
                field: "name".to_string(),
                detail: "must not be empty".to_string(),
            });
        }
        let value = self
            .gateway
            .invoke(
                "CreateAddressBook",
                json!({ "book": { "Name": name } }),
            )
            .await?;
        decode("CreateAddressBook", value)
    }

    /// Delete an address book. A missing book surfaces as
    /// [`ApiError::NotFound`].
    pub async fn delete_address_book(&self, address_book_id: i64) -> Result<()> {
        self.gateway
            .invoke(
                "DeleteAddressBook",
                json!({ "addressbookId": address_book_id }),
            )
            .await?;
        Ok(())
    }

    /// List the account's address books.
    pub async fn list_address_books(&self) -> Result<Vec<AddressBook>> {
        let value = self.gateway.invoke("ListAddressBooks", Value::Null).await?;
        decode_list("ListAddressBooks", value, "APIAddressBook")
    }

    /// Remove every contact from an address book. The contacts themselves
    /// remain in the account.
    pub async fn remove_all_contacts(&self, address_book_id: i64) -> Result<()> {
        self.gateway
            .invoke(
                "RemoveAllContactsFromAddressBook",
                json!({
                    "addressbookID": address_book_id,
                    "preventAddressbookResubscribe": false,
                    "totalUnsubscribe": false,
                }),
            )
            .await?;
        Ok(())
    }

    /// Number of contacts in an address book, or `None` when the book does
    /// not exist.
    pub async fn contact_count(&self, address_book_id: i64) -> Result<Option<u64>> {
        let res = self
            .gateway
            .invoke(
                "GetAddressBookContactCount",
                json!({ "addressBookId": address_book_id }),
            )
            .await
            .and_then(|value| parse_count("GetAddressBookContactCount", &value));
        optional(res)
    }

    // ── Reference data ───────────────────────────────────────────────────

    /// List the account's custom data label definitions.
    pub async fn list_data_labels(&self) -> Result<Vec<DataLabel>> {
        let value = self
            .gateway
            .invoke("ListContactDataLabels", Value::Null)
            .await?;
        decode_list("ListContactDataLabels", value, "ContactDataLabel")
    }

    // ── Bulk imports ─────────────────────────────────────────────────────

    /// Submit a bulk payload for asynchronous import. See
    /// [`ImportOrchestrator::submit`].
    pub async fn submit_import(
        &self,
        address_book_id: i64,
        payload: &[u8],
        format: &str,
    ) -> Result<ImportToken> {
        self.imports.submit(address_book_id, payload, format).await
    }

    /// Check the progress of a previously submitted import. See
    /// [`ImportOrchestrator::poll_status`].
    pub async fn import_progress(&self, token: &ImportToken) -> Result<ImportStatus> {
        self.imports.poll_status(token).await
    }

    // ── Misc ─────────────────────────────────────────────────────────────

    /// Current time as reported by the remote service.
    pub async fn server_time(&self) -> Result<DateTime<Utc>> {
        let value = self.gateway.invoke("GetServerTime", Value::Null).await?;
        let Some(text) = value.as_str() else {
            return Err(ApiError::Parse {
                operation: "GetServerTime".to_string(),
                detail: format!("expected a timestamp string, got {value}"),
            });
        };
        DateTime::parse_from_rfc3339(text)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| ApiError::Parse {
                operation: "GetServerTime".to_string(),
                detail: format!("bad timestamp '{text}': {e}"),
            })
    }

    /// Shared path for the three contact-sending operations: reconcile the
    /// two mappings into the wire shape, invoke, flatten the echo.
    async fn send_contact(
        &self,
        operation: &str,
        attributes: &FieldMap,
        custom_fields: &FieldMap,
        address_book_id: Option<i64>,
    ) -> Result<Contact> {
        let wire = fields::merge(attributes, custom_fields)?;
        let contact = serde_json::to_value(&wire).map_err(|e| ApiError::Parse {
            operation: operation.to_string(),
            detail: format!("failed to encode contact: {e}"),
        })?;

        let params = match address_book_id {
            Some(id) => json!({ "contact": contact, "addressbookId": id }),
            None => json!({ "contact": contact }),
        };

        let value = self.gateway.invoke(operation, params).await?;
        decode_contact(operation, value)
    }
}

/// Treat [`ApiError::NotFound`] as an expected absence.
fn optional<T>(res: Result<T>) -> Result<Option<T>> {
    match res {
        Ok(value) => Ok(Some(value)),
        Err(ApiError::NotFound { .. }) => Ok(None),
        Err(e) => Err(e),
    }
}

fn decode<T: DeserializeOwned>(operation: &str, value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| ApiError::Parse {
        operation: operation.to_string(),
        detail: e.to_string(),
    })
}

fn decode_contact(operation: &str, value: Value) -> Result<Contact> {
    let wire: WireContact = decode(operation, value)?;
    Ok(fields::flatten(&wire))
}

/// Decode a list result: the result element holds zero or more repeated
/// `item` children; a single child arrives as a lone object.
fn decode_list<T: DeserializeOwned>(operation: &str, value: Value, item: &str) -> Result<Vec<T>> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Object(mut object) => match object.remove(item) {
            None => Ok(Vec::new()),
            Some(Value::Array(items)) => items
                .into_iter()
                .map(|entry| decode(operation, entry))
                .collect(),
            Some(single) => Ok(vec![decode(operation, single)?]),
        },
        other => Err(ApiError::Parse {
            operation: operation.to_string(),
            detail: format!("expected a list element, got {other}"),
        }),
    }
}

fn parse_count(operation: &str, value: &Value) -> Result<u64> {
    let parsed = match value {
        Value::String(s) => s.parse::<u64>().ok(),
        Value::Number(n) => n.as_u64(),
        _ => None,
    };
    parsed.ok_or_else(|| ApiError::Parse {
        operation: operation.to_string(),
        detail: format!("expected a count, got {value}"),
    })
}
