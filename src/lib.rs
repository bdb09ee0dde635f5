//! # dotmailer-client
//!
//! An async client for the dotMailer v1.5 SOAP API: contacts, address
//! books, and asynchronous bulk imports.
//!
//! ## Feature Flags
//!
//! ### TLS Backend
//!
//! - **`native-tls`** *(default)* — Use the platform's native TLS implementation.
//! - **`rustls`** — Use rustls. Recommended for cross-compilation.
//!
//! ## Quick Start
//!
//! Add to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! dotmailer-client = "0.1"
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use dotmailer_client::{DotmailerClient, FieldMap};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = DotmailerClient::new("apiuser-123@apiconnector.com", "secret")?;
//!
//!     // Create an address book and add a contact to it
//!     let book = client.create_address_book("Newsletter").await?;
//!
//!     let attributes: FieldMap = [
//!         ("Email", "jane@example.com"),
//!         ("AudienceType", "B2C"),
//!         ("OptInType", "Single"),
//!         ("EmailType", "Html"),
//!     ]
//!     .into_iter()
//!     .collect();
//!     let fields: FieldMap = [("FIRSTNAME", "Jane")].into_iter().collect();
//!
//!     let contact = client
//!         .add_contact_to_address_book(&attributes, &fields, book.id)
//!         .await?;
//!     println!("created contact #{}", contact.id);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Bulk Imports
//!
//! ```rust,no_run
//! # use dotmailer_client::*;
//! # async fn example(client: DotmailerClient, book_id: i64) -> Result<()> {
//! let csv = csv_payload(
//!     &["Email", "FIRSTNAME"],
//!     &[vec!["jane@example.com".to_string(), "Jane".to_string()]],
//! );
//! let token = client.submit_import(book_id, csv.as_bytes(), "CSV").await?;
//!
//! // Poll with your own backoff until the job stops.
//! let status = client.import_progress(&token).await?;
//! if status.is_terminal() {
//!     println!("import ended: {status:?}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! All operations return [`Result<T, ApiError>`](ApiError). The error enum
//! provides structured variants for common failure modes:
//!
//! - [`ApiError::Validation`] — input rejected locally, no remote call made
//! - [`ApiError::InvalidCredentials`] — the service refused the credentials
//! - [`ApiError::RemoteRejection`] — a well-formed request the service refused
//! - [`ApiError::GatewayUnavailable`] — transport failure (retryable)
//!
//! No operation retries internally; [`ApiError::is_retryable`] tells a
//! caller-side retry loop which failures are worth repeating.

mod client;
mod error;
pub mod fields;
mod gateway;
mod import;
mod soap;
mod types;

// Re-export error types
pub use error::{ApiError, Result};

// Re-export the client and the gateway seam (for test doubles)
pub use client::DotmailerClient;
pub use gateway::{RawFault, SoapGateway};
pub use soap::HttpSoapGateway;

// Re-export types
pub use types::{
    AddressBook, AudienceType, Contact, DataLabel, DataLabelType, EmailType, FieldMap, OptInType,
};

// Re-export the import surface
pub use import::{csv_payload, ImportFormat, ImportOrchestrator, ImportStatus, ImportToken};
