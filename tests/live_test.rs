//! Live API integration tests.
//!
//! Run with:
//! ```bash
//! DOTMAILER_USERNAME=apiuser-xxx@apiconnector.com DOTMAILER_PASSWORD=xxx \
//!     cargo test --test live_test -- --ignored --nocapture --test-threads=1
//! ```

mod common;

use std::time::Duration;

use common::{generate_test_email, generate_test_name, TestContext};
use dotmailer_client::{csv_payload, FieldMap};

#[tokio::test]
#[ignore = "integration test: requires DOTMAILER_USERNAME and DOTMAILER_PASSWORD"]
async fn live_server_time() {
    skip_if_no_credentials!("DOTMAILER_USERNAME", "DOTMAILER_PASSWORD");

    let ctx = require_some!(TestContext::from_env(), "failed to build test context");
    let time = require_ok!(ctx.client.server_time().await, "GetServerTime failed");
    println!("✓ server time: {time}");
}

#[tokio::test]
#[ignore = "integration test: requires DOTMAILER_USERNAME and DOTMAILER_PASSWORD"]
async fn live_list_data_labels() {
    skip_if_no_credentials!("DOTMAILER_USERNAME", "DOTMAILER_PASSWORD");

    let ctx = require_some!(TestContext::from_env(), "failed to build test context");
    let labels = require_ok!(
        ctx.client.list_data_labels().await,
        "ListContactDataLabels failed"
    );
    println!("✓ {} data labels defined", labels.len());
}

#[tokio::test]
#[ignore = "integration test: requires DOTMAILER_USERNAME and DOTMAILER_PASSWORD"]
async fn live_address_book_and_contact_lifecycle() {
    skip_if_no_credentials!("DOTMAILER_USERNAME", "DOTMAILER_PASSWORD");

    let ctx = require_some!(TestContext::from_env(), "failed to build test context");

    let book = require_ok!(
        ctx.client
            .create_address_book(&generate_test_name("book"))
            .await,
        "CreateAddressBook failed"
    );
    println!("✓ created address book #{}", book.id);

    let email = generate_test_email();
    let attributes: FieldMap = [
        ("Email", email.as_str()),
        ("AudienceType", "B2C"),
        ("OptInType", "Single"),
        ("EmailType", "Html"),
    ]
    .into_iter()
    .collect();
    let fields: FieldMap = [("FIRSTNAME", "Integration")].into_iter().collect();

    let contact = require_ok!(
        ctx.client
            .add_contact_to_address_book(&attributes, &fields, book.id)
            .await,
        "AddContactToAddressBook failed"
    );
    assert_eq!(contact.email, email);
    println!("✓ created contact #{}", contact.id);

    let found = require_ok!(
        ctx.client.get_contact_by_email(&email).await,
        "GetContactByEmail failed"
    );
    let found = require_some!(found, "contact should be retrievable by email");
    assert_eq!(found.id, contact.id);

    let count = require_ok!(
        ctx.client.contact_count(book.id).await,
        "GetAddressBookContactCount failed"
    );
    assert_eq!(count, Some(1), "book should contain exactly one contact");

    require_ok!(
        ctx.client.remove_all_contacts(book.id).await,
        "RemoveAllContactsFromAddressBook failed"
    );
    require_ok!(
        ctx.client.delete_address_book(book.id).await,
        "DeleteAddressBook failed"
    );
    println!("✓ lifecycle complete, address book cleaned up");
}

#[tokio::test]
#[ignore = "integration test: requires DOTMAILER_USERNAME and DOTMAILER_PASSWORD"]
async fn live_csv_import() {
    skip_if_no_credentials!("DOTMAILER_USERNAME", "DOTMAILER_PASSWORD");

    let ctx = require_some!(TestContext::from_env(), "failed to build test context");

    let book = require_ok!(
        ctx.client
            .create_address_book(&generate_test_name("import"))
            .await,
        "CreateAddressBook failed"
    );

    let csv = csv_payload(
        &["Email", "FIRSTNAME"],
        &[
            vec![generate_test_email(), "Ann".to_string()],
            vec![generate_test_email(), "Ben".to_string()],
        ],
    );
    let token = require_ok!(
        ctx.client.submit_import(book.id, csv.as_bytes(), "CSV").await,
        "import submission failed"
    );
    println!("✓ import submitted: {token}");

    // Poll until terminal, with a bounded number of attempts.
    let mut status = require_ok!(ctx.client.import_progress(&token).await);
    for _ in 0..30 {
        if status.is_terminal() {
            break;
        }
        tokio::time::sleep(Duration::from_secs(2)).await;
        status = require_ok!(ctx.client.import_progress(&token).await);
    }
    println!("✓ import ended: {status:?}");
    assert!(status.is_terminal(), "import did not finish in time");
    assert!(!status.is_error(), "import ended in error: {status:?}");

    let _ = ctx.client.remove_all_contacts(book.id).await;
    let _ = ctx.client.delete_address_book(book.id).await;
}
