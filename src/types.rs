use serde::{Deserialize, Serialize};

use crate::error::ApiError;

// ============ Enumerated Contact Attributes ============

/// Audience classification of a contact.
///
/// Serialized as the wire strings `"B2B"` / `"B2C"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AudienceType {
    /// Business-to-business recipient.
    B2B,
    /// Business-to-consumer recipient.
    B2C,
}

impl AudienceType {
    /// Parse the wire string, failing with [`ApiError::Validation`] on an
    /// unrecognized value.
    pub fn parse(value: &str) -> Result<Self, ApiError> {
        match value {
            "B2B" => Ok(Self::B2B),
            "B2C" => Ok(Self::B2C),
            other => Err(ApiError::Validation {
                field: "AudienceType".to_string(),
                detail: format!("unrecognized value: {other}"),
            }),
        }
    }

    /// The wire string for this variant.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::B2B => "B2B",
            Self::B2C => "B2C",
        }
    }
}

/// How a contact opted in to receiving email.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OptInType {
    /// Single opt-in.
    Single,
    /// Double opt-in (confirmation email).
    Double,
    /// Verified double opt-in.
    VerifiedDouble,
}

impl OptInType {
    /// Parse the wire string, failing with [`ApiError::Validation`] on an
    /// unrecognized value.
    pub fn parse(value: &str) -> Result<Self, ApiError> {
        match value {
            "Single" => Ok(Self::Single),
            "Double" => Ok(Self::Double),
            "VerifiedDouble" => Ok(Self::VerifiedDouble),
            other => Err(ApiError::Validation {
                field: "OptInType".to_string(),
                detail: format!("unrecognized value: {other}"),
            }),
        }
    }

    /// The wire string for this variant.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Single => "Single",
            Self::Double => "Double",
            Self::VerifiedDouble => "VerifiedDouble",
        }
    }
}

/// Preferred email body format of a contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmailType {
    /// HTML email.
    Html,
    /// Plain-text email.
    PlainText,
}

impl EmailType {
    /// Parse the wire string, failing with [`ApiError::Validation`] on an
    /// unrecognized value.
    pub fn parse(value: &str) -> Result<Self, ApiError> {
        match value {
            "Html" => Ok(Self::Html),
            "PlainText" => Ok(Self::PlainText),
            other => Err(ApiError::Validation {
                field: "EmailType".to_string(),
                detail: format!("unrecognized value: {other}"),
            }),
        }
    }

    /// The wire string for this variant.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Html => "Html",
            Self::PlainText => "PlainText",
        }
    }
}

// ============ Ordered Field Mapping ============

/// An insertion-ordered mapping of field name to string value.
///
/// The remote API represents custom fields as a sequence of (label, value)
/// records, so insertion order is semantically visible. Inserting an
/// existing key overwrites its value in place, keeping the key's original
/// position (last write wins).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMap(Vec<(String, String)>);

impl FieldMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Insert a key/value pair. If the key is already present its value is
    /// overwritten in place; otherwise the pair is appended.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        if let Some(entry) = self.0.iter_mut().find(|(k, _)| *k == key) {
            entry.1 = value;
        } else {
            self.0.push((key, value));
        }
    }

    /// Look up a value by key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Whether the key is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.iter().any(|(k, _)| k == key)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the map has no entries.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FieldMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

// ============ Entity Types ============

/// An individual recipient record with fixed attributes and custom fields.
///
/// This is the flattened local shape; the wire shape is
/// [`WireContact`](crate::fields::WireContact).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    /// Remote numeric identifier.
    pub id: i64,
    /// Email address, unique per account.
    pub email: String,
    /// Audience classification, if set.
    pub audience_type: Option<AudienceType>,
    /// Opt-in type, if set.
    pub opt_in_type: Option<OptInType>,
    /// Preferred email format, if set.
    pub email_type: Option<EmailType>,
    /// Free-form notes, if set.
    pub notes: Option<String>,
    /// Custom data-label fields in wire order.
    pub fields: FieldMap,
}

/// A named collection of contacts within an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AddressBook {
    /// Remote numeric identifier.
    #[serde(rename = "ID", deserialize_with = "wire_i64")]
    pub id: i64,
    /// Display name.
    pub name: String,
}

/// Numeric identifiers travel as element text, so they arrive as strings.
fn wire_i64<'de, D>(deserializer: D) -> std::result::Result<i64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{self, Visitor};

    struct I64Visitor;

    impl Visitor<'_> for I64Visitor {
        type Value = i64;

        fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
            f.write_str("an integer or an integer string")
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<i64, E> {
            Ok(v)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<i64, E> {
            i64::try_from(v).map_err(|_| E::custom("identifier out of range"))
        }

        fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<i64, E> {
            v.parse::<i64>()
                .map_err(|_| E::custom(format!("not a numeric id: {v}")))
        }
    }

    deserializer.deserialize_any(I64Visitor)
}

/// The value type of an account-defined data label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataLabelType {
    /// Free-form text.
    String,
    /// Numeric value.
    Numeric,
    /// Date value.
    Date,
    /// Boolean value.
    Boolean,
}

/// An account-level custom field definition.
///
/// Read-only reference data: which labels exist is decided in the account,
/// not by this crate. Labels supplied in a contact's custom-field mapping
/// that do not match a known data label are passed through; accepting or
/// rejecting them is remote-service-defined behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DataLabel {
    /// Field name as used in custom-field mappings (e.g. `"FIRSTNAME"`).
    pub name: String,
    /// Value type of the field.
    #[serde(rename = "Type")]
    pub label_type: DataLabelType,
}

#[cfg(test)]
mod tests {
    use super::*;

    // ---- attribute enums ----

    #[test]
    fn audience_type_round_trip() {
        for s in ["B2B", "B2C"] {
            let parsed = AudienceType::parse(s);
            assert!(parsed.is_ok(), "expected Ok(..), got {parsed:?}");
            let Ok(t) = parsed else { return };
            assert_eq!(t.as_str(), s);
        }
    }

    #[test]
    fn audience_type_rejects_unknown() {
        let res = AudienceType::parse("B2G");
        assert!(
            matches!(&res, Err(ApiError::Validation { field, .. }) if field == "AudienceType"),
            "unexpected result: {res:?}"
        );
    }

    #[test]
    fn opt_in_type_round_trip() {
        for s in ["Single", "Double", "VerifiedDouble"] {
            let parsed = OptInType::parse(s);
            assert!(parsed.is_ok(), "expected Ok(..), got {parsed:?}");
            let Ok(t) = parsed else { return };
            assert_eq!(t.as_str(), s);
        }
    }

    #[test]
    fn opt_in_type_rejects_unknown() {
        let res = OptInType::parse("Triple");
        assert!(
            matches!(&res, Err(ApiError::Validation { field, .. }) if field == "OptInType"),
            "unexpected result: {res:?}"
        );
    }

    #[test]
    fn email_type_round_trip() {
        for s in ["Html", "PlainText"] {
            let parsed = EmailType::parse(s);
            assert!(parsed.is_ok(), "expected Ok(..), got {parsed:?}");
            let Ok(t) = parsed else { return };
            assert_eq!(t.as_str(), s);
        }
    }

    #[test]
    fn email_type_rejects_unknown() {
        let res = EmailType::parse("RichText");
        assert!(
            matches!(&res, Err(ApiError::Validation { field, .. }) if field == "EmailType"),
            "unexpected result: {res:?}"
        );
    }

    // ---- FieldMap ----

    #[test]
    fn field_map_preserves_insertion_order() {
        let map: FieldMap = [("FIRSTNAME", "John"), ("LASTNAME", "Test")]
            .into_iter()
            .collect();
        let entries: Vec<_> = map.iter().collect();
        assert_eq!(
            entries,
            vec![("FIRSTNAME", "John"), ("LASTNAME", "Test")]
        );
    }

    #[test]
    fn field_map_last_write_wins() {
        let mut map = FieldMap::new();
        map.insert("FIRSTNAME", "A");
        map.insert("FIRSTNAME", "B");
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("FIRSTNAME"), Some("B"));
    }

    #[test]
    fn field_map_overwrite_keeps_position() {
        let mut map = FieldMap::new();
        map.insert("FIRSTNAME", "John");
        map.insert("LASTNAME", "Test");
        map.insert("FIRSTNAME", "Jane");
        let entries: Vec<_> = map.iter().collect();
        assert_eq!(entries, vec![("FIRSTNAME", "Jane"), ("LASTNAME", "Test")]);
    }

    #[test]
    fn field_map_get_missing() {
        let map = FieldMap::new();
        assert_eq!(map.get("POSTCODE"), None);
        assert!(map.is_empty());
        assert!(!map.contains_key("POSTCODE"));
    }

    // ---- entities ----

    #[test]
    fn address_book_decodes_string_id() {
        let res: serde_json::Result<AddressBook> =
            serde_json::from_value(serde_json::json!({ "ID": "345678", "Name": "Test book" }));
        assert!(res.is_ok(), "expected Ok(..), got {res:?}");
        let Ok(book) = res else { return };
        assert_eq!(book.id, 345_678);
        assert_eq!(book.name, "Test book");
    }

    #[test]
    fn field_map_equality_is_order_sensitive() {
        let a: FieldMap = [("X", "1"), ("Y", "2")].into_iter().collect();
        let b: FieldMap = [("Y", "2"), ("X", "1")].into_iter().collect();
        assert_ne!(a, b);
    }
}
