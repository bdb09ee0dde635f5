//! Field reconciliation between the remote wire shape and the local shape.
//!
//! The remote API represents a contact as fixed attributes alongside a
//! separate sequence of (label, value) custom-field records. This module is
//! the single seam where that representation is translated to and from an
//! ordered [`FieldMap`], so every contact-manipulating operation shares one
//! conversion rule.

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{ApiError, Result};
use crate::types::{AudienceType, Contact, EmailType, FieldMap, OptInType};

/// A single custom-field record as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DataField {
    /// Account-defined data label name (e.g. `"FIRSTNAME"`).
    pub label: String,
    /// Field value.
    pub value: String,
}

/// A contact in the wire format consumed and produced by the remote API:
/// fixed attributes plus a sequence of (label, value) pairs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireContact {
    /// Remote numeric identifier, absent until assigned by the service.
    #[serde(
        rename = "ID",
        default,
        with = "wire_opt_i64",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<i64>,

    /// Email address. Always present; uniqueness is enforced remotely.
    #[serde(rename = "Email")]
    pub email: String,

    /// Audience classification, if set.
    #[serde(
        rename = "AudienceType",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub audience_type: Option<AudienceType>,

    /// Opt-in type, if set.
    #[serde(
        rename = "OptInType",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub opt_in_type: Option<OptInType>,

    /// Preferred email format, if set.
    #[serde(
        rename = "EmailType",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub email_type: Option<EmailType>,

    /// Free-form notes, if set.
    #[serde(rename = "Notes", default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    /// Custom-field records in wire order. A label may repeat; duplicates
    /// are resolved last-write-wins when flattening.
    #[serde(
        rename = "DataFields",
        default,
        deserialize_with = "one_or_many",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub data_fields: Vec<DataField>,
}

/// Merge a mapping of fixed attributes with a mapping of custom fields into
/// the wire shape.
///
/// `attributes` must contain `Email`; `AudienceType`, `OptInType` and
/// `EmailType` are validated against their enumerations; `ID` must be
/// numeric; `Notes` is free-form. Any other attribute key cannot be
/// represented in the wire shape and fails with [`ApiError::Validation`].
///
/// Custom-field keys are passed through untouched, in order — whether a
/// label matches an account data label is decided by the remote service.
pub fn merge(attributes: &FieldMap, custom_fields: &FieldMap) -> Result<WireContact> {
    let mut wire = WireContact {
        id: None,
        email: String::new(),
        audience_type: None,
        opt_in_type: None,
        email_type: None,
        notes: None,
        data_fields: Vec::with_capacity(custom_fields.len()),
    };

    for (key, value) in attributes.iter() {
        match key {
            "Email" => wire.email = value.to_string(),
            "AudienceType" => wire.audience_type = Some(AudienceType::parse(value)?),
            "OptInType" => wire.opt_in_type = Some(OptInType::parse(value)?),
            "EmailType" => wire.email_type = Some(EmailType::parse(value)?),
            "Notes" => wire.notes = Some(value.to_string()),
            "ID" => {
                let id = value.parse::<i64>().map_err(|_| ApiError::Validation {
                    field: "ID".to_string(),
                    detail: format!("not a numeric contact id: {value}"),
                })?;
                wire.id = Some(id);
            }
            other => {
                return Err(ApiError::Validation {
                    field: other.to_string(),
                    detail: "not a recognized contact attribute".to_string(),
                });
            }
        }
    }

    if wire.email.is_empty() {
        return Err(ApiError::Validation {
            field: "Email".to_string(),
            detail: "missing required attribute".to_string(),
        });
    }

    for (label, value) in custom_fields.iter() {
        wire.data_fields.push(DataField {
            label: label.to_string(),
            value: value.to_string(),
        });
    }

    Ok(wire)
}

/// Flatten a wire contact into the local shape.
///
/// Custom-field pairs are inserted in their given order; a repeated label
/// overwrites the prior value (last write wins). Absent pairs yield an
/// empty mapping. No failure path.
pub fn flatten(wire: &WireContact) -> Contact {
    let mut fields = FieldMap::new();
    for field in &wire.data_fields {
        fields.insert(field.label.clone(), field.value.clone());
    }

    Contact {
        id: wire.id.unwrap_or_default(),
        email: wire.email.clone(),
        audience_type: wire.audience_type,
        opt_in_type: wire.opt_in_type,
        email_type: wire.email_type,
        notes: wire.notes.clone(),
        fields,
    }
}

/// Accept either a single `DataFields` element or a repeated sequence.
///
/// The XML decoder only produces an array when an element repeats, so a
/// contact with exactly one custom field arrives as a lone object.
fn one_or_many<'de, D>(deserializer: D) -> std::result::Result<Vec<DataField>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(DataField),
        Many(Vec<DataField>),
    }

    match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(field) => Ok(vec![field]),
        OneOrMany::Many(fields) => Ok(fields),
    }
}

/// Serde helper for numeric identifiers that travel as element text.
pub(crate) mod wire_opt_i64 {
    use serde::de::{self, Visitor};
    use serde::{Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<i64>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(v) => serializer.serialize_str(&v.to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct OptI64Visitor;

        impl<'de> Visitor<'de> for OptI64Visitor {
            type Value = Option<i64>;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.write_str("an integer, an integer string, or null")
            }

            fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(None)
            }

            fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(None)
            }

            fn visit_some<D2: Deserializer<'de>>(
                self,
                deserializer: D2,
            ) -> Result<Self::Value, D2::Error> {
                deserializer.deserialize_any(self)
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
                Ok(Some(v))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                i64::try_from(v)
                    .map(Some)
                    .map_err(|_| E::custom("contact id out of range"))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                if v.is_empty() {
                    return Ok(None);
                }
                v.parse::<i64>()
                    .map(Some)
                    .map_err(|_| E::custom(format!("not a numeric id: {v}")))
            }
        }

        deserializer.deserialize_any(OptI64Visitor)
    }
}
