//! SOAP 1.1 envelope encoding and decoding.
//!
//! Requests are built from a flat-or-nested JSON parameter object; element
//! order follows the object's key order. Responses are decoded into a
//! [`Value`] tree: element text becomes a string, children become an
//! object, and repeated sibling elements are promoted to an array. All
//! leaf scalars stay strings; typed structs apply their own conversions.

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use serde_json::{Map, Value};
use std::io::Cursor;
use std::str;
use thiserror::Error;

use crate::gateway::RawFault;

/// Namespace of the remote operations, also the `SOAPAction` prefix.
pub(crate) const OPERATION_NS: &str = "http://apiconnector.com/";

/// Errors internal to envelope encode/decode, converted to
/// [`ApiError`](crate::ApiError) at the gateway boundary.
#[derive(Debug, Error)]
pub(crate) enum EnvelopeError {
    #[error("XML write error: {0}")]
    Write(String),
    #[error("XML read error: {0}")]
    Read(String),
    #[error("{0}")]
    Shape(String),
}

/// Decoded outcome of one SOAP exchange.
#[derive(Debug)]
pub(crate) enum SoapResponse {
    /// Content of the operation's result element.
    Result(Value),
    /// A `<soap:Fault>` was returned.
    Fault(RawFault),
}

/// Build the request envelope for one operation.
pub(crate) fn build_envelope(operation: &str, params: &Value) -> Result<String, EnvelopeError> {
    let mut writer = Writer::new(Cursor::new(Vec::new()));

    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))
        .map_err(write_err)?;

    let mut envelope = BytesStart::new("soap:Envelope");
    envelope.push_attribute(("xmlns:soap", "http://schemas.xmlsoap.org/soap/envelope/"));
    writer.write_event(Event::Start(envelope)).map_err(write_err)?;
    writer
        .write_event(Event::Start(BytesStart::new("soap:Body")))
        .map_err(write_err)?;

    let mut op = BytesStart::new(operation);
    op.push_attribute(("xmlns", OPERATION_NS));
    writer.write_event(Event::Start(op)).map_err(write_err)?;

    write_value(&mut writer, params)?;

    writer
        .write_event(Event::End(BytesEnd::new(operation)))
        .map_err(write_err)?;
    writer
        .write_event(Event::End(BytesEnd::new("soap:Body")))
        .map_err(write_err)?;
    writer
        .write_event(Event::End(BytesEnd::new("soap:Envelope")))
        .map_err(write_err)?;

    String::from_utf8(writer.into_inner().into_inner())
        .map_err(|e| EnvelopeError::Write(e.to_string()))
}

/// Decode a response envelope for the given operation.
///
/// Returns the content of `<{operation}Response><{operation}Result>` when
/// present, the decoded `<{operation}Response>` body otherwise, or the
/// fault when the body carries one.
pub(crate) fn parse_envelope(
    operation: &str,
    xml: &str,
) -> Result<SoapResponse, EnvelopeError> {
    let tree = xml_to_value(xml)?;

    if let Some(fault) = find_element(&tree, "Fault") {
        let code = fault
            .get("faultcode")
            .and_then(Value::as_str)
            .map(ToString::to_string);
        let message = fault
            .get("faultstring")
            .and_then(Value::as_str)
            .unwrap_or("unspecified SOAP fault")
            .to_string();
        let raw = match code {
            Some(code) => RawFault::with_code(code, message),
            None => RawFault::new(message),
        };
        return Ok(SoapResponse::Fault(raw));
    }

    let response_name = format!("{operation}Response");
    let response = find_element(&tree, &response_name).ok_or_else(|| {
        EnvelopeError::Shape(format!("missing {response_name} element in response body"))
    })?;

    let result_name = format!("{operation}Result");
    let result = match response.get(&result_name) {
        Some(result) => result.clone(),
        None => response.clone(),
    };
    Ok(SoapResponse::Result(result))
}

fn write_err(e: impl std::fmt::Display) -> EnvelopeError {
    EnvelopeError::Write(e.to_string())
}

/// Write an object's entries as child elements, in key order.
fn write_value(
    writer: &mut Writer<Cursor<Vec<u8>>>,
    value: &Value,
) -> Result<(), EnvelopeError> {
    let Some(object) = value.as_object() else {
        if value.is_null() {
            return Ok(());
        }
        return Err(EnvelopeError::Shape(format!(
            "parameters must be an object, got {value}"
        )));
    };

    for (name, entry) in object {
        write_named(writer, name, entry)?;
    }
    Ok(())
}

/// Write one named value: scalars as element text, objects as nested
/// elements, arrays as repeated elements of the same name.
fn write_named(
    writer: &mut Writer<Cursor<Vec<u8>>>,
    name: &str,
    value: &Value,
) -> Result<(), EnvelopeError> {
    match value {
        Value::Null => Ok(()),
        Value::Array(items) => {
            for item in items {
                write_named(writer, name, item)?;
            }
            Ok(())
        }
        Value::Object(_) => {
            writer
                .write_event(Event::Start(BytesStart::new(name)))
                .map_err(write_err)?;
            write_value(writer, value)?;
            writer
                .write_event(Event::End(BytesEnd::new(name)))
                .map_err(write_err)?;
            Ok(())
        }
        Value::String(s) => write_text(writer, name, s),
        Value::Number(n) => write_text(writer, name, &n.to_string()),
        Value::Bool(b) => write_text(writer, name, if *b { "true" } else { "false" }),
    }
}

fn write_text(
    writer: &mut Writer<Cursor<Vec<u8>>>,
    name: &str,
    text: &str,
) -> Result<(), EnvelopeError> {
    writer
        .write_event(Event::Start(BytesStart::new(name)))
        .map_err(write_err)?;
    writer
        .write_event(Event::Text(BytesText::new(text)))
        .map_err(write_err)?;
    writer
        .write_event(Event::End(BytesEnd::new(name)))
        .map_err(write_err)?;
    Ok(())
}

/// One element being assembled during decoding.
struct Node {
    name: String,
    children: Map<String, Value>,
    text: String,
}

impl Node {
    fn new(name: String) -> Self {
        Self {
            name,
            children: Map::new(),
            text: String::new(),
        }
    }

    fn into_value(self) -> (String, Value) {
        let value = if self.children.is_empty() {
            if self.text.is_empty() {
                Value::Null
            } else {
                Value::String(self.text)
            }
        } else {
            Value::Object(self.children)
        };
        (self.name, value)
    }
}

/// Insert a child value, promoting repeated sibling names to an array.
fn insert_child(children: &mut Map<String, Value>, name: String, value: Value) {
    match children.get_mut(&name) {
        Some(Value::Array(items)) => items.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, value]);
        }
        None => {
            children.insert(name, value);
        }
    }
}

/// Decode an XML document into a value tree, namespace prefixes stripped.
fn xml_to_value(xml: &str) -> Result<Value, EnvelopeError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut root = Node::new(String::new());
    let mut stack: Vec<Node> = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let name = local_name(e)?;
                stack.push(Node::new(name));
            }
            Ok(Event::Empty(ref e)) => {
                let name = local_name(e)?;
                let target = stack.last_mut().map_or(&mut root.children, |n| &mut n.children);
                insert_child(target, name, Value::Null);
            }
            Ok(Event::Text(ref e)) => {
                if let Some(node) = stack.last_mut() {
                    let text = e
                        .unescape()
                        .map_err(|err| EnvelopeError::Read(err.to_string()))?;
                    node.text.push_str(&text);
                }
            }
            Ok(Event::End(_)) => {
                let Some(node) = stack.pop() else {
                    return Err(EnvelopeError::Read("unbalanced end tag".to_string()));
                };
                let (name, value) = node.into_value();
                let target = stack.last_mut().map_or(&mut root.children, |n| &mut n.children);
                insert_child(target, name, value);
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(EnvelopeError::Read(format!(
                    "XML error at position {}: {e}",
                    reader.buffer_position()
                )));
            }
            _ => {}
        }
    }

    Ok(Value::Object(root.children))
}

fn local_name(e: &BytesStart) -> Result<String, EnvelopeError> {
    str::from_utf8(e.local_name().as_ref())
        .map(ToString::to_string)
        .map_err(|_| EnvelopeError::Read("invalid UTF-8 in tag name".to_string()))
}

/// Depth-first search for the first element with the given local name.
fn find_element<'a>(tree: &'a Value, name: &str) -> Option<&'a Value> {
    let object = tree.as_object()?;
    if let Some(found) = object.get(name) {
        return Some(found);
    }
    for child in object.values() {
        if let Some(found) = find_element(child, name) {
            return Some(found);
        }
    }
    None
}
