//! The pipeline message: envelope, optional non-XML payload, properties and
//! read-only static entries.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::envelope::{Envelope, SoapVersion};
use crate::xml::Element;

/// Well-known property keys shared between mediators and transports.
pub mod keys {
    /// Set to `true` on an inbound message to request a fire-and-forget call.
    pub const OUT_ONLY: &str = "OUT_ONLY";
    /// Set to `true` to enable binary attachment optimization on the call.
    pub const ENABLE_MTOM: &str = "enableMTOM";
    /// Set by a transport on a response it could not deliver cleanly.
    pub const BLOCKING_SENDER_ERROR: &str = "BLOCKING_SENDER_ERROR";
    /// Stamped `true` when a callout failed.
    pub const SENDING_FAULT: &str = "SENDING_FAULT";
    pub const ERROR_CODE: &str = "ERROR_CODE";
    pub const ERROR_MESSAGE: &str = "ERROR_MESSAGE";
    pub const ERROR_DETAIL: &str = "ERROR_DETAIL";
    pub const ERROR_EXCEPTION: &str = "ERROR_EXCEPTION";
}

// ---------------------------------------------------------------------------
// RawPayload
// ---------------------------------------------------------------------------

/// A body that is not XML. When present it takes precedence over the envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RawPayload {
    Json(serde_json::Value),
    Text { content_type: String, body: String },
}

// ---------------------------------------------------------------------------
// PropertyValue
// ---------------------------------------------------------------------------

/// Shared error value stored in message properties.
///
/// Equality compares rendered messages, so two properties holding errors with
/// the same text compare equal.
#[derive(Clone)]
pub struct ErrorValue(Arc<anyhow::Error>);

impl ErrorValue {
    #[must_use]
    pub fn new(error: anyhow::Error) -> Self {
        Self(Arc::new(error))
    }

    /// The wrapped error.
    #[must_use]
    pub fn error(&self) -> &anyhow::Error {
        &self.0
    }
}

impl fmt::Debug for ErrorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ErrorValue({:#})", self.0)
    }
}

impl fmt::Display for ErrorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#}", self.0)
    }
}

impl std::error::Error for ErrorValue {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

impl PartialEq for ErrorValue {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.to_string() == other.to_string()
    }
}

/// Value of a message property or static entry.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Bool(bool),
    String(String),
    Element(Element),
    Json(serde_json::Value),
    Error(ErrorValue),
}

impl PropertyValue {
    #[must_use]
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            PropertyValue::Element(el) => Some(el),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_error(&self) -> Option<&ErrorValue> {
        match self {
            PropertyValue::Error(e) => Some(e),
            _ => None,
        }
    }

    /// `true` for `Bool(true)` and for the string `"true"` in any case.
    #[must_use]
    pub fn is_true(&self) -> bool {
        match self {
            PropertyValue::Bool(b) => *b,
            PropertyValue::String(s) => s.eq_ignore_ascii_case("true"),
            _ => false,
        }
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        PropertyValue::Bool(value)
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::String(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::String(value)
    }
}

impl From<Element> for PropertyValue {
    fn from(value: Element) -> Self {
        PropertyValue::Element(value)
    }
}

impl From<serde_json::Value> for PropertyValue {
    fn from(value: serde_json::Value) -> Self {
        PropertyValue::Json(value)
    }
}

impl From<anyhow::Error> for PropertyValue {
    fn from(value: anyhow::Error) -> Self {
        PropertyValue::Error(ErrorValue::new(value))
    }
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// Read-only static configuration entries shared by all messages of a pipeline.
pub type Entries = Arc<BTreeMap<String, PropertyValue>>;

/// Unit of work flowing through the pipeline.
///
/// Owned by the pipeline and handed to each mediation step as `&mut Message`.
#[derive(Debug, Clone)]
pub struct Message {
    id: String,
    envelope: Envelope,
    raw_payload: Option<RawPayload>,
    properties: BTreeMap<String, PropertyValue>,
    entries: Entries,
    to: Option<String>,
    action: Option<String>,
}

impl Message {
    /// Creates a message with a fresh id, no properties and no entries.
    #[must_use]
    pub fn new(envelope: Envelope) -> Self {
        Self {
            id: new_message_id(),
            envelope,
            raw_payload: None,
            properties: BTreeMap::new(),
            entries: Arc::new(BTreeMap::new()),
            to: None,
            action: None,
        }
    }

    /// Creates a message whose body holds a single element.
    #[must_use]
    pub fn with_payload(version: SoapVersion, payload: Element) -> Self {
        Self::new(Envelope::with_body(version, payload))
    }

    /// Builder-style static entries.
    #[must_use]
    pub fn with_entries(mut self, entries: Entries) -> Self {
        self.entries = entries;
        self
    }

    /// Builder-style destination address.
    #[must_use]
    pub fn with_to(mut self, to: impl Into<String>) -> Self {
        self.to = Some(to.into());
        self
    }

    /// Independent deep copy for outbound use. Gets its own message id.
    #[must_use]
    pub fn clone_for_outbound(&self) -> Self {
        Self {
            id: new_message_id(),
            ..self.clone()
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    pub fn envelope_mut(&mut self) -> &mut Envelope {
        &mut self.envelope
    }

    pub fn set_envelope(&mut self, envelope: Envelope) {
        self.envelope = envelope;
    }

    #[must_use]
    pub fn raw_payload(&self) -> Option<&RawPayload> {
        self.raw_payload.as_ref()
    }

    pub fn set_raw_payload(&mut self, payload: Option<RawPayload>) {
        self.raw_payload = payload;
    }

    /// `true` when the body is carried as a non-XML payload.
    #[must_use]
    pub fn has_raw_payload(&self) -> bool {
        self.raw_payload.is_some()
    }

    #[must_use]
    pub fn property(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.get(key)
    }

    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<PropertyValue>) {
        self.properties.insert(key.into(), value.into());
    }

    pub fn remove_property(&mut self, key: &str) -> Option<PropertyValue> {
        self.properties.remove(key)
    }

    #[must_use]
    pub fn properties(&self) -> &BTreeMap<String, PropertyValue> {
        &self.properties
    }

    /// Static entry lookup.
    #[must_use]
    pub fn entry(&self, key: &str) -> Option<&PropertyValue> {
        self.entries.get(key)
    }

    /// Property lookup falling back to static entries.
    #[must_use]
    pub fn lookup(&self, key: &str) -> Option<&PropertyValue> {
        self.property(key).or_else(|| self.entry(key))
    }

    /// `true` when the property is set to a true value.
    #[must_use]
    pub fn flag(&self, key: &str) -> bool {
        self.property(key).is_some_and(PropertyValue::is_true)
    }

    /// Destination address header.
    #[must_use]
    pub fn to(&self) -> Option<&str> {
        self.to.as_deref()
    }

    pub fn set_to(&mut self, to: Option<String>) {
        self.to = to;
    }

    /// Action header.
    #[must_use]
    pub fn action(&self) -> Option<&str> {
        self.action.as_deref()
    }

    pub fn set_action(&mut self, action: impl Into<String>) {
        self.action = Some(action.into());
    }
}

fn new_message_id() -> String {
    format!("urn:uuid:{}", uuid::Uuid::new_v4())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
