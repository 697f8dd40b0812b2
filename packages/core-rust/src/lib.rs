//! Callout core: XML element tree, SOAP envelopes, path expressions and the
//! pipeline message model.

pub mod envelope;
pub mod message;
pub mod xml;
pub mod xpath;

pub use envelope::{Envelope, SoapFault, SoapVersion, SOAP11_NS, SOAP12_NS};
pub use message::{keys, Entries, ErrorValue, Message, PropertyValue, RawPayload};
pub use xml::{Element, Node, NodePath, QName, TreeError};
pub use xpath::{XPath, XPathError, XPathItem, XPathResult};
