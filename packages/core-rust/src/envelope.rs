//! SOAP envelope and fault model.
//!
//! An [`Envelope`] owns a root `Envelope` element with an optional `Header`
//! and a `Body`. Protocol faults travel as a `Fault` element that is the first
//! child of the body; [`SoapFault`] reads and writes both SOAP 1.1 and SOAP 1.2
//! fault layouts.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::xml::{Element, Node, NodePath, QName, TreeError};

/// SOAP 1.1 envelope namespace.
pub const SOAP11_NS: &str = "http://schemas.xmlsoap.org/soap/envelope/";
/// SOAP 1.2 envelope namespace.
pub const SOAP12_NS: &str = "http://www.w3.org/2003/05/soap-envelope";

const ENVELOPE_PREFIX: &str = "soapenv";

/// SOAP protocol version of an envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoapVersion {
    Soap11,
    Soap12,
}

impl SoapVersion {
    /// Envelope namespace URI for this version.
    #[must_use]
    pub fn namespace(self) -> &'static str {
        match self {
            SoapVersion::Soap11 => SOAP11_NS,
            SoapVersion::Soap12 => SOAP12_NS,
        }
    }

    fn qname(self, local: &str) -> QName {
        QName::qualified(ENVELOPE_PREFIX, local, self.namespace())
    }
}

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// Root structured container of a message body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    version: SoapVersion,
    root: Element,
}

impl Envelope {
    /// Creates an envelope with an empty body.
    #[must_use]
    pub fn new(version: SoapVersion) -> Self {
        let root = Element::with_name(version.qname("Envelope"))
            .child(Element::with_name(version.qname("Body")));
        Self { version, root }
    }

    /// Creates an envelope whose body holds a single element.
    #[must_use]
    pub fn with_body(version: SoapVersion, payload: Element) -> Self {
        let mut envelope = Self::new(version);
        envelope.add_body_child(payload);
        envelope
    }

    /// Creates an envelope carrying `fault` as its body content.
    #[must_use]
    pub fn fault(version: SoapVersion, fault: &SoapFault) -> Self {
        Self::with_body(version, fault.to_element(version))
    }

    /// Wraps an existing root element. Returns `None` unless the root is an
    /// `Envelope` element of `version` with a `Body` child.
    #[must_use]
    pub fn from_root(version: SoapVersion, root: Element) -> Option<Self> {
        let ns = Some(version.namespace());
        if !root.name.matches("Envelope", ns) || root.find_child("Body", ns).is_none() {
            return None;
        }
        Some(Self { version, root })
    }

    #[must_use]
    pub fn version(&self) -> SoapVersion {
        self.version
    }

    /// The root `Envelope` element.
    #[must_use]
    pub fn root(&self) -> &Element {
        &self.root
    }

    /// Appends `child` to the `Header`, creating the header before the body
    /// when the envelope has none.
    pub fn add_header_child(&mut self, child: Element) {
        let ns = Some(self.version.namespace());
        if let Some(header) = self
            .root
            .children
            .iter_mut()
            .filter_map(Node::as_element_mut)
            .find(|el| el.name.matches("Header", ns))
        {
            header.push(child);
            return;
        }
        let mut header = Element::with_name(self.version.qname("Header"));
        header.push(child);
        self.root.children.insert(0, Node::Element(header));
    }

    #[must_use]
    pub fn header(&self) -> Option<&Element> {
        self.root.find_child("Header", Some(self.version.namespace()))
    }

    /// The `Body` element. Absent only if a node replacement removed it.
    #[must_use]
    pub fn body(&self) -> Option<&Element> {
        self.root.find_child("Body", Some(self.version.namespace()))
    }

    /// Path of the `Body` element relative to the root.
    #[must_use]
    pub fn body_path(&self) -> Option<NodePath> {
        self.root
            .position_of("Body", Some(self.version.namespace()))
            .map(|index| NodePath::root().child(index))
    }

    /// Path of the `Header` element relative to the root.
    #[must_use]
    pub fn header_path(&self) -> Option<NodePath> {
        self.root
            .position_of("Header", Some(self.version.namespace()))
            .map(|index| NodePath::root().child(index))
    }

    fn body_mut(&mut self) -> Option<&mut Element> {
        let path = self.body_path()?;
        self.root.element_at_mut(&path)
    }

    /// First element inside the body.
    #[must_use]
    pub fn first_body_element(&self) -> Option<&Element> {
        self.body().and_then(Element::first_element)
    }

    /// Removes every child element of the body. Text nodes are kept.
    pub fn clear_body(&mut self) {
        if let Some(body) = self.body_mut() {
            body.children.retain(|node| matches!(node, Node::Text(_)));
        }
    }

    /// Appends an element to the body.
    pub fn add_body_child(&mut self, child: Element) {
        if let Some(body) = self.body_mut() {
            body.push(child);
        }
    }

    /// Resolves a path relative to the root element.
    #[must_use]
    pub fn node_at(&self, path: &NodePath) -> Option<&Node> {
        self.root.node_at(path)
    }

    /// Element at a path relative to the root element.
    #[must_use]
    pub fn element_at(&self, path: &NodePath) -> Option<&Element> {
        self.root.element_at(path)
    }

    /// Replaces the node at `path` with `replacement` in its current position.
    ///
    /// # Errors
    ///
    /// Fails when `path` is the root or does not resolve.
    pub fn replace_node(&mut self, path: &NodePath, replacement: Element) -> Result<Node, TreeError> {
        self.root.replace_at(path, Node::Element(replacement))
    }

    /// The body's protocol fault element, if the body carries one.
    #[must_use]
    pub fn fault_element(&self) -> Option<&Element> {
        self.first_body_element()
            .filter(|el| el.name.matches("Fault", Some(self.version.namespace())))
    }

    #[must_use]
    pub fn has_fault(&self) -> bool {
        self.fault_element().is_some()
    }

    /// Reads the body fault, if any.
    #[must_use]
    pub fn soap_fault(&self) -> Option<SoapFault> {
        self.fault_element()
            .map(|el| SoapFault::from_element(self.version, el))
    }
}

impl fmt::Display for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.root, f)
    }
}

// ---------------------------------------------------------------------------
// SoapFault
// ---------------------------------------------------------------------------

/// Protocol-level fault carried in an envelope body.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SoapFault {
    /// Fault code text, e.g. `soapenv:Server`.
    pub code: Option<String>,
    /// Human-readable reason.
    pub reason: Option<String>,
    /// The `detail`/`Detail` element as a whole.
    pub detail: Option<Element>,
}

impl SoapFault {
    /// Reads a fault element of the given version. Missing or blank parts are `None`.
    #[must_use]
    pub fn from_element(version: SoapVersion, fault: &Element) -> Self {
        let ns = Some(version.namespace());
        let (code, reason, detail) = match version {
            SoapVersion::Soap11 => (
                fault.find_child("faultcode", None).map(Element::text),
                fault.find_child("faultstring", None).map(Element::text),
                fault.find_child("detail", None).cloned(),
            ),
            SoapVersion::Soap12 => (
                fault
                    .find_child("Code", ns)
                    .and_then(|c| c.find_child("Value", ns))
                    .map(Element::text),
                fault
                    .find_child("Reason", ns)
                    .and_then(|r| r.find_child("Text", ns))
                    .map(Element::text),
                fault.find_child("Detail", ns).cloned(),
            ),
        };
        Self {
            code: code.map(|c| c.trim().to_string()).filter(|c| !c.is_empty()),
            reason: reason.map(|r| r.trim().to_string()).filter(|r| !r.is_empty()),
            detail,
        }
    }

    /// Builds the fault element for the given version.
    #[must_use]
    pub fn to_element(&self, version: SoapVersion) -> Element {
        let mut fault = Element::with_name(version.qname("Fault"));
        match version {
            SoapVersion::Soap11 => {
                if let Some(code) = &self.code {
                    fault.push(Element::new("faultcode").text_node(code.clone()));
                }
                if let Some(reason) = &self.reason {
                    fault.push(Element::new("faultstring").text_node(reason.clone()));
                }
                if let Some(detail) = &self.detail {
                    let mut el = detail.clone();
                    el.name = QName::local("detail");
                    fault.push(el);
                }
            }
            SoapVersion::Soap12 => {
                if let Some(code) = &self.code {
                    fault.push(
                        Element::with_name(version.qname("Code"))
                            .child(Element::with_name(version.qname("Value")).text_node(code.clone())),
                    );
                }
                if let Some(reason) = &self.reason {
                    fault.push(
                        Element::with_name(version.qname("Reason")).child(
                            Element::with_name(version.qname("Text"))
                                .attr("xml:lang", "en")
                                .text_node(reason.clone()),
                        ),
                    );
                }
                if let Some(detail) = &self.detail {
                    let mut el = detail.clone();
                    el.name = version.qname("Detail");
                    fault.push(el);
                }
            }
        }
        fault
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
