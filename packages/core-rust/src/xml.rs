//! Minimal owned XML element tree.
//!
//! Message bodies are held as a tree of [`Element`]s and text [`Node`]s.
//! Trees are plain owned values: cloning an element deep-copies it, and a
//! location inside a tree is addressed by a [`NodePath`] of child indices
//! rather than by a reference, so evaluation results never borrow the tree
//! they were computed from.
//!
//! `Display` renders canonical XML text. Two trees that render to the same
//! string are considered byte-for-byte identical.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// QName
// ---------------------------------------------------------------------------

/// Qualified element name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QName {
    /// Prefix used when serializing, e.g. `soapenv`.
    pub prefix: Option<String>,
    /// Local part of the name.
    pub local: String,
    /// Namespace URI, if the element is namespaced.
    pub namespace: Option<String>,
}

impl QName {
    /// Unqualified name with no namespace.
    #[must_use]
    pub fn local(local: impl Into<String>) -> Self {
        Self {
            prefix: None,
            local: local.into(),
            namespace: None,
        }
    }

    /// Namespaced name serialized with the given prefix.
    #[must_use]
    pub fn qualified(
        prefix: impl Into<String>,
        local: impl Into<String>,
        namespace: impl Into<String>,
    ) -> Self {
        Self {
            prefix: Some(prefix.into()),
            local: local.into(),
            namespace: Some(namespace.into()),
        }
    }

    /// Returns `true` if this name has the given local part and namespace.
    #[must_use]
    pub fn matches(&self, local: &str, namespace: Option<&str>) -> bool {
        self.local == local && self.namespace.as_deref() == namespace
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.prefix {
            Some(prefix) => write!(f, "{prefix}:{}", self.local),
            None => f.write_str(&self.local),
        }
    }
}

// ---------------------------------------------------------------------------
// Node / Element
// ---------------------------------------------------------------------------

/// A child of an element: either a nested element or a run of text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    Element(Element),
    Text(String),
}

impl Node {
    /// Returns the element if this node is one.
    #[must_use]
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(el) => Some(el),
            Node::Text(_) => None,
        }
    }

    /// Mutable variant of [`Node::as_element`].
    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            Node::Element(el) => Some(el),
            Node::Text(_) => None,
        }
    }
}

/// An XML element with attributes and ordered children.
///
/// Attributes are kept in a `BTreeMap` so serialization order is deterministic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub name: QName,
    pub attributes: BTreeMap<String, String>,
    pub children: Vec<Node>,
}

impl Element {
    /// Creates an empty element with no namespace.
    #[must_use]
    pub fn new(local: impl Into<String>) -> Self {
        Self::with_name(QName::local(local))
    }

    /// Creates an empty element with the given qualified name.
    #[must_use]
    pub fn with_name(name: QName) -> Self {
        Self {
            name,
            attributes: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    /// Builder-style attribute setter.
    #[must_use]
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Builder-style child element append.
    #[must_use]
    pub fn child(mut self, child: Element) -> Self {
        self.children.push(Node::Element(child));
        self
    }

    /// Builder-style text append.
    #[must_use]
    pub fn text_node(mut self, text: impl Into<String>) -> Self {
        self.children.push(Node::Text(text.into()));
        self
    }

    /// Appends a child element in place.
    pub fn push(&mut self, child: Element) {
        self.children.push(Node::Element(child));
    }

    /// Concatenated text of the direct text children.
    #[must_use]
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|node| match node {
                Node::Text(t) => Some(t.as_str()),
                Node::Element(_) => None,
            })
            .collect()
    }

    /// Iterator over the direct child elements, skipping text.
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(Node::as_element)
    }

    /// First direct child element, if any.
    #[must_use]
    pub fn first_element(&self) -> Option<&Element> {
        self.child_elements().next()
    }

    /// First direct child element with the given local name and namespace.
    #[must_use]
    pub fn find_child(&self, local: &str, namespace: Option<&str>) -> Option<&Element> {
        self.child_elements()
            .find(|el| el.name.matches(local, namespace))
    }

    /// Index into `children` of the first child element matching the name.
    #[must_use]
    pub fn position_of(&self, local: &str, namespace: Option<&str>) -> Option<usize> {
        self.children.iter().position(|node| {
            node.as_element()
                .is_some_and(|el| el.name.matches(local, namespace))
        })
    }

    /// Resolves a non-empty path relative to this element.
    #[must_use]
    pub fn node_at(&self, path: &NodePath) -> Option<&Node> {
        let (last, parents) = path.0.split_last()?;
        let mut current = self;
        for &index in parents {
            current = current.children.get(index)?.as_element()?;
        }
        current.children.get(*last)
    }

    /// Element at `path`, or `self` for the empty path.
    #[must_use]
    pub fn element_at(&self, path: &NodePath) -> Option<&Element> {
        if path.is_root() {
            return Some(self);
        }
        self.node_at(path)?.as_element()
    }

    /// Mutable element at `path`, or `self` for the empty path.
    pub fn element_at_mut(&mut self, path: &NodePath) -> Option<&mut Element> {
        let mut current = self;
        for &index in &path.0 {
            current = current.children.get_mut(index)?.as_element_mut()?;
        }
        Some(current)
    }

    /// Replaces the node at a non-empty `path` with `replacement`, returning the
    /// node that was there. Sibling order is preserved.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::RootPath`] for the empty path and
    /// [`TreeError::NoSuchNode`] when the path does not resolve.
    pub fn replace_at(&mut self, path: &NodePath, replacement: Node) -> Result<Node, TreeError> {
        let (parent, index) = path.split_parent().ok_or(TreeError::RootPath)?;
        let parent_el = self
            .element_at_mut(&parent)
            .ok_or_else(|| TreeError::NoSuchNode(path.clone()))?;
        let slot = parent_el
            .children
            .get_mut(index)
            .ok_or_else(|| TreeError::NoSuchNode(path.clone()))?;
        Ok(std::mem::replace(slot, replacement))
    }
}

// ---------------------------------------------------------------------------
// NodePath
// ---------------------------------------------------------------------------

/// Location of a node as child indices from a root element.
///
/// Ordering of paths is document order: an ancestor sorts before its
/// descendants and earlier siblings sort before later ones.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodePath(pub Vec<usize>);

impl NodePath {
    /// Path of the root element itself.
    #[must_use]
    pub fn root() -> Self {
        Self(Vec::new())
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Path of the `index`-th child of this node.
    #[must_use]
    pub fn child(&self, index: usize) -> Self {
        let mut steps = self.0.clone();
        steps.push(index);
        Self(steps)
    }

    /// Parent path, or `None` for the root.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        self.split_parent().map(|(parent, _)| parent)
    }

    /// Splits into parent path and index within the parent.
    #[must_use]
    pub fn split_parent(&self) -> Option<(Self, usize)> {
        let (last, rest) = self.0.split_last()?;
        Some((Self(rest.to_vec()), *last))
    }
}

/// Structural edit failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    #[error("the root element cannot be replaced in place")]
    RootPath,
    #[error("no node at path {0:?}")]
    NoSuchNode(NodePath),
}

// ---------------------------------------------------------------------------
// Serialization
// ---------------------------------------------------------------------------

/// In-scope prefix bindings while serializing. `None` is the default namespace.
type Scope = BTreeMap<Option<String>, String>;

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_element(self, f, &Scope::new())
    }
}

fn write_element(el: &Element, f: &mut fmt::Formatter<'_>, scope: &Scope) -> fmt::Result {
    write!(f, "<{}", el.name)?;

    let mut inner_scope = scope.clone();
    if let Some(ns) = &el.name.namespace {
        if scope.get(&el.name.prefix) != Some(ns) {
            match &el.name.prefix {
                Some(prefix) => write!(f, " xmlns:{prefix}=\"{}\"", escape(ns, true))?,
                None => write!(f, " xmlns=\"{}\"", escape(ns, true))?,
            }
            inner_scope.insert(el.name.prefix.clone(), ns.clone());
        }
    } else if el.name.prefix.is_none() && scope.contains_key(&None) {
        // Unqualified child under a default namespace must undeclare it.
        f.write_str(" xmlns=\"\"")?;
        inner_scope.remove(&None);
    }

    for (name, value) in &el.attributes {
        write!(f, " {name}=\"{}\"", escape(value, true))?;
    }

    if el.children.is_empty() {
        return f.write_str("/>");
    }
    f.write_str(">")?;
    for child in &el.children {
        match child {
            Node::Element(c) => write_element(c, f, &inner_scope)?,
            Node::Text(t) => f.write_str(&escape(t, false))?,
        }
    }
    write!(f, "</{}>", el.name)
}

fn escape(raw: &str, attribute: bool) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
