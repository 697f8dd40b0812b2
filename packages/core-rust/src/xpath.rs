//! Compiled path expressions over message envelopes.
//!
//! Supports the location-path subset of XPath 1.0 that mediation configs use
//! to point at elements:
//!
//! - origins: relative (context is the envelope root), `/`, `//`, `$body`, `$header`
//! - steps: `name`, `p:name`, `*`, `.`, `..`, `text()`, `node()`, `@attr`
//! - axes: `child::`, `self::`, `parent::`, `descendant::`,
//!   `descendant-or-self::`, `attribute::`
//! - predicates: `[n]`, `[last()]`, `[position()=n]`, `[fn:position()=n]`,
//!   `[@attr]`, `[@attr='value']`
//!
//! Expressions are compiled once and evaluated many times. Evaluation never
//! mutates the envelope; element results are returned as [`NodePath`]s.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use crate::envelope::{Envelope, SOAP11_NS, SOAP12_NS};
use crate::xml::{Element, Node, NodePath};

/// Prefixes bound in every expression.
const DEFAULT_NAMESPACES: &[(&str, &str)] = &[("s11", SOAP11_NS), ("s12", SOAP12_NS)];

/// Expression rejected at compile time.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid path expression `{expression}`: {reason}")]
pub struct XPathError {
    pub expression: String,
    pub reason: String,
}

// ---------------------------------------------------------------------------
// AST
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    Context,
    Document,
    Body,
    Header,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Child,
    SelfNode,
    Parent,
    Descendant,
    DescendantOrSelf,
    Attribute,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum NodeTest {
    Name { prefix: Option<String>, local: String },
    Wildcard,
    Text,
    AnyNode,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Predicate {
    Position(usize),
    Last,
    HasAttribute(String),
    AttributeEquals(String, String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Step {
    axis: Axis,
    test: NodeTest,
    predicates: Vec<Predicate>,
}

impl Step {
    fn descendant_or_self() -> Self {
        Self {
            axis: Axis::DescendantOrSelf,
            test: NodeTest::AnyNode,
            predicates: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// XPath
// ---------------------------------------------------------------------------

/// A compiled path expression.
#[derive(Debug, Clone)]
pub struct XPath {
    source: String,
    origin: Origin,
    steps: Vec<Step>,
    namespaces: BTreeMap<String, String>,
}

impl XPath {
    /// Compiles an expression using only the default prefix bindings.
    ///
    /// # Errors
    ///
    /// Returns [`XPathError`] for syntax outside the supported subset.
    pub fn compile(expression: &str) -> Result<Self, XPathError> {
        Self::compile_with_namespaces(expression, std::iter::empty::<(String, String)>())
    }

    /// Compiles an expression with additional `prefix -> namespace` bindings.
    ///
    /// # Errors
    ///
    /// Returns [`XPathError`] for syntax outside the supported subset.
    pub fn compile_with_namespaces<I, P, U>(expression: &str, namespaces: I) -> Result<Self, XPathError>
    where
        I: IntoIterator<Item = (P, U)>,
        P: Into<String>,
        U: Into<String>,
    {
        let mut bindings: BTreeMap<String, String> = DEFAULT_NAMESPACES
            .iter()
            .map(|(p, u)| ((*p).to_string(), (*u).to_string()))
            .collect();
        bindings.extend(namespaces.into_iter().map(|(p, u)| (p.into(), u.into())));

        let (origin, steps) = Parser::new(expression).parse()?;
        Ok(Self {
            source: expression.to_string(),
            origin,
            steps,
            namespaces: bindings,
        })
    }

    /// The expression text as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Evaluates against an envelope. The envelope root is the context node.
    #[must_use]
    pub fn evaluate(&self, envelope: &Envelope) -> XPathResult {
        let root = envelope.root();
        let start = match self.origin {
            Origin::Context => vec![Cursor::Node(NodePath::root())],
            Origin::Document => vec![Cursor::Document],
            Origin::Body => envelope.body_path().map(Cursor::Node).into_iter().collect(),
            Origin::Header => envelope.header_path().map(Cursor::Node).into_iter().collect(),
        };

        let mut current = start;
        for step in &self.steps {
            let mut next = Vec::new();
            for cursor in &current {
                let mut matched: Vec<Cursor> = candidates(root, cursor, step.axis)
                    .into_iter()
                    .filter(|c| self.test_matches(root, c, step.axis, &step.test))
                    .collect();
                for predicate in &step.predicates {
                    matched = apply_predicate(root, matched, predicate);
                }
                next.extend(matched);
            }
            next.sort();
            next.dedup();
            current = next;
        }

        let items = current
            .into_iter()
            .filter_map(|cursor| match cursor {
                Cursor::Document => None,
                Cursor::Node(path) => match root_node(root, &path)? {
                    NodeRef::Element(_) => Some(XPathItem::Element(path)),
                    NodeRef::Text(text) => Some(XPathItem::Text(text.to_string())),
                },
                Cursor::Attribute(owner, name) => {
                    let value = root.element_at(&owner)?.attributes.get(&name)?.clone();
                    Some(XPathItem::Attribute { name, value })
                }
            })
            .collect();
        XPathResult { items }
    }

    fn test_matches(&self, root: &Element, cursor: &Cursor, axis: Axis, test: &NodeTest) -> bool {
        if axis == Axis::Attribute {
            let Cursor::Attribute(_, name) = cursor else {
                return false;
            };
            return match test {
                NodeTest::Name { prefix: Some(p), local } => *name == format!("{p}:{local}"),
                NodeTest::Name { prefix: None, local } => name == local,
                NodeTest::Wildcard | NodeTest::AnyNode => true,
                NodeTest::Text => false,
            };
        }
        match (test, cursor) {
            (NodeTest::AnyNode, _) => true,
            (_, Cursor::Document | Cursor::Attribute(..)) => false,
            (test, Cursor::Node(path)) => match (test, root_node(root, path)) {
                (NodeTest::Text, Some(NodeRef::Text(_))) => true,
                (NodeTest::Wildcard, Some(NodeRef::Element(_))) => true,
                (NodeTest::Name { prefix, local }, Some(NodeRef::Element(el))) => {
                    if el.name.local != *local {
                        return false;
                    }
                    match prefix {
                        None => el.name.namespace.is_none(),
                        Some(p) => match self.namespaces.get(p) {
                            Some(uri) => el.name.namespace.as_deref() == Some(uri.as_str()),
                            None => el.name.prefix.as_deref() == Some(p.as_str()),
                        },
                    }
                }
                _ => false,
            },
        }
    }
}

impl fmt::Display for XPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// One item of an evaluation result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XPathItem {
    /// An element, addressed relative to the envelope root.
    Element(NodePath),
    /// A text node's content.
    Text(String),
    /// An attribute's name and value.
    Attribute { name: String, value: String },
}

/// Evaluation result: items in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XPathResult {
    items: Vec<XPathItem>,
}

impl XPathResult {
    #[must_use]
    pub fn items(&self) -> &[XPathItem] {
        &self.items
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The path of the first item, provided that item is an element.
    ///
    /// A result whose first item is text or an attribute yields `None`, as
    /// does an empty result.
    #[must_use]
    pub fn first_element(&self) -> Option<&NodePath> {
        match self.items.first()? {
            XPathItem::Element(path) => Some(path),
            XPathItem::Text(_) | XPathItem::Attribute { .. } => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Evaluation helpers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
enum Cursor {
    Document,
    Node(NodePath),
    Attribute(NodePath, String),
}

impl Cursor {
    /// Document-order sort key: the document precedes the root element, and an
    /// element's attributes sort after it but before its children.
    fn order_key(&self) -> (Vec<usize>, u8, &str) {
        match self {
            Cursor::Document => (Vec::new(), 0, ""),
            Cursor::Node(path) => (rooted(path), 0, ""),
            Cursor::Attribute(owner, name) => (rooted(owner), 1, name.as_str()),
        }
    }
}

fn rooted(path: &NodePath) -> Vec<usize> {
    let mut key = Vec::with_capacity(path.0.len() + 1);
    key.push(0);
    key.extend_from_slice(&path.0);
    key
}

impl Ord for Cursor {
    fn cmp(&self, other: &Self) -> Ordering {
        self.order_key().cmp(&other.order_key())
    }
}

impl PartialOrd for Cursor {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

enum NodeRef<'a> {
    Element(&'a Element),
    Text(&'a str),
}

fn root_node<'a>(root: &'a Element, path: &NodePath) -> Option<NodeRef<'a>> {
    if path.is_root() {
        return Some(NodeRef::Element(root));
    }
    match root.node_at(path)? {
        Node::Element(el) => Some(NodeRef::Element(el)),
        Node::Text(text) => Some(NodeRef::Text(text)),
    }
}

fn children(root: &Element, cursor: &Cursor) -> Vec<Cursor> {
    match cursor {
        Cursor::Document => vec![Cursor::Node(NodePath::root())],
        Cursor::Node(path) => match root.element_at(path) {
            Some(el) => (0..el.children.len())
                .map(|i| Cursor::Node(path.child(i)))
                .collect(),
            None => Vec::new(),
        },
        Cursor::Attribute(..) => Vec::new(),
    }
}

fn descendants(root: &Element, cursor: &Cursor, out: &mut Vec<Cursor>) {
    for child in children(root, cursor) {
        out.push(child.clone());
        descendants(root, &child, out);
    }
}

fn candidates(root: &Element, cursor: &Cursor, axis: Axis) -> Vec<Cursor> {
    match axis {
        Axis::Child => children(root, cursor),
        Axis::SelfNode => vec![cursor.clone()],
        Axis::Parent => match cursor {
            Cursor::Document => Vec::new(),
            Cursor::Node(path) => vec![path.parent().map_or(Cursor::Document, Cursor::Node)],
            Cursor::Attribute(owner, _) => vec![Cursor::Node(owner.clone())],
        },
        Axis::Descendant => {
            let mut out = Vec::new();
            descendants(root, cursor, &mut out);
            out
        }
        Axis::DescendantOrSelf => {
            let mut out = vec![cursor.clone()];
            descendants(root, cursor, &mut out);
            out
        }
        Axis::Attribute => match cursor {
            Cursor::Node(path) => root
                .element_at(path)
                .map(|el| {
                    el.attributes
                        .keys()
                        .map(|name| Cursor::Attribute(path.clone(), name.clone()))
                        .collect()
                })
                .unwrap_or_default(),
            Cursor::Document | Cursor::Attribute(..) => Vec::new(),
        },
    }
}

fn apply_predicate(root: &Element, matched: Vec<Cursor>, predicate: &Predicate) -> Vec<Cursor> {
    match predicate {
        Predicate::Position(n) => matched.into_iter().nth(n.saturating_sub(1)).into_iter().collect(),
        Predicate::Last => matched.into_iter().last().into_iter().collect(),
        Predicate::HasAttribute(name) => matched
            .into_iter()
            .filter(|c| attribute_of(root, c, name).is_some())
            .collect(),
        Predicate::AttributeEquals(name, value) => matched
            .into_iter()
            .filter(|c| attribute_of(root, c, name) == Some(value.as_str()))
            .collect(),
    }
}

fn attribute_of<'a>(root: &'a Element, cursor: &Cursor, name: &str) -> Option<&'a str> {
    let Cursor::Node(path) = cursor else {
        return None;
    };
    root.element_at(path)?.attributes.get(name).map(String::as_str)
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

struct Parser<'a> {
    source: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.trim().chars().collect(),
            pos: 0,
        }
    }

    fn error(&self, reason: impl Into<String>) -> XPathError {
        XPathError {
            expression: self.source.to_string(),
            reason: reason.into(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn eat(&mut self, expected: &str) -> bool {
        let len = expected.chars().count();
        let matches = self
            .chars
            .get(self.pos..self.pos + len)
            .is_some_and(|slice| slice.iter().copied().eq(expected.chars()));
        if matches {
            self.pos += len;
        }
        matches
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn parse(mut self) -> Result<(Origin, Vec<Step>), XPathError> {
        if self.chars.is_empty() {
            return Err(self.error("expression is empty"));
        }

        let mut steps = Vec::new();
        let origin = if self.eat("$body") {
            Origin::Body
        } else if self.eat("$header") {
            Origin::Header
        } else if self.peek() == Some('/') {
            Origin::Document
        } else {
            Origin::Context
        };

        let needs_separator = origin != Origin::Context;
        if needs_separator {
            if self.at_end() {
                return Ok((origin, steps));
            }
            if !self.parse_separator(&mut steps)? {
                return Err(self.error("expected `/` after variable"));
            }
            if self.at_end() && origin == Origin::Document && steps.is_empty() {
                return Ok((origin, steps));
            }
        }

        loop {
            steps.push(self.parse_step()?);
            if self.at_end() {
                break;
            }
            if !self.parse_separator(&mut steps)? {
                return Err(self.error(format!("unexpected `{}`", self.chars[self.pos])));
            }
            if self.at_end() {
                return Err(self.error("trailing `/`"));
            }
        }
        Ok((origin, steps))
    }

    /// Consumes `/` or `//`. `//` contributes a descendant-or-self step.
    fn parse_separator(&mut self, steps: &mut Vec<Step>) -> Result<bool, XPathError> {
        if self.eat("//") {
            if self.at_end() {
                return Err(self.error("trailing `//`"));
            }
            steps.push(Step::descendant_or_self());
            Ok(true)
        } else {
            Ok(self.eat("/"))
        }
    }

    fn parse_step(&mut self) -> Result<Step, XPathError> {
        if self.eat("..") {
            return Ok(Step {
                axis: Axis::Parent,
                test: NodeTest::AnyNode,
                predicates: Vec::new(),
            });
        }
        if self.peek() == Some('.') {
            self.pos += 1;
            return Ok(Step {
                axis: Axis::SelfNode,
                test: NodeTest::AnyNode,
                predicates: Vec::new(),
            });
        }

        let mut axis = Axis::Child;
        if self.eat("@") {
            axis = Axis::Attribute;
        } else if let Some(explicit) = self.parse_axis()? {
            axis = explicit;
        }

        let test = self.parse_node_test()?;
        let mut predicates = Vec::new();
        while self.peek() == Some('[') {
            self.pos += 1;
            predicates.push(self.parse_predicate()?);
        }
        Ok(Step {
            axis,
            test,
            predicates,
        })
    }

    fn parse_axis(&mut self) -> Result<Option<Axis>, XPathError> {
        let start = self.pos;
        let name = self.read_ncname();
        if name.is_empty() || !self.eat("::") {
            self.pos = start;
            return Ok(None);
        }
        let axis = match name.as_str() {
            "child" => Axis::Child,
            "self" => Axis::SelfNode,
            "parent" => Axis::Parent,
            "descendant" => Axis::Descendant,
            "descendant-or-self" => Axis::DescendantOrSelf,
            "attribute" => Axis::Attribute,
            other => return Err(self.error(format!("unsupported axis `{other}`"))),
        };
        Ok(Some(axis))
    }

    fn parse_node_test(&mut self) -> Result<NodeTest, XPathError> {
        if self.eat("*") {
            return Ok(NodeTest::Wildcard);
        }
        let first = self.read_ncname();
        if first.is_empty() {
            return Err(self.error("expected a name test"));
        }
        if self.eat("()") {
            return match first.as_str() {
                "text" => Ok(NodeTest::Text),
                "node" => Ok(NodeTest::AnyNode),
                other => Err(self.error(format!("unsupported node test `{other}()`"))),
            };
        }
        if self.peek() == Some('(') {
            return Err(self.error(format!("unsupported function `{first}`")));
        }
        if self.peek() == Some(':') && self.peek_at(1) != Some(':') {
            self.pos += 1;
            let local = self.read_ncname();
            if local.is_empty() {
                return Err(self.error(format!("expected a local name after `{first}:`")));
            }
            return Ok(NodeTest::Name {
                prefix: Some(first),
                local,
            });
        }
        Ok(NodeTest::Name {
            prefix: None,
            local: first,
        })
    }

    fn parse_predicate(&mut self) -> Result<Predicate, XPathError> {
        self.skip_ws();
        let predicate = if self.peek().is_some_and(|c| c.is_ascii_digit()) {
            Predicate::Position(self.read_position()?)
        } else if self.eat("last()") {
            Predicate::Last
        } else if self.eat("fn:position()") || self.eat("position()") {
            self.skip_ws();
            if !self.eat("=") {
                return Err(self.error("expected `=` after position()"));
            }
            self.skip_ws();
            Predicate::Position(self.read_position()?)
        } else if self.eat("@") {
            let name = self.read_qname();
            if name.is_empty() {
                return Err(self.error("expected an attribute name"));
            }
            self.skip_ws();
            if self.eat("=") {
                self.skip_ws();
                Predicate::AttributeEquals(name, self.read_literal()?)
            } else {
                Predicate::HasAttribute(name)
            }
        } else {
            return Err(self.error("unsupported predicate"));
        };
        self.skip_ws();
        if !self.eat("]") {
            return Err(self.error("expected `]`"));
        }
        Ok(predicate)
    }

    fn read_position(&mut self) -> Result<usize, XPathError> {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }
        let digits: String = self.chars[start..self.pos].iter().collect();
        match digits.parse::<usize>() {
            Ok(n) if n > 0 => Ok(n),
            _ => Err(self.error(format!("invalid position `{digits}`"))),
        }
    }

    fn read_literal(&mut self) -> Result<String, XPathError> {
        let quote = match self.peek() {
            Some(q @ ('\'' | '"')) => q,
            _ => return Err(self.error("expected a quoted literal")),
        };
        self.pos += 1;
        let start = self.pos;
        while self.peek().is_some_and(|c| c != quote) {
            self.pos += 1;
        }
        if self.at_end() {
            return Err(self.error("unterminated literal"));
        }
        let literal = self.chars[start..self.pos].iter().collect();
        self.pos += 1;
        Ok(literal)
    }

    fn read_ncname(&mut self) -> String {
        let start = self.pos;
        if self.peek().is_some_and(|c| c.is_alphabetic() || c == '_') {
            self.pos += 1;
            while self
                .peek()
                .is_some_and(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
            {
                self.pos += 1;
            }
        }
        self.chars[start..self.pos].iter().collect()
    }

    fn read_qname(&mut self) -> String {
        let mut name = self.read_ncname();
        if !name.is_empty() && self.peek() == Some(':') && self.peek_at(1) != Some(':') {
            self.pos += 1;
            name.push(':');
            name.push_str(&self.read_ncname());
        }
        name
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::SoapVersion;

    fn envelope() -> Envelope {
        let mut env = Envelope::with_body(
            SoapVersion::Soap11,
            Element::new("order")
                .attr("id", "1")
                .child(Element::new("item").attr("sku", "a").text_node("apple"))
                .child(Element::new("item").attr("sku", "b").text_node("pear"))
                .child(Element::new("note").text_node("fragile")),
        );
        env.add_header_child(Element::new("trace").attr("id", "t-1"));
        env
    }

    fn names(env: &Envelope, result: &XPathResult) -> Vec<String> {
        result
            .items()
            .iter()
            .map(|item| match item {
                XPathItem::Element(path) => env.element_at(path).unwrap().name.local.clone(),
                XPathItem::Text(t) => format!("text:{t}"),
                XPathItem::Attribute { name, value } => format!("@{name}={value}"),
            })
            .collect()
    }

    fn eval(expr: &str) -> Vec<String> {
        let env = envelope();
        let xpath = XPath::compile(expr).unwrap();
        names(&env, &xpath.evaluate(&env))
    }

    #[test]
    fn body_variable_selects_children() {
        assert_eq!(eval("$body/order/item"), vec!["item", "item"]);
        assert_eq!(eval("$body/*"), vec!["order"]);
        assert_eq!(eval("$body"), vec!["Body"]);
        assert_eq!(eval("$header/trace"), vec!["trace"]);
    }

    #[test]
    fn prefixed_steps_use_default_bindings() {
        assert_eq!(eval("s11:Body/order/note"), vec!["note"]);
        assert_eq!(eval("/s11:Envelope/s11:Body/child::*[fn:position()=1]"), vec!["order"]);
        assert!(eval("s12:Body").is_empty());
    }

    #[test]
    fn unprefixed_names_do_not_match_namespaced_elements() {
        assert!(eval("Body").is_empty());
    }

    #[test]
    fn unbound_prefix_falls_back_to_element_prefix() {
        assert_eq!(eval("soapenv:Body/order"), vec!["order"]);
    }

    #[test]
    fn positional_predicates() {
        assert_eq!(eval("$body/order/item[2]/text()"), vec!["text:pear"]);
        assert_eq!(eval("$body/order/*[last()]"), vec!["note"]);
        assert!(eval("$body/order/item[3]").is_empty());
    }

    #[test]
    fn attribute_steps_and_predicates() {
        assert_eq!(eval("$body/order/item[@sku='b']/text()"), vec!["text:pear"]);
        assert_eq!(eval("$body/order/@id"), vec!["@id=1"]);
        assert_eq!(eval("$body/order/*[@sku]"), vec!["item", "item"]);
    }

    #[test]
    fn descendant_search_in_document_order() {
        assert_eq!(eval("//item"), vec!["item", "item"]);
        assert_eq!(eval("//*[@id]"), vec!["trace", "order"]);
        assert_eq!(eval("$body//note/.."), vec!["order"]);
        assert_eq!(eval("descendant::note"), vec!["note"]);
    }

    #[test]
    fn first_element_requires_element_first() {
        let env = envelope();
        let xpath = XPath::compile("$body/order/item").unwrap();
        let result = xpath.evaluate(&env);
        assert_eq!(result.first_element(), Some(&NodePath(vec![1, 0, 0])));

        let text = XPath::compile("$body/order/note/text()").unwrap().evaluate(&env);
        assert!(!text.is_empty());
        assert!(text.first_element().is_none());

        let empty = XPath::compile("$body/missing").unwrap().evaluate(&env);
        assert!(empty.is_empty());
        assert!(empty.first_element().is_none());
    }

    #[test]
    fn custom_namespace_bindings() {
        let ns = "urn:shop";
        let env = Envelope::with_body(
            SoapVersion::Soap11,
            Element::with_name(crate::xml::QName::qualified("x", "cart", ns)),
        );
        let xpath = XPath::compile_with_namespaces("$body/shop:cart", [("shop", ns)]).unwrap();
        assert!(xpath.evaluate(&env).first_element().is_some());
        assert_eq!(xpath.to_string(), "$body/shop:cart");
    }

    #[test]
    fn rejects_unsupported_syntax() {
        for bad in ["", "count(//a)", "$body/", "a[", "a[0]", "a | b", "following::a", "a[@x=1]"] {
            assert!(XPath::compile(bad).is_err(), "expected `{bad}` to be rejected");
        }
    }
}
