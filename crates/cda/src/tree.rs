//! Owned, namespace-aware XML element tree.
//!
//! Every `Element` owns its children outright, so an element always has exactly one parent
//! (or none, for a document root). Moving content between documents is therefore an explicit
//! deep copy via `Clone`; two trees never share nodes.

use std::fmt;

/// A namespace-qualified element or attribute name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QName {
    /// Namespace URI, or `None` for names in no namespace.
    pub namespace: Option<String>,
    /// Local part of the name.
    pub local: String,
}

impl QName {
    pub fn new(namespace: Option<&str>, local: impl Into<String>) -> Self {
        Self {
            namespace: namespace.map(str::to_owned),
            local: local.into(),
        }
    }

    /// A name in no namespace (the usual case for attributes).
    pub fn local(local: impl Into<String>) -> Self {
        Self {
            namespace: None,
            local: local.into(),
        }
    }

    pub fn is(&self, namespace: Option<&str>, local: &str) -> bool {
        self.local == local && self.namespace.as_deref() == namespace
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{{{}}}{}", ns, self.local),
            None => f.write_str(&self.local),
        }
    }
}

/// A namespace declaration (`xmlns` or `xmlns:prefix`) carried on an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceDecl {
    /// `None` declares the default namespace.
    pub prefix: Option<String>,
    pub uri: String,
}

impl NamespaceDecl {
    pub fn new(prefix: Option<&str>, uri: impl Into<String>) -> Self {
        Self {
            prefix: prefix.map(str::to_owned),
            uri: uri.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: QName,
    /// Prefix the attribute was written with, used as a hint on output.
    pub prefix: Option<String>,
    pub value: String,
}

/// Content of an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
    Comment(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    name: QName,
    prefix: Option<String>,
    namespaces: Vec<NamespaceDecl>,
    attributes: Vec<Attribute>,
    children: Vec<Node>,
}

impl Element {
    pub fn new(name: QName) -> Self {
        Self {
            name,
            prefix: None,
            namespaces: Vec::new(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Shorthand for an element in the given namespace.
    pub fn in_namespace(namespace: &str, local: &str) -> Self {
        Self::new(QName::new(Some(namespace), local))
    }

    pub fn name(&self) -> &QName {
        &self.name
    }

    pub fn local_name(&self) -> &str {
        &self.name.local
    }

    pub fn namespace(&self) -> Option<&str> {
        self.name.namespace.as_deref()
    }

    pub fn is(&self, namespace: Option<&str>, local: &str) -> bool {
        self.name.is(namespace, local)
    }

    /// Prefix the element was written with in its source document, if any.
    pub fn prefix_hint(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    pub fn with_prefix_hint(mut self, prefix: Option<&str>) -> Self {
        self.prefix = prefix.map(str::to_owned);
        self
    }

    pub fn namespaces(&self) -> &[NamespaceDecl] {
        &self.namespaces
    }

    pub fn declare_namespace(&mut self, prefix: Option<&str>, uri: &str) {
        self.namespaces.retain(|decl| decl.prefix.as_deref() != prefix);
        self.namespaces.push(NamespaceDecl::new(prefix, uri));
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Returns the value of the un-namespaced attribute `local`.
    pub fn attribute(&self, local: &str) -> Option<&str> {
        self.attribute_ns(None, local)
    }

    pub fn attribute_ns(&self, namespace: Option<&str>, local: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attr| attr.name.is(namespace, local))
            .map(|attr| attr.value.as_str())
    }

    /// Sets an attribute, replacing any existing attribute with the same name.
    pub fn set_attribute(&mut self, name: QName, prefix: Option<&str>, value: impl Into<String>) {
        let value = value.into();
        let prefix = prefix.map(str::to_owned);
        match self.attributes.iter_mut().find(|attr| attr.name == name) {
            Some(existing) => {
                existing.value = value;
                existing.prefix = prefix;
            }
            None => self.attributes.push(Attribute {
                name,
                prefix,
                value,
            }),
        }
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Direct child elements, in document order.
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(el) => Some(el),
            _ => None,
        })
    }

    /// All descendant elements in document order, not including `self`.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants {
            stack: vec![self.children.iter()],
        }
    }

    /// Appends a child element and returns a mutable reference to it.
    pub fn append(&mut self, child: Element) -> &mut Element {
        self.children.push(Node::Element(child));
        match self.children.last_mut() {
            Some(Node::Element(el)) => el,
            _ => unreachable!("an element was pushed immediately above"),
        }
    }

    pub fn push_node(&mut self, node: Node) {
        self.children.push(node);
    }

    pub fn push_text(&mut self, text: impl Into<String>) {
        self.children.push(Node::Text(text.into()));
    }

    /// Concatenated text of this element and its descendants.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(self, &mut out);
        out
    }
}

fn collect_text(element: &Element, out: &mut String) {
    for node in &element.children {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Element(child) => collect_text(child, out),
            Node::Comment(_) => {}
        }
    }
}

/// Pre-order iterator over descendant elements. See [`Element::descendants`].
pub struct Descendants<'a> {
    stack: Vec<std::slice::Iter<'a, Node>>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Element;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(top) = self.stack.last_mut() {
            match top.next() {
                Some(Node::Element(el)) => {
                    self.stack.push(el.children.iter());
                    return Some(el);
                }
                Some(_) => continue,
                None => {
                    self.stack.pop();
                }
            }
        }
        None
    }
}

/// A parsed or constructed XML document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    root: Element,
}

impl Document {
    pub fn new(root: Element) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    /// The root element followed by every descendant, in document order.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        std::iter::once(&self.root).chain(self.root.descendants())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(local: &str) -> Element {
        Element::in_namespace(crate::HL7_NAMESPACE, local)
    }

    #[test]
    fn descendants_are_in_document_order_and_exclude_self() {
        let mut root = leaf("root");
        let a = root.append(leaf("a"));
        a.append(leaf("a1"));
        a.append(leaf("a2"));
        root.push_text("  ");
        root.append(leaf("b"));

        let names: Vec<_> = root.descendants().map(Element::local_name).collect();
        assert_eq!(names, vec!["a", "a1", "a2", "b"]);

        let doc = Document::new(root);
        assert_eq!(doc.elements().next().map(Element::local_name), Some("root"));
        assert_eq!(doc.elements().count(), 5);
    }

    #[test]
    fn attribute_lookup_respects_namespace() {
        let mut el = leaf("value");
        el.set_attribute(QName::local("code"), None, "76078-5");
        el.set_attribute(QName::new(Some(crate::XSI_NAMESPACE), "type"), Some("xsi"), "CD");

        assert_eq!(el.attribute("code"), Some("76078-5"));
        assert_eq!(el.attribute("type"), None);
        assert_eq!(el.attribute_ns(Some(crate::XSI_NAMESPACE), "type"), Some("CD"));

        el.set_attribute(QName::local("code"), None, "76080-1");
        assert_eq!(el.attributes().len(), 2);
        assert_eq!(el.attribute("code"), Some("76080-1"));
    }

    #[test]
    fn cloned_subtrees_are_independent() {
        let mut original = leaf("section");
        original.append(leaf("title")).push_text("Problems");

        let mut copy = original.clone();
        copy.append(leaf("entry"));

        assert_eq!(original.child_elements().count(), 1);
        assert_eq!(copy.child_elements().count(), 2);
        assert_eq!(original.text_content(), "Problems");
    }
}
