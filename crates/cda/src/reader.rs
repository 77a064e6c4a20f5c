//! Parsing raw bytes into an owned [`Document`].
//!
//! `roxmltree` performs the well-formedness check and namespace resolution; the borrowed tree
//! it produces is then copied into owned `Element`s so the result outlives the input buffer.
//! Element nesting is bounded by [`MAX_DEPTH`], checked by a streaming `quick-xml` scan before
//! any tree is built, so conversion and serialisation never recurse deeper than that.

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::tree::{Document, Element, NamespaceDecl, Node, QName};
use crate::{CdaError, CdaResult, XML_NAMESPACE};

/// Deepest element nesting accepted, root included.
pub const MAX_DEPTH: usize = 256;

impl Document {
    /// Parse a byte stream as an XML document.
    ///
    /// # Errors
    ///
    /// Returns [`CdaError::Encoding`] if the input is not UTF-8 and [`CdaError::Syntax`] if it is
    /// not well-formed XML or nests elements deeper than [`MAX_DEPTH`]. The syntax error carries
    /// the parser's line/column diagnostic. No partial document is ever returned.
    pub fn parse(bytes: &[u8]) -> CdaResult<Document> {
        let text = std::str::from_utf8(bytes)?;
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);

        check_depth(text)?;

        let options = roxmltree::ParsingOptions {
            allow_dtd: true,
            ..roxmltree::ParsingOptions::default()
        };
        let parsed = roxmltree::Document::parse_with_options(text, options).map_err(|e| {
            let pos = e.pos();
            CdaError::Syntax {
                message: e.to_string(),
                line: pos.row,
                column: pos.col,
            }
        })?;
        check_expanded_depth(&parsed)?;

        Ok(Document::new(convert_element(parsed.root_element())))
    }
}

/// Rejects documents nested deeper than [`MAX_DEPTH`] without recursing.
///
/// Other well-formedness errors are left for roxmltree to report, so its diagnostic wins.
fn check_depth(text: &str) -> CdaResult<()> {
    let mut reader = Reader::from_str(text);
    let mut depth = 0usize;

    loop {
        let opened = match reader.read_event() {
            Ok(Event::Start(_)) => true,
            Ok(Event::Empty(_)) => false,
            Ok(Event::End(_)) => {
                depth = depth.saturating_sub(1);
                continue;
            }
            Ok(Event::Eof) | Err(_) => return Ok(()),
            Ok(_) => continue,
        };

        if depth + 1 > MAX_DEPTH {
            let offset = usize::try_from(reader.buffer_position()).unwrap_or(usize::MAX);
            let (line, column) = position_at(text, offset);
            return Err(excessive_depth(depth + 1, line, column));
        }
        if opened {
            depth += 1;
        }
    }
}

/// Repeats the depth check on the parsed tree, where entity references have been expanded.
fn check_expanded_depth(document: &roxmltree::Document<'_>) -> CdaResult<()> {
    for node in document.root().descendants().filter(|n| n.is_element()) {
        let depth = node.ancestors().filter(|n| n.is_element()).count();
        if depth > MAX_DEPTH {
            let pos = document.text_pos_at(node.range().start);
            return Err(excessive_depth(depth, pos.row, pos.col));
        }
    }
    Ok(())
}

fn excessive_depth(depth: usize, line: u32, column: u32) -> CdaError {
    CdaError::Syntax {
        message: format!("excessive depth in document: {depth} at {line}:{column}"),
        line,
        column,
    }
}

/// 1-based line and column of a byte offset.
fn position_at(text: &str, offset: usize) -> (u32, u32) {
    let offset = offset.min(text.len());
    let consumed = &text.as_bytes()[..offset];
    let line = consumed.iter().filter(|&&b| b == b'\n').count() + 1;
    let column = consumed.iter().rev().take_while(|&&b| b != b'\n').count() + 1;
    (
        u32::try_from(line).unwrap_or(u32::MAX),
        u32::try_from(column).unwrap_or(u32::MAX),
    )
}

fn convert_element(node: roxmltree::Node<'_, '_>) -> Element {
    let tag = node.tag_name();
    let prefix = tag.namespace().and_then(|uri| node.lookup_prefix(uri));
    let mut element = Element::new(QName::new(tag.namespace(), tag.name())).with_prefix_hint(prefix);

    for decl in declared_namespaces(node) {
        element.declare_namespace(decl.prefix.as_deref(), &decl.uri);
    }

    for attr in node.attributes() {
        let prefix = attr.namespace().and_then(|uri| node.lookup_prefix(uri));
        element.set_attribute(QName::new(attr.namespace(), attr.name()), prefix, attr.value());
    }

    for child in node.children() {
        if child.is_element() {
            element.append(convert_element(child));
        } else if child.is_text() {
            if let Some(text) = child.text() {
                element.push_text(text);
            }
        } else if child.is_comment() {
            if let Some(text) = child.text() {
                element.push_node(Node::Comment(text.to_owned()));
            }
        }
    }

    element
}

/// Namespaces bound on `node` that its parent element does not already bind identically.
fn declared_namespaces(node: roxmltree::Node<'_, '_>) -> Vec<NamespaceDecl> {
    let inherited: Vec<(Option<&str>, &str)> = node
        .parent_element()
        .map(|parent| parent.namespaces().map(|ns| (ns.name(), ns.uri())).collect())
        .unwrap_or_default();

    node.namespaces()
        .filter(|ns| ns.uri() != XML_NAMESPACE)
        .filter(|ns| !inherited.contains(&(ns.name(), ns.uri())))
        .map(|ns| NamespaceDecl::new(ns.name(), ns.uri()))
        .collect()
}
