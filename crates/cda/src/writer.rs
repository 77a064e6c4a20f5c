//! Serialising a [`Document`] back to UTF-8 text.
//!
//! Elements store namespace URIs, not prefixes, so prefixes are re-resolved while writing:
//! - a name in the in-scope default namespace is written unprefixed
//! - otherwise an in-scope prefix bound to the URI is reused
//! - otherwise a declaration is added on the element, preferring the source prefix
//!
//! Resolution is a pure function of the tree, so writing the same tree twice yields identical
//! bytes.

use quick_xml::escape::partial_escape;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::tree::{Document, Element, Node, QName};
use crate::{CdaError, CdaResult, XML_NAMESPACE};

impl Document {
    /// Serialise the document to a string (no XML declaration).
    ///
    /// # Errors
    ///
    /// Returns [`CdaError::Write`] if the writer fails. This indicates a broken tree invariant
    /// rather than bad caller input.
    pub fn to_xml_string(&self) -> CdaResult<String> {
        let mut writer = Writer::new(Vec::new());
        let mut scope = Scope::default();
        write_element(&mut writer, self.root(), &mut scope)?;
        String::from_utf8(writer.into_inner()).map_err(|e| CdaError::Write(e.to_string()))
    }
}

/// In-scope namespace bindings, innermost last. A binding of the default namespace to `""`
/// means "no default namespace".
#[derive(Default)]
struct Scope {
    bindings: Vec<(Option<String>, String)>,
}

impl Scope {
    fn resolve(&self, prefix: Option<&str>) -> Option<&str> {
        self.bindings
            .iter()
            .rev()
            .find(|(p, _)| p.as_deref() == prefix)
            .map(|(_, uri)| uri.as_str())
    }

    fn default_namespace(&self) -> Option<&str> {
        self.resolve(None).filter(|uri| !uri.is_empty())
    }

    /// Innermost non-default prefix currently bound to `uri`.
    fn prefix_for(&self, uri: &str) -> Option<&str> {
        self.bindings
            .iter()
            .rev()
            .filter_map(|(p, u)| p.as_deref().filter(|_| u == uri))
            .find(|p| self.resolve(Some(*p)) == Some(uri))
    }

    fn is_free(&self, prefix: &str) -> bool {
        prefix != "xml" && prefix != "xmlns" && self.resolve(Some(prefix)).is_none()
    }

    fn generated_prefix(&self) -> String {
        (0..)
            .map(|n| format!("ns{n}"))
            .find(|candidate| self.is_free(candidate))
            .unwrap_or_default()
    }
}

/// Declarations added on the element currently being written.
struct Pending<'s> {
    scope: &'s mut Scope,
    declared: Vec<(Option<String>, String)>,
}

impl Pending<'_> {
    fn declare(&mut self, prefix: Option<String>, uri: &str) {
        self.scope.bindings.push((prefix.clone(), uri.to_owned()));
        self.declared.push((prefix, uri.to_owned()));
    }

    fn element_prefix(&mut self, element: &Element) -> Option<String> {
        let Some(uri) = element.namespace() else {
            if self.scope.default_namespace().is_some() {
                self.declare(None, "");
            }
            return None;
        };
        if self.scope.default_namespace() == Some(uri) {
            return None;
        }
        if let Some(prefix) = self.scope.prefix_for(uri) {
            return Some(prefix.to_owned());
        }
        match element.prefix_hint() {
            None => {
                self.declare(None, uri);
                None
            }
            Some(hint) => {
                let prefix = self.fresh_prefix(hint);
                self.declare(Some(prefix.clone()), uri);
                Some(prefix)
            }
        }
    }

    fn attribute_prefix(&mut self, name: &QName, hint: Option<&str>) -> Option<String> {
        let uri = name.namespace.as_deref()?;
        if uri == XML_NAMESPACE {
            return Some("xml".to_owned());
        }
        if let Some(prefix) = self.scope.prefix_for(uri) {
            return Some(prefix.to_owned());
        }
        let prefix = match hint {
            Some(hint) => self.fresh_prefix(hint),
            None => self.scope.generated_prefix(),
        };
        self.declare(Some(prefix.clone()), uri);
        Some(prefix)
    }

    fn fresh_prefix(&self, hint: &str) -> String {
        if self.scope.is_free(hint) {
            hint.to_owned()
        } else {
            self.scope.generated_prefix()
        }
    }
}

fn qualified(prefix: Option<&str>, local: &str) -> String {
    match prefix {
        Some(prefix) => format!("{prefix}:{local}"),
        None => local.to_owned(),
    }
}

fn write_element(
    writer: &mut Writer<Vec<u8>>,
    element: &Element,
    scope: &mut Scope,
) -> CdaResult<()> {
    let depth = scope.bindings.len();
    let mut pending = Pending {
        scope: &mut *scope,
        declared: Vec::new(),
    };

    for decl in element.namespaces() {
        if pending.scope.resolve(decl.prefix.as_deref()) != Some(decl.uri.as_str()) {
            pending.declare(decl.prefix.clone(), &decl.uri);
        }
    }

    let element_prefix = pending.element_prefix(element);
    let attributes: Vec<(String, &str)> = element
        .attributes()
        .iter()
        .map(|attr| {
            let prefix = pending.attribute_prefix(&attr.name, attr.prefix.as_deref());
            (qualified(prefix.as_deref(), &attr.name.local), attr.value.as_str())
        })
        .collect();
    let declared = std::mem::take(&mut pending.declared);

    let name = qualified(element_prefix.as_deref(), element.local_name());
    let mut start = BytesStart::new(name.as_str());
    for (prefix, uri) in &declared {
        let key = match prefix {
            Some(prefix) => format!("xmlns:{prefix}"),
            None => "xmlns".to_owned(),
        };
        start.push_attribute((key.as_str(), uri.as_str()));
    }
    for (key, value) in &attributes {
        start.push_attribute((key.as_str(), *value));
    }

    if element.children().is_empty() {
        emit(writer, Event::Empty(start))?;
    } else {
        emit(writer, Event::Start(start))?;
        for node in element.children() {
            match node {
                Node::Element(child) => write_element(writer, child, scope)?,
                Node::Text(text) => {
                    let escaped = partial_escape(text.as_str());
                    emit(writer, Event::Text(BytesText::from_escaped(escaped)))?
                }
                Node::Comment(text) => {
                    emit(writer, Event::Comment(BytesText::from_escaped(text.as_str())))?
                }
            }
        }
        emit(writer, Event::End(BytesEnd::new(name.as_str())))?;
    }

    scope.bindings.truncate(depth);
    Ok(())
}

fn emit(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> CdaResult<()> {
    writer
        .write_event(event)
        .map_err(|e| CdaError::Write(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{HL7_NAMESPACE, SDTC_NAMESPACE, XSI_NAMESPACE};

    #[test]
    fn writes_default_namespace_unprefixed() {
        let mut root = Element::in_namespace(HL7_NAMESPACE, "ClinicalDocument");
        root.declare_namespace(None, HL7_NAMESPACE);
        root.append(Element::in_namespace(HL7_NAMESPACE, "title"))
            .push_text("Labs & <results>");

        let xml = Document::new(root).to_xml_string().unwrap();
        assert_eq!(
            xml,
            r#"<ClinicalDocument xmlns="urn:hl7-org:v3"><title>Labs &amp; &lt;results&gt;</title></ClinicalDocument>"#
        );
    }

    #[test]
    fn reuses_declared_prefixes_for_foreign_namespaces() {
        let mut root = Element::in_namespace(HL7_NAMESPACE, "ClinicalDocument");
        root.declare_namespace(None, HL7_NAMESPACE);
        root.declare_namespace(Some("sdtc"), SDTC_NAMESPACE);
        root.declare_namespace(Some("xsi"), XSI_NAMESPACE);
        let value = root.append(Element::in_namespace(HL7_NAMESPACE, "value"));
        value.set_attribute(QName::new(Some(XSI_NAMESPACE), "type"), Some("xsi"), "CD");
        root.append(Element::in_namespace(SDTC_NAMESPACE, "deceasedInd"));

        let xml = Document::new(root).to_xml_string().unwrap();
        assert!(xml.contains(r#"<value xsi:type="CD"/>"#), "{xml}");
        assert!(xml.contains("<sdtc:deceasedInd/>"), "{xml}");
        assert_eq!(xml.matches("xmlns:sdtc").count(), 1);
    }

    #[test]
    fn declares_unknown_namespaces_where_first_needed() {
        let mut root = Element::in_namespace(HL7_NAMESPACE, "ClinicalDocument");
        root.declare_namespace(None, HL7_NAMESPACE);
        let ext = Element::in_namespace("urn:example:ext", "note").with_prefix_hint(Some("ext"));
        root.append(ext);
        root.append(Element::new(QName::local("plain")));

        let xml = Document::new(root).to_xml_string().unwrap();
        assert!(xml.contains(r#"<ext:note xmlns:ext="urn:example:ext"/>"#), "{xml}");
        assert!(xml.contains(r#"<plain xmlns=""/>"#), "{xml}");
    }

    #[test]
    fn reparsed_output_preserves_qualified_names() {
        let input = r#"<ClinicalDocument xmlns="urn:hl7-org:v3" xmlns:sdtc="urn:hl7-org:sdtc" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"><component><section><sdtc:raceCode code="2106-3"/><value xsi:type="CD" xml:lang="en"/><!-- note --></section></component></ClinicalDocument>"#;
        let doc = Document::parse(input.as_bytes()).unwrap();
        let xml = doc.to_xml_string().unwrap();
        assert_eq!(xml, input);

        let reparsed = Document::parse(xml.as_bytes()).unwrap();
        assert_eq!(reparsed, doc);
    }
}
