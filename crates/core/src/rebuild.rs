//! Rebuilding a refined CDA document.
//!
//! Output shape:
//!
//! ```text
//! ClinicalDocument (xmlns, xmlns:cda, xmlns:sdtc, xmlns:xsi)
//! ├── header elements...
//! └── component
//!     └── structuredBody
//!         ├── component → selected element
//!         └── ...
//! ```
//!
//! Selected elements are deep copies; the refined document never shares nodes with the input.

use crate::constants::{CLINICAL_DOCUMENT, COMPONENT, STRUCTURED_BODY};
use crate::header::HeaderFragment;
use crate::{RefinerError, RefinerResult};
use cda::{Document, Element, HL7_NAMESPACE, SDTC_NAMESPACE, XSI_NAMESPACE};

/// The refined output document. It owns its tree outright.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefinedDocument {
    document: Document,
}

impl RefinedDocument {
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Serialises the refined document to UTF-8 text.
    ///
    /// # Errors
    ///
    /// Returns `RefinerError::Serialise` if writing fails; this is an internal fault, never a
    /// problem with the caller's input.
    pub fn to_xml(&self) -> RefinerResult<String> {
        self.document.to_xml_string().map_err(RefinerError::Serialise)
    }
}

/// Assembles a new document from the header and the selected elements.
///
/// The root, top-level `component` and `structuredBody` are always present, even when nothing
/// was selected.
pub fn rebuild(header: &HeaderFragment, selected: &[&Element]) -> RefinedDocument {
    let mut root = Element::in_namespace(HL7_NAMESPACE, CLINICAL_DOCUMENT);
    root.declare_namespace(None, HL7_NAMESPACE);
    root.declare_namespace(Some("cda"), HL7_NAMESPACE);
    root.declare_namespace(Some("sdtc"), SDTC_NAMESPACE);
    root.declare_namespace(Some("xsi"), XSI_NAMESPACE);

    for element in header.elements() {
        root.append(element.clone());
    }

    let body = root
        .append(Element::in_namespace(HL7_NAMESPACE, COMPONENT))
        .append(Element::in_namespace(HL7_NAMESPACE, STRUCTURED_BODY));
    for element in selected {
        body.append(Element::in_namespace(HL7_NAMESPACE, COMPONENT))
            .append((*element).clone());
    }

    RefinedDocument {
        document: Document::new(root),
    }
}
