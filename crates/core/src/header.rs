//! Header extraction.
//!
//! The refined document always carries the administrative CDA header: a fixed list of
//! top-level elements copied from the source root, grouped by element name in
//! [`HEADER_ELEMENTS`] order.

use crate::constants::HEADER_ELEMENTS;
use cda::{Document, Element, HL7_NAMESPACE};

/// Ordered, append-only copies of the source document's header elements.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderFragment {
    elements: Vec<Element>,
}

impl HeaderFragment {
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    fn push(&mut self, element: Element) {
        self.elements.push(element);
    }
}

/// Copies the header elements out of `document`.
///
/// For each name in [`HEADER_ELEMENTS`], every direct child of the root with that HL7 name is
/// copied, keeping document order within the name. The overall order follows the fixed name
/// list, not the source document. A document with no header elements yields an empty fragment.
pub fn extract_header(document: &Document) -> HeaderFragment {
    let root = document.root();
    let mut header = HeaderFragment::default();

    for name in HEADER_ELEMENTS {
        root.child_elements()
            .filter(|child| child.is(Some(HL7_NAMESPACE), name))
            .for_each(|child| header.push(child.clone()));
    }

    header
}
