//! CDA wire/boundary support.
//!
//! This crate is responsible for translating between raw CDA XML text and an owned,
//! namespace-aware element tree:
//! - parsing and well-formedness checking (`Document::parse`)
//! - the element tree itself (`Element`, `Node`, `QName`)
//! - serialisation back to UTF-8 text with namespace prefixes re-resolved
//!
//! Clinical meaning (header selection, section queries, refinement) lives in `refiner-core`.
//! This crate handles the XML format only.

mod reader;
mod tree;
mod writer;

pub use reader::MAX_DEPTH;
pub use tree::{Attribute, Document, Element, NamespaceDecl, Node, QName};

/// The HL7 v3 namespace used by every CDA element.
pub const HL7_NAMESPACE: &str = "urn:hl7-org:v3";

/// The SDTC extension namespace.
pub const SDTC_NAMESPACE: &str = "urn:hl7-org:sdtc";

/// The XML Schema instance namespace (`xsi:type` and friends).
pub const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// The reserved `xml:` namespace. It is always bound and never declared.
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// Errors returned by the `cda` boundary crate.
#[derive(Debug, thiserror::Error)]
pub enum CdaError {
    #[error("XMLSyntaxError: {message}")]
    Syntax {
        message: String,
        line: u32,
        column: u32,
    },

    #[error("XMLSyntaxError: document is not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),

    #[error("failed to write XML: {0}")]
    Write(String),
}

/// Type alias for Results that can fail with a [`CdaError`].
pub type CdaResult<T> = Result<T, CdaError>;
