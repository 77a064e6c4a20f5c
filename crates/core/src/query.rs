//! Query fragments over a CDA element tree.
//!
//! A [`QueryFragment`] addresses zero or more elements. Fragments are built per request from
//! either the caller's section identifiers or the clinical services resolved for their
//! conditions, and are evaluated directly against the owned tree. Each fragment also renders
//! as the equivalent XPath expression, which is what gets logged.
//!
//! Code-system templates are a closed enum ([`CodeSystem`]); supporting another terminology
//! means adding a variant, not a table entry.

use crate::constants::{ENTRY, SECTION};
use crate::resolver::ClinicalService;
use crate::validation::validate_section_codes;
use crate::{RefinerError, RefinerResult};
use cda::{Document, Element, HL7_NAMESPACE};
use refiner_types::SectionCode;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Terminology systems whose codes can be turned into entry queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodeSystem {
    Loinc,
}

impl CodeSystem {
    pub const ALL: [CodeSystem; 1] = [CodeSystem::Loinc];

    /// Canonical URI used by the Reference Lookup Service.
    pub fn uri(&self) -> &'static str {
        match self {
            CodeSystem::Loinc => "http://loinc.org",
        }
    }

    /// Value of `@codeSystemName` on coded CDA elements from this system.
    pub fn code_system_name(&self) -> &'static str {
        match self {
            CodeSystem::Loinc => "loinc.org",
        }
    }

    /// Query matching entries that contain an element coded `code` in this system.
    pub fn entry_query(&self, code: &str) -> QueryFragment {
        QueryFragment::CodedEntry {
            system: *self,
            code: code.to_owned(),
        }
    }
}

impl FromStr for CodeSystem {
    type Err = RefinerError;

    fn from_str(uri: &str) -> Result<Self, Self::Err> {
        CodeSystem::ALL
            .into_iter()
            .find(|system| system.uri() == uri)
            .ok_or_else(|| RefinerError::UnsupportedSystem(uri.to_owned()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryFragment {
    /// Every `section` element, whatever its code.
    AllSections,
    /// `section` elements whose `hl7:code/@code` is one of the set.
    Sections(BTreeSet<SectionCode>),
    /// `entry` elements with a descendant carrying `@code` and the system's `@codeSystemName`.
    CodedEntry { system: CodeSystem, code: String },
}

impl QueryFragment {
    pub fn matches(&self, element: &Element) -> bool {
        match self {
            QueryFragment::AllSections => element.local_name() == SECTION,
            QueryFragment::Sections(codes) => {
                element.local_name() == SECTION
                    && element.child_elements().any(|child| {
                        child.is(Some(HL7_NAMESPACE), "code")
                            && child
                                .attribute("code")
                                .is_some_and(|value| codes.iter().any(|s| s.loinc() == value))
                    })
            }
            QueryFragment::CodedEntry { system, code } => {
                element.local_name() == ENTRY
                    && element.descendants().any(|inner| {
                        inner.attribute("code") == Some(code.as_str())
                            && inner.attribute("codeSystemName") == Some(system.code_system_name())
                    })
            }
        }
    }
}

impl fmt::Display for QueryFragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryFragment::AllSections => write!(f, "//*[local-name()='{SECTION}']"),
            QueryFragment::Sections(codes) => {
                let predicate = codes
                    .iter()
                    .map(|s| format!("@code='{}'", s.loinc()))
                    .collect::<Vec<_>>()
                    .join(" or ");
                write!(f, "//*[local-name()='{SECTION}'][hl7:code[{predicate}]]")
            }
            QueryFragment::CodedEntry { system, code } => write!(
                f,
                ".//*[local-name()='{ENTRY}'][.//*[@code='{code}' and @codeSystemName='{}']]",
                system.code_system_name()
            ),
        }
    }
}

/// Renders a list of fragments as one XPath union.
pub fn union_expression(queries: &[QueryFragment]) -> String {
    queries
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" | ")
}

/// Descendants of `context` (not `context` itself) matching any of `queries`, in document
/// order and without duplicates.
pub fn select_within<'d>(queries: &[QueryFragment], context: &'d Element) -> Vec<&'d Element> {
    context
        .descendants()
        .filter(|el| queries.iter().any(|q| q.matches(el)))
        .collect()
}

/// Elements anywhere in `document` (root included) matching any of `queries`, in document order.
pub fn select_in_document<'d>(queries: &[QueryFragment], document: &'d Document) -> Vec<&'d Element> {
    document
        .elements()
        .filter(|el| queries.iter().any(|q| q.matches(el)))
        .collect()
}

/// Builds the section query for the given identifiers.
///
/// The identifiers are validated first; the resulting query matches a section whose code is any
/// of them, so the order they were supplied in does not matter. An empty list means "no section
/// filter" and yields `None`.
///
/// # Errors
///
/// Returns `RefinerError::InvalidSection` naming the first unrecognised identifier.
pub fn build_section_query<S: AsRef<str>>(identifiers: &[S]) -> RefinerResult<Option<QueryFragment>> {
    let codes = validate_section_codes(identifiers)?;
    if codes.is_empty() {
        return Ok(None);
    }
    Ok(Some(QueryFragment::Sections(codes.into_iter().collect())))
}

/// Translates resolved clinical services into entry queries, one per (system, code) pair.
///
/// # Errors
///
/// Returns `RefinerError::UnsupportedSystem` as soon as any service names a code system with no
/// template, even if other services in the batch are recognised.
pub fn build_service_queries(services: &[ClinicalService]) -> RefinerResult<Vec<QueryFragment>> {
    let mut queries = Vec::new();
    for service in services {
        let system: CodeSystem = service.system.parse()?;
        queries.extend(service.codes.iter().map(|code| system.entry_query(code)));
    }
    Ok(queries)
}
