//! The refinement engine.
//!
//! Which elements end up in the refined document depends only on which filters the caller
//! supplied, so the decision is made once, up front, as a [`RefineMode`].

use crate::header::extract_header;
use crate::query::{select_in_document, select_within, union_expression, QueryFragment};
use crate::rebuild::{rebuild, RefinedDocument};
use cda::{Document, Element};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefineMode {
    /// No filter: every section in the document.
    AllSections,
    /// Sections matching the section query.
    SectionsOnly(QueryFragment),
    /// Entries matching any of the service queries, anywhere in the document.
    ConditionsOnly(Vec<QueryFragment>),
    /// For each matching section, only its entries matching the service queries. Sections with
    /// no matching entries contribute nothing.
    SectionsWithConditions {
        sections: QueryFragment,
        conditions: Vec<QueryFragment>,
    },
}

impl RefineMode {
    pub fn from_queries(
        section_query: Option<QueryFragment>,
        service_queries: Option<Vec<QueryFragment>>,
    ) -> Self {
        match (section_query, service_queries) {
            (None, None) => RefineMode::AllSections,
            (Some(sections), None) => RefineMode::SectionsOnly(sections),
            (None, Some(conditions)) => RefineMode::ConditionsOnly(conditions),
            (Some(sections), Some(conditions)) => {
                RefineMode::SectionsWithConditions { sections, conditions }
            }
        }
    }

    /// Selected elements, in document order within each evaluation.
    pub fn select<'d>(&self, document: &'d Document) -> Vec<&'d Element> {
        match self {
            RefineMode::AllSections => select_in_document(&[QueryFragment::AllSections], document),
            RefineMode::SectionsOnly(sections) => {
                select_in_document(std::slice::from_ref(sections), document)
            }
            RefineMode::ConditionsOnly(conditions) => select_in_document(conditions, document),
            RefineMode::SectionsWithConditions { sections, conditions } => {
                select_in_document(std::slice::from_ref(sections), document)
                    .into_iter()
                    .flat_map(|section| select_within(conditions, section))
                    .collect()
            }
        }
    }

    fn describe(&self) -> String {
        match self {
            RefineMode::AllSections => union_expression(&[QueryFragment::AllSections]),
            RefineMode::SectionsOnly(sections) => sections.to_string(),
            RefineMode::ConditionsOnly(conditions) => union_expression(conditions),
            RefineMode::SectionsWithConditions { sections, conditions } => {
                format!("{sections} => {}", union_expression(conditions))
            }
        }
    }
}

/// Refines `document` down to its header plus the content selected by the supplied filters.
///
/// `None` for either query means that filter was not supplied. The source document is only
/// read; the result shares nothing with it.
pub fn refine(
    document: &Document,
    section_query: Option<QueryFragment>,
    service_queries: Option<Vec<QueryFragment>>,
) -> RefinedDocument {
    let header = extract_header(document);
    let mode = RefineMode::from_queries(section_query, service_queries);
    let selected = mode.select(document);

    tracing::debug!(
        query = %mode.describe(),
        header_elements = header.len(),
        selected = selected.len(),
        "refining document"
    );

    rebuild(&header, &selected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{build_section_query, CodeSystem};
    use crate::test_support::{entry_ids, sample_document, section_codes};

    fn sections(codes: &[&str]) -> Option<QueryFragment> {
        build_section_query(codes).unwrap()
    }

    fn loinc(codes: &[&str]) -> Option<Vec<QueryFragment>> {
        Some(codes.iter().map(|c| CodeSystem::Loinc.entry_query(c)).collect())
    }

    #[test]
    fn picks_mode_from_supplied_filters() {
        assert_eq!(RefineMode::from_queries(None, None), RefineMode::AllSections);
        assert!(matches!(
            RefineMode::from_queries(sections(&["10164-2"]), None),
            RefineMode::SectionsOnly(_)
        ));
        assert!(matches!(
            RefineMode::from_queries(None, loinc(&["76078-5"])),
            RefineMode::ConditionsOnly(_)
        ));
        assert!(matches!(
            RefineMode::from_queries(sections(&["10164-2"]), loinc(&["76078-5"])),
            RefineMode::SectionsWithConditions { .. }
        ));
    }

    #[test]
    fn no_filter_selects_every_section() {
        let doc = sample_document();
        let selected = RefineMode::AllSections.select(&doc);
        assert_eq!(
            section_codes(&selected),
            vec!["10164-2", "11450-4", "30954-2", "99999-9"]
        );
    }

    #[test]
    fn sections_only_selects_matching_sections() {
        let doc = sample_document();
        let mode = RefineMode::from_queries(sections(&["30954-2", "10164-2"]), None);
        assert_eq!(section_codes(&mode.select(&doc)), vec!["10164-2", "30954-2"]);
    }

    #[test]
    fn conditions_only_searches_the_whole_document() {
        let doc = sample_document();
        let mode = RefineMode::from_queries(None, loinc(&["76078-5"]));
        assert_eq!(entry_ids(&mode.select(&doc)), vec!["entry-3a", "entry-4a"]);
    }

    #[test]
    fn both_filters_intersect_per_section() {
        let doc = sample_document();
        // 10164-2 has no entries at all and 11450-4 has none coded 76078-5 or 94310-0.
        let mode = RefineMode::from_queries(
            sections(&["10164-2", "11450-4", "30954-2"]),
            loinc(&["76078-5", "94310-0"]),
        );
        let selected = mode.select(&doc);
        assert_eq!(entry_ids(&selected), vec!["entry-3a", "entry-3b"]);
        assert!(section_codes(&selected).is_empty());
    }

    #[test]
    fn both_filters_with_no_overlap_select_nothing() {
        let doc = sample_document();
        let mode = RefineMode::from_queries(sections(&["10164-2"]), loinc(&["76078-5"]));
        assert!(mode.select(&doc).is_empty());
    }

    #[test]
    fn resolved_but_empty_condition_filter_matches_nothing() {
        let doc = sample_document();
        let mode = RefineMode::from_queries(None, Some(Vec::new()));
        assert!(mode.select(&doc).is_empty());
    }

    #[test]
    fn refine_rebuilds_header_and_selection() {
        let doc = sample_document();
        let refined = refine(&doc, sections(&["11450-4"]), None);
        let root = refined.document().root();

        let header = extract_header(&doc);
        assert_eq!(root.child_elements().count(), header.len() + 1);

        let body = root
            .child_elements()
            .last()
            .and_then(|component| component.child_elements().next())
            .unwrap();
        let wrapped: Vec<_> = body
            .child_elements()
            .filter_map(|component| component.child_elements().next())
            .collect();
        assert_eq!(section_codes(&wrapped), vec!["11450-4"]);
    }
}
