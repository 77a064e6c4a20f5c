//! Input validation utilities.
//!
//! Everything the caller supplies is checked here before any document traversal or outbound
//! call happens: the message body must be well-formed XML and list parameters must contain only
//! acceptable identifiers.

use crate::constants::PARAMETER_DELIMITER;
use crate::{RefinerError, RefinerResult};
use cda::Document;
use refiner_types::{ConditionCode, SectionCode};

/// Validates that an incoming message is well-formed XML and returns the parsed tree.
///
/// # Errors
///
/// Returns `RefinerError::Document` carrying the parser's diagnostic if the input is not
/// well-formed. No partial tree is exposed.
pub fn validate_message(raw_message: &[u8]) -> RefinerResult<Document> {
    Document::parse(raw_message).map_err(RefinerError::Document)
}

/// Splits a comma-delimited parameter into trimmed items.
///
/// Returns `None` when the parameter is absent, empty or whitespace-only; absent and empty
/// both mean "no filter".
pub fn split_parameter(raw: Option<&str>) -> Option<Vec<&str>> {
    let raw = raw.filter(|value| !value.trim().is_empty())?;
    Some(raw.split(PARAMETER_DELIMITER).map(str::trim).collect())
}

/// Validates section identifiers against the recognised vocabulary.
///
/// # Errors
///
/// Returns `RefinerError::InvalidSection` naming the first identifier that is not recognised.
pub fn validate_section_codes<S: AsRef<str>>(identifiers: &[S]) -> RefinerResult<Vec<SectionCode>> {
    identifiers
        .iter()
        .map(|id| id.as_ref().parse::<SectionCode>().map_err(RefinerError::from))
        .collect()
}

/// Validates the `conditions_to_include` parameter into condition codes.
///
/// # Errors
///
/// Returns `RefinerError::InvalidCondition` if the list contains an empty item (for example
/// `"a,,b"`).
pub fn validate_conditions_to_include(raw: Option<&str>) -> RefinerResult<Option<Vec<ConditionCode>>> {
    split_parameter(raw)
        .map(|items| {
            items
                .into_iter()
                .map(|item| ConditionCode::new(item).map_err(RefinerError::from))
                .collect()
        })
        .transpose()
}
