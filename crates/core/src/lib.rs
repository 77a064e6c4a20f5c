//! # Refiner Core
//!
//! Core logic for refining CDA electronic case reports (eCR).
//!
//! A refinement takes a raw CDA message plus two optional filters, a list of section LOINC codes
//! and a list of condition codes, and produces a smaller, self-contained CDA document holding the
//! original header and only the selected clinical content:
//!
//! - [`validation`] parses and checks everything the caller supplied
//! - [`header`] copies the fixed administrative header
//! - [`query`] builds section queries and translates clinical services into entry queries
//! - [`resolver`] resolves condition codes against the Reference Lookup Service
//! - [`refine`] picks the selection mode and [`rebuild`] assembles the output document
//!
//! **No API concerns**: HTTP servers and wire types belong in `api-rest` and `api-shared`.

pub mod config;
pub mod constants;
pub mod error;
pub mod header;
pub mod query;
pub mod rebuild;
pub mod refine;
pub mod resolver;
pub mod validation;

#[cfg(test)]
mod test_support;

pub use config::CoreConfig;
pub use error::{LookupFailure, RefinerError, RefinerResult};
pub use header::{extract_header, HeaderFragment};
pub use query::{build_section_query, build_service_queries, CodeSystem, QueryFragment};
pub use rebuild::{rebuild, RefinedDocument};
pub use refine::{refine, RefineMode};
pub use resolver::{ClinicalService, ReferenceClient};

use validation::{split_parameter, validate_conditions_to_include, validate_message};

/// End-to-end message refinement.
///
/// Holds the only long-lived state a refinement needs: the HTTP client for the Reference Lookup
/// Service. Cheap to clone and safe to share between concurrent requests.
#[derive(Clone, Debug)]
pub struct RefinerService {
    reference: ReferenceClient,
}

impl RefinerService {
    /// Creates a new instance of RefinerService.
    ///
    /// # Errors
    ///
    /// Returns `RefinerError::InvalidConfig` if the reference client cannot be constructed.
    pub fn new(cfg: &CoreConfig) -> RefinerResult<Self> {
        Ok(Self {
            reference: ReferenceClient::new(cfg)?,
        })
    }

    /// Refines a raw eCR message.
    ///
    /// Both filters are comma-delimited lists; absent or empty means "no filter". Every caller
    /// input is validated before any lookup is issued, and a failed lookup stops the refinement
    /// before any selection happens.
    ///
    /// # Arguments
    ///
    /// * `message` - Raw XML bytes of the CDA document.
    /// * `sections_to_include` - Section LOINC codes to keep.
    /// * `conditions_to_include` - Condition codes whose related entries should be kept.
    ///
    /// # Returns
    ///
    /// The refined document serialised as XML text.
    ///
    /// # Errors
    ///
    /// Returns the `RefinerError` variant for whichever stage failed; see [`RefinerError::kind`].
    pub async fn refine_ecr(
        &self,
        message: &[u8],
        sections_to_include: Option<&str>,
        conditions_to_include: Option<&str>,
    ) -> RefinerResult<String> {
        let document = validate_message(message)?;

        let section_query = match split_parameter(sections_to_include) {
            Some(identifiers) => build_section_query(&identifiers)?,
            None => None,
        };
        let conditions = validate_conditions_to_include(conditions_to_include)?;

        let service_queries = match conditions {
            Some(conditions) => {
                let services = self.reference.resolve_conditions(&conditions).await?;
                Some(build_service_queries(&services)?)
            }
            None => None,
        };

        refine(&document, section_query, service_queries).to_xml()
    }
}
