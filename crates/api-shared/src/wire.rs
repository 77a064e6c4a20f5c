//! Request and response types for the refiner REST API.

use refiner_types::SectionCode;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// Body returned for every failed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ErrorRes {
    /// Stable, machine-readable failure kind, e.g. `invalid_section`.
    pub error: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SectionRes {
    /// LOINC section code
    pub code: String,
    pub display_name: String,
}

impl From<SectionCode> for SectionRes {
    fn from(section: SectionCode) -> Self {
        Self {
            code: section.loinc().to_owned(),
            display_name: section.display_name().to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ListSectionsRes {
    pub sections: Vec<SectionRes>,
}

impl ListSectionsRes {
    /// The full recognised section vocabulary.
    pub fn all() -> Self {
        Self {
            sections: SectionCode::ALL.into_iter().map(SectionRes::from).collect(),
        }
    }
}

/// Query parameters of `POST /ecr`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RefineEcrParams {
    /// Comma-delimited LOINC section codes to keep, e.g. `10164-2,11450-4`.
    pub sections_to_include: Option<String>,
    /// Comma-delimited condition codes (SNOMED) whose related entries should be kept.
    pub conditions_to_include: Option<String>,
}
