//! Validated identifier types shared across the refiner crates.
//!
//! - [`SectionCode`]: the closed vocabulary of LOINC section codes a caller may ask for
//! - [`ConditionCode`]: a caller-supplied condition identifier, guaranteed non-empty

use std::fmt;
use std::str::FromStr;

/// Errors that can occur when creating validated identifier types.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TypesError {
    /// The input was empty or contained only whitespace
    #[error("condition code cannot be empty")]
    EmptyCondition,

    /// The input is not one of the recognised section codes
    #[error("{0} is invalid. Please provide a valid section.")]
    UnknownSection(String),
}

/// A recognised CDA section, identified by its LOINC section code.
///
/// This enum is deliberately *closed*: any code not listed here is rejected before a
/// section query is ever built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SectionCode {
    HistoryOfPresentIllness,
    ImmunizationNarrative,
    MedicationsAdministered,
    PlanOfCare,
    ProblemList,
    ReasonForVisit,
    DiagnosticResultsNarrative,
    SocialHistory,
    HospitalizationsAndOutpatientVisits,
}

impl SectionCode {
    /// Every recognised section, in vocabulary order.
    pub const ALL: [SectionCode; 9] = [
        SectionCode::HistoryOfPresentIllness,
        SectionCode::ImmunizationNarrative,
        SectionCode::MedicationsAdministered,
        SectionCode::PlanOfCare,
        SectionCode::ProblemList,
        SectionCode::ReasonForVisit,
        SectionCode::DiagnosticResultsNarrative,
        SectionCode::SocialHistory,
        SectionCode::HospitalizationsAndOutpatientVisits,
    ];

    /// Returns the LOINC code carried in the section's `code/@code` attribute.
    pub fn loinc(&self) -> &'static str {
        match self {
            SectionCode::HistoryOfPresentIllness => "10164-2",
            SectionCode::ImmunizationNarrative => "11369-6",
            SectionCode::MedicationsAdministered => "29549-3",
            SectionCode::PlanOfCare => "18776-5",
            SectionCode::ProblemList => "11450-4",
            SectionCode::ReasonForVisit => "29299-5",
            SectionCode::DiagnosticResultsNarrative => "30954-2",
            SectionCode::SocialHistory => "29762-2",
            SectionCode::HospitalizationsAndOutpatientVisits => "46240-8",
        }
    }

    /// Returns a human-readable name for this section.
    pub fn display_name(&self) -> &'static str {
        match self {
            SectionCode::HistoryOfPresentIllness => "History of present illness",
            SectionCode::ImmunizationNarrative => "History of immunization narrative",
            SectionCode::MedicationsAdministered => "Medications administered",
            SectionCode::PlanOfCare => "Plan of care note",
            SectionCode::ProblemList => "Problem list - reported",
            SectionCode::ReasonForVisit => "Reason for visit",
            SectionCode::DiagnosticResultsNarrative => {
                "Relevant diagnostic tests/laboratory data narrative"
            }
            SectionCode::SocialHistory => "Social history narrative",
            SectionCode::HospitalizationsAndOutpatientVisits => {
                "History of hospitalizations+outpatient visits narrative"
            }
        }
    }
}

impl FromStr for SectionCode {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SectionCode::ALL
            .into_iter()
            .find(|section| section.loinc() == s)
            .ok_or_else(|| TypesError::UnknownSection(s.to_owned()))
    }
}

impl fmt::Display for SectionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.loinc())
    }
}

impl serde::Serialize for SectionCode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.loinc())
    }
}

impl<'de> serde::Deserialize<'de> for SectionCode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A condition identifier (for example a SNOMED CT code) supplied by the caller.
///
/// There is no closed set of conditions; the only guarantee is that the code contains at least
/// one non-whitespace character. The input is trimmed during construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConditionCode(String);

impl ConditionCode {
    /// Creates a new `ConditionCode` from the given input.
    ///
    /// # Errors
    ///
    /// Returns `TypesError::EmptyCondition` if the trimmed input is empty.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TypesError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TypesError::EmptyCondition);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the inner code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConditionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ConditionCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
