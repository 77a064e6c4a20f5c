use crate::constants::FAILURE_SEPARATOR;
use std::fmt;

/// One reference-service lookup that did not succeed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupFailure {
    pub condition: String,
    /// HTTP status returned by the service, or `None` if no response was received.
    pub status: Option<u16>,
    pub message: String,
}

impl fmt::Display for LookupFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "condition {}: {}", self.condition, self.message)
    }
}

fn join_failures(failures: &[LookupFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(FAILURE_SEPARATOR)
}

#[derive(Debug, thiserror::Error)]
pub enum RefinerError {
    #[error(transparent)]
    Document(cda::CdaError),

    #[error("{0} is invalid. Please provide a valid section.")]
    InvalidSection(String),
    #[error("invalid condition: {0}")]
    InvalidCondition(String),

    #[error("{}", join_failures(.failures))]
    Resolution { failures: Vec<LookupFailure> },
    #[error("{0} not a recognized clinical service system.")]
    UnsupportedSystem(String),
    #[error("reference service returned an unreadable response for condition {condition}: {message}")]
    MalformedReference { condition: String, message: String },

    #[error("failed to serialise refined document: {0}")]
    Serialise(#[source] cda::CdaError),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl RefinerError {
    /// Stable, machine-readable name of the failure mode.
    pub fn kind(&self) -> &'static str {
        match self {
            RefinerError::Document(_) => "xml_syntax",
            RefinerError::InvalidSection(_) => "invalid_section",
            RefinerError::InvalidCondition(_) => "invalid_condition",
            RefinerError::Resolution { .. } => "reference_lookup_failed",
            RefinerError::UnsupportedSystem(_) => "unsupported_code_system",
            RefinerError::MalformedReference { .. } => "malformed_reference_response",
            RefinerError::Serialise(_) | RefinerError::InvalidConfig(_) => "internal",
        }
    }
}

impl From<refiner_types::TypesError> for RefinerError {
    fn from(err: refiner_types::TypesError) -> Self {
        match err {
            refiner_types::TypesError::UnknownSection(code) => RefinerError::InvalidSection(code),
            refiner_types::TypesError::EmptyCondition => {
                RefinerError::InvalidCondition(err.to_string())
            }
        }
    }
}

pub type RefinerResult<T> = std::result::Result<T, RefinerError>;
