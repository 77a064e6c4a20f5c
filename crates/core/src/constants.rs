//! Constants used throughout the refiner core crate.
//!
//! Process-wide and read-only: nothing here is mutated after startup, so these are safe for
//! unsynchronised concurrent reads from every request.

/// Top-level CDA header elements copied into every refined document, in output order.
pub const HEADER_ELEMENTS: [&str; 15] = [
    "realmCode",
    "typeId",
    "templateId",
    "id",
    "code",
    "title",
    "effectiveTime",
    "confidentialityCode",
    "languageCode",
    "setId",
    "versionNumber",
    "recordTarget",
    "author",
    "custodian",
    "componentOf",
];

/// Root element of a rebuilt document.
pub const CLINICAL_DOCUMENT: &str = "ClinicalDocument";

/// Wrapper element placed around the structured body and around each selected element.
pub const COMPONENT: &str = "component";

/// Body wrapper beneath the top-level component.
pub const STRUCTURED_BODY: &str = "structuredBody";

/// Local name of CDA body sections.
pub const SECTION: &str = "section";

/// Local name of clinical statements inside a section.
pub const ENTRY: &str = "entry";

/// Base address of the Reference Lookup Service when none is configured.
pub const DEFAULT_TCR_URL: &str = "http://localhost:8081";

/// Path of the value-set lookup on the Reference Lookup Service.
pub const VALUE_SETS_PATH: &str = "/get-value-sets";

/// Query parameter carrying the condition identifier on a lookup.
pub const CONDITION_CODE_PARAM: &str = "condition_code";

/// Delimiter for multi-valued request parameters.
pub const PARAMETER_DELIMITER: char = ',';

/// Separator used when joining failed lookups into one error message.
pub const FAILURE_SEPARATOR: &str = ";";
