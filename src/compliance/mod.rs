//! Compliance checks for ZATCA invoice XML.
//!
//! Three levels, from cheapest to most complete:
//!
//! - [`validate_xml_structure`]: text search for the mandatory elements
//! - [`validate_zatca_requirements`]: parses the document and applies the
//!   KSA business rules, returning `{isValid, errors, warnings}`
//! - [`validate_xml_with_zatca`]: the same rules behind the
//!   [`ComplianceGateway`] interface, answering with a full
//!   [`ValidationReport`]
//!
//! ```
//! use zatca::compliance::validate_xml_structure;
//!
//! let result = validate_xml_structure("<Invoice></Invoice>");
//! assert!(!result.is_valid);
//! assert!(result.errors.iter().any(|e| e.contains("cbc:ProfileID")));
//! ```

mod gateway;
mod report;
mod rules;
mod structure;
pub mod tree;

pub use gateway::{
    ComplianceGateway, Environment, LocalSimulator, ValidationOptions, validate_xml_with_zatca,
};
pub use report::{MessageType, ValidationMessage, ValidationReport, ValidationStatus};
pub use rules::validate_zatca_requirements;
pub use structure::validate_xml_structure;
