use serde::{Deserialize, Serialize};

use super::gateway::Environment;
use crate::core::ComplianceResult;

/// Severity of a validation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageType {
    Error,
    Warning,
    Info,
}

/// One finding of the XML validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationMessage {
    #[serde(rename = "type")]
    pub kind: MessageType,
    /// Rule code, see [`crate::core::rule`].
    pub code: String,
    pub message: String,
    /// Location in the document, e.g. `/Invoice/cac:InvoiceLine[2]/cac:TaxTotal`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl ValidationMessage {
    pub fn new(
        kind: MessageType,
        code: impl Into<String>,
        message: impl Into<String>,
        path: Option<String>,
    ) -> Self {
        Self {
            kind,
            code: code.into(),
            message: message.into(),
            path,
        }
    }

    pub fn is_error(&self) -> bool {
        self.kind == MessageType::Error
    }

    pub fn is_warning(&self) -> bool {
        self.kind == MessageType::Warning
    }
}

/// Overall outcome of a validation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationStatus {
    Pass,
    Warning,
    Fail,
    /// The document could not be parsed at all.
    Error,
}

impl ValidationStatus {
    pub fn from_messages(parsed: bool, messages: &[ValidationMessage]) -> Self {
        if !parsed {
            Self::Error
        } else if messages.iter().any(ValidationMessage::is_error) {
            Self::Fail
        } else if messages.iter().any(ValidationMessage::is_warning) {
            Self::Warning
        } else {
            Self::Pass
        }
    }

    /// PASS and WARNING documents may be submitted.
    pub fn is_valid(self) -> bool {
        matches!(self, Self::Pass | Self::Warning)
    }
}

/// Report in the shape returned by the ZATCA compliance API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub is_valid: bool,
    pub validation_status: ValidationStatus,
    pub validation_messages: Vec<ValidationMessage>,
    /// RFC 3339 UTC time the report was produced.
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub environment: Environment,
}

impl ValidationReport {
    pub fn errors(&self) -> impl Iterator<Item = &ValidationMessage> {
        self.validation_messages.iter().filter(|m| m.is_error())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ValidationMessage> {
        self.validation_messages.iter().filter(|m| m.is_warning())
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Collapse messages into the flat `{isValid, errors, warnings}` shape.
pub(crate) fn to_compliance_result(messages: &[ValidationMessage]) -> ComplianceResult {
    let pick = |kind| {
        messages
            .iter()
            .filter(|m| m.kind == kind)
            .map(|m| m.message.clone())
            .collect::<Vec<_>>()
    };
    ComplianceResult::new(pick(MessageType::Error), pick(MessageType::Warning))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(kind: MessageType) -> ValidationMessage {
        ValidationMessage::new(kind, "X", "x", None)
    }

    #[test]
    fn status_precedence() {
        assert_eq!(ValidationStatus::from_messages(true, &[]), ValidationStatus::Pass);
        assert_eq!(
            ValidationStatus::from_messages(true, &[msg(MessageType::Info)]),
            ValidationStatus::Pass
        );
        assert_eq!(
            ValidationStatus::from_messages(true, &[msg(MessageType::Warning)]),
            ValidationStatus::Warning
        );
        assert_eq!(
            ValidationStatus::from_messages(true, &[msg(MessageType::Warning), msg(MessageType::Error)]),
            ValidationStatus::Fail
        );
        assert_eq!(ValidationStatus::from_messages(false, &[]), ValidationStatus::Error);
        assert!(ValidationStatus::Warning.is_valid());
        assert!(!ValidationStatus::Fail.is_valid());
        assert!(!ValidationStatus::Error.is_valid());
    }

    #[test]
    fn json_shape() {
        let report = ValidationReport {
            is_valid: false,
            validation_status: ValidationStatus::Fail,
            validation_messages: vec![ValidationMessage::new(
                MessageType::Error,
                "VAT_RATE",
                "bad rate",
                Some("/Invoice/cac:TaxTotal".into()),
            )],
            timestamp: "2024-06-15T10:30:00.000Z".into(),
            request_id: None,
            environment: Environment::Sandbox,
        };
        let value: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(value["isValid"], false);
        assert_eq!(value["validationStatus"], "FAIL");
        assert_eq!(value["validationMessages"][0]["type"], "ERROR");
        assert_eq!(value["validationMessages"][0]["path"], "/Invoice/cac:TaxTotal");
        assert_eq!(value["environment"], "sandbox");
        assert!(value.get("requestId").is_none());
    }

    #[test]
    fn flattening_keeps_messages_by_kind() {
        let result = to_compliance_result(&[
            ValidationMessage::new(MessageType::Error, "A", "first", None),
            ValidationMessage::new(MessageType::Warning, "B", "second", None),
            ValidationMessage::new(MessageType::Info, "C", "third", None),
        ]);
        assert!(!result.is_valid);
        assert_eq!(result.errors, ["first"]);
        assert_eq!(result.warnings, ["second"]);
    }
}
