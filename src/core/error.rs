use thiserror::Error;

/// Errors raised while encoding or building ZATCA artefacts.
///
/// Compliance problems found by the validators are never reported
/// through this type; they come back as report entries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ZatcaError {
    /// A TLV value does not fit the single-byte length field.
    #[error("value too long for single-byte length field: tag {tag} carries {len} bytes (max 255)")]
    Encoding {
        /// Tag of the offending record.
        tag: u8,
        /// UTF-8 byte length of the rejected value.
        len: usize,
    },

    /// A date/time string could not be parsed as ISO-8601.
    #[error("invalid date/time '{value}': {reason}")]
    DateFormat {
        /// The rejected input.
        value: String,
        /// Why parsing failed.
        reason: String,
    },

    /// A builder was finished without a required field.
    #[error("missing required field: {0}")]
    MissingField(String),

    /// ICV/PIH sequencing error in an [`InvoiceChain`](crate::core::InvoiceChain).
    #[error("invoice chain error: {0}")]
    Chain(String),

    /// TLV bytes, hex or base64 text could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// XML generation error.
    #[error("XML error: {0}")]
    Xml(String),

    /// A signature provider failed to produce signing material.
    #[error("signature error: {0}")]
    Signature(String),
}

impl ZatcaError {
    pub(crate) fn date_format(value: &str, reason: impl Into<String>) -> Self {
        Self::DateFormat {
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

/// A single validation error with field path and message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dot-separated path to the invalid field (e.g. "seller_address.district").
    pub field: String,
    /// Human-readable error description.
    pub message: String,
    /// Compliance rule code if applicable (e.g. "VAT_NUMBER_FORMAT").
    pub rule: Option<String>,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(rule) = &self.rule {
            write!(f, "[{}] {}: {}", rule, self.field, self.message)
        } else {
            write!(f, "{}: {}", self.field, self.message)
        }
    }
}

impl ValidationError {
    /// Create a validation error without a rule ID.
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            rule: None,
        }
    }

    /// Create a validation error carrying a rule ID.
    pub fn with_rule(
        field: impl Into<String>,
        message: impl Into<String>,
        rule: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            rule: Some(rule.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoding_error_names_the_length_budget() {
        let err = ZatcaError::Encoding { tag: 1, len: 300 };
        let msg = err.to_string();
        assert!(msg.contains("value too long for single-byte length field"));
        assert!(msg.contains("300"));
    }

    #[test]
    fn validation_error_display() {
        let plain = ValidationError::new("seller_name", "must not be empty");
        assert_eq!(plain.to_string(), "seller_name: must not be empty");

        let ruled = ValidationError::with_rule("seller_vat_number", "bad shape", "VAT_NUMBER_FORMAT");
        assert_eq!(ruled.to_string(), "[VAT_NUMBER_FORMAT] seller_vat_number: bad shape");
    }
}
