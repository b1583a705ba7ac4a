//! Saudi VAT registration number format rules.

use std::fmt;

/// Error returned when a VAT registration number fails format validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VatNumberError {
    /// The invalid input value.
    pub value: String,
    /// Why the value failed validation.
    pub reason: &'static str,
}

impl fmt::Display for VatNumberError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid VAT number '{}': {}", self.value, self.reason)
    }
}

impl std::error::Error for VatNumberError {}

/// Validate a VAT registration number: exactly 15 ASCII digits, first and
/// last digit `3` (`^3\d{13}3$`).
pub fn validate_vat_number(vat_number: &str) -> Result<(), VatNumberError> {
    let fail = |reason| {
        Err(VatNumberError {
            value: vat_number.to_string(),
            reason,
        })
    };

    let bytes = vat_number.as_bytes();
    if bytes.len() != 15 {
        return fail("must be exactly 15 digits");
    }
    if !bytes.iter().all(u8::is_ascii_digit) {
        return fail("must contain digits only");
    }
    if bytes[0] != b'3' || bytes[14] != b'3' {
        return fail("must start and end with 3");
    }
    Ok(())
}

/// True if `vat_number` matches `^3\d{13}3$`.
pub fn is_valid_vat_number(vat_number: &str) -> bool {
    validate_vat_number(vat_number).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_known_good_numbers() {
        assert!(is_valid_vat_number("310122393500003"));
        assert!(is_valid_vat_number("310123456789003"));
        assert!(is_valid_vat_number("300000000000003"));
    }

    #[test]
    fn rejects_wrong_edges() {
        let err = validate_vat_number("123456789012345").unwrap_err();
        assert_eq!(err.reason, "must start and end with 3");
        assert!(!is_valid_vat_number("310122393500001"));
    }

    #[test]
    fn rejects_wrong_length_and_characters() {
        assert_eq!(
            validate_vat_number("31012239350003").unwrap_err().reason,
            "must be exactly 15 digits"
        );
        assert_eq!(
            validate_vat_number("3101223935A0003").unwrap_err().reason,
            "must contain digits only"
        );
        assert!(!is_valid_vat_number(""));
        // Arabic-Indic digits are not accepted
        assert!(!is_valid_vat_number("٣١٠١٢٢٣٩٣٥٠٠"));
    }
}
