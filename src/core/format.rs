//! Amount and date formatting shared by the QR and XML encoders.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rust_decimal::{Decimal, RoundingStrategy};

use super::error::ZatcaError;

/// Round to two decimal places, half away from zero (`15.005 -> 15.01`).
pub fn round_amount(d: Decimal) -> Decimal {
    d.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Format an amount with exactly two decimal places after rounding with
/// [`round_amount`].
pub fn format_amount(d: Decimal) -> String {
    let mut rounded = round_amount(d);
    rounded.rescale(2);
    rounded.to_string()
}

/// Format a Decimal with at least 2 decimal places, keeping any extra
/// precision (used for quantities).
pub fn format_decimal(d: Decimal) -> String {
    let s = d.normalize().to_string();
    if let Some(dot_pos) = s.find('.') {
        let decimals = s.len() - dot_pos - 1;
        if decimals < 2 {
            format!("{s}{}", "0".repeat(2 - decimals))
        } else {
            s
        }
    } else {
        format!("{s}.00")
    }
}

/// Parse an ISO-8601 timestamp (`YYYY-MM-DDTHH:MM:SS[.fff][Z|±HH:MM]`).
///
/// The result is the wall-clock time as written; offsets are accepted but
/// not applied.
pub fn parse_timestamp(value: &str) -> Result<NaiveDateTime, ZatcaError> {
    let trimmed = value.trim();
    if !trimmed.contains('T') {
        return Err(ZatcaError::date_format(
            value,
            "expected an ISO-8601 date-time with a 'T' separator",
        ));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.naive_local());
    }
    NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M"))
        .map_err(|e| ZatcaError::date_format(value, e.to_string()))
}

/// Date part of an ISO timestamp as `YYYY-MM-DD`.
pub fn format_date_only(value: &str) -> Result<String, ZatcaError> {
    Ok(parse_timestamp(value)?.format("%Y-%m-%d").to_string())
}

/// Time part of an ISO timestamp as `HH:MM:SS`.
pub fn format_time_only(value: &str) -> Result<String, ZatcaError> {
    Ok(parse_timestamp(value)?.format("%H:%M:%S").to_string())
}

/// Parse a plain `YYYY-MM-DD` date, also accepting a full timestamp.
pub fn parse_date(value: &str) -> Result<NaiveDate, ZatcaError> {
    let trimmed = value.trim();
    if trimmed.contains('T') {
        return parse_timestamp(trimmed).map(|dt| dt.date());
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .map_err(|e| ZatcaError::date_format(value, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn format_amount_cases() {
        assert_eq!(format_amount(dec!(100)), "100.00");
        assert_eq!(format_amount(dec!(15)), "15.00");
        assert_eq!(format_amount(dec!(49.9)), "49.90");
        assert_eq!(format_amount(dec!(1149.999)), "1150.00");
        assert_eq!(format_amount(dec!(0)), "0.00");
    }

    #[test]
    fn format_amount_rounds_half_away_from_zero() {
        assert_eq!(format_amount(dec!(15.005)), "15.01");
        assert_eq!(format_amount(dec!(15.004)), "15.00");
        assert_eq!(format_amount(dec!(0.125)), "0.13");
        assert_eq!(format_amount(dec!(-2.345)), "-2.35");
    }

    #[test]
    fn format_decimal_cases() {
        assert_eq!(format_decimal(dec!(1)), "1.00");
        assert_eq!(format_decimal(dec!(2.5)), "2.50");
        assert_eq!(format_decimal(dec!(0.125)), "0.125");
    }

    #[test]
    fn date_and_time_split() {
        let ts = "2024-03-10T14:05:09Z";
        assert_eq!(format_date_only(ts).unwrap(), "2024-03-10");
        assert_eq!(format_time_only(ts).unwrap(), "14:05:09");
    }

    #[test]
    fn offsets_keep_wall_clock_time() {
        let ts = "2024-03-10T23:30:00+03:00";
        assert_eq!(format_date_only(ts).unwrap(), "2024-03-10");
        assert_eq!(format_time_only(ts).unwrap(), "23:30:00");
    }

    #[test]
    fn naive_and_fractional_timestamps() {
        assert_eq!(
            format_time_only("2024-01-01T08:00:00.123").unwrap(),
            "08:00:00"
        );
        assert_eq!(format_time_only("2024-01-01T08:15").unwrap(), "08:15:00");
    }

    #[test]
    fn missing_separator_is_rejected() {
        let err = format_date_only("2024-03-10").unwrap_err();
        assert!(matches!(err, ZatcaError::DateFormat { .. }));
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(matches!(
            format_time_only("not-a-dateTtime"),
            Err(ZatcaError::DateFormat { .. })
        ));
        assert!(matches!(
            format_date_only("2024-13-40T10:00:00"),
            Err(ZatcaError::DateFormat { .. })
        ));
    }

    #[test]
    fn parse_plain_dates() {
        assert_eq!(
            parse_date("2024-06-15").unwrap(),
            NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
        );
        assert_eq!(
            parse_date("2024-06-15T10:00:00Z").unwrap(),
            NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
        );
        assert!(parse_date("15.06.2024").is_err());
    }
}
