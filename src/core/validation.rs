use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::error::ValidationError;
use super::format::{parse_date, parse_timestamp, round_amount};
use super::types::*;
use super::vat_number::validate_vat_number;

/// Rule codes shared by the object-level checks and the XML validator.
pub mod rule {
    pub const XML_PARSE: &str = "XML_PARSE";
    pub const MISSING_ELEMENT: &str = "MISSING_ELEMENT";
    pub const UBL_VERSION: &str = "UBL_VERSION";
    pub const PROFILE_ID: &str = "PROFILE_ID";
    pub const INVOICE_ID: &str = "INVOICE_ID";
    pub const INVOICE_TYPE: &str = "INVOICE_TYPE";
    pub const ISSUE_DATE: &str = "ISSUE_DATE";
    pub const CURRENCY: &str = "CURRENCY";
    pub const SELLER_NAME: &str = "SELLER_NAME";
    pub const BUYER_NAME: &str = "BUYER_NAME";
    pub const VAT_NUMBER_FORMAT: &str = "VAT_NUMBER_FORMAT";
    pub const VAT_RATE: &str = "VAT_RATE";
    pub const MIXED_VAT_RATES: &str = "MIXED_VAT_RATES";
    pub const ADDRESS_STREET: &str = "ADDRESS_STREET";
    pub const ADDRESS_BUILDING_NUMBER: &str = "ADDRESS_BUILDING_NUMBER";
    pub const ADDRESS_CITY: &str = "ADDRESS_CITY";
    pub const ADDRESS_POSTAL_CODE: &str = "ADDRESS_POSTAL_CODE";
    pub const ADDRESS_COUNTRY: &str = "ADDRESS_COUNTRY";
    pub const ADDRESS_DISTRICT: &str = "ADDRESS_DISTRICT";
    pub const SUPPLY_DATE: &str = "SUPPLY_DATE";
    pub const LINE_ITEMS: &str = "LINE_ITEMS";
    pub const LINE_TAX_TOTAL: &str = "LINE_TAX_TOTAL";
    pub const LINE_ARITHMETIC: &str = "LINE_ARITHMETIC";
    pub const TOTALS: &str = "TOTALS";
    pub const ICV: &str = "ICV";
    pub const PIH: &str = "PIH";
    pub const PIH_PLACEHOLDER: &str = "PIH_PLACEHOLDER";
    pub const QR_CODE: &str = "QR_CODE";
    pub const SIGNATURE_PLACEHOLDER: &str = "SIGNATURE_PLACEHOLDER";
    pub const QR_FIELD: &str = "QR_FIELD";
    pub const AMOUNT: &str = "AMOUNT";
}

/// Flat pass/fail result: `{isValid, errors, warnings}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceResult {
    /// True when `errors` is empty.
    pub is_valid: bool,
    /// Rule violations that make the document non-compliant.
    pub errors: Vec<String>,
    /// Findings that do not block submission.
    pub warnings: Vec<String>,
}

impl ComplianceResult {
    pub fn new(errors: Vec<String>, warnings: Vec<String>) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
            warnings,
        }
    }
}

/// Check the Phase-1 QR fields: presence, VAT number shape, timestamp and
/// amount sanity.
pub fn validate_qr_fields(fields: &QrFields) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if fields.seller_name.trim().is_empty() {
        errors.push(ValidationError::with_rule(
            "seller_name",
            "seller name is required",
            rule::QR_FIELD,
        ));
    }

    if fields.vat_number.trim().is_empty() {
        errors.push(ValidationError::with_rule(
            "vat_number",
            "VAT number is required",
            rule::QR_FIELD,
        ));
    } else if let Err(e) = validate_vat_number(&fields.vat_number) {
        errors.push(ValidationError::with_rule(
            "vat_number",
            e.to_string(),
            rule::VAT_NUMBER_FORMAT,
        ));
    }

    if fields.timestamp.trim().is_empty() {
        errors.push(ValidationError::with_rule(
            "timestamp",
            "invoice timestamp is required",
            rule::QR_FIELD,
        ));
    } else if let Err(e) = parse_timestamp(&fields.timestamp) {
        errors.push(ValidationError::with_rule(
            "timestamp",
            e.to_string(),
            rule::ISSUE_DATE,
        ));
    }

    if fields.total < Decimal::ZERO {
        errors.push(ValidationError::with_rule(
            "total",
            "invoice total must not be negative",
            rule::AMOUNT,
        ));
    }
    if fields.vat_amount < Decimal::ZERO {
        errors.push(ValidationError::with_rule(
            "vat_amount",
            "VAT amount must not be negative",
            rule::AMOUNT,
        ));
    }
    if fields.vat_amount > fields.total {
        errors.push(ValidationError::with_rule(
            "vat_amount",
            format!(
                "VAT amount {} exceeds invoice total {}",
                fields.vat_amount, fields.total
            ),
            rule::AMOUNT,
        ));
    }

    errors
}

/// Phase-1 compliance check of QR fields as a flat result.
pub fn is_zatca_compliant(fields: &QrFields) -> ComplianceResult {
    let errors = validate_qr_fields(fields)
        .into_iter()
        .map(|e| e.to_string())
        .collect();
    ComplianceResult::new(errors, Vec::new())
}

/// Validate a [`ZatcaInvoice`] before rendering it.
/// Returns all errors found (not just the first).
pub fn validate_invoice_data(invoice: &ZatcaInvoice) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if invoice.invoice_number.trim().is_empty() {
        errors.push(ValidationError::with_rule(
            "invoice_number",
            "invoice number must not be empty",
            rule::INVOICE_ID,
        ));
    }
    if let Err(e) = parse_timestamp(&invoice.issue_date) {
        errors.push(ValidationError::with_rule(
            "issue_date",
            e.to_string(),
            rule::ISSUE_DATE,
        ));
    }
    if let Some(due) = &invoice.due_date {
        if let Err(e) = parse_date(due) {
            errors.push(ValidationError::new("due_date", e.to_string()));
        }
    }
    if let Some(supply) = &invoice.supply_date {
        if let Err(e) = parse_date(supply) {
            errors.push(ValidationError::with_rule(
                "supply_date",
                e.to_string(),
                rule::SUPPLY_DATE,
            ));
        }
    }

    // Seller
    if invoice.seller_name.trim().is_empty() {
        errors.push(ValidationError::with_rule(
            "seller_name",
            "seller name must not be empty",
            rule::SELLER_NAME,
        ));
    }
    if let Err(e) = validate_vat_number(&invoice.seller_vat_number) {
        errors.push(ValidationError::with_rule(
            "seller_vat_number",
            e.to_string(),
            rule::VAT_NUMBER_FORMAT,
        ));
    }
    validate_address(&invoice.seller_address, "seller_address", &mut errors);

    // Buyer
    if invoice.invoice_type == InvoiceKind::Standard && invoice.buyer_name.trim().is_empty() {
        errors.push(ValidationError::with_rule(
            "buyer_name",
            "standard invoices must name the buyer",
            rule::BUYER_NAME,
        ));
    }
    if let Some(vat) = &invoice.buyer_vat_number {
        if let Err(e) = validate_vat_number(vat) {
            errors.push(ValidationError::with_rule(
                "buyer_vat_number",
                e.to_string(),
                rule::VAT_NUMBER_FORMAT,
            ));
        }
    }
    if let Some(address) = &invoice.buyer_address {
        validate_address(address, "buyer_address", &mut errors);
    }

    // Lines
    if invoice.items.is_empty() {
        errors.push(ValidationError::with_rule(
            "items",
            "invoice must have at least one line item",
            rule::LINE_ITEMS,
        ));
    }
    for (i, line) in invoice.items.iter().enumerate() {
        validate_line(line, i, &mut errors);
    }
    if let Some(first) = invoice.items.first() {
        if invoice.items.iter().any(|l| l.vat_rate != first.vat_rate) {
            errors.push(ValidationError::with_rule(
                "items",
                "all lines must share one VAT rate; the invoice tax total carries a single rate",
                rule::MIXED_VAT_RATES,
            ));
        }
    }

    errors.extend(validate_arithmetic(invoice));
    errors
}

fn validate_address(address: &Address, prefix: &str, errors: &mut Vec<ValidationError>) {
    let required = [
        (&address.street, "street", rule::ADDRESS_STREET),
        (
            &address.building_number,
            "building_number",
            rule::ADDRESS_BUILDING_NUMBER,
        ),
        (&address.city, "city", rule::ADDRESS_CITY),
        (&address.postal_code, "postal_code", rule::ADDRESS_POSTAL_CODE),
    ];
    for (value, field, code) in required {
        if value.trim().is_empty() {
            errors.push(ValidationError::with_rule(
                format!("{prefix}.{field}"),
                format!("{field} must not be empty"),
                code,
            ));
        }
    }

    let cc = &address.country_code;
    if cc.len() != 2 || !cc.chars().all(|c| c.is_ascii_uppercase()) {
        errors.push(ValidationError::with_rule(
            format!("{prefix}.country_code"),
            format!("country code '{cc}' must be ISO 3166-1 alpha-2"),
            rule::ADDRESS_COUNTRY,
        ));
    }

    if address.is_saudi() {
        if address.district.as_ref().is_none_or(|d| d.trim().is_empty()) {
            errors.push(ValidationError::with_rule(
                format!("{prefix}.district"),
                "district is required for Saudi addresses",
                rule::ADDRESS_DISTRICT,
            ));
        }
        if !is_digits(&address.building_number, 4) {
            errors.push(ValidationError::with_rule(
                format!("{prefix}.building_number"),
                "Saudi building numbers have exactly 4 digits",
                rule::ADDRESS_BUILDING_NUMBER,
            ));
        }
        if !is_digits(&address.postal_code, 5) {
            errors.push(ValidationError::with_rule(
                format!("{prefix}.postal_code"),
                "Saudi postal codes have exactly 5 digits",
                rule::ADDRESS_POSTAL_CODE,
            ));
        }
    }
}

pub(crate) fn is_digits(value: &str, len: usize) -> bool {
    value.len() == len && value.bytes().all(|b| b.is_ascii_digit())
}

fn validate_line(line: &LineItem, index: usize, errors: &mut Vec<ValidationError>) {
    let prefix = format!("items[{index}]");

    if line.name.trim().is_empty() {
        errors.push(ValidationError::new(
            format!("{prefix}.name"),
            "item name must not be empty",
        ));
    }
    if line.quantity <= Decimal::ZERO {
        errors.push(ValidationError::with_rule(
            format!("{prefix}.quantity"),
            "quantity must be greater than zero",
            rule::LINE_ARITHMETIC,
        ));
    }
    if line.unit_price < Decimal::ZERO {
        errors.push(ValidationError::with_rule(
            format!("{prefix}.unit_price"),
            "unit price must not be negative",
            rule::LINE_ARITHMETIC,
        ));
    }
    if !is_allowed_vat_rate(line.vat_rate) {
        errors.push(ValidationError::with_rule(
            format!("{prefix}.vat_rate"),
            format!(
                "VAT rate {}% is not allowed; standard-rated lines must use 5% or 15%",
                line.vat_rate.normalize()
            ),
            rule::VAT_RATE,
        ));
    }

    match line.quantity.checked_mul(line.unit_price) {
        Some(product) if round_amount(line.subtotal) != round_amount(product) => {
            errors.push(ValidationError::with_rule(
                format!("{prefix}.subtotal"),
                format!(
                    "subtotal {} does not match quantity {} x unit price {}",
                    line.subtotal, line.quantity, line.unit_price
                ),
                rule::LINE_ARITHMETIC,
            ));
        }
        Some(_) => {}
        None => errors.push(out_of_range(
            format!("{prefix}.subtotal"),
            format!("quantity {} x unit price {}", line.quantity, line.unit_price),
        )),
    }
    match line.subtotal.checked_add(line.vat_amount) {
        Some(sum) if line.total != sum => {
            errors.push(ValidationError::with_rule(
                format!("{prefix}.total"),
                format!(
                    "total {} does not match subtotal {} + VAT {}",
                    line.total, line.subtotal, line.vat_amount
                ),
                rule::LINE_ARITHMETIC,
            ));
        }
        Some(_) => {}
        None => errors.push(out_of_range(
            format!("{prefix}.total"),
            format!("subtotal {} + VAT {}", line.subtotal, line.vat_amount),
        )),
    }
}

/// Arithmetic on caller-supplied amounts that does not fit a `Decimal`.
fn out_of_range(field: String, expression: String) -> ValidationError {
    ValidationError::with_rule(
        field,
        format!("{expression} is out of the representable amount range"),
        rule::AMOUNT,
    )
}

/// `None` when the sum does not fit a `Decimal`.
fn checked_sum(mut amounts: impl Iterator<Item = Decimal>) -> Option<Decimal> {
    amounts.try_fold(Decimal::ZERO, Decimal::checked_add)
}

/// Standard-rated VAT percentages accepted by ZATCA.
pub fn is_allowed_vat_rate(rate: Decimal) -> bool {
    rate == dec!(15) || rate == dec!(5)
}

/// Validate document-level arithmetic against the lines.
pub fn validate_arithmetic(invoice: &ZatcaInvoice) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    match checked_sum(invoice.items.iter().map(|l| l.subtotal)) {
        Some(line_subtotal) if invoice.subtotal != line_subtotal => {
            errors.push(ValidationError::with_rule(
                "subtotal",
                format!(
                    "subtotal {} does not match sum of line subtotals {}",
                    invoice.subtotal, line_subtotal
                ),
                rule::TOTALS,
            ));
        }
        Some(_) => {}
        None => errors.push(out_of_range("subtotal".into(), "sum of line subtotals".into())),
    }

    match checked_sum(invoice.items.iter().map(|l| l.vat_amount)) {
        Some(line_vat) if invoice.vat_amount != line_vat => {
            errors.push(ValidationError::with_rule(
                "vat_amount",
                format!(
                    "VAT amount {} does not match sum of line VAT {}",
                    invoice.vat_amount, line_vat
                ),
                rule::TOTALS,
            ));
        }
        Some(_) => {}
        None => errors.push(out_of_range("vat_amount".into(), "sum of line VAT".into())),
    }

    match invoice.subtotal.checked_add(invoice.vat_amount) {
        Some(sum) if invoice.total != sum => {
            errors.push(ValidationError::with_rule(
                "total",
                format!(
                    "total {} does not match subtotal {} + VAT {}",
                    invoice.total, invoice.subtotal, invoice.vat_amount
                ),
                rule::TOTALS,
            ));
        }
        Some(_) => {}
        None => errors.push(out_of_range(
            "total".into(),
            format!("subtotal {} + VAT {}", invoice.subtotal, invoice.vat_amount),
        )),
    }

    errors
}
