use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Fixed "previous invoice hash" used when no predecessor is known.
///
/// This is base64(hex(SHA-256("0"))), the value ZATCA prescribes for the
/// very first invoice of a device. Any later invoice carrying it breaks
/// the hash chain and is not compliant.
pub const PLACEHOLDER_PIH: &str =
    "NWZlY2ViNjZmZmM4NmYzOGQ5NTI3ODZjNmQ2OTZjNzljMmRiYzIzOWRkNGU5MWI0NjcyOWQ3M2EyN2ZiNTdlOQ==";

/// Token written into signature fields by the placeholder signer. A
/// document carrying it is structurally complete but not signed.
pub const PLACEHOLDER_SIGNATURE: &str = "PLACEHOLDER_SIGNATURE_VALUE";

/// Certificate token written by the placeholder signer.
pub const PLACEHOLDER_CERTIFICATE: &str = "PLACEHOLDER_X509_CERTIFICATE";

/// Currency used for every ZATCA document.
pub const CURRENCY_SAR: &str = "SAR";

/// The minimal data needed for a Phase-1 QR code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QrFields {
    /// Tag 1: seller name.
    pub seller_name: String,
    /// Tag 2: seller VAT registration number (15 digits).
    pub vat_number: String,
    /// Tag 3: invoice timestamp, ISO-8601, encoded verbatim.
    pub timestamp: String,
    /// Tag 4: invoice total including VAT.
    pub total: Decimal,
    /// Tag 5: VAT amount.
    pub vat_amount: Decimal,
}

/// ZATCA invoice subtype (the first two digits of KSA-2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvoiceKind {
    /// Tax invoice (B2B), subtype `01`.
    Standard,
    /// Simplified tax invoice (B2C), subtype `02`.
    Simplified,
}

impl InvoiceKind {
    /// Two-digit KSA-2 subtype.
    pub fn subtype_code(&self) -> &'static str {
        match self {
            Self::Standard => "01",
            Self::Simplified => "02",
        }
    }

    /// Full seven-character KSA-2 transaction code.
    ///
    /// The five trailing flags (third party, nominal, export, summary,
    /// self-billed) are always `0`.
    pub fn transaction_code(&self) -> String {
        format!("{}00000", self.subtype_code())
    }

    /// Parse a KSA-2 code back into a kind, looking at the subtype only.
    pub fn from_transaction_code(code: &str) -> Option<Self> {
        match code.get(..2) {
            Some("01") => Some(Self::Standard),
            Some("02") => Some(Self::Simplified),
            _ => None,
        }
    }
}

/// Postal address of a seller or buyer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    /// Street name.
    pub street: String,
    /// Building number (four digits for Saudi national addresses).
    pub building_number: String,
    /// Additional number of the national address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_number: Option<String>,
    /// City.
    pub city: String,
    /// Postal code (five digits for Saudi addresses).
    pub postal_code: String,
    /// ISO 3166-1 alpha-2 country code.
    pub country_code: String,
    /// District (city subdivision). Required for Saudi addresses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub district: Option<String>,
}

impl Address {
    /// True when the address is located in Saudi Arabia.
    pub fn is_saudi(&self) -> bool {
        self.country_code.eq_ignore_ascii_case("SA")
    }
}

/// Payment means (UNTDID 4461 code plus free text).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMeans {
    /// UNTDID 4461 code, e.g. "10" cash, "30" credit transfer, "48" card.
    pub code: String,
    /// Instruction note.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// One invoice line.
///
/// Callers keep `subtotal = quantity * unit_price` and
/// `total = subtotal + vat_amount`; the XML builder renders the values as
/// given and only the validators check them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    /// Item name.
    pub name: String,
    /// Optional item description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Quantity, greater than zero.
    pub quantity: Decimal,
    /// Net price per unit.
    pub unit_price: Decimal,
    /// VAT rate in percent (e.g. 15).
    pub vat_rate: Decimal,
    /// VAT amount for the line.
    pub vat_amount: Decimal,
    /// Net line amount.
    pub subtotal: Decimal,
    /// Line amount including VAT.
    pub total: Decimal,
}

/// Everything needed to render a Phase-2 UBL invoice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZatcaInvoice {
    /// Invoice number (cbc:ID).
    pub invoice_number: String,
    /// Issue timestamp, ISO-8601 with a `T` separator.
    pub issue_date: String,
    /// Payment due date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    /// Standard or simplified.
    pub invoice_type: InvoiceKind,

    /// Seller legal name.
    pub seller_name: String,
    /// Seller VAT registration number.
    pub seller_vat_number: String,
    /// Seller commercial registration number. When absent the VAT number
    /// is rendered in the CRN identification slot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seller_registration_number: Option<String>,
    /// Seller postal address.
    pub seller_address: Address,

    /// Buyer name.
    pub buyer_name: String,
    /// Buyer VAT registration number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buyer_vat_number: Option<String>,
    /// Buyer postal address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buyer_address: Option<Address>,

    /// Payment means.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_means: Option<PaymentMeans>,
    /// Supply (delivery) date, `YYYY-MM-DD`. Defaults to the issue date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supply_date: Option<String>,

    /// Invoice lines.
    pub items: Vec<LineItem>,
    /// Sum of line net amounts.
    pub subtotal: Decimal,
    /// Total VAT.
    pub vat_amount: Decimal,
    /// Total including VAT.
    pub total: Decimal,

    /// ICV: per-seller sequential counter. Defaults to 1.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invoice_counter_value: Option<u64>,
    /// PIH: base64 hash of the previous invoice.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_invoice_hash: Option<String>,
}

impl ZatcaInvoice {
    /// ICV to render.
    pub fn counter_value(&self) -> u64 {
        self.invoice_counter_value.unwrap_or(1)
    }

    /// PIH to render, falling back to [`PLACEHOLDER_PIH`].
    pub fn previous_hash(&self) -> &str {
        self.previous_invoice_hash
            .as_deref()
            .unwrap_or(PLACEHOLDER_PIH)
    }

    /// The Phase-1 subset of this invoice.
    pub fn qr_fields(&self) -> QrFields {
        QrFields {
            seller_name: self.seller_name.clone(),
            vat_number: self.seller_vat_number.clone(),
            timestamp: self.issue_date.clone(),
            total: self.total,
            vat_amount: self.vat_amount,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transaction_codes() {
        assert_eq!(InvoiceKind::Standard.transaction_code(), "0100000");
        assert_eq!(InvoiceKind::Simplified.transaction_code(), "0200000");
        assert_eq!(
            InvoiceKind::from_transaction_code("0200000"),
            Some(InvoiceKind::Simplified)
        );
        assert_eq!(InvoiceKind::from_transaction_code("09"), None);
        assert_eq!(InvoiceKind::from_transaction_code(""), None);
    }

    #[test]
    fn invoice_kind_serializes_upper_case() {
        let json = serde_json::to_string(&InvoiceKind::Simplified).unwrap();
        assert_eq!(json, "\"SIMPLIFIED\"");
    }
}
