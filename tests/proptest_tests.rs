//! Property-based tests for the TLV encoder, QR payloads and XML output.
//!
//! Run with: `cargo test --features all --test proptest_tests`

#![cfg(feature = "core")]

use proptest::prelude::*;
use rust_decimal::Decimal;
use zatca::core::*;
use zatca::qr::{self, QrTag, tlv};

/// Strings whose UTF-8 encoding fits a single-byte length field.
fn arb_short_text() -> impl Strategy<Value = String> {
    ".{0,80}".prop_filter("fits in 255 bytes", |s| s.len() <= tlv::MAX_VALUE_LEN)
}

fn arb_amount() -> impl Strategy<Value = Decimal> {
    (0i64..10_000_000, 0u32..4).prop_map(|(n, scale)| Decimal::new(n, scale))
}

fn arb_qr_fields() -> impl Strategy<Value = QrFields> {
    (arb_short_text(), "3[0-9]{13}3", arb_amount(), arb_amount()).prop_map(
        |(seller_name, vat_number, total, vat_amount)| QrFields {
            seller_name,
            vat_number,
            timestamp: "2024-06-15T10:30:00Z".into(),
            total,
            vat_amount,
        },
    )
}

proptest! {
    /// decode(encode(tag, value)) returns the same record.
    #[test]
    fn tlv_roundtrip(tag in any::<u8>(), value in arb_short_text()) {
        let bytes = tlv::encode_tlv(tag, value.as_bytes()).unwrap();
        prop_assert_eq!(bytes.len(), value.len() + 2);
        let records = tlv::decode_tlv(&bytes).unwrap();
        prop_assert_eq!(records.len(), 1);
        prop_assert_eq!(records[0].tag, tag);
        prop_assert_eq!(records[0].value_str(), Some(value.as_str()));
    }

    /// Values longer than 255 bytes never encode.
    #[test]
    fn tlv_length_guard(tag in any::<u8>(), len in 256usize..2048) {
        let value = vec![b'a'; len];
        let err = tlv::encode_tlv(tag, &value).unwrap_err();
        prop_assert!(
            matches!(err, ZatcaError::Encoding { tag: t, len: l } if t == tag && l == len),
            "unexpected error: {}", err
        );
    }

    /// Arbitrary bytes either decode or fail cleanly.
    #[test]
    fn tlv_decode_never_panics(bytes in proptest::collection::vec(any::<u8>(), 0..600)) {
        if let Ok(records) = tlv::decode_tlv(&bytes) {
            let total: usize = records.iter().map(|r| r.value.len() + 2).sum();
            prop_assert_eq!(total, bytes.len());
        }
    }

    /// The QR string is a pure function of its fields.
    #[test]
    fn qr_is_deterministic(fields in arb_qr_fields()) {
        let a = qr::generate_zatca_qr_string(&fields).unwrap();
        let b = qr::generate_zatca_qr_string(&fields).unwrap();
        prop_assert_eq!(a, b);
    }

    /// Tags 4 and 5 always carry the two-decimal rendering of the amounts.
    #[test]
    fn qr_amounts_follow_format(fields in arb_qr_fields()) {
        let decoded = qr::decode_zatca_qr(&qr::generate_zatca_qr_string(&fields).unwrap()).unwrap();
        let total = format_amount(fields.total);
        let vat = format_amount(fields.vat_amount);
        prop_assert_eq!(decoded.text(QrTag::InvoiceTotal), Some(total.as_str()));
        prop_assert_eq!(decoded.text(QrTag::VatTotal), Some(vat.as_str()));
    }

    /// Amounts that differ after rounding yield different tag 4 values.
    #[test]
    fn qr_distinguishes_totals(fields in arb_qr_fields(), delta in 1i64..1_000_000) {
        let mut other = fields.clone();
        other.total = fields.total + Decimal::new(delta, 2);
        let a = qr::decode_zatca_qr(&qr::generate_zatca_qr_string(&fields).unwrap()).unwrap();
        let b = qr::decode_zatca_qr(&qr::generate_zatca_qr_string(&other).unwrap()).unwrap();
        prop_assert_ne!(a.get(QrTag::InvoiceTotal), b.get(QrTag::InvoiceTotal));
        prop_assert_eq!(a.get(QrTag::SellerName), b.get(QrTag::SellerName));
    }

    /// Only `^3\d{13}3$` passes the VAT number rule.
    #[test]
    fn vat_number_rule(s in "[0-9]{15}") {
        let expected = s.starts_with('3') && s.ends_with('3');
        prop_assert_eq!(is_valid_vat_number(&s), expected);
    }
}

#[cfg(all(feature = "ubl", feature = "compliance"))]
mod xml {
    use super::*;
    use rust_decimal_macros::dec;
    use zatca::compliance::{self, tree::parse_xml};
    use zatca::ubl;

    fn arb_line() -> impl Strategy<Value = LineItem> {
        (
            "[A-Za-z][A-Za-z<>&'\" ]{0,29}",
            1i64..100,
            1i64..1_000_000,
            prop_oneof![Just(dec!(5)), Just(dec!(15))],
        )
            .prop_map(|(name, qty, price, rate)| {
                LineItemBuilder::new(name, Decimal::from(qty), Decimal::new(price, 2))
                    .vat_rate(rate)
                    .build()
            })
    }

    proptest! {
        /// Any item names and amounts produce well-formed, rule-compliant XML.
        #[test]
        fn generated_xml_is_compliant(
            lines in proptest::collection::vec(arb_line(), 1..5),
            rate in prop_oneof![Just(dec!(5)), Just(dec!(15))],
        ) {
            let mut builder = ZatcaInvoiceBuilder::new("INV-P", "2024-06-15T10:30:00Z", InvoiceKind::Standard)
                .seller(
                    "Test Company LLC",
                    "310123456789003",
                    AddressBuilder::new("King Fahd Road", "1234", "Riyadh", "12345", "SA")
                        .district("Al Olaya")
                        .build(),
                )
                .buyer("Buyer & Sons");
            for line in lines {
                // one rate per invoice
                builder = builder.add_line(
                    LineItemBuilder::new(line.name, line.quantity, line.unit_price)
                        .vat_rate(rate)
                        .build(),
                );
            }
            let invoice = builder.build().unwrap();
            let xml = ubl::generate_zatca_xml(&invoice).unwrap();

            let root = parse_xml(&xml).unwrap();
            prop_assert_eq!(root.children_named("cac:InvoiceLine").count(), invoice.items.len());

            let result = compliance::validate_zatca_requirements(&xml);
            prop_assert!(result.is_valid, "{:?}", result.errors);
            prop_assert!(!result.warnings.iter().any(|w| w.contains("Line ")), "{:?}", result.warnings);
        }
    }
}
