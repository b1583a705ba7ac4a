use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::tlv::{TlvRecord, TlvWriter, decode_tlv, from_base64};
use crate::core::{QrFields, ZatcaError, format_amount};

/// Tag numbers of the ZATCA QR payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum QrTag {
    SellerName = 1,
    VatNumber = 2,
    Timestamp = 3,
    InvoiceTotal = 4,
    VatTotal = 5,
    /// Phase 2: base64 SHA-256 of the invoice XML.
    InvoiceHash = 6,
    /// Phase 2: ECDSA signature over the invoice hash.
    Signature = 7,
    /// Phase 2: public key of the signing certificate.
    PublicKey = 8,
    /// Phase 2, simplified invoices: signature of the certificate by the CA.
    CertificateSignature = 9,
}

impl QrTag {
    pub fn code(self) -> u8 {
        self as u8
    }
}

/// Cryptographic stamps carried in a Phase-2 QR.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QrPhase2Fields {
    /// Tag 6.
    pub invoice_hash: String,
    /// Tag 7.
    pub signature: Vec<u8>,
    /// Tag 8.
    pub public_key: Vec<u8>,
    /// Tag 9, only for simplified invoices.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate_signature: Option<Vec<u8>>,
}

/// Which tag set to emit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QrPhase {
    /// Tags 1-5.
    Phase1,
    /// Tags 1-8, plus 9 when a certificate signature is present.
    Phase2(QrPhase2Fields),
}

/// A QR payload: the Phase-1 fields plus the phase-specific extras.
#[derive(Debug, Clone, PartialEq)]
pub struct QrPayload<'a> {
    pub fields: &'a QrFields,
    pub phase: QrPhase,
}

impl<'a> QrPayload<'a> {
    pub fn phase1(fields: &'a QrFields) -> Self {
        Self {
            fields,
            phase: QrPhase::Phase1,
        }
    }

    pub fn phase2(fields: &'a QrFields, extras: QrPhase2Fields) -> Self {
        Self {
            fields,
            phase: QrPhase::Phase2(extras),
        }
    }
}

/// Encode a payload of either phase into the TLV bytes.
pub fn encode_qr_bytes(payload: &QrPayload<'_>) -> Result<Vec<u8>, ZatcaError> {
    let f = payload.fields;
    let mut w = TlvWriter::new();
    w.push_str(QrTag::SellerName.code(), &f.seller_name)?
        .push_str(QrTag::VatNumber.code(), &f.vat_number)?
        .push_str(QrTag::Timestamp.code(), &f.timestamp)?
        .push_str(QrTag::InvoiceTotal.code(), &format_amount(f.total))?
        .push_str(QrTag::VatTotal.code(), &format_amount(f.vat_amount))?;

    if let QrPhase::Phase2(extras) = &payload.phase {
        w.push_str(QrTag::InvoiceHash.code(), &extras.invoice_hash)?
            .push(QrTag::Signature.code(), &extras.signature)?
            .push(QrTag::PublicKey.code(), &extras.public_key)?;
        if let Some(cert_sig) = &extras.certificate_signature {
            w.push(QrTag::CertificateSignature.code(), cert_sig)?;
        }
    }
    Ok(w.into_bytes())
}

/// Encode a payload of either phase as base64.
pub fn encode_qr_payload(payload: &QrPayload<'_>) -> Result<String, ZatcaError> {
    use base64::Engine as _;
    let bytes = encode_qr_bytes(payload)?;
    Ok(base64::engine::general_purpose::STANDARD.encode(bytes))
}

/// Phase-1 QR string: tags 1-5, amounts with two decimals, base64.
///
/// The fields are encoded as given; run
/// [`is_zatca_compliant`](crate::core::is_zatca_compliant) first to
/// reject incomplete data.
pub fn generate_zatca_qr_string(fields: &QrFields) -> Result<String, ZatcaError> {
    let qr = encode_qr_payload(&QrPayload::phase1(fields))?;
    log::debug!(
        "generated phase 1 QR for seller VAT {} ({} base64 chars)",
        fields.vat_number,
        qr.len()
    );
    Ok(qr)
}

/// A decoded QR payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedQr {
    pub records: Vec<TlvRecord>,
}

impl DecodedQr {
    /// Raw record for `tag`.
    pub fn get(&self, tag: QrTag) -> Option<&TlvRecord> {
        self.records.iter().find(|r| r.tag == tag.code())
    }

    /// Text value of `tag`.
    pub fn text(&self, tag: QrTag) -> Option<&str> {
        self.get(tag).and_then(TlvRecord::value_str)
    }

    pub fn seller_name(&self) -> Option<&str> {
        self.text(QrTag::SellerName)
    }

    pub fn vat_number(&self) -> Option<&str> {
        self.text(QrTag::VatNumber)
    }

    pub fn timestamp(&self) -> Option<&str> {
        self.text(QrTag::Timestamp)
    }

    pub fn total(&self) -> Option<Decimal> {
        self.text(QrTag::InvoiceTotal).and_then(|s| s.parse().ok())
    }

    pub fn vat_amount(&self) -> Option<Decimal> {
        self.text(QrTag::VatTotal).and_then(|s| s.parse().ok())
    }

    /// True if the payload carries the Phase-2 stamps (tags 6-8).
    pub fn is_phase2(&self) -> bool {
        [QrTag::InvoiceHash, QrTag::Signature, QrTag::PublicKey]
            .iter()
            .all(|t| self.get(*t).is_some())
    }
}

/// Decode a base64 QR string into its records.
pub fn decode_zatca_qr(qr: &str) -> Result<DecodedQr, ZatcaError> {
    let bytes = from_base64(qr)?;
    Ok(DecodedQr {
        records: decode_tlv(&bytes)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn fields() -> QrFields {
        QrFields {
            seller_name: "Test Company LLC".into(),
            vat_number: "310122393500003".into(),
            timestamp: "2024-06-15T10:30:00Z".into(),
            total: dec!(100),
            vat_amount: dec!(15),
        }
    }

    #[test]
    fn phase1_tag_order_and_values() {
        let qr = generate_zatca_qr_string(&fields()).unwrap();
        let decoded = decode_zatca_qr(&qr).unwrap();
        let tags: Vec<u8> = decoded.records.iter().map(|r| r.tag).collect();
        assert_eq!(tags, vec![1, 2, 3, 4, 5]);
        assert_eq!(decoded.seller_name(), Some("Test Company LLC"));
        assert_eq!(decoded.vat_number(), Some("310122393500003"));
        assert_eq!(decoded.timestamp(), Some("2024-06-15T10:30:00Z"));
        assert_eq!(decoded.text(QrTag::InvoiceTotal), Some("100.00"));
        assert_eq!(decoded.text(QrTag::VatTotal), Some("15.00"));
        assert!(!decoded.is_phase2());
    }

    #[test]
    fn known_vector() {
        let f = QrFields {
            seller_name: "Bobs Records".into(),
            vat_number: "310122393500003".into(),
            timestamp: "2022-04-25T15:30:00Z".into(),
            total: dec!(1000),
            vat_amount: dec!(150),
        };
        let qr = generate_zatca_qr_string(&f).unwrap();
        assert_eq!(
            qr,
            "AQxCb2JzIFJlY29yZHMCDzMxMDEyMjM5MzUwMDAwMwMUMjAyMi0wNC0yNVQxNTozMDowMFoEBzEwMDAuMDAFBjE1MC4wMA=="
        );
    }

    #[test]
    fn amounts_are_rounded_half_up() {
        let f = QrFields {
            total: dec!(115.005),
            vat_amount: dec!(15.005),
            ..fields()
        };
        let decoded = decode_zatca_qr(&generate_zatca_qr_string(&f).unwrap()).unwrap();
        assert_eq!(decoded.text(QrTag::InvoiceTotal), Some("115.01"));
        assert_eq!(decoded.text(QrTag::VatTotal), Some("15.01"));
        assert_eq!(decoded.vat_amount(), Some(dec!(15.01)));
    }

    #[test]
    fn phase2_adds_stamps() {
        let f = fields();
        let extras = QrPhase2Fields {
            invoice_hash: "aGFzaA==".into(),
            signature: b"sig".to_vec(),
            public_key: vec![0x30, 0x56, 0x30, 0x10],
            certificate_signature: None,
        };
        let qr = encode_qr_payload(&QrPayload::phase2(&f, extras.clone())).unwrap();
        let decoded = decode_zatca_qr(&qr).unwrap();
        let tags: Vec<u8> = decoded.records.iter().map(|r| r.tag).collect();
        assert_eq!(tags, vec![1, 2, 3, 4, 5, 6, 7, 8]);
        assert!(decoded.is_phase2());
        assert_eq!(decoded.get(QrTag::PublicKey).unwrap().value, extras.public_key);

        let with_cert = QrPhase2Fields {
            certificate_signature: Some(b"ca".to_vec()),
            ..extras
        };
        let decoded =
            decode_zatca_qr(&encode_qr_payload(&QrPayload::phase2(&f, with_cert)).unwrap())
                .unwrap();
        assert_eq!(decoded.records.len(), 9);
    }

    #[test]
    fn phase1_prefix_is_shared_with_phase2() {
        let f = fields();
        let p1 = encode_qr_bytes(&QrPayload::phase1(&f)).unwrap();
        let p2 = encode_qr_bytes(&QrPayload::phase2(&f, QrPhase2Fields::default())).unwrap();
        assert!(p2.starts_with(&p1));
    }

    #[test]
    fn oversized_seller_name_fails() {
        let f = QrFields {
            seller_name: "x".repeat(256),
            ..fields()
        };
        assert!(matches!(
            generate_zatca_qr_string(&f),
            Err(ZatcaError::Encoding { tag: 1, len: 256 })
        ));
    }
}
