//! ZATCA QR codes: TLV encoding and the Phase-1 / Phase-2 payloads.
//!
//! # Example
//!
//! ```
//! use zatca::core::QrFields;
//! use zatca::qr;
//! use rust_decimal_macros::dec;
//!
//! let fields = QrFields {
//!     seller_name: "Test Company LLC".into(),
//!     vat_number: "310122393500003".into(),
//!     timestamp: "2024-06-15T10:30:00Z".into(),
//!     total: dec!(1150),
//!     vat_amount: dec!(150),
//! };
//! let qr = qr::generate_zatca_qr_string(&fields).unwrap();
//! let decoded = qr::decode_zatca_qr(&qr).unwrap();
//! assert_eq!(decoded.text(qr::QrTag::InvoiceTotal), Some("1150.00"));
//! ```

mod payload;
pub mod tlv;

pub use payload::{
    DecodedQr, QrPayload, QrPhase, QrPhase2Fields, QrTag, decode_zatca_qr, encode_qr_bytes,
    encode_qr_payload, generate_zatca_qr_string,
};
pub use tlv::{TlvRecord, TlvWriter, decode_tlv, encode_tlv, encode_tlv_hex, to_base64};
