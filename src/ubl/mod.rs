//! UBL 2.1 invoice XML for the ZATCA e-invoicing (Fatoora) platform.
//!
//! The generated document follows the KSA data dictionary: reporting
//! profile, KSA-2 transaction code, invoice counter (ICV), previous
//! invoice hash (PIH), an embedded Phase-2 QR code and a XAdES
//! signature block.
//!
//! # Example
//!
//! ```
//! use zatca::core::*;
//! use zatca::ubl;
//! use rust_decimal_macros::dec;
//!
//! let invoice = ZatcaInvoiceBuilder::new("INV-001", "2024-06-15T10:30:00Z", InvoiceKind::Simplified)
//!     .seller("Test Company LLC", "310123456789003",
//!         AddressBuilder::new("King Fahd Road", "1234", "Riyadh", "12345", "SA")
//!             .district("Al Olaya")
//!             .build())
//!     .add_line(LineItemBuilder::new("Coffee", dec!(2), dec!(12.50)).build())
//!     .build()
//!     .unwrap();
//!
//! let xml = ubl::generate_zatca_xml(&invoice).unwrap();
//! assert!(xml.contains("<cbc:ProfileID>reporting:1.0</cbc:ProfileID>"));
//! ```

mod hash;
mod invoice;
mod signature;
pub(crate) mod xml_utils;

pub use hash::compute_invoice_hash;
pub use invoice::{
    XmlOptions, ZatcaDocument, build_zatca_document, generate_zatca_xml, generate_zatca_xml_with,
};
pub use signature::{PlaceholderSignatureProvider, SignatureMaterial, SignatureProvider};

/// UBL version emitted in `cbc:UBLVersionID`.
pub const UBL_VERSION: &str = "2.1";

/// ZATCA business process profile (`cbc:ProfileID`).
pub const ZATCA_PROFILE_ID: &str = "reporting:1.0";

/// UN/CEFACT 1001 code for a commercial invoice.
pub const INVOICE_TYPE_CODE: &str = "388";

/// Namespace URIs used in ZATCA UBL documents.
pub mod ns {
    pub const INVOICE: &str = "urn:oasis:names:specification:ubl:schema:xsd:Invoice-2";
    pub const CAC: &str =
        "urn:oasis:names:specification:ubl:schema:xsd:CommonAggregateComponents-2";
    pub const CBC: &str = "urn:oasis:names:specification:ubl:schema:xsd:CommonBasicComponents-2";
    pub const EXT: &str =
        "urn:oasis:names:specification:ubl:schema:xsd:CommonExtensionComponents-2";
    pub const SIG: &str =
        "urn:oasis:names:specification:ubl:schema:xsd:CommonSignatureComponents-2";
    pub const SAC: &str =
        "urn:oasis:names:specification:ubl:schema:xsd:SignatureAggregateComponents-2";
    pub const SBC: &str =
        "urn:oasis:names:specification:ubl:schema:xsd:SignatureBasicComponents-2";
    pub const DS: &str = "http://www.w3.org/2000/09/xmldsig#";
    pub const XADES: &str = "http://uri.etsi.org/01903/v1.3.2#";
}
