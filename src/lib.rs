//! # zatca
//!
//! Saudi Arabian e-invoicing (ZATCA / Fatoora) library: TLV QR codes for
//! Phase 1 and Phase 2, UBL 2.1 invoice XML, and compliance validation.
//!
//! All monetary values use [`rust_decimal::Decimal`], never floating point.
//! Amounts are rounded half away from zero to two decimals.
//!
//! ## Quick Start
//!
//! ```rust
//! use zatca::core::*;
//! use zatca::{compliance, qr, ubl};
//! use rust_decimal_macros::dec;
//!
//! let invoice = ZatcaInvoiceBuilder::new("INV-2024-001", "2024-06-15T10:30:00Z", InvoiceKind::Standard)
//!     .seller("Test Company LLC", "310123456789003",
//!         AddressBuilder::new("King Fahd Road", "1234", "Riyadh", "12345", "SA")
//!             .district("Al Olaya")
//!             .build())
//!     .buyer("Buyer Trading Co")
//!     .add_line(LineItemBuilder::new("Consulting", dec!(10), dec!(100)).build())
//!     .build()
//!     .unwrap();
//!
//! let qr = qr::generate_zatca_qr_string(&invoice.qr_fields()).unwrap();
//! assert!(!qr.is_empty());
//!
//! let xml = ubl::generate_zatca_xml(&invoice).unwrap();
//! let result = compliance::validate_zatca_requirements(&xml);
//! assert!(result.is_valid, "{:?}", result.errors);
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `core` (default) | Invoice types, builders, VAT number rules, TLV and QR codes |
//! | `ubl` (default) | UBL 2.1 invoice XML with signature block and embedded QR |
//! | `compliance` (default) | XML structure and business rule validation, reports |
//! | `testdata` | Random sample invoices and QR fields |
//! | `all` | Everything |

#[cfg(feature = "core")]
pub mod core;

#[cfg(feature = "core")]
pub mod qr;

#[cfg(feature = "ubl")]
pub mod ubl;

#[cfg(feature = "compliance")]
pub mod compliance;

#[cfg(feature = "testdata")]
pub mod testdata;

// Re-export core types at crate root for convenience
#[cfg(feature = "core")]
pub use crate::core::*;
