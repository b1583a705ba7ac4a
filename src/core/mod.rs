//! Core invoice types, builders, validation and formatting.
//!
//! This module holds the plain invoice-shaped data the encoders consume,
//! the Saudi VAT number rules and the object-level compliance checks.

mod builder;
mod chain;
mod error;
pub mod format;
mod types;
mod validation;
mod vat_number;

pub use builder::*;
pub use chain::InvoiceChain;
pub use error::*;
pub use format::{format_amount, format_date_only, format_time_only, round_amount};
pub use types::*;
pub use validation::*;
pub(crate) use validation::is_digits;
pub use vat_number::{VatNumberError, is_valid_vat_number, validate_vat_number};
