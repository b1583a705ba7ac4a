//! Random, schema-valid sample data for tests, demos and benchmarks.
//!
//! ```
//! use rand::SeedableRng;
//! use rand::rngs::StdRng;
//! use zatca::core::{InvoiceKind, is_valid_vat_number, validate_invoice_data};
//! use zatca::testdata;
//!
//! let mut rng = StdRng::seed_from_u64(7);
//! assert!(is_valid_vat_number(&testdata::random_vat_number(&mut rng)));
//! let invoice = testdata::sample_invoice(&mut rng, InvoiceKind::Standard);
//! assert!(validate_invoice_data(&invoice).is_empty());
//! ```

use rand::Rng;
use rand::seq::SliceRandom;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::core::{
    Address, AddressBuilder, InvoiceKind, LineItem, LineItemBuilder, PaymentMeans, QrFields,
    ZatcaInvoice, round_amount,
};

const CITIES: &[(&str, &str)] = &[
    ("Riyadh", "Al Olaya"),
    ("Jeddah", "Al Rawdah"),
    ("Dammam", "Al Faisaliyah"),
    ("Makkah", "Al Aziziyah"),
    ("Madinah", "Quba"),
];

const STREETS: &[&str] = &[
    "King Fahd Road",
    "Prince Sultan Street",
    "Tahlia Street",
    "King Abdulaziz Road",
];

const COMPANIES: &[&str] = &[
    "Test Company LLC",
    "Al Noor Trading",
    "Desert Rose Est.",
    "شركة الاختبار",
    "Gulf & Co <Holding>",
];

const PRODUCTS: &[&str] = &["Consulting", "Coffee beans", "Laptop", "Office chair", "Support hours"];

fn pick<'a, R: Rng + ?Sized>(rng: &mut R, items: &[&'a str]) -> &'a str {
    items.choose(rng).copied().unwrap_or_default()
}

fn digits<R: Rng + ?Sized>(rng: &mut R, n: usize) -> String {
    (0..n).map(|_| char::from(b'0' + rng.gen_range(0..10u8))).collect()
}

/// A VAT number matching `^3\d{13}3$`.
pub fn random_vat_number<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!("3{}3", digits(rng, 13))
}

/// A Saudi national address with district, 4-digit building number and
/// 5-digit postal code.
pub fn sample_address<R: Rng + ?Sized>(rng: &mut R) -> Address {
    let (city, district) = CITIES.choose(rng).copied().unwrap_or(("Riyadh", "Al Olaya"));
    AddressBuilder::new(
        pick(rng, STREETS),
        format!("{}", rng.gen_range(1000..10000)),
        city,
        format!("{}", rng.gen_range(10000..100000)),
        "SA",
    )
    .district(district)
    .additional_number(digits(rng, 4))
    .build()
}

fn random_price<R: Rng + ?Sized>(rng: &mut R) -> Decimal {
    Decimal::new(rng.gen_range(100..100_000i64), 2)
}

/// A timestamp in 2024 with whole seconds, `YYYY-MM-DDTHH:MM:SSZ`.
fn random_timestamp<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!(
        "2024-{:02}-{:02}T{:02}:{:02}:{:02}Z",
        rng.gen_range(1..=12),
        rng.gen_range(1..=28),
        rng.gen_range(0..24),
        rng.gen_range(0..60),
        rng.gen_range(0..60),
    )
}

/// An invoice with 1 to 5 lines, all at the same allowed VAT rate.
pub fn sample_invoice<R: Rng + ?Sized>(rng: &mut R, kind: InvoiceKind) -> ZatcaInvoice {
    let rate = if rng.gen_bool(0.8) { dec!(15) } else { dec!(5) };
    let items: Vec<LineItem> = (0..rng.gen_range(1..=5))
        .map(|_| {
            LineItemBuilder::new(
                pick(rng, PRODUCTS),
                Decimal::from(rng.gen_range(1..20i64)),
                random_price(rng),
            )
            .vat_rate(rate)
            .build()
        })
        .collect();
    let subtotal: Decimal = items.iter().map(|l| l.subtotal).sum();
    let vat_amount: Decimal = items.iter().map(|l| l.vat_amount).sum();

    let standard = kind == InvoiceKind::Standard;
    ZatcaInvoice {
        invoice_number: format!("INV-{}", digits(rng, 6)),
        issue_date: random_timestamp(rng),
        due_date: None,
        invoice_type: kind,
        seller_name: pick(rng, COMPANIES).to_string(),
        seller_vat_number: random_vat_number(rng),
        seller_registration_number: Some(format!("10{}", digits(rng, 8))),
        seller_address: sample_address(rng),
        buyer_name: if standard { pick(rng, COMPANIES).to_string() } else { String::new() },
        buyer_vat_number: standard.then(|| random_vat_number(rng)),
        buyer_address: standard.then(|| sample_address(rng)),
        payment_means: Some(PaymentMeans {
            code: pick(rng, &["10", "30", "42", "48"]).to_string(),
            description: None,
        }),
        supply_date: None,
        items,
        subtotal,
        vat_amount,
        total: subtotal + vat_amount,
        invoice_counter_value: Some(rng.gen_range(1..10_000)),
        previous_invoice_hash: None,
    }
}

/// Phase-1 QR fields with a valid VAT number and consistent 15% VAT.
pub fn sample_qr_fields<R: Rng + ?Sized>(rng: &mut R) -> QrFields {
    let net = random_price(rng) * Decimal::from(rng.gen_range(1..10i64));
    let vat = round_amount(net * dec!(0.15));
    QrFields {
        seller_name: pick(rng, COMPANIES).to_string(),
        vat_number: random_vat_number(rng),
        timestamp: random_timestamp(rng),
        total: net + vat,
        vat_amount: vat,
    }
}
