use rust_decimal_macros::dec;
use zatca::compliance::{self, Environment, LocalSimulator, ValidationOptions};
use zatca::core::*;
use zatca::ubl::{self, PlaceholderSignatureProvider, XmlOptions};

fn seller_address() -> Address {
    AddressBuilder::new("King Fahd Road", "1234", "Riyadh", "12345", "SA")
        .district("Al Olaya")
        .additional_number("5678")
        .build()
}

fn main() {
    let mut chain = InvoiceChain::new();
    let simulator = LocalSimulator;

    for (n, kind) in [InvoiceKind::Standard, InvoiceKind::Simplified]
        .into_iter()
        .enumerate()
    {
        let mut builder = ZatcaInvoiceBuilder::new(
            format!("INV-2024-{:04}", n + 1),
            "2024-06-15T10:30:00Z",
            kind,
        )
        .seller("Test Company LLC", "310123456789003", seller_address())
        .seller_registration_number("1010010000")
        .payment_means("10", Some("Cash".into()))
        .add_line(
            LineItemBuilder::new("Consulting", dec!(10), dec!(100))
                .description("Tax advisory")
                .build(),
        )
        .add_line(
            LineItemBuilder::new("Printed books", dec!(3), dec!(40))
                .vat_rate(dec!(15))
                .build(),
        );
        if kind == InvoiceKind::Standard {
            builder = builder
                .buyer("Buyer Trading Co")
                .buyer_vat_number("300000000000003")
                .buyer_address(
                    AddressBuilder::new("Prince Sultan St", "4321", "Jeddah", "23456", "SA")
                        .district("Al Rawdah")
                        .build(),
                );
        }
        let mut invoice = builder.build().expect("invoice should be complete");

        chain.stamp(&mut invoice).expect("previous invoice was recorded");
        let doc = ubl::build_zatca_document(
            &invoice,
            &PlaceholderSignatureProvider,
            &XmlOptions::default(),
        )
        .expect("XML generation");
        chain.record(doc.invoice_hash.clone()).expect("stamped above");

        println!("=== {} (ICV {}) ===", invoice.invoice_number, invoice.counter_value());
        println!("  Type:  {}", kind.transaction_code());
        println!("  Total: {} SAR", format_amount(invoice.total));
        println!("  Hash:  {}", doc.invoice_hash);
        println!("  QR:    {} chars", doc.qr.len());

        let result = compliance::validate_zatca_requirements(&doc.xml);
        println!("  Valid: {}", result.is_valid);
        for w in &result.warnings {
            println!("  Warning: {}", w);
        }

        let report = simulator.report(
            &ValidationOptions::new(doc.xml).environment(Environment::Simulation),
        );
        println!("  Status: {:?}", report.validation_status);
        println!("{}\n", report.to_json().expect("report serializes"));
    }
}
