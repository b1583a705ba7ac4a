//! Simulated ZATCA compliance gateway on generated invoices.

#![cfg(all(feature = "ubl", feature = "compliance"))]

use rust_decimal_macros::dec;
use zatca::compliance::{
    ComplianceGateway, Environment, LocalSimulator, MessageType, ValidationOptions,
    ValidationStatus, validate_xml_with_zatca,
};
use zatca::core::*;
use zatca::ubl;

fn invoice() -> ZatcaInvoice {
    ZatcaInvoiceBuilder::new("INV-2024-001", "2024-06-15T10:30:00Z", InvoiceKind::Simplified)
        .seller(
            "Test Company LLC",
            "310123456789003",
            AddressBuilder::new("King Fahd Road", "1234", "Riyadh", "12345", "SA")
                .district("Al Olaya")
                .build(),
        )
        .add_line(LineItemBuilder::new("Coffee", dec!(2), dec!(12.50)).build())
        .build()
        .unwrap()
}

#[tokio::test]
async fn placeholder_signed_invoice_passes_with_warnings() {
    let xml = ubl::generate_zatca_xml(&invoice()).unwrap();
    let report = validate_xml_with_zatca(ValidationOptions::new(xml)).await.unwrap();

    assert_eq!(report.validation_status, ValidationStatus::Warning);
    assert!(report.is_valid);
    assert_eq!(report.errors().count(), 0);
    assert!(report.warnings().any(|m| m.code == rule::SIGNATURE_PLACEHOLDER));
    // ICV 1 with the initial PIH is informational
    assert!(
        report
            .validation_messages
            .iter()
            .any(|m| m.kind == MessageType::Info && m.code == rule::PIH_PLACEHOLDER)
    );
    assert!(report.request_id.is_some());
    assert_eq!(report.environment, Environment::Sandbox);
}

#[tokio::test]
async fn rejected_invoice_fails() {
    let mut inv = invoice();
    inv.items[0].vat_rate = dec!(10);
    let xml = ubl::generate_zatca_xml(&inv).unwrap();
    let options = ValidationOptions::new(xml).environment(Environment::Simulation);
    let report = LocalSimulator.validate(&options).await.unwrap();

    assert_eq!(report.validation_status, ValidationStatus::Fail);
    assert!(!report.is_valid);
    assert_eq!(report.environment, Environment::Simulation);
    let rate_errors: Vec<_> = report.errors().filter(|m| m.code == rule::VAT_RATE).collect();
    assert_eq!(rate_errors.len(), 2);
    assert!(
        rate_errors
            .iter()
            .any(|m| m.path.as_deref() == Some("/Invoice/cac:InvoiceLine[1]/cac:Item/cac:ClassifiedTaxCategory/cbc:Percent"))
    );
}

#[tokio::test]
async fn concurrent_validations() {
    let xml = ubl::generate_zatca_xml(&invoice()).unwrap();
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let options = ValidationOptions::new(xml.clone()).request_id(format!("req-{i}"));
            tokio::spawn(async move { validate_xml_with_zatca(options).await })
        })
        .collect();
    for (i, handle) in handles.into_iter().enumerate() {
        let report = handle.await.unwrap().unwrap();
        assert!(report.is_valid);
        assert_eq!(report.request_id, Some(format!("req-{i}")));
    }
}

#[test]
fn report_serializes_to_api_json() {
    let xml = ubl::generate_zatca_xml(&invoice()).unwrap();
    let report = LocalSimulator.report(&ValidationOptions::new(xml).request_id("abc"));
    let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();

    assert_eq!(json["isValid"], true);
    assert_eq!(json["validationStatus"], "WARNING");
    assert_eq!(json["requestId"], "abc");
    assert!(json["timestamp"].as_str().unwrap().ends_with('Z'));
    assert!(
        json["validationMessages"]
            .as_array()
            .unwrap()
            .iter()
            .all(|m| m["type"].is_string() && m["code"].is_string())
    );
}

#[tokio::test]
async fn structure_failures_fail_the_report() {
    let xml = ubl::generate_zatca_xml(&invoice()).unwrap();
    let start = xml.find("<cac:AccountingCustomerParty>").unwrap();
    let end = xml.find("</cac:AccountingCustomerParty>").unwrap()
        + "</cac:AccountingCustomerParty>".len();
    let stripped = format!("{}{}", &xml[..start], &xml[end..]);

    // Simplified invoices need no buyer, so only the pre-check objects.
    assert!(zatca::compliance::validate_zatca_requirements(&stripped).is_valid);

    let report = validate_xml_with_zatca(ValidationOptions::new(stripped)).await.unwrap();
    assert_eq!(report.validation_status, ValidationStatus::Fail);
    assert!(!report.is_valid);
    let errors: Vec<_> = report.errors().collect();
    assert_eq!(errors.len(), 1, "{errors:?}");
    assert_eq!(errors[0].code, rule::MISSING_ELEMENT);
    assert_eq!(errors[0].message, "Missing required element: cac:AccountingCustomerParty");
    assert_eq!(errors[0].path.as_deref(), Some("/Invoice/cac:AccountingCustomerParty"));
}
