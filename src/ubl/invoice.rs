use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::hash::compute_invoice_hash;
use super::signature::{
    INVOICE_SIGNATURE_ID, PlaceholderSignatureProvider, SignatureMaterial, SignatureProvider,
    XADES_EXTENSION_URI, write_signature_extension,
};
use super::xml_utils::{XmlResult, XmlWriter};
use super::{INVOICE_TYPE_CODE, UBL_VERSION, ZATCA_PROFILE_ID, ns};
use crate::core::format::{format_decimal, parse_date};
use crate::core::*;
use crate::qr::{QrPayload, QrPhase2Fields, encode_qr_payload};

/// Knobs for XML generation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct XmlOptions {
    /// Fixed document UUID (KSA-1). A random v4 UUID is used when unset.
    pub uuid: Option<Uuid>,
}

/// Generate a ZATCA UBL 2.1 invoice signed with placeholder material.
pub fn generate_zatca_xml(invoice: &ZatcaInvoice) -> XmlResult {
    generate_zatca_xml_with(invoice, &PlaceholderSignatureProvider, &XmlOptions::default())
}

/// Generate a ZATCA UBL 2.1 invoice using the given signer.
pub fn generate_zatca_xml_with(
    invoice: &ZatcaInvoice,
    signer: &dyn SignatureProvider,
    options: &XmlOptions,
) -> XmlResult {
    build_zatca_document(invoice, signer, options).map(|doc| doc.xml)
}

/// A rendered invoice together with the values needed to chain the next one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZatcaDocument {
    pub xml: String,
    /// Base64 SHA-256 of the unsigned document; the next invoice's PIH.
    pub invoice_hash: String,
    /// Phase-2 QR code embedded in the document.
    pub qr: String,
}

/// Render, hash and sign an invoice.
///
/// The invoice is rendered twice: once without signature extension,
/// `cac:Signature` and QR reference to obtain the invoice hash and the
/// signature, then in full with the Phase-2 QR code embedded.
pub fn build_zatca_document(
    invoice: &ZatcaInvoice,
    signer: &dyn SignatureProvider,
    options: &XmlOptions,
) -> Result<ZatcaDocument, ZatcaError> {
    let header = Header::new(invoice, options)?;
    if invoice.previous_hash() == PLACEHOLDER_PIH && invoice.counter_value() > 1 {
        log::warn!(
            "invoice {} uses the placeholder PIH with ICV {}",
            invoice.invoice_number,
            invoice.counter_value()
        );
    }

    let unsigned = render(invoice, &header, None)?;
    let invoice_hash = compute_invoice_hash(&unsigned);
    let material = signer.sign(unsigned.as_bytes())?;

    let certificate_signature = match invoice.invoice_type {
        InvoiceKind::Simplified => material.certificate_signature.clone(),
        InvoiceKind::Standard => None,
    };
    let fields = invoice.qr_fields();
    let qr = encode_qr_payload(&QrPayload::phase2(
        &fields,
        QrPhase2Fields {
            invoice_hash: invoice_hash.clone(),
            signature: material.qr_signature.clone(),
            public_key: material.public_key.clone(),
            certificate_signature,
        },
    ))?;

    log::debug!(
        "generated ZATCA XML for invoice {} (ICV {}, hash {invoice_hash})",
        invoice.invoice_number,
        invoice.counter_value()
    );
    let xml = render(invoice, &header, Some(Stamp { material: &material, qr: &qr }))?;
    Ok(ZatcaDocument {
        xml,
        invoice_hash,
        qr,
    })
}

/// Values derived once so both renderings agree.
struct Header {
    uuid: String,
    issue_date: String,
    issue_time: String,
    due_date: Option<String>,
    supply_date: String,
}

impl Header {
    fn new(invoice: &ZatcaInvoice, options: &XmlOptions) -> Result<Self, ZatcaError> {
        let issue_date = format_date_only(&invoice.issue_date)?;
        let supply_date = match &invoice.supply_date {
            Some(d) => parse_date(d)?.format("%Y-%m-%d").to_string(),
            None => issue_date.clone(),
        };
        let due_date = invoice
            .due_date
            .as_deref()
            .map(|d| parse_date(d).map(|d| d.format("%Y-%m-%d").to_string()))
            .transpose()?;
        Ok(Self {
            uuid: options.uuid.unwrap_or_else(Uuid::new_v4).to_string(),
            issue_time: format_time_only(&invoice.issue_date)?,
            issue_date,
            due_date,
            supply_date,
        })
    }
}

/// Signature material and QR code for the final rendering.
struct Stamp<'a> {
    material: &'a SignatureMaterial,
    qr: &'a str,
}

fn render(invoice: &ZatcaInvoice, header: &Header, stamp: Option<Stamp<'_>>) -> XmlResult {
    let mut w = XmlWriter::new()?;

    w.start_element_with_attrs(
        "Invoice",
        &[
            ("xmlns", ns::INVOICE),
            ("xmlns:cac", ns::CAC),
            ("xmlns:cbc", ns::CBC),
            ("xmlns:ext", ns::EXT),
        ],
    )?;

    // KSA-15: Signature extension
    if let Some(stamp) = &stamp {
        write_signature_extension(&mut w, stamp.material)?;
    }

    w.text_element("cbc:UBLVersionID", UBL_VERSION)?;
    w.text_element("cbc:ProfileID", ZATCA_PROFILE_ID)?;
    // BT-1: Invoice number
    w.text_element("cbc:ID", &invoice.invoice_number)?;
    // KSA-1: Invoice UUID
    w.text_element("cbc:UUID", &header.uuid)?;
    // BT-2 / KSA-25: Issue date and time
    w.text_element("cbc:IssueDate", &header.issue_date)?;
    w.text_element("cbc:IssueTime", &header.issue_time)?;
    // BT-9: Due date
    if let Some(due) = &header.due_date {
        w.text_element("cbc:DueDate", due)?;
    }
    // BT-3 / KSA-2: Type code and transaction code
    let transaction_code = invoice.invoice_type.transaction_code();
    w.text_element_with_attrs(
        "cbc:InvoiceTypeCode",
        INVOICE_TYPE_CODE,
        &[
            ("name", transaction_code.as_str()),
            ("listID", "UNCL1001"),
            ("listAgencyID", "6"),
        ],
    )?;
    // BT-5 / BT-6: Currencies
    w.text_element("cbc:DocumentCurrencyCode", CURRENCY_SAR)?;
    w.text_element("cbc:TaxCurrencyCode", CURRENCY_SAR)?;

    // KSA-16: Invoice counter value
    w.start_element("cac:AdditionalDocumentReference")?;
    w.text_element("cbc:ID", "ICV")?;
    w.text_element("cbc:UUID", &invoice.counter_value().to_string())?;
    w.end_element("cac:AdditionalDocumentReference")?;

    // KSA-13: Previous invoice hash
    write_attachment_reference(&mut w, "PIH", invoice.previous_hash())?;

    if let Some(stamp) = &stamp {
        // KSA-14: QR code
        write_attachment_reference(&mut w, "QR", stamp.qr)?;

        w.start_element("cac:Signature")?;
        w.text_element("cbc:ID", INVOICE_SIGNATURE_ID)?;
        w.text_element("cbc:SignatureMethod", XADES_EXTENSION_URI)?;
        w.end_element("cac:Signature")?;
    }

    write_seller(&mut w, invoice)?;
    write_buyer(&mut w, invoice)?;

    // KSA-5: Supply date
    w.start_element("cac:Delivery")?;
    w.text_element("cbc:ActualDeliveryDate", &header.supply_date)?;
    w.end_element("cac:Delivery")?;

    // BT-81 / BT-82: Payment means
    if let Some(pm) = &invoice.payment_means {
        w.start_element("cac:PaymentMeans")?;
        w.text_element("cbc:PaymentMeansCode", &pm.code)?;
        if let Some(desc) = &pm.description {
            w.text_element("cbc:InstructionNote", desc)?;
        }
        w.end_element("cac:PaymentMeans")?;
    }

    write_tax_totals(&mut w, invoice)?;

    // BG-22: Document totals
    w.start_element("cac:LegalMonetaryTotal")?;
    w.amount_element("cbc:LineExtensionAmount", invoice.subtotal, CURRENCY_SAR)?;
    w.amount_element("cbc:TaxExclusiveAmount", invoice.subtotal, CURRENCY_SAR)?;
    w.amount_element("cbc:TaxInclusiveAmount", invoice.total, CURRENCY_SAR)?;
    w.amount_element("cbc:PayableAmount", invoice.total, CURRENCY_SAR)?;
    w.end_element("cac:LegalMonetaryTotal")?;

    for (idx, line) in invoice.items.iter().enumerate() {
        write_line(&mut w, idx + 1, line)?;
    }

    w.end_element("Invoice")?;
    w.into_string()
}

fn write_attachment_reference(w: &mut XmlWriter, id: &str, content: &str) -> Result<(), ZatcaError> {
    w.start_element("cac:AdditionalDocumentReference")?;
    w.text_element("cbc:ID", id)?;
    w.start_element("cac:Attachment")?;
    w.text_element_with_attrs(
        "cbc:EmbeddedDocumentBinaryObject",
        content,
        &[("mimeCode", "text/plain")],
    )?;
    w.end_element("cac:Attachment")?;
    w.end_element("cac:AdditionalDocumentReference")?;
    Ok(())
}

fn write_seller(w: &mut XmlWriter, invoice: &ZatcaInvoice) -> Result<(), ZatcaError> {
    w.start_element("cac:AccountingSupplierParty")?;
    w.start_element("cac:Party")?;

    // BT-29: Seller identification, falls back to the VAT number
    let crn = invoice
        .seller_registration_number
        .as_deref()
        .unwrap_or(&invoice.seller_vat_number);
    w.start_element("cac:PartyIdentification")?;
    w.text_element_with_attrs("cbc:ID", crn, &[("schemeID", "CRN")])?;
    w.end_element("cac:PartyIdentification")?;

    write_address(w, &invoice.seller_address)?;
    // BT-31: Seller VAT number
    write_tax_scheme(w, &invoice.seller_vat_number)?;
    // BT-27: Seller name
    write_legal_entity(w, &invoice.seller_name)?;

    w.end_element("cac:Party")?;
    w.end_element("cac:AccountingSupplierParty")?;
    Ok(())
}

fn write_buyer(w: &mut XmlWriter, invoice: &ZatcaInvoice) -> Result<(), ZatcaError> {
    w.start_element("cac:AccountingCustomerParty")?;
    w.start_element("cac:Party")?;

    if let Some(addr) = &invoice.buyer_address {
        write_address(w, addr)?;
    }
    // BT-48: Buyer VAT number
    if let Some(vat) = &invoice.buyer_vat_number {
        write_tax_scheme(w, vat)?;
    }
    // BT-44: Buyer name
    if !invoice.buyer_name.is_empty() {
        write_legal_entity(w, &invoice.buyer_name)?;
    }

    w.end_element("cac:Party")?;
    w.end_element("cac:AccountingCustomerParty")?;
    Ok(())
}

fn write_address(w: &mut XmlWriter, addr: &Address) -> Result<(), ZatcaError> {
    w.start_element("cac:PostalAddress")?;
    w.text_element("cbc:StreetName", &addr.street)?;
    // KSA-17: Building number
    w.text_element("cbc:BuildingNumber", &addr.building_number)?;
    // KSA-23: Additional number
    if let Some(additional) = &addr.additional_number {
        w.text_element("cbc:PlotIdentification", additional)?;
    }
    // KSA-3: District
    if let Some(district) = &addr.district {
        w.text_element("cbc:CitySubdivisionName", district)?;
    }
    w.text_element("cbc:CityName", &addr.city)?;
    w.text_element("cbc:PostalZone", &addr.postal_code)?;
    w.start_element("cac:Country")?;
    w.text_element("cbc:IdentificationCode", &addr.country_code)?;
    w.end_element("cac:Country")?;
    w.end_element("cac:PostalAddress")?;
    Ok(())
}

fn write_tax_scheme(w: &mut XmlWriter, vat_number: &str) -> Result<(), ZatcaError> {
    w.start_element("cac:PartyTaxScheme")?;
    w.text_element("cbc:CompanyID", vat_number)?;
    w.start_element("cac:TaxScheme")?;
    w.text_element("cbc:ID", "VAT")?;
    w.end_element("cac:TaxScheme")?;
    w.end_element("cac:PartyTaxScheme")?;
    Ok(())
}

fn write_legal_entity(w: &mut XmlWriter, name: &str) -> Result<(), ZatcaError> {
    w.start_element("cac:PartyLegalEntity")?;
    w.text_element("cbc:RegistrationName", name)?;
    w.end_element("cac:PartyLegalEntity")?;
    Ok(())
}

fn write_tax_category(w: &mut XmlWriter, tag: &str, rate: Decimal) -> Result<(), ZatcaError> {
    w.start_element(tag)?;
    w.text_element_with_attrs(
        "cbc:ID",
        "S",
        &[("schemeID", "UN/ECE 5305"), ("schemeAgencyID", "6")],
    )?;
    w.text_element("cbc:Percent", &format_decimal(rate))?;
    w.start_element("cac:TaxScheme")?;
    w.text_element_with_attrs(
        "cbc:ID",
        "VAT",
        &[("schemeID", "UN/ECE 5153"), ("schemeAgencyID", "6")],
    )?;
    w.end_element("cac:TaxScheme")?;
    w.end_element(tag)?;
    Ok(())
}

fn write_tax_totals(w: &mut XmlWriter, invoice: &ZatcaInvoice) -> Result<(), ZatcaError> {
    // BT-111: VAT total in tax currency
    w.start_element("cac:TaxTotal")?;
    w.amount_element("cbc:TaxAmount", invoice.vat_amount, CURRENCY_SAR)?;
    w.end_element("cac:TaxTotal")?;

    // BG-23: One breakdown at the rate of the first line
    let rate = match invoice.items.first() {
        Some(line) => line.vat_rate,
        None => {
            log::warn!("invoice {} has no lines; VAT breakdown uses 0%", invoice.invoice_number);
            Decimal::ZERO
        }
    };
    w.start_element("cac:TaxTotal")?;
    w.amount_element("cbc:TaxAmount", invoice.vat_amount, CURRENCY_SAR)?;
    w.start_element("cac:TaxSubtotal")?;
    w.amount_element("cbc:TaxableAmount", invoice.subtotal, CURRENCY_SAR)?;
    w.amount_element("cbc:TaxAmount", invoice.vat_amount, CURRENCY_SAR)?;
    write_tax_category(w, "cac:TaxCategory", rate)?;
    w.end_element("cac:TaxSubtotal")?;
    w.end_element("cac:TaxTotal")?;
    Ok(())
}

fn write_line(w: &mut XmlWriter, id: usize, line: &LineItem) -> Result<(), ZatcaError> {
    w.start_element("cac:InvoiceLine")?;
    // BT-126
    w.text_element("cbc:ID", &id.to_string())?;
    // BT-129
    w.quantity_element("cbc:InvoicedQuantity", line.quantity, "PCE")?;
    // BT-131
    w.amount_element("cbc:LineExtensionAmount", line.subtotal, CURRENCY_SAR)?;

    // KSA-11 / KSA-12: Line VAT and amount including VAT
    w.start_element("cac:TaxTotal")?;
    w.amount_element("cbc:TaxAmount", line.vat_amount, CURRENCY_SAR)?;
    w.amount_element("cbc:RoundingAmount", line.total, CURRENCY_SAR)?;
    w.end_element("cac:TaxTotal")?;

    w.start_element("cac:Item")?;
    if let Some(desc) = &line.description {
        w.text_element("cbc:Description", desc)?;
    }
    // BT-153
    w.text_element("cbc:Name", &line.name)?;
    // BT-151 / BT-152
    write_tax_category(w, "cac:ClassifiedTaxCategory", line.vat_rate)?;
    w.end_element("cac:Item")?;

    // BT-146
    w.start_element("cac:Price")?;
    w.text_element_with_attrs(
        "cbc:PriceAmount",
        &format_decimal(line.unit_price),
        &[("currencyID", CURRENCY_SAR)],
    )?;
    w.end_element("cac:Price")?;

    w.end_element("cac:InvoiceLine")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qr::{QrTag, decode_zatca_qr};
    use rust_decimal_macros::dec;

    const FIXED_UUID: &str = "8e6000cf-1a98-4174-b3e7-b5d5954bc10d";

    fn options() -> XmlOptions {
        XmlOptions {
            uuid: Some(FIXED_UUID.parse().unwrap()),
        }
    }

    fn invoice(kind: InvoiceKind) -> ZatcaInvoice {
        ZatcaInvoiceBuilder::new("INV-2024-001", "2024-06-15T10:30:00Z", kind)
            .seller(
                "Test Company LLC",
                "310123456789003",
                AddressBuilder::new("King Fahd Road", "1234", "Riyadh", "12345", "SA")
                    .district("Al Olaya")
                    .build(),
            )
            .seller_registration_number("1010010000")
            .buyer("Buyer Trading Co")
            .buyer_vat_number("300000000000003")
            .add_line(LineItemBuilder::new("Consulting", dec!(10), dec!(100)).build())
            .build()
            .unwrap()
    }

    fn generate(inv: &ZatcaInvoice) -> String {
        generate_zatca_xml_with(inv, &PlaceholderSignatureProvider, &options()).unwrap()
    }

    #[test]
    fn header_fields() {
        let xml = generate(&invoice(InvoiceKind::Standard));
        assert!(xml.contains("<cbc:UBLVersionID>2.1</cbc:UBLVersionID>"));
        assert!(xml.contains("<cbc:ProfileID>reporting:1.0</cbc:ProfileID>"));
        assert!(xml.contains(&format!("<cbc:UUID>{FIXED_UUID}</cbc:UUID>")));
        assert!(xml.contains("<cbc:IssueDate>2024-06-15</cbc:IssueDate>"));
        assert!(xml.contains("<cbc:IssueTime>10:30:00</cbc:IssueTime>"));
        assert!(xml.contains("name=\"0100000\""));
        assert!(xml.contains(">388</cbc:InvoiceTypeCode>"));
        assert!(xml.contains("<cbc:DocumentCurrencyCode>SAR</cbc:DocumentCurrencyCode>"));
    }

    #[test]
    fn simplified_transaction_code() {
        let xml = generate(&invoice(InvoiceKind::Simplified));
        assert!(xml.contains("name=\"0200000\""));
    }

    #[test]
    fn element_order() {
        let xml = generate(&invoice(InvoiceKind::Standard));
        let order = [
            "<ext:UBLExtensions>",
            "<cbc:UBLVersionID>",
            "<cbc:ProfileID>",
            "<cbc:IssueDate>",
            "<cbc:InvoiceTypeCode",
            "<cbc:DocumentCurrencyCode>",
            "<cbc:ID>ICV</cbc:ID>",
            "<cbc:ID>PIH</cbc:ID>",
            "<cbc:ID>QR</cbc:ID>",
            "<cac:Signature>",
            "<cac:AccountingSupplierParty>",
            "<cac:AccountingCustomerParty>",
            "<cac:Delivery>",
            "<cac:TaxTotal>",
            "<cac:LegalMonetaryTotal>",
            "<cac:InvoiceLine>",
        ];
        let positions: Vec<usize> = order
            .iter()
            .map(|tag| xml.find(tag).unwrap_or_else(|| panic!("missing {tag}")))
            .collect();
        assert!(positions.windows(2).all(|p| p[0] < p[1]), "{positions:?}");
    }

    #[test]
    fn totals_and_lines() {
        let xml = generate(&invoice(InvoiceKind::Standard));
        assert!(xml.contains("<cbc:TaxAmount currencyID=\"SAR\">150.00</cbc:TaxAmount>"));
        assert!(xml.contains("<cbc:PayableAmount currencyID=\"SAR\">1150.00</cbc:PayableAmount>"));
        assert!(xml.contains("<cbc:RoundingAmount currencyID=\"SAR\">1150.00</cbc:RoundingAmount>"));
        assert!(xml.contains("<cbc:InvoicedQuantity unitCode=\"PCE\">10.00</cbc:InvoicedQuantity>"));
        assert!(xml.contains("<cbc:Percent>15.00</cbc:Percent>"));
        assert_eq!(xml.matches("<cac:InvoiceLine>").count(), 1);
    }

    #[test]
    fn seller_identification() {
        let xml = generate(&invoice(InvoiceKind::Standard));
        assert!(xml.contains("<cbc:ID schemeID=\"CRN\">1010010000</cbc:ID>"));
        assert!(xml.contains("<cbc:CitySubdivisionName>Al Olaya</cbc:CitySubdivisionName>"));
        assert!(xml.contains("<cbc:CompanyID>310123456789003</cbc:CompanyID>"));

        let mut inv = invoice(InvoiceKind::Standard);
        inv.seller_registration_number = None;
        let xml = generate(&inv);
        assert!(xml.contains("<cbc:ID schemeID=\"CRN\">310123456789003</cbc:ID>"));
    }

    #[test]
    fn buyer_blocks_are_conditional() {
        let mut inv = invoice(InvoiceKind::Simplified);
        inv.buyer_vat_number = None;
        inv.buyer_name = String::new();
        let xml = generate(&inv);
        assert_eq!(xml.matches("<cbc:CompanyID>").count(), 1);
        assert_eq!(xml.matches("<cbc:RegistrationName>").count(), 1);
    }

    #[test]
    fn supply_date_defaults_to_issue_date() {
        let xml = generate(&invoice(InvoiceKind::Standard));
        assert!(xml.contains("<cbc:ActualDeliveryDate>2024-06-15</cbc:ActualDeliveryDate>"));

        let mut inv = invoice(InvoiceKind::Standard);
        inv.supply_date = Some("2024-06-01".into());
        let xml = generate(&inv);
        assert!(xml.contains("<cbc:ActualDeliveryDate>2024-06-01</cbc:ActualDeliveryDate>"));
    }

    #[test]
    fn embedded_qr_is_phase2_with_document_hash() {
        let inv = invoice(InvoiceKind::Simplified);
        let doc = build_zatca_document(&inv, &PlaceholderSignatureProvider, &options()).unwrap();

        let header = Header::new(&inv, &options()).unwrap();
        let unsigned = render(&inv, &header, None).unwrap();
        assert_eq!(doc.invoice_hash, compute_invoice_hash(&unsigned));
        assert!(doc.xml.contains(&format!("text/plain\">{}</cbc:EmbeddedDocumentBinaryObject>", doc.qr)));

        let decoded = decode_zatca_qr(&doc.qr).unwrap();
        assert!(decoded.is_phase2());
        assert_eq!(decoded.seller_name(), Some("Test Company LLC"));
        assert_eq!(decoded.text(QrTag::InvoiceHash), Some(doc.invoice_hash.as_str()));
        assert!(decoded.get(QrTag::CertificateSignature).is_some());
    }

    #[test]
    fn standard_qr_omits_certificate_signature() {
        let inv = invoice(InvoiceKind::Standard);
        let doc = build_zatca_document(&inv, &PlaceholderSignatureProvider, &options()).unwrap();
        let decoded = decode_zatca_qr(&doc.qr).unwrap();
        assert!(decoded.get(QrTag::PublicKey).is_some());
        assert!(decoded.get(QrTag::CertificateSignature).is_none());
    }

    #[test]
    fn unsigned_rendering_excludes_signature_parts() {
        let inv = invoice(InvoiceKind::Standard);
        let header = Header::new(&inv, &options()).unwrap();
        let unsigned = render(&inv, &header, None).unwrap();
        assert!(!unsigned.contains("UBLExtensions"));
        assert!(!unsigned.contains("<cac:Signature>"));
        assert!(!unsigned.contains("<cbc:ID>QR</cbc:ID>"));
        assert!(unsigned.contains("<cbc:ID>PIH</cbc:ID>"));
    }

    #[test]
    fn deterministic_with_fixed_uuid() {
        let inv = invoice(InvoiceKind::Standard);
        assert_eq!(generate(&inv), generate(&inv));
    }

    #[test]
    fn random_uuid_by_default() {
        let inv = invoice(InvoiceKind::Standard);
        let a = generate_zatca_xml(&inv).unwrap();
        let b = generate_zatca_xml(&inv).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn bad_issue_date_is_rejected() {
        let mut inv = invoice(InvoiceKind::Standard);
        inv.issue_date = "15/06/2024".into();
        assert!(matches!(
            generate_zatca_xml(&inv),
            Err(ZatcaError::DateFormat { .. })
        ));
    }

    #[test]
    fn text_is_escaped() {
        let mut inv = invoice(InvoiceKind::Standard);
        inv.seller_name = "Smith & Sons <Trading>".into();
        let xml = generate(&inv);
        assert!(xml.contains("Smith &amp; Sons &lt;Trading&gt;"));
    }

    struct FailingSigner;

    impl SignatureProvider for FailingSigner {
        fn sign(&self, _: &[u8]) -> Result<SignatureMaterial, ZatcaError> {
            Err(ZatcaError::Signature("HSM unavailable".into()))
        }
    }

    #[test]
    fn signer_errors_propagate() {
        let err = generate_zatca_xml_with(&invoice(InvoiceKind::Standard), &FailingSigner, &options())
            .unwrap_err();
        assert!(err.to_string().contains("HSM unavailable"));
    }
}
