use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::report::{MessageType, ValidationMessage, to_compliance_result};
use super::tree::{XmlElement, parse_xml};
use crate::core::format::round_amount;
use crate::core::{
    CURRENCY_SAR, ComplianceResult, InvoiceKind, PLACEHOLDER_CERTIFICATE, PLACEHOLDER_PIH,
    PLACEHOLDER_SIGNATURE, is_allowed_vat_rate, is_digits, rule, validate_vat_number,
};
use crate::qr::{QrTag, decode_zatca_qr};

/// Accepted UN/CEFACT 1001 codes: invoice, credit note, debit note.
const TYPE_CODES: &[&str] = &["388", "381", "383"];

#[derive(Default)]
struct Findings {
    messages: Vec<ValidationMessage>,
}

impl Findings {
    fn push(&mut self, kind: MessageType, code: &str, message: String, path: &str) {
        self.messages
            .push(ValidationMessage::new(kind, code, message, Some(path.to_string())));
    }

    fn error(&mut self, code: &str, message: impl Into<String>, path: &str) {
        self.push(MessageType::Error, code, message.into(), path);
    }

    fn warning(&mut self, code: &str, message: impl Into<String>, path: &str) {
        self.push(MessageType::Warning, code, message.into(), path);
    }

    fn info(&mut self, code: &str, message: impl Into<String>, path: &str) {
        self.push(MessageType::Info, code, message.into(), path);
    }

    /// Arithmetic on document amounts left the `Decimal` range.
    fn out_of_range(&mut self, expression: String, path: &str) {
        self.error(
            rule::AMOUNT,
            format!("{expression} is out of the representable amount range"),
            path,
        );
    }

    /// Parse a decimal at `path` below `el`; unparseable text is an error.
    fn amount(&mut self, el: &XmlElement, path: &str, base: &str) -> Option<Decimal> {
        let text = el.non_empty_text(path)?;
        match text.parse::<Decimal>() {
            Ok(d) => Some(d),
            Err(_) => {
                self.error(
                    rule::AMOUNT,
                    format!("'{text}' is not a valid amount"),
                    &format!("{base}/{path}"),
                );
                None
            }
        }
    }
}

/// Parse and check `xml`. A document that cannot be parsed yields the
/// single parse-error message as `Err`.
pub(crate) fn check_document(xml: &str) -> Result<Vec<ValidationMessage>, ValidationMessage> {
    let root = parse_xml(xml).map_err(|e| {
        ValidationMessage::new(
            MessageType::Error,
            rule::XML_PARSE,
            format!("Document is not well-formed XML: {e}"),
            None,
        )
    })?;
    Ok(check_invoice(&root))
}

/// Check a parsed document against the ZATCA business rules.
pub(crate) fn check_invoice(root: &XmlElement) -> Vec<ValidationMessage> {
    let mut f = Findings::default();
    if root.local_name() != "Invoice" {
        f.error(
            rule::MISSING_ELEMENT,
            format!("Root element must be Invoice, found {}", root.name),
            "/",
        );
        return f.messages;
    }

    check_header(root, &mut f);
    let kind = check_type_code(root, &mut f);
    let icv = check_counter(root, &mut f);
    check_previous_hash(root, icv, &mut f);
    check_signature(root, &mut f);
    let seller_vat = check_seller(root, &mut f);
    check_qr(root, seller_vat.as_deref(), &mut f);
    check_buyer(root, kind, &mut f);
    check_supply_date(root, kind, &mut f);
    let tax_amount = check_tax_totals(root, &mut f);
    let line_sum = check_lines(root, &mut f);
    check_totals(root, tax_amount, line_sum, &mut f);

    f.messages
}

fn check_header(root: &XmlElement, f: &mut Findings) {
    match root.non_empty_text("cbc:UBLVersionID") {
        Some("2.1") => {}
        Some(other) => f.error(
            rule::UBL_VERSION,
            format!("UBL version must be 2.1, found {other}"),
            "/Invoice/cbc:UBLVersionID",
        ),
        None => f.error(
            rule::UBL_VERSION,
            "Missing UBL version (cbc:UBLVersionID)",
            "/Invoice/cbc:UBLVersionID",
        ),
    }

    match root.non_empty_text("cbc:ProfileID") {
        Some("reporting:1.0") => {}
        Some(other) => f.error(
            rule::PROFILE_ID,
            format!("ProfileID must be reporting:1.0, found {other}"),
            "/Invoice/cbc:ProfileID",
        ),
        None => f.error(
            rule::PROFILE_ID,
            "Missing business process profile (cbc:ProfileID)",
            "/Invoice/cbc:ProfileID",
        ),
    }

    if root.non_empty_text("cbc:ID").is_none() {
        f.error(rule::INVOICE_ID, "Missing invoice number (cbc:ID)", "/Invoice/cbc:ID");
    }
    match root.non_empty_text("cbc:UUID") {
        Some(id) if uuid::Uuid::parse_str(id).is_err() => f.error(
            rule::INVOICE_ID,
            format!("Invoice UUID '{id}' is not a valid UUID"),
            "/Invoice/cbc:UUID",
        ),
        Some(_) => {}
        None => f.error(rule::INVOICE_ID, "Missing invoice UUID (cbc:UUID)", "/Invoice/cbc:UUID"),
    }

    match root.non_empty_text("cbc:IssueDate") {
        Some(d) if NaiveDate::parse_from_str(d, "%Y-%m-%d").is_err() => f.error(
            rule::ISSUE_DATE,
            format!("IssueDate '{d}' is not a YYYY-MM-DD date"),
            "/Invoice/cbc:IssueDate",
        ),
        Some(_) => {}
        None => f.error(rule::ISSUE_DATE, "Missing cbc:IssueDate", "/Invoice/cbc:IssueDate"),
    }
    match root.non_empty_text("cbc:IssueTime") {
        Some(t) if NaiveTime::parse_from_str(t, "%H:%M:%S").is_err() => f.error(
            rule::ISSUE_DATE,
            format!("IssueTime '{t}' is not an HH:MM:SS time"),
            "/Invoice/cbc:IssueTime",
        ),
        Some(_) => {}
        None => f.error(rule::ISSUE_DATE, "Missing cbc:IssueTime", "/Invoice/cbc:IssueTime"),
    }

    match root.non_empty_text("cbc:DocumentCurrencyCode") {
        Some(CURRENCY_SAR) => {}
        Some(other) => f.warning(
            rule::CURRENCY,
            format!("Document currency is {other}; VAT totals must also be reported in SAR"),
            "/Invoice/cbc:DocumentCurrencyCode",
        ),
        None => f.error(
            rule::CURRENCY,
            "Missing cbc:DocumentCurrencyCode",
            "/Invoice/cbc:DocumentCurrencyCode",
        ),
    }
    if let Some(tax_currency) = root.non_empty_text("cbc:TaxCurrencyCode") {
        if tax_currency != CURRENCY_SAR {
            f.error(
                rule::CURRENCY,
                format!("TaxCurrencyCode must be SAR, found {tax_currency}"),
                "/Invoice/cbc:TaxCurrencyCode",
            );
        }
    }
}

fn check_type_code(root: &XmlElement, f: &mut Findings) -> Option<InvoiceKind> {
    const PATH: &str = "/Invoice/cbc:InvoiceTypeCode";
    let Some(el) = root.child("cbc:InvoiceTypeCode") else {
        f.error(rule::INVOICE_TYPE, "Missing cbc:InvoiceTypeCode", PATH);
        return None;
    };
    let code = el.text.trim();
    if !TYPE_CODES.contains(&code) {
        f.error(
            rule::INVOICE_TYPE,
            format!("Invoice type code '{code}' is not one of 388, 381, 383"),
            PATH,
        );
    }
    let Some(name) = el.attr("name") else {
        f.error(
            rule::INVOICE_TYPE,
            "Missing KSA-2 transaction code (name attribute of cbc:InvoiceTypeCode)",
            PATH,
        );
        return None;
    };
    let kind = InvoiceKind::from_transaction_code(name).filter(|_| is_digits(name, 7));
    if kind.is_none() {
        f.error(
            rule::INVOICE_TYPE,
            format!("Transaction code '{name}' must be 7 digits starting with 01 or 02"),
            PATH,
        );
    }
    kind
}

fn document_reference<'a>(root: &'a XmlElement, id: &str) -> Option<&'a XmlElement> {
    root.children_named("cac:AdditionalDocumentReference")
        .find(|r| r.text_at("cbc:ID") == Some(id))
}

fn attachment(reference: &XmlElement) -> Option<&str> {
    reference.non_empty_text("cac:Attachment/cbc:EmbeddedDocumentBinaryObject")
}

fn check_counter(root: &XmlElement, f: &mut Findings) -> Option<u64> {
    const PATH: &str = "/Invoice/cac:AdditionalDocumentReference[ICV]";
    let Some(reference) = document_reference(root, "ICV") else {
        f.error(rule::ICV, "Missing invoice counter value (ICV) reference", PATH);
        return None;
    };
    let value = reference.non_empty_text("cbc:UUID").unwrap_or_default();
    match value.parse::<u64>() {
        Ok(icv) if icv > 0 && value.bytes().all(|b| b.is_ascii_digit()) => Some(icv),
        _ => {
            f.error(
                rule::ICV,
                format!("Invoice counter value '{value}' must be a positive integer"),
                PATH,
            );
            None
        }
    }
}

fn check_previous_hash(root: &XmlElement, icv: Option<u64>, f: &mut Findings) {
    const PATH: &str = "/Invoice/cac:AdditionalDocumentReference[PIH]";
    let Some(reference) = document_reference(root, "PIH") else {
        f.error(rule::PIH, "Missing previous invoice hash (PIH) reference", PATH);
        return;
    };
    let Some(hash) = attachment(reference) else {
        f.error(rule::PIH, "Previous invoice hash attachment is empty", PATH);
        return;
    };
    if crate::qr::tlv::from_base64(hash).is_err() {
        f.error(rule::PIH, "Previous invoice hash is not valid base64", PATH);
        return;
    }
    if hash == PLACEHOLDER_PIH {
        if icv == Some(1) {
            f.info(
                rule::PIH_PLACEHOLDER,
                "First invoice of the chain uses the initial PIH",
                PATH,
            );
        } else {
            f.warning(
                rule::PIH_PLACEHOLDER,
                "Previous invoice hash is the placeholder value; the invoice hash chain is broken",
                PATH,
            );
        }
    }
}

fn check_signature(root: &XmlElement, f: &mut Findings) {
    if root.child("ext:UBLExtensions").is_none() {
        f.warning(
            rule::SIGNATURE_PLACEHOLDER,
            "Document is not signed (no ext:UBLExtensions)",
            "/Invoice/ext:UBLExtensions",
        );
        return;
    }
    if root.child("cac:Signature").is_none() {
        f.warning(
            rule::SIGNATURE_PLACEHOLDER,
            "Missing cac:Signature reference",
            "/Invoice/cac:Signature",
        );
    }
    let placeholder = root
        .descendants("ds:SignatureValue")
        .iter()
        .chain(root.descendants("ds:X509Certificate").iter())
        .any(|el| {
            let text = el.text.trim();
            text.is_empty() || text == PLACEHOLDER_SIGNATURE || text == PLACEHOLDER_CERTIFICATE
        });
    if placeholder {
        f.warning(
            rule::SIGNATURE_PLACEHOLDER,
            "Signature uses placeholder values; the invoice is not cryptographically signed",
            "/Invoice/ext:UBLExtensions",
        );
    }
}

fn check_qr(root: &XmlElement, seller_vat: Option<&str>, f: &mut Findings) {
    const PATH: &str = "/Invoice/cac:AdditionalDocumentReference[QR]";
    let Some(reference) = document_reference(root, "QR") else {
        f.error(rule::QR_CODE, "Missing QR code reference", PATH);
        return;
    };
    let Some(qr) = attachment(reference) else {
        f.error(rule::QR_CODE, "QR code attachment is empty", PATH);
        return;
    };
    let decoded = match decode_zatca_qr(qr) {
        Ok(decoded) => decoded,
        Err(e) => {
            f.error(rule::QR_CODE, format!("QR code cannot be decoded: {e}"), PATH);
            return;
        }
    };
    let missing: Vec<String> = [
        QrTag::SellerName,
        QrTag::VatNumber,
        QrTag::Timestamp,
        QrTag::InvoiceTotal,
        QrTag::VatTotal,
    ]
    .iter()
    .filter(|t| decoded.get(**t).is_none())
    .map(|t| t.code().to_string())
    .collect();
    if !missing.is_empty() {
        f.error(
            rule::QR_CODE,
            format!("QR code is missing tag(s) {}", missing.join(", ")),
            PATH,
        );
    }
    if let (Some(in_qr), Some(seller)) = (decoded.vat_number(), seller_vat) {
        if in_qr != seller {
            f.error(
                rule::QR_CODE,
                format!("QR VAT number {in_qr} does not match seller VAT number {seller}"),
                PATH,
            );
        }
    }
    if !decoded.is_phase2() {
        f.warning(
            rule::QR_CODE,
            "QR code lacks the Phase-2 hash, signature and public key (tags 6-8)",
            PATH,
        );
    }
}

fn check_vat_number(vat: &str, who: &str, path: &str, f: &mut Findings) {
    if let Err(e) = validate_vat_number(vat) {
        f.error(rule::VAT_NUMBER_FORMAT, format!("{who} VAT number '{vat}' {}", e.reason), path);
    }
}

fn check_address(addr: &XmlElement, who: &str, base: &str, strict: bool, f: &mut Findings) {
    let path = |field: &str| format!("{base}/cac:PostalAddress/{field}");

    if addr.non_empty_text("cbc:StreetName").is_none() {
        f.warning(
            rule::ADDRESS_STREET,
            format!("{who} address has no street name"),
            &path("cbc:StreetName"),
        );
    }
    let building = addr.non_empty_text("cbc:BuildingNumber");
    if building.is_none() {
        f.warning(
            rule::ADDRESS_BUILDING_NUMBER,
            format!("{who} address has no building number"),
            &path("cbc:BuildingNumber"),
        );
    }
    if addr.non_empty_text("cbc:CityName").is_none() {
        f.warning(
            rule::ADDRESS_CITY,
            format!("{who} address has no city"),
            &path("cbc:CityName"),
        );
    }

    let country = addr.non_empty_text("cac:Country/cbc:IdentificationCode");
    if country.is_none() {
        let message = format!("{who} address has no country code");
        let at = path("cac:Country/cbc:IdentificationCode");
        if strict {
            f.error(rule::ADDRESS_COUNTRY, message, &at);
        } else {
            f.warning(rule::ADDRESS_COUNTRY, message, &at);
        }
    }
    if country != Some("SA") {
        return;
    }

    if addr.non_empty_text("cbc:CitySubdivisionName").is_none() {
        f.warning(
            rule::ADDRESS_DISTRICT,
            format!("{who} address is missing the district (cbc:CitySubdivisionName)"),
            &path("cbc:CitySubdivisionName"),
        );
    }
    if let Some(b) = building {
        if !is_digits(b, 4) {
            f.warning(
                rule::ADDRESS_BUILDING_NUMBER,
                format!("{who} building number '{b}' should have 4 digits"),
                &path("cbc:BuildingNumber"),
            );
        }
    }
    if let Some(p) = addr.non_empty_text("cbc:PostalZone") {
        if !is_digits(p, 5) {
            f.warning(
                rule::ADDRESS_POSTAL_CODE,
                format!("{who} postal code '{p}' should have 5 digits"),
                &path("cbc:PostalZone"),
            );
        }
    } else {
        f.warning(
            rule::ADDRESS_POSTAL_CODE,
            format!("{who} address has no postal code"),
            &path("cbc:PostalZone"),
        );
    }
}

fn check_seller(root: &XmlElement, f: &mut Findings) -> Option<String> {
    const BASE: &str = "/Invoice/cac:AccountingSupplierParty/cac:Party";
    let Some(party) = root.find("cac:AccountingSupplierParty/cac:Party") else {
        f.error(rule::MISSING_ELEMENT, "Missing seller party", BASE);
        return None;
    };

    if party
        .non_empty_text("cac:PartyLegalEntity/cbc:RegistrationName")
        .is_none()
    {
        f.error(
            rule::SELLER_NAME,
            "Missing seller name",
            &format!("{BASE}/cac:PartyLegalEntity/cbc:RegistrationName"),
        );
    }

    match party.child("cac:PostalAddress") {
        Some(addr) => check_address(addr, "Seller", BASE, true, f),
        None => f.error(
            rule::MISSING_ELEMENT,
            "Missing seller postal address",
            &format!("{BASE}/cac:PostalAddress"),
        ),
    }

    let vat_path = format!("{BASE}/cac:PartyTaxScheme/cbc:CompanyID");
    match party.non_empty_text("cac:PartyTaxScheme/cbc:CompanyID") {
        Some(vat) => {
            check_vat_number(vat, "Seller", &vat_path, f);
            Some(vat.to_string())
        }
        None => {
            f.error(rule::VAT_NUMBER_FORMAT, "Missing seller VAT number", &vat_path);
            None
        }
    }
}

fn check_buyer(root: &XmlElement, kind: Option<InvoiceKind>, f: &mut Findings) {
    const BASE: &str = "/Invoice/cac:AccountingCustomerParty/cac:Party";
    let standard = kind == Some(InvoiceKind::Standard);
    let Some(party) = root.find("cac:AccountingCustomerParty/cac:Party") else {
        if standard {
            f.error(rule::BUYER_NAME, "Standard invoices require a buyer party", BASE);
        }
        return;
    };

    if standard
        && party
            .non_empty_text("cac:PartyLegalEntity/cbc:RegistrationName")
            .is_none()
    {
        f.error(
            rule::BUYER_NAME,
            "Standard invoices require the buyer name",
            &format!("{BASE}/cac:PartyLegalEntity/cbc:RegistrationName"),
        );
    }
    if let Some(vat) = party.non_empty_text("cac:PartyTaxScheme/cbc:CompanyID") {
        check_vat_number(vat, "Buyer", &format!("{BASE}/cac:PartyTaxScheme/cbc:CompanyID"), f);
    }
    if let Some(addr) = party.child("cac:PostalAddress") {
        check_address(addr, "Buyer", BASE, false, f);
    }
}

fn check_supply_date(root: &XmlElement, kind: Option<InvoiceKind>, f: &mut Findings) {
    const PATH: &str = "/Invoice/cac:Delivery/cbc:ActualDeliveryDate";
    let delivery = root.non_empty_text("cac:Delivery/cbc:ActualDeliveryDate");
    if let Some(date) = delivery {
        if NaiveDate::parse_from_str(date, "%Y-%m-%d").is_err() {
            f.error(
                rule::SUPPLY_DATE,
                format!("Supply date '{date}' is not a YYYY-MM-DD date"),
                PATH,
            );
        }
    }
    if kind == Some(InvoiceKind::Standard)
        && delivery.is_none()
        && root.child("cac:InvoicePeriod").is_none()
    {
        f.error(
            rule::SUPPLY_DATE,
            "Standard invoices require a supply date (ActualDeliveryDate or InvoicePeriod)",
            PATH,
        );
    }
}

fn check_category(category: &XmlElement, path: &str, f: &mut Findings) -> Option<Decimal> {
    let id = category.non_empty_text("cbc:ID");
    let percent = f.amount(category, "cbc:Percent", path);
    match (id, percent) {
        (Some("S"), Some(rate)) if !is_allowed_vat_rate(rate) => {
            f.error(
                rule::VAT_RATE,
                format!(
                    "VAT rate {}% is not allowed; standard-rated lines must use 5% or 15%",
                    rate.normalize()
                ),
                &format!("{path}/cbc:Percent"),
            );
        }
        (Some("S"), None) => {
            f.error(
                rule::VAT_RATE,
                "Standard-rated category has no percent",
                &format!("{path}/cbc:Percent"),
            );
        }
        (Some("Z" | "E" | "O"), Some(rate)) if !rate.is_zero() => {
            f.error(
                rule::VAT_RATE,
                format!("Category {} must carry 0%, found {}%", id.unwrap_or_default(), rate.normalize()),
                &format!("{path}/cbc:Percent"),
            );
        }
        (Some("S" | "Z" | "E" | "O"), _) => {}
        (Some(other), _) => {
            f.error(
                rule::VAT_RATE,
                format!("Unknown VAT category '{other}'"),
                &format!("{path}/cbc:ID"),
            );
        }
        (None, _) => {
            f.error(rule::VAT_RATE, "VAT category has no ID", &format!("{path}/cbc:ID"));
        }
    }
    percent
}

/// Returns the document VAT total (first `cac:TaxTotal/cbc:TaxAmount`).
fn check_tax_totals(root: &XmlElement, f: &mut Findings) -> Option<Decimal> {
    let totals: Vec<&XmlElement> = root.children_named("cac:TaxTotal").collect();
    if totals.is_empty() {
        f.error(rule::MISSING_ELEMENT, "Missing cac:TaxTotal", "/Invoice/cac:TaxTotal");
        return None;
    }

    let mut with_breakdown = 0;
    for (i, total) in totals.iter().enumerate() {
        let base = format!("/Invoice/cac:TaxTotal[{}]", i + 1);
        for (j, subtotal) in total.children_named("cac:TaxSubtotal").enumerate() {
            with_breakdown += 1;
            let sub_base = format!("{base}/cac:TaxSubtotal[{}]", j + 1);
            match subtotal.child("cac:TaxCategory") {
                Some(category) => {
                    check_category(category, &format!("{sub_base}/cac:TaxCategory"), f);
                }
                None => f.error(
                    rule::VAT_RATE,
                    "Tax subtotal has no cac:TaxCategory",
                    &format!("{sub_base}/cac:TaxCategory"),
                ),
            }
        }
    }
    if with_breakdown == 0 {
        f.error(
            rule::MISSING_ELEMENT,
            "Missing VAT breakdown (cac:TaxSubtotal)",
            "/Invoice/cac:TaxTotal/cac:TaxSubtotal",
        );
    }

    let first = totals[0];
    let amount = f.amount(first, "cbc:TaxAmount", "/Invoice/cac:TaxTotal[1]");
    if amount.is_none() && first.non_empty_text("cbc:TaxAmount").is_none() {
        f.error(
            rule::TOTALS,
            "Missing document VAT total",
            "/Invoice/cac:TaxTotal[1]/cbc:TaxAmount",
        );
    }
    amount
}

/// Returns the sum of line net amounts when every line has one.
fn check_lines(root: &XmlElement, f: &mut Findings) -> Option<Decimal> {
    let lines: Vec<&XmlElement> = root.children_named("cac:InvoiceLine").collect();
    if lines.is_empty() {
        f.error(rule::LINE_ITEMS, "Invoice has no lines", "/Invoice/cac:InvoiceLine");
        return None;
    }

    let mut sum = Some(Decimal::ZERO);
    for (i, line) in lines.iter().enumerate() {
        let n = i + 1;
        let base = format!("/Invoice/cac:InvoiceLine[{n}]");

        if line.non_empty_text("cac:Item/cbc:Name").is_none() {
            f.error(
                rule::LINE_ITEMS,
                format!("Line {n} has no item name"),
                &format!("{base}/cac:Item/cbc:Name"),
            );
        }

        let qty = f.amount(line, "cbc:InvoicedQuantity", &base);
        let price = f.amount(line, "cac:Price/cbc:PriceAmount", &base);
        let net = f.amount(line, "cbc:LineExtensionAmount", &base);
        if net.is_none() {
            f.error(
                rule::LINE_ITEMS,
                format!("Line {n} has no LineExtensionAmount"),
                &format!("{base}/cbc:LineExtensionAmount"),
            );
        }
        sum = sum.zip(net).and_then(|(total, amount)| total.checked_add(amount));

        let (tax, rounding) = match line.child("cac:TaxTotal") {
            Some(tt) => {
                let tax = f.amount(tt, "cbc:TaxAmount", &format!("{base}/cac:TaxTotal"));
                if tt.non_empty_text("cbc:TaxAmount").is_none() {
                    f.error(
                        rule::LINE_TAX_TOTAL,
                        format!("Line {n} TaxTotal has no TaxAmount"),
                        &format!("{base}/cac:TaxTotal/cbc:TaxAmount"),
                    );
                }
                let rounding = f.amount(tt, "cbc:RoundingAmount", &format!("{base}/cac:TaxTotal"));
                (tax, rounding)
            }
            None => {
                f.error(
                    rule::LINE_TAX_TOTAL,
                    format!("Line {n} is missing cac:TaxTotal"),
                    &format!("{base}/cac:TaxTotal"),
                );
                (None, None)
            }
        };

        let rate = match line.find("cac:Item/cac:ClassifiedTaxCategory") {
            Some(category) => check_category(
                category,
                &format!("{base}/cac:Item/cac:ClassifiedTaxCategory"),
                f,
            ),
            None => {
                f.error(
                    rule::VAT_RATE,
                    format!("Line {n} is missing cac:ClassifiedTaxCategory"),
                    &format!("{base}/cac:Item/cac:ClassifiedTaxCategory"),
                );
                None
            }
        };

        if let (Some(qty), Some(price), Some(net)) = (qty, price, net) {
            let path = format!("{base}/cbc:LineExtensionAmount");
            match qty.checked_mul(price).map(round_amount) {
                Some(expected) if expected != round_amount(net) => f.warning(
                    rule::LINE_ARITHMETIC,
                    format!("Line {n}: quantity {qty} x price {price} = {expected}, but LineExtensionAmount is {net}"),
                    &path,
                ),
                Some(_) => {}
                None => f.out_of_range(format!("Line {n}: quantity {qty} x price {price}"), &path),
            }
        }
        if let (Some(net), Some(rate), Some(tax)) = (net, rate, tax) {
            let path = format!("{base}/cac:TaxTotal/cbc:TaxAmount");
            let diff = net
                .checked_mul(rate)
                .map(|v| round_amount(v / dec!(100)))
                .and_then(|expected| expected.checked_sub(tax));
            match diff {
                Some(diff) if diff.abs() > dec!(0.01) => f.warning(
                    rule::LINE_ARITHMETIC,
                    format!("Line {n}: VAT {tax} does not match {rate}% of {net}"),
                    &path,
                ),
                Some(_) => {}
                None => f.out_of_range(format!("Line {n}: {rate}% of {net}"), &path),
            }
        }
        if let (Some(net), Some(tax), Some(rounding)) = (net, tax, rounding) {
            let path = format!("{base}/cac:TaxTotal/cbc:RoundingAmount");
            match net.checked_add(tax) {
                Some(sum) if round_amount(sum) != round_amount(rounding) => f.warning(
                    rule::LINE_ARITHMETIC,
                    format!("Line {n}: RoundingAmount {rounding} is not {net} + {tax}"),
                    &path,
                ),
                Some(_) => {}
                None => f.out_of_range(format!("Line {n}: {net} + {tax}"), &path),
            }
        }
    }
    sum
}

fn check_totals(
    root: &XmlElement,
    tax_amount: Option<Decimal>,
    line_sum: Option<Decimal>,
    f: &mut Findings,
) {
    const BASE: &str = "/Invoice/cac:LegalMonetaryTotal";
    let Some(totals) = root.child("cac:LegalMonetaryTotal") else {
        f.error(rule::TOTALS, "Missing cac:LegalMonetaryTotal", BASE);
        return;
    };

    let line_extension = f.amount(totals, "cbc:LineExtensionAmount", BASE);
    let exclusive = f.amount(totals, "cbc:TaxExclusiveAmount", BASE);
    let inclusive = f.amount(totals, "cbc:TaxInclusiveAmount", BASE);
    let payable = f.amount(totals, "cbc:PayableAmount", BASE);

    for (value, name) in [
        (exclusive, "TaxExclusiveAmount"),
        (inclusive, "TaxInclusiveAmount"),
        (payable, "PayableAmount"),
    ] {
        if value.is_none() && totals.non_empty_text(&format!("cbc:{name}")).is_none() {
            f.error(rule::TOTALS, format!("Missing {name}"), &format!("{BASE}/cbc:{name}"));
        }
    }

    if let (Some(excl), Some(incl), Some(tax)) = (exclusive, inclusive, tax_amount) {
        let path = format!("{BASE}/cbc:TaxInclusiveAmount");
        match excl.checked_add(tax) {
            Some(sum) if round_amount(sum) != round_amount(incl) => f.error(
                rule::TOTALS,
                format!("TaxInclusiveAmount {incl} does not equal TaxExclusiveAmount {excl} + TaxAmount {tax}"),
                &path,
            ),
            Some(_) => {}
            None => f.out_of_range(format!("TaxExclusiveAmount {excl} + TaxAmount {tax}"), &path),
        }
    }
    if let (Some(sum), Some(total)) = (line_sum, line_extension) {
        if round_amount(sum) != round_amount(total) {
            f.warning(
                rule::LINE_ARITHMETIC,
                format!("Sum of line amounts {sum} does not match LineExtensionAmount {total}"),
                &format!("{BASE}/cbc:LineExtensionAmount"),
            );
        }
    }
}

/// Check invoice XML against the ZATCA business rules.
///
/// Errors make the document non-compliant; warnings flag data ZATCA
/// accepts but that is likely wrong. Malformed XML yields a single error.
pub fn validate_zatca_requirements(xml: &str) -> ComplianceResult {
    let messages = match check_document(xml) {
        Ok(messages) => messages,
        Err(parse_error) => vec![parse_error],
    };
    let result = to_compliance_result(&messages);
    log::debug!(
        "ZATCA rule check: {} error(s), {} warning(s)",
        result.errors.len(),
        result.warnings.len()
    );
    result
}
