use super::report::{MessageType, ValidationMessage, to_compliance_result};
use crate::core::{ComplianceResult, rule};

/// Element literals every ZATCA invoice contains.
const REQUIRED_ELEMENTS: &[&str] = &[
    "cbc:ProfileID",
    "cbc:ID",
    "cbc:UUID",
    "cbc:IssueDate",
    "cbc:IssueTime",
    "cbc:InvoiceTypeCode",
    "cbc:DocumentCurrencyCode",
    "cac:AccountingSupplierParty",
    "cac:AccountingCustomerParty",
    "cac:TaxTotal",
    "cac:LegalMonetaryTotal",
    "cac:InvoiceLine",
];

fn is_name_end(b: u8) -> bool {
    matches!(b, b'>' | b'/' | b' ' | b'\t' | b'\r' | b'\n')
}

/// True if `<{tag}` occurs followed by the end of the tag name.
fn contains_tag(xml: &str, tag: &str) -> bool {
    let open = format!("<{tag}");
    xml.match_indices(&open).any(|(pos, _)| {
        xml.as_bytes()
            .get(pos + open.len())
            .is_some_and(|b| is_name_end(*b))
    })
}

/// `<Invoice` or `<prefix:Invoice`.
fn contains_invoice_root(xml: &str) -> bool {
    if contains_tag(xml, "Invoice") {
        return true;
    }
    xml.match_indices(":Invoice").any(|(pos, m)| {
        let ends = xml
            .as_bytes()
            .get(pos + m.len())
            .is_some_and(|b| is_name_end(*b));
        let prefix_start = xml[..pos]
            .rfind(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.'));
        ends && prefix_start.is_some_and(|i| xml.as_bytes()[i] == b'<' && i + 1 < pos)
    })
}

fn missing(message: impl Into<String>, path: &str) -> ValidationMessage {
    ValidationMessage::new(
        MessageType::Error,
        rule::MISSING_ELEMENT,
        message,
        Some(path.to_string()),
    )
}

/// Text-search findings, one `MISSING_ELEMENT` error per problem.
pub(crate) fn check_structure(xml: &str) -> Vec<ValidationMessage> {
    let trimmed = xml.trim_start_matches('\u{feff}').trim();
    if trimmed.is_empty() {
        return vec![missing("XML document is empty", "/")];
    }

    let mut messages = Vec::new();
    if !trimmed.starts_with('<') {
        messages.push(missing(
            "Document does not start with an XML declaration or element",
            "/",
        ));
    }
    if !contains_invoice_root(trimmed) {
        messages.push(missing("Missing root element: Invoice", "/Invoice"));
    }
    for tag in REQUIRED_ELEMENTS {
        if !contains_tag(trimmed, tag) {
            messages.push(missing(
                format!("Missing required element: {tag}"),
                &format!("/Invoice/{tag}"),
            ));
        }
    }
    messages
}

/// Quick pre-check that the mandatory ZATCA elements appear in `xml`.
///
/// This is a text search, not a parse: it catches truncated or foreign
/// documents cheaply. Warnings are always empty.
pub fn validate_xml_structure(xml: &str) -> ComplianceResult {
    let result = to_compliance_result(&check_structure(xml));
    log::debug!("structure check found {} error(s)", result.errors.len());
    result
}
