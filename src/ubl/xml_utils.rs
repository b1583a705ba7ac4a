use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use rust_decimal::Decimal;
use std::io::Cursor;

use crate::core::ZatcaError;
use crate::core::format::{format_amount, format_decimal};

pub type XmlResult = Result<String, ZatcaError>;

fn xml_io(e: std::io::Error) -> ZatcaError {
    ZatcaError::Xml(format!("XML write error: {e}"))
}

/// Thin wrapper over the quick-xml writer. Every text node and attribute
/// value goes through quick-xml's escaping.
pub struct XmlWriter {
    writer: Writer<Cursor<Vec<u8>>>,
}

impl XmlWriter {
    pub fn new() -> Result<Self, ZatcaError> {
        let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(xml_io)?;
        Ok(Self { writer })
    }

    pub fn into_string(self) -> Result<String, ZatcaError> {
        let buf = self.writer.into_inner().into_inner();
        String::from_utf8(buf).map_err(|e| ZatcaError::Xml(format!("XML UTF-8 error: {e}")))
    }

    pub fn start_element(&mut self, name: &str) -> Result<&mut Self, ZatcaError> {
        self.start_element_with_attrs(name, &[])
    }

    pub fn start_element_with_attrs(
        &mut self,
        name: &str,
        attrs: &[(&str, &str)],
    ) -> Result<&mut Self, ZatcaError> {
        let mut elem = BytesStart::new(name);
        for (k, v) in attrs {
            elem.push_attribute((*k, *v));
        }
        self.writer
            .write_event(Event::Start(elem))
            .map_err(xml_io)?;
        Ok(self)
    }

    /// Self-closing element, e.g. `<ds:DigestMethod Algorithm="..."/>`.
    pub fn empty_element_with_attrs(
        &mut self,
        name: &str,
        attrs: &[(&str, &str)],
    ) -> Result<&mut Self, ZatcaError> {
        let mut elem = BytesStart::new(name);
        for (k, v) in attrs {
            elem.push_attribute((*k, *v));
        }
        self.writer
            .write_event(Event::Empty(elem))
            .map_err(xml_io)?;
        Ok(self)
    }

    pub fn end_element(&mut self, name: &str) -> Result<&mut Self, ZatcaError> {
        self.writer
            .write_event(Event::End(BytesEnd::new(name)))
            .map_err(xml_io)?;
        Ok(self)
    }

    pub fn text_element(&mut self, name: &str, text: &str) -> Result<&mut Self, ZatcaError> {
        self.text_element_with_attrs(name, text, &[])
    }

    pub fn text_element_with_attrs(
        &mut self,
        name: &str,
        text: &str,
        attrs: &[(&str, &str)],
    ) -> Result<&mut Self, ZatcaError> {
        self.start_element_with_attrs(name, attrs)?;
        self.writer
            .write_event(Event::Text(BytesText::new(text)))
            .map_err(xml_io)?;
        self.end_element(name)
    }

    /// Write a two-decimal amount with currencyID attribute.
    pub fn amount_element(
        &mut self,
        name: &str,
        amount: Decimal,
        currency: &str,
    ) -> Result<&mut Self, ZatcaError> {
        self.text_element_with_attrs(name, &format_amount(amount), &[("currencyID", currency)])
    }

    /// Write a quantity with unitCode attribute.
    pub fn quantity_element(
        &mut self,
        name: &str,
        qty: Decimal,
        unit: &str,
    ) -> Result<&mut Self, ZatcaError> {
        self.text_element_with_attrs(name, &format_decimal(qty), &[("unitCode", unit)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn escapes_text_and_attributes() {
        let mut w = XmlWriter::new().unwrap();
        w.text_element_with_attrs("cbc:Name", "A & B <C> 'q' \"d\"", &[("name", "x\"y")])
            .unwrap();
        let xml = w.into_string().unwrap();
        assert!(xml.contains("A &amp; B &lt;C&gt; &apos;q&apos; &quot;d&quot;"));
        assert!(xml.contains("name=\"x&quot;y\""));
    }

    #[test]
    fn amounts_have_two_decimals() {
        let mut w = XmlWriter::new().unwrap();
        w.amount_element("cbc:TaxAmount", dec!(150), "SAR").unwrap();
        w.quantity_element("cbc:InvoicedQuantity", dec!(2.5), "PCE")
            .unwrap();
        let xml = w.into_string().unwrap();
        assert!(xml.contains("<cbc:TaxAmount currencyID=\"SAR\">150.00</cbc:TaxAmount>"));
        assert!(xml.contains("<cbc:InvoicedQuantity unitCode=\"PCE\">2.50</cbc:InvoicedQuantity>"));
    }

    #[test]
    fn empty_elements_self_close() {
        let mut w = XmlWriter::new().unwrap();
        w.empty_element_with_attrs("ds:DigestMethod", &[("Algorithm", "sha256")])
            .unwrap();
        let xml = w.into_string().unwrap();
        assert!(xml.contains("<ds:DigestMethod Algorithm=\"sha256\"/>"));
    }
}
