use serde::{Deserialize, Serialize};

use super::hash::compute_invoice_hash;
use super::ns;
use super::xml_utils::XmlWriter;
use crate::core::{PLACEHOLDER_CERTIFICATE, PLACEHOLDER_SIGNATURE, ZatcaError};

const C14N11: &str = "http://www.w3.org/2006/12/xml-c14n11";
const ECDSA_SHA256: &str = "http://www.w3.org/2001/04/xmldsig-more#ecdsa-sha256";
const SHA256: &str = "http://www.w3.org/2001/04/xmlenc#sha256";
const XPATH: &str = "http://www.w3.org/TR/1999/REC-xpath-19991116";
const SIGNATURE_PROPERTIES: &str = "http://www.w3.org/2000/09/xmldsig#SignatureProperties";

pub(crate) const XADES_EXTENSION_URI: &str =
    "urn:oasis:names:specification:ubl:dsig:enveloped:xades";
pub(crate) const INVOICE_SIGNATURE_ID: &str =
    "urn:oasis:names:specification:ubl:signature:Invoice";
const SIGNATURE_INFORMATION_ID: &str = "urn:oasis:names:specification:ubl:signature:1";

/// Everything a signer contributes to the final document.
///
/// Text fields land in the XAdES block inside `ext:UBLExtensions`; the
/// byte fields become QR tags 7, 8 and 9.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureMaterial {
    /// Invoice digest (base64 SHA-256) referenced by the signature.
    pub invoice_digest: String,
    /// Digest of the XAdES signed properties.
    pub signed_properties_digest: String,
    /// Base64 signature value.
    pub signature_value: String,
    /// Base64 DER X.509 signing certificate.
    pub certificate: String,
    /// Base64 SHA-256 of the certificate.
    pub certificate_digest: String,
    pub issuer_name: String,
    pub serial_number: String,
    pub signing_time: String,
    /// QR tag 7.
    pub qr_signature: Vec<u8>,
    /// QR tag 8.
    pub public_key: Vec<u8>,
    /// QR tag 9, only emitted for simplified invoices.
    pub certificate_signature: Option<Vec<u8>>,
}

/// Produces the signature for an invoice.
///
/// `unsigned_xml` is the document without `ext:UBLExtensions`,
/// `cac:Signature` and the QR reference. Implementations backed by a real
/// key and a ZATCA-issued certificate plug in here.
pub trait SignatureProvider {
    fn sign(&self, unsigned_xml: &[u8]) -> Result<SignatureMaterial, ZatcaError>;
}

/// Signer that fills every field with a placeholder token.
///
/// The output is structurally complete and validates with warnings, but
/// carries no cryptographic signature.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderSignatureProvider;

impl SignatureProvider for PlaceholderSignatureProvider {
    fn sign(&self, unsigned_xml: &[u8]) -> Result<SignatureMaterial, ZatcaError> {
        let xml = std::str::from_utf8(unsigned_xml)
            .map_err(|e| ZatcaError::Signature(format!("unsigned document is not UTF-8: {e}")))?;
        log::warn!("signing invoice with placeholder signature material");
        Ok(SignatureMaterial {
            invoice_digest: compute_invoice_hash(xml),
            signed_properties_digest: PLACEHOLDER_SIGNATURE.into(),
            signature_value: PLACEHOLDER_SIGNATURE.into(),
            certificate: PLACEHOLDER_CERTIFICATE.into(),
            certificate_digest: PLACEHOLDER_CERTIFICATE.into(),
            issuer_name: PLACEHOLDER_CERTIFICATE.into(),
            serial_number: "0".into(),
            signing_time: "1970-01-01T00:00:00".into(),
            qr_signature: PLACEHOLDER_SIGNATURE.as_bytes().to_vec(),
            public_key: PLACEHOLDER_CERTIFICATE.as_bytes().to_vec(),
            certificate_signature: Some(PLACEHOLDER_SIGNATURE.as_bytes().to_vec()),
        })
    }
}

/// Write the `ext:UBLExtensions` block holding the XAdES signature.
pub(crate) fn write_signature_extension(
    w: &mut XmlWriter,
    material: &SignatureMaterial,
) -> Result<(), ZatcaError> {
    w.start_element("ext:UBLExtensions")?;
    w.start_element("ext:UBLExtension")?;
    w.text_element("ext:ExtensionURI", XADES_EXTENSION_URI)?;
    w.start_element("ext:ExtensionContent")?;
    w.start_element_with_attrs(
        "sig:UBLDocumentSignatures",
        &[
            ("xmlns:sig", ns::SIG),
            ("xmlns:sac", ns::SAC),
            ("xmlns:sbc", ns::SBC),
        ],
    )?;
    w.start_element("sac:SignatureInformation")?;
    w.text_element("cbc:ID", SIGNATURE_INFORMATION_ID)?;
    w.text_element("sbc:ReferencedSignatureID", INVOICE_SIGNATURE_ID)?;
    w.start_element_with_attrs(
        "ds:Signature",
        &[("xmlns:ds", ns::DS), ("Id", "signature")],
    )?;

    w.start_element("ds:SignedInfo")?;
    w.empty_element_with_attrs("ds:CanonicalizationMethod", &[("Algorithm", C14N11)])?;
    w.empty_element_with_attrs("ds:SignatureMethod", &[("Algorithm", ECDSA_SHA256)])?;

    w.start_element_with_attrs(
        "ds:Reference",
        &[("Id", "invoiceSignedData"), ("URI", "")],
    )?;
    w.start_element("ds:Transforms")?;
    for xpath in [
        "not(//ancestor-or-self::ext:UBLExtensions)",
        "not(//ancestor-or-self::cac:Signature)",
        "not(//ancestor-or-self::cac:AdditionalDocumentReference[cbc:ID='QR'])",
    ] {
        w.start_element_with_attrs("ds:Transform", &[("Algorithm", XPATH)])?;
        w.text_element("ds:XPath", xpath)?;
        w.end_element("ds:Transform")?;
    }
    w.empty_element_with_attrs("ds:Transform", &[("Algorithm", C14N11)])?;
    w.end_element("ds:Transforms")?;
    w.empty_element_with_attrs("ds:DigestMethod", &[("Algorithm", SHA256)])?;
    w.text_element("ds:DigestValue", &material.invoice_digest)?;
    w.end_element("ds:Reference")?;

    w.start_element_with_attrs(
        "ds:Reference",
        &[
            ("Type", SIGNATURE_PROPERTIES),
            ("URI", "#xadesSignedProperties"),
        ],
    )?;
    w.empty_element_with_attrs("ds:DigestMethod", &[("Algorithm", SHA256)])?;
    w.text_element("ds:DigestValue", &material.signed_properties_digest)?;
    w.end_element("ds:Reference")?;
    w.end_element("ds:SignedInfo")?;

    w.text_element("ds:SignatureValue", &material.signature_value)?;
    w.start_element("ds:KeyInfo")?;
    w.start_element("ds:X509Data")?;
    w.text_element("ds:X509Certificate", &material.certificate)?;
    w.end_element("ds:X509Data")?;
    w.end_element("ds:KeyInfo")?;

    w.start_element("ds:Object")?;
    w.start_element_with_attrs(
        "xades:QualifyingProperties",
        &[("xmlns:xades", ns::XADES), ("Target", "signature")],
    )?;
    w.start_element_with_attrs(
        "xades:SignedProperties",
        &[("Id", "xadesSignedProperties")],
    )?;
    w.start_element("xades:SignedSignatureProperties")?;
    w.text_element("xades:SigningTime", &material.signing_time)?;
    w.start_element("xades:SigningCertificate")?;
    w.start_element("xades:Cert")?;
    w.start_element("xades:CertDigest")?;
    w.empty_element_with_attrs("ds:DigestMethod", &[("Algorithm", SHA256)])?;
    w.text_element("ds:DigestValue", &material.certificate_digest)?;
    w.end_element("xades:CertDigest")?;
    w.start_element("xades:IssuerSerial")?;
    w.text_element("ds:X509IssuerName", &material.issuer_name)?;
    w.text_element("ds:X509SerialNumber", &material.serial_number)?;
    w.end_element("xades:IssuerSerial")?;
    w.end_element("xades:Cert")?;
    w.end_element("xades:SigningCertificate")?;
    w.end_element("xades:SignedSignatureProperties")?;
    w.end_element("xades:SignedProperties")?;
    w.end_element("xades:QualifyingProperties")?;
    w.end_element("ds:Object")?;

    w.end_element("ds:Signature")?;
    w.end_element("sac:SignatureInformation")?;
    w.end_element("sig:UBLDocumentSignatures")?;
    w.end_element("ext:ExtensionContent")?;
    w.end_element("ext:UBLExtension")?;
    w.end_element("ext:UBLExtensions")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_digest_is_real_hash() {
        let material = PlaceholderSignatureProvider.sign(b"<Invoice/>").unwrap();
        assert_eq!(material.invoice_digest, compute_invoice_hash("<Invoice/>"));
        assert_eq!(material.signature_value, PLACEHOLDER_SIGNATURE);
        assert!(material.certificate_signature.is_some());
    }

    #[test]
    fn non_utf8_input_is_a_signature_error() {
        let err = PlaceholderSignatureProvider.sign(&[0xff, 0xfe]).unwrap_err();
        assert!(matches!(err, ZatcaError::Signature(_)));
    }

    #[test]
    fn extension_block_carries_material() {
        let material = PlaceholderSignatureProvider.sign(b"doc").unwrap();
        let mut w = XmlWriter::new().unwrap();
        write_signature_extension(&mut w, &material).unwrap();
        let xml = w.into_string().unwrap();
        assert!(xml.contains("<ext:ExtensionURI>urn:oasis:names:specification:ubl:dsig:enveloped:xades</ext:ExtensionURI>"));
        assert!(xml.contains(&format!("<ds:SignatureValue>{PLACEHOLDER_SIGNATURE}</ds:SignatureValue>")));
        assert!(xml.contains("[cbc:ID=&apos;QR&apos;]"));
    }
}
