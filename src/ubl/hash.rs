use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use sha2::{Digest, Sha256};

/// Base64-encoded SHA-256 of a document.
///
/// The XML builder applies this to the invoice rendered without its
/// signature extension, `cac:Signature` and QR reference; the value goes
/// into QR tag 6 and becomes the next invoice's PIH.
pub fn compute_invoice_hash(xml: &str) -> String {
    STANDARD.encode(Sha256::digest(xml.as_bytes()))
}
