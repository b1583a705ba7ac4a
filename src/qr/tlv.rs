//! Single-byte Tag-Length-Value records.
//!
//! Layout per record: `[tag u8][len u8][value bytes]`. Records are
//! concatenated with no separator.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use crate::core::ZatcaError;

/// Largest value the single length byte can describe.
pub const MAX_VALUE_LEN: usize = u8::MAX as usize;

/// A decoded TLV record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlvRecord {
    pub tag: u8,
    pub value: Vec<u8>,
}

impl TlvRecord {
    /// The value as UTF-8 text, if it is valid UTF-8.
    pub fn value_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.value).ok()
    }
}

/// Encode one record. Fails with [`ZatcaError::Encoding`] when `value`
/// is longer than 255 bytes.
pub fn encode_tlv(tag: u8, value: &[u8]) -> Result<Vec<u8>, ZatcaError> {
    let len = u8::try_from(value.len()).map_err(|_| ZatcaError::Encoding {
        tag,
        len: value.len(),
    })?;
    let mut out = Vec::with_capacity(value.len() + 2);
    out.push(tag);
    out.push(len);
    out.extend_from_slice(value);
    Ok(out)
}

/// Encode one text record and return it as lowercase hex.
pub fn encode_tlv_hex(tag: u8, value: &str) -> Result<String, ZatcaError> {
    encode_tlv(tag, value.as_bytes()).map(|bytes| to_hex(&bytes))
}

/// Decode a buffer of concatenated records.
pub fn decode_tlv(mut bytes: &[u8]) -> Result<Vec<TlvRecord>, ZatcaError> {
    let mut records = Vec::new();
    while !bytes.is_empty() {
        let [tag, len, rest @ ..] = bytes else {
            return Err(ZatcaError::Decode(format!(
                "truncated record header at byte {}",
                records_len(&records)
            )));
        };
        let len = *len as usize;
        if rest.len() < len {
            return Err(ZatcaError::Decode(format!(
                "record with tag {tag} declares {len} bytes but only {} remain",
                rest.len()
            )));
        }
        records.push(TlvRecord {
            tag: *tag,
            value: rest[..len].to_vec(),
        });
        bytes = &rest[len..];
    }
    Ok(records)
}

fn records_len(records: &[TlvRecord]) -> usize {
    records.iter().map(|r| r.value.len() + 2).sum()
}

/// Accumulates records into one buffer.
#[derive(Debug, Default, Clone)]
pub struct TlvWriter {
    buf: Vec<u8>,
}

impl TlvWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, tag: u8, value: &[u8]) -> Result<&mut Self, ZatcaError> {
        let record = encode_tlv(tag, value)?;
        self.buf.extend_from_slice(&record);
        Ok(self)
    }

    pub fn push_str(&mut self, tag: u8, value: &str) -> Result<&mut Self, ZatcaError> {
        self.push(tag, value.as_bytes())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Base64 of everything written so far.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.buf)
    }
}

/// UTF-8 encode then base64 encode.
pub fn to_base64(text: &str) -> String {
    STANDARD.encode(text.as_bytes())
}

/// Decode standard base64.
pub fn from_base64(text: &str) -> Result<Vec<u8>, ZatcaError> {
    STANDARD
        .decode(text.trim())
        .map_err(|e| ZatcaError::Decode(format!("invalid base64: {e}")))
}

/// Lowercase hex of `bytes`.
pub fn to_hex(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

/// Parse hex text (either case) back into bytes.
pub fn from_hex(text: &str) -> Result<Vec<u8>, ZatcaError> {
    hex::decode(text).map_err(|e| ZatcaError::Decode(format!("invalid hex: {e}")))
}
