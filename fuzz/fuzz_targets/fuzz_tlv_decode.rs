#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Decoding arbitrary bytes must not panic; whatever decodes re-encodes identically.
    if let Ok(records) = zatca::qr::decode_tlv(data) {
        let mut out = Vec::with_capacity(data.len());
        for r in &records {
            out.extend(zatca::qr::encode_tlv(r.tag, &r.value).unwrap());
        }
        assert_eq!(out, data);
    }
    if let Ok(s) = std::str::from_utf8(data) {
        let _ = zatca::qr::decode_zatca_qr(s);
    }
});
