#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let _ = zatca::compliance::tree::parse_xml(s);
        let _ = zatca::compliance::validate_xml_structure(s);
        let result = zatca::compliance::validate_zatca_requirements(s);
        // A document with errors is never valid.
        assert_eq!(result.is_valid, result.errors.is_empty());
    }
});
