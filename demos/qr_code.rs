use rust_decimal_macros::dec;
use zatca::core::*;
use zatca::qr;

fn main() {
    // ── 1. Phase-1 QR from plain fields ───────────────────────────────
    println!("=== Phase 1 QR ===");
    let fields = QrFields {
        seller_name: "شركة الاختبار".into(),
        vat_number: "310122393500003".into(),
        timestamp: "2024-06-15T10:30:00Z".into(),
        total: dec!(1150),
        vat_amount: dec!(150),
    };

    let check = is_zatca_compliant(&fields);
    if !check.is_valid {
        for e in &check.errors {
            println!("  Rejected: {}", e);
        }
        return;
    }

    let encoded = qr::generate_zatca_qr_string(&fields).expect("fields fit the TLV length limit");
    println!("  {}", encoded);

    // ── 2. Decode it again ────────────────────────────────────────────
    println!("\n=== Decoded ===");
    let decoded = qr::decode_zatca_qr(&encoded).expect("just encoded");
    for record in &decoded.records {
        println!(
            "  tag {}: {}",
            record.tag,
            record.value_str().unwrap_or("<binary>")
        );
    }

    // ── 3. Field checks catch bad input ───────────────────────────────
    println!("\n=== Validation Errors ===");
    let bad = QrFields {
        seller_name: String::new(),
        vat_number: "123".into(),
        vat_amount: dec!(2000),
        ..fields.clone()
    };
    for e in validate_qr_fields(&bad) {
        println!("  - {}", e);
    }

    // ── 4. Oversized values are refused ───────────────────────────────
    println!("\n=== Encoding Error ===");
    let long = QrFields {
        seller_name: "x".repeat(300),
        ..fields
    };
    match qr::generate_zatca_qr_string(&long) {
        Ok(_) => println!("  Encoded (unexpected)"),
        Err(e) => println!("  {}", e),
    }
}
