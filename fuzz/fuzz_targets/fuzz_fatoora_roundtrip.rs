#![no_main]

use clearinvoice::qr::{FatooraFields, decode_fatoora, encode_fatoora};
use libfuzzer_sys::fuzz_target;
use rust_decimal::Decimal;

fuzz_target!(|input: (String, String, String, i64, i64)| {
    let (seller_name, seller_trn, timestamp, total, vat) = input;
    let fields = FatooraFields {
        seller_name,
        seller_trn,
        timestamp,
        grand_total: Decimal::new(total, 2),
        vat_total: Decimal::new(vat, 2),
    };
    // Encoding either rejects an oversized field or decodes back to five records.
    if let Ok(payload) = encode_fatoora(&fields) {
        let records = decode_fatoora(&payload).expect("encoder output must decode");
        assert_eq!(records.len(), 5);
        assert_eq!(records[0].value, fields.seller_name);
    }
});
