#![cfg(feature = "core")]

use std::collections::HashSet;

use chrono::NaiveDate;
use clearinvoice::core::format::amount_2dp;
use clearinvoice::core::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn invoice() -> Invoice {
    InvoiceBuilder::new(3, date(2024, 6, 15))
        .issuer(
            IssuerBuilder::new("Acme Trading LLC")
                .trn("100000000000003")
                .emirate(Emirate::AbuDhabi)
                .build(),
        )
        .counterparty(CounterpartyBuilder::new("Client FZE").build())
        .add_line(InvoiceLine::new("Consulting", dec!(10), dec!(150)))
        .add_line(InvoiceLine::new("Licence", dec!(1), dec!(999.99)))
        .build()
        .unwrap()
}

// --- totals ---

#[test]
fn recalculation_is_idempotent() {
    let mut inv = invoice();
    let first = inv.recalculate_totals();
    let second = inv.recalculate_totals();
    assert_eq!(first, second);
    assert_eq!(first.net, dec!(2499.99));
    assert_eq!(first.vat, dec!(124.9995));
    assert_eq!(first.gross(), inv.amounts().grand_total);
}

#[test]
fn every_line_mutation_keeps_totals_consistent() {
    let mut inv = invoice();
    inv.add_line(InvoiceLine::new("Extra", dec!(2), dec!(5)).vat_rate(dec!(0)))
        .unwrap();
    assert!(inv.totals_consistent());
    assert_eq!(inv.cached_totals().net, dec!(2509.99));

    inv.remove_line(0);
    assert!(inv.totals_consistent());
    assert_eq!(inv.cached_totals().net, dec!(1009.99));

    inv.replace_lines(vec![InvoiceLine::new("Only", dec!(4), dec!(25))])
        .unwrap();
    assert_eq!(inv.cached_totals().gross(), dec!(105.00));

    inv.clear_lines();
    assert_eq!(inv.cached_totals(), CachedTotals::default());
}

#[test]
fn negative_quantity_is_rejected() {
    let mut inv = invoice();
    let err = inv
        .add_line(InvoiceLine::new("Refund", dec!(-1), dec!(10)))
        .unwrap_err();
    assert!(matches!(err, InvoiceError::Builder(_)));
    assert_eq!(inv.lines().len(), 2);
}

#[test]
fn overflowing_line_is_rejected_by_builder() {
    let result = InvoiceBuilder::new(3, date(2024, 6, 15))
        .issuer(IssuerBuilder::new("Acme Trading LLC").build())
        .counterparty(CounterpartyBuilder::new("Client FZE").build())
        .add_line(InvoiceLine::new("big", Decimal::MAX, dec!(2)))
        .build();
    match result {
        Err(InvoiceError::Builder(msg)) => assert!(msg.contains("line 1"), "{msg}"),
        other => panic!("expected builder error, got {other:?}"),
    }
}

#[test]
fn line_without_room_for_two_decimals_is_rejected() {
    let mut inv = invoice();
    let err = inv
        .add_line(InvoiceLine::new("big", dec!(1), Decimal::MAX).vat_rate(dec!(0)))
        .unwrap_err();
    assert!(matches!(err, InvoiceError::Builder(_)));
    assert!(inv
        .add_line(InvoiceLine::new("rate", dec!(1), dec!(1)).vat_rate(Decimal::MAX))
        .is_err());
    assert_eq!(inv.lines().len(), 2);
    assert!(inv.totals_consistent());
}

#[test]
fn running_total_overflow_is_rejected() {
    // each line prints on its own, their sum does not
    let half = Decimal::from_i128_with_scale(5 * 10_i128.pow(26), 0);
    let mut inv = invoice();
    inv.clear_lines();
    inv.add_line(InvoiceLine::new("first", dec!(1), half).vat_rate(dec!(0)))
        .unwrap();
    let err = inv
        .add_line(InvoiceLine::new("second", dec!(1), half).vat_rate(dec!(0)))
        .unwrap_err();
    assert!(err.to_string().contains("line 2"), "{err}");
    assert_eq!(inv.lines().len(), 1);

    let both = vec![
        InvoiceLine::new("first", dec!(1), half).vat_rate(dec!(0)),
        InvoiceLine::new("second", dec!(1), half).vat_rate(dec!(0)),
    ];
    assert!(inv.replace_lines(both).is_err());
    assert_eq!(amount_2dp(inv.amounts().grand_total), "500000000000000000000000000.00");
}

#[test]
fn stored_record_with_overflowing_line_is_rejected() {
    let mut record = serde_json::to_value(invoice()).unwrap();
    record["lines"][0]["quantity"] = serde_json::json!(Decimal::MAX.to_string());
    let err = serde_json::from_value::<Invoice>(record).unwrap_err();
    assert!(err.to_string().contains("representable"), "{err}");
}

#[test]
fn place_of_supply_defaults_to_issuer_emirate() {
    assert_eq!(invoice().place_of_supply, Emirate::AbuDhabi);
}

// --- regions ---

#[test]
fn region_codes() {
    let cases = [
        ("DUBAI", "Dubai", "DU"),
        ("ABU_DHABI", "Abu Dhabi", "AZ"),
        ("Abu Dhabi", "Abu Dhabi", "AZ"),
        ("sharjah", "Sharjah", "SH"),
        ("UMM_AL_QUWAIN", "Umm Al Quwain", "UQ"),
        ("RAS_AL_KHAIMAH", "Ras Al Khaimah", "RK"),
        ("Fujairah", "Fujairah", "FU"),
        ("AJMAN", "Ajman", "AJ"),
        ("Foo", "Foo", "FO"),
    ];
    for (stored, display, code) in cases {
        let emirate = Emirate::parse(stored);
        assert_eq!(emirate.display_name(), display, "{stored}");
        assert_eq!(emirate.subentity_code(), code, "{stored}");
    }
    assert_eq!(Emirate::parse("").subentity_code(), "");
}

#[test]
fn region_serializes_as_stored_code() {
    let json = serde_json::to_string(&Emirate::RasAlKhaimah).unwrap();
    assert_eq!(json, "\"RAS_AL_KHAIMAH\"");
    let back: Emirate = serde_json::from_str("\"Foo\"").unwrap();
    assert_eq!(back, Emirate::Other("Foo".into()));
}

// --- bank details ---

#[test]
fn bank_chain_prefers_invoice_then_issuer() {
    let settings = DocumentSettings::default();
    let mut inv = invoice();

    let (details, source) = resolve_bank_details(&inv, &settings);
    assert_eq!(source, BankDetailsSource::Fallback);
    assert_eq!(details.iban, "AE00 1234 5678 9012");

    inv.issuer.bank_details = Some(BankDetails {
        bank_name: "Mashreq".into(),
        account_number: "0001".into(),
        iban: "AE07 0331 2345 6789 0123 456".into(),
    });
    let (details, source) = resolve_bank_details(&inv, &settings);
    assert_eq!(source, BankDetailsSource::Issuer);
    assert_eq!(details.bank_name, "Mashreq");

    inv.bank_details = Some(BankDetailsOverride {
        iban: Some("AE99 0000".into()),
        ..Default::default()
    });
    let (details, source) = resolve_bank_details(&inv, &settings);
    assert_eq!(source, BankDetailsSource::Invoice);
    assert_eq!(details.iban, "AE99 0000");
    // missing override fields come from the system fallback, not the issuer
    assert_eq!(details.bank_name, "Emirates NBD");
}

// --- numbering ---

#[test]
fn sequential_numbers_per_tenant() {
    let counter = |tenant: u32| -> Result<u64, InvoiceError> { Ok(if tenant == 7 { 11 } else { 0 }) };
    let allocator = InvoiceNumberAllocator::new(counter);
    assert_eq!(allocator.allocate_number(7, &Uuid::new_v4()), "INV-0007-0012");
    assert_eq!(allocator.allocate_number(7, &Uuid::new_v4()), "INV-0007-0013");
    assert_eq!(allocator.allocate_number(2, &Uuid::new_v4()), "INV-0002-0001");
}

#[test]
fn fallback_numbers_are_unique() {
    let counter = |_: u32| -> Result<u64, InvoiceError> { Err(InvoiceError::Numbering("db down".into())) };
    let allocator = InvoiceNumberAllocator::new(counter);

    let uuid = Uuid::parse_str("9f1c2d3e-4b5a-6789-abcd-ef0123456789").unwrap();
    assert_eq!(allocator.allocate_number(1, &uuid), "INV-9F1C2D3E");

    let numbers: HashSet<String> = (0..500)
        .map(|_| allocator.allocate_number(1, &Uuid::new_v4()))
        .collect();
    assert_eq!(numbers.len(), 500);
}

#[test]
fn concurrent_allocation_yields_distinct_numbers() {
    // every caller sees the same persisted count
    let counter = |_: u32| -> Result<u64, InvoiceError> { Ok(4) };
    let allocator = InvoiceNumberAllocator::new(counter);

    let numbers: Vec<String> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                s.spawn(|| {
                    (0..25)
                        .map(|_| allocator.allocate_number(5, &Uuid::new_v4()))
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect()
    });

    let unique: HashSet<&String> = numbers.iter().collect();
    assert_eq!(unique.len(), 200);
    assert!(unique.contains(&"INV-0005-0005".to_string()));
    assert!(unique.contains(&"INV-0005-0204".to_string()));
}

#[test]
fn panicking_counter_does_not_disable_sequential_numbers() {
    use std::panic::{self, AssertUnwindSafe};
    use std::sync::atomic::{AtomicBool, Ordering};

    let exploded = AtomicBool::new(false);
    let counter = |_: u32| -> Result<u64, InvoiceError> {
        if !exploded.swap(true, Ordering::SeqCst) {
            panic!("connection reset");
        }
        Ok(2)
    };
    let allocator = InvoiceNumberAllocator::new(counter);

    let first = panic::catch_unwind(AssertUnwindSafe(|| allocator.allocate_number(6, &Uuid::new_v4())));
    assert!(first.is_err());
    assert_eq!(allocator.allocate_number(6, &Uuid::new_v4()), "INV-0006-0003");
    assert_eq!(allocator.allocate_number(6, &Uuid::new_v4()), "INV-0006-0004");
}

#[test]
fn ensure_number_keeps_existing() {
    let allocator = InvoiceNumberAllocator::new(|_: u32| -> Result<u64, InvoiceError> { Ok(0) });
    let mut inv = invoice();
    assert!(inv.ensure_number(&allocator));
    assert_eq!(inv.number, "INV-0003-0001");
    assert!(!inv.ensure_number(&allocator));
    assert_eq!(inv.number, "INV-0003-0001");
}
