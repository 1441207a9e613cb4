#![cfg(all(feature = "pdf", feature = "ubl"))]

use chrono::{NaiveDate, NaiveTime};
use clearinvoice::core::*;
use clearinvoice::documents::{ArtifactStatus, regenerate_documents, render_pdf, render_xml};
use clearinvoice::qr::{self, FatooraFields};
use clearinvoice::storage::{ArtifactKind, ArtifactPath, ArtifactStore, FsArtifactStore};
use lopdf::content::Content;
use lopdf::{Document, Object};
use rust_decimal_macros::dec;
use uuid::Uuid;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn settings() -> DocumentSettings {
    DocumentSettings::default()
}

fn invoice() -> Invoice {
    InvoiceBuilder::new(3, date(2024, 6, 15))
        .number("INV-0003-0042")
        .uuid(Uuid::parse_str("0b5c7e2a-9d41-4f3e-8a61-2c9d7e4f1a03").unwrap())
        .issue_time(NaiveTime::from_hms_opt(9, 30, 0).unwrap())
        .due_date(date(2024, 7, 15))
        .issuer(
            IssuerBuilder::new("Acme Trading LLC")
                .trn("100000000000003")
                .address("Sheikh Zayed Road 1")
                .phone("+971 4 123 4567")
                .emirate(Emirate::Dubai)
                .build(),
        )
        .counterparty(
            CounterpartyBuilder::new("Client FZE")
                .trn("100000000000099")
                .email("ap@client.ae")
                .build(),
        )
        .place_of_supply(Emirate::AbuDhabi)
        .add_line(InvoiceLine::new("Consulting", dec!(10), dec!(150)))
        .add_line(InvoiceLine::new("Licence", dec!(1), dec!(999.99)))
        .build()
        .unwrap()
}

/// Text shown on each page, one entry per `Tj`.
fn page_texts(pdf: &[u8]) -> Vec<Vec<String>> {
    let doc = Document::load_mem(pdf).unwrap();
    doc.get_pages()
        .values()
        .map(|&id| {
            let content = Content::decode(&doc.get_page_content(id).unwrap()).unwrap();
            content
                .operations
                .iter()
                .filter(|op| op.operator == "Tj")
                .filter_map(|op| match op.operands.first() {
                    Some(Object::String(bytes, _)) => Some(bytes.iter().map(|&b| b as char).collect::<String>()),
                    _ => None,
                })
                .collect()
        })
        .collect()
}

fn pdf_grand_total(pdf: &[u8]) -> String {
    let texts: Vec<String> = page_texts(pdf).into_iter().flatten().collect();
    let idx = texts.iter().position(|t| t == "GRAND TOTAL:").unwrap();
    texts[idx + 1].clone()
}

fn xml_value<'a>(xml: &'a str, open_tag: &str) -> &'a str {
    let start = xml.find(open_tag).unwrap() + open_tag.len();
    let len = xml[start..].find('<').unwrap();
    &xml[start..start + len]
}

#[test]
fn documents_agree_on_grand_total() {
    let inv = invoice();
    let pdf = render_pdf(&inv, &settings()).into_payload().unwrap();
    let xml = render_xml(&inv, &settings()).into_payload().unwrap();
    let records = qr::decode_fatoora(&qr::encode_fatoora(&FatooraFields::for_invoice(&inv)).unwrap()).unwrap();

    // 1500 + 999.99 net, 124.9995 VAT
    assert_eq!(pdf_grand_total(&pdf), "AED 2,624.99");
    assert_eq!(xml_value(&xml, r#"<cbc:PayableAmount currencyID="AED">"#), "2624.99");
    assert_eq!(xml_value(&xml, r#"<cbc:TaxInclusiveAmount currencyID="AED">"#), "2624.99");
    assert_eq!(records[3].value, "2624.99");
    assert_eq!(records[4].value, "125.00");
}

#[test]
fn qr_payload_snapshot() {
    let inv = invoice();
    let records = qr::decode_fatoora(&qr::encode_fatoora(&FatooraFields::for_invoice(&inv)).unwrap()).unwrap();
    let summary = records
        .iter()
        .map(|r| format!("{}: {}", r.tag, r.value))
        .collect::<Vec<_>>()
        .join("\n");
    insta::assert_snapshot!(summary, @r"
    1: Acme Trading LLC
    2: 100000000000003
    3: 2024-06-15T09:30:00
    4: 2624.99
    5: 125.00
    ");
}

#[test]
fn zero_line_invoice_renders_zero_everywhere() {
    let mut inv = invoice();
    inv.clear_lines();

    let xml = render_xml(&inv, &settings()).into_payload().unwrap();
    assert!(!xml.contains("<cac:InvoiceLine>"));
    for tag in [
        r#"<cbc:LineExtensionAmount currencyID="AED">"#,
        r#"<cbc:TaxAmount currencyID="AED">"#,
        r#"<cbc:PayableAmount currencyID="AED">"#,
    ] {
        assert_eq!(xml_value(&xml, tag), "0.00", "{tag}");
    }
    assert_eq!(xml_value(&xml, "<cbc:Percent>"), "5.00");

    let pdf = render_pdf(&inv, &settings()).into_payload().unwrap();
    assert_eq!(pdf_grand_total(&pdf), "AED 0.00");

    let records = qr::decode_fatoora(&qr::encode_fatoora(&FatooraFields::for_invoice(&inv)).unwrap()).unwrap();
    assert_eq!(records[3].value, "0.00");
    assert_eq!(records[4].value, "0.00");
}

#[test]
fn stale_cached_totals_are_ignored() {
    let inv = invoice();
    let mut record = serde_json::to_value(&inv).unwrap();
    record["totals"]["net"] = serde_json::json!("99999.00");
    record["totals"]["vat"] = serde_json::json!("1.00");
    let stale: Invoice = serde_json::from_value(record).unwrap();

    assert_eq!(stale.cached_totals().net, dec!(99999.00));
    assert!(!stale.totals_consistent());

    let xml = render_xml(&stale, &settings()).into_payload().unwrap();
    assert_eq!(xml_value(&xml, r#"<cbc:PayableAmount currencyID="AED">"#), "2624.99");
    let pdf = render_pdf(&stale, &settings()).into_payload().unwrap();
    assert_eq!(pdf_grand_total(&pdf), "AED 2,624.99");
}

#[test]
fn xml_regions_follow_issuer_and_place_of_supply() {
    let xml = render_xml(&invoice(), &settings()).into_payload().unwrap();
    let supplier = xml.find("<cac:AccountingSupplierParty>").unwrap();
    let customer = xml.find("<cac:AccountingCustomerParty>").unwrap();
    assert_eq!(xml_value(&xml[supplier..], "<cbc:CityName>"), "Dubai");
    assert_eq!(xml_value(&xml[supplier..], "<cbc:CountrySubentityCode>"), "DU");
    assert_eq!(xml_value(&xml[customer..], "<cbc:CityName>"), "Abu Dhabi");
    assert_eq!(xml_value(&xml[customer..], "<cbc:CountrySubentityCode>"), "AZ");
}

#[test]
fn every_emirate_reaches_customer_subentity() {
    let expected = [
        ("Abu Dhabi", "AZ"),
        ("Dubai", "DU"),
        ("Sharjah", "SH"),
        ("Ajman", "AJ"),
        ("Umm Al Quwain", "UQ"),
        ("Ras Al Khaimah", "RK"),
        ("Fujairah", "FU"),
    ];
    for (emirate, (city, code)) in Emirate::ALL.into_iter().zip(expected) {
        let mut inv = invoice();
        inv.place_of_supply = emirate.clone();
        let xml = render_xml(&inv, &settings()).into_payload().unwrap();
        let customer = xml.find("<cac:AccountingCustomerParty>").unwrap();
        assert_eq!(xml_value(&xml[customer..], "<cbc:CityName>"), city, "{emirate:?}");
        assert_eq!(xml_value(&xml[customer..], "<cbc:CountrySubentityCode>"), code, "{emirate:?}");
        // supplier side stays on the issuer's emirate
        let supplier = xml.find("<cac:AccountingSupplierParty>").unwrap();
        assert_eq!(xml_value(&xml[supplier..], "<cbc:CountrySubentityCode>"), "DU");
    }
}

#[test]
fn unmapped_region_uses_leading_letters() {
    let mut inv = invoice();
    inv.place_of_supply = Emirate::parse("Foo");
    let xml = render_xml(&inv, &settings()).into_payload().unwrap();
    let customer = xml.find("<cac:AccountingCustomerParty>").unwrap();
    assert_eq!(xml_value(&xml[customer..], "<cbc:CityName>"), "Foo");
    assert_eq!(xml_value(&xml[customer..], "<cbc:CountrySubentityCode>"), "FO");
}

#[test]
fn pdf_prints_bank_fallback_chain() {
    let mut inv = invoice();
    let texts = |inv: &Invoice| -> Vec<String> {
        page_texts(&render_pdf(inv, &settings()).into_payload().unwrap())
            .into_iter()
            .flatten()
            .collect()
    };

    let fallback = texts(&inv);
    assert!(fallback.iter().any(|t| t == "Bank: Emirates NBD"));
    assert!(fallback.iter().any(|t| t == "Account: 1234 5678 9012"));

    inv.issuer.bank_details = Some(BankDetails {
        bank_name: "Mashreq".into(),
        account_number: "0001".into(),
        iban: "AE07 0331".into(),
    });
    assert!(texts(&inv).iter().any(|t| t == "Bank: Mashreq"));

    inv.bank_details = Some(BankDetailsOverride {
        bank_name: Some("ADCB".into()),
        ..Default::default()
    });
    let overridden = texts(&inv);
    assert!(overridden.iter().any(|t| t == "Bank: ADCB"));
    assert!(overridden.iter().any(|t| t == "IBAN: AE00 1234 5678 9012"));
}

#[test]
fn regeneration_writes_tenant_partitioned_files() {
    let dir = tempfile::tempdir().unwrap();
    let store = FsArtifactStore::new(dir.path());
    let mut inv = invoice();

    let report = regenerate_documents(&mut inv, &store, &settings());
    assert!(report.is_complete());

    let on_disk = dir
        .path()
        .join("tenant_0003")
        .join("invoice_0b5c7e2a-9d41-4f3e-8a61-2c9d7e4f1a03.pdf");
    assert!(on_disk.is_file());
    assert!(std::fs::read(&on_disk).unwrap().starts_with(b"%PDF"));

    let xml_path = ArtifactPath::for_invoice(3, &inv.uuid, ArtifactKind::Xml);
    assert!(store.exists(&xml_path));
    assert_eq!(inv.xml_path.as_ref(), Some(&xml_path));

    // artifact paths persist as their relative path
    let record = serde_json::to_value(&inv).unwrap();
    assert_eq!(
        record["xml_path"],
        "tenant_0003/invoice_0b5c7e2a-9d41-4f3e-8a61-2c9d7e4f1a03.xml"
    );
}

#[test]
fn oversized_seller_name_degrades_xml_and_fails_pdf() {
    let dir = tempfile::tempdir().unwrap();
    let store = FsArtifactStore::new(dir.path());
    let mut inv = invoice();
    inv.issuer.name = "Ä".repeat(130);

    let report = regenerate_documents(&mut inv, &store, &settings());
    match &report.pdf {
        ArtifactStatus::RenderFailed { reason } => assert!(reason.contains("255"), "{reason}"),
        other => panic!("unexpected {other:?}"),
    }
    assert!(inv.pdf_path.is_none());

    assert!(report.xml.is_stored());
    let xml = inv.xml_content.as_deref().unwrap();
    assert!(!xml.contains("<cac:AdditionalDocumentReference>"));
    assert!(xml.contains("<ext:UBLExtensions>"));
}
