//! Fatoora QR payload: Tag-Length-Value records, base64 encoded.
//!
//! | Tag | Field |
//! |-----|-------|
//! | 1 | Seller name |
//! | 2 | Seller TRN |
//! | 3 | Issue timestamp (ISO 8601) |
//! | 4 | Invoice total incl. VAT, 2 decimals |
//! | 5 | VAT total, 2 decimals |
//!
//! Each record is `tag ‖ length ‖ UTF-8 value` with single-byte tag and
//! length. Values longer than 255 bytes are rejected.

#[cfg(feature = "qr-image")]
pub mod image;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use rust_decimal::Decimal;

use crate::core::QrError;
use crate::core::format::amount_2dp;
use crate::core::{Invoice, InvoiceAmounts};

pub const TAG_SELLER_NAME: u8 = 1;
pub const TAG_SELLER_TRN: u8 = 2;
pub const TAG_TIMESTAMP: u8 = 3;
pub const TAG_INVOICE_TOTAL: u8 = 4;
pub const TAG_VAT_TOTAL: u8 = 5;

/// Largest value a single length byte can describe.
pub const MAX_FIELD_LEN: usize = u8::MAX as usize;

/// The five mandated QR fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FatooraFields {
    pub seller_name: String,
    pub seller_trn: String,
    /// ISO-8601 issue timestamp.
    pub timestamp: String,
    pub grand_total: Decimal,
    pub vat_total: Decimal,
}

impl FatooraFields {
    /// Fields for an invoice, with totals derived from its lines.
    pub fn for_invoice(invoice: &Invoice) -> Self {
        Self::with_amounts(invoice, &invoice.amounts())
    }

    /// Fields for an invoice using amounts the caller already computed.
    pub fn with_amounts(invoice: &Invoice, amounts: &InvoiceAmounts) -> Self {
        Self {
            seller_name: invoice.issuer.name.clone(),
            seller_trn: invoice.issuer.trn().to_string(),
            timestamp: invoice.issue_timestamp(),
            grand_total: amounts.grand_total,
            vat_total: amounts.total_vat,
        }
    }
}

/// One decoded TLV record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlvRecord {
    pub tag: u8,
    pub value: String,
}

fn push_record(buf: &mut Vec<u8>, tag: u8, value: &str) -> Result<(), QrError> {
    let bytes = value.as_bytes();
    let len = u8::try_from(bytes.len()).map_err(|_| QrError::FieldTooLong {
        tag,
        len: bytes.len(),
    })?;
    buf.push(tag);
    buf.push(len);
    buf.extend_from_slice(bytes);
    Ok(())
}

/// Raw TLV bytes, tags 1..5 in order.
pub fn encode_tlv(fields: &FatooraFields) -> Result<Vec<u8>, QrError> {
    let total = amount_2dp(fields.grand_total);
    let vat = amount_2dp(fields.vat_total);

    let mut buf = Vec::with_capacity(
        10 + fields.seller_name.len() + fields.seller_trn.len() + fields.timestamp.len() + total.len() + vat.len(),
    );
    push_record(&mut buf, TAG_SELLER_NAME, &fields.seller_name)?;
    push_record(&mut buf, TAG_SELLER_TRN, &fields.seller_trn)?;
    push_record(&mut buf, TAG_TIMESTAMP, &fields.timestamp)?;
    push_record(&mut buf, TAG_INVOICE_TOTAL, &total)?;
    push_record(&mut buf, TAG_VAT_TOTAL, &vat)?;
    Ok(buf)
}

/// Base64 text of the TLV bytes; the QR payload stored and scanned.
pub fn encode_fatoora(fields: &FatooraFields) -> Result<String, QrError> {
    encode_tlv(fields).map(|tlv| STANDARD.encode(tlv))
}

/// Parse raw TLV bytes.
pub fn decode_tlv(bytes: &[u8]) -> Result<Vec<TlvRecord>, QrError> {
    let mut records = Vec::new();
    let mut rest = bytes;
    while !rest.is_empty() {
        let [tag, len, tail @ ..] = rest else {
            return Err(QrError::Malformed("truncated record header".into()));
        };
        let len = usize::from(*len);
        if tail.len() < len {
            return Err(QrError::Malformed(format!(
                "record {tag} declares {len} bytes, {} available",
                tail.len()
            )));
        }
        let (value, next) = tail.split_at(len);
        let value = std::str::from_utf8(value)
            .map_err(|e| QrError::Malformed(format!("record {tag} is not UTF-8: {e}")))?;
        records.push(TlvRecord {
            tag: *tag,
            value: value.to_string(),
        });
        rest = next;
    }
    Ok(records)
}

/// Decode a base64 Fatoora payload into its records.
pub fn decode_fatoora(payload: &str) -> Result<Vec<TlvRecord>, QrError> {
    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|e| QrError::Malformed(format!("invalid base64: {e}")))?;
    decode_tlv(&bytes)
}
