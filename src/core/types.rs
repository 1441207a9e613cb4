use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use super::calc::{self, InvoiceAmounts};
use super::error::InvoiceError;
use super::format::fits_2dp;
use super::region::Emirate;
use crate::storage::ArtifactPath;

/// Invoice aggregate: header, ordered lines and both parties.
///
/// Lines and cached totals are private. Every line mutation goes through a
/// method that recomputes the totals, so `net + vat` always equals the sum
/// over the lines for invoices built in-process. Records deserialized from
/// storage may carry stale totals; renderers never read them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    /// Persistence identifier, absent before the first save.
    pub id: Option<u64>,
    /// Tenant (company) owning the invoice.
    pub tenant_id: u32,
    /// Human-readable invoice number; empty until allocated.
    pub number: String,
    /// Opaque identifier used for file naming and QR/XML cross-reference.
    pub uuid: Uuid,
    pub issue_date: NaiveDate,
    /// Time of issue, emitted when known.
    pub issue_time: Option<NaiveTime>,
    pub due_date: Option<NaiveDate>,
    /// Tax jurisdiction of the supply, independent of either postal address.
    pub place_of_supply: Emirate,
    pub status: InvoiceStatus,
    /// Buyer's purchase order number.
    pub order_reference: Option<String>,
    pub issuer: Issuer,
    pub counterparty: Counterparty,
    /// Per-invoice payment details, taking precedence over the issuer's.
    pub bank_details: Option<BankDetailsOverride>,
    pub pdf_path: Option<ArtifactPath>,
    pub xml_path: Option<ArtifactPath>,
    /// Raw XML cached on the record so it can be served without storage access.
    pub xml_content: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(deserialize_with = "deserialize_lines")]
    lines: Vec<InvoiceLine>,
    totals: CachedTotals,
}

/// Lifecycle status carried on the record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum InvoiceStatus {
    #[default]
    Draft,
    Sent,
    Paid,
    Overdue,
    Cancelled,
}

impl InvoiceStatus {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::Sent => "SENT",
            Self::Paid => "PAID",
            Self::Overdue => "OVERDUE",
            Self::Cancelled => "CANCELLED",
        }
    }
}

/// Net and VAT totals stored on the invoice record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedTotals {
    pub net: Decimal,
    pub vat: Decimal,
}

impl CachedTotals {
    pub fn gross(&self) -> Decimal {
        self.net + self.vat
    }
}

impl From<InvoiceAmounts> for CachedTotals {
    fn from(amounts: InvoiceAmounts) -> Self {
        Self {
            net: amounts.subtotal,
            vat: amounts.total_vat,
        }
    }
}

/// One line of an invoice. Amounts are derived, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceLine {
    pub description: String,
    /// Non-negative quantity.
    pub quantity: Decimal,
    pub unit_price: Decimal,
    /// VAT rate as a fraction, e.g. 0.05 for 5%.
    pub vat_rate: Decimal,
}

impl InvoiceLine {
    pub fn new(description: impl Into<String>, quantity: Decimal, unit_price: Decimal) -> Self {
        Self {
            description: description.into(),
            quantity,
            unit_price,
            vat_rate: super::settings::DEFAULT_VAT_RATE,
        }
    }

    pub fn vat_rate(mut self, rate: Decimal) -> Self {
        self.vat_rate = rate;
        self
    }
}

/// Issuing company (the tenant).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Issuer {
    pub name: String,
    /// Tax registration number; `None` when unknown.
    pub trn: Option<String>,
    pub address: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    /// Registered emirate; default place of supply and postal city.
    pub emirate: Option<Emirate>,
    /// Stored default bank account.
    pub bank_details: Option<BankDetails>,
}

impl Issuer {
    pub fn trn(&self) -> &str {
        self.trn.as_deref().unwrap_or_default()
    }

    pub fn address(&self) -> &str {
        self.address.as_deref().unwrap_or_default()
    }

    pub fn email(&self) -> &str {
        self.email.as_deref().unwrap_or_default()
    }

    pub fn phone(&self) -> &str {
        self.phone.as_deref().unwrap_or_default()
    }

    /// Postal region of the issuer, Dubai when none is registered.
    pub fn region(&self) -> Emirate {
        self.emirate.clone().unwrap_or_default()
    }
}

/// Invoiced client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Counterparty {
    pub name: String,
    pub trn: Option<String>,
    pub address: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl Counterparty {
    pub fn trn(&self) -> &str {
        self.trn.as_deref().unwrap_or_default()
    }

    pub fn address(&self) -> &str {
        self.address.as_deref().unwrap_or_default()
    }

    pub fn email(&self) -> &str {
        self.email.as_deref().unwrap_or_default()
    }

    pub fn phone(&self) -> &str {
        self.phone.as_deref().unwrap_or_default()
    }
}

/// Complete bank account details as printed on the invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankDetails {
    pub bank_name: String,
    pub account_number: String,
    pub iban: String,
}

/// Per-invoice bank details; missing fields fall back to system defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankDetailsOverride {
    pub bank_name: Option<String>,
    pub account_number: Option<String>,
    pub iban: Option<String>,
}

impl BankDetailsOverride {
    pub fn is_empty(&self) -> bool {
        [&self.bank_name, &self.account_number, &self.iban]
            .iter()
            .all(|field| field.as_deref().is_none_or(|v| v.trim().is_empty()))
    }
}

impl From<BankDetails> for BankDetailsOverride {
    fn from(details: BankDetails) -> Self {
        Self {
            bank_name: Some(details.bank_name),
            account_number: Some(details.account_number),
            iban: Some(details.iban),
        }
    }
}

/// Upper bound on lines per invoice.
pub const MAX_LINES: usize = 10_000;

impl Invoice {
    pub(crate) fn from_parts(
        header: InvoiceHeader,
        issuer: Issuer,
        counterparty: Counterparty,
        lines: Vec<InvoiceLine>,
    ) -> Self {
        let mut invoice = Self {
            id: None,
            tenant_id: header.tenant_id,
            number: header.number,
            uuid: header.uuid,
            issue_date: header.issue_date,
            issue_time: header.issue_time,
            due_date: header.due_date,
            place_of_supply: header.place_of_supply,
            status: header.status,
            order_reference: header.order_reference,
            issuer,
            counterparty,
            bank_details: header.bank_details,
            pdf_path: None,
            xml_path: None,
            xml_content: None,
            created_at: header.created_at,
            lines,
            totals: CachedTotals::default(),
        };
        invoice.recalculate_totals();
        invoice
    }

    /// Lines in insertion order.
    pub fn lines(&self) -> &[InvoiceLine] {
        &self.lines
    }

    /// Totals as cached on the record.
    pub fn cached_totals(&self) -> CachedTotals {
        self.totals
    }

    /// Append a line and recompute totals.
    pub fn add_line(&mut self, line: InvoiceLine) -> Result<(), InvoiceError> {
        let idx = self.lines.len();
        let amounts = validate_line(&line, idx)?;
        if idx >= MAX_LINES {
            return Err(InvoiceError::Builder(format!(
                "invoice cannot have more than {MAX_LINES} line items"
            )));
        }
        check_totals(self.amounts().checked_add_line(&amounts), idx)?;
        self.lines.push(line);
        self.recalculate_totals();
        Ok(())
    }

    /// Remove the line at `index` and recompute totals.
    pub fn remove_line(&mut self, index: usize) -> Option<InvoiceLine> {
        if index >= self.lines.len() {
            return None;
        }
        let removed = self.lines.remove(index);
        self.recalculate_totals();
        Some(removed)
    }

    /// Replace the whole line set and recompute totals.
    pub fn replace_lines(&mut self, lines: Vec<InvoiceLine>) -> Result<(), InvoiceError> {
        validate_lines(&lines)?;
        self.lines = lines;
        self.recalculate_totals();
        Ok(())
    }

    pub fn clear_lines(&mut self) {
        self.lines.clear();
        self.recalculate_totals();
    }

    /// Recompute the cached totals from the current lines.
    ///
    /// This is the only way cached totals change.
    pub fn recalculate_totals(&mut self) -> CachedTotals {
        self.totals = calc::invoice_amounts(&self.lines).into();
        self.totals
    }

    /// Amounts derived from the live lines, ignoring the cache.
    pub fn amounts(&self) -> InvoiceAmounts {
        calc::invoice_amounts(&self.lines)
    }

    /// Whether the cached totals agree with the lines.
    pub fn totals_consistent(&self) -> bool {
        CachedTotals::from(self.amounts()) == self.totals
    }

    /// ISO-8601 issue timestamp: the date, plus the time of day when known.
    pub fn issue_timestamp(&self) -> String {
        match self.issue_time {
            Some(time) => self.issue_date.and_time(time).format("%Y-%m-%dT%H:%M:%S").to_string(),
            None => self.issue_date.format("%Y-%m-%d").to_string(),
        }
    }

    /// Mark the stored document fields as replaced by a fresh XML rendering.
    pub(crate) fn set_xml_artifact(&mut self, path: ArtifactPath, xml: String) {
        self.xml_path = Some(path);
        self.xml_content = Some(xml);
    }
}

/// Header fields collected by the builder.
pub(crate) struct InvoiceHeader {
    pub tenant_id: u32,
    pub number: String,
    pub uuid: Uuid,
    pub issue_date: NaiveDate,
    pub issue_time: Option<NaiveTime>,
    pub due_date: Option<NaiveDate>,
    pub place_of_supply: Emirate,
    pub status: InvoiceStatus,
    pub order_reference: Option<String>,
    pub bank_details: Option<BankDetailsOverride>,
    pub created_at: DateTime<Utc>,
}

pub(crate) fn validate_lines(lines: &[InvoiceLine]) -> Result<(), InvoiceError> {
    if lines.len() > MAX_LINES {
        return Err(InvoiceError::Builder(format!(
            "invoice cannot have more than {MAX_LINES} line items"
        )));
    }
    lines
        .iter()
        .enumerate()
        .try_fold(InvoiceAmounts::default(), |totals, (idx, line)| {
            let amounts = validate_line(line, idx)?;
            check_totals(totals.checked_add_line(&amounts), idx)
        })
        .map(|_| ())
}

fn overflow(idx: usize, what: &str) -> InvoiceError {
    InvoiceError::Builder(format!("line {}: {what} exceeds the representable amount range", idx + 1))
}

/// Reject a line whose figures cannot be computed or printed with two decimals.
fn validate_line(line: &InvoiceLine, idx: usize) -> Result<calc::LineAmounts, InvoiceError> {
    if line.quantity < Decimal::ZERO {
        return Err(InvoiceError::Builder(format!(
            "line {}: quantity must not be negative",
            idx + 1
        )));
    }
    if line.vat_rate < Decimal::ZERO {
        return Err(InvoiceError::Builder(format!(
            "line {}: VAT rate must not be negative",
            idx + 1
        )));
    }
    let percent = line.vat_rate.checked_mul(Decimal::ONE_HUNDRED);
    if !percent.is_some_and(fits_2dp) {
        return Err(overflow(idx, "VAT rate"));
    }
    if !fits_2dp(line.quantity) || !fits_2dp(line.unit_price) {
        return Err(overflow(idx, "quantity or unit price"));
    }
    calc::checked_line_amounts(line)
        .filter(|a| [a.net, a.vat, a.gross].into_iter().all(fits_2dp))
        .ok_or_else(|| overflow(idx, "line amount"))
}

/// Running totals after line `idx`.
fn check_totals(totals: Option<InvoiceAmounts>, idx: usize) -> Result<InvoiceAmounts, InvoiceError> {
    totals
        .filter(|t| [t.subtotal, t.total_vat, t.grand_total].into_iter().all(fits_2dp))
        .ok_or_else(|| overflow(idx, "invoice total"))
}

/// Stored records pass the same checks as lines added in-process.
fn deserialize_lines<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<InvoiceLine>, D::Error> {
    let lines = Vec::<InvoiceLine>::deserialize(deserializer)?;
    validate_lines(&lines).map_err(serde::de::Error::custom)?;
    Ok(lines)
}
