use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use uuid::Uuid;

use super::error::InvoiceError;
use super::region::Emirate;
use super::types::*;

/// Builder for invoice aggregates.
///
/// ```
/// use chrono::NaiveDate;
/// use clearinvoice::core::*;
/// use rust_decimal_macros::dec;
///
/// let invoice = InvoiceBuilder::new(7, NaiveDate::from_ymd_opt(2024, 6, 15).unwrap())
///     .issuer(IssuerBuilder::new("Acme Trading LLC").trn("100000000000003").emirate(Emirate::Dubai).build())
///     .counterparty(CounterpartyBuilder::new("Client FZE").build())
///     .add_line(InvoiceLine::new("Consulting", dec!(10), dec!(150)))
///     .build()
///     .unwrap();
///
/// assert_eq!(invoice.amounts().grand_total, dec!(1575.00));
/// assert_eq!(invoice.place_of_supply, Emirate::Dubai);
/// ```
pub struct InvoiceBuilder {
    tenant_id: u32,
    number: String,
    uuid: Option<Uuid>,
    issue_date: NaiveDate,
    issue_time: Option<NaiveTime>,
    due_date: Option<NaiveDate>,
    place_of_supply: Option<Emirate>,
    status: InvoiceStatus,
    order_reference: Option<String>,
    issuer: Option<Issuer>,
    counterparty: Option<Counterparty>,
    lines: Vec<InvoiceLine>,
    bank_details: Option<BankDetailsOverride>,
    created_at: Option<DateTime<Utc>>,
}

impl InvoiceBuilder {
    pub fn new(tenant_id: u32, issue_date: NaiveDate) -> Self {
        Self {
            tenant_id,
            number: String::new(),
            uuid: None,
            issue_date,
            issue_time: None,
            due_date: None,
            place_of_supply: None,
            status: InvoiceStatus::Draft,
            order_reference: None,
            issuer: None,
            counterparty: None,
            lines: Vec::new(),
            bank_details: None,
            created_at: None,
        }
    }

    /// Explicit invoice number; leave unset to allocate one on first save.
    pub fn number(mut self, number: impl Into<String>) -> Self {
        self.number = number.into();
        self
    }

    /// Fixed UUID (e.g. when rehydrating); a v4 UUID is generated otherwise.
    pub fn uuid(mut self, uuid: Uuid) -> Self {
        self.uuid = Some(uuid);
        self
    }

    pub fn issue_time(mut self, time: NaiveTime) -> Self {
        self.issue_time = Some(time);
        self
    }

    pub fn due_date(mut self, date: NaiveDate) -> Self {
        self.due_date = Some(date);
        self
    }

    /// Place of supply; defaults to the issuer's emirate.
    pub fn place_of_supply(mut self, emirate: Emirate) -> Self {
        self.place_of_supply = Some(emirate);
        self
    }

    pub fn status(mut self, status: InvoiceStatus) -> Self {
        self.status = status;
        self
    }

    pub fn order_reference(mut self, reference: impl Into<String>) -> Self {
        self.order_reference = Some(reference.into());
        self
    }

    pub fn issuer(mut self, issuer: Issuer) -> Self {
        self.issuer = Some(issuer);
        self
    }

    pub fn counterparty(mut self, counterparty: Counterparty) -> Self {
        self.counterparty = Some(counterparty);
        self
    }

    pub fn add_line(mut self, line: InvoiceLine) -> Self {
        self.lines.push(line);
        self
    }

    pub fn bank_details(mut self, details: BankDetailsOverride) -> Self {
        self.bank_details = Some(details);
        self
    }

    pub fn created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = Some(at);
        self
    }

    /// Build the invoice and compute its totals.
    ///
    /// An empty line set is valid and yields zero totals.
    pub fn build(self) -> Result<Invoice, InvoiceError> {
        let issuer = self
            .issuer
            .ok_or_else(|| InvoiceError::Builder("issuer is required".into()))?;
        let counterparty = self
            .counterparty
            .ok_or_else(|| InvoiceError::Builder("counterparty is required".into()))?;

        if self.number.len() > 200 {
            return Err(InvoiceError::Builder(
                "invoice number cannot exceed 200 characters".into(),
            ));
        }
        if let Some(due) = self.due_date {
            if due < self.issue_date {
                return Err(InvoiceError::Builder(format!(
                    "due date {due} is before issue date {}",
                    self.issue_date
                )));
            }
        }
        validate_lines(&self.lines)?;

        let place_of_supply = self.place_of_supply.unwrap_or_else(|| issuer.region());
        let header = InvoiceHeader {
            tenant_id: self.tenant_id,
            number: self.number,
            uuid: self.uuid.unwrap_or_else(Uuid::new_v4),
            issue_date: self.issue_date,
            issue_time: self.issue_time,
            due_date: self.due_date,
            place_of_supply,
            status: self.status,
            order_reference: self.order_reference,
            bank_details: self.bank_details,
            created_at: self.created_at.unwrap_or_else(Utc::now),
        };
        Ok(Invoice::from_parts(header, issuer, counterparty, self.lines))
    }
}

/// Builder for the issuing company.
pub struct IssuerBuilder {
    issuer: Issuer,
}

impl IssuerBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            issuer: Issuer {
                name: name.into(),
                ..Default::default()
            },
        }
    }

    pub fn trn(mut self, trn: impl Into<String>) -> Self {
        self.issuer.trn = Some(trn.into());
        self
    }

    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.issuer.address = Some(address.into());
        self
    }

    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.issuer.email = Some(email.into());
        self
    }

    pub fn phone(mut self, phone: impl Into<String>) -> Self {
        self.issuer.phone = Some(phone.into());
        self
    }

    pub fn emirate(mut self, emirate: Emirate) -> Self {
        self.issuer.emirate = Some(emirate);
        self
    }

    pub fn bank_details(mut self, details: BankDetails) -> Self {
        self.issuer.bank_details = Some(details);
        self
    }

    pub fn build(self) -> Issuer {
        self.issuer
    }
}

/// Builder for the invoiced client.
pub struct CounterpartyBuilder {
    counterparty: Counterparty,
}

impl CounterpartyBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            counterparty: Counterparty {
                name: name.into(),
                ..Default::default()
            },
        }
    }

    pub fn trn(mut self, trn: impl Into<String>) -> Self {
        self.counterparty.trn = Some(trn.into());
        self
    }

    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.counterparty.address = Some(address.into());
        self
    }

    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.counterparty.email = Some(email.into());
        self
    }

    pub fn phone(mut self, phone: impl Into<String>) -> Self {
        self.counterparty.phone = Some(phone.into());
        self
    }

    pub fn build(self) -> Counterparty {
        self.counterparty
    }
}
