use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use uuid::Uuid;

use super::error::InvoiceError;
use super::types::Invoice;

/// Source of the number of invoices already persisted for a tenant.
pub trait InvoiceCounter {
    fn count_for_tenant(&self, tenant_id: u32) -> Result<u64, InvoiceError>;
}

impl<F> InvoiceCounter for F
where
    F: Fn(u32) -> Result<u64, InvoiceError>,
{
    fn count_for_tenant(&self, tenant_id: u32) -> Result<u64, InvoiceError> {
        self(tenant_id)
    }
}

/// `INV-{tenant:04}-{sequence:04}`, e.g. "INV-0007-0012".
pub fn format_invoice_number(tenant_id: u32, sequence: u64) -> String {
    format!("INV-{tenant_id:04}-{sequence:04}")
}

/// `INV-` followed by the first 8 hex digits of the invoice UUID, uppercased.
///
/// Unique per invoice because the UUID is.
pub fn fallback_invoice_number(uuid: &Uuid) -> String {
    let simple = uuid.simple().to_string();
    format!("INV-{}", simple[..8].to_uppercase())
}

/// Per-tenant invoice number allocator.
///
/// The next sequence is `max(persisted count, last number issued here) + 1`,
/// computed and recorded inside one critical section so concurrent callers
/// sharing an allocator never receive the same number. Callers running in
/// several processes still need a database-side sequence behind
/// [`InvoiceCounter`].
///
/// The map is written only after the counter returns; a lock poisoned by a
/// panicking counter is recovered.
pub struct InvoiceNumberAllocator<C> {
    counter: C,
    issued: Mutex<HashMap<u32, u64>>,
}

impl<C: InvoiceCounter> InvoiceNumberAllocator<C> {
    pub fn new(counter: C) -> Self {
        Self {
            counter,
            issued: Mutex::new(HashMap::new()),
        }
    }

    /// Allocate the next number for `tenant_id`, falling back to the
    /// UUID-derived form when the sequence cannot be determined.
    pub fn allocate_number(&self, tenant_id: u32, invoice_uuid: &Uuid) -> String {
        match self.next_sequence(tenant_id) {
            Ok(seq) => format_invoice_number(tenant_id, seq),
            Err(e) => {
                let number = fallback_invoice_number(invoice_uuid);
                tracing::warn!(tenant_id, error = %e, number = %number, "invoice sequence unavailable, using UUID-derived number");
                number
            }
        }
    }

    /// Try the sequential path only.
    pub fn next_sequence(&self, tenant_id: u32) -> Result<u64, InvoiceError> {
        let mut issued = self.issued.lock().unwrap_or_else(PoisonError::into_inner);
        let persisted = self.counter.count_for_tenant(tenant_id)?;
        let last = issued.get(&tenant_id).copied().unwrap_or(0);
        let next = persisted
            .max(last)
            .checked_add(1)
            .ok_or_else(|| InvoiceError::Numbering(format!("sequence overflow for tenant {tenant_id}")))?;
        issued.insert(tenant_id, next);
        Ok(next)
    }

    /// Preview the next number without consuming it.
    pub fn peek(&self, tenant_id: u32) -> Result<String, InvoiceError> {
        let issued = self.issued.lock().unwrap_or_else(PoisonError::into_inner);
        let persisted = self.counter.count_for_tenant(tenant_id)?;
        let last = issued.get(&tenant_id).copied().unwrap_or(0);
        Ok(format_invoice_number(tenant_id, persisted.max(last) + 1))
    }
}

impl Invoice {
    /// Assign a number from `allocator` unless one is already set.
    ///
    /// Returns whether a number was allocated.
    pub fn ensure_number<C: InvoiceCounter>(&mut self, allocator: &InvoiceNumberAllocator<C>) -> bool {
        if !self.number.trim().is_empty() {
            return false;
        }
        self.number = allocator.allocate_number(self.tenant_id, &self.uuid);
        tracing::debug!(tenant_id = self.tenant_id, number = %self.number, "invoice number allocated");
        true
    }
}
