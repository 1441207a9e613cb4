use super::settings::DocumentSettings;
use super::types::{BankDetails, Invoice};

/// Which tier of the resolution chain supplied the bank details.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BankDetailsSource {
    /// Override stored on the invoice itself.
    Invoice,
    /// Issuer's stored default account.
    Issuer,
    /// System fallback from the document settings.
    Fallback,
}

/// Resolve the payment details printed on an invoice.
///
/// Order: the invoice's own override (missing fields filled from the system
/// fallback), then the issuer's stored default, then the system fallback.
pub fn resolve_bank_details(
    invoice: &Invoice,
    settings: &DocumentSettings,
) -> (BankDetails, BankDetailsSource) {
    let fallback = &settings.fallback_bank;

    if let Some(ov) = invoice.bank_details.as_ref().filter(|ov| !ov.is_empty()) {
        let pick = |field: &Option<String>, default: &str| {
            field
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .unwrap_or(default)
                .to_string()
        };
        let details = BankDetails {
            bank_name: pick(&ov.bank_name, &fallback.bank_name),
            account_number: pick(&ov.account_number, &fallback.account_number),
            iban: pick(&ov.iban, &fallback.iban),
        };
        return (details, BankDetailsSource::Invoice);
    }

    if let Some(stored) = &invoice.issuer.bank_details {
        return (stored.clone(), BankDetailsSource::Issuer);
    }

    (fallback.clone(), BankDetailsSource::Fallback)
}
