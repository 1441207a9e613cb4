//! Jurisdiction and layout constants injected into every renderer.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::types::BankDetails;

/// Document currency (ISO 4217).
pub const CURRENCY_CODE: &str = "AED";
/// Country of both parties (ISO 3166-1 alpha-2).
pub const COUNTRY_CODE: &str = "AE";
/// UNTDID 1001: commercial invoice.
pub const INVOICE_TYPE_CODE: &str = "380";
/// UNECE Rec 20: one (piece).
pub const UNIT_CODE: &str = "C62";
/// UNTDID 4461: credit transfer.
pub const PAYMENT_MEANS_CODE: &str = "30";
/// UNTDID 5305: standard rate.
pub const TAX_CATEGORY: &str = "S";
pub const TAX_SCHEME: &str = "VAT";
pub const CUSTOMIZATION_ID: &str = "OASIS_UBL_INVOICE";
pub const PROFILE_ID: &str = "reporting:1.0";
/// UAE standard VAT rate.
pub const DEFAULT_VAT_RATE: Decimal = dec!(0.05);

pub const FALLBACK_BANK_NAME: &str = "Emirates NBD";
pub const FALLBACK_ACCOUNT_NUMBER: &str = "1234 5678 9012";
pub const FALLBACK_IBAN: &str = "AE00 1234 5678 9012";

/// Constants and boilerplate used while rendering documents.
///
/// `Default` yields the UAE configuration. Deserialization fills any field
/// missing from the source with its default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentSettings {
    pub currency_code: String,
    pub country_code: String,
    pub invoice_type_code: String,
    pub unit_code: String,
    pub payment_means_code: String,
    pub tax_category: String,
    pub tax_scheme: String,
    pub customization_id: String,
    pub profile_id: String,
    /// Percent shown on the document-level tax category when there are no lines.
    pub default_vat_rate: Decimal,
    /// Last tier of the bank-details resolution chain.
    pub fallback_bank: BankDetails,
    pub notes: String,
    pub payment_instruction: String,
    pub compliance_caption: String,
    pub footer_disclaimer: String,
    pub footer_powered_by: String,
    pub producer: String,
}

impl Default for DocumentSettings {
    fn default() -> Self {
        Self {
            currency_code: CURRENCY_CODE.into(),
            country_code: COUNTRY_CODE.into(),
            invoice_type_code: INVOICE_TYPE_CODE.into(),
            unit_code: UNIT_CODE.into(),
            payment_means_code: PAYMENT_MEANS_CODE.into(),
            tax_category: TAX_CATEGORY.into(),
            tax_scheme: TAX_SCHEME.into(),
            customization_id: CUSTOMIZATION_ID.into(),
            profile_id: PROFILE_ID.into(),
            default_vat_rate: DEFAULT_VAT_RATE,
            fallback_bank: BankDetails {
                bank_name: FALLBACK_BANK_NAME.into(),
                account_number: FALLBACK_ACCOUNT_NUMBER.into(),
                iban: FALLBACK_IBAN.into(),
            },
            notes: "Thank you for your business. Payment due upon receipt.".into(),
            payment_instruction: "Please transfer to account above.".into(),
            compliance_caption: "Compliant with FTA".into(),
            footer_disclaimer:
                "This is a computer-generated invoice and does not require a signature".into(),
            footer_powered_by: "Powered by ClearInvoice".into(),
            producer: concat!("clearinvoice ", env!("CARGO_PKG_VERSION")).into(),
        }
    }
}

#[cfg(feature = "settings")]
impl DocumentSettings {
    /// Environment variable prefix, e.g. `CLEARINVOICE__CURRENCY_CODE`.
    pub const ENV_PREFIX: &'static str = "CLEARINVOICE";

    /// Layer an optional settings file (any format the `config` crate
    /// detects from the extension) and `CLEARINVOICE__*` environment
    /// variables over the defaults.
    pub fn load(path: Option<&std::path::Path>) -> Result<Self, super::error::InvoiceError> {
        use ::config::{Config, Environment, File};

        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(false));
        }
        let settings = builder
            .add_source(Environment::with_prefix(Self::ENV_PREFIX).separator("__"))
            .build()
            .and_then(|cfg| cfg.try_deserialize::<Self>())
            .map_err(|e| super::error::InvoiceError::Settings(e.to_string()))?;

        tracing::debug!(
            currency = %settings.currency_code,
            country = %settings.country_code,
            "document settings loaded"
        );
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_uae() {
        let s = DocumentSettings::default();
        assert_eq!(s.currency_code, "AED");
        assert_eq!(s.country_code, "AE");
        assert_eq!(s.invoice_type_code, "380");
        assert_eq!(s.fallback_bank.bank_name, "Emirates NBD");
        assert_eq!(s.fallback_bank.account_number, "1234 5678 9012");
        assert_eq!(s.fallback_bank.iban, "AE00 1234 5678 9012");
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let s: DocumentSettings =
            serde_json::from_str(r#"{"currency_code": "SAR", "notes": "Net 30"}"#).unwrap();
        assert_eq!(s.currency_code, "SAR");
        assert_eq!(s.notes, "Net 30");
        assert_eq!(s.country_code, "AE");
        assert_eq!(s.unit_code, "C62");
    }

    #[cfg(feature = "settings")]
    #[test]
    fn load_reads_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("documents.toml");
        std::fs::write(&path, "payment_means_code = \"42\"\n").unwrap();

        let s = DocumentSettings::load(Some(&path)).unwrap();
        assert_eq!(s.payment_means_code, "42");
        assert_eq!(s.currency_code, "AED");
    }

    #[cfg(feature = "settings")]
    #[test]
    fn load_without_file_returns_defaults() {
        let s = DocumentSettings::load(None).unwrap();
        assert_eq!(s.invoice_type_code, "380");
    }
}
