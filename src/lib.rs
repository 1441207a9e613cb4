//! # clearinvoice
//!
//! UAE VAT tax-invoice synthesis. One invoice aggregate goes in; a PDF, a
//! UBL 2.1 XML document and a Fatoora TLV QR payload come out, all agreeing
//! on every amount.
//!
//! All monetary values use [`rust_decimal::Decimal`] and every document
//! recomputes its figures from the invoice lines.
//!
//! ## Quick Start
//!
//! ```rust
//! use chrono::NaiveDate;
//! use clearinvoice::core::*;
//! use rust_decimal_macros::dec;
//!
//! let invoice = InvoiceBuilder::new(7, NaiveDate::from_ymd_opt(2024, 6, 15).unwrap())
//!     .number("INV-0007-0001")
//!     .issuer(IssuerBuilder::new("Acme Trading LLC").trn("100000000000003").emirate(Emirate::Dubai).build())
//!     .counterparty(CounterpartyBuilder::new("Client FZE").build())
//!     .add_line(InvoiceLine::new("Consulting", dec!(10), dec!(150)))
//!     .build()
//!     .unwrap();
//!
//! let amounts = invoice.amounts();
//! assert_eq!(amounts.grand_total, dec!(1575.00));
//!
//! let payload = clearinvoice::qr::encode_fatoora(&clearinvoice::qr::FatooraFields::for_invoice(&invoice)).unwrap();
//! let records = clearinvoice::qr::decode_fatoora(&payload).unwrap();
//! assert_eq!(records[3].value, "1575.00");
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `core` (default) | Invoice types, line calculator, regions, numbering, Fatoora TLV, artifact storage |
//! | `qr-image` | Fatoora barcode as PNG or grayscale bitmap |
//! | `ubl` (default) | UBL 2.1 XML invoice |
//! | `pdf` (default) | Tax-invoice PDF |
//! | `json` (default) | JSON export |
//! | `settings` (default) | Load [`DocumentSettings`] from a file and the environment |
//! | `all` | Everything |
//!
//! With both `pdf` and `ubl` enabled, [`documents`] provides the render
//! boundary and artifact regeneration.

#[cfg(feature = "core")]
pub mod core;

#[cfg(feature = "core")]
pub mod qr;

#[cfg(feature = "core")]
pub mod storage;

#[cfg(feature = "ubl")]
pub mod ubl;

#[cfg(feature = "pdf")]
pub mod pdf;

#[cfg(feature = "json")]
pub mod json;

#[cfg(all(feature = "pdf", feature = "ubl"))]
pub mod documents;

// Re-export core types at crate root for convenience
#[cfg(feature = "core")]
pub use crate::core::*;
