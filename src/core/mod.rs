//! Core invoice types, amount arithmetic, regions and numbering.
//!
//! This module holds the invoice aggregate consumed by every renderer,
//! the line calculator whose figures all documents share, and the
//! per-tenant invoice number allocator.

mod bank;
mod builder;
pub mod calc;
mod error;
pub mod format;
mod numbering;
mod region;
pub mod settings;
mod types;

pub use bank::*;
pub use builder::*;
pub use calc::{InvoiceAmounts, LineAmounts, invoice_amounts, line_amounts};
pub use error::*;
pub use numbering::*;
pub use region::Emirate;
pub use settings::DocumentSettings;
pub use types::*;
