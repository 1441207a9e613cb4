//! UBL 2.1 invoice XML generation.
//!
//! The output mirrors the UBL 2.1 `Invoice` shape used by UAE access points
//! (PINT-AE style): both parties with emirate-derived postal data, a single
//! standard-rate tax breakdown, per-line tax detail, the Fatoora barcode as
//! an embedded PNG and a signature placeholder. It is not schema-validated.
//!
//! # Example
//!
//! ```no_run
//! use clearinvoice::core::*;
//! use clearinvoice::ubl;
//!
//! let invoice: Invoice = todo!(); // build via InvoiceBuilder
//! let xml = ubl::to_ubl_xml(&invoice, &DocumentSettings::default()).unwrap();
//! ```

mod invoice;
pub(crate) mod xml_writer;

pub use invoice::{qr_attachment, to_ubl_xml};

/// Identifier of the embedded QR document reference.
pub const QR_DOCUMENT_ID: &str = "QR";

/// Identifier of the placeholder signature.
pub const SIGNATURE_ID: &str = "Signature1";

/// UBL 2.1 namespace URIs.
pub mod ubl_ns {
    pub const INVOICE: &str = "urn:oasis:names:specification:ubl:schema:xsd:Invoice-2";
    pub const CAC: &str =
        "urn:oasis:names:specification:ubl:schema:xsd:CommonAggregateComponents-2";
    pub const CBC: &str = "urn:oasis:names:specification:ubl:schema:xsd:CommonBasicComponents-2";
    pub const EXT: &str =
        "urn:oasis:names:specification:ubl:schema:xsd:CommonExtensionComponents-2";
}
