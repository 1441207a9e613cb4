use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while building an invoice or synthesising its documents.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum InvoiceError {
    /// Builder encountered invalid or missing input.
    #[error("builder error: {0}")]
    Builder(String),

    /// Invoice number allocation failed.
    #[error("numbering error: {0}")]
    Numbering(String),

    /// Fatoora payload could not be produced.
    #[error("QR error: {0}")]
    Qr(#[from] QrError),

    /// XML generation error.
    #[error("XML error: {0}")]
    Xml(String),

    /// PDF layout or serialisation error.
    #[error("PDF error: {0}")]
    Pdf(String),

    /// JSON export error.
    #[error("JSON error: {0}")]
    Json(String),

    /// Document settings could not be loaded.
    #[error("settings error: {0}")]
    Settings(String),
}

/// Errors raised by the Fatoora TLV codec and the barcode renderer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum QrError {
    /// A field does not fit the single length byte of its TLV record.
    #[error("TLV field {tag} is {len} bytes long, the limit is 255")]
    FieldTooLong { tag: u8, len: usize },

    /// Payload is not valid base64 or not a well-formed TLV sequence.
    #[error("malformed Fatoora payload: {0}")]
    Malformed(String),

    /// Barcode rendering or PNG encoding failed.
    #[error("barcode image error: {0}")]
    Image(String),
}

/// Errors raised while persisting rendered artifacts.
///
/// Kept separate from [`InvoiceError`] so a failed write can be retried
/// with the already rendered payload.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    /// The underlying file operation failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No artifact is stored under the requested path.
    #[error("artifact not found: {0}")]
    NotFound(String),

    /// A stored path does not follow the `tenant_NNNN/invoice_<uuid>.<ext>` layout.
    #[error("invalid artifact path: {0}")]
    InvalidPath(String),
}

impl StorageError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
