//! Render boundary and artifact regeneration.
//!
//! [`render_pdf`] and [`render_xml`] never return an error or unwind: any
//! failure inside a renderer becomes [`RenderOutcome::Failed`] and is
//! logged. [`regenerate_documents`] renders both documents, stores them and
//! keeps the rendered payload of any write that failed so it can be retried
//! without rendering again.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use crate::core::{DocumentSettings, Invoice, InvoiceError, StorageError};
use crate::storage::{ArtifactKind, ArtifactPath, ArtifactStore};

/// Result of a render attempt at the boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderOutcome<T> {
    Rendered(T),
    Failed { reason: String },
}

impl<T> RenderOutcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Rendered(_))
    }

    pub fn payload(&self) -> Option<&T> {
        match self {
            Self::Rendered(payload) => Some(payload),
            Self::Failed { .. } => None,
        }
    }

    pub fn into_payload(self) -> Option<T> {
        match self {
            Self::Rendered(payload) => Some(payload),
            Self::Failed { .. } => None,
        }
    }

    /// `(success, payload)`; the payload is `None` on failure.
    pub fn into_parts(self) -> (bool, Option<T>) {
        let success = self.is_success();
        (success, self.into_payload())
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "renderer panicked".to_string())
}

fn guarded<T>(
    kind: ArtifactKind,
    invoice: &Invoice,
    render: impl FnOnce() -> Result<T, InvoiceError>,
) -> RenderOutcome<T> {
    let reason = match panic::catch_unwind(AssertUnwindSafe(render)) {
        Ok(Ok(payload)) => return RenderOutcome::Rendered(payload),
        Ok(Err(e)) => e.to_string(),
        Err(payload) => format!("panic: {}", panic_message(payload.as_ref())),
    };
    tracing::error!(
        invoice = %invoice.number,
        uuid = %invoice.uuid,
        kind = ?kind,
        reason = %reason,
        "document rendering failed"
    );
    RenderOutcome::Failed { reason }
}

/// Render the PDF, catching every failure.
#[tracing::instrument(skip_all, fields(invoice = %invoice.number))]
pub fn render_pdf(invoice: &Invoice, settings: &DocumentSettings) -> RenderOutcome<Vec<u8>> {
    guarded(ArtifactKind::Pdf, invoice, || crate::pdf::to_pdf(invoice, settings))
}

/// Render the UBL XML, catching every failure.
#[tracing::instrument(skip_all, fields(invoice = %invoice.number))]
pub fn render_xml(invoice: &Invoice, settings: &DocumentSettings) -> RenderOutcome<String> {
    guarded(ArtifactKind::Xml, invoice, || crate::ubl::to_ubl_xml(invoice, settings))
}

/// A rendered document awaiting storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactPayload {
    Pdf(Vec<u8>),
    Xml(String),
}

impl ArtifactPayload {
    pub fn kind(&self) -> ArtifactKind {
        match self {
            Self::Pdf(_) => ArtifactKind::Pdf,
            Self::Xml(_) => ArtifactKind::Xml,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Pdf(bytes) => bytes,
            Self::Xml(xml) => xml.as_bytes(),
        }
    }
}

/// What happened to one artifact during regeneration.
#[derive(Debug)]
pub enum ArtifactStatus {
    /// Rendered and written; the invoice now points at `path`.
    Stored(ArtifactPath),
    /// Rendering failed; the invoice's previous artifact fields are unchanged.
    RenderFailed { reason: String },
    /// Rendered but not written. The payload is kept for [`RegenerationReport::retry_storage`].
    StorageFailed {
        path: ArtifactPath,
        payload: ArtifactPayload,
        error: StorageError,
    },
}

impl ArtifactStatus {
    pub fn is_stored(&self) -> bool {
        matches!(self, Self::Stored(_))
    }
}

/// Per-artifact results of [`regenerate_documents`].
#[derive(Debug)]
pub struct RegenerationReport {
    pub pdf: ArtifactStatus,
    pub xml: ArtifactStatus,
}

impl RegenerationReport {
    /// Both artifacts rendered and stored.
    pub fn is_complete(&self) -> bool {
        self.pdf.is_stored() && self.xml.is_stored()
    }

    /// Write again every artifact whose storage failed, reusing its payload.
    ///
    /// Returns whether all artifacts are now stored.
    pub fn retry_storage(&mut self, invoice: &mut Invoice, store: &impl ArtifactStore) -> bool {
        for status in [&mut self.pdf, &mut self.xml] {
            retry_one(status, invoice, store);
        }
        self.is_complete()
    }
}

fn retry_one(status: &mut ArtifactStatus, invoice: &mut Invoice, store: &impl ArtifactStore) {
    let pending = std::mem::replace(status, ArtifactStatus::RenderFailed { reason: String::new() });
    *status = match pending {
        ArtifactStatus::StorageFailed { path, payload, .. } => persist(invoice, store, path, payload),
        settled => settled,
    };
}

fn persist(
    invoice: &mut Invoice,
    store: &impl ArtifactStore,
    path: ArtifactPath,
    payload: ArtifactPayload,
) -> ArtifactStatus {
    if let Err(error) = store.put(&path, payload.as_bytes()) {
        tracing::warn!(path = %path, error = %error, "artifact write failed, payload retained for retry");
        return ArtifactStatus::StorageFailed {
            path,
            payload,
            error,
        };
    }
    match payload {
        ArtifactPayload::Pdf(_) => invoice.pdf_path = Some(path.clone()),
        ArtifactPayload::Xml(xml) => invoice.set_xml_artifact(path.clone(), xml),
    }
    ArtifactStatus::Stored(path)
}

fn store_rendered(invoice: &mut Invoice, store: &impl ArtifactStore, payload: ArtifactPayload) -> ArtifactStatus {
    let path = ArtifactPath::for_invoice(invoice.tenant_id, &invoice.uuid, payload.kind());
    persist(invoice, store, path, payload)
}

/// Render both documents, store them and point the invoice at them.
///
/// A document that fails to render leaves the matching invoice fields as
/// they were. A document that renders but cannot be written reports
/// [`ArtifactStatus::StorageFailed`] with the payload attached.
pub fn regenerate_documents(
    invoice: &mut Invoice,
    store: &impl ArtifactStore,
    settings: &DocumentSettings,
) -> RegenerationReport {
    let pdf = match render_pdf(invoice, settings) {
        RenderOutcome::Rendered(bytes) => store_rendered(invoice, store, ArtifactPayload::Pdf(bytes)),
        RenderOutcome::Failed { reason } => ArtifactStatus::RenderFailed { reason },
    };
    let xml = match render_xml(invoice, settings) {
        RenderOutcome::Rendered(xml) => store_rendered(invoice, store, ArtifactPayload::Xml(xml)),
        RenderOutcome::Failed { reason } => ArtifactStatus::RenderFailed { reason },
    };

    let report = RegenerationReport { pdf, xml };
    tracing::info!(
        invoice = %invoice.number,
        pdf_stored = report.pdf.is_stored(),
        xml_stored = report.xml.is_stored(),
        "invoice documents regenerated"
    );
    report
}
