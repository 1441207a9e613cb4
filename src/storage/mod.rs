//! Persistence of rendered documents.
//!
//! Artifacts are partitioned per tenant:
//! `tenant_<tenant:04>/invoice_<uuid>.pdf` and `.xml`.

mod fs;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::StorageError;

pub use fs::FsArtifactStore;

/// Kind of rendered document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArtifactKind {
    Pdf,
    Xml,
}

impl ArtifactKind {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Xml => "xml",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Xml => "application/xml",
        }
    }

    fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "pdf" => Some(Self::Pdf),
            "xml" => Some(Self::Xml),
            _ => None,
        }
    }
}

/// Storage-relative location of one artifact.
///
/// Serialized as its relative path string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ArtifactPath {
    pub tenant_id: u32,
    pub uuid: Uuid,
    pub kind: ArtifactKind,
}

impl ArtifactPath {
    pub fn for_invoice(tenant_id: u32, uuid: &Uuid, kind: ArtifactKind) -> Self {
        Self {
            tenant_id,
            uuid: *uuid,
            kind,
        }
    }

    /// `tenant_0007`
    pub fn directory(&self) -> String {
        format!("tenant_{:04}", self.tenant_id)
    }

    /// `invoice_<uuid>.pdf`
    pub fn file_name(&self) -> String {
        format!("invoice_{}.{}", self.uuid.hyphenated(), self.kind.extension())
    }

    /// `tenant_0007/invoice_<uuid>.pdf`
    pub fn relative(&self) -> String {
        format!("{}/{}", self.directory(), self.file_name())
    }
}

impl fmt::Display for ArtifactPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.relative())
    }
}

impl FromStr for ArtifactPath {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || StorageError::InvalidPath(s.to_string());

        let (dir, file) = s.split_once('/').ok_or_else(invalid)?;
        let tenant_id = dir
            .strip_prefix("tenant_")
            .and_then(|t| t.parse::<u32>().ok())
            .ok_or_else(invalid)?;
        let (stem, ext) = file
            .strip_prefix("invoice_")
            .and_then(|f| f.rsplit_once('.'))
            .ok_or_else(invalid)?;
        let kind = ArtifactKind::from_extension(ext).ok_or_else(invalid)?;
        let uuid = Uuid::parse_str(stem).map_err(|_| invalid())?;

        Ok(Self {
            tenant_id,
            uuid,
            kind,
        })
    }
}

impl TryFrom<String> for ArtifactPath {
    type Error = StorageError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ArtifactPath> for String {
    fn from(path: ArtifactPath) -> Self {
        path.relative()
    }
}

/// Byte store for rendered artifacts.
pub trait ArtifactStore {
    /// Write `bytes` at `path`, replacing any previous artifact.
    fn put(&self, path: &ArtifactPath, bytes: &[u8]) -> Result<(), StorageError>;

    /// Read the artifact at `path`.
    fn get(&self, path: &ArtifactPath) -> Result<Vec<u8>, StorageError>;

    fn exists(&self, path: &ArtifactPath) -> bool {
        self.get(path).is_ok()
    }
}

impl<S: ArtifactStore + ?Sized> ArtifactStore for &S {
    fn put(&self, path: &ArtifactPath, bytes: &[u8]) -> Result<(), StorageError> {
        (**self).put(path, bytes)
    }

    fn get(&self, path: &ArtifactPath) -> Result<Vec<u8>, StorageError> {
        (**self).get(path)
    }

    fn exists(&self, path: &ArtifactPath) -> bool {
        (**self).exists(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uuid() -> Uuid {
        Uuid::parse_str("3f2a9c1e-0b7d-4e8f-9a6b-1c2d3e4f5a6b").unwrap()
    }

    #[test]
    fn tenant_partitioned_layout() {
        let pdf = ArtifactPath::for_invoice(7, &uuid(), ArtifactKind::Pdf);
        assert_eq!(
            pdf.relative(),
            "tenant_0007/invoice_3f2a9c1e-0b7d-4e8f-9a6b-1c2d3e4f5a6b.pdf"
        );
        let xml = ArtifactPath::for_invoice(12345, &uuid(), ArtifactKind::Xml);
        assert_eq!(
            xml.to_string(),
            "tenant_12345/invoice_3f2a9c1e-0b7d-4e8f-9a6b-1c2d3e4f5a6b.xml"
        );
    }

    #[test]
    fn parses_its_own_output() {
        let path = ArtifactPath::for_invoice(3, &uuid(), ArtifactKind::Xml);
        assert_eq!(path.relative().parse::<ArtifactPath>().unwrap(), path);
    }

    #[test]
    fn rejects_foreign_paths() {
        for bad in [
            "invoice.pdf",
            "tenant_x/invoice_3f2a9c1e-0b7d-4e8f-9a6b-1c2d3e4f5a6b.pdf",
            "tenant_0001/invoice_3f2a9c1e-0b7d-4e8f-9a6b-1c2d3e4f5a6b.txt",
            "tenant_0001/receipt_3f2a9c1e-0b7d-4e8f-9a6b-1c2d3e4f5a6b.pdf",
            "tenant_0001/invoice_nope.pdf",
        ] {
            assert!(
                matches!(bad.parse::<ArtifactPath>(), Err(StorageError::InvalidPath(_))),
                "{bad}"
            );
        }
    }

    #[test]
    fn serializes_as_string() {
        let path = ArtifactPath::for_invoice(1, &uuid(), ArtifactKind::Pdf);
        let json = serde_json::to_string(&path).unwrap();
        assert_eq!(
            json,
            "\"tenant_0001/invoice_3f2a9c1e-0b7d-4e8f-9a6b-1c2d3e4f5a6b.pdf\""
        );
        assert_eq!(serde_json::from_str::<ArtifactPath>(&json).unwrap(), path);
    }
}
