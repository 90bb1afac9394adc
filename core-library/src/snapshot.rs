//! Metadata snapshot files.
//!
//! A scan can be saved and reloaded later to skip re-enumeration. The file is
//! a JSON object:
//!
//! ```json
//! { "timestamp": "2024-05-01T12:00:00Z", "total_documents": 2, "documents": [ ... ] }
//! ```
//!
//! Loading also accepts a bare array of document records.

use bridge_traits::storage::FileSystemAccess;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

use crate::error::{LibraryError, Result};
use crate::models::DocumentDescriptor;

/// File name used when the caller does not pick one.
pub const DEFAULT_SNAPSHOT_FILE: &str = "sharepoint_documents.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetadataSnapshot {
    pub timestamp: DateTime<Utc>,
    pub total_documents: usize,
    pub documents: Vec<DocumentDescriptor>,
}

impl MetadataSnapshot {
    pub fn new(documents: Vec<DocumentDescriptor>, timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            total_documents: documents.len(),
            documents,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SnapshotFile {
    Wrapped { documents: Vec<DocumentDescriptor> },
    Bare(Vec<DocumentDescriptor>),
}

/// Parse snapshot JSON in either the wrapped or the bare-array layout.
pub fn parse_snapshot(json: &str) -> std::result::Result<Vec<DocumentDescriptor>, serde_json::Error> {
    let file: SnapshotFile = serde_json::from_str(json)?;
    Ok(match file {
        SnapshotFile::Wrapped { documents } => documents,
        SnapshotFile::Bare(documents) => documents,
    })
}

/// Write `documents` to `path` as a wrapped snapshot stamped with the current time.
pub async fn save_snapshot(
    fs: &dyn FileSystemAccess,
    path: &Path,
    documents: &[DocumentDescriptor],
) -> Result<()> {
    let snapshot = MetadataSnapshot::new(documents.to_vec(), Utc::now());
    let json = snapshot.to_json()?;

    fs.write_file(path, Bytes::from(json)).await?;

    info!(
        path = %path.display(),
        documents = snapshot.total_documents,
        "Saved metadata snapshot"
    );
    Ok(())
}

/// Read a snapshot written by [`save_snapshot`] or by older tooling.
pub async fn load_snapshot(
    fs: &dyn FileSystemAccess,
    path: &Path,
) -> Result<Vec<DocumentDescriptor>> {
    let raw = fs.read_file(path).await?;
    let text = std::str::from_utf8(&raw).map_err(|e| LibraryError::InvalidSnapshot {
        path: path.display().to_string(),
        message: format!("not UTF-8: {}", e),
    })?;

    let documents = parse_snapshot(text).map_err(|e| LibraryError::InvalidSnapshot {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    debug!(path = %path.display(), documents = documents.len(), "Loaded metadata snapshot");
    Ok(documents)
}
