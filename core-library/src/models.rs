//! Harvested document model.
//!
//! [`DocumentDescriptor`] is the single typed record that flows from the tree
//! enumerator to snapshots, summaries and the transfer engine. All defaulting
//! for missing or legacy fields happens in one place, the conversion from the
//! on-disk record shape.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::sanitize::{sanitize_filename, UNKNOWN_FILE};

/// MIME type used when the remote side did not report one.
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// Library name used for records that lack one.
pub const UNKNOWN_LIBRARY: &str = "Unknown";

/// Identity of a remote object: a drive plus an item inside it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemKey {
    pub container_id: String,
    pub item_id: String,
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.container_id, self.item_id)
    }
}

/// One discovered remote file.
///
/// Created during enumeration and never mutated afterwards. The serialized
/// field names match the flat records of the metadata snapshot file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "DescriptorRecord")]
pub struct DocumentDescriptor {
    /// Display name; never empty
    pub name: String,
    /// Sanitized name used for the local file
    pub safe_name: String,
    /// Drive (document library) identifier
    #[serde(rename = "drive_id")]
    pub container_id: String,
    /// Item identifier, unique within the drive
    #[serde(rename = "id")]
    pub item_id: String,
    #[serde(rename = "library")]
    pub library_name: String,
    /// Slash-separated path relative to the drive root, empty for root files
    #[serde(rename = "path")]
    pub folder_path: String,
    #[serde(rename = "size")]
    pub size_bytes: u64,
    #[serde(rename = "created")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "modified")]
    pub modified_at: Option<DateTime<Utc>>,
    pub mime_type: String,
    /// Short-lived pre-authorized URL, valid for about an hour after discovery
    #[serde(rename = "download_url")]
    pub direct_download_url: Option<String>,
    pub web_url: Option<String>,
    /// When the enumerator saw this item; bounds the direct URL's lifetime
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discovered_at: Option<DateTime<Utc>>,
}

impl DocumentDescriptor {
    /// New descriptor with every optional attribute at its default.
    pub fn new(
        name: impl Into<String>,
        container_id: impl Into<String>,
        item_id: impl Into<String>,
    ) -> Self {
        let name = normalize_name(Some(name.into()));
        Self {
            safe_name: sanitize_filename(&name),
            name,
            container_id: container_id.into(),
            item_id: item_id.into(),
            library_name: UNKNOWN_LIBRARY.to_string(),
            folder_path: String::new(),
            size_bytes: 0,
            created_at: None,
            modified_at: None,
            mime_type: DEFAULT_MIME_TYPE.to_string(),
            direct_download_url: None,
            web_url: None,
            discovered_at: None,
        }
    }

    pub fn key(&self) -> ItemKey {
        ItemKey {
            container_id: self.container_id.clone(),
            item_id: self.item_id.clone(),
        }
    }

    /// Both identifiers are present, so a content URL can be built.
    pub fn has_remote_identity(&self) -> bool {
        !self.container_id.is_empty() && !self.item_id.is_empty()
    }

    /// Lowercased extension of the display name, if any.
    pub fn extension(&self) -> Option<String> {
        let (stem, ext) = self.name.rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() {
            return None;
        }
        Some(ext.to_lowercase())
    }

    /// The direct download URL if it was discovered less than `ttl` ago.
    ///
    /// Descriptors without a discovery time (e.g. from older snapshots) never
    /// report a fresh URL.
    pub fn fresh_direct_url(&self, now: DateTime<Utc>, ttl: Duration) -> Option<&str> {
        let url = self.direct_download_url.as_deref().filter(|u| !u.is_empty())?;
        let discovered = self.discovered_at?;
        (now - discovered < ttl).then_some(url)
    }
}

fn normalize_name(name: Option<String>) -> String {
    name.map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| UNKNOWN_FILE.to_string())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_timestamp(value: Option<String>) -> Option<DateTime<Utc>> {
    let raw = non_empty(value)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}

/// On-disk record shape, tolerant of older snapshot files.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DescriptorRecord {
    name: Option<String>,
    safe_name: Option<String>,
    drive_id: Option<String>,
    id: Option<String>,
    unique_id: Option<String>,
    library: Option<String>,
    path: Option<String>,
    size: Option<u64>,
    created: Option<String>,
    modified: Option<String>,
    mime_type: Option<String>,
    download_url: Option<String>,
    web_url: Option<String>,
    discovered_at: Option<String>,
}

impl From<DescriptorRecord> for DocumentDescriptor {
    fn from(record: DescriptorRecord) -> Self {
        let name = normalize_name(record.name);
        // Stored names are untrusted; re-sanitizing is a no-op for clean ones
        let stored = non_empty(record.safe_name).unwrap_or_else(|| name.clone());
        let safe_name = sanitize_filename(&stored);

        Self {
            safe_name,
            name,
            container_id: record.drive_id.unwrap_or_default(),
            item_id: non_empty(record.id)
                .or_else(|| non_empty(record.unique_id))
                .unwrap_or_default(),
            library_name: non_empty(record.library)
                .unwrap_or_else(|| UNKNOWN_LIBRARY.to_string()),
            folder_path: record.path.unwrap_or_default(),
            size_bytes: record.size.unwrap_or(0),
            created_at: parse_timestamp(record.created),
            modified_at: parse_timestamp(record.modified),
            mime_type: non_empty(record.mime_type)
                .unwrap_or_else(|| DEFAULT_MIME_TYPE.to_string()),
            direct_download_url: record.download_url,
            web_url: record.web_url,
            discovered_at: parse_timestamp(record.discovered_at),
        }
    }
}
