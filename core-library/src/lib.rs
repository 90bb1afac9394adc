//! # Document Library Module
//!
//! Owns the harvested document model and everything that works on it without
//! talking to the network:
//!
//! - [`DocumentDescriptor`](models::DocumentDescriptor) - one discovered remote file
//! - [`sanitize_filename`](sanitize::sanitize_filename) - filesystem-safe names
//! - Metadata snapshots: JSON save/load so scans can be reused
//! - Summary statistics and human-readable sizes
//! - Extension-based MIME lookup for ingestion

pub mod error;
pub mod mime;
pub mod models;
pub mod sanitize;
pub mod snapshot;
pub mod summary;

pub use error::{LibraryError, Result};
pub use mime::mime_type_for_path;
pub use models::{DocumentDescriptor, ItemKey};
pub use sanitize::{sanitize_filename, sanitize_folder_path};
pub use snapshot::{load_snapshot, save_snapshot, MetadataSnapshot, DEFAULT_SNAPSHOT_FILE};
pub use summary::{format_file_size, DocumentSummary, LibraryStats};
