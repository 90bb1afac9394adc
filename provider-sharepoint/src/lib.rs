//! # SharePoint Provider
//!
//! Microsoft Graph access for SharePoint Online document libraries.
//!
//! ## Overview
//!
//! This module provides:
//! - Site resolution from a site URL, with retry on transient failures
//! - Site info, drive listing, item metadata and the signed-in user
//! - The tree enumerator: a paced, paginated walk over every library that
//!   yields [`DocumentDescriptor`](core_library::DocumentDescriptor)s
//! - A connection test combining the above

pub mod connector;
pub mod enumerator;
pub mod error;
pub mod types;

pub use connector::{content_url, GraphConnector, GRAPH_API_BASE, METADATA_TIMEOUT};
pub use enumerator::{is_skipped_folder, ScanPacing, TreeEnumerator};
pub use error::{Result, SharePointError};
pub use types::{ConnectionReport, DriveItem, GraphDrive, GraphSite, GraphUser, SiteAddress};
