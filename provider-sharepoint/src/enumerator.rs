//! Tree Enumerator
//!
//! Walks every document library of a site and collects one
//! [`DocumentDescriptor`] per file.
//!
//! The walk uses an explicit FIFO worklist of pending folders per drive and
//! returns its accumulator by value. Pagination links are followed before
//! the next folder is taken from the worklist. A fixed pacing delay separates
//! consecutive listing calls and consecutive drives so the remote side does
//! not throttle the scan.
//!
//! Failure policy:
//! - the site lookup and the drive listing are fatal
//! - a failing folder listing is logged and that folder is abandoned;
//!   siblings and other drives are still scanned
//! - an expired token stops the whole walk

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use core_async::time::pause;
use core_library::models::{DocumentDescriptor, ItemKey};
use core_runtime::logging::LogContext;
use tracing::{debug, info, warn, Instrument};

use crate::connector::GraphConnector;
use crate::error::{Result, SharePointError};
use crate::types::{DriveItem, GraphDrive};

/// Folder names that hold list plumbing rather than documents.
pub const SYSTEM_FOLDERS: [&str; 1] = ["Forms"];

/// Whether a folder is skipped: system folders and names starting with `_`.
pub fn is_skipped_folder(name: &str) -> bool {
    name.starts_with('_') || SYSTEM_FOLDERS.contains(&name)
}

/// Delays between remote calls during a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanPacing {
    /// Between two folder listing calls (including next pages)
    pub between_requests: Duration,
    /// Between finishing one drive and starting the next
    pub between_drives: Duration,
}

impl ScanPacing {
    /// No delays at all, for tests and mocked collaborators.
    pub fn none() -> Self {
        Self {
            between_requests: Duration::ZERO,
            between_drives: Duration::ZERO,
        }
    }
}

impl Default for ScanPacing {
    fn default() -> Self {
        Self {
            between_requests: Duration::from_millis(500),
            between_drives: Duration::from_secs(1),
        }
    }
}

#[derive(Debug)]
struct PendingFolder {
    /// `None` for the drive root
    item_id: Option<String>,
    path: String,
}

pub struct TreeEnumerator {
    connector: Arc<GraphConnector>,
    pacing: ScanPacing,
    log: LogContext,
}

impl TreeEnumerator {
    pub fn new(connector: Arc<GraphConnector>, log: LogContext) -> Self {
        Self {
            connector,
            pacing: ScanPacing::default(),
            log: log.component("enumerator"),
        }
    }

    pub fn with_pacing(mut self, pacing: ScanPacing) -> Self {
        self.pacing = pacing;
        self
    }

    /// Resolve `site_url` and enumerate all of its documents.
    pub async fn enumerate(&self, site_url: &str) -> Result<Vec<DocumentDescriptor>> {
        let site = self.connector.resolve_site(site_url).await?;
        self.enumerate_site(&site.id).await
    }

    /// Enumerate all documents of an already resolved site.
    ///
    /// The order of the result follows the order Graph returned items in;
    /// callers must not rely on it.
    pub async fn enumerate_site(&self, site_id: &str) -> Result<Vec<DocumentDescriptor>> {
        let span = self.log.operation("enumerate");
        async {
            info!("Scanning for documents");
            let drives = self.connector.list_drives(site_id).await?;

            let mut documents = Vec::new();
            for (index, drive) in drives.iter().enumerate() {
                if index > 0 {
                    pause(self.pacing.between_drives).await;
                }
                info!(library = drive.library_name(), "Scanning library");
                let found = match self.scan_drive(drive).await {
                    Ok(found) => found,
                    Err(e) => {
                        warn!(
                            library = drive.library_name(),
                            discarded = documents.len(),
                            error = %e,
                            "Scan aborted, dropping documents collected so far"
                        );
                        return Err(e);
                    }
                };
                info!(
                    library = drive.library_name(),
                    count = found.len(),
                    "Finished library"
                );
                documents.extend(found);
            }

            info!(count = documents.len(), "Found documents");
            Ok(documents)
        }
        .instrument(span)
        .await
    }

    async fn scan_drive(&self, drive: &GraphDrive) -> Result<Vec<DocumentDescriptor>> {
        let mut pending = VecDeque::from([PendingFolder {
            item_id: None,
            path: String::new(),
        }]);
        let mut documents = Vec::new();
        let mut seen: HashSet<ItemKey> = HashSet::new();
        let mut first_request = true;

        while let Some(folder) = pending.pop_front() {
            let mut next_url = Some(
                self.connector
                    .children_url(&drive.id, folder.item_id.as_deref()),
            );

            while let Some(url) = next_url.take() {
                if !first_request {
                    pause(self.pacing.between_requests).await;
                }
                first_request = false;

                let page = match self.connector.list_children(&url).await {
                    Ok(page) => page,
                    Err(SharePointError::TokenExpired) => return Err(SharePointError::TokenExpired),
                    Err(e) => {
                        warn!(
                            library = drive.library_name(),
                            folder = %folder.path,
                            status = ?e.status(),
                            error = %e,
                            "Failed to scan folder, skipping it"
                        );
                        break;
                    }
                };

                for item in page.value {
                    self.classify(drive, &folder, item, &mut pending, &mut documents, &mut seen);
                }
                next_url = page.next_link;
            }
        }

        Ok(documents)
    }

    fn classify(
        &self,
        drive: &GraphDrive,
        parent: &PendingFolder,
        item: DriveItem,
        pending: &mut VecDeque<PendingFolder>,
        documents: &mut Vec<DocumentDescriptor>,
        seen: &mut HashSet<ItemKey>,
    ) {
        let name = item.name_or_empty();

        if item.is_folder() {
            if is_skipped_folder(name) {
                debug!(folder = %name, "Skipping system folder");
                return;
            }
            let path = if parent.path.is_empty() {
                name.to_string()
            } else {
                format!("{}/{}", parent.path, name)
            };
            pending.push_back(PendingFolder {
                item_id: Some(item.id.clone()),
                path,
            });
        } else if item.is_file() {
            let doc = item.to_descriptor(drive, &parent.path, Utc::now());
            if seen.insert(doc.key()) {
                documents.push(doc);
            } else {
                debug!(item = %doc.key(), "Ignoring duplicate item");
            }
        } else {
            debug!(item = %name, "Ignoring item that is neither file nor folder");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skip_rule() {
        assert!(is_skipped_folder("Forms"));
        assert!(is_skipped_folder("_catalogs"));
        assert!(is_skipped_folder("_"));
        assert!(!is_skipped_folder("Reports"));
        assert!(!is_skipped_folder("forms"));
        assert!(!is_skipped_folder("My_Forms"));
    }

    #[test]
    fn test_default_pacing() {
        let pacing = ScanPacing::default();
        assert_eq!(pacing.between_requests, Duration::from_millis(500));
        assert_eq!(pacing.between_drives, Duration::from_secs(1));
        assert_eq!(ScanPacing::none().between_requests, Duration::ZERO);
    }
}
