//! # Transfer Engine
//!
//! Downloads one [`DocumentDescriptor`] to a deterministic local path and
//! optionally forwards the file to a knowledge base.
//!
//! ## Layout
//!
//! ```text
//! <root>/<library>/<folder>/<subfolder>/<safe_name>
//! ```
//!
//! Every component is sanitized, so nothing a remote name contains can
//! escape `<root>`.
//!
//! ## Retries
//!
//! Each document gets up to [`RetryPolicy::max_attempts`] attempts with a
//! doubling delay. `401`, `403` and `404` are final on the first attempt.
//! Any other status and any transient network error is retried.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use bridge_traits::http::{HttpClient, HttpRequest, HttpStream, RetryPolicy};
use bridge_traits::ingest::{IngestReceipt, IngestRequest, KnowledgeBaseIngestor};
use bridge_traits::storage::FileSystemAccess;
use chrono::Utc;
use core_async::io::AsyncWriteExt;
use core_async::time::pause;
use core_auth::AccessToken;
use core_library::mime::mime_type_for_path;
use core_library::models::DocumentDescriptor;
use core_library::sanitize::{sanitize_filename, sanitize_folder_path};
use core_runtime::logging::LogContext;
use provider_sharepoint::content_url;
use tracing::{debug, info, warn, Instrument};

use crate::error::{DownloadError, Result};

/// Timeout for a single content request.
pub const CONTENT_TIMEOUT: Duration = Duration::from_secs(60);

/// How long after discovery a direct download URL is still used.
pub const DIRECT_URL_TTL_MINUTES: i64 = 55;

/// `source` attribute attached to every ingested document.
pub const INGEST_SOURCE: &str = "SharePoint";

/// Local path a document is written to under `root`.
pub fn destination_path(doc: &DocumentDescriptor, root: &Path) -> PathBuf {
    let mut path = root.join(sanitize_filename(&doc.library_name));
    for component in sanitize_folder_path(&doc.folder_path) {
        path.push(component);
    }
    path.push(&doc.safe_name);
    path
}

/// Where the bytes of a document come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadSource {
    /// Pre-authorized URL; must be fetched without credentials
    Direct(String),
    /// Graph content endpoint; needs the bearer token
    Content(String),
}

impl DownloadSource {
    pub fn url(&self) -> &str {
        match self {
            DownloadSource::Direct(url) | DownloadSource::Content(url) => url,
        }
    }
}

pub struct TransferEngine {
    http_client: Arc<dyn HttpClient>,
    fs: Arc<dyn FileSystemAccess>,
    token: AccessToken,
    retry: RetryPolicy,
    ingestor: Option<Arc<dyn KnowledgeBaseIngestor>>,
    log: LogContext,
}

impl TransferEngine {
    pub fn new(
        http_client: Arc<dyn HttpClient>,
        fs: Arc<dyn FileSystemAccess>,
        token: AccessToken,
        log: LogContext,
    ) -> Self {
        Self {
            http_client,
            fs,
            token,
            retry: RetryPolicy::default(),
            ingestor: None,
            log: log.component("transfer"),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_ingestor(mut self, ingestor: Arc<dyn KnowledgeBaseIngestor>) -> Self {
        self.ingestor = Some(ingestor);
        self
    }

    pub fn has_ingestor(&self) -> bool {
        self.ingestor.is_some()
    }

    /// Pick the direct URL while it is fresh, the content endpoint otherwise.
    pub fn resolve_source(&self, doc: &DocumentDescriptor) -> Result<DownloadSource> {
        let ttl = chrono::Duration::minutes(DIRECT_URL_TTL_MINUTES);
        if let Some(url) = doc.fresh_direct_url(Utc::now(), ttl) {
            return Ok(DownloadSource::Direct(url.to_string()));
        }
        if doc.has_remote_identity() {
            return Ok(DownloadSource::Content(content_url(
                &doc.container_id,
                &doc.item_id,
            )));
        }
        Err(DownloadError::MissingIdentifiers {
            name: doc.name.clone(),
        })
    }

    fn build_request(&self, doc: &DocumentDescriptor, source: &DownloadSource) -> Result<HttpRequest> {
        let request = HttpRequest::get(source.url()).timeout(CONTENT_TIMEOUT);
        match source {
            DownloadSource::Direct(_) => Ok(request),
            DownloadSource::Content(_) => {
                if self.token.is_expired() {
                    return Err(DownloadError::AuthExpired {
                        name: doc.name.clone(),
                    });
                }
                Ok(request
                    .authorization(self.token.authorization_header())
                    .accept("application/octet-stream"))
            }
        }
    }

    /// Download `doc` below `root` and return the local path.
    ///
    /// # Errors
    ///
    /// - [`DownloadError::AuthExpired`], [`DownloadError::AccessDenied`] and
    ///   [`DownloadError::NotFound`] for `401`, `403` and `404`
    /// - [`DownloadError::RetriesExhausted`] when every attempt failed
    /// - [`DownloadError::MissingIdentifiers`] when no URL can be built
    pub async fn download(&self, doc: &DocumentDescriptor, root: &Path) -> Result<PathBuf> {
        let span = self.log.operation("download");
        async {
            let source = self.resolve_source(doc)?;
            let destination = destination_path(doc, root);

            if let Some(parent) = destination.parent() {
                self.fs
                    .create_dir_all(parent)
                    .await
                    .map_err(|source| DownloadError::Write {
                        path: parent.display().to_string(),
                        source,
                    })?;
            }

            debug!(
                document = %doc.name,
                direct = matches!(source, DownloadSource::Direct(_)),
                "Downloading"
            );

            let mut attempt = 0;
            let last_error = loop {
                attempt += 1;
                let request = self.build_request(doc, &source)?;

                let failure = match self.http_client.download_stream(request).await {
                    Ok(stream) => match stream.status {
                        200 => match self.write_body(stream, &destination).await {
                            Ok(bytes) => {
                                info!(
                                    document = %doc.name,
                                    bytes,
                                    path = %destination.display(),
                                    "Downloaded"
                                );
                                return Ok(destination);
                            }
                            Err(DownloadError::Transport { source, .. }) => source.to_string(),
                            Err(other) => return Err(other),
                        },
                        status @ (401 | 403 | 404) => {
                            warn!(document = %doc.name, url = %source.url(), status, "Download refused");
                            return Err(terminal_status(status, &doc.name));
                        }
                        status => format!("HTTP {}", status),
                    },
                    Err(e) if e.is_transient() => e.to_string(),
                    Err(e) => {
                        return Err(DownloadError::Transport {
                            name: doc.name.clone(),
                            source: e,
                        })
                    }
                };

                if attempt >= self.retry.max_attempts {
                    break failure;
                }
                let delay = self.retry.delay_after(attempt - 1);
                warn!(
                    document = %doc.name,
                    url = %source.url(),
                    attempt,
                    max_attempts = self.retry.max_attempts,
                    error = %failure,
                    "Download attempt failed, retrying in {:?}",
                    delay
                );
                pause(delay).await;
            };

            warn!(document = %doc.name, attempts = attempt, error = %last_error, "Download failed");
            Err(DownloadError::RetriesExhausted {
                name: doc.name.clone(),
                attempts: attempt,
                last_error,
            })
        }
        .instrument(span)
        .await
    }

    /// Stream a 200 body to `destination`. A partial file is removed.
    async fn write_body(&self, stream: HttpStream, destination: &Path) -> Result<u64> {
        let mut writer =
            self.fs
                .open_write_stream(destination)
                .await
                .map_err(|source| DownloadError::Write {
                    path: destination.display().to_string(),
                    source,
                })?;
        let mut body = stream.body;

        let copied = core_async::io::copy(&mut body, &mut writer).await;
        let flushed = match copied {
            Ok(bytes) => writer.flush().await.map(|_| bytes),
            Err(e) => Err(e),
        };
        drop(writer);

        match flushed {
            Ok(bytes) => Ok(bytes),
            Err(e) => {
                if let Err(cleanup) = self.fs.delete_file(destination).await {
                    debug!(error = %cleanup, "Could not remove partial download");
                }
                Err(DownloadError::Transport {
                    name: destination.display().to_string(),
                    source: e.into(),
                })
            }
        }
    }

    /// Submit an already downloaded file to the knowledge base.
    ///
    /// The document id and title are the document's original name.
    pub async fn ingest(&self, doc: &DocumentDescriptor, path: &Path) -> Result<IngestReceipt> {
        let ingestor = self
            .ingestor
            .as_ref()
            .ok_or(DownloadError::IngestionNotConfigured)?;

        let content = self
            .fs
            .read_file(path)
            .await
            .map_err(|source| DownloadError::Ingestion {
                name: doc.name.clone(),
                source,
            })?;

        let request = IngestRequest {
            document_id: doc.name.clone(),
            title: doc.name.clone(),
            source: INGEST_SOURCE.to_string(),
            mime_type: mime_type_for_path(path).to_string(),
            content,
        };

        ingestor
            .ingest(request)
            .instrument(self.log.operation("ingest"))
            .await
            .map_err(|source| {
                warn!(document = %doc.name, error = %source, "Ingestion failed, keeping local copy");
                DownloadError::Ingestion {
                    name: doc.name.clone(),
                    source,
                }
            })
    }

    /// Download, then ingest. An ingestion failure leaves the file in place.
    pub async fn download_and_ingest(
        &self,
        doc: &DocumentDescriptor,
        root: &Path,
    ) -> Result<PathBuf> {
        if self.ingestor.is_none() {
            return Err(DownloadError::IngestionNotConfigured);
        }
        let path = self.download(doc, root).await?;
        self.ingest(doc, &path).await?;
        Ok(path)
    }
}

fn terminal_status(status: u16, name: &str) -> DownloadError {
    let name = name.to_string();
    match status {
        401 => DownloadError::AuthExpired { name },
        403 => DownloadError::AccessDenied { name },
        _ => DownloadError::NotFound { name },
    }
}
