//! Harvester façade and bootstrap helpers.
//!
//! This crate wires host-provided bridge implementations (HTTP, filesystem,
//! browser) into the harvester components and exposes the operations a
//! front end needs: sign in, test the connection, scan, save and load
//! metadata, download and ingest. Desktop front ends enable the
//! `desktop-shims` feature (which depends on `bridge-desktop`) and use
//! [`HarvesterDependencies::desktop`].
//!
//! ```ignore
//! use core_service::{Harvester, HarvesterDependencies};
//!
//! let config = HarvestConfig::from_env().build()?;
//! let mut harvester = Harvester::new(config, HarvesterDependencies::desktop()?, log);
//! let documents = harvester.scan().await?;
//! let report = harvester.download_all(&documents, Path::new("downloads"), None).await?;
//! println!("{} downloaded, {} failed", report.succeeded, report.failed());
//! ```

pub mod error;

pub use error::{HarvestError, Result};

pub use core_library::{
    format_file_size, DocumentDescriptor, DocumentSummary, LibraryStats, DEFAULT_SNAPSHOT_FILE,
};
pub use core_runtime::config::HarvestConfig;
pub use core_transfer::{BatchReport, ProgressFn};
pub use provider_sharepoint::{ConnectionReport, DriveItem};

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use bridge_traits::{
    browser::BrowserLauncher, http::HttpClient, http::RetryPolicy,
    ingest::KnowledgeBaseIngestor, storage::FileSystemAccess,
};
use core_auth::{AccessToken, InteractiveAuthenticator, OAuthConfig, DEFAULT_CALLBACK_TIMEOUT};
use core_runtime::logging::LogContext;
use core_transfer::{BatchOrchestrator, TransferEngine};
use provider_bedrock::{AwsCredentials, BedrockIngestor};
use provider_sharepoint::{GraphConnector, ScanPacing, TreeEnumerator};
use tracing::{info, warn};

/// Aggregated handle to all bridge dependencies the harvester requires.
#[derive(Clone)]
pub struct HarvesterDependencies {
    pub http_client: Arc<dyn HttpClient>,
    pub filesystem: Arc<dyn FileSystemAccess>,
    pub browser: Arc<dyn BrowserLauncher>,
}

impl HarvesterDependencies {
    /// Construct a dependency bundle from explicit bridge handles.
    pub fn new(
        http_client: Arc<dyn HttpClient>,
        filesystem: Arc<dyn FileSystemAccess>,
        browser: Arc<dyn BrowserLauncher>,
    ) -> Self {
        Self {
            http_client,
            filesystem,
            browser,
        }
    }

    /// Native reqwest client, Tokio filesystem and the system browser.
    #[cfg(feature = "desktop-shims")]
    pub fn desktop() -> Result<Self> {
        let http_client = bridge_desktop::ReqwestHttpClient::new()
            .map_err(|e| HarvestError::Configuration(format!("HTTP client setup failed: {}", e)))?;
        Ok(Self::new(
            Arc::new(http_client),
            Arc::new(bridge_desktop::TokioFileSystem::new()),
            Arc::new(bridge_desktop::SystemBrowser::new()),
        ))
    }
}

/// Primary façade exposed to front ends.
///
/// The harvester signs in lazily: the first operation that needs Graph
/// runs the interactive flow unless a token was supplied with
/// [`with_token`](Self::with_token). An expired token is reported as
/// [`HarvestError::Authentication`]; it is never refreshed silently.
pub struct Harvester {
    config: HarvestConfig,
    deps: HarvesterDependencies,
    token: Option<AccessToken>,
    ingestor: Option<Arc<dyn KnowledgeBaseIngestor>>,
    pacing: ScanPacing,
    retry: RetryPolicy,
    callback_timeout: Duration,
    log: LogContext,
}

impl Harvester {
    pub fn new(config: HarvestConfig, deps: HarvesterDependencies, log: LogContext) -> Self {
        Self {
            config,
            deps,
            token: None,
            ingestor: None,
            pacing: ScanPacing::default(),
            retry: RetryPolicy::default(),
            callback_timeout: DEFAULT_CALLBACK_TIMEOUT,
            log,
        }
    }

    /// Use an already obtained token instead of signing in.
    pub fn with_token(mut self, token: AccessToken) -> Self {
        self.token = Some(token);
        self
    }

    /// Use this ingestor instead of one built from the configuration.
    pub fn with_ingestor(mut self, ingestor: Arc<dyn KnowledgeBaseIngestor>) -> Self {
        self.ingestor = Some(ingestor);
        self
    }

    pub fn with_pacing(mut self, pacing: ScanPacing) -> Self {
        self.pacing = pacing;
        self
    }

    /// Retry policy for site lookups and downloads.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_callback_timeout(mut self, timeout: Duration) -> Self {
        self.callback_timeout = timeout;
        self
    }

    pub fn config(&self) -> &HarvestConfig {
        &self.config
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.as_ref().is_some_and(|t| !t.is_expired())
    }

    /// Run the interactive sign-in and keep the token.
    pub async fn authenticate(&mut self) -> Result<()> {
        let oauth = OAuthConfig::microsoft(&self.config.sharepoint);
        let mut authenticator = InteractiveAuthenticator::new(
            oauth,
            Arc::clone(&self.deps.http_client),
            Arc::clone(&self.deps.browser),
            self.log.clone(),
        )
        .with_callback_timeout(self.callback_timeout);

        let token = authenticator.authenticate().await?;
        self.token = Some(token);
        Ok(())
    }

    async fn access_token(&mut self) -> Result<AccessToken> {
        match &self.token {
            Some(token) if token.is_expired() => Err(HarvestError::Authentication(
                "Access token expired; sign in again".to_string(),
            )),
            Some(token) => Ok(token.clone()),
            None => {
                self.authenticate().await?;
                self.token.clone().ok_or_else(|| {
                    HarvestError::Authentication("Sign-in returned no token".to_string())
                })
            }
        }
    }

    async fn connector(&mut self) -> Result<Arc<GraphConnector>> {
        let token = self.access_token().await?;
        Ok(Arc::new(
            GraphConnector::new(Arc::clone(&self.deps.http_client), token, self.log.clone())
                .with_retry_policy(self.retry.clone()),
        ))
    }

    async fn engine(&mut self, ingest: bool) -> Result<TransferEngine> {
        // Configuration problems surface before any sign-in
        let ingestor = if ingest { Some(self.ingestor()?) } else { None };
        let token = self.access_token().await?;

        let engine = TransferEngine::new(
            Arc::clone(&self.deps.http_client),
            Arc::clone(&self.deps.filesystem),
            token,
            self.log.clone(),
        )
        .with_retry_policy(self.retry.clone());

        Ok(match ingestor {
            Some(ingestor) => engine.with_ingestor(ingestor),
            None => engine,
        })
    }

    fn ingestor(&self) -> Result<Arc<dyn KnowledgeBaseIngestor>> {
        if let Some(ingestor) = &self.ingestor {
            return Ok(Arc::clone(ingestor));
        }
        let settings = self.config.require_ingestion()?;
        let credentials = AwsCredentials::from_env()?;
        Ok(Arc::new(BedrockIngestor::new(
            Arc::clone(&self.deps.http_client),
            settings,
            credentials,
            self.log.clone(),
        )))
    }

    /// Resolve the site, read its details, count drives and read `/me`.
    pub async fn test_connection(&mut self) -> Result<ConnectionReport> {
        let connector = self.connector().await?;
        let report = connector
            .test_connection(&self.config.sharepoint.site_url)
            .await?;
        info!(drives = report.drive_count, "Connection test passed");
        Ok(report)
    }

    /// Current metadata of one item, e.g. to refresh a stale download URL.
    pub async fn item_metadata(&mut self, drive_id: &str, item_id: &str) -> Result<DriveItem> {
        let connector = self.connector().await?;
        Ok(connector.item_metadata(drive_id, item_id).await?)
    }

    /// Enumerate every document of the configured site.
    pub async fn scan(&mut self) -> Result<Vec<DocumentDescriptor>> {
        let connector = self.connector().await?;
        let enumerator = TreeEnumerator::new(connector, self.log.clone()).with_pacing(self.pacing);
        Ok(enumerator.enumerate(&self.config.sharepoint.site_url).await?)
    }

    pub async fn save_metadata(&self, documents: &[DocumentDescriptor], path: &Path) -> Result<()> {
        core_library::save_snapshot(self.deps.filesystem.as_ref(), path, documents).await?;
        Ok(())
    }

    pub async fn load_metadata(&self, path: &Path) -> Result<Vec<DocumentDescriptor>> {
        Ok(core_library::load_snapshot(self.deps.filesystem.as_ref(), path).await?)
    }

    pub fn summarize(documents: &[DocumentDescriptor]) -> DocumentSummary {
        DocumentSummary::from_documents(documents)
    }

    /// Download a single document below `root`.
    pub async fn download_document(
        &mut self,
        document: &DocumentDescriptor,
        root: &Path,
    ) -> Result<PathBuf> {
        let engine = self.engine(false).await?;
        Ok(engine.download(document, root).await?)
    }

    /// Download and ingest a single document. A failed ingestion keeps the
    /// downloaded file.
    pub async fn download_and_ingest(
        &mut self,
        document: &DocumentDescriptor,
        root: &Path,
    ) -> Result<PathBuf> {
        let engine = self.engine(true).await?;
        Ok(engine.download_and_ingest(document, root).await?)
    }

    /// Download every document; failures are counted, not raised.
    pub async fn download_all(
        &mut self,
        documents: &[DocumentDescriptor],
        root: &Path,
        on_progress: Option<&ProgressFn>,
    ) -> Result<BatchReport<PathBuf>> {
        let engine = self.engine(false).await?;
        let batch = BatchOrchestrator::new(Arc::new(engine), self.log.clone());
        let report = batch.download_all(documents, root, on_progress).await;
        if report.failed() > 0 {
            warn!(failed = report.failed(), "Some documents could not be downloaded");
        }
        Ok(report)
    }

    /// Download and ingest every document.
    ///
    /// # Errors
    ///
    /// [`HarvestError::Configuration`] when the knowledge-base settings or
    /// AWS credentials are missing; nothing is downloaded in that case.
    pub async fn download_all_and_ingest(
        &mut self,
        documents: &[DocumentDescriptor],
        root: &Path,
        on_progress: Option<&ProgressFn>,
    ) -> Result<BatchReport<bool>> {
        let engine = self.engine(true).await?;
        let batch = BatchOrchestrator::new(Arc::new(engine), self.log.clone());
        Ok(batch
            .download_all_and_ingest(documents, root, on_progress)
            .await?)
    }
}
