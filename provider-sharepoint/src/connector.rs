//! Microsoft Graph connector
//!
//! Thin typed wrapper over the Graph v1.0 endpoints the harvester uses:
//! site lookup, site info, drive listing, folder children pages, item
//! metadata and the signed-in user.

use std::sync::Arc;
use std::time::Duration;

use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse, RetryPolicy};
use core_async::time::pause;
use core_auth::AccessToken;
use core_runtime::logging::LogContext;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn, Instrument};

use crate::error::{Result, SharePointError};
use crate::types::{ConnectionReport, DriveItem, GraphDrive, GraphSite, GraphUser, Page, SiteAddress};

/// Graph API base URL
pub const GRAPH_API_BASE: &str = "https://graph.microsoft.com/v1.0";

/// Timeout for metadata calls
pub const METADATA_TIMEOUT: Duration = Duration::from_secs(30);

/// Authenticated content URL for an item.
pub fn content_url(drive_id: &str, item_id: &str) -> String {
    format!("{}/drives/{}/items/{}/content", GRAPH_API_BASE, drive_id, item_id)
}

/// Microsoft Graph connector
///
/// Every request carries the bearer token and a 30 second timeout. An
/// expired token fails the call with [`SharePointError::TokenExpired`]
/// before anything is sent.
///
/// # Example
///
/// ```ignore
/// use provider_sharepoint::GraphConnector;
///
/// let connector = GraphConnector::new(http_client, token, log);
/// let site = connector.resolve_site("https://contoso.sharepoint.com/sites/Finance").await?;
/// let drives = connector.list_drives(&site.id).await?;
/// ```
pub struct GraphConnector {
    http_client: Arc<dyn HttpClient>,
    token: AccessToken,
    retry: RetryPolicy,
    log: LogContext,
}

impl GraphConnector {
    pub fn new(http_client: Arc<dyn HttpClient>, token: AccessToken, log: LogContext) -> Self {
        Self {
            http_client,
            token,
            retry: RetryPolicy::default(),
            log: log.component("graph"),
        }
    }

    /// Retry policy for site lookups.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn token(&self) -> &AccessToken {
        &self.token
    }

    fn request(&self, url: impl Into<String>) -> Result<HttpRequest> {
        if self.token.is_expired() {
            return Err(SharePointError::TokenExpired);
        }
        Ok(HttpRequest::get(url)
            .authorization(self.token.authorization_header())
            .accept("application/json")
            .timeout(METADATA_TIMEOUT))
    }

    fn parse<T: DeserializeOwned>(response: &HttpResponse) -> Result<T> {
        serde_json::from_slice(&response.body).map_err(|e| SharePointError::Parse(e.to_string()))
    }

    /// GET `url` and parse a 200 body; any other status is an API error.
    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self.http_client.execute(self.request(url)?).await?;

        if response.status != 200 {
            warn!(status = response.status, url = %url, "Graph request failed");
            return Err(SharePointError::Api {
                status: response.status,
                message: response.text_lossy(),
            });
        }

        Self::parse(&response)
    }

    /// Resolve the configured site URL to a Graph site.
    ///
    /// Transient network failures are retried with exponential backoff.
    /// A 404 or 403 answer fails at once.
    ///
    /// # Errors
    ///
    /// - [`SharePointError::SiteNotFound`] / [`SharePointError::AccessDenied`]
    /// - [`SharePointError::Api`] for any other non-200 status
    /// - [`SharePointError::RetriesExhausted`] when the network kept failing
    pub async fn resolve_site(&self, site_url: &str) -> Result<GraphSite> {
        let span = self.log.operation("resolve_site");
        async {
            let address = SiteAddress::parse(site_url)?;
            let url = format!("{}/sites/{}", GRAPH_API_BASE, address.graph_key());

            let mut attempt = 0;
            loop {
                let request = self.request(url.as_str())?;
                match self.http_client.execute(request).await {
                    Ok(response) => {
                        return match response.status {
                            200 => {
                                let site: GraphSite = Self::parse(&response)?;
                                info!(
                                    site = site.display_name.as_deref().unwrap_or("Unknown"),
                                    "Connected to SharePoint site"
                                );
                                Ok(site)
                            }
                            404 => Err(SharePointError::SiteNotFound(site_url.to_string())),
                            403 => Err(SharePointError::AccessDenied(site_url.to_string())),
                            status => Err(SharePointError::Api {
                                status,
                                message: response.text_lossy(),
                            }),
                        };
                    }
                    Err(e) if e.is_transient() => {
                        attempt += 1;
                        if attempt >= self.retry.max_attempts {
                            warn!(attempts = attempt, error = %e, "Site lookup failed");
                            return Err(SharePointError::RetriesExhausted {
                                attempts: attempt,
                                source: e,
                            });
                        }
                        let delay = self.retry.delay_after(attempt - 1);
                        warn!(
                            attempt,
                            max_attempts = self.retry.max_attempts,
                            error = %e,
                            "Site lookup failed, retrying in {:?}",
                            delay
                        );
                        pause(delay).await;
                    }
                    Err(e) => return Err(SharePointError::Bridge(e)),
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Full site resource by id.
    pub async fn site_info(&self, site_id: &str) -> Result<GraphSite> {
        let url = format!("{}/sites/{}", GRAPH_API_BASE, site_id);
        self.get_json(&url)
            .instrument(self.log.operation("site_info"))
            .await
    }

    /// Document libraries of a site.
    pub async fn list_drives(&self, site_id: &str) -> Result<Vec<GraphDrive>> {
        let url = format!("{}/sites/{}/drives", GRAPH_API_BASE, site_id);
        let page: Page<GraphDrive> = self
            .get_json(&url)
            .instrument(self.log.operation("list_drives"))
            .await?;

        info!(count = page.value.len(), "Found document libraries");
        Ok(page.value)
    }

    /// URL of the first children page of a folder; `None` means the drive root.
    pub fn children_url(&self, drive_id: &str, folder_id: Option<&str>) -> String {
        match folder_id {
            Some(id) => format!("{}/drives/{}/items/{}/children", GRAPH_API_BASE, drive_id, id),
            None => format!("{}/drives/{}/root/children", GRAPH_API_BASE, drive_id),
        }
    }

    /// One page of folder children. `url` is either from
    /// [`children_url`](Self::children_url) or a previous page's next link.
    pub async fn list_children(&self, url: &str) -> Result<Page<DriveItem>> {
        debug!(url = %url, "Listing folder children");
        self.get_json(url).await
    }

    /// Metadata of a single item.
    pub async fn item_metadata(&self, drive_id: &str, item_id: &str) -> Result<DriveItem> {
        let url = format!("{}/drives/{}/items/{}", GRAPH_API_BASE, drive_id, item_id);
        self.get_json(&url)
            .instrument(self.log.operation("item_metadata"))
            .await
    }

    /// The signed-in user.
    pub async fn current_user(&self) -> Result<GraphUser> {
        let url = format!("{}/me", GRAPH_API_BASE);
        self.get_json(&url)
            .instrument(self.log.operation("current_user"))
            .await
    }

    /// Resolve the site, read its info, count its libraries and identify
    /// the user.
    ///
    /// A failing `/me` call is logged and reported as `user: None`.
    pub async fn test_connection(&self, site_url: &str) -> Result<ConnectionReport> {
        info!("Testing SharePoint connection");
        let site = self.resolve_site(site_url).await?;
        let info = self.site_info(&site.id).await?;
        let drives = self.list_drives(&site.id).await?;

        let user = match self.current_user().await {
            Ok(user) => Some(user),
            Err(e) => {
                warn!(error = %e, "Could not read the signed-in user");
                None
            }
        };

        Ok(ConnectionReport {
            site: info,
            drive_count: drives.len(),
            user,
        })
    }
}
