//! # Harvester Configuration
//!
//! Settings come from three layers, lowest precedence first:
//!
//! 1. The process environment
//! 2. An optional `.env` file, loaded into the environment by [`load_dotenv`]
//! 3. Explicit overrides applied on the builder (usually CLI flags)
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::{load_dotenv, HarvestConfig};
//!
//! load_dotenv(None)?;
//! let config = HarvestConfig::from_env()
//!     .site_url("https://contoso.sharepoint.com/sites/Finance")
//!     .build()?;
//! assert_eq!(config.sharepoint.tenant_id, "contoso.onmicrosoft.com");
//! ```
//!
//! ## Error Handling
//!
//! [`HarvestConfigBuilder::build`] fails fast with an actionable
//! [`Error::Config`] for every missing or malformed required setting. The
//! `config` command uses [`validate_environment`] instead, which collects all
//! problems into a [`ConfigReport`] rather than stopping at the first one.

use crate::error::{Error, Result};

use std::fmt;
use std::path::{Path, PathBuf};
use url::Url;

pub const ENV_SITE_URL: &str = "SHAREPOINT_SITE_URL";
pub const ENV_CLIENT_ID: &str = "AZURE_CLIENT_ID";
pub const ENV_TENANT_ID: &str = "AZURE_TENANT_ID";
pub const ENV_CLIENT_SECRET: &str = "AZURE_CLIENT_SECRET";
pub const ENV_REDIRECT_URI: &str = "AZURE_REDIRECT_URI";
pub const ENV_KNOWLEDGE_BASE_ID: &str = "BEDROCK_KNOWLEDGE_BASE_ID";
pub const ENV_DATA_SOURCE_ID: &str = "BEDROCK_DATA_SOURCE_ID";
pub const ENV_AWS_REGION: &str = "AWS_REGION";
pub const ENV_AWS_ACCESS_KEY_ID: &str = "AWS_ACCESS_KEY_ID";
pub const ENV_AWS_SECRET_ACCESS_KEY: &str = "AWS_SECRET_ACCESS_KEY";
pub const ENV_AWS_SESSION_TOKEN: &str = "AWS_SESSION_TOKEN";

pub const DEFAULT_REDIRECT_URI: &str = "http://localhost:8080/callback";
pub const DEFAULT_AWS_REGION: &str = "us-east-1";
/// Tenant used when none is configured and none can be derived.
pub const COMMON_TENANT: &str = "common";

/// Load a `.env` file into the process environment.
///
/// With `path == None` the file is searched for in the current directory and
/// its ancestors. A missing file is not an error; `Ok(None)` is returned.
/// Variables already present in the environment are left untouched.
pub fn load_dotenv(path: Option<&Path>) -> Result<Option<PathBuf>> {
    let outcome = match path {
        Some(path) => dotenv::from_path(path).map(|_| path.to_path_buf()),
        None => dotenv::dotenv(),
    };

    match outcome {
        Ok(loaded) => Ok(Some(loaded)),
        Err(e) if e.not_found() && path.is_none() => Ok(None),
        Err(e) => Err(Error::Config(format!("Failed to load .env file: {}", e))),
    }
}

/// Identity and site settings for the SharePoint side.
#[derive(Clone, PartialEq, Eq)]
pub struct SharePointSettings {
    pub site_url: String,
    pub client_id: String,
    /// Explicit tenant, or one derived from the site URL
    pub tenant_id: String,
    pub client_secret: Option<String>,
    pub redirect_uri: String,
}

impl fmt::Debug for SharePointSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharePointSettings")
            .field("site_url", &self.site_url)
            .field("client_id", &self.client_id)
            .field("tenant_id", &self.tenant_id)
            .field(
                "client_secret",
                &self.client_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .field("redirect_uri", &self.redirect_uri)
            .finish()
    }
}

/// Target knowledge base for optional ingestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestionSettings {
    pub knowledge_base_id: String,
    pub data_source_id: String,
    pub region: String,
}

/// Complete, validated harvester configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestConfig {
    pub sharepoint: SharePointSettings,
    /// Present only when both knowledge-base and data-source ids are set
    pub ingestion: Option<IngestionSettings>,
}

impl HarvestConfig {
    pub fn builder() -> HarvestConfigBuilder {
        HarvestConfigBuilder::default()
    }

    /// Builder pre-populated from the process environment.
    pub fn from_env() -> HarvestConfigBuilder {
        HarvestConfigBuilder::from_lookup(|key| std::env::var(key).ok())
    }

    /// Returns the ingestion settings or a configuration error naming the
    /// missing variables.
    pub fn require_ingestion(&self) -> Result<&IngestionSettings> {
        self.ingestion.as_ref().ok_or_else(|| {
            Error::Config(format!(
                "Knowledge-base ingestion requires {} and {}",
                ENV_KNOWLEDGE_BASE_ID, ENV_DATA_SOURCE_ID
            ))
        })
    }
}

/// Builder for [`HarvestConfig`].
#[derive(Debug, Default, Clone)]
pub struct HarvestConfigBuilder {
    site_url: Option<String>,
    client_id: Option<String>,
    tenant_id: Option<String>,
    client_secret: Option<String>,
    redirect_uri: Option<String>,
    knowledge_base_id: Option<String>,
    data_source_id: Option<String>,
    region: Option<String>,
}

impl HarvestConfigBuilder {
    /// Populate from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        Self {
            site_url: get(ENV_SITE_URL),
            client_id: get(ENV_CLIENT_ID),
            tenant_id: get(ENV_TENANT_ID),
            client_secret: get(ENV_CLIENT_SECRET),
            redirect_uri: get(ENV_REDIRECT_URI),
            knowledge_base_id: get(ENV_KNOWLEDGE_BASE_ID),
            data_source_id: get(ENV_DATA_SOURCE_ID),
            region: get(ENV_AWS_REGION),
        }
    }

    pub fn site_url(mut self, url: impl Into<String>) -> Self {
        self.site_url = Some(url.into());
        self
    }

    pub fn client_id(mut self, id: impl Into<String>) -> Self {
        self.client_id = Some(id.into());
        self
    }

    pub fn tenant_id(mut self, id: impl Into<String>) -> Self {
        self.tenant_id = Some(id.into());
        self
    }

    pub fn client_secret(mut self, secret: impl Into<String>) -> Self {
        self.client_secret = Some(secret.into());
        self
    }

    pub fn redirect_uri(mut self, uri: impl Into<String>) -> Self {
        self.redirect_uri = Some(uri.into());
        self
    }

    pub fn knowledge_base_id(mut self, id: impl Into<String>) -> Self {
        self.knowledge_base_id = Some(id.into());
        self
    }

    pub fn data_source_id(mut self, id: impl Into<String>) -> Self {
        self.data_source_id = Some(id.into());
        self
    }

    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Apply an override only when it is present.
    pub fn override_with(self, value: Option<String>, apply: fn(Self, String) -> Self) -> Self {
        match value {
            Some(v) if !v.trim().is_empty() => apply(self, v),
            _ => self,
        }
    }

    pub fn build(self) -> Result<HarvestConfig> {
        let site_url = self.site_url.ok_or_else(|| {
            Error::Config(format!(
                "SharePoint site URL is required. Set {} or pass --site-url.",
                ENV_SITE_URL
            ))
        })?;
        validate_site_url(&site_url)?;

        let client_id = self.client_id.ok_or_else(|| {
            Error::Config(format!(
                "Azure client id is required. Set {} or pass --client-id.",
                ENV_CLIENT_ID
            ))
        })?;

        let redirect_uri = self
            .redirect_uri
            .unwrap_or_else(|| DEFAULT_REDIRECT_URI.to_string());
        validate_redirect_uri(&redirect_uri)?;

        let tenant_id = self
            .tenant_id
            .or_else(|| derive_tenant(&site_url))
            .unwrap_or_else(|| COMMON_TENANT.to_string());

        let ingestion = match (self.knowledge_base_id, self.data_source_id) {
            (Some(knowledge_base_id), Some(data_source_id)) => Some(IngestionSettings {
                knowledge_base_id,
                data_source_id,
                region: self
                    .region
                    .unwrap_or_else(|| DEFAULT_AWS_REGION.to_string()),
            }),
            _ => None,
        };

        Ok(HarvestConfig {
            sharepoint: SharePointSettings {
                site_url,
                client_id,
                tenant_id,
                client_secret: self.client_secret,
                redirect_uri,
            },
            ingestion,
        })
    }
}

/// Check that `url` is an https SharePoint Online site URL.
pub fn validate_site_url(url: &str) -> Result<Url> {
    let parsed = Url::parse(url)
        .map_err(|e| Error::Config(format!("Invalid SharePoint site URL '{}': {}", url, e)))?;

    if parsed.scheme() != "https" {
        return Err(Error::Config(format!(
            "SharePoint site URL must use https: {}",
            url
        )));
    }

    match parsed.host_str() {
        Some(host) if host.contains("sharepoint.com") => Ok(parsed),
        _ => Err(Error::Config(format!(
            "Invalid SharePoint URL (expected a *.sharepoint.com host): {}",
            url
        ))),
    }
}

fn validate_redirect_uri(uri: &str) -> Result<()> {
    let parsed = Url::parse(uri)
        .map_err(|e| Error::Config(format!("Invalid redirect URI '{}': {}", uri, e)))?;

    if parsed.port_or_known_default().is_none() || parsed.host_str().is_none() {
        return Err(Error::Config(format!(
            "Redirect URI must name a host and port: {}",
            uri
        )));
    }
    Ok(())
}

/// Derive the tenant domain from a site URL's first host label:
/// `https://contoso.sharepoint.com/...` gives `contoso.onmicrosoft.com`.
pub fn derive_tenant(site_url: &str) -> Option<String> {
    let parsed = Url::parse(site_url).ok()?;
    let host = parsed.host_str()?;
    let subdomain = host.split('.').next().filter(|s| !s.is_empty())?;

    // Admin and personal-site hosts share the tenant prefix
    let tenant = subdomain
        .strip_suffix("-admin")
        .or_else(|| subdomain.strip_suffix("-my"))
        .unwrap_or(subdomain);

    Some(format!("{}.onmicrosoft.com", tenant))
}

/// One section of a [`ConfigReport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigSection {
    pub name: &'static str,
    pub configured: bool,
    pub problems: Vec<String>,
    /// Non-secret values worth showing to the user
    pub details: Vec<(&'static str, String)>,
}

/// Result of validating all configuration sources without failing fast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigReport {
    pub sharepoint: ConfigSection,
    pub bedrock: ConfigSection,
    pub aws: ConfigSection,
}

impl ConfigReport {
    /// SharePoint settings are mandatory; the others are optional extras.
    pub fn is_usable(&self) -> bool {
        self.sharepoint.configured
    }

    pub fn sections(&self) -> [&ConfigSection; 3] {
        [&self.sharepoint, &self.bedrock, &self.aws]
    }
}

/// Validate every configuration section reachable through `lookup`.
pub fn validate_environment<F>(lookup: F) -> ConfigReport
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    let mut sharepoint = ConfigSection {
        name: "sharepoint",
        configured: false,
        problems: Vec::new(),
        details: Vec::new(),
    };
    match HarvestConfigBuilder::from_lookup(&lookup).build() {
        Ok(config) => {
            sharepoint.configured = true;
            sharepoint.details = vec![
                ("site_url", config.sharepoint.site_url),
                ("client_id", config.sharepoint.client_id),
                ("tenant_id", config.sharepoint.tenant_id),
                ("redirect_uri", config.sharepoint.redirect_uri),
            ];
        }
        Err(Error::Config(problem)) | Err(Error::Internal(problem)) => {
            sharepoint.problems.push(problem)
        }
    }

    let mut bedrock = ConfigSection {
        name: "bedrock",
        configured: false,
        problems: Vec::new(),
        details: Vec::new(),
    };
    for key in [ENV_KNOWLEDGE_BASE_ID, ENV_DATA_SOURCE_ID] {
        match get(key) {
            Some(value) => bedrock.details.push((key, value)),
            None => bedrock.problems.push(format!("{} is not set", key)),
        }
    }
    bedrock.configured = bedrock.problems.is_empty();

    let mut aws = ConfigSection {
        name: "aws",
        configured: false,
        problems: Vec::new(),
        details: vec![(
            "region",
            get(ENV_AWS_REGION).unwrap_or_else(|| DEFAULT_AWS_REGION.to_string()),
        )],
    };
    for key in [ENV_AWS_ACCESS_KEY_ID, ENV_AWS_SECRET_ACCESS_KEY] {
        if get(key).is_none() {
            aws.problems.push(format!("{} is not set", key));
        }
    }
    aws.configured = aws.problems.is_empty();

    ConfigReport {
        sharepoint,
        bedrock,
        aws,
    }
}
