use core_auth::AuthError;
use core_library::LibraryError;
use core_transfer::DownloadError;
use provider_bedrock::IngestionError;
use provider_sharepoint::SharePointError;
use thiserror::Error;

/// Failures surfaced by the [`Harvester`](crate::Harvester).
#[derive(Error, Debug)]
pub enum HarvestError {
    /// Missing or invalid settings; fix the configuration and rerun
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Sign-in failed or the token expired
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Non-2xx answer from site resolution or drive listing
    #[error("SharePoint API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Graph could not be reached or answered with something unreadable
    #[error("SharePoint request failed: {0}")]
    Remote(#[source] SharePointError),

    #[error("Download failed: {0}")]
    Download(#[source] DownloadError),

    #[error("Ingestion error: {0}")]
    Ingestion(String),

    #[error("Metadata file error: {0}")]
    Library(#[from] LibraryError),
}

impl HarvestError {
    /// HTTP status behind the failure, when there is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            HarvestError::Api { status, .. } => Some(*status),
            HarvestError::Remote(inner) => inner.status(),
            _ => None,
        }
    }
}

impl From<core_runtime::Error> for HarvestError {
    fn from(error: core_runtime::Error) -> Self {
        match error {
            core_runtime::Error::Config(message) => HarvestError::Configuration(message),
            other => HarvestError::Configuration(other.to_string()),
        }
    }
}

impl From<AuthError> for HarvestError {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::InvalidConfig(message) => HarvestError::Configuration(message),
            other => HarvestError::Authentication(other.to_string()),
        }
    }
}

impl From<SharePointError> for HarvestError {
    fn from(error: SharePointError) -> Self {
        match error {
            SharePointError::InvalidSiteUrl(message) => HarvestError::Configuration(message),
            SharePointError::TokenExpired => {
                HarvestError::Authentication(SharePointError::TokenExpired.to_string())
            }
            SharePointError::Api { status, message } => HarvestError::Api { status, message },
            SharePointError::SiteNotFound(site) => HarvestError::Api {
                status: 404,
                message: format!("Site not found: {}", site),
            },
            SharePointError::AccessDenied(site) => HarvestError::Api {
                status: 403,
                message: format!("Access denied to site: {}", site),
            },
            other => HarvestError::Remote(other),
        }
    }
}

impl From<DownloadError> for HarvestError {
    fn from(error: DownloadError) -> Self {
        match error {
            DownloadError::IngestionNotConfigured => {
                HarvestError::Configuration(DownloadError::IngestionNotConfigured.to_string())
            }
            DownloadError::AuthExpired { name } => {
                HarvestError::Authentication(format!("Access token expired while downloading {}", name))
            }
            other => HarvestError::Download(other),
        }
    }
}

impl From<IngestionError> for HarvestError {
    fn from(error: IngestionError) -> Self {
        match error {
            IngestionError::MissingCredentials(_) => HarvestError::Configuration(error.to_string()),
            other => HarvestError::Ingestion(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, HarvestError>;
