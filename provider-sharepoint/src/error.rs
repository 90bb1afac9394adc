//! Error types for the SharePoint provider

use bridge_traits::error::BridgeError;
use thiserror::Error;

/// SharePoint / Microsoft Graph errors
#[derive(Error, Debug)]
pub enum SharePointError {
    /// The configured site URL cannot be turned into a Graph site key
    #[error("Invalid SharePoint site URL: {0}")]
    InvalidSiteUrl(String),

    #[error("SharePoint site not found: {0}. Check the URL and permissions.")]
    SiteNotFound(String),

    #[error("Access denied to {0}. Check user permissions.")]
    AccessDenied(String),

    /// Non-2xx answer from Graph
    #[error("Graph API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// Failed to parse API response
    #[error("Failed to parse Graph response: {0}")]
    Parse(String),

    /// The access token has expired; sign in again
    #[error("Access token expired")]
    TokenExpired,

    /// Site lookup kept failing on the network
    #[error("Connection failed after {attempts} attempts: {source}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: BridgeError,
    },

    #[error(transparent)]
    Bridge(#[from] BridgeError),
}

impl SharePointError {
    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            SharePointError::SiteNotFound(_) => Some(404),
            SharePointError::AccessDenied(_) => Some(403),
            SharePointError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Result type for SharePoint operations
pub type Result<T> = std::result::Result<T, SharePointError>;
