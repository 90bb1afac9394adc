use bridge_traits::error::BridgeError;
use thiserror::Error;

/// Terminal failure of one document transfer.
#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("Access token expired while downloading {name}")]
    AuthExpired { name: String },

    #[error("Access denied to {name}")]
    AccessDenied { name: String },

    #[error("{name} no longer exists on the server")]
    NotFound { name: String },

    #[error("{name} has neither a direct download URL nor remote identifiers")]
    MissingIdentifiers { name: String },

    #[error("Download of {name} failed after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        name: String,
        attempts: u32,
        last_error: String,
    },

    #[error("Transfer of {name} failed: {source}")]
    Transport {
        name: String,
        #[source]
        source: BridgeError,
    },

    #[error("Ingestion is not configured")]
    IngestionNotConfigured,

    #[error("{name} was downloaded but ingestion failed: {source}")]
    Ingestion {
        name: String,
        #[source]
        source: BridgeError,
    },

    #[error("Could not write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: BridgeError,
    },
}

impl DownloadError {
    /// Name of the document the failure belongs to, if any.
    pub fn document_name(&self) -> Option<&str> {
        match self {
            DownloadError::AuthExpired { name }
            | DownloadError::AccessDenied { name }
            | DownloadError::NotFound { name }
            | DownloadError::MissingIdentifiers { name }
            | DownloadError::RetriesExhausted { name, .. }
            | DownloadError::Transport { name, .. }
            | DownloadError::Ingestion { name, .. } => Some(name),
            DownloadError::Write { .. } | DownloadError::IngestionNotConfigured => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, DownloadError>;
