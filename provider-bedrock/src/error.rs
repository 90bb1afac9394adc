use bridge_traits::error::BridgeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestionError {
    #[error("Missing AWS credential: {0} is not set")]
    MissingCredentials(&'static str),

    #[error("Request signing failed: {0}")]
    Signing(String),

    #[error("Ingestion rejected with status {status}: {message}")]
    Rejected { status: u16, message: String },

    #[error("Invalid ingestion response: {0}")]
    InvalidResponse(String),

    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),
}

impl From<IngestionError> for BridgeError {
    fn from(error: IngestionError) -> Self {
        match error {
            IngestionError::Bridge(inner) => inner,
            other => BridgeError::OperationFailed(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, IngestionError>;
