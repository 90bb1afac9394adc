use bridge_traits::error::BridgeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LibraryError {
    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),

    #[error("Snapshot serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid metadata snapshot {path}: {message}")]
    InvalidSnapshot { path: String, message: String },
}

pub type Result<T> = std::result::Result<T, LibraryError>;
