use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Bridge capability not available: {0}")]
    NotAvailable(String),

    #[error("Bridge operation failed: {0}")]
    OperationFailed(String),

    /// Connection-level failure (DNS, refused, reset) before a status arrived.
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BridgeError {
    /// Whether the failure happened on the wire and may succeed when retried.
    pub fn is_transient(&self) -> bool {
        matches!(self, BridgeError::Network(_) | BridgeError::Timeout(_))
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(BridgeError::Network("reset".into()).is_transient());
        assert!(BridgeError::Timeout("30s".into()).is_transient());
        assert!(!BridgeError::OperationFailed("bad json".into()).is_transient());
        assert!(!BridgeError::NotAvailable("browser".into()).is_transient());
    }
}
