use bridge_traits::error::BridgeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid OAuth configuration: {0}")]
    InvalidConfig(String),

    #[error("Authentication timed out after {0} seconds waiting for the browser callback")]
    Timeout(u64),

    #[error("Authorization was rejected: {description}")]
    CallbackRejected { description: String },

    #[error("OAuth state mismatch in callback")]
    StateMismatch,

    #[error("Token exchange failed with status {status}: {body}")]
    TokenExchange { status: u16, body: String },

    #[error("Malformed token response: {0}")]
    MalformedToken(String),

    #[error("Access token expired")]
    TokenExpired,

    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Callback listener failed: {0}")]
    Listener(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] BridgeError),
}

pub type Result<T> = std::result::Result<T, AuthError>;
