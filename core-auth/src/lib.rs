//! # Authentication Module
//!
//! Interactive OAuth 2.0 sign-in against the Microsoft identity platform.
//!
//! ## Overview
//!
//! This crate obtains the access token used for every Graph call. It runs
//! the authorization-code flow with PKCE:
//!
//! 1. Generate a PKCE verifier/challenge pair and a random state
//! 2. Start a one-shot local listener on the redirect URI
//! 3. Open the authorization URL in the user's browser
//! 4. Receive the redirect carrying `code` or `error`
//! 5. Exchange the code at the token endpoint
//!
//! ## Features
//!
//! - Scoped callback listener that is always shut down, see [`CallbackListener`]
//! - Explicit [`AuthState`] machine with terminal `Authenticated` and `Failed`
//! - Tokens are held in memory only and never refreshed; an expired token
//!   means signing in again

pub mod authenticator;
pub mod callback;
pub mod error;
pub mod oauth;
pub mod types;

pub use authenticator::InteractiveAuthenticator;
pub use callback::{CallbackListener, CallbackOutcome, DEFAULT_CALLBACK_TIMEOUT};
pub use error::{AuthError, Result};
pub use oauth::{OAuthConfig, OAuthFlowManager, PkceVerifier, GRAPH_SCOPES};
pub use types::{AccessToken, AuthState};
