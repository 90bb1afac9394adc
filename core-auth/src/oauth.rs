//! OAuth 2.0 Authorization Code Flow with PKCE
//!
//! This module implements RFC 6749 (OAuth 2.0) and RFC 7636 (PKCE) against the
//! Microsoft identity platform.
//!
//! # Overview
//!
//! The flow manager handles:
//! - Building the authorization URL with a PKCE challenge
//! - Exchanging the authorization code for an access token
//! - State verification for CSRF protection
//!
//! There is no refresh step. Tokens are used until they expire.
//!
//! # Security
//!
//! - Generates cryptographically secure random state and code verifier
//! - Validates the state parameter returned on the callback
//! - Never logs sensitive values (tokens, codes, verifiers)
//!
//! # Example
//!
//! ```no_run
//! use core_auth::oauth::{OAuthConfig, OAuthFlowManager};
//! use std::sync::Arc;
//!
//! # fn example(settings: &core_runtime::SharePointSettings) -> core_auth::Result<()> {
//! # use bridge_traits::http::HttpClient;
//! # let http_client: Arc<dyn HttpClient> = todo!();
//! let config = OAuthConfig::microsoft(settings);
//! let flow_manager = OAuthFlowManager::new(config, http_client);
//! let (auth_url, pkce_verifier) = flow_manager.build_auth_url()?;
//! // Send the user to auth_url...
//! # Ok(())
//! # }
//! ```

use crate::error::{AuthError, Result};
use crate::types::AccessToken;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest};
use core_runtime::config::SharePointSettings;
use rand::Rng;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{instrument, warn};
use url::Url;

/// Login host of the Microsoft identity platform.
pub const AUTHORITY_HOST: &str = "https://login.microsoftonline.com";

/// Delegated scopes needed to read sites and files, plus offline access.
pub const GRAPH_SCOPES: [&str; 3] = [
    "https://graph.microsoft.com/Sites.Read.All",
    "https://graph.microsoft.com/Files.Read.All",
    "offline_access",
];

const TOKEN_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// OAuth 2.0 provider configuration.
#[derive(Clone)]
pub struct OAuthConfig {
    pub client_id: String,
    /// Only confidential clients have one
    pub client_secret: Option<String>,
    pub redirect_uri: String,
    pub scopes: Vec<String>,
    pub auth_url: String,
    pub token_url: String,
}

impl OAuthConfig {
    /// Configuration for the Microsoft identity platform v2 endpoints of the
    /// settings' tenant.
    pub fn microsoft(settings: &SharePointSettings) -> Self {
        let base = format!("{}/{}/oauth2/v2.0", AUTHORITY_HOST, settings.tenant_id);
        Self {
            client_id: settings.client_id.clone(),
            client_secret: settings.client_secret.clone(),
            redirect_uri: settings.redirect_uri.clone(),
            scopes: GRAPH_SCOPES.iter().map(|s| s.to_string()).collect(),
            auth_url: format!("{}/authorize", base),
            token_url: format!("{}/token", base),
        }
    }
}

impl fmt::Debug for OAuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthConfig")
            .field("client_id", &self.client_id)
            .field(
                "client_secret",
                &self.client_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .field("redirect_uri", &self.redirect_uri)
            .field("scopes", &self.scopes)
            .field("auth_url", &self.auth_url)
            .field("token_url", &self.token_url)
            .finish()
    }
}

/// PKCE (Proof Key for Code Exchange) verifier.
///
/// Generated fresh for every sign-in attempt and dropped after the token
/// exchange. Only the challenge derived from it is sent to the authorization
/// endpoint.
#[derive(Clone)]
pub struct PkceVerifier {
    /// The code verifier (base64-url-encoded random string)
    verifier: String,
    /// The state parameter for CSRF protection
    state: String,
}

impl PkceVerifier {
    /// Create a new PKCE verifier with cryptographically secure random values.
    ///
    /// Generates:
    /// - A 32-byte random code verifier (43 characters once encoded)
    /// - A 16-byte random state parameter
    ///
    /// Both values use URL-safe base64 encoding without padding.
    pub fn new() -> Self {
        let mut rng = rand::thread_rng();

        let mut verifier_bytes = [0u8; 32];
        rng.fill(&mut verifier_bytes);
        let verifier = URL_SAFE_NO_PAD.encode(verifier_bytes);

        let mut state_bytes = [0u8; 16];
        rng.fill(&mut state_bytes);
        let state = URL_SAFE_NO_PAD.encode(state_bytes);

        Self { verifier, state }
    }

    pub fn verifier(&self) -> &str {
        &self.verifier
    }

    pub fn state(&self) -> &str {
        &self.state
    }

    /// Compute the code challenge from the verifier.
    ///
    /// Uses S256 method: BASE64URL(SHA256(code_verifier))
    pub fn challenge(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.verifier.as_bytes());
        let hash = hasher.finalize();
        URL_SAFE_NO_PAD.encode(hash)
    }
}

impl Default for PkceVerifier {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for PkceVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PkceVerifier")
            .field("verifier", &"[REDACTED]")
            .field("state", &self.state)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
}

/// OAuth 2.0 flow manager.
pub struct OAuthFlowManager {
    config: OAuthConfig,
    http_client: Arc<dyn HttpClient>,
}

impl OAuthFlowManager {
    pub fn new(config: OAuthConfig, http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            config,
            http_client,
        }
    }

    pub fn config(&self) -> &OAuthConfig {
        &self.config
    }

    /// Build the authorization URL with a fresh PKCE challenge.
    ///
    /// Returns both the URL and the verifier; the verifier is needed again
    /// for [`exchange_code`](Self::exchange_code).
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidConfig`] if the authorization endpoint is
    /// not a valid URL.
    #[instrument(skip(self), fields(client_id = %self.config.client_id))]
    pub fn build_auth_url(&self) -> Result<(String, PkceVerifier)> {
        let verifier = PkceVerifier::new();
        let challenge = verifier.challenge();

        let mut url = Url::parse(&self.config.auth_url)
            .map_err(|e| AuthError::InvalidConfig(format!("Invalid auth URL: {}", e)))?;

        {
            let mut query = url.query_pairs_mut();
            query.append_pair("client_id", &self.config.client_id);
            query.append_pair("response_type", "code");
            query.append_pair("redirect_uri", &self.config.redirect_uri);
            query.append_pair("scope", &self.config.scopes.join(" "));
            query.append_pair("code_challenge", &challenge);
            query.append_pair("code_challenge_method", "S256");
            query.append_pair("state", verifier.state());
            query.append_pair("prompt", "select_account");
        }

        tracing::debug!("Built authorization URL");

        Ok((url.to_string(), verifier))
    }

    /// Exchange an authorization code for an access token.
    ///
    /// # Errors
    ///
    /// - [`AuthError::StateMismatch`] if `state` is not the one issued with `verifier`
    /// - [`AuthError::TokenExchange`] for any non-200 answer, with status and body
    /// - [`AuthError::MalformedToken`] if the body has no `access_token`
    /// - [`AuthError::Http`] if the token endpoint could not be reached
    #[instrument(skip(self, code, state, verifier))]
    pub async fn exchange_code(
        &self,
        code: &str,
        state: &str,
        verifier: &PkceVerifier,
    ) -> Result<AccessToken> {
        if state != verifier.state() {
            warn!("OAuth state mismatch on callback");
            return Err(AuthError::StateMismatch);
        }

        let scope = self.config.scopes.join(" ");
        let mut params = vec![
            ("client_id", self.config.client_id.as_str()),
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("code_verifier", verifier.verifier()),
            ("scope", scope.as_str()),
        ];
        if let Some(ref client_secret) = self.config.client_secret {
            params.push(("client_secret", client_secret.as_str()));
        }

        let encoded = serde_urlencoded::to_string(&params).map_err(|e| {
            AuthError::InvalidConfig(format!("Failed to encode token request: {}", e))
        })?;

        tracing::debug!("Exchanging authorization code for an access token");

        let request = HttpRequest::new(HttpMethod::Post, self.config.token_url.clone())
            .accept("application/json")
            .form(encoded)
            .timeout(TOKEN_REQUEST_TIMEOUT);

        let response = self.http_client.execute(request).await?;

        if response.status != 200 {
            let body = response.text_lossy();
            warn!(
                status = response.status,
                error = %body,
                "Token exchange failed"
            );
            return Err(AuthError::TokenExchange {
                status: response.status,
                body,
            });
        }

        let token_response: TokenResponse = response
            .json()
            .map_err(|e| AuthError::MalformedToken(e.to_string()))?;

        let access_token = token_response
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AuthError::MalformedToken("missing access_token".to_string()))?;

        tracing::info!(
            expires_in = ?token_response.expires_in,
            "Exchanged authorization code for an access token"
        );

        Ok(AccessToken::expiring_in(
            access_token,
            token_response.expires_in,
        ))
    }
}
