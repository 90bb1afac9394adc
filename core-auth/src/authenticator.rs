//! Interactive sign-in.
//!
//! [`InteractiveAuthenticator`] drives one authorization-code + PKCE attempt:
//! bind the callback listener, open the browser, wait for the redirect and
//! exchange the code. Each step moves the [`AuthState`] machine forward; any
//! error moves it to [`AuthState::Failed`].

use std::sync::Arc;
use std::time::Duration;

use bridge_traits::browser::BrowserLauncher;
use bridge_traits::http::HttpClient;
use core_runtime::logging::LogContext;
use tracing::{debug, info, warn, Instrument};

use crate::callback::{CallbackListener, CallbackOutcome, DEFAULT_CALLBACK_TIMEOUT};
use crate::error::{AuthError, Result};
use crate::oauth::{OAuthConfig, OAuthFlowManager};
use crate::types::{AccessToken, AuthState};

pub struct InteractiveAuthenticator {
    config: OAuthConfig,
    http_client: Arc<dyn HttpClient>,
    browser: Arc<dyn BrowserLauncher>,
    callback_timeout: Duration,
    state: AuthState,
    log: LogContext,
}

impl InteractiveAuthenticator {
    pub fn new(
        config: OAuthConfig,
        http_client: Arc<dyn HttpClient>,
        browser: Arc<dyn BrowserLauncher>,
        log: LogContext,
    ) -> Self {
        Self {
            config,
            http_client,
            browser,
            callback_timeout: DEFAULT_CALLBACK_TIMEOUT,
            state: AuthState::Unauthenticated,
            log: log.component("auth"),
        }
    }

    /// Override how long to wait for the browser redirect.
    pub fn with_callback_timeout(mut self, timeout: Duration) -> Self {
        self.callback_timeout = timeout;
        self
    }

    pub fn state(&self) -> AuthState {
        self.state
    }

    /// Run a complete sign-in and return the access token.
    ///
    /// Every call is a fresh attempt with a new PKCE pair. The callback
    /// listener is shut down before this returns, on success and on error.
    ///
    /// # Errors
    ///
    /// - [`AuthError::Timeout`] if no callback arrived in time
    /// - [`AuthError::CallbackRejected`] if the user or server denied access
    /// - [`AuthError::TokenExchange`] if the token endpoint refused the code
    pub async fn authenticate(&mut self) -> Result<AccessToken> {
        let span = self.log.operation("authenticate");
        async {
            self.state = AuthState::Unauthenticated;
            match self.attempt().await {
                Ok(token) => {
                    self.transition(AuthState::Authenticated);
                    info!("Authentication successful");
                    Ok(token)
                }
                Err(e) => {
                    self.transition(AuthState::Failed);
                    warn!(error = %e, "Authentication failed");
                    Err(e)
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn attempt(&mut self) -> Result<AccessToken> {
        let listener = CallbackListener::bind(&self.config.redirect_uri).await?;

        let mut config = self.config.clone();
        config.redirect_uri = listener.redirect_uri();
        let flow = OAuthFlowManager::new(config, Arc::clone(&self.http_client));
        let (auth_url, verifier) = flow.build_auth_url()?;

        self.transition(AuthState::AwaitingCallback);

        info!("Opening browser for sign-in");
        if let Err(e) = self.browser.open(&auth_url).await {
            warn!(
                error = %e,
                url = %auth_url,
                "Could not open a browser; open the URL manually to continue"
            );
        }

        match listener.wait(self.callback_timeout).await? {
            CallbackOutcome::Denied { description } => {
                Err(AuthError::CallbackRejected { description })
            }
            CallbackOutcome::Code { code, state } => {
                self.transition(AuthState::Exchanging);
                flow.exchange_code(&code, state.as_deref().unwrap_or_default(), &verifier)
                    .await
            }
        }
    }

    fn transition(&mut self, next: AuthState) {
        if !self.state.can_transition_to(next) {
            warn!(from = %self.state, to = %next, "Unexpected authentication state change");
        }
        debug!(from = %self.state, to = %next, "Authentication state changed");
        self.state = next;
    }
}
