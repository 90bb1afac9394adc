//! One-shot local listener for the OAuth redirect.
//!
//! [`CallbackListener::bind`] starts an HTTP server on the redirect URI's host
//! and port. The first request carrying `code` or `error` is recorded and
//! answered with a small confirmation page; the recorded outcome is handed to
//! [`CallbackListener::wait`]. The server is stopped when `wait` returns or
//! when the listener is dropped, whichever happens first.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::get;
use axum::Router;
use core_async::net::TcpListener;
use core_async::sync::{oneshot, Mutex};
use core_async::task::JoinHandle;
use serde::Deserialize;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{AuthError, Result};

/// Default wait for the user to finish signing in.
pub const DEFAULT_CALLBACK_TIMEOUT: Duration = Duration::from_secs(300);

const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);
const UNKNOWN_ERROR: &str = "Unknown error";

/// What the authorization server sent back to the redirect URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
    Code { code: String, state: Option<String> },
    Denied { description: String },
}

#[derive(Debug, Default, Deserialize)]
struct CallbackQuery {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

type OutcomeSlot = Arc<Mutex<Option<oneshot::Sender<CallbackOutcome>>>>;

/// Scoped local HTTP server that receives exactly one OAuth callback.
pub struct CallbackListener {
    redirect_uri: Url,
    local_addr: SocketAddr,
    outcome: Option<oneshot::Receiver<CallbackOutcome>>,
    shutdown: Option<oneshot::Sender<()>>,
    server: Option<JoinHandle<()>>,
}

impl CallbackListener {
    /// Bind to the host and port of `redirect_uri` and start serving.
    ///
    /// `localhost` binds the IPv4 loopback address. Port `0` picks a free
    /// port; [`redirect_uri`](Self::redirect_uri) then reports the real one.
    pub async fn bind(redirect_uri: &str) -> Result<Self> {
        let mut redirect = Url::parse(redirect_uri)
            .map_err(|e| AuthError::InvalidConfig(format!("Invalid redirect URI: {}", e)))?;

        let ip = match redirect.host_str() {
            Some("localhost") => IpAddr::V4(Ipv4Addr::LOCALHOST),
            Some(host) => host
                .trim_matches(|c| c == '[' || c == ']')
                .parse::<IpAddr>()
                .map_err(|_| {
                    AuthError::InvalidConfig(format!(
                        "Redirect URI host must be localhost or an IP address: {}",
                        host
                    ))
                })?,
            None => {
                return Err(AuthError::InvalidConfig(
                    "Redirect URI has no host".to_string(),
                ))
            }
        };
        let port = redirect.port_or_known_default().unwrap_or(80);

        let listener = TcpListener::bind((ip, port)).await?;
        let local_addr = listener.local_addr()?;
        redirect
            .set_port(Some(local_addr.port()))
            .map_err(|_| AuthError::InvalidConfig("Redirect URI cannot carry a port".into()))?;

        let path = match redirect.path() {
            "" => "/".to_string(),
            p => p.to_string(),
        };

        let (outcome_tx, outcome_rx) = oneshot::channel();
        let slot: OutcomeSlot = Arc::new(Mutex::new(Some(outcome_tx)));
        let app = Router::new()
            .route(&path, get(handle_callback))
            .with_state(slot);

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let server = core_async::task::spawn(async move {
            let served = axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.await;
                })
                .await;
            if let Err(e) = served {
                warn!(error = %e, "Callback listener stopped with an error");
            }
        });

        info!(address = %local_addr, path = %path, "Callback listener started");

        Ok(Self {
            redirect_uri: redirect,
            local_addr,
            outcome: Some(outcome_rx),
            shutdown: Some(shutdown_tx),
            server: Some(server),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// The redirect URI with the port actually bound.
    pub fn redirect_uri(&self) -> String {
        self.redirect_uri.to_string()
    }

    /// Wait up to `limit` for the callback, then stop the server.
    ///
    /// # Errors
    ///
    /// [`AuthError::Timeout`] when nothing arrived in time.
    pub async fn wait(mut self, limit: Duration) -> Result<CallbackOutcome> {
        let receiver = self.outcome.take().ok_or(AuthError::NotAuthenticated)?;
        let received = core_async::time::timeout(limit, receiver).await;
        self.shutdown().await;

        match received {
            Ok(Ok(outcome)) => Ok(outcome),
            Ok(Err(_)) => Err(AuthError::Listener(std::io::Error::other(
                "callback listener stopped before a callback arrived",
            ))),
            Err(_) => Err(AuthError::Timeout(limit.as_secs())),
        }
    }

    /// Stop the server and join its task.
    pub async fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(mut server) = self.server.take() {
            match core_async::time::timeout(SHUTDOWN_GRACE, &mut server).await {
                Ok(_) => debug!("Callback listener stopped"),
                Err(_) => {
                    warn!("Callback listener did not stop in time, aborting");
                    server.abort();
                }
            }
        }
    }
}

impl Drop for CallbackListener {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(server) = self.server.take() {
            server.abort();
        }
    }
}

async fn handle_callback(
    State(slot): State<OutcomeSlot>,
    Query(query): Query<CallbackQuery>,
) -> (StatusCode, Html<String>) {
    let (status, page, outcome) = match (query.code, query.error) {
        (Some(code), _) if !code.is_empty() => (
            StatusCode::OK,
            success_page(),
            Some(CallbackOutcome::Code {
                code,
                state: query.state,
            }),
        ),
        (_, Some(error)) => {
            let description = query
                .error_description
                .filter(|d| !d.trim().is_empty())
                .unwrap_or_else(|| UNKNOWN_ERROR.to_string());
            warn!(error = %error, "Authorization server reported an error");
            (
                StatusCode::BAD_REQUEST,
                failure_page(&description),
                Some(CallbackOutcome::Denied { description }),
            )
        }
        _ => (
            StatusCode::BAD_REQUEST,
            failure_page("The callback did not contain an authorization code."),
            None,
        ),
    };

    if let Some(outcome) = outcome {
        match slot.lock().await.take() {
            Some(sender) => {
                let _ = sender.send(outcome);
            }
            None => debug!("Ignoring repeated OAuth callback"),
        }
    }

    (status, Html(page))
}

fn success_page() -> String {
    "<html><head><title>Authentication Successful</title></head>\
     <body><h1>Authentication successful</h1>\
     <p>You can close this window and return to the terminal.</p></body></html>"
        .to_string()
}

fn failure_page(description: &str) -> String {
    format!(
        "<html><head><title>Authentication Failed</title></head>\
         <body><h1>Authentication failed</h1><p>{}</p></body></html>",
        escape_html(description)
    )
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
