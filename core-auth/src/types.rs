use chrono::{DateTime, Utc};
use std::fmt;

/// Authorization header scheme for Graph requests.
pub const BEARER: &str = "Bearer";

/// An authenticated session.
///
/// Held in memory only. There is no refresh token; once `expires_at` passes
/// the caller must authenticate again.
///
/// # Security
///
/// The `Debug` implementation redacts the token value.
///
/// # Examples
///
/// ```
/// use core_auth::AccessToken;
/// use chrono::{Duration, Utc};
///
/// let token = AccessToken::new("eyJ0eXAi...", Some(Utc::now() + Duration::hours(1)));
/// assert_eq!(token.authorization_header(), "Bearer eyJ0eXAi...");
/// assert!(!format!("{:?}", token).contains("eyJ0eXAi"));
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    token_type: String,
    access_token: String,
    expires_at: Option<DateTime<Utc>>,
}

impl AccessToken {
    pub fn new(access_token: impl Into<String>, expires_at: Option<DateTime<Utc>>) -> Self {
        Self {
            token_type: BEARER.to_string(),
            access_token: access_token.into(),
            expires_at,
        }
    }

    /// Build from a token endpoint `expires_in` value in seconds.
    pub fn expiring_in(access_token: impl Into<String>, expires_in: Option<i64>) -> Self {
        let expires_at = expires_in.map(|secs| Utc::now() + chrono::Duration::seconds(secs));
        Self::new(access_token, expires_at)
    }

    pub fn token_type(&self) -> &str {
        &self.token_type
    }

    /// The raw secret. Do not log it.
    pub fn secret(&self) -> &str {
        &self.access_token
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// Value for the `Authorization` header.
    pub fn authorization_header(&self) -> String {
        format!("{} {}", self.token_type, self.access_token)
    }

    /// Tokens without a known expiry are assumed valid.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires| now >= expires)
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("token_type", &self.token_type)
            .field("access_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Progress of one interactive sign-in.
///
/// # State Transitions
///
/// ```text
/// Unauthenticated -> AwaitingCallback -> Exchanging -> Authenticated
///        |                  |                |
///        +------------------+----------------+------> Failed
/// ```
///
/// `Authenticated` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthState {
    #[default]
    Unauthenticated,
    AwaitingCallback,
    Exchanging,
    Authenticated,
    Failed,
}

impl AuthState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, AuthState::Authenticated | AuthState::Failed)
    }

    /// Whether moving from `self` to `next` is a legal transition.
    pub fn can_transition_to(&self, next: AuthState) -> bool {
        use AuthState::*;
        match (self, next) {
            (Unauthenticated, AwaitingCallback)
            | (AwaitingCallback, Exchanging)
            | (Exchanging, Authenticated) => true,
            (current, Failed) => !current.is_terminal(),
            _ => false,
        }
    }
}

impl fmt::Display for AuthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthState::Unauthenticated => write!(f, "Unauthenticated"),
            AuthState::AwaitingCallback => write!(f, "Awaiting Callback"),
            AuthState::Exchanging => write!(f, "Exchanging Code"),
            AuthState::Authenticated => write!(f, "Authenticated"),
            AuthState::Failed => write!(f, "Failed"),
        }
    }
}
