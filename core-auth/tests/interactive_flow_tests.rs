//! End-to-end sign-in against a real local callback listener with a mocked
//! token endpoint and a scripted browser.

use async_trait::async_trait;
use bridge_traits::browser::BrowserLauncher;
use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse, HttpStream};
use bytes::Bytes;
use core_auth::{AuthError, AuthState, InteractiveAuthenticator, OAuthConfig};
use core_runtime::logging::LogContext;
use mockall::mock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

mock! {
    Http {}

    #[async_trait]
    impl HttpClient for Http {
        async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse>;
        async fn download_stream(&self, request: HttpRequest) -> BridgeResult<HttpStream>;
    }
}

mock! {
    Browser {}

    #[async_trait]
    impl BrowserLauncher for Browser {
        async fn open(&self, url: &str) -> BridgeResult<()>;
    }
}

/// What the scripted browser sends to the redirect URI.
enum Reply {
    Code,
    WrongState,
    Denied,
}

/// Follows the authorization URL straight to the redirect URI, as a browser
/// would after the user signs in.
struct ScriptedBrowser {
    reply: Reply,
    launch_fails: bool,
}

#[async_trait]
impl BrowserLauncher for ScriptedBrowser {
    async fn open(&self, url: &str) -> BridgeResult<()> {
        let params: HashMap<String, String> = Url::parse(url)
            .unwrap()
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        let redirect = &params["redirect_uri"];

        let query = match self.reply {
            Reply::Code => format!("code=auth-code&state={}", params["state"]),
            Reply::WrongState => "code=auth-code&state=forged".to_string(),
            Reply::Denied => "error=access_denied&error_description=Consent+declined".to_string(),
        };

        let client = reqwest::Client::builder().no_proxy().build().unwrap();
        client
            .get(format!("{}?{}", redirect, query))
            .send()
            .await
            .unwrap();

        if self.launch_fails {
            Err(BridgeError::NotAvailable("no display".into()))
        } else {
            Ok(())
        }
    }
}

fn config() -> OAuthConfig {
    OAuthConfig {
        client_id: "client".into(),
        client_secret: None,
        redirect_uri: "http://127.0.0.1:0/callback".into(),
        scopes: vec!["offline_access".into()],
        auth_url: "https://login.example.test/tenant/oauth2/v2.0/authorize".into(),
        token_url: "https://login.example.test/tenant/oauth2/v2.0/token".into(),
    }
}

fn token_endpoint(status: u16, body: &'static str, times: usize) -> MockHttp {
    let mut http = MockHttp::new();
    http.expect_execute()
        .times(times)
        .returning(move |_| {
            Ok(HttpResponse {
                status,
                headers: HashMap::new(),
                body: Bytes::from_static(body.as_bytes()),
            })
        });
    http
}

fn authenticator(
    http: MockHttp,
    browser: impl BrowserLauncher + 'static,
) -> InteractiveAuthenticator {
    InteractiveAuthenticator::new(
        config(),
        Arc::new(http),
        Arc::new(browser),
        LogContext::disabled(),
    )
    .with_callback_timeout(Duration::from_secs(5))
}

#[tokio::test]
async fn test_full_flow_yields_token() {
    let http = token_endpoint(200, r#"{"access_token":"tok-1","expires_in":3599}"#, 1);
    let mut auth = authenticator(
        http,
        ScriptedBrowser {
            reply: Reply::Code,
            launch_fails: false,
        },
    );

    let token = auth.authenticate().await.unwrap();

    assert_eq!(token.secret(), "tok-1");
    assert_eq!(auth.state(), AuthState::Authenticated);
}

#[tokio::test]
async fn test_browser_launch_failure_is_not_fatal() {
    let http = token_endpoint(200, r#"{"access_token":"tok-2"}"#, 1);
    let mut auth = authenticator(
        http,
        ScriptedBrowser {
            reply: Reply::Code,
            launch_fails: true,
        },
    );

    let token = auth.authenticate().await.unwrap();
    assert_eq!(token.secret(), "tok-2");
}

#[tokio::test]
async fn test_denied_callback_fails_without_exchange() {
    let http = token_endpoint(200, "{}", 0);
    let mut auth = authenticator(
        http,
        ScriptedBrowser {
            reply: Reply::Denied,
            launch_fails: false,
        },
    );

    let err = auth.authenticate().await.unwrap_err();

    match err {
        AuthError::CallbackRejected { description } => {
            assert_eq!(description, "Consent declined")
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(auth.state(), AuthState::Failed);
}

#[tokio::test]
async fn test_forged_state_is_rejected() {
    let http = token_endpoint(200, "{}", 0);
    let mut auth = authenticator(
        http,
        ScriptedBrowser {
            reply: Reply::WrongState,
            launch_fails: false,
        },
    );

    let err = auth.authenticate().await.unwrap_err();
    assert!(matches!(err, AuthError::StateMismatch));
    assert_eq!(auth.state(), AuthState::Failed);
}

#[tokio::test]
async fn test_token_endpoint_error_fails() {
    let http = token_endpoint(401, r#"{"error":"invalid_client"}"#, 1);
    let mut auth = authenticator(
        http,
        ScriptedBrowser {
            reply: Reply::Code,
            launch_fails: false,
        },
    );

    let err = auth.authenticate().await.unwrap_err();
    assert!(matches!(err, AuthError::TokenExchange { status: 401, .. }));
    assert_eq!(auth.state(), AuthState::Failed);
}

#[tokio::test]
async fn test_timeout_when_no_callback_arrives() {
    let mut browser = MockBrowser::new();
    browser.expect_open().times(1).returning(|_| Ok(()));

    let mut auth = InteractiveAuthenticator::new(
        config(),
        Arc::new(token_endpoint(200, "{}", 0)),
        Arc::new(browser),
        LogContext::disabled(),
    )
    .with_callback_timeout(Duration::from_millis(100));

    let err = auth.authenticate().await.unwrap_err();
    assert!(matches!(err, AuthError::Timeout(_)));
    assert_eq!(auth.state(), AuthState::Failed);
}
