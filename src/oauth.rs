//! # OAuth 2.0 authorization-code flow
//!
//! Both providers authorize the same way: the user is sent to the provider's
//! consent page, the provider redirects back to a listener on localhost with a
//! one-time code, and the code is exchanged for an access token (plus, usually,
//! a refresh token). This module implements that flow once, parameterised by
//! [`OAuthClient`], together with the small state machine that decides whether
//! a cached credential can be used as-is, refreshed silently, or has to be
//! replaced interactively.
//!
//! ## Flow Implementation
//!
//! 1. **Code Verifier Generation**: Creates a random PKCE verifier and its S256 challenge
//! 2. **State Generation**: Creates a random `state` value bound to this attempt
//! 3. **Local Callback**: Binds the callback listener *before* opening the browser
//! 4. **Authorization Request**: Opens the consent page (or prints the URL)
//! 5. **Callback Wait**: Polls the shared state until the redirect arrives or times out
//! 6. **Token Exchange**: Exchanges code + verifier at the token endpoint
//!
//! ## Client authentication
//!
//! Spotify expects the client id/secret as HTTP Basic credentials, Google
//! expects them as form fields; see [`ClientAuthMethod`].

use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    sync::Arc,
    time::{Duration, Instant},
};

use chrono::{DateTime, Utc};
use reqwest::{Client, Url};
use tokio::sync::Mutex;

use crate::{
    errors::{ApiError, AuthError, ConfigError},
    info, server,
    types::{CallbackOutcome, PendingAuth, SharedAuth, TokenResponse},
    utils, warning,
};

/// Credentials are treated as expired this many seconds before their actual
/// expiry.
pub const EXPIRY_MARGIN_SECS: i64 = 240;

const CALLBACK_TIMEOUT: Duration = Duration::from_secs(120);
const CALLBACK_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// How the client id and secret are presented to the token endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientAuthMethod {
    BasicHeader,
    RequestBody,
}

/// A cached credential the state machine can reason about.
pub trait StoredCredential {
    fn is_expired(&self, now: DateTime<Utc>) -> bool;
    fn refresh_token(&self) -> Option<&str>;
}

/// Where a cached credential stands before any network call is made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialState<T> {
    NoLocalCredential,
    Valid(T),
    ExpiredWithRefreshToken(String),
    ExpiredNoRefreshToken,
}

pub fn classify<T: StoredCredential>(stored: Option<T>, now: DateTime<Utc>) -> CredentialState<T> {
    match stored {
        None => CredentialState::NoLocalCredential,
        Some(credential) if !credential.is_expired(now) => CredentialState::Valid(credential),
        Some(credential) => match credential.refresh_token().filter(|t| !t.is_empty()) {
            Some(refresh_token) => CredentialState::ExpiredWithRefreshToken(refresh_token.to_string()),
            None => CredentialState::ExpiredNoRefreshToken,
        },
    }
}

/// Splits a redirect URI into the local address to bind and the callback path.
///
/// Only plain `http` URIs pointing at `localhost` or a loopback IP are
/// accepted; anything else could never reach our listener.
pub fn callback_address(redirect_uri: &str) -> Result<(SocketAddr, String), ConfigError> {
    let invalid = || ConfigError::RedirectUri(redirect_uri.to_string());

    let url = Url::parse(redirect_uri).map_err(|_| invalid())?;
    if url.scheme() != "http" {
        return Err(invalid());
    }

    let ip = match url.host_str() {
        Some("localhost") => IpAddr::V4(Ipv4Addr::LOCALHOST),
        Some(host) => host
            .trim_start_matches('[')
            .trim_end_matches(']')
            .parse::<IpAddr>()
            .ok()
            .filter(IpAddr::is_loopback)
            .ok_or_else(invalid)?,
        None => return Err(invalid()),
    };
    let port = url.port_or_known_default().ok_or_else(invalid)?;

    Ok((SocketAddr::new(ip, port), url.path().to_string()))
}

/// Polls the shared state until the callback handler records an outcome.
///
/// Returns `None` when `max_wait` elapses first.
pub async fn wait_for_callback(shared_state: &SharedAuth, max_wait: Duration) -> Option<CallbackOutcome> {
    let start = Instant::now();

    while start.elapsed() < max_wait {
        let lock = shared_state.lock().await;
        if let Some(outcome) = lock.as_ref().and_then(|p| p.outcome.clone()) {
            return Some(outcome);
        }
        drop(lock);
        tokio::time::sleep(CALLBACK_POLL_INTERVAL).await;
    }

    None
}

/// One provider's OAuth client registration and endpoints.
#[derive(Debug, Clone)]
pub struct OAuthClient {
    pub provider: &'static str,
    pub client_id: String,
    pub client_secret: String,
    pub auth_url: String,
    pub token_url: String,
    pub redirect_uri: String,
    pub scopes: Vec<String>,
    /// Provider-specific extras appended to the authorization URL.
    pub extra_params: Vec<(&'static str, &'static str)>,
    pub auth_method: ClientAuthMethod,
    pub http: Client,
}

impl OAuthClient {
    /// Builds the consent-page URL for one authorization attempt.
    pub fn authorize_url(&self, state: &str, code_challenge: &str) -> Result<String, ConfigError> {
        let scope = self.scopes.join(" ");
        let mut params: Vec<(&str, &str)> = vec![
            ("client_id", self.client_id.as_str()),
            ("response_type", "code"),
            ("redirect_uri", self.redirect_uri.as_str()),
            ("scope", scope.as_str()),
            ("state", state),
            ("code_challenge", code_challenge),
            ("code_challenge_method", "S256"),
        ];
        params.extend(self.extra_params.iter().copied());

        Url::parse_with_params(&self.auth_url, &params)
            .map(|url| url.to_string())
            .map_err(|_| ConfigError::Invalid {
                name: "auth_uri",
                value: self.auth_url.clone(),
            })
    }

    /// Runs the interactive flow end to end and returns the fresh tokens.
    ///
    /// # Errors
    ///
    /// - [`AuthError::Server`] if the callback port cannot be bound
    /// - [`AuthError::Denied`] if the user declines
    /// - [`AuthError::StateMismatch`] if the redirect belongs to another attempt
    /// - [`AuthError::Timeout`] if no redirect arrives within two minutes
    /// - any error from [`OAuthClient::exchange_code`]
    pub async fn authorize_interactive(&self) -> Result<TokenResponse, AuthError> {
        let (addr, callback_path) = callback_address(&self.redirect_uri)?;

        let code_verifier = utils::generate_code_verifier();
        let code_challenge = utils::generate_code_challenge(&code_verifier);
        let expected_state = utils::generate_state();
        let auth_url = self.authorize_url(&expected_state, &code_challenge)?;

        let shared_state: SharedAuth = Arc::new(Mutex::new(Some(PendingAuth {
            expected_state,
            outcome: None,
        })));

        let listener = server::bind_callback_listener(addr).await?;
        let server_state = Arc::clone(&shared_state);
        let server = tokio::spawn(async move {
            if let Err(e) = server::serve_callback(listener, callback_path, server_state).await {
                warning!("Callback server stopped: {}", e);
            }
        });

        info!("Waiting for {} authorization in your browser...", self.provider);
        if webbrowser::open(&auth_url).is_err() {
            warning!(
                "Failed to open browser. Please navigate to the following URL manually:\n{}",
                auth_url
            )
        }

        let outcome = wait_for_callback(&shared_state, CALLBACK_TIMEOUT).await;
        server.abort();

        match outcome {
            Some(CallbackOutcome::Code(code)) => self.exchange_code(&code, &code_verifier).await,
            Some(CallbackOutcome::Denied(reason)) => Err(AuthError::Denied {
                provider: self.provider,
                reason,
            }),
            Some(CallbackOutcome::StateMismatch) => Err(AuthError::StateMismatch(self.provider)),
            None => Err(AuthError::Timeout(self.provider)),
        }
    }

    pub async fn exchange_code(&self, code: &str, verifier: &str) -> Result<TokenResponse, AuthError> {
        self.token_request(&[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.redirect_uri.as_str()),
            ("code_verifier", verifier),
        ])
        .await
    }

    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse, AuthError> {
        self.token_request(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ])
        .await
    }

    async fn token_request(&self, form: &[(&str, &str)]) -> Result<TokenResponse, AuthError> {
        let mut fields: Vec<(&str, &str)> = form.to_vec();
        let mut request = self.http.post(&self.token_url);
        match self.auth_method {
            ClientAuthMethod::BasicHeader => {
                request = request.basic_auth(&self.client_id, Some(&self.client_secret));
            }
            ClientAuthMethod::RequestBody => {
                fields.push(("client_id", self.client_id.as_str()));
                fields.push(("client_secret", self.client_secret.as_str()));
            }
        }

        let response = request
            .form(&fields)
            .send()
            .await
            .map_err(|e| AuthError::TokenRequest {
                provider: self.provider,
                source: ApiError::from(e),
            })?;

        match utils::read_json::<TokenResponse>(self.provider, response).await {
            Ok(token) => Ok(token),
            Err(ApiError::Status { status, body, .. }) => Err(AuthError::TokenRejected {
                provider: self.provider,
                status,
                body,
            }),
            Err(source) => Err(AuthError::TokenRequest {
                provider: self.provider,
                source,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    struct Fake {
        expires_at: i64,
        refresh: Option<&'static str>,
    }

    impl StoredCredential for Fake {
        fn is_expired(&self, now: DateTime<Utc>) -> bool {
            now.timestamp() >= self.expires_at
        }

        fn refresh_token(&self) -> Option<&str> {
            self.refresh
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn client() -> OAuthClient {
        OAuthClient {
            provider: "Test",
            client_id: "my id".to_string(),
            client_secret: "secret".to_string(),
            auth_url: "https://auth.example.com/authorize".to_string(),
            token_url: "https://auth.example.com/token".to_string(),
            redirect_uri: "http://localhost:8888/callback".to_string(),
            scopes: vec!["a".to_string(), "b".to_string()],
            extra_params: vec![("access_type", "offline")],
            auth_method: ClientAuthMethod::RequestBody,
            http: Client::new(),
        }
    }

    #[test]
    fn classify_covers_every_state() {
        let ts = now().timestamp();

        assert!(matches!(
            classify::<Fake>(None, now()),
            CredentialState::NoLocalCredential
        ));
        assert!(matches!(
            classify(Some(Fake { expires_at: ts + 60, refresh: None }), now()),
            CredentialState::Valid(_)
        ));
        assert_eq!(
            classify(Some(Fake { expires_at: ts - 1, refresh: Some("r") }), now())
                .map_valid_to_unit(),
            CredentialState::ExpiredWithRefreshToken("r".to_string())
        );
        assert_eq!(
            classify(Some(Fake { expires_at: ts - 1, refresh: None }), now()).map_valid_to_unit(),
            CredentialState::ExpiredNoRefreshToken
        );
        assert_eq!(
            classify(Some(Fake { expires_at: ts - 1, refresh: Some("") }), now())
                .map_valid_to_unit(),
            CredentialState::ExpiredNoRefreshToken
        );
    }

    impl<T> CredentialState<T> {
        fn map_valid_to_unit(self) -> CredentialState<()> {
            match self {
                CredentialState::NoLocalCredential => CredentialState::NoLocalCredential,
                CredentialState::Valid(_) => CredentialState::Valid(()),
                CredentialState::ExpiredWithRefreshToken(r) => {
                    CredentialState::ExpiredWithRefreshToken(r)
                }
                CredentialState::ExpiredNoRefreshToken => CredentialState::ExpiredNoRefreshToken,
            }
        }
    }

    #[test]
    fn authorize_url_carries_pkce_state_and_extras() {
        let url = Url::parse(&client().authorize_url("st4te", "chall").unwrap()).unwrap();
        let params: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();

        assert_eq!(url.host_str(), Some("auth.example.com"));
        assert_eq!(params["client_id"], "my id");
        assert_eq!(params["response_type"], "code");
        assert_eq!(params["redirect_uri"], "http://localhost:8888/callback");
        assert_eq!(params["scope"], "a b");
        assert_eq!(params["state"], "st4te");
        assert_eq!(params["code_challenge"], "chall");
        assert_eq!(params["code_challenge_method"], "S256");
        assert_eq!(params["access_type"], "offline");
    }

    #[tokio::test]
    async fn wait_for_callback_times_out_without_outcome() {
        let shared: SharedAuth = Arc::new(Mutex::new(Some(PendingAuth {
            expected_state: "s".to_string(),
            outcome: None,
        })));

        let outcome = wait_for_callback(&shared, Duration::from_millis(10)).await;

        assert!(outcome.is_none());
    }

    #[tokio::test]
    async fn wait_for_callback_returns_recorded_outcome() {
        let shared: SharedAuth = Arc::new(Mutex::new(Some(PendingAuth {
            expected_state: "s".to_string(),
            outcome: Some(CallbackOutcome::Code("c".to_string())),
        })));

        let outcome = wait_for_callback(&shared, Duration::from_secs(1)).await;

        assert_eq!(outcome, Some(CallbackOutcome::Code("c".to_string())));
    }
}
