use chrono::{DateTime, Utc};
use reqwest::Client;

use crate::{
    config::{self, Settings},
    errors::AuthError,
    management::TokenCache,
    oauth::{self, ClientAuthMethod, CredentialState, EXPIRY_MARGIN_SECS, OAuthClient, StoredCredential},
    success,
    types::{Token, TokenResponse},
    warning,
};

impl StoredCredential for Token {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        let expires_at = self.obtained_at.saturating_add(self.expires_in) as i64;
        now.timestamp() >= expires_at - EXPIRY_MARGIN_SECS
    }

    fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }
}

impl Token {
    /// Builds a cache entry from a token endpoint response.
    ///
    /// Spotify does not always rotate refresh tokens; when the response omits
    /// one, the previous refresh token is carried over.
    pub fn from_response(response: TokenResponse, previous_refresh: Option<String>, now: DateTime<Utc>) -> Self {
        Token {
            access_token: response.access_token,
            refresh_token: response.refresh_token.or(previous_refresh),
            scope: response.scope.unwrap_or_default(),
            expires_in: response.expires_in.unwrap_or(3600),
            obtained_at: now.timestamp().max(0) as u64,
        }
    }
}

pub fn oauth_client(settings: &Settings, http: Client) -> Result<OAuthClient, AuthError> {
    let (client_id, client_secret) = settings.spotify_credentials()?;

    Ok(OAuthClient {
        provider: "Spotify",
        client_id: client_id.to_string(),
        client_secret: client_secret.to_string(),
        auth_url: config::SPOTIFY_AUTH_URL.to_string(),
        token_url: config::SPOTIFY_TOKEN_URL.to_string(),
        redirect_uri: settings.spotify_redirect_uri.clone(),
        scopes: vec![config::SPOTIFY_SCOPE.to_string()],
        extra_params: Vec::new(),
        auth_method: ClientAuthMethod::BasicHeader,
        http,
    })
}

/// Produces a usable Spotify credential with as few prompts as possible.
///
/// Uses the cached token while it is valid, refreshes it silently once it has
/// expired, and falls back to the interactive authorization-code flow when
/// there is no cache, no refresh token, or the refresh is rejected. Any new
/// or refreshed token is written back to the cache.
///
/// # Arguments
///
/// * `settings` - Runtime settings; `CLIENT_ID` and `CLIENT_SECRET` must be set
/// * `http` - Shared HTTP client
/// * `force_interactive` - Ignore the cache and always ask the user
///
/// # Errors
///
/// Returns [`AuthError`] when configuration is missing, the user does not
/// complete the authorization, or the token cannot be persisted.
pub async fn authenticate(settings: &Settings, http: Client, force_interactive: bool) -> Result<Token, AuthError> {
    let client = oauth_client(settings, http)?;
    let cache: TokenCache<Token> = TokenCache::new(&settings.spotify_token_file);

    authenticate_with(&client, &cache, force_interactive).await
}

/// [`authenticate`] against an explicit client registration and cache file.
pub async fn authenticate_with(
    client: &OAuthClient,
    cache: &TokenCache<Token>,
    force_interactive: bool,
) -> Result<Token, AuthError> {
    let stored = if force_interactive { None } else { cache.load().await };

    let token = match oauth::classify(stored, Utc::now()) {
        CredentialState::Valid(token) => return Ok(token),
        CredentialState::ExpiredWithRefreshToken(refresh_token) => {
            match client.refresh(&refresh_token).await {
                Ok(response) => Token::from_response(response, Some(refresh_token), Utc::now()),
                Err(e) => {
                    warning!("Spotify token refresh failed, authorizing again: {}", e);
                    authorize_interactive(client).await?
                }
            }
        }
        CredentialState::NoLocalCredential | CredentialState::ExpiredNoRefreshToken => {
            authorize_interactive(client).await?
        }
    };

    cache.persist(&token).await?;
    Ok(token)
}

async fn authorize_interactive(client: &OAuthClient) -> Result<Token, AuthError> {
    let response = client.authorize_interactive().await?;
    success!("Spotify authorization successful!");
    Ok(Token::from_response(response, None, Utc::now()))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn token(obtained_at: u64, expires_in: u64, refresh: Option<&str>) -> Token {
        Token {
            access_token: "access".to_string(),
            refresh_token: refresh.map(str::to_string),
            scope: "user-library-read".to_string(),
            expires_in,
            obtained_at,
        }
    }

    #[test]
    fn expiry_applies_the_safety_margin() {
        let now = Utc.timestamp_opt(10_000, 0).unwrap();

        assert!(!token(10_000, 3600, None).is_expired(now));
        assert!(token(10_000 - 3600 + 240, 3600, None).is_expired(now));
        assert!(!token(10_000 - 3600 + 241, 3600, None).is_expired(now));
    }

    #[test]
    fn refresh_without_rotation_keeps_the_old_refresh_token() {
        let now = Utc.timestamp_opt(5_000, 0).unwrap();
        let response = TokenResponse {
            access_token: "new".to_string(),
            refresh_token: None,
            scope: Some("user-library-read".to_string()),
            expires_in: Some(3600),
            token_type: Some("Bearer".to_string()),
        };

        let refreshed = Token::from_response(response, Some("old-refresh".to_string()), now);

        assert_eq!(refreshed.access_token, "new");
        assert_eq!(refreshed.refresh_token.as_deref(), Some("old-refresh"));
        assert_eq!(refreshed.obtained_at, 5_000);
        assert_eq!(refreshed.expires_in, 3600);
    }

    #[test]
    fn classify_uses_the_refresh_token_of_an_expired_cache() {
        let now = Utc.timestamp_opt(100_000, 0).unwrap();

        let state = oauth::classify(Some(token(0, 3600, Some("r"))), now);

        assert!(matches!(state, CredentialState::ExpiredWithRefreshToken(ref r) if r == "r"));
    }

    #[test]
    fn client_uses_basic_auth_and_library_scope() {
        let settings = Settings::from_lookup(|name| match name {
            "CLIENT_ID" => Some("id".to_string()),
            "CLIENT_SECRET" => Some("secret".to_string()),
            _ => None,
        })
        .unwrap();

        let client = oauth_client(&settings, Client::new()).unwrap();

        assert_eq!(client.auth_method, ClientAuthMethod::BasicHeader);
        assert_eq!(client.scopes, vec!["user-library-read".to_string()]);
        assert_eq!(client.redirect_uri, "http://localhost:8888/callback");
    }

    #[test]
    fn client_requires_credentials() {
        let settings = Settings::from_lookup(|_| None).unwrap();

        assert!(matches!(
            oauth_client(&settings, Client::new()),
            Err(AuthError::Config(_))
        ));
    }
}
