use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use reqwest::Client;

use crate::{
    config::{self, Settings},
    errors::{AuthError, ConfigError},
    management::TokenCache,
    oauth::{self, ClientAuthMethod, CredentialState, EXPIRY_MARGIN_SECS, OAuthClient, StoredCredential},
    success,
    types::{AuthorizedUser, ClientDescriptor, ClientSecretFile, TokenResponse},
    warning,
};

/// Google's consent endpoint, used when only a cached credential is at hand.
pub const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/auth";

impl StoredCredential for AuthorizedUser {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        if self.token.is_empty() {
            return true;
        }
        match self.expiry {
            Some(expiry) => now >= expiry - Duration::seconds(EXPIRY_MARGIN_SECS),
            None => false,
        }
    }

    fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }
}

impl AuthorizedUser {
    pub fn from_response(
        response: TokenResponse,
        previous_refresh: Option<String>,
        client: &OAuthClient,
        now: DateTime<Utc>,
    ) -> Self {
        AuthorizedUser {
            token: response.access_token,
            refresh_token: response.refresh_token.or(previous_refresh),
            token_uri: client.token_url.clone(),
            client_id: client.client_id.clone(),
            client_secret: client.client_secret.clone(),
            scopes: client.scopes.clone(),
            expiry: response
                .expires_in
                .map(|secs| now + Duration::seconds(secs as i64)),
        }
    }

    fn descriptor(&self) -> ClientDescriptor {
        ClientDescriptor {
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            auth_uri: GOOGLE_AUTH_URL.to_string(),
            token_uri: self.token_uri.clone(),
            redirect_uris: Vec::new(),
        }
    }
}

/// Parses a Google OAuth client descriptor (`installed` or `web` application).
pub fn parse_client_secret(path: &Path, content: &str) -> Result<ClientDescriptor, ConfigError> {
    let malformed = |reason: String| ConfigError::ClientSecretMalformed {
        path: path.to_path_buf(),
        reason,
    };

    let file: ClientSecretFile = serde_json::from_str(content).map_err(|e| malformed(e.to_string()))?;
    file.installed
        .or(file.web)
        .ok_or_else(|| malformed("expected an \"installed\" or \"web\" client".to_string()))
}

pub async fn load_client_secret(path: &Path) -> Result<ClientDescriptor, ConfigError> {
    let content = async_fs::read_to_string(path)
        .await
        .map_err(|source| ConfigError::ClientSecretUnreadable {
            path: path.to_path_buf(),
            source,
        })?;
    parse_client_secret(path, &content)
}

pub fn oauth_client(descriptor: &ClientDescriptor, redirect_uri: String, http: Client) -> OAuthClient {
    OAuthClient {
        provider: "YouTube",
        client_id: descriptor.client_id.clone(),
        client_secret: descriptor.client_secret.clone(),
        auth_url: descriptor.auth_uri.clone(),
        token_url: descriptor.token_uri.clone(),
        redirect_uri,
        scopes: vec![config::YOUTUBE_SCOPE.to_string()],
        // without consent Google only returns a refresh token on first grant
        extra_params: vec![("access_type", "offline"), ("prompt", "consent")],
        auth_method: ClientAuthMethod::RequestBody,
        http,
    }
}

/// Produces a usable YouTube credential with as few prompts as possible.
///
/// # Credential states
///
/// - **NoLocalCredential** - interactive authorization using the client
///   descriptor from `client_secret.json`
/// - **ExpiredWithRefreshToken** - silent refresh with the client stored in
///   `token.json`; if Google rejects it, interactive authorization
/// - **ExpiredNoRefreshToken** - interactive authorization
/// - **Valid** - returned unchanged
///
/// Every new or refreshed credential overwrites `token.json`.
///
/// # Errors
///
/// Every failure is returned to the caller, which is expected to abort the
/// run: there is no point searching or inserting without a credential.
pub async fn authenticate(
    settings: &Settings,
    http: Client,
    force_interactive: bool,
) -> Result<AuthorizedUser, AuthError> {
    let cache: TokenCache<AuthorizedUser> = TokenCache::new(&settings.youtube_token_file);
    let stored = if force_interactive { None } else { cache.load().await };
    let descriptor = stored.as_ref().map(AuthorizedUser::descriptor);

    let credential = match (oauth::classify(stored, Utc::now()), descriptor) {
        (CredentialState::Valid(credential), _) => return Ok(credential),
        (CredentialState::ExpiredWithRefreshToken(refresh_token), Some(descriptor)) => {
            let client = oauth_client(&descriptor, settings.youtube_redirect_uri(), http.clone());
            match client.refresh(&refresh_token).await {
                Ok(response) => AuthorizedUser::from_response(response, Some(refresh_token), &client, Utc::now()),
                Err(e) => {
                    warning!("YouTube token refresh failed, authorizing again: {}", e);
                    authorize_interactive(settings, http).await?
                }
            }
        }
        _ => authorize_interactive(settings, http).await?,
    };

    cache.persist(&credential).await?;
    Ok(credential)
}

async fn authorize_interactive(settings: &Settings, http: Client) -> Result<AuthorizedUser, AuthError> {
    let descriptor = load_client_secret(&settings.youtube_client_secret_file).await?;
    let client = oauth_client(&descriptor, settings.youtube_redirect_uri(), http);

    let response = client.authorize_interactive().await?;
    success!("YouTube authorization successful!");
    Ok(AuthorizedUser::from_response(response, None, &client, Utc::now()))
}
