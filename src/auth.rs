//! # Spotify OAuth Module
//!
//! Implements the authorization-code flow with a single fixed scope,
//! `playlist-modify-private`, and keeps the resulting token in a JSON cache
//! file so later runs only need to refresh it.
//!
//! ## Flow
//!
//! ```text
//! moody auth  → print authorize URL → user approves → paste redirect URL
//!             → exchange code → token.json
//! moody create → load token.json → refresh if expiring → API calls
//! ```
//!
//! Any failure here is fatal for the request: without a token nothing can be
//! published.

use crate::config::Credentials;
use log::{debug, info};
use rand::distributions::Alphanumeric;
use rand::Rng;
use reqwest::blocking::Client;
use reqwest::{StatusCode, Url};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use thiserror::Error;

pub const AUTHORIZE_URL: &str = "https://accounts.spotify.com/authorize";
pub const TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
pub const SCOPE: &str = "playlist-modify-private";

/// Tokens this close to expiry are refreshed before use.
const EXPIRY_MARGIN_SECS: u64 = 60;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing Spotify credential: set {0} in the environment or .env file")]
    MissingCredentials(&'static str),
    #[error("not authorized yet (no token at {}); run `moody auth` first", .path.display())]
    NotAuthorized { path: PathBuf },
    #[error("authorization was denied: {0}")]
    Denied(String),
    #[error("the redirect URL does not contain an authorization code")]
    MissingCode,
    #[error("the redirect URL's state does not match this authorization request")]
    StateMismatch,
    /// A bare code was pasted where the state must be checked.
    #[error("paste the full URL you were redirected to, not just the code")]
    RedirectUrlRequired,
    #[error("token request failed")]
    Transport(#[from] reqwest::Error),
    #[error("token endpoint returned {status}: {body}")]
    TokenEndpoint { status: StatusCode, body: String },
    #[error("the cached token cannot be refreshed; run `moody auth` again")]
    NoRefreshToken,
    /// Spotify refused the access token in the middle of a request.
    #[error("Spotify rejected the access token at {endpoint}; run `moody auth` again")]
    TokenRejected { endpoint: String },
    #[error("failed to access token cache at {}", .path.display())]
    Cache {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("token cache at {} is corrupt; run `moody auth` again", .path.display())]
    CacheFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

/// A bearer token plus what is needed to renew it.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    pub refresh_token: Option<String>,
    /// Unix timestamp (seconds) after which the access token is invalid
    pub expires_at: u64,
    #[serde(default)]
    pub scope: Option<String>,
}

impl std::fmt::Debug for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Token")
            .field("expires_at", &self.expires_at)
            .field("has_refresh_token", &self.refresh_token.is_some())
            .field("scope", &self.scope)
            .finish()
    }
}

impl Token {
    /// Whether the token expires within the refresh margin of `now`.
    #[must_use]
    pub fn needs_refresh(&self, now: u64) -> bool {
        now + EXPIRY_MARGIN_SECS >= self.expires_at
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
    refresh_token: Option<String>,
    scope: Option<String>,
}

impl TokenResponse {
    /// Spotify may omit the refresh token when refreshing; keep the old one then.
    fn into_token(self, now: u64, previous_refresh: Option<String>) -> Token {
        Token {
            access_token: self.access_token,
            refresh_token: self.refresh_token.or(previous_refresh),
            expires_at: now + self.expires_in,
            scope: self.scope,
        }
    }
}

/// JSON file holding the current [`Token`].
#[derive(Debug, Clone)]
pub struct TokenCache {
    path: PathBuf,
}

impl TokenCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `Ok(None)` when no token has been cached yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(&self) -> Result<Option<Token>, AuthError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(AuthError::Cache {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        serde_json::from_str(&raw).map(Some).map_err(|source| AuthError::CacheFormat {
            path: self.path.clone(),
            source,
        })
    }

    /// Write `token`, readable by the owner only on Unix.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self, token: &Token) -> Result<(), AuthError> {
        let cache_err = |source| AuthError::Cache {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(cache_err)?;
        }
        let raw = serde_json::to_string_pretty(token).map_err(|source| AuthError::CacheFormat {
            path: self.path.clone(),
            source,
        })?;

        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(&self.path).map_err(cache_err)?;
        // an older cache may have been created with wider permissions
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(fs::Permissions::from_mode(0o600)).map_err(cache_err)?;
        }
        file.write_all(raw.as_bytes()).map_err(cache_err)?;
        debug!("Saved token cache to {}", self.path.display());
        Ok(())
    }
}

/// Talks to the Spotify accounts service.
pub struct OAuthClient {
    http: Client,
    credentials: Credentials,
    token_url: String,
}

impl OAuthClient {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(credentials: Credentials, timeout: Duration) -> Result<Self, AuthError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            credentials,
            token_url: TOKEN_URL.to_string(),
        })
    }

    /// Send token requests to another endpoint.
    #[must_use]
    pub fn with_token_url(mut self, token_url: impl Into<String>) -> Self {
        self.token_url = token_url.into();
        self
    }

    /// URL the user must open to grant access.
    #[must_use]
    pub fn authorize_url(&self, state: &str) -> String {
        let params = [
            ("client_id", self.credentials.client_id.as_str()),
            ("response_type", "code"),
            ("redirect_uri", self.credentials.redirect_uri.as_str()),
            ("scope", SCOPE),
            ("state", state),
        ];
        Url::parse_with_params(AUTHORIZE_URL, &params)
            .map(String::from)
            .unwrap_or_else(|_| AUTHORIZE_URL.to_string())
    }

    /// Trade an authorization code for a token.
    ///
    /// # Errors
    ///
    /// Returns an error if the token endpoint cannot be reached or rejects the code.
    pub fn exchange_code(&self, code: &str) -> Result<Token, AuthError> {
        let form = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.credentials.redirect_uri.as_str()),
        ];
        let response = self.request_token(&form)?;
        info!("Obtained Spotify access token");
        Ok(response.into_token(now_secs(), None))
    }

    /// Renew `token` with its refresh token.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::NoRefreshToken`] if `token` has no refresh token, or
    /// an error if the token endpoint fails.
    pub fn refresh(&self, token: &Token) -> Result<Token, AuthError> {
        let refresh_token = token.refresh_token.as_deref().ok_or(AuthError::NoRefreshToken)?;
        let form = [("grant_type", "refresh_token"), ("refresh_token", refresh_token)];
        let response = self.request_token(&form)?;
        info!("Refreshed Spotify access token");
        Ok(response.into_token(now_secs(), token.refresh_token.clone()))
    }

    fn request_token(&self, form: &[(&str, &str)]) -> Result<TokenResponse, AuthError> {
        let response = self
            .http
            .post(&self.token_url)
            .basic_auth(&self.credentials.client_id, Some(&self.credentials.client_secret))
            .form(form)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(AuthError::TokenEndpoint {
                status,
                body: body.trim().to_string(),
            });
        }
        Ok(response.json()?)
    }
}

/// Random value tying a redirect back to the request that started it.
#[must_use]
pub fn generate_state() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(16)
        .map(char::from)
        .collect()
}

/// Extract the authorization code from what the user pasted.
///
/// Accepts the full redirect URL, or the bare code when no state was issued.
/// When `expected_state` is set, the input must be a URL whose `state`
/// matches it.
///
/// # Errors
///
/// Returns an error if access was denied, the state does not match or cannot
/// be checked, or no code is present.
pub fn parse_redirect(input: &str, expected_state: Option<&str>) -> Result<String, AuthError> {
    let input = input.trim();
    let Ok(url) = Url::parse(input) else {
        return if input.is_empty() {
            Err(AuthError::MissingCode)
        } else if expected_state.is_some() {
            Err(AuthError::RedirectUrlRequired)
        } else {
            Ok(input.to_string())
        };
    };

    let param = |name: &str| {
        url.query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    };

    if let Some(error) = param("error") {
        return Err(AuthError::Denied(error));
    }
    if let Some(expected) = expected_state {
        if param("state").as_deref() != Some(expected) {
            return Err(AuthError::StateMismatch);
        }
    }
    param("code").filter(|c| !c.is_empty()).ok_or(AuthError::MissingCode)
}

/// A usable access token from `cache`, refreshing and re-saving it if needed.
///
/// # Errors
///
/// Returns [`AuthError::NotAuthorized`] if nothing is cached, or any refresh
/// or cache failure.
pub fn valid_access_token(oauth: &OAuthClient, cache: &TokenCache) -> Result<String, AuthError> {
    let token = cache.load()?.ok_or_else(|| AuthError::NotAuthorized {
        path: cache.path().to_path_buf(),
    })?;

    if !token.needs_refresh(now_secs()) {
        return Ok(token.access_token);
    }

    debug!("Cached token is expiring; refreshing");
    let refreshed = oauth.refresh(&token)?;
    cache.save(&refreshed)?;
    Ok(refreshed.access_token)
}
