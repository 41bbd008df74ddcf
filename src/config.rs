//! # Configuration Module
//!
//! This module handles configuration and data directory setup for Moody.
//!
//! ## Credentials
//!
//! Spotify credentials are never compiled in. They are read from the
//! environment (a `.env` file in the working directory is loaded at startup):
//!
//! - `SPOTIFY_CLIENT_ID` / `SPOTIPY_CLIENT_ID`
//! - `SPOTIFY_CLIENT_SECRET` / `SPOTIPY_CLIENT_SECRET`
//! - `SPOTIFY_REDIRECT_URI` / `SPOTIPY_REDIRECT_URI` (defaults to
//!   `http://localhost:8888/callback`)
//!
//! ## Data Storage
//!
//! The OAuth token cache lives in the platform-standard data directory:
//! - Linux: `~/.local/share/moody/`
//! - macOS: `~/Library/Application Support/moody/`
//! - Windows: `%APPDATA%\moody\`

use crate::auth::AuthError;
use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_REDIRECT_URI: &str = "http://localhost:8888/callback";

/// Returns the platform-appropriate data directory for Moody, creating it if needed.
///
/// # Errors
///
/// This function will return an error if:
/// - The system data directory cannot be determined
/// - The moody subdirectory cannot be created due to permissions
pub fn get_data_dir() -> Result<PathBuf> {
    let data_dir = dirs::data_dir().ok_or_else(|| {
        anyhow::anyhow!(
            "Could not determine system data directory. Please ensure your platform supports standard data directories."
        )
    })?;

    let moody_dir = data_dir.join("moody");
    fs::create_dir_all(&moody_dir).with_context(|| {
        format!(
            "Failed to create Moody data directory at {}. Please check file permissions.",
            moody_dir.display()
        )
    })?;

    Ok(moody_dir)
}

/// Path of the cached OAuth token.
///
/// # Errors
///
/// See [`get_data_dir`].
pub fn get_token_cache_path() -> Result<PathBuf> {
    Ok(get_data_dir()?.join("token.json"))
}

/// Spotify application credentials.
#[derive(Clone)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("redirect_uri", &self.redirect_uri)
            .finish()
    }
}

impl Credentials {
    /// Read credentials from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MissingCredentials`] naming the first missing variable.
    pub fn from_env() -> Result<Self, AuthError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read credentials through `lookup`, which maps a variable name to its value.
    ///
    /// # Errors
    ///
    /// See [`Credentials::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AuthError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| {
            [format!("SPOTIFY_{name}"), format!("SPOTIPY_{name}")]
                .iter()
                .find_map(|key| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty()))
        };

        let client_id = read("CLIENT_ID").ok_or(AuthError::MissingCredentials("SPOTIFY_CLIENT_ID"))?;
        let client_secret = read("CLIENT_SECRET").ok_or(AuthError::MissingCredentials("SPOTIFY_CLIENT_SECRET"))?;
        let redirect_uri = read("REDIRECT_URI").unwrap_or_else(|| DEFAULT_REDIRECT_URI.to_string());

        Ok(Self {
            client_id,
            client_secret,
            redirect_uri,
        })
    }
}

/// Tuning knobs for one playlist request.
#[derive(Debug, Clone)]
pub struct Settings {
    /// ISO 3166-1 country code passed to search, if any
    pub market: Option<String>,
    /// Timeout applied to every HTTP call
    pub request_timeout: Duration,
    /// Tracks requested from the recommendations endpoint
    pub recommendation_limit: u32,
    /// How many of a profile's search terms the fallback may use
    pub fallback_term_limit: usize,
    /// Tracks requested per fallback search
    pub fallback_result_limit: u32,
    /// Upper bound on aggregator calls per request (primary + searches)
    pub max_external_calls: usize,
    /// Pause between successive fallback searches
    pub fallback_delay: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            market: None,
            request_timeout: Duration::from_secs(10),
            recommendation_limit: 15,
            fallback_term_limit: 3,
            fallback_result_limit: 5,
            max_external_calls: 4,
            fallback_delay: Duration::ZERO,
        }
    }
}

impl Settings {
    /// Defaults plus `SPOTIFY_MARKET` from the environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            market: std::env::var("SPOTIFY_MARKET")
                .ok()
                .map(|m| m.trim().to_uppercase())
                .filter(|m| !m.is_empty()),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_credentials_from_spotify_vars() {
        let creds = Credentials::from_lookup(lookup_from(&[
            ("SPOTIFY_CLIENT_ID", "id"),
            ("SPOTIFY_CLIENT_SECRET", "secret"),
            ("SPOTIFY_REDIRECT_URI", "http://127.0.0.1:9000/cb"),
        ]))
        .unwrap();
        assert_eq!(creds.client_id, "id");
        assert_eq!(creds.client_secret, "secret");
        assert_eq!(creds.redirect_uri, "http://127.0.0.1:9000/cb");
    }

    #[test]
    fn test_credentials_accept_spotipy_prefix_and_default_redirect() {
        let creds = Credentials::from_lookup(lookup_from(&[
            ("SPOTIPY_CLIENT_ID", "legacy-id"),
            ("SPOTIPY_CLIENT_SECRET", "legacy-secret"),
        ]))
        .unwrap();
        assert_eq!(creds.client_id, "legacy-id");
        assert_eq!(creds.redirect_uri, DEFAULT_REDIRECT_URI);
    }

    #[test]
    fn test_missing_credentials_are_reported() {
        let err = Credentials::from_lookup(lookup_from(&[("SPOTIFY_CLIENT_ID", "id")])).unwrap_err();
        assert!(matches!(err, AuthError::MissingCredentials("SPOTIFY_CLIENT_SECRET")));

        let err = Credentials::from_lookup(lookup_from(&[("SPOTIFY_CLIENT_ID", "  ")])).unwrap_err();
        assert!(matches!(err, AuthError::MissingCredentials("SPOTIFY_CLIENT_ID")));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let creds = Credentials::from_lookup(lookup_from(&[
            ("SPOTIFY_CLIENT_ID", "id"),
            ("SPOTIFY_CLIENT_SECRET", "hunter2"),
        ]))
        .unwrap();
        assert!(!format!("{creds:?}").contains("hunter2"));
    }

    #[test]
    fn test_default_settings_bound_calls() {
        let settings = Settings::default();
        assert_eq!(settings.max_external_calls, 1 + settings.fallback_term_limit);
        assert!(settings.request_timeout > Duration::ZERO);
    }

    #[test]
    fn test_data_dir_is_created() {
        let dir = get_data_dir().expect("data dir should resolve");
        assert!(dir.is_dir());
        assert!(dir.ends_with("moody"));
        let token = get_token_cache_path().unwrap();
        assert_eq!(token.file_name().unwrap(), "token.json");
    }
}
