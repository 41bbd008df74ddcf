//! # Error Module
//!
//! Request-level error taxonomy.
//!
//! Most per-call failures ([`crate::spotify::ApiError`]) are absorbed by the
//! aggregator. What reaches the caller is one of these, so "credentials are
//! bad", "nothing found" and "found but could not save" stay
//! distinguishable.
//!
//! Messages never repeat their cause; the cause is reachable through
//! [`std::error::Error::source`], and [`error_chain`] renders the whole chain
//! on one line.

use crate::auth::AuthError;
use crate::mood::MoodLabel;
use crate::publisher::PublishError;
use std::error::Error as StdError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MoodyError {
    /// Credentials or OAuth failed, or Spotify rejected the token mid-request.
    #[error("Spotify authentication failed")]
    Authentication(#[from] AuthError),
    /// Every retrieval strategy came back empty.
    #[error("no {mood} tracks could be found; no playlist was created")]
    EmptyResult { mood: MoodLabel },
    /// Tracks were found but the playlist could not be saved.
    #[error("found tracks but could not save the playlist")]
    Publish(#[from] PublishError),
}

/// `err` and all of its sources, joined with `": "`.
///
/// # Examples
///
/// ```
/// use moody::auth::AuthError;
/// use moody::error::{error_chain, MoodyError};
///
/// let err = MoodyError::from(AuthError::NoRefreshToken);
/// assert_eq!(
///     error_chain(&err),
///     "Spotify authentication failed: the cached token cannot be refreshed; run `moody auth` again"
/// );
/// ```
#[must_use]
pub fn error_chain(err: &dyn StdError) -> String {
    let mut rendered = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        rendered.push_str(": ");
        rendered.push_str(&cause.to_string());
        source = cause.source();
    }
    rendered
}
