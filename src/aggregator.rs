//! # Track Aggregation Module
//!
//! Finds candidate tracks for a [`MoodProfile`] in two stages:
//!
//! 1. **Recommendations** seeded with the profile's genres/tracks and its
//!    valence/energy window. A non-empty answer ends the search.
//! 2. **Search fallback**, only when stage 1 failed or came back empty: one
//!    keyword search per fallback term, in the profile's order.
//!
//! Results are deduplicated by URI with the first occurrence kept. A failed
//! call is logged and contributes nothing, with one exception: when Spotify
//! rejects the access token, later calls would be rejected too, so the
//! aggregation stops with [`AuthError::TokenRejected`].
//! The number of external calls per request is capped by
//! [`Settings::max_external_calls`].

use crate::auth::AuthError;
use crate::config::Settings;
use crate::error::error_chain;
use crate::mood::MoodProfile;
use crate::spotify::{ApiError, MusicApi, RecommendationRequest, TrackItem};
use crate::track::{Track, TrackList};
use log::{debug, info, warn};
use std::thread;

/// Which stage produced the tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Recommendations,
    Search,
}

/// Outcome of one aggregation, with bookkeeping for the caller's report.
#[derive(Debug, Clone)]
pub struct Aggregation {
    pub tracks: TrackList,
    pub strategy: Strategy,
    /// External calls made
    pub calls: usize,
    /// Calls that failed and were treated as empty
    pub failures: usize,
}

/// Gathers tracks for a mood from a [`MusicApi`].
pub struct TrackAggregator<'s, A> {
    api: A,
    settings: &'s Settings,
}

impl<'s, A: MusicApi> TrackAggregator<'s, A> {
    pub fn new(api: A, settings: &'s Settings) -> Self {
        Self { api, settings }
    }

    /// Tracks for `profile`; empty only if every strategy came up empty.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::TokenRejected`] if Spotify refuses the access token.
    pub fn fetch(&self, profile: &MoodProfile) -> Result<TrackList, AuthError> {
        Ok(self.fetch_with_report(profile)?.tracks)
    }

    /// Like [`TrackAggregator::fetch`], with call bookkeeping.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::TokenRejected`] if Spotify refuses the access token.
    pub fn fetch_with_report(&self, profile: &MoodProfile) -> Result<Aggregation, AuthError> {
        let mut calls = 0;
        let mut failures = 0;

        if let Some(result) = self.recommend(profile, &mut calls) {
            match result {
                Ok(items) if !items.is_empty() => {
                    let tracks = to_track_list(items);
                    info!("Found {} tracks via recommendations for '{}'", tracks.len(), profile.label);
                    return Ok(Aggregation {
                        tracks,
                        strategy: Strategy::Recommendations,
                        calls,
                        failures,
                    });
                }
                Ok(_) => info!("Recommendations for '{}' came back empty; using search", profile.label),
                Err(ApiError::Unauthorized { endpoint }) => return Err(AuthError::TokenRejected { endpoint }),
                Err(e) => {
                    warn!("Recommendations for '{}' failed: {}; using search", profile.label, error_chain(&e));
                    failures += 1;
                }
            }
        }

        let mut tracks = TrackList::new();
        let terms = profile.search_terms.iter().take(self.settings.fallback_term_limit);
        for (i, term) in terms.enumerate() {
            if calls >= self.settings.max_external_calls {
                warn!(
                    "Call budget of {} reached; skipping remaining search terms starting at '{term}'",
                    self.settings.max_external_calls
                );
                break;
            }
            if i > 0 && !self.settings.fallback_delay.is_zero() {
                thread::sleep(self.settings.fallback_delay);
            }

            calls += 1;
            match self.api.search_tracks(
                term,
                self.settings.fallback_result_limit,
                self.settings.market.as_deref(),
            ) {
                Ok(items) => {
                    debug!("Search '{term}' returned {} tracks", items.len());
                    tracks.extend(items.into_iter().map(Track::from));
                }
                Err(ApiError::Unauthorized { endpoint }) => return Err(AuthError::TokenRejected { endpoint }),
                Err(e) => {
                    warn!("Search '{term}' failed: {}", error_chain(&e));
                    failures += 1;
                }
            }
        }

        info!(
            "Found {} tracks via search for '{}' ({calls} calls, {failures} failed)",
            tracks.len(),
            profile.label
        );
        Ok(Aggregation {
            tracks,
            strategy: Strategy::Search,
            calls,
            failures,
        })
    }

    /// `None` when the primary stage cannot run (no seeds or no call budget).
    fn recommend(
        &self,
        profile: &MoodProfile,
        calls: &mut usize,
    ) -> Option<Result<Vec<TrackItem>, ApiError>> {
        if profile.seeds.is_empty() {
            debug!("Mood '{}' has no seeds; skipping recommendations", profile.label);
            return None;
        }
        if self.settings.max_external_calls == 0 {
            return None;
        }

        *calls += 1;
        Some(self.api.recommendations(&recommendation_request(profile, self.settings)))
    }
}

/// Recommendation query for `profile`: range midpoints as targets, the
/// ranges themselves as bounds.
#[must_use]
pub fn recommendation_request(profile: &MoodProfile, settings: &Settings) -> RecommendationRequest {
    RecommendationRequest {
        seeds: profile.seeds.clone(),
        limit: settings.recommendation_limit,
        target_valence: profile.target_valence(),
        target_energy: profile.target_energy(),
        valence_range: Some(profile.valence_range),
        energy_range: Some(profile.energy_range),
        market: settings.market.clone(),
    }
}

fn to_track_list(items: Vec<TrackItem>) -> TrackList {
    items.into_iter().map(Track::from).collect()
}
