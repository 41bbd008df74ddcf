//! # Playlist Publisher Module
//!
//! Creates a private playlist named after the mood and fills it with the
//! aggregated tracks, in order.
//!
//! ## Steps
//!
//! 1. Resolve the current user (`GET /me`).
//! 2. Create a private playlist named by [`playlist_name`] and described by
//!    [`playlist_description`].
//! 3. Add the first [`MAX_ITEMS_PER_ADD`] track URIs in one request.
//!
//! ## Failures
//!
//! Every failure comes back as a [`PublishError`], kept separate from "no
//! tracks found" so the user can tell the two apart. When step 3 fails the
//! playlist already exists; [`PublishError::AddItems`] carries its handle so
//! the empty playlist can be reported. It is not deleted.

use crate::mood::MoodDecision;
use crate::spotify::{ApiError, MusicApi, NewPlaylist, PlaylistHandle, MAX_ITEMS_PER_ADD};
use crate::track::TrackList;
use log::{debug, info};
use thiserror::Error;

/// Spotify rejects playlist descriptions longer than this many characters.
pub const DESCRIPTION_LIMIT: usize = 300;

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("there are no tracks to publish")]
    NothingToPublish,
    #[error("could not identify the Spotify user")]
    CurrentUser(#[source] ApiError),
    #[error("could not create the playlist")]
    CreatePlaylist(#[source] ApiError),
    /// The playlist exists but is empty.
    #[error("playlist {} was created but is empty because adding tracks failed", .playlist.url)]
    AddItems {
        playlist: PlaylistHandle,
        #[source]
        source: ApiError,
    },
}

/// Playlist title, e.g. `😢 Moody: Sad Vibes (12 Songs)`.
///
/// `track_count` is the number of tracks actually added. A blank emoji drops
/// the prefix.
///
/// # Examples
///
/// ```
/// use moody::mood::{MoodClassifier, MoodTable};
/// use moody::publisher::playlist_name;
/// use moody::sentiment::VaderScorer;
///
/// let decision = MoodClassifier::new(MoodTable::default_table(), VaderScorer).classify("so sad today");
/// assert_eq!(playlist_name(&decision, 12), "😢 Moody: Sad Vibes (12 Songs)");
/// ```
#[must_use]
pub fn playlist_name(decision: &MoodDecision, track_count: usize) -> String {
    let emoji = decision.profile.emoji.trim();
    let prefix = if emoji.is_empty() {
        String::new()
    } else {
        format!("{emoji} ")
    };
    format!(
        "{prefix}Moody: {} Vibes ({track_count} Songs)",
        decision.label.capitalized()
    )
}

/// Playlist description quoting the user's text, cut to fit [`DESCRIPTION_LIMIT`].
///
/// Runs of whitespace collapse to one space. Overlong text ends in `…`.
///
/// # Examples
///
/// ```
/// use moody::publisher::{playlist_description, DESCRIPTION_LIMIT};
///
/// assert_eq!(
///     playlist_description("rough   day"),
///     "Auto-generated because you felt: 'rough day'"
/// );
/// assert_eq!(playlist_description(&"a".repeat(1000)).chars().count(), DESCRIPTION_LIMIT);
/// ```
#[must_use]
pub fn playlist_description(text: &str) -> String {
    const HEAD: &str = "Auto-generated because you felt: '";
    const TAIL: &str = "'";

    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let room = DESCRIPTION_LIMIT - HEAD.chars().count() - TAIL.chars().count();

    let quoted = if collapsed.chars().count() > room {
        let mut cut: String = collapsed.chars().take(room - 1).collect();
        cut.push('…');
        cut
    } else {
        collapsed
    };
    format!("{HEAD}{quoted}{TAIL}")
}

/// Creates playlists through a [`MusicApi`].
///
/// Anything implementing the trait works, including `&SpotifyClient`, so one
/// client can be shared with the aggregator.
pub struct PlaylistPublisher<A> {
    api: A,
}

impl<A: MusicApi> PlaylistPublisher<A> {
    pub fn new(api: A) -> Self {
        Self { api }
    }

    /// Create a private playlist for `decision` holding `tracks`.
    ///
    /// At most [`MAX_ITEMS_PER_ADD`] tracks are added, in list order.
    ///
    /// # Errors
    ///
    /// - [`PublishError::NothingToPublish`] when `tracks` is empty; the API is
    ///   not called.
    /// - [`PublishError::CurrentUser`] or [`PublishError::CreatePlaylist`] when
    ///   the failure happened before anything was created.
    /// - [`PublishError::AddItems`] when the playlist exists but is empty.
    pub fn publish(&self, decision: &MoodDecision, tracks: &TrackList) -> Result<PlaylistHandle, PublishError> {
        if tracks.is_empty() {
            return Err(PublishError::NothingToPublish);
        }

        let user = self.api.current_user().map_err(PublishError::CurrentUser)?;
        debug!(
            "Publishing for user {} ({})",
            user.id,
            user.display_name.as_deref().unwrap_or("no display name")
        );

        let uris = tracks.uris(MAX_ITEMS_PER_ADD);
        let request = NewPlaylist {
            name: playlist_name(decision, uris.len()),
            public: false,
            description: playlist_description(&decision.text),
        };
        let playlist = self
            .api
            .create_playlist(&user.id, &request)
            .map_err(PublishError::CreatePlaylist)?;
        info!("Created playlist '{}' ({})", request.name, playlist.id);

        if let Err(source) = self.api.add_items_to_playlist(&playlist.id, &uris) {
            return Err(PublishError::AddItems { playlist, source });
        }
        info!("Added {} tracks to playlist {}", uris.len(), playlist.id);

        Ok(playlist)
    }
}
