//! # Track Module
//!
//! Track values and the deduplicated, discovery-ordered [`TrackList`].
//!
//! ## Identity
//!
//! Two [`Track`]s are the same track when their Spotify URIs match. Name,
//! artist and URL are display data and never take part in equality or
//! hashing, so the same recording found by two searches collapses to one.
//!
//! ## Ordering
//!
//! A [`TrackList`] keeps tracks in the order they were discovered. Adding a
//! URI that is already present is a no-op, so the first occurrence wins.
//! [`TrackList::push_front`] is the one exception: it moves an existing copy
//! to the front instead of ignoring it.
//!
//! ```
//! use moody::track::{dedup_by_uri, Track};
//!
//! let track = |id: &str, name: &str| Track {
//!     name: name.to_string(),
//!     artist: "Artist".to_string(),
//!     url: format!("https://open.spotify.com/track/{id}"),
//!     uri: format!("spotify:track:{id}"),
//! };
//!
//! let list = dedup_by_uri(vec![track("a", "first"), track("b", "b"), track("a", "again")]);
//! assert_eq!(list.uris(10), vec!["spotify:track:a", "spotify:track:b"]);
//! assert_eq!(list.as_slice()[0].name, "first");
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};

/// A candidate song. Identity is the URI alone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    pub name: String,
    pub artist: String,
    pub url: String,
    pub uri: String,
}

impl PartialEq for Track {
    fn eq(&self, other: &Self) -> bool {
        self.uri == other.uri
    }
}

impl Eq for Track {}

impl Hash for Track {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.uri.hash(state);
    }
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' by {}", self.name, self.artist)
    }
}

/// Ordered tracks with unique URIs; the first occurrence of a URI is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackList {
    tracks: Vec<Track>,
    seen: HashSet<String>,
}

impl TrackList {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `track` unless its URI is already present. Returns whether it was added.
    ///
    /// # Examples
    ///
    /// ```
    /// use moody::track::{Track, TrackList};
    ///
    /// let song = Track {
    ///     name: "Song".to_string(),
    ///     artist: "Band".to_string(),
    ///     url: String::new(),
    ///     uri: "spotify:track:1".to_string(),
    /// };
    /// let mut list = TrackList::new();
    /// assert!(list.push(song.clone()));
    /// assert!(!list.push(song));
    /// assert_eq!(list.len(), 1);
    /// ```
    pub fn push(&mut self, track: Track) -> bool {
        if self.seen.insert(track.uri.clone()) {
            self.tracks.push(track);
            true
        } else {
            false
        }
    }

    /// Put `track` at the front, or move an existing copy of it there.
    pub fn push_front(&mut self, track: Track) {
        if !self.seen.insert(track.uri.clone()) {
            self.tracks.retain(|t| t.uri != track.uri);
        }
        self.tracks.insert(0, track);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Track> {
        self.tracks.iter()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Track] {
        &self.tracks
    }

    /// URIs of the first `limit` tracks, in list order.
    #[must_use]
    pub fn uris(&self, limit: usize) -> Vec<String> {
        self.tracks.iter().take(limit).map(|t| t.uri.clone()).collect()
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<Track> {
        self.tracks
    }
}

impl Extend<Track> for TrackList {
    fn extend<I: IntoIterator<Item = Track>>(&mut self, iter: I) {
        for track in iter {
            self.push(track);
        }
    }
}

impl FromIterator<Track> for TrackList {
    fn from_iter<I: IntoIterator<Item = Track>>(iter: I) -> Self {
        let mut list = TrackList::new();
        list.extend(iter);
        list
    }
}

impl IntoIterator for TrackList {
    type Item = Track;
    type IntoIter = std::vec::IntoIter<Track>;

    fn into_iter(self) -> Self::IntoIter {
        self.tracks.into_iter()
    }
}

impl<'a> IntoIterator for &'a TrackList {
    type Item = &'a Track;
    type IntoIter = std::slice::Iter<'a, Track>;

    fn into_iter(self) -> Self::IntoIter {
        self.tracks.iter()
    }
}

/// Collapse `tracks` to unique URIs, keeping first-seen order.
///
/// Running it on its own output changes nothing.
pub fn dedup_by_uri<I: IntoIterator<Item = Track>>(tracks: I) -> TrackList {
    tracks.into_iter().collect()
}
