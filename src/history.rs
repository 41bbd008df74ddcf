//! # History Module
//!
//! In-memory log of the moods detected during one interactive session.
//!
//! Every request is recorded, including ones that found no tracks, because
//! the mood was still detected. Nothing is written to disk; the log ends with
//! the session.
//!
//! ```
//! use moody::history::SessionHistory;
//! use moody::mood::MoodLabel;
//!
//! let mut history = SessionHistory::new();
//! history.record(MoodLabel::Sad, "rough day");
//! history.record(MoodLabel::Hyped, "pumped for tonight");
//!
//! let newest = history.recent().next().unwrap();
//! assert_eq!(newest.label, MoodLabel::Hyped);
//! assert_eq!(newest.text, "pumped for tonight");
//! ```

use crate::mood::MoodLabel;

/// How many entries [`SessionHistory::recent`] shows.
pub const DISPLAY_WINDOW: usize = 5;

/// One detected mood and the text it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub label: MoodLabel,
    pub text: String,
}

/// Append-only (label, text) log.
#[derive(Debug, Clone, Default)]
pub struct SessionHistory {
    entries: Vec<HistoryEntry>,
}

impl SessionHistory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry. Older entries are kept but fall out of [`Self::recent`].
    pub fn record(&mut self, label: MoodLabel, text: impl Into<String>) {
        self.entries.push(HistoryEntry {
            label,
            text: text.into(),
        });
    }

    /// The last [`DISPLAY_WINDOW`] entries, newest first.
    pub fn recent(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter().rev().take(DISPLAY_WINDOW)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
