//! Turn a sentence about how you feel into a private Spotify playlist.
//!
//! Core modules:
//! - [`mood`] - Mood labels, profiles and the keyword-first classifier
//! - [`sentiment`] - VADER polarity scoring
//! - [`aggregator`] - Recommendation lookup with search fallback
//! - [`publisher`] - Playlist creation
//! - [`generator`] - One request end to end
//!
//! ### Supporting Modules
//!
//! - [`spotify`] - `MusicApi` trait and the blocking Web API client
//! - [`auth`] - Authorization-code OAuth and the token cache
//! - [`config`] - Credentials, tuning settings and the data directory
//! - [`track`] - Tracks and the URI-deduplicated track list
//! - [`history`] - Moods seen during an interactive session
//! - [`error`] - Request-level errors
//! - [`cli`] - Command-line interface definitions with clap integration
//! - [`completion`] - Shell completion generation
//!
//! ## Quick Start Example
//!
//! ```no_run
//! use moody::config::Settings;
//! use moody::generator::PlaylistGenerator;
//! use moody::mood::{MoodClassifier, MoodTable};
//! use moody::sentiment::VaderScorer;
//! use moody::spotify::SpotifyClient;
//!
//! let settings = Settings::from_env();
//! let client = SpotifyClient::new("access-token".to_string(), &settings)?;
//! let classifier = MoodClassifier::new(MoodTable::default_table(), VaderScorer);
//!
//! let result = PlaylistGenerator::new(classifier, &client, &settings).run("rough day, need a hug")?;
//! if let Some(playlist) = result.playlist {
//!     println!("{} tracks: {}", result.tracks.len(), playlist.url);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Classification
//!
//! Keywords win: the first mood (in `sad, mellow, happy, hyped` order) with a
//! keyword contained in the lower-cased text is chosen. Otherwise the
//! sentiment score picks the mood:
//!
//! | score            | mood   |
//! |------------------|--------|
//! | `< -0.5`         | sad    |
//! | `[-0.5, -0.1)`   | mellow |
//! | `[-0.1, 0.6)`    | happy  |
//! | `>= 0.6`         | hyped  |
//!
//! ```
//! use moody::mood::{MoodClassifier, MoodLabel, MoodTable};
//! use moody::sentiment::VaderScorer;
//!
//! let classifier = MoodClassifier::new(MoodTable::default_table(), VaderScorer);
//! assert_eq!(classifier.classify("I feel so depressed and lonely").label, MoodLabel::Sad);
//! ```
//!
//! ## Error Handling
//!
//! Each seam has its own `thiserror` enum. Failed Spotify calls while
//! gathering tracks are logged and skipped; what reaches the caller is a
//! [`error::MoodyError`], which keeps "nothing found" apart from "could not
//! save".

pub mod aggregator;
pub mod auth;
pub mod cli;
pub mod completion;
pub mod config;
pub mod error;
pub mod generator;
pub mod history;
pub mod mood;
pub mod publisher;
pub mod sentiment;
pub mod spotify;
pub mod track;
