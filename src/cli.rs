//! # Command-Line Interface Module
//!
//! This module defines the command-line interface for Moody using Clap derive macros.
//!
//! ## Commands
//!
//! - `classify`: Detect the mood of a text without touching Spotify
//! - `create`: Detect the mood and build a private Spotify playlist for it
//! - `interactive`: Prompt loop with a short history of detected moods
//! - `moods`: Show the mood profiles in use
//! - `auth`: Authorize Moody against your Spotify account
//! - `completion`: Generate shell completions
//!
//! ## Examples
//!
//! ```bash
//! moody auth
//! moody classify "rough day at work"
//! moody create "best day ever!" --surprise
//! moody --market SE interactive --dry-run
//! ```

use crate::mood::MoodLabel;
use clap::builder::PossibleValue;
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Shell types supported for completion generation
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    /// Bash shell
    Bash,
    /// Zsh shell
    Zsh,
    /// Fish shell
    Fish,
    /// PowerShell
    PowerShell,
    /// Elvish shell
    Elvish,
}

impl ValueEnum for MoodLabel {
    fn value_variants<'a>() -> &'a [Self] {
        &MoodLabel::ALL
    }

    fn to_possible_value(&self) -> Option<PossibleValue> {
        Some(PossibleValue::new(self.as_str()))
    }
}

/// Main application arguments structure.
///
/// Global options apply to every subcommand and override the matching
/// environment settings.
#[derive(Parser, Debug)]
#[command(name = "moody")]
#[command(about = "Moody: tell it how you feel, get a Spotify playlist")]
#[command(version)]
pub struct Args {
    /// Load mood profiles from a JSON file instead of the built-in table
    #[arg(long, global = true, value_name = "FILE", value_hint = clap::ValueHint::FilePath)]
    pub profiles: Option<PathBuf>,

    /// Spotify market (ISO 3166-1 alpha-2) used for recommendations and search
    #[arg(long, global = true, env = "SPOTIFY_MARKET")]
    pub market: Option<String>,

    /// Timeout for each Spotify request, in seconds
    #[arg(long, global = true, value_name = "SECS", default_value = "10")]
    pub timeout: u64,

    /// Maximum Spotify calls spent finding tracks for one request
    #[arg(long, global = true, value_name = "N", default_value = "4")]
    pub max_calls: usize,

    /// Pause between fallback searches, in milliseconds
    #[arg(long, global = true, value_name = "MS", default_value = "0")]
    pub search_delay: u64,

    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Options shared by the commands that build playlists.
#[derive(ClapArgs, Debug, Clone, Copy, Default)]
pub struct PlaylistFlags {
    /// Show what would be added without creating a playlist
    #[arg(long)]
    pub dry_run: bool,

    /// Put a cheer-up song at the top when the mood is very negative
    #[arg(long)]
    pub surprise: bool,
}

/// Enumeration of all available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Detect the mood of a text (offline)
    ///
    /// Prints the mood label, what decided it (a keyword or the sentiment
    /// score), and the valence/energy targets that would be requested.
    Classify {
        /// How you feel, in your own words
        #[arg(value_hint = clap::ValueHint::Other)]
        text: String,
    },

    /// Create a private Spotify playlist for how you feel
    ///
    /// Requires a prior `moody auth`.
    Create {
        /// How you feel, in your own words
        #[arg(value_hint = clap::ValueHint::Other)]
        text: String,

        #[command(flatten)]
        flags: PlaylistFlags,
    },

    /// Prompt for moods repeatedly
    ///
    /// Type `history` to see the last five moods, `quit` to leave.
    Interactive {
        #[command(flatten)]
        flags: PlaylistFlags,
    },

    /// Show the mood profiles in use
    Moods {
        /// Show only this mood
        #[arg(value_enum)]
        label: Option<MoodLabel>,
    },

    /// Authorize Moody to create playlists on your account
    ///
    /// Prints an authorization URL. After approving, paste the URL you were
    /// redirected to. The resulting token is cached in the data directory.
    Auth {
        /// Authorization code or full redirect URL, skipping the prompt
        #[arg(long)]
        code: Option<String>,
    },

    /// Generate shell completions
    ///
    /// Usage: moody completion bash > ~/.local/share/bash-completion/completions/moody
    Completion {
        /// Shell to generate completions for
        shell: Shell,
    },
}
