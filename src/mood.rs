//! # Mood Classification Module
//!
//! Turns a free-text description of how someone feels into a [`MoodDecision`].
//!
//! ## Classification Policy
//!
//! 1. The text is lower-cased.
//! 2. Every profile's keywords are tested as substrings, in the fixed label
//!    order `sad`, `mellow`, `happy`, `hyped`. The first label with a hit wins.
//! 3. Without a keyword hit the sentiment score decides, using half-open
//!    thresholds:
//!
//! ```text
//! score < -0.5          => sad
//! -0.5 <= score < -0.1  => mellow
//! -0.1 <= score <  0.6  => happy
//! score >= 0.6          => hyped
//! ```
//!
//! The profile table is an immutable value. The built-in table is created once
//! per process; alternative tables (for tests or a `--profiles` file) are
//! passed to [`MoodClassifier::new`] explicitly.
//!
//! ## Example
//!
//! ```
//! use moody::mood::{MoodClassifier, MoodLabel, MoodTable};
//! use moody::sentiment::VaderScorer;
//!
//! let classifier = MoodClassifier::new(MoodTable::default_table(), VaderScorer);
//! let decision = classifier.classify("I feel so depressed and lonely");
//! assert_eq!(decision.label, MoodLabel::Sad);
//! ```

use crate::sentiment::SentimentScorer;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Emotional tone detected from the user's text.
///
/// Declaration order is the keyword-check order and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoodLabel {
    Sad,
    Mellow,
    Happy,
    Hyped,
}

impl MoodLabel {
    /// All labels in keyword-check order.
    pub const ALL: [MoodLabel; 4] = [MoodLabel::Sad, MoodLabel::Mellow, MoodLabel::Happy, MoodLabel::Hyped];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            MoodLabel::Sad => "sad",
            MoodLabel::Mellow => "mellow",
            MoodLabel::Happy => "happy",
            MoodLabel::Hyped => "hyped",
        }
    }

    /// Label with a leading capital, as used in playlist names.
    #[must_use]
    pub const fn capitalized(self) -> &'static str {
        match self {
            MoodLabel::Sad => "Sad",
            MoodLabel::Mellow => "Mellow",
            MoodLabel::Happy => "Happy",
            MoodLabel::Hyped => "Hyped",
        }
    }

    const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for MoodLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MoodLabel {
    type Err = ProfileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MoodLabel::ALL
            .into_iter()
            .find(|label| label.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ProfileError::UnknownLabel(s.to_string()))
    }
}

/// Recommendation anchor: either a genre name or a Spotify track id.
///
/// Serialized as a plain string; track seeds use the `spotify:track:<id>` form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Seed {
    Genre(String),
    Track(String),
}

const TRACK_SEED_PREFIX: &str = "spotify:track:";

impl TryFrom<String> for Seed {
    type Error = ProfileError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ProfileError::EmptySeed);
        }
        match trimmed.strip_prefix(TRACK_SEED_PREFIX) {
            Some("") => Err(ProfileError::EmptySeed),
            Some(id) => Ok(Seed::Track(id.to_string())),
            None => Ok(Seed::Genre(trimmed.to_string())),
        }
    }
}

impl From<Seed> for String {
    fn from(seed: Seed) -> Self {
        match seed {
            Seed::Genre(genre) => genre,
            Seed::Track(id) => format!("{TRACK_SEED_PREFIX}{id}"),
        }
    }
}

/// Everything needed to find music for one mood.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodProfile {
    pub label: MoodLabel,
    /// Substrings that force this mood when found in the text
    pub keywords: Vec<String>,
    /// Acceptable valence window; the midpoint is the recommendation target
    pub valence_range: (f64, f64),
    /// Acceptable energy window; the midpoint is the recommendation target
    pub energy_range: (f64, f64),
    pub seeds: Vec<Seed>,
    /// Search queries used when recommendations come back empty, in order
    pub search_terms: Vec<String>,
    #[serde(default)]
    pub emoji: String,
}

impl MoodProfile {
    #[must_use]
    pub fn target_valence(&self) -> f64 {
        midpoint(self.valence_range)
    }

    #[must_use]
    pub fn target_energy(&self) -> f64 {
        midpoint(self.energy_range)
    }

    /// First keyword contained in `normalized`, which must already be lower-cased.
    #[must_use]
    pub fn matching_keyword(&self, normalized: &str) -> Option<&str> {
        self.keywords
            .iter()
            .map(String::as_str)
            .find(|keyword| !keyword.is_empty() && normalized.contains(keyword))
    }
}

fn midpoint((low, high): (f64, f64)) -> f64 {
    (low + high) / 2.0
}

/// Errors raised while building or loading a [`MoodTable`].
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("no profile defined for mood `{0}`")]
    MissingLabel(MoodLabel),
    #[error("mood `{0}` is defined more than once")]
    DuplicateLabel(MoodLabel),
    #[error("mood `{label}` has an invalid {field} range ({low}, {high}); expected 0 <= min <= max <= 1")]
    InvalidRange {
        label: MoodLabel,
        field: &'static str,
        low: f64,
        high: f64,
    },
    #[error("unknown mood label `{0}`")]
    UnknownLabel(String),
    #[error("seed identifiers must not be empty")]
    EmptySeed,
    #[error("failed to read mood profiles from {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse mood profiles")]
    Parse(#[from] serde_json::Error),
}

/// Validated set of exactly one profile per [`MoodLabel`], stored in label order.
#[derive(Debug, Clone, PartialEq)]
pub struct MoodTable {
    profiles: Vec<MoodProfile>,
}

lazy_static::lazy_static! {
    static ref DEFAULT_TABLE: MoodTable = MoodTable::builtin();
}

impl MoodTable {
    /// Validate `profiles` and order them by label.
    ///
    /// Keywords are lower-cased so matching stays case-insensitive. Keywords
    /// shared between moods are allowed (the earlier mood wins) but logged.
    ///
    /// # Errors
    ///
    /// Returns an error if a label is missing or duplicated, or if a valence or
    /// energy range falls outside `[0, 1]`.
    pub fn new(profiles: Vec<MoodProfile>) -> Result<Self, ProfileError> {
        let mut slots: [Option<MoodProfile>; 4] = Default::default();

        for mut profile in profiles {
            check_range(profile.label, "valence", profile.valence_range)?;
            check_range(profile.label, "energy", profile.energy_range)?;
            profile.keywords = profile
                .keywords
                .iter()
                .map(|k| k.trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect();

            let slot = &mut slots[profile.label.index()];
            if slot.is_some() {
                return Err(ProfileError::DuplicateLabel(profile.label));
            }
            *slot = Some(profile);
        }

        let profiles = MoodLabel::ALL
            .into_iter()
            .zip(slots)
            .map(|(label, slot)| slot.ok_or(ProfileError::MissingLabel(label)))
            .collect::<Result<Vec<_>, _>>()?;

        let table = Self { profiles };
        table.warn_on_overlaps();
        Ok(table)
    }

    /// Load a table from a JSON array of profiles.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid JSON, or
    /// fails the checks in [`MoodTable::new`].
    pub fn from_json_file(path: &Path) -> Result<Self, ProfileError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ProfileError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    /// # Errors
    ///
    /// See [`MoodTable::from_json_file`].
    pub fn from_json_str(raw: &str) -> Result<Self, ProfileError> {
        let profiles: Vec<MoodProfile> = serde_json::from_str(raw)?;
        Self::new(profiles)
    }

    /// The built-in profiles, constructed once per process.
    #[must_use]
    pub fn default_table() -> &'static MoodTable {
        &DEFAULT_TABLE
    }

    #[must_use]
    pub fn get(&self, label: MoodLabel) -> &MoodProfile {
        &self.profiles[label.index()]
    }

    /// Profiles in keyword-check order.
    pub fn iter(&self) -> impl Iterator<Item = &MoodProfile> {
        self.profiles.iter()
    }

    fn warn_on_overlaps(&self) {
        for (i, earlier) in self.profiles.iter().enumerate() {
            for later in &self.profiles[i + 1..] {
                for keyword in earlier.keywords.iter().filter(|k| later.keywords.contains(k)) {
                    warn!(
                        "Keyword '{keyword}' is shared by '{}' and '{}'; '{}' wins",
                        earlier.label, later.label, earlier.label
                    );
                }
            }
        }
    }

    fn builtin() -> Self {
        fn words(items: &[&str]) -> Vec<String> {
            items.iter().map(|s| (*s).to_string()).collect()
        }
        fn genres(items: &[&str]) -> Vec<Seed> {
            items.iter().map(|s| Seed::Genre((*s).to_string())).collect()
        }

        let profiles = vec![
            MoodProfile {
                label: MoodLabel::Sad,
                keywords: words(&["rough", "awful", "terrible", "depressed", "sad", "cry", "grumpy"]),
                valence_range: (0.0, 0.4),
                energy_range: (0.1, 0.5),
                seeds: genres(&["blues", "acoustic"]),
                search_terms: words(&["melancholic", "sad", "heartbreak"]),
                emoji: "😢".to_string(),
            },
            MoodProfile {
                label: MoodLabel::Mellow,
                keywords: words(&["meh", "okay", "fine", "chill", "relax", "peaceful", "tired"]),
                valence_range: (0.3, 0.6),
                energy_range: (0.3, 0.6),
                seeds: genres(&["chill", "ambient"]),
                search_terms: words(&["chill", "lo-fi", "calm"]),
                emoji: "😌".to_string(),
            },
            MoodProfile {
                label: MoodLabel::Happy,
                keywords: words(&["joy", "happy", "awesome", "great", "good"]),
                valence_range: (0.6, 0.8),
                energy_range: (0.5, 0.8),
                seeds: genres(&["pop", "indie"]),
                search_terms: words(&["happy", "uplifting", "joyful"]),
                emoji: "😊".to_string(),
            },
            MoodProfile {
                label: MoodLabel::Hyped,
                keywords: words(&["excited", "pumped", "amazing", "best day", "wow"]),
                valence_range: (0.8, 1.0),
                energy_range: (0.7, 1.0),
                seeds: genres(&["edm", "dance"]),
                search_terms: words(&["energy", "workout", "party"]),
                emoji: "🤩".to_string(),
            },
        ];

        Self { profiles }
    }
}

fn check_range(label: MoodLabel, field: &'static str, (low, high): (f64, f64)) -> Result<(), ProfileError> {
    if (0.0..=1.0).contains(&low) && (0.0..=1.0).contains(&high) && low <= high {
        Ok(())
    } else {
        Err(ProfileError::InvalidRange { label, field, low, high })
    }
}

/// Score boundaries for the sentiment fallback. Each bound is exclusive for
/// the lower mood and inclusive for the next one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub sad_below: f64,
    pub mellow_below: f64,
    pub happy_below: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            sad_below: -0.5,
            mellow_below: -0.1,
            happy_below: 0.6,
        }
    }
}

impl Thresholds {
    #[must_use]
    pub fn label_for(&self, score: f64) -> MoodLabel {
        match score {
            s if s < self.sad_below => MoodLabel::Sad,
            s if s < self.mellow_below => MoodLabel::Mellow,
            s if s < self.happy_below => MoodLabel::Happy,
            _ => MoodLabel::Hyped,
        }
    }
}

/// What decided the mood.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoodSource {
    /// A profile keyword was found in the text
    Keyword(String),
    /// No keyword matched; the sentiment thresholds decided
    Sentiment,
}

/// Result of classifying one piece of text.
#[derive(Debug, Clone, PartialEq)]
pub struct MoodDecision {
    pub label: MoodLabel,
    pub profile: MoodProfile,
    pub text: String,
    pub sentiment: f64,
    pub source: MoodSource,
}

/// Keyword-first mood classifier with a sentiment fallback.
pub struct MoodClassifier<'t, S> {
    table: &'t MoodTable,
    scorer: S,
    thresholds: Thresholds,
}

impl<'t, S: SentimentScorer> MoodClassifier<'t, S> {
    pub fn new(table: &'t MoodTable, scorer: S) -> Self {
        Self {
            table,
            scorer,
            thresholds: Thresholds::default(),
        }
    }

    #[must_use]
    pub fn with_thresholds(mut self, thresholds: Thresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    #[must_use]
    pub fn table(&self) -> &'t MoodTable {
        self.table
    }

    /// Classify `text`. Never fails.
    ///
    /// The sentiment score is always recorded on the decision, but a keyword
    /// match takes precedence over it.
    pub fn classify(&self, text: &str) -> MoodDecision {
        let normalized = text.to_lowercase();
        let sentiment = self.scorer.score(text);

        let keyword_hit = self
            .table
            .iter()
            .find_map(|profile| profile.matching_keyword(&normalized).map(|k| (profile.label, k.to_string())));

        let (label, source) = match keyword_hit {
            Some((label, keyword)) => {
                debug!("Keyword '{keyword}' selects mood '{label}'");
                (label, MoodSource::Keyword(keyword))
            }
            None => {
                let label = self.thresholds.label_for(sentiment);
                debug!("No keyword matched; sentiment {sentiment:.3} selects mood '{label}'");
                (label, MoodSource::Sentiment)
            }
        };

        MoodDecision {
            label,
            profile: self.table.get(label).clone(),
            text: text.to_string(),
            sentiment,
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sentiment::VaderScorer;

    /// Scorer that ignores the text and returns a fixed score.
    struct Fixed(f64);

    impl SentimentScorer for Fixed {
        fn score(&self, _text: &str) -> f64 {
            self.0
        }
    }

    fn classify_with(score: f64, text: &str) -> MoodDecision {
        MoodClassifier::new(MoodTable::default_table(), Fixed(score)).classify(text)
    }

    #[test]
    fn test_keyword_overrides_sentiment() {
        let decision = classify_with(0.95, "I feel so depressed and lonely");
        assert_eq!(decision.label, MoodLabel::Sad);
        assert_eq!(decision.source, MoodSource::Keyword("depressed".to_string()));
        assert_eq!(decision.sentiment, 0.95);
    }

    #[test]
    fn test_keyword_match_is_case_insensitive() {
        assert_eq!(classify_with(-0.9, "WOW what a day").label, MoodLabel::Hyped);
        assert_eq!(classify_with(0.9, "Feeling Peaceful").label, MoodLabel::Mellow);
    }

    #[test]
    fn test_first_label_in_order_wins() {
        // "sad" (sad) and "great" (happy) both match; sad is checked first
        let decision = classify_with(0.0, "sad but the food was great");
        assert_eq!(decision.label, MoodLabel::Sad);
    }

    #[test]
    fn test_multi_word_keyword() {
        assert_eq!(classify_with(-0.9, "honestly the best day ever").label, MoodLabel::Hyped);
    }

    #[test]
    fn test_threshold_boundaries_are_half_open() {
        let text = "nothing special, just an average day";
        assert_eq!(classify_with(-0.5000001, text).label, MoodLabel::Sad);
        assert_eq!(classify_with(-0.5, text).label, MoodLabel::Mellow);
        assert_eq!(classify_with(-0.1000001, text).label, MoodLabel::Mellow);
        assert_eq!(classify_with(-0.1, text).label, MoodLabel::Happy);
        assert_eq!(classify_with(0.5999999, text).label, MoodLabel::Happy);
        assert_eq!(classify_with(0.6, text).label, MoodLabel::Hyped);
    }

    #[test]
    fn test_extreme_scores() {
        let text = "nothing special";
        assert_eq!(classify_with(-1.0, text).label, MoodLabel::Sad);
        assert_eq!(classify_with(1.0, text).label, MoodLabel::Hyped);
    }

    #[test]
    fn test_average_day_is_happy() {
        // -0.05 is not below -0.1, so it lands in the happy bucket
        let decision = classify_with(-0.05, "nothing special, just an average day");
        assert_eq!(decision.label, MoodLabel::Happy);
        assert_eq!(decision.source, MoodSource::Sentiment);
    }

    #[test]
    fn test_negative_text_without_keywords_is_sad() {
        let classifier = MoodClassifier::new(MoodTable::default_table(), VaderScorer);
        for text in ["my dog is dead", "I'm furious with my boss"] {
            let decision = classifier.classify(text);
            assert_eq!(decision.source, MoodSource::Sentiment, "{text}");
            assert_eq!(decision.label, MoodLabel::Sad, "{text}");
        }
    }

    #[test]
    fn test_decision_carries_profile_and_text() {
        let decision = classify_with(0.0, "pumped for the gig");
        assert_eq!(decision.profile.label, MoodLabel::Hyped);
        assert_eq!(decision.text, "pumped for the gig");
        assert_eq!(decision.profile.seeds[0], Seed::Genre("edm".to_string()));
    }

    #[test]
    fn test_classify_is_deterministic() {
        let classifier = MoodClassifier::new(MoodTable::default_table(), VaderScorer);
        let a = classifier.classify("What a lovely evening with friends");
        let b = classifier.classify("What a lovely evening with friends");
        assert_eq!(a, b);
    }

    #[test]
    fn test_builtin_table_passes_validation() {
        let profiles: Vec<MoodProfile> = MoodTable::default_table().iter().cloned().collect();
        let rebuilt = MoodTable::new(profiles).expect("built-in table should be valid");
        assert_eq!(&rebuilt, MoodTable::default_table());
    }

    #[test]
    fn test_table_orders_profiles_by_label() {
        let mut profiles: Vec<MoodProfile> = MoodTable::default_table().iter().cloned().collect();
        profiles.reverse();
        let table = MoodTable::new(profiles).unwrap();
        let labels: Vec<MoodLabel> = table.iter().map(|p| p.label).collect();
        assert_eq!(labels, MoodLabel::ALL.to_vec());
    }

    #[test]
    fn test_table_rejects_missing_and_duplicate_labels() {
        let mut profiles: Vec<MoodProfile> = MoodTable::default_table().iter().cloned().collect();
        profiles.pop();
        assert!(matches!(
            MoodTable::new(profiles.clone()),
            Err(ProfileError::MissingLabel(MoodLabel::Hyped))
        ));

        profiles.push(profiles[0].clone());
        assert!(matches!(
            MoodTable::new(profiles),
            Err(ProfileError::DuplicateLabel(MoodLabel::Sad))
        ));
    }

    #[test]
    fn test_table_rejects_bad_ranges() {
        let mut profiles: Vec<MoodProfile> = MoodTable::default_table().iter().cloned().collect();
        profiles[1].energy_range = (0.7, 0.2);
        let err = MoodTable::new(profiles).unwrap_err();
        assert!(matches!(err, ProfileError::InvalidRange { label: MoodLabel::Mellow, field: "energy", .. }));
    }

    #[test]
    fn test_custom_table_is_used() {
        let mut profiles: Vec<MoodProfile> = MoodTable::default_table().iter().cloned().collect();
        profiles[3].keywords = vec!["Caffeine".to_string()];
        let table = MoodTable::new(profiles).unwrap();

        let decision = MoodClassifier::new(&table, Fixed(-0.9)).classify("too much caffeine today");
        assert_eq!(decision.label, MoodLabel::Hyped);
    }

    #[test]
    fn test_table_from_json() {
        let raw = serde_json::to_string(&MoodTable::default_table().iter().collect::<Vec<_>>()).unwrap();
        let table = MoodTable::from_json_str(&raw).unwrap();
        assert_eq!(&table, MoodTable::default_table());

        assert!(matches!(MoodTable::from_json_str("{"), Err(ProfileError::Parse(_))));
    }

    #[test]
    fn test_seed_parsing() {
        assert_eq!(Seed::try_from("blues".to_string()).unwrap(), Seed::Genre("blues".to_string()));
        assert_eq!(
            Seed::try_from("spotify:track:4uLU6hMCjMI75M1A2tKUQC".to_string()).unwrap(),
            Seed::Track("4uLU6hMCjMI75M1A2tKUQC".to_string())
        );
        assert!(Seed::try_from("  ".to_string()).is_err());
        assert!(Seed::try_from("spotify:track:".to_string()).is_err());
        assert_eq!(String::from(Seed::Track("abc".to_string())), "spotify:track:abc");
    }

    #[test]
    fn test_targets_are_range_midpoints() {
        let sad = MoodTable::default_table().get(MoodLabel::Sad);
        assert!((sad.target_valence() - 0.2).abs() < 1e-9);
        assert!((sad.target_energy() - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_label_parsing_and_display() {
        assert_eq!("Hyped".parse::<MoodLabel>().unwrap(), MoodLabel::Hyped);
        assert!("angry".parse::<MoodLabel>().is_err());
        assert_eq!(MoodLabel::Mellow.to_string(), "mellow");
        assert_eq!(MoodLabel::Mellow.capitalized(), "Mellow");
    }
}
