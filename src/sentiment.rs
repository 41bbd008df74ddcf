//! # Sentiment Module
//!
//! Maps text to a compound polarity in `[-1, 1]`.
//!
//! [`VaderScorer`] wraps the VADER analyzer from the `vader_sentiment` crate:
//! its full valence lexicon plus the usual rules for boosters, negation, a
//! contrastive `but`, capitalisation and exclamation marks. The compound
//! score is the normalised sum `sum / sqrt(sum² + 15)`.
//!
//! Other scorers (fixed values in tests, for example) plug in through the
//! [`SentimentScorer`] trait.
//!
//! ## Example
//!
//! ```
//! use moody::sentiment::{SentimentScorer, VaderScorer};
//!
//! assert!(VaderScorer.score("my dog is dead") < -0.5);
//! ```

use log::trace;
use vader_sentiment::SentimentIntensityAnalyzer;

/// Anything that can turn text into a polarity score.
pub trait SentimentScorer {
    /// Polarity of `text` in `[-1, 1]`; higher is more positive.
    fn score(&self, text: &str) -> f64;
}

impl<T: SentimentScorer + ?Sized> SentimentScorer for &T {
    fn score(&self, text: &str) -> f64 {
        (**self).score(text)
    }
}

/// VADER compound-score sentiment scorer.
#[derive(Debug, Clone, Copy, Default)]
pub struct VaderScorer;

impl SentimentScorer for VaderScorer {
    fn score(&self, text: &str) -> f64 {
        if text.trim().is_empty() {
            return 0.0;
        }

        // the analyzer only borrows the crate's static lexicons
        let analyzer = SentimentIntensityAnalyzer::new();
        let scores = analyzer.polarity_scores(text);
        let compound = scores.get("compound").copied().unwrap_or(0.0);
        trace!(
            "VADER scores: compound {compound:.3}, neg {:.3}, neu {:.3}, pos {:.3}",
            scores.get("neg").copied().unwrap_or(0.0),
            scores.get("neu").copied().unwrap_or(0.0),
            scores.get("pos").copied().unwrap_or(0.0)
        );
        compound.clamp(-1.0, 1.0)
    }
}
