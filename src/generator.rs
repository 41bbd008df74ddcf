//! # Playlist Generator Module
//!
//! One mood-to-playlist request: classify, gather tracks, publish.
//!
//! ## Flow
//!
//! 1. [`MoodClassifier`] picks a mood for the text.
//! 2. [`TrackAggregator`] gathers tracks for that mood's profile.
//! 3. With `surprise` on and a sentiment below [`SURPRISE_THRESHOLD`], one
//!    search for [`SURPRISE_QUERY`] puts its hit at the top of the list.
//! 4. Unless this is a dry run, [`PlaylistPublisher`] saves the playlist.
//!
//! ## Failures
//!
//! Nothing found is [`MoodyError::EmptyResult`] and nothing is created. A
//! token Spotify rejects at any step is [`MoodyError::Authentication`], so an
//! expired login never reads as "no tracks". Other publishing failures are
//! [`MoodyError::Publish`].

use crate::aggregator::{Strategy, TrackAggregator};
use crate::auth::AuthError;
use crate::config::Settings;
use crate::error::{error_chain, MoodyError};
use crate::mood::{MoodClassifier, MoodDecision};
use crate::publisher::{PlaylistPublisher, PublishError};
use crate::sentiment::SentimentScorer;
use crate::spotify::{ApiError, MusicApi, PlaylistHandle};
use crate::track::{Track, TrackList};
use log::{debug, info, warn};

/// Sentiment below which the surprise track is considered.
pub const SURPRISE_THRESHOLD: f64 = -0.8;
pub const SURPRISE_QUERY: &str = "Never Gonna Give You Up";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GeneratorOptions {
    /// Classify and gather tracks but create nothing.
    pub dry_run: bool,
    /// Put a cheer-up track at the top of very negative playlists.
    pub surprise: bool,
}

/// Everything produced for one request.
#[derive(Debug, Clone)]
pub struct GeneratedPlaylist {
    pub decision: MoodDecision,
    pub tracks: TrackList,
    pub strategy: Strategy,
    pub surprise_added: bool,
    /// `None` on a dry run.
    pub playlist: Option<PlaylistHandle>,
}

/// Runs requests against one API client.
///
/// # Examples
///
/// ```no_run
/// use moody::config::Settings;
/// use moody::generator::{GeneratorOptions, PlaylistGenerator};
/// use moody::mood::{MoodClassifier, MoodTable};
/// use moody::sentiment::VaderScorer;
/// use moody::spotify::SpotifyClient;
///
/// # fn main() -> anyhow::Result<()> {
/// let settings = Settings::default();
/// let client = SpotifyClient::new("access-token".to_string(), &settings)?;
/// let classifier = MoodClassifier::new(MoodTable::default_table(), VaderScorer);
/// let generator = PlaylistGenerator::new(classifier, &client, &settings).with_options(GeneratorOptions {
///     dry_run: true,
///     surprise: false,
/// });
/// let result = generator.run("rough day, need something calm")?;
/// println!("{} tracks", result.tracks.len());
/// # Ok(())
/// # }
/// ```
pub struct PlaylistGenerator<'a, A, S> {
    classifier: MoodClassifier<'a, S>,
    api: A,
    settings: &'a Settings,
    options: GeneratorOptions,
}

impl<'a, A: MusicApi, S: SentimentScorer> PlaylistGenerator<'a, A, S> {
    pub fn new(classifier: MoodClassifier<'a, S>, api: A, settings: &'a Settings) -> Self {
        Self {
            classifier,
            api,
            settings,
            options: GeneratorOptions::default(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: GeneratorOptions) -> Self {
        self.options = options;
        self
    }

    pub fn classifier(&self) -> &MoodClassifier<'a, S> {
        &self.classifier
    }

    /// Turn `text` into a playlist.
    ///
    /// # Errors
    ///
    /// - [`MoodyError::Authentication`] when Spotify rejects the access token
    ///   while gathering tracks or before the playlist exists.
    /// - [`MoodyError::EmptyResult`] when no tracks were found.
    /// - [`MoodyError::Publish`] when they could not be saved.
    pub fn run(&self, text: &str) -> Result<GeneratedPlaylist, MoodyError> {
        let decision = self.classifier.classify(text);
        info!(
            "Mood '{}' (sentiment {:.3}) for input of {} chars",
            decision.label,
            decision.sentiment,
            text.chars().count()
        );

        let report = TrackAggregator::new(&self.api, self.settings).fetch_with_report(&decision.profile)?;
        let mut tracks = report.tracks;
        if tracks.is_empty() {
            return Err(MoodyError::EmptyResult { mood: decision.label });
        }

        let surprise_added = self.options.surprise && self.add_surprise(&decision, &mut tracks)?;

        let playlist = if self.options.dry_run {
            debug!("Dry run; not creating a playlist");
            None
        } else {
            let published = PlaylistPublisher::new(&self.api)
                .publish(&decision, &tracks)
                .map_err(rejected_token_or_publish)?;
            Some(published)
        };

        Ok(GeneratedPlaylist {
            decision,
            tracks,
            strategy: report.strategy,
            surprise_added,
            playlist,
        })
    }

    fn add_surprise(&self, decision: &MoodDecision, tracks: &mut TrackList) -> Result<bool, AuthError> {
        if decision.sentiment >= SURPRISE_THRESHOLD {
            return Ok(false);
        }

        match self
            .api
            .search_tracks(SURPRISE_QUERY, 1, self.settings.market.as_deref())
        {
            Ok(items) => match items.into_iter().next() {
                Some(item) => {
                    let track = Track::from(item);
                    info!("Adding surprise track '{track}'");
                    tracks.push_front(track);
                    Ok(true)
                }
                None => {
                    debug!("Surprise search returned nothing");
                    Ok(false)
                }
            },
            Err(ApiError::Unauthorized { endpoint }) => Err(AuthError::TokenRejected { endpoint }),
            Err(e) => {
                warn!("Surprise search failed: {}", error_chain(&e));
                Ok(false)
            }
        }
    }
}

/// A rejected token before the playlist exists is an authentication failure.
/// Once the playlist exists the orphan must still be reported.
fn rejected_token_or_publish(err: PublishError) -> MoodyError {
    match err {
        PublishError::CurrentUser(ApiError::Unauthorized { endpoint })
        | PublishError::CreatePlaylist(ApiError::Unauthorized { endpoint }) => {
            MoodyError::Authentication(AuthError::TokenRejected { endpoint })
        }
        other => MoodyError::Publish(other),
    }
}
