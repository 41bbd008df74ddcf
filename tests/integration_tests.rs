//! # Integration Tests for Moody
//!
//! Exercises the binary from a user's perspective and drives the full
//! classify, aggregate and publish pipeline against a scripted music API.

use anyhow::Result;
use std::process::Command;

fn moody() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_moody"));
    // keep the tests independent of the developer's environment
    cmd.env_remove("SPOTIFY_MARKET").env("RUST_LOG", "off");
    cmd
}

#[cfg(test)]
mod cli_tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_cli_help_displays_correctly() {
        let output = moody().arg("--help").output().expect("Failed to run help command");

        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(output.status.success());
        assert!(stdout.contains("moody"));
        assert!(stdout.contains("classify"));
        assert!(stdout.contains("create"));
        assert!(stdout.contains("interactive"));
        assert!(stdout.contains("auth"));
    }

    #[test]
    fn test_cli_version_flag() {
        let output = moody().arg("--version").output().expect("Failed to run version command");

        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("moody"));
        assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
    }

    #[test]
    fn test_classify_works_offline() {
        let output = moody()
            .args(["classify", "I feel so depressed and lonely"])
            .output()
            .expect("Failed to run classify");

        assert!(output.status.success());
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("Mood: 😢 Sad"));
        assert!(stdout.contains("Matched keyword: 'depressed'"));
    }

    #[test]
    fn test_classify_rejects_blank_text() {
        let output = moody().args(["classify", "   "]).output().expect("Failed to run classify");

        assert!(!output.status.success());
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("must not be empty"));
    }

    #[test]
    fn test_moods_lists_every_profile() {
        let output = moody().arg("moods").output().expect("Failed to run moods");

        let stdout = String::from_utf8_lossy(&output.stdout);
        for label in ["Sad", "Mellow", "Happy", "Hyped"] {
            assert!(stdout.contains(label), "missing {label}");
        }
        assert!(stdout.contains("melancholic"));
    }

    #[test]
    fn test_custom_profiles_file() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("profiles.json");
        std::fs::write(
            &path,
            r#"[
                {"label": "sad", "keywords": ["monday"], "valence_range": [0.0, 0.3], "energy_range": [0.0, 0.4],
                 "seeds": ["blues"], "search_terms": ["rain"]},
                {"label": "mellow", "keywords": [], "valence_range": [0.3, 0.6], "energy_range": [0.2, 0.5],
                 "seeds": ["ambient"], "search_terms": ["calm"]},
                {"label": "happy", "keywords": [], "valence_range": [0.6, 0.8], "energy_range": [0.5, 0.8],
                 "seeds": ["pop"], "search_terms": ["sunny"]},
                {"label": "hyped", "keywords": [], "valence_range": [0.8, 1.0], "energy_range": [0.8, 1.0],
                 "seeds": ["edm"], "search_terms": ["party"]}
            ]"#,
        )?;

        let output = moody()
            .arg("--profiles")
            .arg(&path)
            .args(["classify", "Another Monday"])
            .output()?;

        assert!(output.status.success());
        assert!(String::from_utf8_lossy(&output.stdout).contains("Matched keyword: 'monday'"));
        Ok(())
    }

    #[test]
    fn test_invalid_profiles_file_fails() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("profiles.json");
        std::fs::write(&path, "[]")?;

        let output = moody().arg("--profiles").arg(&path).args(["classify", "hi"]).output()?;
        assert!(!output.status.success());
        assert!(String::from_utf8_lossy(&output.stderr).contains("Invalid mood profiles"));
        Ok(())
    }

    #[test]
    fn test_create_without_credentials_fails_cleanly() {
        let output = moody()
            .args(["create", "great day"])
            .env_remove("SPOTIFY_CLIENT_ID")
            .env_remove("SPOTIPY_CLIENT_ID")
            .env_remove("SPOTIFY_CLIENT_SECRET")
            .env_remove("SPOTIPY_CLIENT_SECRET")
            .current_dir(std::env::temp_dir())
            .output()
            .expect("Failed to run create");

        assert!(!output.status.success());
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("authentication failed"));
    }

    #[test]
    fn test_completion_generation() {
        let output = moody().args(["completion", "bash"]).output().expect("Failed to run completion command");

        assert!(output.status.success());
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("_moody"));
        assert!(stdout.contains("complete"));
    }
}

#[cfg(test)]
mod pipeline_tests {
    use moody::auth::AuthError;
    use moody::config::Settings;
    use moody::error::{error_chain, MoodyError};
    use moody::generator::{GeneratorOptions, PlaylistGenerator};
    use moody::mood::{MoodClassifier, MoodLabel, MoodTable};
    use moody::publisher::PublishError;
    use moody::sentiment::{SentimentScorer, VaderScorer};
    use moody::spotify::{
        ApiError, ArtistItem, ExternalUrls, MusicApi, NewPlaylist, PlaylistHandle, RecommendationRequest, TrackItem,
        UserProfile,
    };
    use reqwest::StatusCode;
    use std::cell::RefCell;
    use std::collections::HashMap;

    fn item(id: &str) -> TrackItem {
        TrackItem {
            name: format!("Track {id}"),
            uri: format!("spotify:track:{id}"),
            artists: vec![ArtistItem {
                name: "Artist".to_string(),
            }],
            external_urls: ExternalUrls {
                spotify: Some(format!("https://open.spotify.com/track/{id}")),
            },
        }
    }

    fn down(endpoint: &str) -> ApiError {
        ApiError::Status {
            endpoint: endpoint.to_string(),
            status: StatusCode::SERVICE_UNAVAILABLE,
            body: "upstream unavailable".to_string(),
        }
    }

    /// Music service stand-in: recommendations are down, search works.
    /// With `revoked` set every endpoint answers 401.
    #[derive(Default)]
    struct ScriptedApi {
        searches: HashMap<String, Vec<TrackItem>>,
        fail_add: bool,
        revoked: bool,
        calls: RefCell<Vec<String>>,
        playlist: RefCell<Option<(NewPlaylist, Vec<String>)>>,
    }

    impl ScriptedApi {
        fn check_token(&self, endpoint: &str) -> Result<(), ApiError> {
            if self.revoked {
                return Err(ApiError::Unauthorized {
                    endpoint: endpoint.to_string(),
                });
            }
            Ok(())
        }
    }

    impl MusicApi for ScriptedApi {
        fn search_tracks(&self, query: &str, _: u32, _: Option<&str>) -> Result<Vec<TrackItem>, ApiError> {
            self.calls.borrow_mut().push(format!("search:{query}"));
            self.check_token("search")?;
            Ok(self.searches.get(query).cloned().unwrap_or_default())
        }

        fn recommendations(&self, _: &RecommendationRequest) -> Result<Vec<TrackItem>, ApiError> {
            self.calls.borrow_mut().push("recommendations".to_string());
            self.check_token("recommendations")?;
            Err(down("recommendations"))
        }

        fn current_user(&self) -> Result<UserProfile, ApiError> {
            self.calls.borrow_mut().push("me".to_string());
            self.check_token("me")?;
            Ok(UserProfile {
                id: "someone".to_string(),
                display_name: None,
            })
        }

        fn create_playlist(&self, _: &str, playlist: &NewPlaylist) -> Result<PlaylistHandle, ApiError> {
            self.calls.borrow_mut().push("create".to_string());
            *self.playlist.borrow_mut() = Some((playlist.clone(), Vec::new()));
            Ok(PlaylistHandle {
                id: "p1".to_string(),
                url: "https://open.spotify.com/playlist/p1".to_string(),
            })
        }

        fn add_items_to_playlist(&self, _: &str, uris: &[String]) -> Result<(), ApiError> {
            self.calls.borrow_mut().push("add".to_string());
            if self.fail_add {
                return Err(down("add"));
            }
            if let Some((_, items)) = self.playlist.borrow_mut().as_mut() {
                items.extend_from_slice(uris);
            }
            Ok(())
        }
    }

    fn sad_searches() -> HashMap<String, Vec<TrackItem>> {
        let mut searches = HashMap::new();
        searches.insert("melancholic".to_string(), vec![item("1"), item("2"), item("3")]);
        searches.insert("sad".to_string(), vec![item("3"), item("4"), item("5")]);
        searches
    }

    #[test]
    fn test_fallback_pipeline_publishes_deduplicated_tracks() {
        let api = ScriptedApi {
            searches: sad_searches(),
            ..Default::default()
        };
        let settings = Settings::default();
        let classifier = MoodClassifier::new(MoodTable::default_table(), VaderScorer);

        let result = PlaylistGenerator::new(classifier, &api, &settings)
            .run("I feel so depressed and lonely")
            .unwrap();

        assert_eq!(result.decision.label, MoodLabel::Sad);
        assert_eq!(result.tracks.len(), 5);
        assert_eq!(
            result.playlist.as_ref().map(|p| p.url.as_str()),
            Some("https://open.spotify.com/playlist/p1")
        );

        let playlist = api.playlist.borrow();
        let (request, uris) = playlist.as_ref().unwrap();
        assert_eq!(request.name, "😢 Moody: Sad Vibes (5 Songs)");
        assert!(!request.public);
        assert_eq!(uris.len(), 5);
        assert_eq!(uris[0], "spotify:track:1");

        let calls = api.calls.borrow();
        assert_eq!(
            calls.as_slice(),
            ["recommendations", "search:melancholic", "search:sad", "search:heartbreak", "me", "create", "add"]
        );
    }

    #[test]
    fn test_nothing_found_is_not_a_publish_failure() {
        let api = ScriptedApi::default();
        let settings = Settings::default();
        let classifier = MoodClassifier::new(MoodTable::default_table(), VaderScorer);

        let err = PlaylistGenerator::new(classifier, &api, &settings)
            .run("best day of my life!")
            .unwrap_err();

        assert!(matches!(err, MoodyError::EmptyResult { mood: MoodLabel::Hyped }));
        assert!(!api.calls.borrow().iter().any(|c| c == "create"));
    }

    #[test]
    fn test_failed_add_reports_orphaned_playlist() {
        let api = ScriptedApi {
            searches: sad_searches(),
            fail_add: true,
            ..Default::default()
        };
        let settings = Settings::default();
        let classifier = MoodClassifier::new(MoodTable::default_table(), VaderScorer);

        let err = PlaylistGenerator::new(classifier, &api, &settings)
            .run("what an awful week")
            .unwrap_err();

        match err {
            MoodyError::Publish(PublishError::AddItems { playlist, .. }) => assert_eq!(playlist.id, "p1"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_average_day_is_happy_by_sentiment() {
        struct SlightlyDown;
        impl SentimentScorer for SlightlyDown {
            fn score(&self, _: &str) -> f64 {
                -0.05
            }
        }

        let mut searches = HashMap::new();
        searches.insert("happy".to_string(), vec![item("h")]);
        let api = ScriptedApi {
            searches,
            ..Default::default()
        };
        let settings = Settings::default();
        let classifier = MoodClassifier::new(MoodTable::default_table(), SlightlyDown);

        let result = PlaylistGenerator::new(classifier, &api, &settings)
            .with_options(GeneratorOptions {
                dry_run: true,
                surprise: false,
            })
            .run("nothing special, just an average day")
            .unwrap();

        assert_eq!(result.decision.label, MoodLabel::Happy);
        assert!(result.playlist.is_none());
        assert!(api.playlist.borrow().is_none());
    }

    #[test]
    fn test_revoked_token_mid_run_is_an_auth_failure() {
        let api = ScriptedApi {
            searches: sad_searches(),
            revoked: true,
            ..Default::default()
        };
        let settings = Settings::default();
        let classifier = MoodClassifier::new(MoodTable::default_table(), VaderScorer);

        let err = PlaylistGenerator::new(classifier, &api, &settings)
            .run("rough day")
            .unwrap_err();

        assert!(
            matches!(err, MoodyError::Authentication(AuthError::TokenRejected { .. })),
            "got {err:?}"
        );
        assert!(error_chain(&err).contains("run `moody auth` again"));
        assert_eq!(api.calls.borrow().as_slice(), ["recommendations"]);
    }
}
