//! # Spotify Web API Module
//!
//! [`MusicApi`] is the seam between Moody's logic and the streaming service;
//! [`SpotifyClient`] implements it over blocking `reqwest` calls.
//!
//! Every call returns its own `Result` so callers decide what a failure means:
//! the aggregator treats a failed call as zero tracks, while the publisher
//! reports it to the user.
//!
//! ## Endpoints
//!
//! | Operation                 | Endpoint                           |
//! |---------------------------|------------------------------------|
//! | `search_tracks`           | `GET  /search?type=track`          |
//! | `recommendations`         | `GET  /recommendations`            |
//! | `current_user`            | `GET  /me`                         |
//! | `create_playlist`         | `POST /users/{user_id}/playlists`  |
//! | `add_items_to_playlist`   | `POST /playlists/{id}/tracks`      |

use crate::config::Settings;
use crate::mood::Seed;
use crate::track::Track;
use log::debug;
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const API_BASE: &str = "https://api.spotify.com/v1";

/// Most URIs accepted by one add-items call.
pub const MAX_ITEMS_PER_ADD: usize = 100;

/// Most seeds (genres and tracks combined) per recommendations call.
pub const MAX_SEEDS: usize = 5;

/// Failure of a single music-service call.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request to {endpoint} failed")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Spotify rejected the access token for {endpoint}; run `moody auth` again")]
    Unauthorized { endpoint: String },
    #[error("Spotify API error {status} from {endpoint}: {body}")]
    Status {
        endpoint: String,
        status: StatusCode,
        body: String,
    },
    #[error("failed to decode response from {endpoint}")]
    Decode {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Track metadata as returned by search and recommendations.
#[derive(Debug, Clone, Deserialize)]
pub struct TrackItem {
    pub name: String,
    pub uri: String,
    #[serde(default)]
    pub artists: Vec<ArtistItem>,
    #[serde(default)]
    pub external_urls: ExternalUrls,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArtistItem {
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExternalUrls {
    pub spotify: Option<String>,
}

impl From<TrackItem> for Track {
    fn from(item: TrackItem) -> Self {
        let artist = item
            .artists
            .into_iter()
            .next()
            .map(|a| a.name)
            .unwrap_or_else(|| "Unknown Artist".to_string());
        Track {
            name: item.name,
            artist,
            url: item.external_urls.spotify.unwrap_or_default(),
            uri: item.uri,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub display_name: Option<String>,
}

/// Body of a create-playlist request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewPlaylist {
    pub name: String,
    pub public: bool,
    pub description: String,
}

/// A created playlist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistHandle {
    pub id: String,
    pub url: String,
}

#[derive(Debug, Deserialize)]
struct PlaylistResponse {
    id: String,
    #[serde(default)]
    external_urls: ExternalUrls,
}

impl From<PlaylistResponse> for PlaylistHandle {
    fn from(response: PlaylistResponse) -> Self {
        let url = response
            .external_urls
            .spotify
            .unwrap_or_else(|| format!("https://open.spotify.com/playlist/{}", response.id));
        PlaylistHandle { id: response.id, url }
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    tracks: Paging,
}

#[derive(Debug, Deserialize)]
struct Paging {
    #[serde(default)]
    items: Vec<Option<TrackItem>>,
}

#[derive(Debug, Deserialize)]
struct RecommendationsResponse {
    #[serde(default)]
    tracks: Vec<Option<TrackItem>>,
}

/// Parameters of a recommendations query.
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendationRequest {
    pub seeds: Vec<Seed>,
    pub limit: u32,
    pub target_valence: f64,
    pub target_energy: f64,
    pub valence_range: Option<(f64, f64)>,
    pub energy_range: Option<(f64, f64)>,
    pub market: Option<String>,
}

impl RecommendationRequest {
    /// Query-string pairs for `GET /recommendations`.
    ///
    /// Seeds beyond [`MAX_SEEDS`] are dropped.
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let seeds = &self.seeds[..self.seeds.len().min(MAX_SEEDS)];
        let join = |want_tracks: bool| {
            seeds
                .iter()
                .filter_map(|seed| match (seed, want_tracks) {
                    (Seed::Genre(g), false) => Some(g.as_str()),
                    (Seed::Track(t), true) => Some(t.as_str()),
                    _ => None,
                })
                .collect::<Vec<_>>()
                .join(",")
        };

        let mut pairs = vec![("limit", self.limit.to_string())];
        let genres = join(false);
        if !genres.is_empty() {
            pairs.push(("seed_genres", genres));
        }
        let tracks = join(true);
        if !tracks.is_empty() {
            pairs.push(("seed_tracks", tracks));
        }
        pairs.push(("target_valence", format!("{:.3}", self.target_valence)));
        pairs.push(("target_energy", format!("{:.3}", self.target_energy)));
        if let Some((min, max)) = self.valence_range {
            pairs.push(("min_valence", format!("{min:.3}")));
            pairs.push(("max_valence", format!("{max:.3}")));
        }
        if let Some((min, max)) = self.energy_range {
            pairs.push(("min_energy", format!("{min:.3}")));
            pairs.push(("max_energy", format!("{max:.3}")));
        }
        if let Some(market) = &self.market {
            pairs.push(("market", market.clone()));
        }
        pairs
    }
}

/// Operations Moody needs from a music streaming service.
pub trait MusicApi {
    /// Keyword search, best matches first.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the call fails.
    fn search_tracks(&self, query: &str, limit: u32, market: Option<&str>) -> Result<Vec<TrackItem>, ApiError>;

    /// Tracks similar to the request's seeds and audio targets.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the call fails.
    fn recommendations(&self, request: &RecommendationRequest) -> Result<Vec<TrackItem>, ApiError>;

    /// # Errors
    ///
    /// Returns an [`ApiError`] if the call fails.
    fn current_user(&self) -> Result<UserProfile, ApiError>;

    /// # Errors
    ///
    /// Returns an [`ApiError`] if the call fails.
    fn create_playlist(&self, user_id: &str, playlist: &NewPlaylist) -> Result<PlaylistHandle, ApiError>;

    /// Append `uris` (at most [`MAX_ITEMS_PER_ADD`]) to the playlist.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the call fails.
    fn add_items_to_playlist(&self, playlist_id: &str, uris: &[String]) -> Result<(), ApiError>;
}

impl<T: MusicApi + ?Sized> MusicApi for &T {
    fn search_tracks(&self, query: &str, limit: u32, market: Option<&str>) -> Result<Vec<TrackItem>, ApiError> {
        (**self).search_tracks(query, limit, market)
    }

    fn recommendations(&self, request: &RecommendationRequest) -> Result<Vec<TrackItem>, ApiError> {
        (**self).recommendations(request)
    }

    fn current_user(&self) -> Result<UserProfile, ApiError> {
        (**self).current_user()
    }

    fn create_playlist(&self, user_id: &str, playlist: &NewPlaylist) -> Result<PlaylistHandle, ApiError> {
        (**self).create_playlist(user_id, playlist)
    }

    fn add_items_to_playlist(&self, playlist_id: &str, uris: &[String]) -> Result<(), ApiError> {
        (**self).add_items_to_playlist(playlist_id, uris)
    }
}

/// Blocking Spotify Web API client bound to one access token.
pub struct SpotifyClient {
    http: Client,
    access_token: String,
    base_url: String,
}

impl SpotifyClient {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built (e.g. TLS backend failure).
    pub fn new(access_token: String, settings: &Settings) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(settings.request_timeout).build()?;
        Ok(Self {
            http,
            access_token,
            base_url: API_BASE.to_string(),
        })
    }

    /// Point the client at another API root.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn send(&self, endpoint: &str, request: RequestBuilder) -> Result<Response, ApiError> {
        debug!("Spotify request: {endpoint}");
        let response = request
            .bearer_auth(&self.access_token)
            .send()
            .map_err(|source| ApiError::Transport {
                endpoint: endpoint.to_string(),
                source,
            })?;
        check_status(endpoint, response)
    }

    fn get_json<T: DeserializeOwned>(&self, endpoint: &str, request: RequestBuilder) -> Result<T, ApiError> {
        self.send(endpoint, request)?.json().map_err(|source| ApiError::Decode {
            endpoint: endpoint.to_string(),
            source,
        })
    }
}

fn check_status(endpoint: &str, response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::UNAUTHORIZED {
        return Err(ApiError::Unauthorized {
            endpoint: endpoint.to_string(),
        });
    }
    let body = response.text().unwrap_or_else(|_| "Unknown Error".to_string());
    Err(ApiError::Status {
        endpoint: endpoint.to_string(),
        status,
        body: body.trim().to_string(),
    })
}

impl MusicApi for SpotifyClient {
    fn search_tracks(&self, query: &str, limit: u32, market: Option<&str>) -> Result<Vec<TrackItem>, ApiError> {
        let mut params = vec![
            ("q", query.to_string()),
            ("type", "track".to_string()),
            ("limit", limit.clamp(1, 50).to_string()),
        ];
        if let Some(market) = market {
            params.push(("market", market.to_string()));
        }
        let request = self.http.get(self.url("/search")).query(&params);
        let response: SearchResponse = self.get_json("search", request)?;
        Ok(response.tracks.items.into_iter().flatten().collect())
    }

    fn recommendations(&self, request: &RecommendationRequest) -> Result<Vec<TrackItem>, ApiError> {
        let http_request = self.http.get(self.url("/recommendations")).query(&request.query_pairs());
        let response: RecommendationsResponse = self.get_json("recommendations", http_request)?;
        Ok(response.tracks.into_iter().flatten().collect())
    }

    fn current_user(&self) -> Result<UserProfile, ApiError> {
        self.get_json("me", self.http.get(self.url("/me")))
    }

    fn create_playlist(&self, user_id: &str, playlist: &NewPlaylist) -> Result<PlaylistHandle, ApiError> {
        let path = format!("/users/{}/playlists", urlencoding::encode(user_id));
        let request = self.http.post(self.url(&path)).json(playlist);
        let response: PlaylistResponse = self.get_json("create playlist", request)?;
        Ok(response.into())
    }

    fn add_items_to_playlist(&self, playlist_id: &str, uris: &[String]) -> Result<(), ApiError> {
        let uris = &uris[..uris.len().min(MAX_ITEMS_PER_ADD)];
        let path = format!("/playlists/{}/tracks", urlencoding::encode(playlist_id));
        let request = self
            .http
            .post(self.url(&path))
            .json(&serde_json::json!({ "uris": uris }));
        self.send("add items", request)?;
        Ok(())
    }
}
