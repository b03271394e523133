//! REST client for the Spotify Web API and accounts service.
//!
//! Covers the authorization-code OAuth flow, track search and lookup, audio
//! features, playlist reads (paginated) and playlist creation. Every call
//! that acts for a user takes that user's access token explicitly.

use std::collections::HashMap;

use cycle_core::catalog::{AudioFeatures, CatalogTrack};
use cycle_core::playlist::PlaylistTrack;
use rand::Rng;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

pub const DEFAULT_ACCOUNTS_URL: &str = "https://accounts.spotify.com";
pub const DEFAULT_API_URL: &str = "https://api.spotify.com/v1";

/// Scopes requested at authorization: Web Playback SDK plus playlist writes.
pub const SCOPES: [&str; 7] = [
    "streaming",
    "user-read-email",
    "user-read-private",
    "user-read-playback-state",
    "user-modify-playback-state",
    "playlist-modify-public",
    "playlist-modify-private",
];

/// Upper bound on ids per `/audio-features` call and URIs per playlist add.
pub const MAX_BATCH: usize = 100;

const PLAYLIST_PAGE_SIZE: usize = 100;

const STATE_LENGTH: usize = 22;

/// Spotify application credentials and endpoints.
#[derive(Debug, Clone)]
pub struct SpotifyConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub accounts_url: String,
    pub api_url: String,
}

/// HTTP client for Spotify.
pub struct SpotifyApi {
    client: reqwest::Client,
    config: SpotifyConfig,
}

/// Errors from the Spotify REST layer.
#[derive(Debug, thiserror::Error)]
pub enum SpotifyApiError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Spotify returned a non-2xx status code.
    #[error("Spotify API error ({status}): {body}")]
    ApiError { status: u16, body: String },

    #[error("Invalid Spotify URL: {0}")]
    InvalidUrl(String),
}

impl SpotifyApiError {
    /// Whether Spotify rejected the access token.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::ApiError { status: 401, .. })
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// Token endpoint response for both code exchange and refresh.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default = "default_expires_in")]
    pub expires_in: i64,
    /// Sent on code exchange; only sent on refresh when Spotify rotates it.
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

fn default_expires_in() -> i64 {
    3600
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyArtist {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyImage {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyAlbum {
    pub name: String,
    #[serde(default)]
    pub images: Vec<SpotifyImage>,
}

/// A track object. `id` is absent for local files.
#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyTrack {
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub artists: Vec<SpotifyArtist>,
    pub album: Option<SpotifyAlbum>,
    pub duration_ms: Option<i64>,
    pub uri: String,
    #[serde(default)]
    pub preview_url: Option<String>,
}

impl SpotifyTrack {
    /// First listed artist, or empty.
    pub fn primary_artist(&self) -> &str {
        self.artists.first().map_or("", |a| a.name.as_str())
    }

    /// All artist names joined with `", "`.
    pub fn artist_names(&self) -> String {
        self.artists
            .iter()
            .map(|a| a.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn to_catalog_track(&self) -> Option<CatalogTrack> {
        Some(CatalogTrack {
            id: self.id.clone()?,
            name: self.name.clone(),
            artist: self.primary_artist().to_string(),
            duration_ms: self.duration_ms,
            uri: self.uri.clone(),
        })
    }
}

/// Simplified track returned by `GET /api/spotify/search`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackSummary {
    pub id: String,
    pub name: String,
    pub artist: String,
    pub album: Option<String>,
    pub duration_ms: Option<i64>,
    pub preview_url: Option<String>,
    pub image: Option<String>,
    pub uri: String,
}

impl TrackSummary {
    pub fn from_track(track: &SpotifyTrack) -> Option<Self> {
        Some(Self {
            id: track.id.clone()?,
            name: track.name.clone(),
            artist: track.artist_names(),
            album: track.album.as_ref().map(|a| a.name.clone()),
            duration_ms: track.duration_ms,
            preview_url: track.preview_url.clone(),
            image: track
                .album
                .as_ref()
                .and_then(|a| a.images.first())
                .map(|i| i.url.clone()),
            uri: track.uri.clone(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    tracks: Option<Paging<SpotifyTrack>>,
}

#[derive(Debug, Deserialize)]
struct Paging<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
    #[serde(default)]
    next: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlaylistItem {
    track: Option<SpotifyTrack>,
    #[serde(default)]
    is_local: bool,
}

/// Audio features object. Spotify reports `energy`, `valence` and
/// `danceability` in `0.0..=1.0`.
#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyAudioFeatures {
    pub id: String,
    #[serde(default)]
    pub tempo: f64,
    #[serde(default)]
    pub energy: Option<f64>,
    #[serde(default)]
    pub valence: f64,
    #[serde(default)]
    pub danceability: f64,
}

impl SpotifyAudioFeatures {
    pub fn to_core(&self) -> AudioFeatures {
        AudioFeatures {
            tempo: self.tempo,
            energy: self.energy,
        }
    }
}

#[derive(Debug, Deserialize)]
struct AudioFeaturesBatch {
    #[serde(default)]
    audio_features: Vec<Option<SpotifyAudioFeatures>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyProfile {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyPlaylist {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub external_urls: HashMap<String, String>,
}

impl SpotifyPlaylist {
    pub fn web_url(&self) -> Option<&str> {
        self.external_urls.get("spotify").map(String::as_str)
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Random URL-safe value for the OAuth `state` parameter.
pub fn generate_state() -> String {
    rand::rng()
        .sample_iter(&rand::distr::Alphanumeric)
        .take(STATE_LENGTH)
        .map(char::from)
        .collect()
}

impl SpotifyApi {
    pub fn new(config: SpotifyConfig) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, config: SpotifyConfig) -> Self {
        Self { client, config }
    }

    // -- OAuth --------------------------------------------------------------

    /// URL the user is sent to in order to grant access.
    pub fn authorize_url(&self, state: &str) -> Result<String, SpotifyApiError> {
        let scope = SCOPES.join(" ");
        let url = reqwest::Url::parse_with_params(
            &format!("{}/authorize", self.config.accounts_url),
            &[
                ("client_id", self.config.client_id.as_str()),
                ("response_type", "code"),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("scope", scope.as_str()),
                ("state", state),
            ],
        )
        .map_err(|e| SpotifyApiError::InvalidUrl(e.to_string()))?;
        Ok(url.into())
    }

    /// Exchange an authorization code for tokens.
    pub async fn exchange_code(&self, code: &str) -> Result<TokenResponse, SpotifyApiError> {
        self.token_request(&[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.config.redirect_uri.as_str()),
        ])
        .await
    }

    pub async fn refresh_access_token(
        &self,
        refresh_token: &str,
    ) -> Result<TokenResponse, SpotifyApiError> {
        self.token_request(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ])
        .await
    }

    // -- Tracks -------------------------------------------------------------

    pub async fn search_tracks(
        &self,
        access_token: &str,
        query: &str,
        limit: u32,
    ) -> Result<Vec<SpotifyTrack>, SpotifyApiError> {
        let limit = limit.to_string();
        let response = self
            .client
            .get(format!("{}/search", self.config.api_url))
            .bearer_auth(access_token)
            .query(&[("q", query), ("type", "track"), ("limit", limit.as_str())])
            .send()
            .await?;

        let body: SearchResponse = Self::parse_response(response).await?;
        Ok(body.tracks.map(|p| p.items).unwrap_or_default())
    }

    pub async fn get_track(
        &self,
        access_token: &str,
        track_id: &str,
    ) -> Result<SpotifyTrack, SpotifyApiError> {
        let response = self
            .client
            .get(format!("{}/tracks/{track_id}", self.config.api_url))
            .bearer_auth(access_token)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Audio features for one track.
    ///
    /// Returns `None` when Spotify has none (404) or refuses to serve them to
    /// this application (403).
    pub async fn get_audio_features(
        &self,
        access_token: &str,
        track_id: &str,
    ) -> Result<Option<SpotifyAudioFeatures>, SpotifyApiError> {
        let response = self
            .client
            .get(format!("{}/audio-features/{track_id}", self.config.api_url))
            .bearer_auth(access_token)
            .send()
            .await?;

        if matches!(response.status(), StatusCode::NOT_FOUND | StatusCode::FORBIDDEN) {
            tracing::debug!(track_id, status = %response.status(), "Audio features unavailable");
            return Ok(None);
        }
        Self::parse_response(response).await.map(Some)
    }

    /// Audio features for many tracks, keyed by track id.
    ///
    /// Requests are chunked by [`MAX_BATCH`]. A failed chunk is logged and
    /// skipped so its tracks fall back to defaults downstream.
    pub async fn audio_features_batch(
        &self,
        access_token: &str,
        track_ids: &[String],
    ) -> HashMap<String, AudioFeatures> {
        let mut features = HashMap::with_capacity(track_ids.len());

        for chunk in track_ids.chunks(MAX_BATCH) {
            match self.audio_features_chunk(access_token, chunk).await {
                Ok(batch) => {
                    for f in batch.into_iter().flatten() {
                        features.insert(f.id.clone(), f.to_core());
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, tracks = chunk.len(), "Audio features batch failed");
                }
            }
        }

        features
    }

    async fn audio_features_chunk(
        &self,
        access_token: &str,
        ids: &[String],
    ) -> Result<Vec<Option<SpotifyAudioFeatures>>, SpotifyApiError> {
        let ids = ids.join(",");
        let response = self
            .client
            .get(format!("{}/audio-features", self.config.api_url))
            .bearer_auth(access_token)
            .query(&[("ids", ids.as_str())])
            .send()
            .await?;

        let body: AudioFeaturesBatch = Self::parse_response(response).await?;
        Ok(body.audio_features)
    }

    // -- Playlists ----------------------------------------------------------

    /// Every playable track of a playlist, in playlist order.
    ///
    /// Follows `next` links until the last page. Local files and removed
    /// tracks are skipped; `position` is the item's index in the playlist.
    pub async fn playlist_tracks(
        &self,
        access_token: &str,
        playlist_id: &str,
    ) -> Result<Vec<PlaylistTrack>, SpotifyApiError> {
        let mut tracks = Vec::new();
        let mut position = 0usize;
        let limit = PLAYLIST_PAGE_SIZE.to_string();

        let mut request = self
            .client
            .get(format!("{}/playlists/{playlist_id}/tracks", self.config.api_url))
            .query(&[("limit", limit.as_str())]);

        loop {
            let response = request.bearer_auth(access_token).send().await?;
            let page: Paging<PlaylistItem> = Self::parse_response(response).await?;

            for item in page.items {
                let index = position;
                position += 1;
                if item.is_local {
                    continue;
                }
                if let Some(track) = item.track.and_then(|t| playlist_track(t, index)) {
                    tracks.push(track);
                }
            }

            match page.next {
                Some(next) => request = self.client.get(next),
                None => break,
            }
        }

        tracing::debug!(playlist_id, tracks = tracks.len(), "Fetched playlist tracks");
        Ok(tracks)
    }

    pub async fn current_user(&self, access_token: &str) -> Result<SpotifyProfile, SpotifyApiError> {
        let response = self
            .client
            .get(format!("{}/me", self.config.api_url))
            .bearer_auth(access_token)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Create a playlist owned by the token's user.
    pub async fn create_playlist(
        &self,
        access_token: &str,
        name: &str,
        description: &str,
        public: bool,
    ) -> Result<SpotifyPlaylist, SpotifyApiError> {
        let profile = self.current_user(access_token).await?;
        let body = serde_json::json!({
            "name": name,
            "description": description,
            "public": public,
        });

        let response = self
            .client
            .post(format!("{}/users/{}/playlists", self.config.api_url, profile.id))
            .bearer_auth(access_token)
            .json(&body)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Append tracks to a playlist in order, chunked by [`MAX_BATCH`].
    pub async fn add_tracks(
        &self,
        access_token: &str,
        playlist_id: &str,
        uris: &[String],
    ) -> Result<(), SpotifyApiError> {
        for chunk in uris.chunks(MAX_BATCH) {
            let response = self
                .client
                .post(format!("{}/playlists/{playlist_id}/tracks", self.config.api_url))
                .bearer_auth(access_token)
                .json(&serde_json::json!({ "uris": chunk }))
                .send()
                .await?;

            Self::check_status(response).await?;
        }
        Ok(())
    }

    // ---- private helpers ----

    async fn token_request(
        &self,
        form: &[(&str, &str)],
    ) -> Result<TokenResponse, SpotifyApiError> {
        let response = self
            .client
            .post(format!("{}/api/token", self.config.accounts_url))
            .basic_auth(&self.config.client_id, Some(&self.config.client_secret))
            .form(form)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Ensure the response has a success status code, or return
    /// [`SpotifyApiError::ApiError`] with the status and body text.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, SpotifyApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(SpotifyApiError::ApiError {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, SpotifyApiError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }

    async fn check_status(response: reqwest::Response) -> Result<(), SpotifyApiError> {
        Self::ensure_success(response).await?;
        Ok(())
    }
}

fn playlist_track(track: SpotifyTrack, position: usize) -> Option<PlaylistTrack> {
    let artist = track.primary_artist().to_string();
    Some(PlaylistTrack {
        id: track.id?,
        name: track.name,
        artist,
        duration_ms: track.duration_ms,
        uri: track.uri,
        position,
    })
}
