//! [`TrackCatalog`] backed by the Spotify Web API for one user's token.

use async_trait::async_trait;
use cycle_core::catalog::{AudioFeatures, CatalogError, CatalogTrack, TrackCatalog};

use crate::spotify::{SpotifyApi, SpotifyApiError};

pub struct SpotifyCatalog<'a> {
    api: &'a SpotifyApi,
    access_token: &'a str,
}

impl<'a> SpotifyCatalog<'a> {
    pub fn new(api: &'a SpotifyApi, access_token: &'a str) -> Self {
        Self { api, access_token }
    }
}

impl From<SpotifyApiError> for CatalogError {
    fn from(err: SpotifyApiError) -> Self {
        match err {
            SpotifyApiError::ApiError { status, .. } => CatalogError::Status { status },
            other => CatalogError::Request(other.to_string()),
        }
    }
}

#[async_trait]
impl TrackCatalog for SpotifyCatalog<'_> {
    async fn search_track(&self, query: &str) -> Result<Option<CatalogTrack>, CatalogError> {
        let tracks = self.api.search_tracks(self.access_token, query, 1).await?;
        Ok(tracks.first().and_then(|t| t.to_catalog_track()))
    }

    async fn audio_features(&self, track_id: &str) -> Result<Option<AudioFeatures>, CatalogError> {
        let features = self.api.get_audio_features(self.access_token, track_id).await?;
        Ok(features.map(|f| f.to_core()))
    }
}
