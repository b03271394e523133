//! Music catalog seam used by the auto-linker.
//!
//! Implementations (e.g. the Spotify client bound to a user's access token)
//! live outside the core. Absent data is modeled as `Ok(None)`; only
//! transport or API failures are errors.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Audio characteristics of a track.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AudioFeatures {
    /// Beats per minute.
    pub tempo: f64,
    /// Energy score, nominally in `0.0..=1.0`. `None` when the catalog
    /// did not report one.
    pub energy: Option<f64>,
}

/// A track returned by a catalog search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogTrack {
    pub id: String,
    pub name: String,
    /// Primary artist name, empty when the catalog lists none.
    pub artist: String,
    pub duration_ms: Option<i64>,
    /// Playable reference, e.g. `spotify:track:...`.
    pub uri: String,
}

impl CatalogTrack {
    /// Canonical `"{name} - {artist}"` label.
    pub fn label(&self) -> String {
        format!("{} - {}", self.name, self.artist)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Catalog request failed: {0}")]
    Request(String),

    #[error("Catalog returned HTTP {status}")]
    Status { status: u16 },
}

/// Search and feature lookup against a streaming-music catalog.
#[async_trait]
pub trait TrackCatalog: Send + Sync {
    /// Best single match for a free-text query.
    async fn search_track(&self, query: &str) -> Result<Option<CatalogTrack>, CatalogError>;

    /// Audio features for a track id.
    async fn audio_features(&self, track_id: &str) -> Result<Option<AudioFeatures>, CatalogError>;
}
