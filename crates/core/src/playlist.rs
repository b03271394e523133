//! Conversion of a streaming playlist into a [`LessonPlan`].
//!
//! Each track becomes one segment. The first and last tracks are always
//! low-intensity warm-up and cool-down; body tracks take their intensity
//! from the track's energy and a role from [`crate::roles`].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::catalog::AudioFeatures;
use crate::classify::{classify_intensity, tempo_to_range};
use crate::plan::{Intensity, LessonPlan, Segment};
use crate::roles::assign_role;

/// A plan needs a warm-up, at least one body segment, and a cool-down.
pub const MIN_PLAYLIST_TRACKS: usize = 3;

/// Per-track duration cap in seconds.
pub const MAX_TRACK_SECONDS: u32 = 3600;

/// Energy assumed for a track whose features omit it.
pub const DEFAULT_ENERGY: f64 = 0.5;

/// Features assumed for a track whose lookup returned nothing.
pub const DEFAULT_FEATURES: AudioFeatures = AudioFeatures {
    tempo: 100.0,
    energy: Some(DEFAULT_ENERGY),
};

/// A track as listed in a source playlist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistTrack {
    pub id: String,
    pub name: String,
    /// Primary artist name.
    pub artist: String,
    pub duration_ms: Option<i64>,
    pub uri: String,
    /// Zero-based position in the source playlist.
    pub position: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("Playlist is empty or contains no playable tracks")]
    EmptyPlaylist,

    #[error("Playlist must contain at least {required} tracks for a valid workout plan, found {found}")]
    InsufficientTracks { found: usize, required: usize },
}

/// Whole seconds of a track, floored at 0 and capped at [`MAX_TRACK_SECONDS`].
pub fn track_duration_seconds(duration_ms: Option<i64>) -> u32 {
    let seconds = duration_ms.unwrap_or(0).max(0) / 1000;
    u32::try_from(seconds).map_or(MAX_TRACK_SECONDS, |s| s.min(MAX_TRACK_SECONDS))
}

/// Build a plan with one segment per track, in playlist order.
///
/// Tracks missing from `features` use [`DEFAULT_FEATURES`].
pub fn convert(
    tracks: &[PlaylistTrack],
    features: &HashMap<String, AudioFeatures>,
    playlist_name: &str,
) -> Result<LessonPlan, ConvertError> {
    if tracks.is_empty() {
        return Err(ConvertError::EmptyPlaylist);
    }
    if tracks.len() < MIN_PLAYLIST_TRACKS {
        return Err(ConvertError::InsufficientTracks {
            found: tracks.len(),
            required: MIN_PLAYLIST_TRACKS,
        });
    }

    let total = tracks.len();
    let segments = tracks
        .iter()
        .enumerate()
        .map(|(i, track)| {
            let audio = features.get(&track.id).copied().unwrap_or(DEFAULT_FEATURES);

            let intensity = if i == 0 || i + 1 == total {
                Intensity::Low
            } else {
                classify_intensity(audio.energy.unwrap_or(DEFAULT_ENERGY))
            };
            let role = assign_role(i, total, intensity);

            Segment {
                name: role.name.to_string(),
                duration_seconds: track_duration_seconds(track.duration_ms),
                intensity,
                position: role.position,
                description: role.description.to_string(),
                suggested_bpm_range: tempo_to_range(audio.tempo),
                song: Some(format!("{} - {}", track.name, track.artist)),
                spotify_uri: Some(track.uri.clone()),
                song_start_seconds: 0,
                song_end_seconds: None,
                fade_out: false,
                sub_segments: None,
            }
        })
        .collect();

    Ok(LessonPlan::new(
        playlist_name,
        segments,
        Some(format!("Created from Spotify playlist: {playlist_name}")),
    ))
}
