//! Auto-linking of AI-suggested song titles to catalog tracks.

use crate::catalog::{CatalogError, TrackCatalog};
use crate::classify::{classify_intensity, tempo_to_range};
use crate::plan::{LessonPlan, Segment};

/// Resolve free-text songs in `plan` against `catalog`.
///
/// Returns the plan unchanged when `catalog` is `None`. Each segment with a
/// song and no `spotify_uri` is searched in order; a failure for one segment
/// leaves it exactly as it was and moves on. The total is recomputed at the
/// end.
pub async fn link(plan: LessonPlan, catalog: Option<&dyn TrackCatalog>) -> LessonPlan {
    let Some(catalog) = catalog else {
        return plan;
    };

    let theme = plan.theme.clone();
    let notes = plan.notes.clone();
    let mut segments = plan.into_segments();
    let mut linked = 0usize;

    for (index, segment) in segments.iter_mut().enumerate() {
        let Some(song) = segment.song.clone() else {
            continue;
        };
        if segment.spotify_uri.is_some() || song.trim().is_empty() {
            continue;
        }

        match enrich(segment, &song, catalog).await {
            Ok(Some(enriched)) => {
                *segment = enriched;
                linked += 1;
            }
            Ok(None) => {
                tracing::debug!(index, song = %song, "No catalog match for segment song");
            }
            Err(e) => {
                tracing::warn!(index, song = %song, error = %e, "Failed to link segment song");
            }
        }
    }

    tracing::debug!(linked, "Auto-linked segment songs");
    LessonPlan::new(theme, segments, notes)
}

/// Build the enriched copy of `segment`, or `None` when the search misses.
///
/// Works on a clone so that a lookup error after a successful search never
/// leaves a half-updated segment behind.
async fn enrich(
    segment: &Segment,
    song: &str,
    catalog: &dyn TrackCatalog,
) -> Result<Option<Segment>, CatalogError> {
    let Some(track) = catalog.search_track(song).await? else {
        return Ok(None);
    };

    let mut updated = segment.clone();
    updated.song = Some(track.label());
    updated.spotify_uri = Some(track.uri.clone());
    if let Some(ms) = track.duration_ms.filter(|ms| *ms > 0) {
        updated.duration_seconds = u32::try_from(ms / 1000).unwrap_or(u32::MAX);
    }

    if let Some(features) = catalog.audio_features(&track.id).await? {
        if let Some(energy) = features.energy {
            updated.intensity = classify_intensity(energy);
        }
        if features.tempo > 0.0 {
            updated.suggested_bpm_range = tempo_to_range(features.tempo);
        }
    }

    Ok(Some(updated))
}
