//! Lesson plan document model.
//!
//! A [`LessonPlan`] is an ordered list of [`Segment`]s. Its
//! `total_duration_minutes` is always derived from the segment durations:
//! it is recomputed on construction, on deserialization, and whenever the
//! segment list is replaced, so an upstream value is never trusted.

use serde::{Deserialize, Serialize};

/// Seconds per minute, used for the derived total.
const SECONDS_PER_MINUTE: u64 = 60;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Coarse workout-effort label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intensity {
    Low,
    Medium,
    High,
}

impl Intensity {
    /// All accepted wire values, in ascending effort order.
    pub const VALUES: [&'static str; 3] = ["low", "medium", "high"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// Rider position on the bike.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    Seated,
    Standing,
}

impl Position {
    pub const VALUES: [&'static str; 2] = ["seated", "standing"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Seated => "seated",
            Self::Standing => "standing",
        }
    }
}

// ---------------------------------------------------------------------------
// Segments
// ---------------------------------------------------------------------------

/// Minimum duration of a sub-segment in seconds.
pub const MIN_SUB_SEGMENT_SECONDS: u32 = 5;

/// A timed block nested inside a [`Segment`] (e.g. one Tabata interval).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubSegment {
    pub name: String,
    pub duration_seconds: u32,
    pub intensity: Intensity,
    pub position: Position,
    pub description: String,
    #[serde(default)]
    pub suggested_bpm_range: String,
}

/// One timed block of a workout, usually tied to a song.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub name: String,
    pub duration_seconds: u32,
    pub intensity: Intensity,
    pub position: Position,
    pub description: String,
    pub suggested_bpm_range: String,
    /// Free-text `"title - artist"`.
    #[serde(default)]
    pub song: Option<String>,
    /// Resolved Spotify track URI.
    #[serde(default)]
    pub spotify_uri: Option<String>,
    #[serde(default)]
    pub song_start_seconds: u32,
    #[serde(default)]
    pub song_end_seconds: Option<u32>,
    #[serde(default)]
    pub fade_out: bool,
    #[serde(default)]
    pub sub_segments: Option<Vec<SubSegment>>,
}

impl Segment {
    /// Sum of sub-segment durations, or `None` when the segment has none.
    pub fn sub_segment_seconds(&self) -> Option<u64> {
        self.sub_segments
            .as_ref()
            .map(|subs| subs.iter().map(|s| u64::from(s.duration_seconds)).sum())
    }
}

// ---------------------------------------------------------------------------
// LessonPlan
// ---------------------------------------------------------------------------

/// A complete cycle class plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "LessonPlanDocument")]
pub struct LessonPlan {
    pub theme: String,
    total_duration_minutes: u32,
    segments: Vec<Segment>,
    pub notes: Option<String>,
}

/// Wire shape of a plan as received from clients, storage, or the AI.
///
/// Any incoming `total_duration_minutes` is ignored as an unknown field.
#[derive(Deserialize)]
struct LessonPlanDocument {
    theme: String,
    segments: Vec<Segment>,
    #[serde(default)]
    notes: Option<String>,
}

/// A decoded plan that breaks a structural rule.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum PlanError {
    #[error(
        "segments[{segment}].sub_segments[{sub_segment}].duration_seconds must be at least {min}, got {seconds}",
        min = MIN_SUB_SEGMENT_SECONDS
    )]
    SubSegmentTooShort {
        segment: usize,
        sub_segment: usize,
        seconds: u32,
    },
}

impl TryFrom<LessonPlanDocument> for LessonPlan {
    type Error = PlanError;

    fn try_from(doc: LessonPlanDocument) -> Result<Self, Self::Error> {
        check_sub_segments(&doc.segments)?;
        Ok(LessonPlan::new(doc.theme, doc.segments, doc.notes))
    }
}

/// Every sub-segment must last at least [`MIN_SUB_SEGMENT_SECONDS`].
pub fn check_sub_segments(segments: &[Segment]) -> Result<(), PlanError> {
    for (segment, seg) in segments.iter().enumerate() {
        for (sub_segment, sub) in seg.sub_segments.iter().flatten().enumerate() {
            if sub.duration_seconds < MIN_SUB_SEGMENT_SECONDS {
                return Err(PlanError::SubSegmentTooShort {
                    segment,
                    sub_segment,
                    seconds: sub.duration_seconds,
                });
            }
        }
    }
    Ok(())
}

impl LessonPlan {
    /// Build a plan, deriving `total_duration_minutes` from `segments`.
    pub fn new(theme: impl Into<String>, segments: Vec<Segment>, notes: Option<String>) -> Self {
        let total_duration_minutes = total_minutes(&segments);
        Self {
            theme: theme.into(),
            total_duration_minutes,
            segments,
            notes,
        }
    }

    /// Total class length in whole minutes, rounded up.
    pub fn total_duration_minutes(&self) -> u32 {
        self.total_duration_minutes
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Replace the segment list and recompute the total.
    pub fn set_segments(&mut self, segments: Vec<Segment>) {
        self.total_duration_minutes = total_minutes(&segments);
        self.segments = segments;
    }

    /// Consume the plan, returning its segments.
    pub fn into_segments(self) -> Vec<Segment> {
        self.segments
    }

    /// Sum of all segment durations in seconds.
    pub fn total_seconds(&self) -> u64 {
        total_seconds(&self.segments)
    }

    /// Indices of segments whose sub-segment durations do not add up to the
    /// segment's own duration.
    pub fn sub_segment_mismatches(&self) -> Vec<usize> {
        self.segments
            .iter()
            .enumerate()
            .filter_map(|(i, seg)| match seg.sub_segment_seconds() {
                Some(sum) if sum != u64::from(seg.duration_seconds) => Some(i),
                _ => None,
            })
            .collect()
    }

    /// Unique resolved track URIs in segment order.
    pub fn track_uris(&self) -> Vec<String> {
        let mut uris: Vec<String> = Vec::new();
        for uri in self.segments.iter().filter_map(|s| s.spotify_uri.as_ref()) {
            if !uris.contains(uri) {
                uris.push(uri.clone());
            }
        }
        uris
    }
}

fn total_seconds(segments: &[Segment]) -> u64 {
    segments.iter().map(|s| u64::from(s.duration_seconds)).sum()
}

/// `ceil(sum(durations) / 60)`.
pub fn total_minutes(segments: &[Segment]) -> u32 {
    let minutes = total_seconds(segments).div_ceil(SECONDS_PER_MINUTE);
    u32::try_from(minutes).unwrap_or(u32::MAX)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
