//! Segment role assignment for playlist-derived plans.
//!
//! The first track is always the warm-up and the last the cool-down. Body
//! tracks cycle through a template list for their intensity by index, which
//! gives variety across long playlists without any bookkeeping.

use crate::plan::{Intensity, Position};

/// Name, position, and coaching cue for a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentRole {
    pub name: &'static str,
    pub position: Position,
    pub description: &'static str,
}

impl SegmentRole {
    const fn new(name: &'static str, position: Position, description: &'static str) -> Self {
        Self {
            name,
            position,
            description,
        }
    }
}

pub const WARM_UP: SegmentRole = SegmentRole::new(
    "Warm-Up",
    Position::Seated,
    "Light resistance, easy pace. Focus on warming up the legs and finding your rhythm.",
);

pub const COOL_DOWN: SegmentRole = SegmentRole::new(
    "Cool-Down",
    Position::Seated,
    "Low resistance, slow pace. Focus on deep breathing and bringing heart rate down.",
);

const HIGH_ROLES: [SegmentRole; 4] = [
    SegmentRole::new(
        "Seated Sprint",
        Position::Seated,
        "High cadence, moderate resistance. Push for speed while staying controlled.",
    ),
    SegmentRole::new(
        "Standing Climb",
        Position::Standing,
        "Heavy resistance, slow powerful pushes. Drive through your legs.",
    ),
    SegmentRole::new(
        "Standing Sprint",
        Position::Standing,
        "High cadence out of the saddle. Stay light on the pedals.",
    ),
    SegmentRole::new(
        "Attack",
        Position::Standing,
        "Maximum effort! Give it everything you've got.",
    ),
];

const MEDIUM_ROLES: [SegmentRole; 4] = [
    SegmentRole::new(
        "Endurance",
        Position::Seated,
        "Moderate resistance, steady cadence. Find a sustainable pace.",
    ),
    SegmentRole::new(
        "Rolling Hills",
        Position::Seated,
        "Alternating resistance. Up and over the hills.",
    ),
    SegmentRole::new(
        "Seated Climb",
        Position::Seated,
        "Building resistance, controlled cadence. Steady power output.",
    ),
    SegmentRole::new(
        "Intervals",
        Position::Seated,
        "Work-rest cycles. Push during work, recover during rest.",
    ),
];

const LOW_ROLES: [SegmentRole; 3] = [
    SegmentRole::new(
        "Recovery",
        Position::Seated,
        "Light resistance, easy cadence. Active recovery.",
    ),
    SegmentRole::new(
        "Flat Road",
        Position::Seated,
        "Moderate pace, low resistance. Keep the legs moving.",
    ),
    SegmentRole::new(
        "Easy Spin",
        Position::Seated,
        "Minimal resistance, comfortable cadence. Just keep pedaling.",
    ),
];

/// Templates available to body segments of the given intensity.
pub fn templates_for(intensity: Intensity) -> &'static [SegmentRole] {
    match intensity {
        Intensity::High => &HIGH_ROLES,
        Intensity::Medium => &MEDIUM_ROLES,
        Intensity::Low => &LOW_ROLES,
    }
}

/// Pick the role for the track at `index` of `total`.
///
/// A single-track sequence is both first and last; the warm-up wins.
pub fn assign_role(index: usize, total: usize, intensity: Intensity) -> SegmentRole {
    if index == 0 {
        return WARM_UP;
    }
    if index + 1 == total {
        return COOL_DOWN;
    }
    let templates = templates_for(intensity);
    templates[index % templates.len()]
}
