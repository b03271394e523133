//! Audio-feature classification: energy to intensity, tempo to BPM range.

use crate::plan::Intensity;

/// Energy below this is [`Intensity::Low`].
pub const MEDIUM_ENERGY_THRESHOLD: f64 = 0.4;

/// Energy at or above this is [`Intensity::High`].
pub const HIGH_ENERGY_THRESHOLD: f64 = 0.7;

/// Width of a tempo bucket in BPM.
const TEMPO_STEP: f64 = 5.0;

/// Map a Spotify-style energy score (nominally 0..=1) to an intensity.
///
/// Out-of-range values are classified with the same thresholds.
pub fn classify_intensity(energy: f64) -> Intensity {
    if energy < MEDIUM_ENERGY_THRESHOLD {
        Intensity::Low
    } else if energy < HIGH_ENERGY_THRESHOLD {
        Intensity::Medium
    } else {
        Intensity::High
    }
}

/// Format a tempo as a `"{lo}-{hi}"` BPM range around the nearest multiple
/// of five. Halfway values round to the even multiple.
///
/// Bounds saturate at the `i64` range and NaN formats as `"0-0"`.
pub fn tempo_to_range(tempo: f64) -> String {
    let base = (tempo / TEMPO_STEP).round_ties_even() * TEMPO_STEP;
    format!("{}-{}", (base - TEMPO_STEP) as i64, (base + TEMPO_STEP) as i64)
}
