//! Normalization of language-model output into a [`LessonPlan`].
//!
//! The model is asked for bare JSON but sometimes wraps it in prose or a
//! markdown fence. [`normalize`] accepts both forms, validates the document
//! shape field by field, and recomputes the plan total from segment
//! durations.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::plan::{Intensity, LessonPlan, Position, MIN_SUB_SEGMENT_SECONDS};

/// Maximum number of characters of the offending text kept in a
/// [`NormalizeError::MalformedResponse`].
pub const ERROR_PREVIEW_CHARS: usize = 200;

/// First fenced code block, optionally tagged `json`.
static FENCED_BLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```(?:json)?\s*([\s\S]*?)\s*```").expect("valid regex"));

// ---------------------------------------------------------------------------
// Generation metadata
// ---------------------------------------------------------------------------

/// Why the model stopped generating.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    EndTurn,
    StopSequence,
    /// Output was cut off by the token limit.
    MaxTokens,
    Other(String),
}

impl StopReason {
    /// Map the Anthropic `stop_reason` string.
    pub fn from_api(value: Option<&str>) -> Self {
        match value {
            Some("end_turn") => Self::EndTurn,
            Some("stop_sequence") => Self::StopSequence,
            Some("max_tokens") => Self::MaxTokens,
            Some(other) => Self::Other(other.to_string()),
            None => Self::Other("unknown".to_string()),
        }
    }

    pub fn is_truncated(&self) -> bool {
        matches!(self, Self::MaxTokens)
    }
}

/// Token counters reported with a generation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum NormalizeError {
    /// The model hit its token limit; the text is incomplete.
    #[error("AI response was truncated after {output_tokens} output tokens")]
    TruncatedOutput { output_tokens: u32 },

    /// Neither the raw text nor a fenced block parsed as JSON.
    #[error("Failed to parse AI response as JSON: {preview}")]
    MalformedResponse { preview: String },

    /// The JSON parsed but does not have the lesson-plan shape.
    #[error("Invalid lesson plan field `{field}`: {reason}")]
    SchemaValidation { field: String, reason: String },
}

fn schema_error(field: impl Into<String>, reason: impl Into<String>) -> NormalizeError {
    NormalizeError::SchemaValidation {
        field: field.into(),
        reason: reason.into(),
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Turn a raw model response into a validated plan.
///
/// Truncation is checked before parsing: a partial response that happens to
/// parse is still rejected.
pub fn normalize(
    raw_text: &str,
    stop_reason: &StopReason,
    usage: &TokenUsage,
) -> Result<LessonPlan, NormalizeError> {
    if stop_reason.is_truncated() {
        return Err(NormalizeError::TruncatedOutput {
            output_tokens: usage.output_tokens,
        });
    }

    let mut document = parse_document(raw_text)?;
    validate_plan(&mut document)?;

    let plan: LessonPlan =
        serde_json::from_value(document).map_err(|e| schema_error("plan", e.to_string()))?;

    for index in plan.sub_segment_mismatches() {
        tracing::warn!(
            segment = index,
            "Sub-segment durations do not add up to the segment duration"
        );
    }

    tracing::debug!(
        input_tokens = usage.input_tokens,
        output_tokens = usage.output_tokens,
        segments = plan.segments().len(),
        total_minutes = plan.total_duration_minutes(),
        "Normalized AI lesson plan"
    );

    Ok(plan)
}

/// Parse the text directly, falling back to the first fenced block.
fn parse_document(raw_text: &str) -> Result<Value, NormalizeError> {
    if let Ok(value) = serde_json::from_str::<Value>(raw_text.trim()) {
        return Ok(value);
    }

    FENCED_BLOCK_RE
        .captures(raw_text)
        .and_then(|caps| caps.get(1))
        .and_then(|inner| serde_json::from_str::<Value>(inner.as_str()).ok())
        .ok_or_else(|| NormalizeError::MalformedResponse {
            preview: raw_text.chars().take(ERROR_PREVIEW_CHARS).collect(),
        })
}

// ---------------------------------------------------------------------------
// Shape validation
// ---------------------------------------------------------------------------

/// Check the document's shape, coercing integral floats in duration fields
/// to integers so the typed decode accepts them.
fn validate_plan(document: &mut Value) -> Result<(), NormalizeError> {
    let obj = document
        .as_object_mut()
        .ok_or_else(|| schema_error("plan", "expected a JSON object"))?;

    require_string(obj, "theme", "")?;
    optional_string(obj, "notes", "")?;

    let segments = obj
        .get_mut("segments")
        .ok_or_else(|| schema_error("segments", "field is required"))?
        .as_array_mut()
        .ok_or_else(|| schema_error("segments", "expected an array"))?;

    for (i, segment) in segments.iter_mut().enumerate() {
        validate_segment(segment, &format!("segments[{i}]"))?;
    }
    Ok(())
}

fn validate_segment(value: &mut Value, path: &str) -> Result<(), NormalizeError> {
    let obj = value
        .as_object_mut()
        .ok_or_else(|| schema_error(path, "expected a JSON object"))?;

    require_string(obj, "name", path)?;
    require_seconds(obj, "duration_seconds", path, 0)?;
    require_enum(obj, "intensity", path, &Intensity::VALUES)?;
    require_enum(obj, "position", path, &Position::VALUES)?;
    require_string(obj, "description", path)?;
    require_string(obj, "suggested_bpm_range", path)?;
    optional_string(obj, "song", path)?;
    optional_string(obj, "spotify_uri", path)?;
    if obj.contains_key("song_start_seconds") {
        require_seconds(obj, "song_start_seconds", path, 0)?;
    }
    optional_seconds(obj, "song_end_seconds", path)?;

    if let Some(fade) = obj.get("fade_out") {
        if !fade.is_boolean() {
            return Err(schema_error(field_path(path, "fade_out"), "expected a boolean"));
        }
    }

    match obj.get_mut("sub_segments") {
        None | Some(Value::Null) => {}
        Some(Value::Array(subs)) => {
            for (j, sub) in subs.iter_mut().enumerate() {
                validate_sub_segment(sub, &format!("{path}.sub_segments[{j}]"))?;
            }
        }
        Some(_) => {
            return Err(schema_error(
                field_path(path, "sub_segments"),
                "expected an array",
            ))
        }
    }
    Ok(())
}

fn validate_sub_segment(value: &mut Value, path: &str) -> Result<(), NormalizeError> {
    let obj = value
        .as_object_mut()
        .ok_or_else(|| schema_error(path, "expected a JSON object"))?;

    require_string(obj, "name", path)?;
    require_seconds(obj, "duration_seconds", path, MIN_SUB_SEGMENT_SECONDS)?;
    require_enum(obj, "intensity", path, &Intensity::VALUES)?;
    require_enum(obj, "position", path, &Position::VALUES)?;
    require_string(obj, "description", path)?;
    if obj.contains_key("suggested_bpm_range") {
        require_string(obj, "suggested_bpm_range", path)?;
    }
    Ok(())
}

fn field_path(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{parent}.{key}")
    }
}

fn require_string(obj: &Map<String, Value>, key: &str, parent: &str) -> Result<(), NormalizeError> {
    match obj.get(key) {
        Some(Value::String(_)) => Ok(()),
        Some(_) => Err(schema_error(field_path(parent, key), "expected a string")),
        None => Err(schema_error(field_path(parent, key), "field is required")),
    }
}

fn optional_string(obj: &Map<String, Value>, key: &str, parent: &str) -> Result<(), NormalizeError> {
    match obj.get(key) {
        None | Some(Value::Null) | Some(Value::String(_)) => Ok(()),
        Some(_) => Err(schema_error(field_path(parent, key), "expected a string or null")),
    }
}

fn require_enum(
    obj: &Map<String, Value>,
    key: &str,
    parent: &str,
    allowed: &[&str],
) -> Result<(), NormalizeError> {
    match obj.get(key) {
        Some(Value::String(s)) if allowed.contains(&s.as_str()) => Ok(()),
        Some(_) => Err(schema_error(
            field_path(parent, key),
            format!("expected one of {}", allowed.join(", ")),
        )),
        None => Err(schema_error(field_path(parent, key), "field is required")),
    }
}

fn require_seconds(
    obj: &mut Map<String, Value>,
    key: &str,
    parent: &str,
    min: u32,
) -> Result<(), NormalizeError> {
    let value = obj
        .get_mut(key)
        .ok_or_else(|| schema_error(field_path(parent, key), "field is required"))?;
    let seconds = as_seconds(value)
        .ok_or_else(|| schema_error(field_path(parent, key), "expected a non-negative integer"))?;
    *value = Value::from(seconds);
    if seconds < min {
        return Err(schema_error(
            field_path(parent, key),
            format!("must be at least {min}"),
        ));
    }
    Ok(())
}

fn optional_seconds(
    obj: &mut Map<String, Value>,
    key: &str,
    parent: &str,
) -> Result<(), NormalizeError> {
    match obj.get_mut(key) {
        None | Some(Value::Null) => Ok(()),
        Some(value) => {
            let seconds = as_seconds(value).ok_or_else(|| {
                schema_error(field_path(parent, key), "expected a non-negative integer")
            })?;
            *value = Value::from(seconds);
            Ok(())
        }
    }
}

/// A `u32` from an integer, or from a float with no fractional part.
fn as_seconds(value: &Value) -> Option<u32> {
    if let Some(n) = value.as_u64() {
        return u32::try_from(n).ok();
    }
    let f = value.as_f64()?;
    (f.fract() == 0.0 && (0.0..=f64::from(u32::MAX)).contains(&f)).then(|| f as u32)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
