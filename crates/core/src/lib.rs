//! Cycle Planner domain core.
//!
//! Pure lesson-plan types and the pipeline that turns AI output or a
//! streaming playlist into a validated [`plan::LessonPlan`]. The only I/O
//! seam is the [`catalog::TrackCatalog`] trait used by the auto-linker.

pub mod catalog;
pub mod classify;
pub mod error;
pub mod linker;
pub mod normalize;
pub mod plan;
pub mod playlist;
pub mod rate_limit;
pub mod roles;
pub mod types;
