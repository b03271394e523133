//! Lesson plan generation through the Anthropic Messages API.

pub mod claude;
pub mod generate;
pub mod prompt;

pub use claude::{ClaudeApi, ClaudeApiError, ClaudeConfig};
pub use generate::{generate_lesson_plan, GenerateError};
