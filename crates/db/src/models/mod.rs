//! Row structs and DTOs.
//!
//! Each submodule contains a `FromRow` entity struct matching the database
//! row and the DTOs used for inserts and updates.

pub mod lesson_plan;
pub mod session;
pub mod spotify;
pub mod user;
