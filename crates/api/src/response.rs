//! Shared response bodies for API handlers.

use cycle_core::types::DbId;
use serde::Serialize;

/// `{ "message": ... }` acknowledgement.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// `{ "id": ..., "message": ... }` acknowledgement for writes.
#[derive(Debug, Serialize)]
pub struct SavedResponse {
    pub id: DbId,
    pub message: &'static str,
}
