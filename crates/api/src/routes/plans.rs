//! Route definitions for the `/plans` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::plans;
use crate::state::AppState;

/// Routes mounted at `/plans`. All require auth and are scoped to the owner.
///
/// ```text
/// GET    /       -> list_plans
/// POST   /       -> save_plan
/// GET    /{id}   -> get_plan
/// PUT    /{id}   -> update_plan
/// DELETE /{id}   -> delete_plan
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(plans::list_plans).post(plans::save_plan))
        .route(
            "/{id}",
            get(plans::get_plan)
                .put(plans::update_plan)
                .delete(plans::delete_plan),
        )
}
