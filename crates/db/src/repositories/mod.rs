//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod lesson_plan_repo;
pub mod session_repo;
pub mod spotify_connection_repo;
pub mod spotify_oauth_state_repo;
pub mod user_repo;

pub use lesson_plan_repo::LessonPlanRepo;
pub use session_repo::SessionRepo;
pub use spotify_connection_repo::SpotifyConnectionRepo;
pub use spotify_oauth_state_repo::SpotifyOAuthStateRepo;
pub use user_repo::UserRepo;
