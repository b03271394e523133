//! Integration tests for the repository layer against a real database.

use chrono::{Duration, Utc};
use cycle_core::plan::{Intensity, LessonPlan, Position, Segment};
use cycle_db::models::lesson_plan::LessonPlanDocument;
use cycle_db::models::session::CreateSession;
use cycle_db::models::spotify::UpsertSpotifyConnection;
use cycle_db::models::user::{CreateUser, User};
use cycle_db::repositories::{
    LessonPlanRepo, SessionRepo, SpotifyConnectionRepo, SpotifyOAuthStateRepo, UserRepo,
};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn new_user(pool: &PgPool, email: &str) -> User {
    UserRepo::create(
        pool,
        &CreateUser {
            email: email.to_string(),
            password_hash: "hash".to_string(),
        },
    )
    .await
    .unwrap()
}

fn sample_plan(theme: &str, seconds: &[u32]) -> LessonPlan {
    let segments = seconds
        .iter()
        .enumerate()
        .map(|(i, &duration_seconds)| Segment {
            name: format!("Block {i}"),
            duration_seconds,
            intensity: Intensity::Medium,
            position: Position::Seated,
            description: "Steady".to_string(),
            suggested_bpm_range: "100-110".to_string(),
            song: Some(format!("Song {i} - Artist")),
            spotify_uri: None,
            song_start_seconds: 0,
            song_end_seconds: None,
            fade_out: false,
            sub_segments: None,
        })
        .collect();
    LessonPlan::new(theme, segments, None)
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_duplicate_email_violates_unique_constraint(pool: PgPool) {
    new_user(&pool, "rider@example.com").await;

    let err = UserRepo::create(
        &pool,
        &CreateUser {
            email: "rider@example.com".to_string(),
            password_hash: "other".to_string(),
        },
    )
    .await
    .unwrap_err();

    let db_err = err.as_database_error().expect("database error");
    assert_eq!(db_err.code().as_deref(), Some("23505"));
    assert_eq!(db_err.constraint(), Some("uq_users_email"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_failed_logins_and_reset(pool: PgPool) {
    let user = new_user(&pool, "lock@example.com").await;

    assert_eq!(UserRepo::increment_failed_login(&pool, user.id).await.unwrap(), 1);
    assert_eq!(UserRepo::increment_failed_login(&pool, user.id).await.unwrap(), 2);

    let until = Utc::now() + Duration::minutes(15);
    UserRepo::lock_account(&pool, user.id, until).await.unwrap();
    let locked = UserRepo::find_by_id(&pool, user.id).await.unwrap().unwrap();
    assert!(locked.locked_until.is_some());

    UserRepo::record_successful_login(&pool, user.id).await.unwrap();
    let reset = UserRepo::find_by_email(&pool, "lock@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reset.failed_login_count, 0);
    assert!(reset.locked_until.is_none());
    assert!(reset.last_login_at.is_some());
}

// ---------------------------------------------------------------------------
// Sessions
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_revoked_and_expired_sessions_are_not_found(pool: PgPool) {
    let user = new_user(&pool, "session@example.com").await;

    let active = SessionRepo::create(
        &pool,
        &CreateSession {
            user_id: user.id,
            refresh_token_hash: "active".to_string(),
            expires_at: Utc::now() + Duration::days(1),
            user_agent: None,
        },
    )
    .await
    .unwrap();
    SessionRepo::create(
        &pool,
        &CreateSession {
            user_id: user.id,
            refresh_token_hash: "expired".to_string(),
            expires_at: Utc::now() - Duration::minutes(1),
            user_agent: Some("test".to_string()),
        },
    )
    .await
    .unwrap();

    assert!(SessionRepo::consume(&pool, "expired").await.unwrap().is_none());

    let consumed = SessionRepo::consume(&pool, "active").await.unwrap().unwrap();
    assert_eq!(consumed.id, active.id);
    assert!(consumed.is_revoked);
    assert!(SessionRepo::consume(&pool, "active").await.unwrap().is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_prune_drops_only_dead_sessions(pool: PgPool) {
    let user = new_user(&pool, "prune@example.com").await;
    for (hash, expires_at) in [
        ("live", Utc::now() + Duration::days(1)),
        ("rotated", Utc::now() + Duration::days(1)),
        ("stale", Utc::now() - Duration::days(1)),
    ] {
        SessionRepo::create(
            &pool,
            &CreateSession {
                user_id: user.id,
                refresh_token_hash: hash.to_string(),
                expires_at,
                user_agent: None,
            },
        )
        .await
        .unwrap();
    }
    SessionRepo::consume(&pool, "rotated").await.unwrap().unwrap();

    let pruned = SessionRepo::prune_for_user(&pool, user.id, Utc::now())
        .await
        .unwrap();

    assert_eq!(pruned, 2);
    assert_eq!(
        SessionRepo::revoke_all_for_user(&pool, user.id).await.unwrap(),
        1
    );
}

// ---------------------------------------------------------------------------
// Lesson plans
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_plan_document_round_trips(pool: PgPool) {
    let user = new_user(&pool, "plans@example.com").await;
    let plan = sample_plan("Disco Inferno", &[300, 241]);
    let doc = LessonPlanDocument::from_plan(&plan).unwrap();

    let row = LessonPlanRepo::create(&pool, user.id, &doc).await.unwrap();
    assert_eq!(row.theme, "Disco Inferno");
    assert_eq!(row.duration_minutes, 10);

    let fetched = LessonPlanRepo::find_for_user(&pool, row.id, user.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(fetched.plan().unwrap(), plan);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_plans_are_scoped_to_owner(pool: PgPool) {
    let owner = new_user(&pool, "owner@example.com").await;
    let other = new_user(&pool, "other@example.com").await;
    let doc = LessonPlanDocument::from_plan(&sample_plan("Mine", &[600])).unwrap();
    let row = LessonPlanRepo::create(&pool, owner.id, &doc).await.unwrap();

    assert!(LessonPlanRepo::find_for_user(&pool, row.id, other.id)
        .await
        .unwrap()
        .is_none());
    assert!(LessonPlanRepo::replace(&pool, row.id, other.id, &doc)
        .await
        .unwrap()
        .is_none());
    assert!(!LessonPlanRepo::delete(&pool, row.id, other.id).await.unwrap());
    assert!(LessonPlanRepo::list_for_user(&pool, other.id)
        .await
        .unwrap()
        .is_empty());

    assert!(LessonPlanRepo::delete(&pool, row.id, owner.id).await.unwrap());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_list_newest_first_and_replace(pool: PgPool) {
    let user = new_user(&pool, "list@example.com").await;
    let first = LessonPlanRepo::create(
        &pool,
        user.id,
        &LessonPlanDocument::from_plan(&sample_plan("First", &[60])).unwrap(),
    )
    .await
    .unwrap();
    let second = LessonPlanRepo::create(
        &pool,
        user.id,
        &LessonPlanDocument::from_plan(&sample_plan("Second", &[60])).unwrap(),
    )
    .await
    .unwrap();

    let listed = LessonPlanRepo::list_for_user(&pool, user.id).await.unwrap();
    let ids: Vec<_> = listed.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![second.id, first.id]);

    let replacement = LessonPlanDocument::from_plan(&sample_plan("First v2", &[60, 60, 1])).unwrap();
    let updated = LessonPlanRepo::replace(&pool, first.id, user.id, &replacement)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.theme, "First v2");
    assert_eq!(updated.duration_minutes, 3);
}

// ---------------------------------------------------------------------------
// Spotify
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_upsert_keeps_refresh_token_when_omitted(pool: PgPool) {
    let user = new_user(&pool, "spotify@example.com").await;
    let expires_at = Utc::now() + Duration::hours(1);

    SpotifyConnectionRepo::upsert(
        &pool,
        &UpsertSpotifyConnection {
            user_id: user.id,
            access_token: "access-1".to_string(),
            refresh_token: Some("refresh-1".to_string()),
            expires_at,
        },
    )
    .await
    .unwrap();

    let refreshed = SpotifyConnectionRepo::upsert(
        &pool,
        &UpsertSpotifyConnection {
            user_id: user.id,
            access_token: "access-2".to_string(),
            refresh_token: None,
            expires_at,
        },
    )
    .await
    .unwrap();
    assert_eq!(refreshed.access_token, "access-2");
    assert_eq!(refreshed.refresh_token.as_deref(), Some("refresh-1"));

    assert!(SpotifyConnectionRepo::delete(&pool, user.id).await.unwrap());
    assert!(SpotifyConnectionRepo::find_by_user(&pool, user.id)
        .await
        .unwrap()
        .is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_oauth_state_is_single_use_and_expires(pool: PgPool) {
    let user = new_user(&pool, "oauth@example.com").await;

    SpotifyOAuthStateRepo::create(&pool, "fresh", user.id, Utc::now() + Duration::minutes(10))
        .await
        .unwrap();
    SpotifyOAuthStateRepo::create(&pool, "stale", user.id, Utc::now() - Duration::minutes(1))
        .await
        .unwrap();

    let taken = SpotifyOAuthStateRepo::take(&pool, "fresh").await.unwrap().unwrap();
    assert_eq!(taken.user_id, user.id);
    assert!(SpotifyOAuthStateRepo::take(&pool, "fresh").await.unwrap().is_none());
    assert!(SpotifyOAuthStateRepo::take(&pool, "stale").await.unwrap().is_none());

    assert_eq!(SpotifyOAuthStateRepo::cleanup_expired(&pool).await.unwrap(), 1);
}
