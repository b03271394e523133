//! Sliding-window limiter for AI plan generation.
//!
//! State is in-process only: limits reset on restart and are not shared
//! between instances. Time comes from an injected [`Clock`] so windows can be
//! driven deterministically in tests.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::Serialize;
use tokio::sync::Mutex;

use crate::error::CoreError;
use crate::types::{DbId, Timestamp};

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Wall-clock UTC time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Utc::now()
    }
}

/// Usage snapshot returned by `GET /api/rate-limit`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RateLimitStatus {
    pub remaining: u32,
    pub limit: u32,
    pub window_hours: u32,
    pub used: u32,
    /// When the oldest request in the window expires.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resets_at: Option<Timestamp>,
}

/// A claimed slot in a user's window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reservation {
    user_id: DbId,
    at: Timestamp,
}

pub struct RateLimiter {
    max_requests: u32,
    window_hours: u32,
    clock: Arc<dyn Clock>,
    requests: Mutex<HashMap<DbId, Vec<Timestamp>>>,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window_hours: u32) -> Self {
        Self::with_clock(max_requests, window_hours, Arc::new(SystemClock))
    }

    pub fn with_clock(max_requests: u32, window_hours: u32, clock: Arc<dyn Clock>) -> Self {
        Self {
            max_requests,
            window_hours,
            clock,
            requests: Mutex::new(HashMap::new()),
        }
    }

    fn window(&self) -> Duration {
        Duration::hours(i64::from(self.window_hours))
    }

    /// Claim one generation slot for `user_id`.
    ///
    /// The window check and the claim happen under one lock, so concurrent
    /// callers can never overshoot the limit. Hand the returned
    /// [`Reservation`] to [`RateLimiter::release`] if the generation fails.
    pub async fn reserve(&self, user_id: DbId) -> Result<Reservation, CoreError> {
        let now = self.clock.now();
        let mut requests = self.requests.lock().await;
        let history = Self::prune(&mut requests, user_id, now - self.window());

        if (history.len() as u64) < u64::from(self.max_requests) {
            history.push(now);
            return Ok(Reservation { user_id, at: now });
        }

        let reset_at = history.iter().min().copied().unwrap_or(now) + self.window();
        let minutes = (reset_at - now).num_minutes().max(0);
        let (hours, mins) = (minutes / 60, minutes % 60);
        let wait = if hours > 0 {
            format!("{hours}h {mins}m")
        } else {
            format!("{mins} minutes")
        };

        Err(CoreError::RateLimited(format!(
            "Rate limit exceeded. You can generate {} plans per {} hours. Try again in {wait}.",
            self.max_requests, self.window_hours
        )))
    }

    /// Give back a slot whose generation did not succeed.
    pub async fn release(&self, reservation: Reservation) {
        let mut requests = self.requests.lock().await;
        if let Some(history) = requests.get_mut(&reservation.user_id) {
            if let Some(pos) = history.iter().position(|at| *at == reservation.at) {
                history.swap_remove(pos);
            }
        }
    }

    pub async fn status(&self, user_id: DbId) -> RateLimitStatus {
        let now = self.clock.now();
        let mut requests = self.requests.lock().await;
        let history = Self::prune(&mut requests, user_id, now - self.window());

        let used = u32::try_from(history.len()).unwrap_or(u32::MAX);
        RateLimitStatus {
            remaining: self.max_requests.saturating_sub(used),
            limit: self.max_requests,
            window_hours: self.window_hours,
            used,
            resets_at: history.iter().min().map(|oldest| *oldest + self.window()),
        }
    }

    /// Drop entries at or before `window_start` and return what is left.
    fn prune(
        requests: &mut HashMap<DbId, Vec<Timestamp>>,
        user_id: DbId,
        window_start: Timestamp,
    ) -> &mut Vec<Timestamp> {
        let history = requests.entry(user_id).or_default();
        history.retain(|at| *at > window_start);
        history
    }
}
