//! Rate limiting middleware.
//!
//! Per-user limits on invite mutations (create, accept, decline).

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderValue, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use governor::{
    clock::{Clock, DefaultClock},
    state::keyed::DefaultKeyedStateStore,
    Quota, RateLimiter as GovRateLimiter,
};
use serde_json::json;
use std::{
    num::NonZeroU32,
    sync::atomic::{AtomicU64, Ordering},
};
use uuid::Uuid;

use crate::app::AppState;
use crate::middleware::trace_id::get_request_id;
use crate::middleware::user_auth::UserAuth;

type UserRateLimiter = GovRateLimiter<Uuid, DefaultKeyedStateStore<Uuid>, DefaultClock>;

const FALLBACK_LIMIT: NonZeroU32 = match NonZeroU32::new(30) {
    Some(limit) => limit,
    None => unreachable!(),
};

/// Idle buckets are dropped once every this many checks.
const PRUNE_EVERY: u64 = 1024;

/// Rate limiter state shared across all requests, one bucket per user.
///
/// Buckets that have fully refilled are indistinguishable from fresh ones
/// and get pruned periodically, so memory tracks recently active users.
pub struct RateLimiterState {
    limiter: UserRateLimiter,
    rate_limit_per_minute: u32,
    checks: AtomicU64,
    clock: DefaultClock,
}

impl RateLimiterState {
    pub fn new(rate_limit_per_minute: u32) -> Self {
        let quota =
            Quota::per_minute(NonZeroU32::new(rate_limit_per_minute).unwrap_or(FALLBACK_LIMIT));
        Self {
            limiter: GovRateLimiter::keyed(quota),
            rate_limit_per_minute,
            checks: AtomicU64::new(0),
            clock: DefaultClock::default(),
        }
    }

    pub fn limit_per_minute(&self) -> u32 {
        self.rate_limit_per_minute
    }

    /// Number of users with a live bucket.
    pub fn active_users(&self) -> usize {
        self.limiter.len()
    }

    /// Drops buckets of users that have been idle long enough to refill.
    pub fn prune(&self) {
        self.limiter.retain_recent();
        self.limiter.shrink_to_fit();
    }

    /// Returns `Err(retry_after_secs)` when the user is over the limit.
    pub fn check(&self, user_id: Uuid) -> Result<(), u64> {
        if self.checks.fetch_add(1, Ordering::Relaxed) % PRUNE_EVERY == PRUNE_EVERY - 1 {
            self.prune();
        }

        self.limiter.check_key(&user_id).map_err(|not_until| {
            not_until
                .wait_time_from(self.clock.now())
                .as_secs()
                .max(1)
        })
    }
}

impl std::fmt::Debug for RateLimiterState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiterState")
            .field("rate_limit_per_minute", &self.rate_limit_per_minute)
            .field("active_limiters", &self.active_users())
            .finish()
    }
}

/// Middleware that applies rate limiting per authenticated user.
///
/// Must run after `require_user_auth` so the user is in request extensions.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let (Some(limiter), Some(auth)) = (&state.rate_limiter, req.extensions().get::<UserAuth>())
    else {
        return next.run(req).await;
    };

    if let Err(retry_after) = limiter.check(auth.user_id) {
        tracing::warn!(
            user_id = %auth.user_id,
            request_id = %get_request_id(req.extensions()),
            retry_after,
            "Invite rate limit exceeded"
        );
        return rate_limited_response(limiter.limit_per_minute(), retry_after);
    }

    next.run(req).await
}

fn rate_limited_response(limit: u32, retry_after: u64) -> Response {
    let body = json!({
        "error": "rate_limited",
        "message": format!("Rate limit of {} requests/minute exceeded", limit),
        "retry_after": retry_after
    });

    let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
    response
        .headers_mut()
        .insert(header::RETRY_AFTER, HeaderValue::from(retry_after));
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limiter_allows_requests() {
        let state = RateLimiterState::new(100);
        assert!(state.check(Uuid::new_v4()).is_ok());
    }

    #[test]
    fn test_rate_limiter_exhaustion() {
        let state = RateLimiterState::new(1);
        let user = Uuid::new_v4();

        assert!(state.check(user).is_ok());
        let result = state.check(user);
        assert!(result.is_err());
        assert!(result.unwrap_err() >= 1);
    }

    #[test]
    fn test_rate_limiter_users_independent() {
        let state = RateLimiterState::new(1);
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        assert!(state.check(alice).is_ok());
        assert!(state.check(bob).is_ok());
        assert!(state.check(alice).is_err());
        assert!(state.check(bob).is_err());
    }

    #[test]
    fn test_rate_limiter_same_user_multiple_checks() {
        let state = RateLimiterState::new(5);
        let user = Uuid::new_v4();

        for i in 0..5 {
            assert!(state.check(user).is_ok(), "Request {} should be allowed", i);
        }
        assert!(state.check(user).is_err());
    }

    #[test]
    fn test_zero_limit_uses_fallback() {
        let state = RateLimiterState::new(0);
        assert!(state.check(Uuid::new_v4()).is_ok());
    }

    #[test]
    fn test_idle_buckets_are_pruned() {
        // 60_000/min refills a cell every millisecond.
        let state = RateLimiterState::new(60_000);
        for _ in 0..3 {
            state.check(Uuid::new_v4()).unwrap();
        }
        assert_eq!(state.active_users(), 3);

        std::thread::sleep(std::time::Duration::from_millis(50));
        state.prune();
        assert_eq!(state.active_users(), 0);
    }

    #[test]
    fn test_prune_keeps_limited_users() {
        let state = RateLimiterState::new(1);
        let user = Uuid::new_v4();
        state.check(user).unwrap();

        state.prune();
        assert_eq!(state.active_users(), 1);
        assert!(state.check(user).is_err());
    }

    #[test]
    fn test_rate_limiter_state_debug() {
        let state = RateLimiterState::new(100);
        state.check(Uuid::new_v4()).unwrap();
        let debug = format!("{:?}", state);
        assert!(debug.contains("rate_limit_per_minute"));
        assert!(debug.contains("active_limiters"));
    }

    #[test]
    fn test_rate_limited_response_format() {
        let response = rate_limited_response(30, 60);
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers().get(header::RETRY_AFTER).unwrap(), "60");
    }
}
