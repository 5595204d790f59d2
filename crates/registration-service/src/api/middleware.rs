//! Submission throttling and request logging.
//!
//! The form endpoint is anonymous, so a single process-wide quota caps how
//! fast the shared CSV record and the operations mailbox can be hit.

use crate::error::ServiceError;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use std::{num::NonZeroU32, sync::Arc, time::Instant};
use tracing::{debug, info, warn};

/// Submissions per minute when `rate_limit.per_minute` is zero or unset.
pub const DEFAULT_PER_MINUTE: u32 = 30;

/// One quota shared by every client of the submission route.
pub type GlobalLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Submission quota shared across requests.
#[derive(Clone)]
pub struct RateLimitState {
    pub global: Arc<GlobalLimiter>,
}

impl RateLimitState {
    /// Admit `requests_per_minute` submissions; zero falls back to [`DEFAULT_PER_MINUTE`].
    pub fn new(requests_per_minute: u32) -> Self {
        let per_minute = NonZeroU32::new(requests_per_minute)
            .or(NonZeroU32::new(DEFAULT_PER_MINUTE))
            .unwrap_or(NonZeroU32::MIN);

        Self {
            global: Arc::new(RateLimiter::direct(Quota::per_minute(per_minute))),
        }
    }

    /// Quota high enough that tests never hit it.
    pub fn permissive() -> Self {
        Self::new(10_000)
    }
}

/// Turn away submissions with `RATE_LIMIT_EXCEEDED` once the quota is spent.
///
/// Rejected requests never reach validation, storage or email.
pub async fn rate_limit_middleware(
    State(rate_limit): State<RateLimitState>,
    request: Request,
    next: Next,
) -> Result<Response, ServiceError> {
    if rate_limit.global.check().is_err() {
        warn!(method = %request.method(), "Submission rate limit exceeded");
        return Err(ServiceError::RateLimitExceeded);
    }

    Ok(next.run(request).await)
}

/// Log method, URI, status and latency; failures are logged at `warn`.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    debug!(%method, %uri, "Request started");

    let response = next.run(request).await;

    let duration = start.elapsed();
    let status = response.status();

    if status.is_success() {
        info!(%method, %uri, %status, ?duration, "Request completed");
    } else {
        warn!(%method, %uri, %status, ?duration, "Request failed");
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limit_exhaustion() {
        let state = RateLimitState::new(2);

        assert!(state.global.check().is_ok());
        assert!(state.global.check().is_ok());
        assert!(state.global.check().is_err());
    }

    #[test]
    fn test_zero_limit_uses_default() {
        let state = RateLimitState::new(0);
        for _ in 0..DEFAULT_PER_MINUTE {
            assert!(state.global.check().is_ok());
        }
        assert!(state.global.check().is_err());
    }

    #[test]
    fn test_permissive_rate_limit() {
        let state = RateLimitState::permissive();
        for _ in 0..100 {
            assert!(state.global.check().is_ok());
        }
    }
}
