//! HTTP API for event registration.

mod handlers;
mod middleware;
mod types;

pub use handlers::*;
pub use middleware::{
    logging_middleware, rate_limit_middleware, RateLimitState, DEFAULT_PER_MINUTE,
};
pub use types::*;

use crate::config::Config;
use crate::notifier::Notifier;
use crate::recorder::Recorder;
use anyhow::{Context, Result};
use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::path::Path;
use std::sync::Arc;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::info;

/// Shared application state.
///
/// Either collaborator may be absent when its secret is not configured; the
/// submission handler then fails at the step that needs it.
#[derive(Clone)]
pub struct AppState {
    pub recorder: Option<Arc<Recorder>>,
    pub notifier: Option<Arc<Notifier>>,
}

impl AppState {
    pub fn new(recorder: Option<Recorder>, notifier: Option<Notifier>) -> Self {
        Self {
            recorder: recorder.map(Arc::new),
            notifier: notifier.map(Arc::new),
        }
    }

    /// Build both collaborators from configuration.
    ///
    /// Missing secrets are tolerated. A connection string or API key that is
    /// present but unusable is an error.
    pub fn from_config(config: &Config) -> Result<Self> {
        let recorder =
            Recorder::from_config(&config.storage).context("Invalid storage configuration")?;
        let notifier =
            Notifier::from_config(&config.email).context("Invalid email configuration")?;
        Ok(Self::new(recorder, notifier))
    }
}

/// Largest submission body accepted, in bytes.
pub const MAX_BODY_BYTES: usize = 64 * 1024;

/// Create the API router with the default rate limit.
pub fn create_router(state: AppState) -> Router {
    create_router_with_rate_limit(state, RateLimitState::new(DEFAULT_PER_MINUTE))
}

/// Create the API router with custom rate limiting.
pub fn create_router_with_rate_limit(state: AppState, rate_limit: RateLimitState) -> Router {
    // Only submissions count against the quota
    let submit = Router::new()
        .route(
            "/api/submit",
            post(handlers::submit).fallback(handlers::method_not_allowed),
        )
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .route_layer(axum_middleware::from_fn_with_state(
            rate_limit,
            rate_limit_middleware,
        ));

    Router::new()
        .route("/health", get(handlers::health))
        .merge(submit)
        .layer(axum_middleware::from_fn(logging_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the registration form from `dir` for every path the API does not claim.
pub fn serve_static(router: Router, dir: impl AsRef<Path>) -> Router {
    let dir = dir.as_ref();
    info!(dir = %dir.display(), "Serving static files");
    router.fallback_service(ServeDir::new(dir))
}
