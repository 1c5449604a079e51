//! Self-hosted, write-once JSON blob store for short share links.
//!
//! Speaks the same protocol as jsonblob.com so the share client can point at
//! either one.

mod handlers;
pub mod middleware;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::db::Database;
use middleware::RateLimiter;

/// Largest accepted blob. A tree of a few dozen worries is well under this.
pub const MAX_BLOB_BYTES: usize = 64 * 1024;

pub fn create_router(db: Database) -> Router {
    create_router_with_limit(db, None)
}

/// Build the router, optionally rate limiting blob creation per client.
pub fn create_router_with_limit(db: Database, rate_limiter: Option<RateLimiter>) -> Router {
    let mut writes = Router::new().route("/jsonBlob", post(handlers::create_blob));
    if let Some(limiter) = rate_limiter {
        writes = writes.layer(axum::middleware::from_fn_with_state(
            limiter,
            middleware::rate_limit_middleware,
        ));
    }

    let api = writes.route("/jsonBlob/{id}", get(handlers::get_blob));

    Router::new()
        .nest("/api", api)
        .route("/health", get(handlers::health))
        .layer(DefaultBodyLimit::max(MAX_BLOB_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(db)
}
