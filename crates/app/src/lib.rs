//! HTTP surface for the daily lessons tracker.

#![forbid(unsafe_code)]

pub mod config;
pub mod response;
pub mod routes;
pub mod state;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use state::AppState;

/// Router with tracing and CORS layers applied.
pub fn app(state: AppState) -> Router {
    routes::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
