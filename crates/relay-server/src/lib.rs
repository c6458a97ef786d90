//! checkout-relay HTTP surface
//!
//! Router construction lives here so integration tests can drive the
//! service without binding a socket.

pub mod handlers;
pub mod state;

use axum::Router;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use crate::handlers::{create_checkout, health_check, not_found, stripe_webhook};
pub use crate::state::AppState;

/// Build the application router.
///
/// Anything outside the two API routes (including wrong methods on them)
/// is a 404: the contract has no 405s, so the method routers fall back to
/// `not_found` as well.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check).fallback(not_found))
        .route("/api/checkout", get(create_checkout).fallback(not_found))
        .route("/api/webhook", post(stripe_webhook).fallback(not_found))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
