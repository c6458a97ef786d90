//! checkout-relay server
//!
//! Stateless axum front end: redirects browsers to Stripe-hosted checkout
//! for a subscription tier and receives Stripe webhook callbacks.

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use relay_payments::RelayConfig;
use relay_server::{AppState, app};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment
    dotenvy::dotenv().ok();

    // Fail fast: no request is served with incomplete Stripe configuration.
    let config = RelayConfig::from_env().context("billing configuration is incomplete")?;
    tracing::info!("✓ Stripe configured ({} tiers)", config.price_ids.len());

    let state = AppState::new(config);
    let router = app(state);

    // Start server
    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("🚀 checkout-relay running on http://{}", addr);
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health       - Health check");
    tracing::info!("  GET  /api/checkout - Redirect to hosted checkout (?tier=basic|pro|enterprise)");
    tracing::info!("  POST /api/webhook  - Stripe webhook callbacks");

    axum::serve(listener, router).await?;

    Ok(())
}
