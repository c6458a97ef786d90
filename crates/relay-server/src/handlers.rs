//! HTTP Handlers

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use relay_payments::{Tier, WebhookDispatcher, parse_event, verify_signature};

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct CheckoutParams {
    #[serde(default)]
    pub tier: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Catch-all for unmatched paths and methods
pub async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}

/// `GET /api/checkout?tier=<basic|pro|enterprise>`
///
/// Validates the tier selector, creates a hosted checkout session and
/// redirects the browser to it.
pub async fn create_checkout(
    State(state): State<AppState>,
    Query(params): Query<CheckoutParams>,
) -> Result<Response, (StatusCode, Json<ErrorResponse>)> {
    let invalid_tier = || {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "Invalid tier".into(),
            }),
        )
    };

    // Reject unknown selectors before any call to Stripe.
    let tier = params
        .tier
        .as_deref()
        .unwrap_or_default()
        .parse::<Tier>()
        .map_err(|_| invalid_tier())?;
    let price_id = state.config.price_id(tier).ok_or_else(invalid_tier)?;

    let session = state
        .stripe
        .create_checkout_session(
            tier,
            price_id,
            &state.config.success_url,
            &state.config.cancel_url,
        )
        .await
        .map_err(|e| {
            tracing::error!(tier = %tier, error = %e, "Checkout session creation failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
        })?;

    tracing::info!(tier = %tier, session_id = %session.id, "Redirecting to hosted checkout");

    Ok((StatusCode::FOUND, [(header::LOCATION, session.url)]).into_response())
}

/// `POST /api/webhook`
///
/// Verifies the `Stripe-Signature` header against the raw body bytes,
/// decodes the event and dispatches it. Responses carry no body:
/// 400 for anything that fails verification, 500 for decode failures
/// after a valid signature, 200 once dispatched.
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    let Some(signature) = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok())
    else {
        tracing::warn!("Missing Stripe-Signature header");
        return StatusCode::BAD_REQUEST;
    };

    if let Err(e) = verify_signature(&body, signature, &state.config.webhook_secret) {
        tracing::warn!(error = %e, "Webhook signature verification failed");
        return StatusCode::BAD_REQUEST;
    }

    // Past this point the sender is authenticated; failures are ours.
    let event = match parse_event(&body) {
        Ok(event) => event,
        Err(e) => {
            tracing::error!(error = %e, "Failed to decode verified webhook payload");
            return StatusCode::INTERNAL_SERVER_ERROR;
        }
    };

    let dispatcher = WebhookDispatcher::new(state.provisioner.clone());
    if let Err(e) = dispatcher.dispatch(event).await {
        // Still 200: a non-200 here would switch on Stripe's redelivery,
        // and those semantics haven't been agreed with the downstream
        // owners. Surfaced in logs instead.
        tracing::warn!(error = %e, "Downstream provisioning failed");
    }

    StatusCode::OK
}
