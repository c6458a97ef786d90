//! Stripe Checkout Integration
//!
//! Creates hosted checkout sessions by calling the Stripe REST API
//! directly. One outbound request per checkout, no retries: session
//! creation is not idempotent-safe to replay blindly.

use serde::Deserialize;

use crate::error::{PaymentError, Result};
use crate::tier::Tier;

const DEFAULT_API_BASE: &str = "https://api.stripe.com";

/// Placeholder Stripe substitutes with the session id on redirect back.
const SESSION_ID_PLACEHOLDER: &str = "{CHECKOUT_SESSION_ID}";

/// Stripe API client
pub struct StripeClient {
    http: reqwest::Client,
    secret_key: String,
    api_base: String,
}

impl StripeClient {
    /// Create a new Stripe client
    pub fn new(secret_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            secret_key: secret_key.into(),
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }

    /// Point the client at a different API base (tests, proxies)
    #[must_use]
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Create a hosted checkout session for a subscription tier.
    ///
    /// Returns the session to redirect the customer to. The chosen tier is
    /// recorded in session metadata so the completed-checkout webhook can
    /// correlate it back.
    pub async fn create_checkout_session(
        &self,
        tier: Tier,
        price_id: &str,
        success_url: &str,
        cancel_url: &str,
    ) -> Result<CheckoutSession> {
        let success_url = success_url_template(success_url);
        let form = [
            ("payment_method_types[0]", "card"),
            ("line_items[0][price]", price_id),
            ("line_items[0][quantity]", "1"),
            ("mode", "subscription"),
            ("success_url", success_url.as_str()),
            ("cancel_url", cancel_url),
            ("metadata[tier]", tier.as_str()),
        ];

        let response = self
            .http
            .post(format!("{}/v1/checkout/sessions", self.api_base))
            .bearer_auth(&self.secret_key)
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PaymentError::Stripe(stripe_error_message(status, &body)));
        }

        let session: SessionResponse = response.json().await?;
        let url = session
            .url
            .ok_or_else(|| PaymentError::Stripe("no checkout URL returned".into()))?;

        Ok(CheckoutSession {
            id: session.id,
            url,
            tier,
        })
    }
}

/// Result of creating a checkout session
#[derive(Clone, Debug)]
pub struct CheckoutSession {
    /// Stripe session ID
    pub id: String,

    /// Hosted checkout URL to redirect the customer to
    pub url: String,

    /// Tier being purchased
    pub tier: Tier,
}

#[derive(Deserialize)]
struct SessionResponse {
    id: String,
    url: Option<String>,
}

#[derive(Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Deserialize)]
struct StripeErrorDetail {
    message: Option<String>,
}

/// Ensure the success URL carries the session-id placeholder.
fn success_url_template(base: &str) -> String {
    if base.contains(SESSION_ID_PLACEHOLDER) {
        base.to_string()
    } else if base.contains('?') {
        format!("{base}&session_id={SESSION_ID_PLACEHOLDER}")
    } else {
        format!("{base}?session_id={SESSION_ID_PLACEHOLDER}")
    }
}

/// Pull the human-readable message out of a Stripe error body.
fn stripe_error_message(status: reqwest::StatusCode, body: &str) -> String {
    serde_json::from_str::<StripeErrorBody>(body)
        .ok()
        .and_then(|b| b.error.message)
        .unwrap_or_else(|| format!("checkout session create failed with status {status}"))
}
