//! Stripe Webhook Handling
//!
//! Signature verification and event dispatch for inbound Stripe callbacks.
//!
//! Verification runs over the raw request bytes. Signatures are computed
//! by Stripe over the exact payload it sent, so any re-serialization
//! before verifying would break byte-for-byte equality.

use std::sync::Arc;

use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::error::{PaymentError, Result};
use crate::provision::Provisioner;
use crate::tier::Tier;

type HmacSha256 = Hmac<Sha256>;

/// Maximum accepted age of a signature timestamp (Stripe's default).
const SIGNATURE_TOLERANCE_SECS: i64 = 300;

/// Verify a `Stripe-Signature` header against the raw request body.
///
/// Header format: `t=<unix-ts>,v1=<hex-hmac>[,v1=<hex-hmac>...]`. The
/// signed payload is `"<ts>.<body>"`, keyed with the webhook signing
/// secret. Every `v1` candidate is tried; digests are compared in constant
/// time.
pub fn verify_signature(payload: &[u8], signature_header: &str, secret: &str) -> Result<()> {
    let mut timestamp = None;
    let mut candidates = Vec::new();

    for part in signature_header.split(',') {
        let mut kv = part.trim().splitn(2, '=');
        match (kv.next(), kv.next()) {
            (Some("t"), Some(value)) => timestamp = Some(value),
            (Some("v1"), Some(value)) => candidates.push(value),
            _ => {}
        }
    }

    let timestamp = timestamp
        .ok_or_else(|| PaymentError::SignatureInvalid("missing timestamp".into()))?;
    if candidates.is_empty() {
        return Err(PaymentError::SignatureInvalid("missing v1 signature".into()));
    }

    let ts: i64 = timestamp
        .parse()
        .map_err(|_| PaymentError::SignatureInvalid("malformed timestamp".into()))?;
    if (Utc::now().timestamp() - ts).abs() > SIGNATURE_TOLERANCE_SECS {
        return Err(PaymentError::SignatureInvalid(
            "timestamp outside tolerance".into(),
        ));
    }

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| PaymentError::SignatureInvalid("invalid signing secret".into()))?;
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(payload);
    let expected = hex::encode(mac.finalize().into_bytes());

    for candidate in candidates {
        if bool::from(expected.as_bytes().ct_eq(candidate.as_bytes())) {
            return Ok(());
        }
    }

    Err(PaymentError::SignatureInvalid(
        "no matching v1 signature".into(),
    ))
}

/// Decoded webhook event
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WebhookEvent {
    /// Checkout completed - provision the subscriber
    CheckoutCompleted {
        customer_email: String,
        tier: Tier,
    },

    /// Recurring payment failed - reserved for dunning/suspension
    InvoicePaymentFailed {
        customer_email: Option<String>,
    },

    /// Subscription cancelled
    SubscriptionDeleted {
        subscription_id: String,
    },

    /// Unhandled event type
    Other {
        event_type: String,
    },
}

#[derive(Deserialize)]
struct Envelope {
    id: Option<String>,
    #[serde(rename = "type")]
    event_type: String,
    data: EnvelopeData,
}

#[derive(Deserialize)]
struct EnvelopeData {
    object: serde_json::Value,
}

/// Decode a verified payload into a [`WebhookEvent`].
///
/// Call only after [`verify_signature`] has accepted the payload.
pub fn parse_event(payload: &[u8]) -> Result<WebhookEvent> {
    let envelope: Envelope = serde_json::from_slice(payload)
        .map_err(|e| PaymentError::WebhookParse(format!("malformed event envelope: {e}")))?;

    let object = &envelope.data.object;
    let event = match envelope.event_type.as_str() {
        "checkout.session.completed" => {
            // Stripe fills customer_email or customer_details.email
            // depending on how the session was created.
            let customer_email = object
                .get("customer_email")
                .and_then(serde_json::Value::as_str)
                .or_else(|| {
                    object
                        .pointer("/customer_details/email")
                        .and_then(serde_json::Value::as_str)
                })
                .ok_or_else(|| {
                    PaymentError::WebhookParse("completed session has no customer email".into())
                })?;

            let tier = object
                .pointer("/metadata/tier")
                .and_then(serde_json::Value::as_str)
                .ok_or_else(|| {
                    PaymentError::WebhookParse("completed session has no tier metadata".into())
                })?
                .parse::<Tier>()
                .map_err(|e| PaymentError::WebhookParse(e.to_string()))?;

            WebhookEvent::CheckoutCompleted {
                customer_email: customer_email.to_string(),
                tier,
            }
        }

        "invoice.payment_failed" => WebhookEvent::InvoicePaymentFailed {
            customer_email: object
                .get("customer_email")
                .and_then(serde_json::Value::as_str)
                .map(str::to_string),
        },

        "customer.subscription.deleted" => WebhookEvent::SubscriptionDeleted {
            subscription_id: object
                .get("id")
                .and_then(serde_json::Value::as_str)
                .unwrap_or_default()
                .to_string(),
        },

        other => WebhookEvent::Other {
            event_type: other.to_string(),
        },
    };

    tracing::debug!(
        event_id = envelope.id.as_deref().unwrap_or("<none>"),
        event_type = %envelope.event_type,
        "Decoded Stripe webhook"
    );

    Ok(event)
}

/// Routes decoded events to the downstream collaborators
pub struct WebhookDispatcher {
    provisioner: Arc<dyn Provisioner>,
}

impl WebhookDispatcher {
    pub fn new(provisioner: Arc<dyn Provisioner>) -> Self {
        Self { provisioner }
    }

    /// Act on a decoded event.
    pub async fn dispatch(&self, event: WebhookEvent) -> Result<()> {
        match event {
            WebhookEvent::CheckoutCompleted {
                customer_email,
                tier,
            } => {
                tracing::info!(
                    email = %customer_email,
                    tier = %tier,
                    "New subscription checkout completed"
                );
                self.provisioner.provision(&customer_email, tier).await?;
            }

            WebhookEvent::InvoicePaymentFailed { customer_email } => {
                tracing::warn!(
                    email = ?customer_email,
                    "Invoice payment failed - dunning not implemented"
                );
            }

            WebhookEvent::SubscriptionDeleted { subscription_id } => {
                tracing::info!(
                    subscription_id = %subscription_id,
                    "Subscription cancelled"
                );
            }

            WebhookEvent::Other { event_type } => {
                tracing::debug!(event_type = %event_type, "Ignoring webhook event");
            }
        }

        Ok(())
    }
}
