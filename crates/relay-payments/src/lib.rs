//! # relay-payments
//!
//! Stripe integration for checkout-relay: hosted checkout sessions and
//! signed webhook callbacks.
//!
//! ## Checkout flow (Stripe Hosted)
//!
//! ```text
//! browser ──GET /api/checkout?tier=pro──▶ relay ──create session──▶ Stripe
//!                                          │
//!                                          └──302 Location: checkout URL──▶ browser
//! ```
//!
//! The relay keeps no state: Stripe owns the session, and the chosen tier
//! rides along in session metadata so the webhook can correlate the
//! completed checkout back to a tier.
//!
//! ## Webhook flow
//!
//! Stripe pushes signed events to `POST /api/webhook`. Verification runs
//! over the raw body bytes before anything is parsed; verified events are
//! decoded into [`WebhookEvent`] and dispatched to a [`Provisioner`].
//!
//! ## Usage
//!
//! ```rust,ignore
//! use relay_payments::{RelayConfig, StripeClient, Tier};
//!
//! let config = RelayConfig::from_env()?;
//! let client = StripeClient::new(&config.secret_key);
//!
//! let session = client
//!     .create_checkout_session(
//!         Tier::Pro,
//!         config.price_id(Tier::Pro).unwrap(),
//!         &config.success_url,
//!         &config.cancel_url,
//!     )
//!     .await?;
//!
//! // Redirect user to: session.url
//! ```

mod checkout;
mod config;
mod error;
mod provision;
mod tier;
mod webhook;

pub use checkout::{CheckoutSession, StripeClient};
pub use config::RelayConfig;
pub use error::{PaymentError, Result};
pub use provision::{LogProvisioner, Provisioner};
pub use tier::{InvalidTier, Tier};
pub use webhook::{WebhookDispatcher, WebhookEvent, parse_event, verify_signature};
