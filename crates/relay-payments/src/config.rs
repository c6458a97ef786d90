//! Relay Configuration
//!
//! Everything the relay needs from its environment, read once at startup
//! and immutable afterwards. Startup fails if any value is missing or
//! malformed; no request is served with placeholder credentials.

use std::collections::HashMap;

use crate::error::{PaymentError, Result};
use crate::tier::Tier;

/// Relay configuration
#[derive(Clone, Debug)]
pub struct RelayConfig {
    /// Stripe secret key (`sk_...`)
    pub secret_key: String,

    /// Stripe webhook signing secret (`whsec_...`)
    pub webhook_secret: String,

    /// Tier → Stripe price ID mapping
    pub price_ids: HashMap<Tier, String>,

    /// Base URL the customer lands on after a completed checkout
    pub success_url: String,

    /// URL the customer lands on after abandoning checkout
    pub cancel_url: String,
}

impl RelayConfig {
    /// Read and validate configuration from environment variables.
    ///
    /// Required: `STRIPE_SECRET_KEY`, `STRIPE_WEBHOOK_SECRET`,
    /// `STRIPE_PRICE_ID_{BASIC,PRO,ENTERPRISE}`, `CHECKOUT_SUCCESS_URL`,
    /// `CHECKOUT_CANCEL_URL`.
    pub fn from_env() -> Result<Self> {
        let config = Self {
            secret_key: require_env("STRIPE_SECRET_KEY")?,
            webhook_secret: require_env("STRIPE_WEBHOOK_SECRET")?,
            price_ids: HashMap::from([
                (Tier::Basic, require_env("STRIPE_PRICE_ID_BASIC")?),
                (Tier::Pro, require_env("STRIPE_PRICE_ID_PRO")?),
                (Tier::Enterprise, require_env("STRIPE_PRICE_ID_ENTERPRISE")?),
            ]),
            success_url: require_env("CHECKOUT_SUCCESS_URL")?,
            cancel_url: require_env("CHECKOUT_CANCEL_URL")?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate shape of the configured values.
    pub fn validate(&self) -> Result<()> {
        if !self.secret_key.starts_with("sk_") {
            return Err(PaymentError::Config(
                "STRIPE_SECRET_KEY must start with sk_".into(),
            ));
        }
        if !self.webhook_secret.starts_with("whsec_") {
            return Err(PaymentError::Config(
                "STRIPE_WEBHOOK_SECRET must start with whsec_".into(),
            ));
        }
        for tier in Tier::ALL {
            match self.price_ids.get(&tier) {
                Some(id) if id.starts_with("price_") => {}
                Some(id) => {
                    return Err(PaymentError::Config(format!(
                        "price id for tier {tier} must start with price_ (got {id:?})"
                    )));
                }
                None => {
                    return Err(PaymentError::Config(format!(
                        "no price id configured for tier {tier}"
                    )));
                }
            }
        }
        for (name, url) in [
            ("CHECKOUT_SUCCESS_URL", &self.success_url),
            ("CHECKOUT_CANCEL_URL", &self.cancel_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(PaymentError::Config(format!("{name} must be an http(s) URL")));
            }
        }
        Ok(())
    }

    /// Price ID for a tier, if configured
    pub fn price_id(&self, tier: Tier) -> Option<&str> {
        self.price_ids.get(&tier).map(String::as_str)
    }
}

fn require_env(name: &str) -> Result<String> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| PaymentError::Config(format!("{name} not set")))
}
