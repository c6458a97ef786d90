//! Application State

use std::sync::Arc;

use relay_payments::{LogProvisioner, Provisioner, RelayConfig, StripeClient};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Validated startup configuration
    pub config: Arc<RelayConfig>,

    /// Stripe API client
    pub stripe: Arc<StripeClient>,

    /// Collaborator invoked on completed checkouts
    pub provisioner: Arc<dyn Provisioner>,
}

impl AppState {
    /// Build production state from a validated config.
    pub fn new(config: RelayConfig) -> Self {
        let stripe = Arc::new(StripeClient::new(&config.secret_key));
        Self {
            config: Arc::new(config),
            stripe,
            provisioner: Arc::new(LogProvisioner),
        }
    }
}
