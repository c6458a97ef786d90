//! Provisioning Seam
//!
//! What happens after a paid checkout lives outside this service: an API
//! key is issued and the customer is notified by systems of their own.
//! The relay's only obligation is to hand over the verified
//! (email, tier) pair.

use async_trait::async_trait;

use crate::error::Result;
use crate::tier::Tier;

/// Downstream collaborator invoked when a checkout completes.
#[async_trait]
pub trait Provisioner: Send + Sync {
    /// Provision a subscriber at the given tier.
    async fn provision(&self, customer_email: &str, tier: Tier) -> Result<()>;
}

/// Log-only provisioner; the handoff to key issuance is not wired up yet.
pub struct LogProvisioner;

#[async_trait]
impl Provisioner for LogProvisioner {
    async fn provision(&self, customer_email: &str, tier: Tier) -> Result<()> {
        tracing::info!(
            email = %customer_email,
            tier = %tier,
            "Subscriber ready for provisioning (key issuance handled downstream)"
        );
        Ok(())
    }
}
