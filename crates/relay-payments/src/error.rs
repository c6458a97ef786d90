//! Payment Error Types

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, PaymentError>;

/// Payment-related errors
#[derive(Error, Debug)]
pub enum PaymentError {
    /// Configuration error (missing or malformed environment)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Stripe rejected the request (invalid price, bad credentials, ...)
    #[error("Stripe error: {0}")]
    Stripe(String),

    /// Transport-level failure talking to Stripe
    #[error("Stripe request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Webhook signature verification failed
    #[error("Webhook signature invalid: {0}")]
    SignatureInvalid(String),

    /// Webhook payload could not be decoded after verification
    #[error("Webhook parse error: {0}")]
    WebhookParse(String),

    /// Downstream provisioning failed
    #[error("Provisioning error: {0}")]
    Provision(String),
}
