//! Subscription tiers

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Subscription tier selectable at checkout
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Basic,
    Pro,
    Enterprise,
}

impl Tier {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Pro => "pro",
            Self::Enterprise => "enterprise",
        }
    }

    /// All tiers, in ascending order
    pub const ALL: [Self; 3] = [Self::Basic, Self::Pro, Self::Enterprise];
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Tier {
    type Err = InvalidTier;

    // Exact lowercase tokens only: the selector must match a key of the
    // configured price mapping, nothing looser.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "basic" => Ok(Self::Basic),
            "pro" => Ok(Self::Pro),
            "enterprise" => Ok(Self::Enterprise),
            other => Err(InvalidTier(other.to_string())),
        }
    }
}

/// Error parsing a tier selector
#[derive(Clone, Debug, Error)]
#[error("invalid tier: {0:?}")]
pub struct InvalidTier(pub String);
