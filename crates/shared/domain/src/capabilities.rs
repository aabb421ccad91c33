//! Subscription tiers, membership roles, and the capability bitset that ties
//! tiers to feature gates.

use crate::constants::{
    AB_TESTING, API_ACCESS, CUSTOM_DOMAINS, DEDICATED_SUPPORT, PREMIUM_BLOCKS, REMOVE_BRANDING,
    UNLIMITED_PAGES, VERSION_HISTORY,
};
use bitflags::bitflags;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

bitflags! {
    /// Represents a set of capabilities granted by a tier (or an explicit flag).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct Capabilities: u32 {
        const CUSTOM_DOMAINS = 1 << 0;
        const REMOVE_BRANDING = 1 << 1;
        const VERSION_HISTORY = 1 << 2;
        const PREMIUM_BLOCKS = 1 << 3;
        const AB_TESTING = 1 << 4;
        const API_ACCESS = 1 << 5;
        const UNLIMITED_PAGES = 1 << 6;
        const DEDICATED_SUPPORT = 1 << 7;

        const ALL = Self::CUSTOM_DOMAINS.bits()
            | Self::REMOVE_BRANDING.bits()
            | Self::VERSION_HISTORY.bits()
            | Self::PREMIUM_BLOCKS.bits()
            | Self::AB_TESTING.bits()
            | Self::API_ACCESS.bits()
            | Self::UNLIMITED_PAGES.bits()
            | Self::DEDICATED_SUPPORT.bits();
    }
}

impl From<&str> for Capabilities {
    fn from(s: &str) -> Self {
        match s {
            CUSTOM_DOMAINS => Self::CUSTOM_DOMAINS,
            REMOVE_BRANDING => Self::REMOVE_BRANDING,
            VERSION_HISTORY => Self::VERSION_HISTORY,
            PREMIUM_BLOCKS => Self::PREMIUM_BLOCKS,
            AB_TESTING => Self::AB_TESTING,
            API_ACCESS => Self::API_ACCESS,
            UNLIMITED_PAGES => Self::UNLIMITED_PAGES,
            DEDICATED_SUPPORT => Self::DEDICATED_SUPPORT,
            "all" | "*" => Self::ALL,
            _ => Self::empty(),
        }
    }
}

impl From<u32> for Capabilities {
    fn from(bits: u32) -> Self {
        Self::from_bits_truncate(bits)
    }
}

impl Serialize for Capabilities {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u32(self.bits())
    }
}

impl<'de> Deserialize<'de> for Capabilities {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bits = u32::deserialize(deserializer)?;
        Ok(Self::from_bits_retain(bits))
    }
}

/// Subscription tier ladder. Ordering is the ladder: `Free < Starter < Pro < Scale`.
#[derive(
    Default, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    #[default]
    Free,
    Starter,
    Pro,
    Scale,
}

impl Tier {
    /// Baseline capabilities granted by this tier. Explicit feature flags on a
    /// site override the baseline in both directions.
    pub fn capabilities(self) -> Capabilities {
        match self {
            Self::Free => Capabilities::empty(),
            Self::Starter => {
                Capabilities::CUSTOM_DOMAINS
                    | Capabilities::REMOVE_BRANDING
                    | Capabilities::VERSION_HISTORY
            }
            Self::Pro => {
                Self::Starter.capabilities()
                    | Capabilities::PREMIUM_BLOCKS
                    | Capabilities::AB_TESTING
                    | Capabilities::API_ACCESS
            }
            Self::Scale => Capabilities::ALL,
        }
    }

    /// Whether this tier sits at or above `required` on the ladder.
    pub fn meets(self, required: Self) -> bool {
        self >= required
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Starter => "starter",
            Self::Pro => "pro",
            Self::Scale => "scale",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Tier {
    fn from(s: &str) -> Self {
        match s {
            "starter" => Self::Starter,
            "pro" => Self::Pro,
            "scale" => Self::Scale,
            _ => Self::Free,
        }
    }
}

/// Membership role ladder. Ordering is the ladder: `Viewer < Editor < Admin < Owner`.
#[derive(
    Default, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Viewer,
    Editor,
    Admin,
    Owner,
}

impl Role {
    /// Whether this role sits at or above `required` on the ladder.
    pub fn meets(self, required: Self) -> bool {
        self >= required
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Viewer => "viewer",
            Self::Editor => "editor",
            Self::Admin => "admin",
            Self::Owner => "owner",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Role {
    fn from(s: &str) -> Self {
        match s {
            "editor" => Self::Editor,
            "admin" => Self::Admin,
            "owner" => Self::Owner,
            _ => Self::Viewer,
        }
    }
}
