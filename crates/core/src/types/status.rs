//! Status and option enums for dashboard entities.

use serde::{Deserialize, Serialize};

/// Dashboard access level of a user (`users.accesslevel`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[repr(i32)]
#[serde(rename_all = "snake_case")]
pub enum AccessLevel {
    /// Store owner, created by the Shopify OAuth install.
    #[default]
    Owner = 1,
    /// Staff member invited by the owner.
    Staff = 2,
    /// Slaash operator with access to every store.
    Admin = 3,
}

impl std::fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Owner => write!(f, "owner"),
            Self::Staff => write!(f, "staff"),
            Self::Admin => write!(f, "admin"),
        }
    }
}

impl std::str::FromStr for AccessLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "owner" => Ok(Self::Owner),
            "staff" => Ok(Self::Staff),
            "admin" => Ok(Self::Admin),
            _ => Err(format!("invalid access level: {s}")),
        }
    }
}

/// Campaign activity flag (`campaign.activestatus`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[repr(i32)]
pub enum CampaignStatus {
    Inactive = 0,
    Active = 1,
}

/// How the store's default deal discount is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DiscountCategory {
    #[default]
    Percentage,
    FixedAmount,
}

impl DiscountCategory {
    /// The Shopify price rule `value_type` for this category.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Percentage => "percentage",
            Self::FixedAmount => "fixed_amount",
        }
    }

    /// Check a default discount value against the category's bounds.
    ///
    /// Percentages must be in `1..=100`; fixed amounts must be positive.
    #[must_use]
    pub const fn accepts(&self, value: i32) -> bool {
        match self {
            Self::Percentage => matches!(value, 1..=100),
            Self::FixedAmount => value >= 1,
        }
    }
}

impl std::fmt::Display for DiscountCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DiscountCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "percentage" => Ok(Self::Percentage),
            "fixed_amount" => Ok(Self::FixedAmount),
            _ => Err(format!("invalid discount category: {s}")),
        }
    }
}

/// Where the deal-list popup is anchored on the storefront.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum DealListPosition {
    #[default]
    BottomRight,
    BottomLeft,
    TopRight,
    TopLeft,
    Center,
}

impl DealListPosition {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::BottomRight => "bottom-right",
            Self::BottomLeft => "bottom-left",
            Self::TopRight => "top-right",
            Self::TopLeft => "top-left",
            Self::Center => "center",
        }
    }
}

impl std::fmt::Display for DealListPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DealListPosition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bottom-right" => Ok(Self::BottomRight),
            "bottom-left" => Ok(Self::BottomLeft),
            "top-right" => Ok(Self::TopRight),
            "top-left" => Ok(Self::TopLeft),
            "center" => Ok(Self::Center),
            _ => Err(format!("invalid deal list position: {s}")),
        }
    }
}
