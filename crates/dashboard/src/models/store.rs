//! Installed store domain types.

use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use slaash_core::{DealListPosition, DiscountCategory, StoreId};

/// Longest popup delay a merchant may configure.
pub const MAX_DEAL_LIST_DELAY_SECONDS: i32 = 120;

/// A Shopify store that installed the app.
#[derive(Debug, Clone)]
pub struct Store {
    pub id: StoreId,
    pub name: String,
    /// Shop domain, e.g. `acme.myshopify.com`.
    pub url: String,
    /// Offline Admin API token obtained during install.
    pub api_token: Option<SecretString>,
    /// ISO 4217 currency code of the shop.
    pub currency: String,
    pub deal_list: DealListSettings,
    /// Campaigns scheduled after this instant are skipped.
    pub campaign_turn_off_at: Option<DateTime<Utc>>,
    pub default_discount: Option<i32>,
    pub discount_category: DiscountCategory,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Storefront deal-list popup settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DealListSettings {
    pub active: bool,
    pub title: String,
    pub body: String,
    pub delay_seconds: i32,
    pub position: DealListPosition,
}

impl Default for DealListSettings {
    fn default() -> Self {
        Self {
            active: true,
            title: "Deals picked for you".to_string(),
            body: String::new(),
            delay_seconds: 5,
            position: DealListPosition::default(),
        }
    }
}

impl DealListSettings {
    /// Check the merchant-editable bounds.
    ///
    /// # Errors
    ///
    /// Returns a human readable reason when a field is out of range.
    pub fn validate(&self) -> Result<(), String> {
        if !(0..=MAX_DEAL_LIST_DELAY_SECONDS).contains(&self.delay_seconds) {
            return Err(format!(
                "delay_seconds must be between 0 and {MAX_DEAL_LIST_DELAY_SECONDS}"
            ));
        }
        if self.title.trim().is_empty() {
            return Err("title cannot be empty".to_string());
        }
        Ok(())
    }

    /// Render the storefront config script pushed to the theme.
    #[must_use]
    pub fn to_script(&self) -> String {
        let config = serde_json::json!({
            "active": self.active,
            "title": self.title,
            "body": self.body,
            "delaySeconds": self.delay_seconds,
            "position": self.position.as_str(),
        });
        format!("window.SlaashConfig = {config};\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deal_list_validate_delay_bounds() {
        let mut settings = DealListSettings::default();
        assert!(settings.validate().is_ok());
        settings.delay_seconds = 120;
        assert!(settings.validate().is_ok());
        settings.delay_seconds = 121;
        assert!(settings.validate().is_err());
        settings.delay_seconds = -1;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_deal_list_validate_title() {
        let settings = DealListSettings {
            title: "  ".to_string(),
            ..DealListSettings::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_deal_list_script() {
        let settings = DealListSettings {
            active: false,
            title: "Hi \"there\"".to_string(),
            body: String::new(),
            delay_seconds: 10,
            position: DealListPosition::TopLeft,
        };
        let script = settings.to_script();
        assert!(script.starts_with("window.SlaashConfig = {"));
        assert!(script.contains("\"position\":\"top-left\""));
        assert!(script.contains("\"delaySeconds\":10"));
        assert!(script.contains(r#"Hi \"there\""#));
        assert!(script.trim_end().ends_with("};"));
    }
}
