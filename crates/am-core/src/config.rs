//! Engine configuration
//!
//! Everything storefront-specific lives here so another marketplace can be
//! targeted from JSON without code changes. All structs use
//! `#[serde(default)]`, so a partial document overrides only what it names.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::rules::{CompiledRules, RuleError, RuleTable};

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid rule table: {0}")]
    Rules(#[from] RuleError),
}

// =============================================================================
// Marketplace
// =============================================================================

/// A static destination in the quick-links row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuickLink {
    pub title: String,
    pub path: String,
}

impl QuickLink {
    fn new(title: &str, path: &str) -> Self {
        Self {
            title: title.to_string(),
            path: path.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Marketplace {
    /// Bare domain; `www.` + domain is accepted too
    pub domain: String,
    /// Path the storefront logo redirects through
    pub nav_logo_path: String,
    /// Search route, also the replacement form action
    pub search_path: String,
    /// Query parameter name the search route expects
    pub query_param: String,
    pub search_placeholder: String,
    pub quick_links: Vec<QuickLink>,
}

impl Default for Marketplace {
    fn default() -> Self {
        Self {
            domain: "amazon.co.uk".to_string(),
            nav_logo_path: "/ref=nav_logo".to_string(),
            search_path: "/s".to_string(),
            query_param: "k".to_string(),
            search_placeholder: "Search Amazon".to_string(),
            quick_links: vec![
                QuickLink::new("Order History", "/gp/css/order-history"),
                QuickLink::new("Buy Again", "/buyagain"),
                QuickLink::new("Wish List", "/hz/wishlist/ls"),
            ],
        }
    }
}

impl Marketplace {
    /// Absolute URL on the `www.` host.
    pub fn absolute_url(&self, path: &str) -> String {
        format!("https://www.{}{}", self.domain, path)
    }
}

// =============================================================================
// Timings
// =============================================================================

/// Fixed delays, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timings {
    /// Retry interval while waiting for the first product entry
    pub product_poll_ms: u32,
    /// Delay before inserting the control panel
    pub panel_settle_ms: u32,
    /// Quiet period that coalesces scroll bursts
    pub scroll_debounce_ms: u32,
    /// Delay before re-running the replacer on an external request
    pub reapply_delay_ms: u32,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            product_poll_ms: 500,
            panel_settle_ms: 1500,
            scroll_debounce_ms: 300,
            reapply_delay_ms: 50,
        }
    }
}

impl Timings {
    pub fn product_poll(&self) -> Duration {
        Duration::from_millis(u64::from(self.product_poll_ms))
    }

    pub fn panel_settle(&self) -> Duration {
        Duration::from_millis(u64::from(self.panel_settle_ms))
    }

    pub fn scroll_debounce(&self) -> Duration {
        Duration::from_millis(u64::from(self.scroll_debounce_ms))
    }

    pub fn reapply_delay(&self) -> Duration {
        Duration::from_millis(u64::from(self.reapply_delay_ms))
    }
}

// =============================================================================
// Engine Config
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub marketplace: Marketplace,
    pub timings: Timings,
    pub rules: RuleTable,
}

impl EngineConfig {
    /// Parse and validate a JSON document.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.rules.compile()?;
        Ok(config)
    }

    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn compile_rules(&self) -> Result<CompiledRules, RuleError> {
        self.rules.compile()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_override() {
        let config = EngineConfig::from_json(
            r#"{ "marketplace": { "domain": "amazon.de" }, "timings": { "scroll_debounce_ms": 100 } }"#,
        )
        .unwrap();
        assert_eq!(config.marketplace.domain, "amazon.de");
        assert_eq!(config.marketplace.query_param, "k");
        assert_eq!(config.timings.scroll_debounce(), Duration::from_millis(100));
        assert_eq!(config.timings.product_poll_ms, 500);
        assert_eq!(config.rules, RuleTable::default());
    }

    #[test]
    fn test_default_round_trips_through_json() {
        let config = EngineConfig::default();
        let text = config.to_json_pretty().unwrap();
        assert_eq!(EngineConfig::from_json(&text).unwrap(), config);
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let err = EngineConfig::from_json(
            r#"{ "rules": { "rating_patterns": [ { "pattern": "(unclosed", "converter": "decimal" } ] } }"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Rules(RuleError::InvalidPattern { .. })));
    }

    #[test]
    fn test_absolute_url() {
        let m = Marketplace::default();
        assert_eq!(m.absolute_url("/buyagain"), "https://www.amazon.co.uk/buyagain");
    }
}
