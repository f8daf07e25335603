//! # Ledger Configuration
//!
//! Runtime settings, loaded from environment variables with fallback to
//! defaults.
//!
//! ## Environment Variables
//! | Variable                       | Default | Meaning                          |
//! |--------------------------------|---------|----------------------------------|
//! | `SHOPBOOK_CURRENCY_SYMBOL`     | `₦`     | Prefix for formatted amounts     |
//! | `SHOPBOOK_CURRENCY_DECIMALS`   | `2`     | Minor-unit digits                |
//! | `SHOPBOOK_UTC_OFFSET_MINUTES`  | `60`    | Business time zone (WAT)         |
//! | `SHOPBOOK_LOW_STOCK_ALERT`     | `5`     | Threshold for new products       |
//! | `SHOPBOOK_TOP_PRODUCTS`        | `5`     | Best sellers listed in reports   |

use std::env;

use chrono::{FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};
use shopbook_core::{DEFAULT_LOW_STOCK_ALERT, DEFAULT_TOP_PRODUCTS};

/// Largest UTC offset accepted, in minutes (±18h).
const MAX_OFFSET_MINUTES: i32 = 18 * 60;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerConfig {
    pub currency_symbol: String,
    pub currency_decimals: u8,
    /// Offset of the shop's local time from UTC; "today" and report
    /// windows are computed in this zone.
    pub utc_offset_minutes: i32,
    pub default_low_stock_alert: i64,
    pub top_products_limit: usize,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        LedgerConfig {
            currency_symbol: "₦".to_string(),
            currency_decimals: 2,
            utc_offset_minutes: 60,
            default_low_stock_alert: DEFAULT_LOW_STOCK_ALERT,
            top_products_limit: DEFAULT_TOP_PRODUCTS,
        }
    }
}

impl LedgerConfig {
    /// Load configuration from `SHOPBOOK_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = LedgerConfig::default();

        if let Some(symbol) = lookup("SHOPBOOK_CURRENCY_SYMBOL") {
            config.currency_symbol = symbol;
        }
        if let Some(raw) = lookup("SHOPBOOK_CURRENCY_DECIMALS") {
            config.currency_decimals = parse("SHOPBOOK_CURRENCY_DECIMALS", &raw)?;
        }
        if let Some(raw) = lookup("SHOPBOOK_UTC_OFFSET_MINUTES") {
            config.utc_offset_minutes = parse("SHOPBOOK_UTC_OFFSET_MINUTES", &raw)?;
        }
        if let Some(raw) = lookup("SHOPBOOK_LOW_STOCK_ALERT") {
            config.default_low_stock_alert = parse("SHOPBOOK_LOW_STOCK_ALERT", &raw)?;
        }
        if let Some(raw) = lookup("SHOPBOOK_TOP_PRODUCTS") {
            config.top_products_limit = parse("SHOPBOOK_TOP_PRODUCTS", &raw)?;
        }

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.utc_offset_minutes.abs() > MAX_OFFSET_MINUTES {
            return Err(ConfigError::InvalidValue("SHOPBOOK_UTC_OFFSET_MINUTES".to_string()));
        }
        if self.currency_decimals > 4 {
            return Err(ConfigError::InvalidValue("SHOPBOOK_CURRENCY_DECIMALS".to_string()));
        }
        if self.default_low_stock_alert < 0 {
            return Err(ConfigError::InvalidValue("SHOPBOOK_LOW_STOCK_ALERT".to_string()));
        }
        Ok(())
    }

    /// The business time zone as a fixed offset.
    pub fn business_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_minutes.saturating_mul(60)).unwrap_or_else(|| Utc.fix())
    }

    /// Formats a minor-unit amount as a currency string.
    ///
    /// ## Example
    /// ```rust
    /// use shopbook_ledger::LedgerConfig;
    ///
    /// let config = LedgerConfig::default();
    /// assert_eq!(config.format_currency(450_000), "₦4500.00");
    /// ```
    pub fn format_currency(&self, cents: i64) -> String {
        let divisor = 10_i64.pow(u32::from(self.currency_decimals));
        let whole = cents / divisor;
        let frac = (cents % divisor).abs();

        format!(
            "{}{}{}",
            if cents < 0 { "-" } else { "" },
            self.currency_symbol,
            if self.currency_decimals > 0 {
                format!(
                    "{}.{:0width$}",
                    whole.abs(),
                    frac,
                    width = usize::from(self.currency_decimals)
                )
            } else {
                whole.abs().to_string()
            }
        )
    }
}

fn parse<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue(key.to_string()))
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = LedgerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, LedgerConfig::default());
        assert_eq!(config.business_offset().local_minus_utc(), 3600);
    }

    #[test]
    fn test_overrides() {
        let config = LedgerConfig::from_lookup(lookup(&[
            ("SHOPBOOK_CURRENCY_SYMBOL", "KSh"),
            ("SHOPBOOK_UTC_OFFSET_MINUTES", "180"),
            ("SHOPBOOK_TOP_PRODUCTS", " 10 "),
        ]))
        .unwrap();
        assert_eq!(config.currency_symbol, "KSh");
        assert_eq!(config.business_offset().local_minus_utc(), 3 * 3600);
        assert_eq!(config.top_products_limit, 10);
    }

    #[test]
    fn test_invalid_values() {
        let err = LedgerConfig::from_lookup(lookup(&[("SHOPBOOK_LOW_STOCK_ALERT", "five")])).unwrap_err();
        assert_eq!(err.to_string(), "Invalid value for SHOPBOOK_LOW_STOCK_ALERT");

        assert!(LedgerConfig::from_lookup(lookup(&[("SHOPBOOK_UTC_OFFSET_MINUTES", "2000")])).is_err());
    }

    #[test]
    fn test_format_currency() {
        let config = LedgerConfig::default();
        assert_eq!(config.format_currency(150_000), "₦1500.00");
        assert_eq!(config.format_currency(1), "₦0.01");
        assert_eq!(config.format_currency(-1234), "-₦12.34");

        let whole = LedgerConfig {
            currency_decimals: 0,
            ..LedgerConfig::default()
        };
        assert_eq!(whole.format_currency(1500), "₦1500");
    }
}
