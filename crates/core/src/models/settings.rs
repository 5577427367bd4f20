use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use crate::errors::CoreError;
use super::history::MAX_HISTORY_DAYS;

/// Manual symbol → catalog id mapping, checked before the catalog lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogOverride {
    pub symbol: String,
    pub id: String,
}

impl CatalogOverride {
    pub fn new(symbol: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            id: id.into(),
        }
    }
}

/// Runtime settings for an aggregator instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Optional API keys for providers that accept them.
    /// Keys: provider name (e.g., "coingecko"). Values: the API key string.
    pub api_keys: HashMap<String, String>,

    /// Delay between settlement re-checks before requesting market data.
    pub settle_poll_interval_ms: u64,

    /// How long fetched market snapshots are served from cache.
    pub market_cache_ttl_minutes: i64,

    /// Default window for the reconstructed value history.
    pub history_days: i64,

    pub catalog_overrides: Vec<CatalogOverride>,
}

impl Default for Settings {
    fn default() -> Self {
        let catalog_overrides = [
            ("btc", "bitcoin"),
            ("eth", "ethereum"),
            ("jup", "jupiter-exchange-solana"),
            ("velo", "velodrome-finance"),
            ("op", "optimism"),
            ("hype", "hyperliquid"),
            ("ape", "apecoin"),
        ]
        .into_iter()
        .map(|(symbol, id)| CatalogOverride::new(symbol, id))
        .collect();

        Self {
            api_keys: HashMap::new(),
            settle_poll_interval_ms: 1000,
            market_cache_ttl_minutes: 30,
            history_days: 30,
            catalog_overrides,
        }
    }
}

impl Settings {
    /// Parse settings from JSON. Missing fields fall back to defaults.
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        let settings: Settings = serde_json::from_str(json)
            .map_err(|e| CoreError::Config(format!("Failed to parse settings: {e}")))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.settle_poll_interval_ms == 0 {
            return Err(CoreError::Config(
                "settle_poll_interval_ms must be greater than 0".into(),
            ));
        }
        if self.market_cache_ttl_minutes <= 0 {
            return Err(CoreError::Config(
                "market_cache_ttl_minutes must be greater than 0".into(),
            ));
        }
        if self.history_days <= 0 {
            return Err(CoreError::Config("history_days must be greater than 0".into()));
        }
        if self.history_days > MAX_HISTORY_DAYS {
            return Err(CoreError::Config(format!(
                "history_days of {} exceeds maximum of {MAX_HISTORY_DAYS} days",
                self.history_days
            )));
        }
        Ok(())
    }

    pub fn settle_poll_interval(&self) -> Duration {
        Duration::from_millis(self.settle_poll_interval_ms)
    }

    pub fn market_cache_ttl(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.market_cache_ttl_minutes)
    }
}
