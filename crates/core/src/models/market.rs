use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One entry of the price catalog: maps a ticker symbol to a catalog id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: String,
    pub symbol: String,
    #[serde(default)]
    pub name: String,
}

impl CatalogEntry {
    pub fn new(id: impl Into<String>, symbol: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            symbol: symbol.into(),
            name: name.into(),
        }
    }
}

/// Current market data for one catalog entry.
///
/// Produced once per aggregation cycle by the market data provider and
/// treated as read-only afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketSnapshot {
    pub catalog_id: String,
    pub symbol: String,
    pub price_usd: Decimal,

    pub change_1h_pct: Option<f64>,
    pub change_24h_pct: Option<f64>,
    pub change_7d_pct: Option<f64>,
    pub change_30d_pct: Option<f64>,

    /// 7-day price samples at a fixed 30-minute interval, oldest first
    #[serde(default)]
    pub sparkline_7d: Vec<Decimal>,

    pub circulating_supply: Option<f64>,
    pub total_supply: Option<f64>,
    pub max_supply: Option<f64>,
    pub market_cap: Option<f64>,
    pub fully_diluted_valuation: Option<f64>,

    #[serde(rename = "logoURI")]
    pub logo_uri: Option<String>,
}

impl MarketSnapshot {
    /// Minimal snapshot with only identity and price set.
    pub fn new(catalog_id: impl Into<String>, symbol: impl Into<String>, price_usd: Decimal) -> Self {
        Self {
            catalog_id: catalog_id.into(),
            symbol: symbol.into(),
            price_usd,
            change_1h_pct: None,
            change_24h_pct: None,
            change_7d_pct: None,
            change_30d_pct: None,
            sparkline_7d: Vec::new(),
            circulating_supply: None,
            total_supply: None,
            max_supply: None,
            market_cap: None,
            fully_diluted_valuation: None,
            logo_uri: None,
        }
    }

    pub fn with_sparkline(mut self, samples: Vec<Decimal>) -> Self {
        self.sparkline_7d = samples;
        self
    }

    pub fn with_logo(mut self, uri: impl Into<String>) -> Self {
        self.logo_uri = Some(uri.into());
        self
    }
}
