use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::time::Duration;

use crate::errors::CoreError;
use crate::models::market::{CatalogEntry, MarketSnapshot};
use super::traits::MarketDataProvider;

const BASE_URL: &str = "https://api.coingecko.com/api/v3";

/// CoinGecko API provider for market data.
///
/// - **Free tier**: works without a key; a demo key raises rate limits.
/// - **Data**: current USD price, 1h/24h/7d/30d changes, supplies, and a
///   7-day sparkline sampled every 30 minutes.
/// - **Endpoints**: `/coins/list`, `/coins/markets`
///
/// Note: CoinGecko ids are lowercase slugs like "bitcoin", "usd-coin".
/// Symbols are not unique in the catalog, which is why explicit ids win.
pub struct CoinGeckoProvider {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl CoinGeckoProvider {
    pub fn new(api_key: Option<String>) -> Self {
        Self::with_base_url(BASE_URL, api_key)
    }

    pub fn with_base_url(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            base_url: base_url.into(),
            api_key,
        }
    }

    fn markets_url(&self, catalog_ids: &[String]) -> String {
        let mut url = format!(
            "{}/coins/markets?vs_currency=usd&order=id_asc&sparkline=true\
             &price_change_percentage=1h%2C24h%2C7d%2C30d&locale=en&ids={}",
            self.base_url,
            catalog_ids.join(",")
        );
        if let Some(key) = &self.api_key {
            url.push_str("&x_cg_demo_api_key=");
            url.push_str(key);
        }
        url
    }
}

impl Default for CoinGeckoProvider {
    fn default() -> Self {
        Self::new(None)
    }
}

// ── CoinGecko API response types ────────────────────────────────────

#[derive(Deserialize)]
struct CoinListEntry {
    id: String,
    symbol: String,
    #[serde(default)]
    name: String,
}

#[derive(Deserialize)]
struct CoinMarket {
    id: String,
    symbol: String,
    current_price: Option<f64>,
    image: Option<String>,
    market_cap: Option<f64>,
    fully_diluted_valuation: Option<f64>,
    circulating_supply: Option<f64>,
    total_supply: Option<f64>,
    max_supply: Option<f64>,
    price_change_percentage_24h: Option<f64>,
    price_change_percentage_1h_in_currency: Option<f64>,
    price_change_percentage_7d_in_currency: Option<f64>,
    price_change_percentage_30d_in_currency: Option<f64>,
    sparkline_in_7d: Option<Sparkline>,
}

#[derive(Deserialize)]
struct Sparkline {
    #[serde(default)]
    price: Vec<Option<f64>>,
}

fn to_decimal(value: f64) -> Decimal {
    Decimal::try_from(value).unwrap_or(Decimal::ZERO)
}

impl CoinMarket {
    fn into_snapshot(self) -> MarketSnapshot {
        let sparkline = self
            .sparkline_in_7d
            .map(|s| s.price.into_iter().map(|p| to_decimal(p.unwrap_or(0.0))).collect())
            .unwrap_or_default();

        MarketSnapshot {
            catalog_id: self.id,
            symbol: self.symbol,
            price_usd: to_decimal(self.current_price.unwrap_or(0.0)),
            change_1h_pct: self.price_change_percentage_1h_in_currency,
            change_24h_pct: self.price_change_percentage_24h,
            change_7d_pct: self.price_change_percentage_7d_in_currency,
            change_30d_pct: self.price_change_percentage_30d_in_currency,
            sparkline_7d: sparkline,
            circulating_supply: self.circulating_supply,
            total_supply: self.total_supply,
            max_supply: self.max_supply,
            market_cap: self.market_cap,
            fully_diluted_valuation: self.fully_diluted_valuation,
            logo_uri: self.image,
        }
    }
}

fn parse_coin_list(body: &str) -> Result<Vec<CatalogEntry>, CoreError> {
    let entries: Vec<CoinListEntry> = serde_json::from_str(body)?;
    Ok(entries
        .into_iter()
        .map(|e| CatalogEntry::new(e.id, e.symbol, e.name))
        .collect())
}

fn parse_markets(body: &str) -> Result<Vec<MarketSnapshot>, CoreError> {
    let markets: Vec<CoinMarket> = serde_json::from_str(body)?;
    Ok(markets.into_iter().map(CoinMarket::into_snapshot).collect())
}

#[async_trait]
impl MarketDataProvider for CoinGeckoProvider {
    fn name(&self) -> &str {
        "CoinGecko"
    }

    async fn resolve_catalog_ids(&self) -> Result<Vec<CatalogEntry>, CoreError> {
        let url = format!("{}/coins/list", self.base_url);
        let body = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        parse_coin_list(&body)
    }

    async fn fetch_snapshots(
        &self,
        catalog_ids: &[String],
        _force_refresh: bool,
    ) -> Result<Vec<MarketSnapshot>, CoreError> {
        if catalog_ids.is_empty() {
            return Err(CoreError::EmptyInput("catalog id list is empty".into()));
        }

        let body = self
            .client
            .get(self.markets_url(catalog_ids))
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        parse_markets(&body)
    }
}
