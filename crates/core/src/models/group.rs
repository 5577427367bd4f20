use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::balance::{PriceUsd, RawBalanceRecord};
use super::market::MarketSnapshot;

/// Canonical cross-chain aggregate for one logical asset.
///
/// Membership is owned by the grouping step, price fields by the valuation
/// step. Quantity and value are never stored: they are summed from the
/// constituent records on every call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetGroup {
    /// Grouping key as first seen (compare with `normalized_symbol`)
    pub symbol: String,

    pub name: String,

    #[serde(rename = "logoURI")]
    pub logo_uri: Option<String>,

    pub catalog_id: Option<String>,

    /// Constituent records, in arrival order
    pub tokens: Vec<RawBalanceRecord>,

    pub price_usd: PriceUsd,

    /// Market data adopted during valuation
    pub market: Option<MarketSnapshot>,
}

impl AssetGroup {
    /// Open a new group seeded from its first record.
    pub fn seeded_from(record: RawBalanceRecord) -> Self {
        Self {
            symbol: record.symbol.clone(),
            name: record.symbol.clone(),
            logo_uri: record.logo_uri.clone(),
            catalog_id: record.catalog_id.clone(),
            price_usd: record.price_usd,
            market: None,
            tokens: vec![record],
        }
    }

    pub fn normalized_symbol(&self) -> String {
        self.symbol.to_lowercase()
    }

    /// Sum of constituent quantities.
    pub fn total_quantity(&self) -> Decimal {
        self.tokens
            .iter()
            .fold(Decimal::ZERO, |acc, t| acc.saturating_add(t.quantity()))
    }

    /// Sum of constituent USD values (unknown values count as zero).
    pub fn total_value(&self) -> Decimal {
        self.tokens
            .iter()
            .fold(Decimal::ZERO, |acc, t| acc.saturating_add(t.value_usd()))
    }

    /// Distinct chains this asset is held on, in arrival order.
    pub fn chains(&self) -> Vec<&str> {
        let mut chains: Vec<&str> = Vec::new();
        for token in &self.tokens {
            if !chains.contains(&token.chain_id.as_str()) {
                chains.push(&token.chain_id);
            }
        }
        chains
    }
}
