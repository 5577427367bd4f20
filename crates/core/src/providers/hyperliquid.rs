use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::errors::CoreError;
use crate::models::balance::{PriceUsd, RawBalanceRecord};
use crate::state::record_store::BalanceSink;
use super::traits::BalanceSource;

const INFO_URL: &str = "https://api.hyperliquid.xyz/info";

/// Chain id reported for Hyperliquid spot (settlement layer) balances.
pub const HYPERCORE_CHAIN_ID: &str = "HyperCore";

/// Hyperliquid spot clearinghouse balances.
///
/// - **Free**: public REST endpoint, no API key.
/// - **Endpoint**: `POST /info` with `{"type": "spotClearinghouseState", "user": ...}`
///
/// Prices are not part of the response, so every record is emitted with an
/// unknown price and valued later from market data.
pub struct HyperliquidSpotSource {
    client: Client,
    info_url: String,
}

impl HyperliquidSpotSource {
    pub fn new() -> Self {
        Self::with_url(INFO_URL)
    }

    /// Point the source at another endpoint (testnet, local mock).
    pub fn with_url(info_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            info_url: info_url.into(),
        }
    }

    async fn fetch_spot_state(&self, address: &str) -> Result<SpotStateResponse, CoreError> {
        let request = InfoRequest {
            kind: "spotClearinghouseState",
            user: address,
        };
        let body = self
            .client
            .post(&self.info_url)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        parse_spot_state(&body)
    }
}

impl Default for HyperliquidSpotSource {
    fn default() -> Self {
        Self::new()
    }
}

// ── Hyperliquid API types ───────────────────────────────────────────

#[derive(Serialize)]
struct InfoRequest<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    user: &'a str,
}

#[derive(Deserialize)]
struct SpotStateResponse {
    #[serde(default)]
    balances: Vec<SpotBalance>,
}

#[derive(Deserialize)]
struct SpotBalance {
    coin: String,
    token: u64,
    total: String,
}

fn parse_spot_state(body: &str) -> Result<SpotStateResponse, CoreError> {
    Ok(serde_json::from_str(body)?)
}

impl SpotBalance {
    fn into_record(self) -> RawBalanceRecord {
        RawBalanceRecord::new(HYPERCORE_CHAIN_ID, self.token.to_string(), self.coin, self.total)
            .with_price(PriceUsd::Unknown)
    }
}

#[async_trait]
impl BalanceSource for HyperliquidSpotSource {
    fn name(&self) -> &str {
        "Hyperliquid"
    }

    fn supports(&self, address: &str) -> bool {
        address.starts_with("0x")
    }

    async fn fetch_balances(&self, address: &str, sink: BalanceSink) -> Result<(), CoreError> {
        // The listing request itself counts as one check until it resolves.
        sink.announce(1)?;

        let state = match self.fetch_spot_state(address).await {
            Ok(state) => state,
            Err(e) => {
                sink.fail(&e)?;
                return Ok(());
            }
        };

        debug!(address, balances = state.balances.len(), "hyperliquid spot state received");
        sink.announce(state.balances.len() as u64)?;
        sink.skip()?;

        for balance in state.balances {
            sink.emit(balance.into_record())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spot_balances_become_unpriced_records() {
        let json = r#"{"balances":[
            {"coin":"USDC","token":0,"hold":"0.0","total":"125.5","entryNtl":"0.0"},
            {"coin":"HYPE","token":150,"hold":"0.0","total":"0.0","entryNtl":"0.0"}
        ]}"#;
        let resp = parse_spot_state(json).unwrap();
        let records: Vec<RawBalanceRecord> =
            resp.balances.into_iter().map(SpotBalance::into_record).collect();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].chain_id, HYPERCORE_CHAIN_ID);
        assert_eq!(records[0].symbol, "USDC");
        assert_eq!(records[0].address, "0");
        assert!(records[0].price_usd.is_unknown());
        assert_eq!(records[0].balance_usd, None);
        assert_eq!(records[1].quantity(), rust_decimal::Decimal::ZERO);
    }

    #[test]
    fn missing_balances_field_means_empty_wallet() {
        let resp = parse_spot_state("{}").unwrap();
        assert!(resp.balances.is_empty());
    }

    #[test]
    fn malformed_state_is_deserialization_error() {
        let err = parse_spot_state(r#"{"balances": "unavailable"}"#).err().unwrap();
        assert!(matches!(err, CoreError::Deserialization(_)));
    }

    #[test]
    fn only_evm_style_addresses_are_supported() {
        let source = HyperliquidSpotSource::new();
        assert!(source.supports("0x1234567890abcdef1234567890abcdef12345678"));
        assert!(!source.supports("cosmos1qypqxpq9qcrsszg2pvxq6rs0zqg3yyc5lzv7xu"));
    }
}
