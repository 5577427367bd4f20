use async_trait::async_trait;

use crate::errors::CoreError;
use crate::models::market::{CatalogEntry, MarketSnapshot};
use crate::state::record_store::BalanceSink;

/// A per-chain-family source of wallet balances (EVM RPC, settlement-layer
/// REST, SVM RPC, IBC RPC, ...).
///
/// Implementations report through the [`BalanceSink`] they are handed:
/// `announce` the number of checks before any of them resolves,
/// then resolve each one exactly once (`emit`, `skip` or `fail`). A failed
/// check must not abort the rest of the batch.
#[async_trait]
pub trait BalanceSource: Send + Sync {
    /// Human-readable name of this source (for logs/errors).
    fn name(&self) -> &str;

    /// Whether this source understands the given wallet address format.
    fn supports(&self, address: &str) -> bool;

    /// Fetch every balance held by `address`, reporting through `sink`.
    ///
    /// An `Err` here means the source could not even start (or its cycle was
    /// discarded); per-check failures go through `sink.fail`.
    async fn fetch_balances(&self, address: &str, sink: BalanceSink) -> Result<(), CoreError>;
}

/// Source of current prices and market metadata.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Human-readable name of this provider (for logs/errors).
    fn name(&self) -> &str;

    /// The full catalog of known identifiers, used to map symbols to ids.
    async fn resolve_catalog_ids(&self) -> Result<Vec<CatalogEntry>, CoreError>;

    /// One snapshot per resolvable id. Fails with `CoreError::EmptyInput`
    /// when `catalog_ids` is empty.
    async fn fetch_snapshots(
        &self,
        catalog_ids: &[String],
        force_refresh: bool,
    ) -> Result<Vec<MarketSnapshot>, CoreError>;
}
