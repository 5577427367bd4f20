use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::debug;

use crate::errors::CoreError;
use crate::models::balance::RawBalanceRecord;
use crate::models::market::{CatalogEntry, MarketSnapshot};
use crate::models::settings::{CatalogOverride, Settings};
use crate::providers::traits::MarketDataProvider;

/// Turns the current balance records into a market data request.
///
/// Id resolution, per held record (positive quantity only):
/// 1. an explicit catalog id on the record is used as is;
/// 2. otherwise a configured symbol override;
/// 3. otherwise the first catalog entry with the same symbol (case-insensitive).
///
/// The result is de-duplicated and keeps first-seen order.
pub struct MarketDataService {
    provider: Arc<dyn MarketDataProvider>,
    overrides: Vec<CatalogOverride>,
}

impl MarketDataService {
    pub fn new(provider: Arc<dyn MarketDataProvider>, settings: &Settings) -> Self {
        Self {
            provider,
            overrides: settings.catalog_overrides.clone(),
        }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    fn override_for(&self, symbol: &str) -> Option<&str> {
        let lower = symbol.to_lowercase();
        self.overrides
            .iter()
            .find(|o| o.symbol.to_lowercase() == lower)
            .map(|o| o.id.as_str())
    }

    /// Whether resolving these records needs the provider's catalog at all.
    fn needs_catalog(&self, records: &[RawBalanceRecord]) -> bool {
        records
            .iter()
            .filter(|r| r.quantity() > Decimal::ZERO)
            .any(|r| r.catalog_id.is_none() && self.override_for(&r.symbol).is_none())
    }

    pub fn resolve_ids(&self, records: &[RawBalanceRecord], catalog: &[CatalogEntry]) -> Vec<String> {
        let mut ids: Vec<String> = Vec::new();

        for record in records.iter().filter(|r| r.quantity() > Decimal::ZERO) {
            let id = match &record.catalog_id {
                Some(id) => Some(id.clone()),
                None => self.override_for(&record.symbol).map(str::to_string).or_else(|| {
                    let lower = record.symbol.to_lowercase();
                    catalog
                        .iter()
                        .find(|c| c.symbol.to_lowercase() == lower)
                        .map(|c| c.id.clone())
                }),
            };
            match id {
                Some(id) if !ids.contains(&id) => ids.push(id),
                Some(_) => {}
                None => debug!(symbol = %record.symbol, "no catalog id for symbol"),
            }
        }

        ids
    }

    /// Resolve ids for the held records and fetch their snapshots.
    /// Fails with `EmptyInput`, without asking for snapshots, when nothing resolves.
    pub async fn fetch(
        &self,
        records: &[RawBalanceRecord],
        force_refresh: bool,
    ) -> Result<Vec<MarketSnapshot>, CoreError> {
        let catalog = if self.needs_catalog(records) {
            self.provider.resolve_catalog_ids().await?
        } else {
            Vec::new()
        };

        let ids = self.resolve_ids(records, &catalog);
        if ids.is_empty() {
            return Err(CoreError::EmptyInput(
                "no catalog id could be resolved for the current balances".into(),
            ));
        }

        debug!(provider = self.provider.name(), ids = ids.len(), force_refresh, "fetching market data");
        self.provider.fetch_snapshots(&ids, force_refresh).await
    }
}
