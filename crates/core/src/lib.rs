pub mod errors;
pub mod models;
pub mod providers;
pub mod services;
pub mod state;

use chrono::Utc;
use futures::future::join_all;
use models::{
    balance::RawBalanceRecord,
    group::AssetGroup,
    history::HistoryPoint,
    market::MarketSnapshot,
    portfolio::{LendingPosition, LendingTotals, PortfolioSnapshot},
    settings::Settings,
};
use providers::{
    cached::CachedMarketData, coingecko::CoinGeckoProvider, registry::BalanceSourceRegistry,
    traits::MarketDataProvider,
};
use rust_decimal::Decimal;
use services::{
    asset_grouping_service::AssetGroupingService, completion_tracker::CompletionTracker,
    history_service::HistoryService, market_data_service::MarketDataService,
    portfolio_service::PortfolioService, valuation_service::ValuationService,
};
use state::record_store::RecordStore;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

use errors::CoreError;

/// Main entry point for the wallet aggregator core library.
///
/// Owns the state of one aggregation cycle (raw records, market snapshots,
/// lending totals) and the services that derive views from it. Every view is
/// recomputed from the current inputs on each call.
///
/// Typical cycle: `clear()` → `fetch_all_balances(addresses)` →
/// `fetch_market_data(false)` (waits for settlement) → read views.
/// All methods take `&self`, so a cycle can be cleared while fetches from the
/// previous one are still in flight; their late results are discarded.
#[must_use]
pub struct WalletAggregator {
    settings: Settings,
    sources: BalanceSourceRegistry,
    store: Arc<RecordStore>,
    market_service: MarketDataService,
    grouping_service: AssetGroupingService,
    valuation_service: ValuationService,
    portfolio_service: PortfolioService,
    history_service: HistoryService,
    snapshots: Mutex<Vec<MarketSnapshot>>,
    lending: Mutex<LendingTotals>,
}

impl std::fmt::Debug for WalletAggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletAggregator")
            .field("sources", &self.sources.names())
            .field("generation", &self.store.generation())
            .field("records", &self.store.records().len())
            .field("snapshots", &self.lock_snapshots().len())
            .field("market_provider", &self.market_service.provider_name())
            .finish()
    }
}

impl WalletAggregator {
    /// Create an aggregator with the built-in sources and a cached CoinGecko
    /// market data provider.
    pub fn new(settings: Settings) -> Result<Self, CoreError> {
        let api_key = settings.api_keys.get("coingecko").cloned();
        let market = CachedMarketData::new(CoinGeckoProvider::new(api_key), settings.market_cache_ttl());
        Self::with_providers(settings, BalanceSourceRegistry::new_with_defaults(), Arc::new(market))
    }

    /// Create an aggregator from explicit collaborators.
    pub fn with_providers(
        settings: Settings,
        sources: BalanceSourceRegistry,
        market: Arc<dyn MarketDataProvider>,
    ) -> Result<Self, CoreError> {
        settings.validate()?;
        let store = Arc::new(RecordStore::new(sources.names()));
        let market_service = MarketDataService::new(market, &settings);

        Ok(Self {
            settings,
            sources,
            store,
            market_service,
            grouping_service: AssetGroupingService::new(),
            valuation_service: ValuationService::new(),
            portfolio_service: PortfolioService::new(),
            history_service: HistoryService::new(),
            snapshots: Mutex::new(Vec::new()),
            lending: Mutex::new(LendingTotals::default()),
        })
    }

    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    fn lock_snapshots(&self) -> std::sync::MutexGuard<'_, Vec<MarketSnapshot>> {
        self.snapshots.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_lending(&self) -> std::sync::MutexGuard<'_, LendingTotals> {
        self.lending.lock().unwrap_or_else(|e| e.into_inner())
    }

    // ── Cycle ───────────────────────────────────────────────────────

    /// Start a new aggregation cycle: drop all balance records, settle every
    /// pending counter and reset lending totals. Market snapshots are kept
    /// until the next successful market data fetch replaces them.
    /// Returns the new cycle number.
    pub fn clear(&self) -> u64 {
        let generation = self.store.clear();
        *self.lock_lending() = LendingTotals::default();
        info!(generation, "aggregation cycle cleared");
        generation
    }

    /// Current aggregation cycle number.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.store.generation()
    }

    // ── Balances ────────────────────────────────────────────────────

    /// Fetch balances for every address from every source that supports it,
    /// all concurrently. Per-source failures are logged and never fail the
    /// batch. Returns the number of (address, source) fetches run.
    pub async fn fetch_all_balances(&self, addresses: &[String]) -> Result<usize, CoreError> {
        let mut unique: Vec<&str> = Vec::new();
        for address in addresses {
            let trimmed = address.trim();
            if !trimmed.is_empty() && !unique.contains(&trimmed) {
                unique.push(trimmed);
            }
        }

        let mut fetches = Vec::new();
        for address in unique {
            let routed = self.sources.sources_for(address);
            if routed.is_empty() {
                debug!(address, "no balance source supports this address");
            }
            for (index, source) in routed {
                let sink = self.store.sink(index)?;
                // Keeps the source pending from launch until this fetch ends,
                // including when the caller drops the batch midway.
                let hold = sink.hold()?;
                let source = Arc::clone(source);
                fetches.push(async move {
                    match source.fetch_balances(address, sink).await {
                        Ok(()) => {}
                        Err(CoreError::StaleCycle { .. }) => {
                            debug!(source = source.name(), address, "fetch outlived its cycle");
                        }
                        Err(e) => {
                            warn!(source = source.name(), address, error = %e, "balance fetch failed");
                        }
                    }
                    drop(hold);
                });
            }
        }

        let count = fetches.len();
        join_all(fetches).await;
        Ok(count)
    }

    /// Forget one source's records and settle its counter.
    pub fn reset_source(&self, index: usize) -> Result<(), CoreError> {
        self.store.reset_source(index)
    }

    /// Raw records of the current cycle, in arrival order.
    #[must_use]
    pub fn records(&self) -> Vec<RawBalanceRecord> {
        self.store.records()
    }

    // ── Settlement ──────────────────────────────────────────────────

    #[must_use]
    pub fn tracker(&self) -> CompletionTracker {
        self.store.tracker()
    }

    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.tracker().is_settled()
    }

    /// Wait until every source has settled, re-checking at the configured interval.
    pub async fn wait_until_settled(&self) {
        self.tracker()
            .wait_until_settled(self.settings.settle_poll_interval())
            .await;
    }

    // ── Market Data ─────────────────────────────────────────────────

    /// Wait for settlement, then fetch market data for the held assets and
    /// replace the snapshot set. On failure the previous snapshots stay.
    /// Returns the number of snapshots now held.
    pub async fn fetch_market_data(&self, force_refresh: bool) -> Result<usize, CoreError> {
        self.wait_until_settled().await;

        let generation = self.store.generation();
        let records = self.store.records();
        let snapshots = self.market_service.fetch(&records, force_refresh).await?;

        let current = self.store.generation();
        if current != generation {
            return Err(CoreError::StaleCycle {
                expected: current,
                actual: generation,
            });
        }

        let count = snapshots.len();
        *self.lock_snapshots() = snapshots;
        info!(snapshots = count, "market data updated");
        Ok(count)
    }

    #[must_use]
    pub fn market_snapshots(&self) -> Vec<MarketSnapshot> {
        self.lock_snapshots().clone()
    }

    // ── Lending ─────────────────────────────────────────────────────

    /// Replace lending totals with the sum of the given per-market positions.
    pub fn set_lending_positions(&self, positions: &[LendingPosition]) {
        *self.lock_lending() = LendingTotals::from_positions(positions);
    }

    #[must_use]
    pub fn lending_totals(&self) -> LendingTotals {
        *self.lock_lending()
    }

    // ── Views ───────────────────────────────────────────────────────

    /// Asset groups before valuation, in first-seen order.
    #[must_use]
    pub fn groups(&self) -> Vec<AssetGroup> {
        self.grouping_service.group(&self.store.records())
    }

    /// Valued asset groups, largest USD value first.
    #[must_use]
    pub fn valued_groups(&self) -> Vec<AssetGroup> {
        let groups = self.groups();
        let snapshots = self.lock_snapshots().clone();
        self.valuation_service.value(&groups, &snapshots)
    }

    #[must_use]
    pub fn portfolio(&self) -> PortfolioSnapshot {
        self.portfolio_service
            .summarize(&self.valued_groups(), &self.lending_totals())
    }

    /// Share of total worth held in each valued group, in the same order.
    #[must_use]
    pub fn allocations(&self) -> Vec<(AssetGroup, Decimal)> {
        let groups = self.valued_groups();
        let worth = self.portfolio_service.total_worth(&groups);
        groups
            .into_iter()
            .map(|g| {
                let pct = self.portfolio_service.allocation_pct(&g, worth);
                (g, pct)
            })
            .collect()
    }

    /// Reconstructed value series over the last `days` days, oldest first.
    #[must_use]
    pub fn portfolio_history(&self, days: i64) -> Vec<Decimal> {
        self.history_service
            .reconstruct(&self.valued_groups(), days, Utc::now())
    }

    /// Same as [`portfolio_history`](Self::portfolio_history), with timestamps,
    /// over the configured default window.
    #[must_use]
    pub fn portfolio_history_points(&self) -> Vec<HistoryPoint> {
        self.history_service
            .reconstruct_points(&self.valued_groups(), self.settings.history_days, Utc::now())
    }
}
