use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::debug;

use crate::errors::CoreError;
use crate::models::market::{CatalogEntry, MarketSnapshot};
use super::traits::MarketDataProvider;

#[derive(Debug, Clone)]
struct CachedSnapshot {
    fetched_at: DateTime<Utc>,
    /// `None` when the id was requested but the provider had nothing for it.
    snapshot: Option<MarketSnapshot>,
}

/// Transparent caching layer in front of any market data provider.
///
/// Cache strategy:
/// - **Catalog**: fetched once, kept for the lifetime of the wrapper.
/// - **Snapshots**: kept per id for `ttl`. A request is served from cache
///   only when every requested id is fresh; otherwise the whole set is
///   re-fetched. `force_refresh` empties the snapshot cache first.
pub struct CachedMarketData<P> {
    inner: P,
    ttl: Duration,
    catalog: Mutex<Option<Vec<CatalogEntry>>>,
    snapshots: Mutex<HashMap<String, CachedSnapshot>>,
}

impl<P: MarketDataProvider> CachedMarketData<P> {
    pub fn new(inner: P, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            catalog: Mutex::new(None),
            snapshots: Mutex::new(HashMap::new()),
        }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    /// Number of ids currently cached (hits and known misses).
    pub fn cached_ids(&self) -> usize {
        self.snapshots.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn clear(&self) {
        self.snapshots.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }

    fn lookup(&self, catalog_ids: &[String], now: DateTime<Utc>) -> Option<Vec<MarketSnapshot>> {
        let cache = self.snapshots.lock().unwrap_or_else(|e| e.into_inner());
        let mut hits = Vec::with_capacity(catalog_ids.len());
        for id in catalog_ids {
            let entry = cache.get(id)?;
            if now - entry.fetched_at >= self.ttl {
                return None;
            }
            if let Some(snapshot) = &entry.snapshot {
                hits.push(snapshot.clone());
            }
        }
        Some(hits)
    }

    fn store(&self, catalog_ids: &[String], snapshots: &[MarketSnapshot], now: DateTime<Utc>) {
        let mut cache = self.snapshots.lock().unwrap_or_else(|e| e.into_inner());
        for id in catalog_ids {
            let snapshot = snapshots.iter().find(|s| &s.catalog_id == id).cloned();
            cache.insert(
                id.clone(),
                CachedSnapshot {
                    fetched_at: now,
                    snapshot,
                },
            );
        }
    }

    /// Same as `fetch_snapshots`, with the clock supplied by the caller.
    pub async fn fetch_snapshots_at(
        &self,
        catalog_ids: &[String],
        force_refresh: bool,
        now: DateTime<Utc>,
    ) -> Result<Vec<MarketSnapshot>, CoreError> {
        if catalog_ids.is_empty() {
            return Err(CoreError::EmptyInput("catalog id list is empty".into()));
        }
        if force_refresh {
            self.clear();
        } else if let Some(hits) = self.lookup(catalog_ids, now) {
            debug!(provider = self.inner.name(), ids = catalog_ids.len(), "market data cache hit");
            return Ok(hits);
        }

        debug!(provider = self.inner.name(), ids = catalog_ids.len(), "market data cache miss");
        let snapshots = self.inner.fetch_snapshots(catalog_ids, force_refresh).await?;
        self.store(catalog_ids, &snapshots, now);
        Ok(snapshots)
    }
}

#[async_trait]
impl<P: MarketDataProvider> MarketDataProvider for CachedMarketData<P> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn resolve_catalog_ids(&self) -> Result<Vec<CatalogEntry>, CoreError> {
        {
            let catalog = self.catalog.lock().unwrap_or_else(|e| e.into_inner());
            if let Some(entries) = catalog.as_ref() {
                return Ok(entries.clone());
            }
        }

        let entries = self.inner.resolve_catalog_ids().await?;
        *self.catalog.lock().unwrap_or_else(|e| e.into_inner()) = Some(entries.clone());
        Ok(entries)
    }

    async fn fetch_snapshots(
        &self,
        catalog_ids: &[String],
        force_refresh: bool,
    ) -> Result<Vec<MarketSnapshot>, CoreError> {
        self.fetch_snapshots_at(catalog_ids, force_refresh, Utc::now()).await
    }
}
