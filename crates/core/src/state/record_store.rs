use rust_decimal::Decimal;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, warn};

use crate::errors::CoreError;
use crate::models::balance::RawBalanceRecord;
use crate::services::completion_tracker::CompletionTracker;

use super::pending::PendingSignal;

#[derive(Debug)]
struct StoredRecord {
    source: usize,
    record: RawBalanceRecord,
}

#[derive(Debug, Default)]
struct StoreState {
    generation: u64,
    records: Vec<StoredRecord>,
}

/// Owner of the raw balance records and of one pending counter per source.
///
/// Balance sources never write here directly: they receive a [`BalanceSink`]
/// bound to the cycle (generation) that was current when their fetch started.
/// `clear()` starts a new cycle, so results from fetches that were still in
/// flight are rejected instead of leaking into the new cycle.
#[derive(Debug)]
pub struct RecordStore {
    state: Mutex<StoreState>,
    sources: Vec<String>,
    signals: Vec<PendingSignal>,
}

impl RecordStore {
    /// Create a store with one slot per named source, all settled.
    pub fn new(sources: Vec<String>) -> Self {
        let signals = sources.iter().map(|_| PendingSignal::new()).collect();
        Self {
            state: Mutex::new(StoreState::default()),
            sources,
            signals,
        }
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Hand out a sink for `source` bound to the current cycle.
    pub fn sink(self: &Arc<Self>, source: usize) -> Result<BalanceSink, CoreError> {
        if source >= self.sources.len() {
            return Err(CoreError::UnknownSource(source));
        }
        let generation = self.lock().generation;
        Ok(BalanceSink {
            store: Arc::clone(self),
            source,
            generation,
            outstanding: Arc::new(AtomicU64::new(0)),
        })
    }

    /// Start a new cycle: drop all records and settle every counter.
    /// Returns the new generation.
    pub fn clear(&self) -> u64 {
        let mut state = self.lock();
        state.generation += 1;
        state.records.clear();
        for signal in &self.signals {
            signal.set(0);
        }
        state.generation
    }

    /// Forget everything one source has emitted and settle its counter.
    pub fn reset_source(&self, source: usize) -> Result<(), CoreError> {
        let signal = self
            .signals
            .get(source)
            .ok_or(CoreError::UnknownSource(source))?;
        let mut state = self.lock();
        state.records.retain(|r| r.source != source);
        signal.set(0);
        Ok(())
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    /// Union of all sources' records, in global arrival order.
    #[must_use]
    pub fn records(&self) -> Vec<RawBalanceRecord> {
        self.lock().records.iter().map(|r| r.record.clone()).collect()
    }

    #[must_use]
    pub fn records_for(&self, source: usize) -> Vec<RawBalanceRecord> {
        self.lock()
            .records
            .iter()
            .filter(|r| r.source == source)
            .map(|r| r.record.clone())
            .collect()
    }

    #[must_use]
    pub fn source_names(&self) -> &[String] {
        &self.sources
    }

    #[must_use]
    pub fn signal(&self, source: usize) -> Option<&PendingSignal> {
        self.signals.get(source)
    }

    /// Completion tracker over every registered source.
    pub fn tracker(&self) -> CompletionTracker {
        CompletionTracker::new(self.signals.iter().map(PendingSignal::subscribe).collect())
    }
}

/// Write handle given to a balance source for one fetch.
///
/// Protocol: announce the number of checks with [`announce`](Self::announce)
/// before any of them resolves, then call exactly one of `emit`, `skip` or
/// `fail` per check. Checks discovered along the way are announced before
/// the check that discovered them resolves, so the counter never dips to
/// zero early. Announcements add up, so concurrent fetches on the same source
/// (several wallet addresses) share one counter safely.
#[derive(Debug, Clone)]
pub struct BalanceSink {
    store: Arc<RecordStore>,
    source: usize,
    generation: u64,
    /// Checks announced through this handle (and its clones) not yet resolved.
    outstanding: Arc<AtomicU64>,
}

impl BalanceSink {
    pub fn source(&self) -> usize {
        self.source
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub fn is_current(&self) -> bool {
        self.store.generation() == self.generation
    }

    /// Checks announced through this handle and not yet resolved.
    #[must_use]
    pub fn outstanding(&self) -> u64 {
        self.outstanding.load(Ordering::SeqCst)
    }

    pub fn announce(&self, checks: u64) -> Result<(), CoreError> {
        self.with_current(|_, signal| {
            signal.add(checks);
            self.outstanding.fetch_add(checks, Ordering::SeqCst);
        })
    }

    /// Resolve one check with a record. Records without a positive quantity
    /// are dropped. Returns whether the record was kept.
    pub fn emit(&self, record: RawBalanceRecord) -> Result<bool, CoreError> {
        let source = self.source;
        self.with_current(move |state, signal| {
            let kept = record.quantity() > Decimal::ZERO;
            if kept {
                state.records.push(StoredRecord { source, record });
            } else {
                debug!(symbol = %record.symbol, balance = %record.balance, "dropping record without quantity");
            }
            self.resolve(signal, 1);
            kept
        })
    }

    /// Resolve one check that produced nothing.
    pub fn skip(&self) -> Result<(), CoreError> {
        self.with_current(|_, signal| self.resolve(signal, 1))
    }

    /// Resolve one check that failed. The failure stays local to this check.
    pub fn fail(&self, error: &CoreError) -> Result<(), CoreError> {
        warn!(
            source = %self.source_name(),
            error = %error,
            "balance check failed"
        );
        self.with_current(|_, signal| self.resolve(signal, 1))
    }

    /// Open one check that stays pending until the returned hold is dropped.
    /// Dropping the hold also resolves anything else this fetch left
    /// outstanding, so a fetch that is cancelled midway still settles.
    pub fn hold(&self) -> Result<FetchHold, CoreError> {
        self.announce(1)?;
        Ok(FetchHold { sink: self.clone() })
    }

    /// Resolve whatever this fetch left outstanding. Returns how many checks
    /// had to be force-resolved.
    pub fn finish(&self) -> Result<u64, CoreError> {
        self.with_current(|_, signal| {
            let rest = self.outstanding.swap(0, Ordering::SeqCst);
            signal.resolve(rest);
            rest
        })
    }

    fn resolve(&self, signal: &PendingSignal, count: u64) {
        let _ = self
            .outstanding
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |v| Some(v.saturating_sub(count)));
        signal.resolve(count);
    }

    fn source_name(&self) -> &str {
        &self.store.sources[self.source]
    }

    fn with_current<T>(
        &self,
        f: impl FnOnce(&mut StoreState, &PendingSignal) -> T,
    ) -> Result<T, CoreError> {
        let mut state = self.store.lock();
        if state.generation != self.generation {
            debug!(
                source = %self.source_name(),
                stale = self.generation,
                current = state.generation,
                "discarding update from stale cycle"
            );
            return Err(CoreError::StaleCycle {
                expected: state.generation,
                actual: self.generation,
            });
        }
        let signal = &self.store.signals[self.source];
        Ok(f(&mut state, signal))
    }
}

/// Pending check held open for the lifetime of one fetch. See [`BalanceSink::hold`].
#[derive(Debug)]
#[must_use = "dropping the hold releases the fetch immediately"]
pub struct FetchHold {
    sink: BalanceSink,
}

impl FetchHold {
    pub fn sink(&self) -> &BalanceSink {
        &self.sink
    }
}

impl Drop for FetchHold {
    fn drop(&mut self) {
        match self.sink.finish() {
            // The hold itself accounts for one; anything beyond it was
            // announced by the source and never resolved.
            Ok(rest) if rest > 1 => warn!(
                source = %self.sink.source_name(),
                unresolved = rest - 1,
                "fetch ended with checks unresolved"
            ),
            Ok(_) | Err(CoreError::StaleCycle { .. }) => {}
            Err(e) => warn!(error = %e, "failed to settle balance fetch"),
        }
    }
}
