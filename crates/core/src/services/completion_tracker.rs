use futures::future::select_all;
use std::time::Duration;
use tokio::sync::watch;
use tracing::info;

/// Merges the pending counters of every registered balance source into a
/// single "all sources settled" reading.
///
/// Settled means every counter currently reads zero. A source that registered
/// but never started any check reads zero and does not hold anything up.
#[derive(Debug, Clone)]
pub struct CompletionTracker {
    signals: Vec<watch::Receiver<u64>>,
}

impl CompletionTracker {
    pub fn new(signals: Vec<watch::Receiver<u64>>) -> Self {
        Self { signals }
    }

    /// Number of sources being tracked.
    #[must_use]
    pub fn source_count(&self) -> usize {
        self.signals.len()
    }

    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.signals.iter().all(|rx| *rx.borrow() == 0)
    }

    /// Outstanding checks across all sources.
    #[must_use]
    pub fn pending_total(&self) -> u64 {
        self.signals
            .iter()
            .fold(0u64, |acc, rx| acc.saturating_add(*rx.borrow()))
    }

    /// Re-check every `interval` until settled. There is no retry bound:
    /// settlement is expected within seconds.
    pub async fn wait_until_settled(&self, interval: Duration) {
        while !self.is_settled() {
            info!(
                pending = self.pending_total(),
                "waiting for all balance sources to settle"
            );
            tokio::time::sleep(interval).await;
        }
    }

    /// Wait for any counter to change, then report whether all are settled.
    ///
    /// Returns the current reading immediately when no source is tracked or
    /// every source has gone away.
    pub async fn next_change(&mut self) -> bool {
        if self.signals.is_empty() {
            return self.is_settled();
        }
        let changes = self
            .signals
            .iter_mut()
            .map(|rx| Box::pin(rx.changed()));
        // A closed channel also ends the wait; its last value is final.
        let _ = select_all(changes).await;
        self.is_settled()
    }
}
