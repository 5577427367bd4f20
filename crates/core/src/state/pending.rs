use std::sync::Arc;
use tokio::sync::watch;

/// Countdown of outstanding balance checks for one source.
///
/// A source sets it to the number of checks it is about to run, then resolves
/// one per finished check (success, failure or skip). It never goes below
/// zero. Every change is published on a `watch` channel so observers react to
/// each transition instead of sampling a value.
#[derive(Debug, Clone)]
pub struct PendingSignal {
    tx: Arc<watch::Sender<u64>>,
}

impl PendingSignal {
    /// New signal, already settled.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(0);
        Self { tx: Arc::new(tx) }
    }

    pub fn set(&self, count: u64) {
        self.tx.send_replace(count);
    }

    pub fn add(&self, count: u64) {
        self.tx.send_modify(|v| *v = v.saturating_add(count));
    }

    /// Mark one check as finished.
    pub fn resolve_one(&self) {
        self.resolve(1);
    }

    pub fn resolve(&self, count: u64) {
        self.tx.send_modify(|v| *v = v.saturating_sub(count));
    }

    #[must_use]
    pub fn get(&self) -> u64 {
        *self.tx.borrow()
    }

    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.get() == 0
    }

    /// Observe every change of this counter.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.tx.subscribe()
    }
}

impl Default for PendingSignal {
    fn default() -> Self {
        Self::new()
    }
}
