use std::sync::Arc;

use super::hyperliquid::HyperliquidSpotSource;
use super::traits::BalanceSource;

/// Registry of all balance sources, in registration order.
///
/// Routes wallet addresses to the sources that understand them. The
/// registration index doubles as the source's slot in the record store.
pub struct BalanceSourceRegistry {
    sources: Vec<Arc<dyn BalanceSource>>,
}

impl BalanceSourceRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
        }
    }

    /// Create a registry with the built-in sources.
    pub fn new_with_defaults() -> Self {
        let mut registry = Self::new();

        // Hyperliquid spot balances: public REST endpoint, no API key
        registry.register(Arc::new(HyperliquidSpotSource::new()));

        registry
    }

    /// Register a new balance source. Returns its index.
    pub fn register(&mut self, source: Arc<dyn BalanceSource>) -> usize {
        self.sources.push(source);
        self.sources.len() - 1
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        self.sources.iter().map(|s| s.name().to_string()).collect()
    }

    pub fn get(&self, index: usize) -> Option<&Arc<dyn BalanceSource>> {
        self.sources.get(index)
    }

    /// Every source that supports the address, with its index.
    pub fn sources_for(&self, address: &str) -> Vec<(usize, &Arc<dyn BalanceSource>)> {
        self.sources
            .iter()
            .enumerate()
            .filter(|(_, s)| s.supports(address))
            .collect()
    }
}

impl Default for BalanceSourceRegistry {
    fn default() -> Self {
        Self::new()
    }
}
