use thiserror::Error;

/// Unified error type for the entire wallet-aggregator-core library.
/// Every public function returns `Result<T, CoreError>`.
///
/// Numeric parse failures are deliberately absent: amounts and prices that
/// cannot be parsed degrade to zero and never surface as errors.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── API / Network ───────────────────────────────────────────────
    #[error("API error ({provider}): {message}")]
    Api {
        provider: String,
        message: String,
    },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    // ── Aggregation ─────────────────────────────────────────────────
    #[error("Empty input: {0}")]
    EmptyInput(String),

    #[error("Stale aggregation cycle: handle belongs to cycle {actual}, current cycle is {expected}")]
    StaleCycle { expected: u64, actual: u64 },

    #[error("Unknown balance source index: {0}")]
    UnknownSource(usize),

    // ── Configuration ───────────────────────────────────────────────
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl CoreError {
    /// Shorthand for a provider-scoped failure.
    pub fn api(provider: impl Into<String>, message: impl Into<String>) -> Self {
        CoreError::Api {
            provider: provider.into(),
            message: message.into(),
        }
    }
}

// ── Conversion helpers (From impls) ─────────────────────────────────

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::Deserialization(e.to_string())
    }
}

impl From<reqwest::Error> for CoreError {
    fn from(e: reqwest::Error) -> Self {
        // reqwest errors embed the full URL; drop the query so API keys stay out of logs.
        let msg = e.to_string();
        let sanitized = if let Some(idx) = msg.find('?') {
            format!("{}?<query redacted>", &msg[..idx])
        } else {
            msg
        };
        CoreError::Network(sanitized)
    }
}
