use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One point of the aggregated historical value series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryPoint {
    pub timestamp: DateTime<Utc>,
    pub value: Decimal,
}

/// Longest history window accepted, in days (10 years).
pub const MAX_HISTORY_DAYS: i64 = 3650;
