use chrono::{DateTime, Duration, Timelike, Utc};
use rust_decimal::Decimal;
use std::collections::BTreeMap;

use crate::models::group::AssetGroup;
use crate::models::history::{HistoryPoint, MAX_HISTORY_DAYS};

/// Spacing between two sparkline samples.
pub const SPARKLINE_INTERVAL_MINUTES: i64 = 30;

/// Rebuilds a portfolio value series from each asset's 7-day sparkline.
///
/// Each sample is weighted by the asset's *current* quantity, so the series
/// assumes holdings were constant over the window. Samples are aligned on a
/// wall-clock anchor: calls within the same half hour give identical output.
pub struct HistoryService;

impl HistoryService {
    pub fn new() -> Self {
        Self
    }

    /// `now` rounded up to the next :00 or :30, always strictly after `now`
    /// (10:00 maps to 10:30, 10:30 to 11:00).
    pub fn anchor(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let secs = now.timestamp();
        let hour_start = secs - secs.rem_euclid(3600);
        let offset = if now.minute() < 30 { 1800 } else { 3600 };
        DateTime::from_timestamp(hour_start + offset, 0).unwrap_or(now)
    }

    /// Timestamp every sample, the newest one landing on `anchor`.
    pub fn sparkline_timeline(
        &self,
        samples: &[Decimal],
        anchor: DateTime<Utc>,
    ) -> Vec<(DateTime<Utc>, Decimal)> {
        let step = Duration::minutes(SPARKLINE_INTERVAL_MINUTES);
        let count = samples.len() as i32;
        samples
            .iter()
            .enumerate()
            .map(|(i, price)| {
                let steps_back = count - 1 - i as i32;
                (anchor - step * steps_back, *price)
            })
            .collect()
    }

    /// Aggregated series over the last `days` days, ascending by timestamp.
    /// `days` is clamped to `0..=MAX_HISTORY_DAYS`.
    pub fn reconstruct_points(
        &self,
        groups: &[AssetGroup],
        days: i64,
        now: DateTime<Utc>,
    ) -> Vec<HistoryPoint> {
        let anchor = self.anchor(now);
        let days = days.clamp(0, MAX_HISTORY_DAYS);
        let window_start = anchor
            .checked_sub_signed(Duration::days(days))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let mut aggregated: BTreeMap<DateTime<Utc>, Decimal> = BTreeMap::new();

        for group in groups {
            let Some(market) = &group.market else {
                continue;
            };
            let quantity = group.total_quantity();
            for (timestamp, price) in self.sparkline_timeline(&market.sparkline_7d, anchor) {
                if timestamp < window_start || timestamp > anchor {
                    continue;
                }
                let value = aggregated.entry(timestamp).or_insert(Decimal::ZERO);
                *value = value.saturating_add(price.saturating_mul(quantity));
            }
        }

        aggregated
            .into_iter()
            .map(|(timestamp, value)| HistoryPoint { timestamp, value })
            .collect()
    }

    /// Same as [`reconstruct_points`](Self::reconstruct_points), values only.
    pub fn reconstruct(&self, groups: &[AssetGroup], days: i64, now: DateTime<Utc>) -> Vec<Decimal> {
        self.reconstruct_points(groups, days, now)
            .into_iter()
            .map(|p| p.value)
            .collect()
    }
}

impl Default for HistoryService {
    fn default() -> Self {
        Self::new()
    }
}
