use rust_decimal::Decimal;

use crate::models::group::AssetGroup;
use crate::models::portfolio::{LendingTotals, PortfolioSnapshot};

/// Computes wallet-level totals and ratios from valued asset groups.
///
/// Pure business logic, no I/O.
pub struct PortfolioService;

impl PortfolioService {
    pub fn new() -> Self {
        Self
    }

    /// Total worth: sum of group values that are strictly positive.
    /// Non-positive values are skipped here only; the groups keep them.
    pub fn total_worth(&self, groups: &[AssetGroup]) -> Decimal {
        groups
            .iter()
            .map(AssetGroup::total_value)
            .filter(|v| *v > Decimal::ZERO)
            .fold(Decimal::ZERO, Decimal::saturating_add)
    }

    pub fn summarize(&self, groups: &[AssetGroup], lending: &LendingTotals) -> PortfolioSnapshot {
        let worth = self.total_worth(groups);
        PortfolioSnapshot {
            total_worth_usd: worth,
            total_borrowed_usd: lending.borrowed_usd,
            total_collateral_usd: lending.collateral_usd,
            total_liquidity_usd: lending.liquidity_usd,
            borrowed_pct: ratio_pct(lending.borrowed_usd, worth),
            collateral_pct: ratio_pct(lending.collateral_usd, worth),
            liquidity_pct: ratio_pct(lending.liquidity_usd, worth),
        }
    }

    /// Share of total worth held in one group, as a percentage.
    pub fn allocation_pct(&self, group: &AssetGroup, total_worth: Decimal) -> Decimal {
        ratio_pct(group.total_value(), total_worth)
    }
}

impl Default for PortfolioService {
    fn default() -> Self {
        Self::new()
    }
}

/// `part / whole × 100`, or 0 when `whole` is 0.
pub fn ratio_pct(part: Decimal, whole: Decimal) -> Decimal {
    if whole.is_zero() {
        return Decimal::ZERO;
    }
    part.checked_div(whole)
        .and_then(|r| r.checked_mul(Decimal::ONE_HUNDRED))
        .unwrap_or(Decimal::ZERO)
}
