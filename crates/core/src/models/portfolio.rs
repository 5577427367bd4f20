use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Lending-market position reported for one market (e.g. one pool on one chain).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LendingPosition {
    pub market: String,
    pub total_borrows_usd: Decimal,
    pub total_collateral_usd: Decimal,
    pub total_liquidity_usd: Decimal,
}

/// Lending totals summed across every reporting market. All zero until data arrives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LendingTotals {
    pub borrowed_usd: Decimal,
    pub collateral_usd: Decimal,
    pub liquidity_usd: Decimal,
}

impl LendingTotals {
    pub fn from_positions(positions: &[LendingPosition]) -> Self {
        positions.iter().fold(Self::default(), |acc, p| Self {
            borrowed_usd: acc.borrowed_usd.saturating_add(p.total_borrows_usd),
            collateral_usd: acc.collateral_usd.saturating_add(p.total_collateral_usd),
            liquidity_usd: acc.liquidity_usd.saturating_add(p.total_liquidity_usd),
        })
    }
}

/// Derived wallet-level view. Recomputed from its inputs, never stored on its own.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSnapshot {
    /// Sum of strictly positive group values
    pub total_worth_usd: Decimal,

    pub total_borrowed_usd: Decimal,
    pub total_collateral_usd: Decimal,
    pub total_liquidity_usd: Decimal,

    /// Percentages of total worth; 0 when worth is 0
    pub borrowed_pct: Decimal,
    pub collateral_pct: Decimal,
    pub liquidity_pct: Decimal,
}
