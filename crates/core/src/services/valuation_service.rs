use crate::models::balance::{PriceUsd, RawBalanceRecord};
use crate::models::group::AssetGroup;
use crate::models::market::MarketSnapshot;

/// Joins asset groups with the latest market snapshots.
///
/// Pure and deterministic: the same groups and snapshots always produce the
/// same valued groups, in the same order (largest USD value first, ties in
/// first-seen order).
pub struct ValuationService;

impl ValuationService {
    pub fn new() -> Self {
        Self
    }

    /// Value every group and sort by total USD value, descending.
    pub fn value(&self, groups: &[AssetGroup], snapshots: &[MarketSnapshot]) -> Vec<AssetGroup> {
        let mut valued: Vec<AssetGroup> = groups
            .iter()
            .map(|g| self.value_group(g, snapshots))
            .collect();
        valued.sort_by(|a, b| b.total_value().cmp(&a.total_value()));
        valued
    }

    /// Value one group.
    ///
    /// The group value is the sum of its already-valued records, not
    /// quantity × group price: records on different chains may carry
    /// different source prices.
    pub fn value_group(&self, group: &AssetGroup, snapshots: &[MarketSnapshot]) -> AssetGroup {
        let tokens: Vec<RawBalanceRecord> = group
            .tokens
            .iter()
            .map(|t| self.value_record(t, snapshots))
            .collect();

        let snapshot = find_snapshot(group.catalog_id.as_deref(), &group.symbol, snapshots);

        let price_usd = match snapshot {
            Some(s) => PriceUsd::Quoted(s.price_usd),
            None => tokens
                .first()
                .map(|t| t.price_usd)
                .filter(|p| !p.is_unknown())
                .unwrap_or(group.price_usd),
        };

        AssetGroup {
            symbol: group.symbol.clone(),
            name: group.name.clone(),
            logo_uri: snapshot
                .and_then(|s| s.logo_uri.clone())
                .or_else(|| group.logo_uri.clone()),
            catalog_id: group
                .catalog_id
                .clone()
                .or_else(|| snapshot.map(|s| s.catalog_id.clone())),
            tokens,
            price_usd,
            market: snapshot.cloned(),
        }
    }

    /// Value one record: resolve an unknown price from market data (zero if
    /// nothing matches) and recompute its USD value.
    pub fn value_record(
        &self,
        record: &RawBalanceRecord,
        snapshots: &[MarketSnapshot],
    ) -> RawBalanceRecord {
        let mut record = record.clone();
        let snapshot = find_snapshot(record.catalog_id.as_deref(), &record.symbol, snapshots);

        if record.price_usd.is_unknown() {
            if let Some(s) = snapshot {
                record.price_usd = PriceUsd::Quoted(s.price_usd);
            }
        }
        record.balance_usd = Some(record.price_usd.or_zero().saturating_mul(record.quantity()));

        if let Some(s) = snapshot {
            if record.logo_uri.is_none() {
                record.logo_uri = s.logo_uri.clone();
            }
            if record.catalog_id.is_none() {
                record.catalog_id = Some(s.catalog_id.clone());
            }
        }
        record
    }
}

impl Default for ValuationService {
    fn default() -> Self {
        Self::new()
    }
}

/// Find the snapshot for an asset: by catalog id when one is known,
/// otherwise by case-insensitive symbol. A known id is authoritative.
pub fn find_snapshot<'a>(
    catalog_id: Option<&str>,
    symbol: &str,
    snapshots: &'a [MarketSnapshot],
) -> Option<&'a MarketSnapshot> {
    match catalog_id {
        Some(id) => snapshots.iter().find(|s| s.catalog_id == id),
        None => {
            let lower = symbol.to_lowercase();
            snapshots.iter().find(|s| s.symbol.to_lowercase() == lower)
        }
    }
}
