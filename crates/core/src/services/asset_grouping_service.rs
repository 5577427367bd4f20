use crate::models::balance::RawBalanceRecord;
use crate::models::group::AssetGroup;

/// Logo marker identifying liquid-staking derivative branding.
pub const LIQUID_STAKING_LOGO_MARKER: &str = "stride";

/// Native token of the liquid-staking provider; its own group keeps its branding.
pub const LIQUID_STAKING_NATIVE_SYMBOL: &str = "STRD";

/// Folds raw balance records into canonical cross-chain asset groups.
///
/// Pure: the output depends only on the records passed in. Groups appear in
/// the order their symbol was first seen, records inside a group in arrival
/// order. Grouping never fails; unparseable quantities are dealt with later.
pub struct AssetGroupingService;

impl AssetGroupingService {
    pub fn new() -> Self {
        Self
    }

    /// Group records by case-insensitive symbol. Stored symbols are not rewritten.
    pub fn group(&self, records: &[RawBalanceRecord]) -> Vec<AssetGroup> {
        let mut groups: Vec<AssetGroup> = Vec::new();

        for record in records {
            let key = record.normalized_symbol();
            match groups.iter_mut().find(|g| g.normalized_symbol() == key) {
                Some(group) => {
                    if prefers_incoming_branding(
                        &record.symbol,
                        group.logo_uri.as_deref(),
                        record.logo_uri.as_deref(),
                    ) {
                        group.logo_uri = record.logo_uri.clone();
                        if group.catalog_id.is_none() {
                            group.catalog_id = record.catalog_id.clone();
                        }
                    }
                    group.tokens.push(record.clone());
                }
                None => groups.push(AssetGroup::seeded_from(record.clone())),
            }
        }

        groups
    }
}

impl Default for AssetGroupingService {
    fn default() -> Self {
        Self::new()
    }
}

/// Special case, not a general merge policy: a group currently branded with
/// a liquid-staking derivative logo takes the branding of an incoming record
/// that is not liquid-staking branded. The reverse never happens, and the
/// provider's own native token is exempt.
pub fn prefers_incoming_branding(
    symbol: &str,
    current_logo: Option<&str>,
    incoming_logo: Option<&str>,
) -> bool {
    if symbol.eq_ignore_ascii_case(LIQUID_STAKING_NATIVE_SYMBOL) {
        return false;
    }
    let is_liquid_staking = |logo: Option<&str>| {
        logo.is_some_and(|l| l.to_lowercase().contains(LIQUID_STAKING_LOGO_MARKER))
    };
    is_liquid_staking(current_logo) && !is_liquid_staking(incoming_logo)
}
