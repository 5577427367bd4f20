use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::{debug, warn};

/// Wire marker used by balance sources for "price not known yet".
pub const UNKNOWN_PRICE_MARKER: &str = "-1";

/// Parse a decimal string, degrading to zero on anything unparseable.
///
/// Accepts plain decimals (`"12.5"`) and scientific notation (`"1e-7"`),
/// which some sources emit for dust balances. A well-formed number that does
/// not fit a `Decimal` also becomes zero, with a warning.
pub fn parse_amount(raw: &str) -> Decimal {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Decimal::ZERO;
    }
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .unwrap_or_else(|e| {
            if looks_numeric(trimmed) {
                warn!(raw = trimmed, error = %e, "amount outside decimal range, counted as zero");
            } else {
                debug!(raw = trimmed, "unparseable amount counted as zero");
            }
            Decimal::ZERO
        })
}

fn looks_numeric(s: &str) -> bool {
    s.bytes().any(|b| b.is_ascii_digit())
        && s.bytes()
            .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'e' | b'E' | b'+' | b'-'))
}

/// USD unit price of a token as reported by its source.
///
/// `Unknown` means the source could not price the token and the value has to
/// be resolved from market data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PriceUsd {
    #[default]
    Unknown,
    Quoted(Decimal),
}

impl PriceUsd {
    /// Interpret a source price string. The `"-1"` marker is `Unknown`,
    /// anything else unparseable is a zero quote.
    pub fn parse(raw: &str) -> Self {
        if raw.trim() == UNKNOWN_PRICE_MARKER {
            PriceUsd::Unknown
        } else {
            PriceUsd::Quoted(parse_amount(raw))
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, PriceUsd::Unknown)
    }

    pub fn known(&self) -> Option<Decimal> {
        match self {
            PriceUsd::Unknown => None,
            PriceUsd::Quoted(p) => Some(*p),
        }
    }

    /// Price to use in arithmetic: unknown counts as zero.
    pub fn or_zero(&self) -> Decimal {
        self.known().unwrap_or(Decimal::ZERO)
    }
}

impl From<Decimal> for PriceUsd {
    fn from(value: Decimal) -> Self {
        PriceUsd::Quoted(value)
    }
}

impl From<String> for PriceUsd {
    fn from(value: String) -> Self {
        PriceUsd::parse(&value)
    }
}

impl From<PriceUsd> for String {
    fn from(value: PriceUsd) -> Self {
        value.to_string()
    }
}

impl std::fmt::Display for PriceUsd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PriceUsd::Unknown => write!(f, "{UNKNOWN_PRICE_MARKER}"),
            PriceUsd::Quoted(p) => write!(f, "{p}"),
        }
    }
}

/// One token held on one chain by one address, as emitted by a balance source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawBalanceRecord {
    /// Chain identifier ("1", "10", "HyperCore", ...)
    pub chain_id: String,

    /// Contract address or denomination, in the chain's own format
    pub address: String,

    /// Ticker symbol as reported by the source. Not unique across chains.
    pub symbol: String,

    pub name: String,

    pub decimals: u8,

    pub price_usd: PriceUsd,

    /// Quantity held, as a decimal string
    pub balance: String,

    /// USD value of the held quantity, `None` while unknown
    #[serde(default)]
    pub balance_usd: Option<Decimal>,

    /// External price-catalog identifier (e.g. "usd-coin")
    #[serde(default)]
    pub catalog_id: Option<String>,

    #[serde(default, rename = "logoURI")]
    pub logo_uri: Option<String>,
}

impl RawBalanceRecord {
    pub fn new(
        chain_id: impl Into<String>,
        address: impl Into<String>,
        symbol: impl Into<String>,
        balance: impl Into<String>,
    ) -> Self {
        let symbol = symbol.into();
        Self {
            chain_id: chain_id.into(),
            address: address.into(),
            name: symbol.clone(),
            symbol,
            decimals: 18,
            price_usd: PriceUsd::Unknown,
            balance: balance.into(),
            balance_usd: None,
            catalog_id: None,
            logo_uri: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_decimals(mut self, decimals: u8) -> Self {
        self.decimals = decimals;
        self
    }

    /// Set the source price; the USD value follows from it when known.
    pub fn with_price(mut self, price: PriceUsd) -> Self {
        self.price_usd = price;
        self.balance_usd = price
            .known()
            .map(|p| p.saturating_mul(self.quantity()));
        self
    }

    pub fn with_catalog_id(mut self, id: impl Into<String>) -> Self {
        self.catalog_id = Some(id.into());
        self
    }

    pub fn with_logo(mut self, uri: impl Into<String>) -> Self {
        self.logo_uri = Some(uri.into());
        self
    }

    /// Held quantity; unparseable balances count as zero.
    pub fn quantity(&self) -> Decimal {
        parse_amount(&self.balance)
    }

    /// USD value; unknown counts as zero.
    pub fn value_usd(&self) -> Decimal {
        self.balance_usd.unwrap_or(Decimal::ZERO)
    }

    /// Symbol key used for cross-chain grouping.
    pub fn normalized_symbol(&self) -> String {
        self.symbol.to_lowercase()
    }
}
