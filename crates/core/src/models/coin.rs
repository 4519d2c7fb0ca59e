use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Identifying information for a tracked coin.
///
/// **Equality and hashing** are based solely on `id`, NOT on the display
/// fields. This ensures consistent lookups regardless of how the coin
/// metadata was populated (catalog fetch vs. storage placeholder).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoinInfo {
    /// Market-data API identifier, lowercased (e.g., "bitcoin", "ethereum")
    pub id: String,

    /// Ticker symbol, uppercased (e.g., "BTC", "ETH")
    pub symbol: String,

    /// Human-readable name (e.g., "Bitcoin", "Ethereum")
    pub name: String,

    /// URL of the coin's logo, if known
    #[serde(default)]
    pub image: Option<String>,

    /// Last known price in the display currency, if any.
    /// Best-effort snapshot data, never authoritative.
    #[serde(default)]
    pub current_price: Option<f64>,
}

impl PartialEq for CoinInfo {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for CoinInfo {}

impl std::hash::Hash for CoinInfo {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl CoinInfo {
    pub fn new(id: impl Into<String>, symbol: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into().to_lowercase(),
            symbol: symbol.into().to_uppercase(),
            name: name.into(),
            image: None,
            current_price: None,
        }
    }

    /// Placeholder used when hydrating from storage before the catalog
    /// has been fetched: only the id is known.
    pub fn placeholder(id: impl Into<String>) -> Self {
        let id = id.into().to_lowercase();
        Self {
            symbol: id.to_uppercase(),
            name: id.clone(),
            id,
            image: None,
            current_price: None,
        }
    }
}

/// A coin entry as listed by the market overview (top coins by market cap).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoinMarket {
    pub id: String,
    pub symbol: String,
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub current_price: Option<f64>,
    #[serde(default)]
    pub market_cap: Option<f64>,
    #[serde(default)]
    pub price_change_percentage_24h: Option<f64>,
}

impl CoinMarket {
    pub fn info(&self) -> CoinInfo {
        CoinInfo {
            id: self.id.clone(),
            symbol: self.symbol.to_uppercase(),
            name: self.name.clone(),
            image: self.image.clone(),
            current_price: self.current_price,
        }
    }
}

/// Per-coin metadata from the market-data API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoinDetail {
    pub id: String,
    pub symbol: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub current_price: Option<f64>,
}

/// Catalog of known coins, used to resolve imported rows against real ids.
///
/// Built from the market-data provider's top-coins listing. Lookups go by
/// id first, then by ticker symbol (both case-insensitive).
#[derive(Debug, Clone, Default)]
pub struct CoinCatalog {
    by_id: HashMap<String, CoinInfo>,
    by_symbol: HashMap<String, String>,
}

impl CoinCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_markets(markets: &[CoinMarket]) -> Self {
        let mut catalog = Self::new();
        for market in markets {
            catalog.insert(market.info());
        }
        catalog
    }

    /// Insert a coin. The first coin seen for a given symbol wins the
    /// symbol index (markets are ordered by market cap, so "BTC" resolves
    /// to bitcoin, not to a knock-off token sharing the ticker).
    pub fn insert(&mut self, coin: CoinInfo) {
        let symbol_key = coin.symbol.to_uppercase();
        self.by_symbol.entry(symbol_key).or_insert_with(|| coin.id.clone());
        self.by_id.insert(coin.id.clone(), coin);
    }

    /// Resolve an imported asset reference (coin id or ticker symbol)
    /// to a known coin. Returns `None` if the reference is unknown.
    pub fn resolve(&self, reference: &str) -> Option<&CoinInfo> {
        let trimmed = reference.trim();
        if let Some(coin) = self.by_id.get(&trimmed.to_lowercase()) {
            return Some(coin);
        }
        self.by_symbol
            .get(&trimmed.to_uppercase())
            .and_then(|id| self.by_id.get(id))
    }

    pub fn get(&self, id: &str) -> Option<&CoinInfo> {
        self.by_id.get(&id.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}
