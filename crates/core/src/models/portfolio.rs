use serde::{Deserialize, Serialize};

use super::coin::CoinInfo;

/// A holding of a specific coin with a quantity.
///
/// Quantities are always non-negative, finite, and carry at most 8 decimal
/// places (enforced by `PortfolioService` on every mutation path).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioAsset {
    pub coin: CoinInfo,
    pub quantity: f64,
}

/// The in-memory portfolio: a list of holdings, unique by coin id.
///
/// Mutated only through `PortfolioService`; the order of entries is
/// insertion order, which is also the display order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Portfolio {
    pub assets: Vec<PortfolioAsset>,
}

impl Portfolio {
    pub fn new() -> Self {
        Self::default()
    }

    /// Find a holding by coin id.
    pub fn get(&self, coin_id: &str) -> Option<&PortfolioAsset> {
        self.assets.iter().find(|a| a.coin.id == coin_id)
    }

    pub fn contains(&self, coin_id: &str) -> bool {
        self.get(coin_id).is_some()
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}
