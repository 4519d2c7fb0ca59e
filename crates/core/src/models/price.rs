use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single historical price sample (timestamp → price), as returned by the
/// market-data provider's per-coin history endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
}

/// Ephemeral snapshot of current prices, keyed by coin id.
///
/// Refreshed by `PriceService` from the market-data provider. Never
/// persisted — it is best-effort data, and a stale snapshot is acceptable
/// (a failed refresh simply leaves the previous values in place).
#[derive(Debug, Clone, Default)]
pub struct PriceMap {
    prices: HashMap<String, f64>,
    refreshed_at: Option<DateTime<Utc>>,
}

impl PriceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current price for a coin id, or `None` if unknown.
    /// Non-finite values are treated as missing.
    pub fn get(&self, coin_id: &str) -> Option<f64> {
        self.prices
            .get(coin_id)
            .copied()
            .filter(|p| p.is_finite())
    }

    pub fn set(&mut self, coin_id: impl Into<String>, price: f64) {
        self.prices.insert(coin_id.into(), price);
    }

    /// Merge a batch of freshly fetched prices into the snapshot and stamp
    /// the refresh time. Ids absent from `fresh` keep their previous value.
    pub fn apply(&mut self, fresh: HashMap<String, f64>) {
        self.prices.extend(fresh);
        self.refreshed_at = Some(Utc::now());
    }

    pub fn refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.refreshed_at
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}
