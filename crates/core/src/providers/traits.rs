use async_trait::async_trait;
use std::collections::HashMap;

use crate::errors::CoreError;
use crate::models::coin::{CoinDetail, CoinMarket};
use crate::models::price::PricePoint;

/// Trait abstraction for the market-data source.
///
/// The core treats market data strictly as a read-only collaborator: the
/// portfolio, alerts, and import logic never talk HTTP directly. Swapping
/// the API (or injecting a mock in tests) touches only one implementation.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Human-readable name of this provider (for logs/errors).
    fn name(&self) -> &str;

    /// Top coins by market cap, in the given display currency.
    /// Used for the market overview and to build the coin catalog.
    async fn top_coins(&self, vs_currency: &str, limit: usize)
        -> Result<Vec<CoinMarket>, CoreError>;

    /// Current prices for a batch of coin ids, keyed by id.
    /// Ids unknown to the provider are absent from the result.
    async fn prices(
        &self,
        coin_ids: &[String],
        vs_currency: &str,
    ) -> Result<HashMap<String, f64>, CoreError>;

    /// Historical prices for one coin over the last `days` days.
    /// Returns samples sorted by timestamp.
    async fn coin_history(
        &self,
        coin_id: &str,
        vs_currency: &str,
        days: u32,
    ) -> Result<Vec<PricePoint>, CoreError>;

    /// Metadata for one coin, with its current price in the given currency.
    async fn coin_detail(&self, coin_id: &str, vs_currency: &str)
        -> Result<CoinDetail, CoreError>;
}
