use std::sync::Arc;

use tokio::sync::RwLock;

use crate::errors::CoreError;
use crate::models::price::PriceMap;
use crate::providers::traits::MarketDataProvider;

/// Refreshes the in-memory price snapshot from the market-data provider.
///
/// The snapshot is best-effort: a failed refresh leaves the previous
/// values in place and the error is surfaced to the caller, whose own
/// retry action (or the next poll tick) is the only retry policy.
///
/// **Note on precision**: prices are `f64` throughout, which is sufficient
/// for display and alert-threshold comparison.
pub struct PriceService {
    provider: Arc<dyn MarketDataProvider>,
}

impl PriceService {
    pub fn new(provider: Arc<dyn MarketDataProvider>) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &Arc<dyn MarketDataProvider> {
        &self.provider
    }

    /// Fetch current prices for `coin_ids` and merge them into `prices`.
    /// Returns the number of prices received. Ids the provider does not
    /// know are simply absent from the response — the snapshot keeps
    /// whatever it had for them.
    ///
    /// The network fetch happens before the lock is taken; the write lock
    /// is held only for the in-memory merge, so snapshot readers are never
    /// stalled behind a slow provider.
    pub async fn refresh(
        &self,
        prices: &RwLock<PriceMap>,
        coin_ids: &[String],
        vs_currency: &str,
    ) -> Result<usize, CoreError> {
        if coin_ids.is_empty() {
            return Ok(0);
        }

        let fresh = self.provider.prices(coin_ids, vs_currency).await?;
        let count = fresh.len();
        prices.write().await.apply(fresh);
        Ok(count)
    }
}
