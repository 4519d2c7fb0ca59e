use crate::errors::CoreError;
use crate::models::coin::CoinInfo;
use crate::models::portfolio::{Portfolio, PortfolioAsset};
use crate::models::price::PriceMap;

/// Truncate a quantity to 8 decimal places (satoshi granularity).
/// Quantities never carry more precision than this.
pub fn truncate_to_8_decimals(value: f64) -> f64 {
    (value * 1e8).floor() / 1e8
}

/// Manages portfolio holdings: add, remove, update, valuation.
///
/// Pure business logic — no I/O, no API calls. Easy to test.
pub struct PortfolioService;

impl PortfolioService {
    pub fn new() -> Self {
        Self
    }

    /// Add a holding. If the coin is already held, the quantities are
    /// summed (merge-by-id); otherwise a new entry is appended.
    pub fn add_asset(
        &self,
        portfolio: &mut Portfolio,
        coin: CoinInfo,
        quantity: f64,
    ) -> Result<(), CoreError> {
        let quantity = Self::validate_quantity(quantity)?;
        if quantity == 0.0 {
            return Err(CoreError::Validation(
                "Quantity to add must be greater than zero".into(),
            ));
        }

        if let Some(existing) = portfolio.assets.iter_mut().find(|a| a.coin.id == coin.id) {
            existing.quantity = truncate_to_8_decimals(existing.quantity + quantity);
        } else {
            portfolio.assets.push(PortfolioAsset { coin, quantity });
        }
        Ok(())
    }

    /// Remove a holding by coin id. Idempotent: removing an unknown id
    /// leaves the portfolio unchanged and returns `false`.
    pub fn remove_asset(&self, portfolio: &mut Portfolio, coin_id: &str) -> bool {
        let before = portfolio.assets.len();
        portfolio.assets.retain(|a| a.coin.id != coin_id);
        portfolio.assets.len() != before
    }

    /// Replace the quantity of an existing holding.
    ///
    /// Returns `Ok(false)` without touching the portfolio if the coin is
    /// not held — callers must not persist in that case.
    pub fn update_quantity(
        &self,
        portfolio: &mut Portfolio,
        coin_id: &str,
        new_quantity: f64,
    ) -> Result<bool, CoreError> {
        let new_quantity = Self::validate_quantity(new_quantity)?;
        match portfolio.assets.iter_mut().find(|a| a.coin.id == coin_id) {
            Some(asset) => {
                asset.quantity = new_quantity;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Clear all holdings.
    pub fn reset(&self, portfolio: &mut Portfolio) {
        portfolio.assets.clear();
    }

    /// Total portfolio value: Σ(quantity × price) over holdings whose coin
    /// has a price in the snapshot. Unpriced holdings contribute zero.
    pub fn total_value(&self, portfolio: &Portfolio, prices: &PriceMap) -> f64 {
        portfolio
            .assets
            .iter()
            .filter_map(|a| prices.get(&a.coin.id).map(|p| a.quantity * p))
            .sum()
    }

    /// Validate and normalize a quantity: must be finite and non-negative;
    /// truncated to 8 decimal places.
    fn validate_quantity(quantity: f64) -> Result<f64, CoreError> {
        if !quantity.is_finite() {
            return Err(CoreError::Validation(format!(
                "Quantity must be a finite number, got {quantity}"
            )));
        }
        if quantity < 0.0 {
            return Err(CoreError::Validation(format!(
                "Quantity must not be negative, got {quantity}"
            )));
        }
        Ok(truncate_to_8_decimals(quantity))
    }
}

impl Default for PortfolioService {
    fn default() -> Self {
        Self::new()
    }
}
