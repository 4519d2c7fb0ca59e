use std::sync::Arc;

use crate::errors::CoreError;
use crate::models::alert::PriceAlert;
use crate::models::coin::{CoinCatalog, CoinInfo};
use crate::models::portfolio::{Portfolio, PortfolioAsset};
use crate::models::settings::Settings;
use crate::services::import_service::ImportRecord;
use crate::services::portfolio_service::truncate_to_8_decimals;

use super::store::KeyValueStore;

/// Storage key for the portfolio holdings, as an array of `{asset, qty}`.
pub const PORTFOLIO_KEY: &str = "crypto_portfolio";

/// Storage key for the alerts, as an array of `PriceAlert` objects.
pub const ALERTS_KEY: &str = "crypto_price_alerts";

/// Storage key for user settings.
pub const SETTINGS_KEY: &str = "app_settings";

/// High-level storage operations: (de)serializing domain state to/from the
/// key-value store under fixed keys.
///
/// The portfolio wire shape stores only the coin id and the quantity;
/// display metadata is re-resolved against the coin catalog after load.
#[derive(Clone)]
pub struct StorageManager {
    store: Arc<dyn KeyValueStore>,
}

impl StorageManager {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    // ── Portfolio ───────────────────────────────────────────────────

    /// Load the persisted portfolio. Coins not present in `catalog` get
    /// placeholder metadata (id only) until the catalog is synced.
    /// A missing key is an empty portfolio; a corrupt value is an error.
    pub fn load_portfolio(&self, catalog: &CoinCatalog) -> Result<Portfolio, CoreError> {
        let Some(raw) = self.store.get(PORTFOLIO_KEY)? else {
            return Ok(Portfolio::new());
        };

        let rows: Vec<ImportRecord> = serde_json::from_str(&raw).map_err(|e| {
            CoreError::Deserialization(format!("stored portfolio is corrupt: {e}"))
        })?;

        // Stored quantities obey the same invariant as every mutation path:
        // finite, non-negative, at most 8 decimal places. A hand-edited file
        // that breaks it is corrupt, not a holding.
        let assets = rows
            .into_iter()
            .map(|row| {
                if !row.qty.is_finite() || row.qty < 0.0 {
                    return Err(CoreError::Deserialization(format!(
                        "stored portfolio is corrupt: invalid quantity {} for '{}'",
                        row.qty, row.asset
                    )));
                }
                let coin = catalog
                    .get(&row.asset)
                    .cloned()
                    .unwrap_or_else(|| CoinInfo::placeholder(&row.asset));
                Ok(PortfolioAsset {
                    coin,
                    quantity: truncate_to_8_decimals(row.qty),
                })
            })
            .collect::<Result<Vec<_>, CoreError>>()?;

        Ok(Portfolio { assets })
    }

    /// Persist the full portfolio as `[{asset, qty}]` rows.
    pub fn save_portfolio(&self, portfolio: &Portfolio) -> Result<(), CoreError> {
        let rows: Vec<ImportRecord> = portfolio
            .assets
            .iter()
            .map(|a| ImportRecord {
                asset: a.coin.id.clone(),
                qty: a.quantity,
            })
            .collect();
        let json = serde_json::to_string(&rows)
            .map_err(|e| CoreError::Serialization(format!("failed to serialize portfolio: {e}")))?;
        self.store.set(PORTFOLIO_KEY, &json)
    }

    // ── Alerts ──────────────────────────────────────────────────────

    pub fn load_alerts(&self) -> Result<Vec<PriceAlert>, CoreError> {
        let Some(raw) = self.store.get(ALERTS_KEY)? else {
            return Ok(Vec::new());
        };
        serde_json::from_str(&raw)
            .map_err(|e| CoreError::Deserialization(format!("stored alerts are corrupt: {e}")))
    }

    pub fn save_alerts(&self, alerts: &[PriceAlert]) -> Result<(), CoreError> {
        let json = serde_json::to_string(alerts)
            .map_err(|e| CoreError::Serialization(format!("failed to serialize alerts: {e}")))?;
        self.store.set(ALERTS_KEY, &json)
    }

    // ── Settings ────────────────────────────────────────────────────

    /// Load settings, falling back to defaults when nothing is stored.
    pub fn load_settings(&self) -> Result<Settings, CoreError> {
        let Some(raw) = self.store.get(SETTINGS_KEY)? else {
            return Ok(Settings::default());
        };
        serde_json::from_str(&raw)
            .map_err(|e| CoreError::Deserialization(format!("stored settings are corrupt: {e}")))
    }

    pub fn save_settings(&self, settings: &Settings) -> Result<(), CoreError> {
        let json = serde_json::to_string(settings)
            .map_err(|e| CoreError::Serialization(format!("failed to serialize settings: {e}")))?;
        self.store.set(SETTINGS_KEY, &json)
    }
}
