use serde::{Deserialize, Serialize};

use crate::errors::CoreError;
use crate::models::coin::CoinCatalog;
use crate::models::portfolio::{Portfolio, PortfolioAsset};
use crate::services::portfolio_service::truncate_to_8_decimals;

/// One row of a portfolio export file. `asset` is a coin id or ticker
/// symbol; it is resolved against the coin catalog on import.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportRecord {
    pub asset: String,
    pub qty: f64,
}

/// How imported rows are reconciled against the existing portfolio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportMode {
    /// Sum imported quantities into existing holdings, insert the rest.
    Merge,
    /// Discard current holdings; install only the resolvable imported rows.
    Replace,
}

/// Outcome of an import, for one consolidated user notification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    /// Rows that created a new holding
    pub added: usize,
    /// Rows folded into an existing holding
    pub updated: usize,
    /// Rows whose asset could not be resolved against the catalog
    pub skipped: usize,
}

/// Parses export files and reconciles them into the portfolio.
pub struct ImportService;

impl ImportService {
    pub fn new() -> Self {
        Self
    }

    /// Parse an export file. Fails fast on malformed JSON, wrong shape, or
    /// invalid quantities — a file that fails here is never partially applied.
    pub fn parse(&self, json: &str) -> Result<Vec<ImportRecord>, CoreError> {
        let records: Vec<ImportRecord> = serde_json::from_str(json)
            .map_err(|e| CoreError::InvalidImport(format!("not a valid portfolio export: {e}")))?;

        for record in &records {
            if record.asset.trim().is_empty() {
                return Err(CoreError::InvalidImport(
                    "row with empty asset reference".into(),
                ));
            }
            if !record.qty.is_finite() || record.qty < 0.0 {
                return Err(CoreError::InvalidImport(format!(
                    "invalid quantity {} for asset '{}'",
                    record.qty, record.asset
                )));
            }
        }

        Ok(records)
    }

    /// Reconcile parsed rows into the portfolio.
    ///
    /// Rows are processed in file order. A row whose asset resolves to a
    /// coin already present (including one installed by an earlier row of
    /// the same file) counts as `updated` and its quantity is summed;
    /// otherwise it counts as `added`. Unresolvable rows count as `skipped`
    /// and are excluded. In `Replace` mode the current holdings are
    /// discarded first.
    pub fn reconcile(
        &self,
        portfolio: &mut Portfolio,
        records: &[ImportRecord],
        catalog: &CoinCatalog,
        mode: ImportMode,
    ) -> ImportSummary {
        if mode == ImportMode::Replace {
            portfolio.assets.clear();
        }

        let mut summary = ImportSummary::default();

        for record in records {
            let Some(coin) = catalog.resolve(&record.asset) else {
                summary.skipped += 1;
                continue;
            };

            let qty = truncate_to_8_decimals(record.qty);
            if let Some(existing) = portfolio
                .assets
                .iter_mut()
                .find(|a| a.coin.id == coin.id)
            {
                existing.quantity = truncate_to_8_decimals(existing.quantity + qty);
                summary.updated += 1;
            } else {
                portfolio.assets.push(PortfolioAsset {
                    coin: coin.clone(),
                    quantity: qty,
                });
                summary.added += 1;
            }
        }

        summary
    }

    /// Export the portfolio as pretty-printed JSON in the same row shape
    /// that `parse` accepts.
    pub fn export(&self, portfolio: &Portfolio) -> Result<String, CoreError> {
        let rows: Vec<ImportRecord> = portfolio
            .assets
            .iter()
            .map(|a| ImportRecord {
                asset: a.coin.id.clone(),
                qty: a.quantity,
            })
            .collect();
        serde_json::to_string_pretty(&rows)
            .map_err(|e| CoreError::Serialization(format!("failed to serialize export: {e}")))
    }
}

impl Default for ImportService {
    fn default() -> Self {
        Self::new()
    }
}
