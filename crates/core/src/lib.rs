pub mod errors;
pub mod models;
pub mod notify;
pub mod providers;
pub mod services;
pub mod storage;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, RwLock};
use tracing::warn;
use uuid::Uuid;

use errors::CoreError;
use models::{
    alert::{AlertCondition, PriceAlert, TriggeredAlert},
    coin::{CoinCatalog, CoinDetail, CoinInfo, CoinMarket},
    portfolio::{Portfolio, PortfolioAsset},
    price::{PriceMap, PricePoint},
    settings::Settings,
};
use notify::Notifier;
use providers::traits::MarketDataProvider;
use services::{
    alert_poller::{spawn_alert_poller, AlertPollerHandle},
    alert_service::AlertService,
    import_service::{ImportMode, ImportService, ImportSummary},
    portfolio_service::PortfolioService,
    price_service::PriceService,
};
use storage::{manager::StorageManager, store::KeyValueStore};

/// Main entry point for the Coinfolio core library.
///
/// Holds the portfolio, alert, and price state and all services needed to
/// operate on it. Collaborators (market-data provider, key-value store)
/// are injected — no process-wide singletons.
///
/// State lives behind `tokio::sync::RwLock` so the alert poller task can
/// share it; every mutation happens under a single write lock and is then
/// mirrored to storage best-effort.
#[must_use]
pub struct PortfolioTracker {
    portfolio: Arc<RwLock<Portfolio>>,
    alerts: Arc<RwLock<Vec<PriceAlert>>>,
    prices: Arc<RwLock<PriceMap>>,
    catalog: Arc<RwLock<CoinCatalog>>,
    settings: RwLock<Settings>,
    storage: StorageManager,
    portfolio_service: PortfolioService,
    alert_service: AlertService,
    import_service: ImportService,
    price_service: PriceService,
}

impl std::fmt::Debug for PortfolioTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PortfolioTracker").finish_non_exhaustive()
    }
}

impl PortfolioTracker {
    /// Open a tracker backed by the given provider and store.
    ///
    /// Hydrates portfolio, alerts, and settings from storage before
    /// returning, so no persistence write can ever precede the initial
    /// load. Corrupt stored values are logged and replaced by empty
    /// state — storage is an enhancement, not the source of truth.
    pub fn open(
        provider: Arc<dyn MarketDataProvider>,
        store: Arc<dyn KeyValueStore>,
    ) -> Self {
        let storage = StorageManager::new(store);

        let settings = storage.load_settings().unwrap_or_else(|e| {
            warn!("ignoring stored settings: {e}");
            Settings::default()
        });
        let portfolio = storage
            .load_portfolio(&CoinCatalog::new())
            .unwrap_or_else(|e| {
                warn!("ignoring stored portfolio: {e}");
                Portfolio::new()
            });
        let alerts = storage.load_alerts().unwrap_or_else(|e| {
            warn!("ignoring stored alerts: {e}");
            Vec::new()
        });

        Self {
            portfolio: Arc::new(RwLock::new(portfolio)),
            alerts: Arc::new(RwLock::new(alerts)),
            prices: Arc::new(RwLock::new(PriceMap::new())),
            catalog: Arc::new(RwLock::new(CoinCatalog::new())),
            settings: RwLock::new(settings),
            price_service: PriceService::new(provider),
            storage,
            portfolio_service: PortfolioService::new(),
            alert_service: AlertService::new(),
            import_service: ImportService::new(),
        }
    }

    // ── Market Data & Catalog ───────────────────────────────────────

    /// Fetch the top coins by market cap, rebuild the coin catalog from
    /// them, refresh the price snapshot with their current prices, and
    /// backfill metadata for holdings hydrated from storage.
    pub async fn sync_catalog(&self, limit: usize) -> Result<Vec<CoinMarket>, CoreError> {
        let vs = self.settings.read().await.vs_currency.clone();
        let markets = self.price_service.provider().top_coins(&vs, limit).await?;

        let catalog = CoinCatalog::from_markets(&markets);
        {
            let mut prices = self.prices.write().await;
            for market in &markets {
                if let Some(price) = market.current_price {
                    prices.set(market.id.clone(), price);
                }
            }
        }
        {
            let mut portfolio = self.portfolio.write().await;
            for asset in &mut portfolio.assets {
                if let Some(known) = catalog.get(&asset.coin.id) {
                    asset.coin = known.clone();
                }
            }
        }
        *self.catalog.write().await = catalog;

        Ok(markets)
    }

    /// Refresh current prices for every coin referenced by the portfolio
    /// or an active alert. Returns the number of prices received; on
    /// failure the previous snapshot stays in place.
    pub async fn refresh_prices(&self) -> Result<usize, CoreError> {
        let mut ids: Vec<String> = {
            let portfolio = self.portfolio.read().await;
            portfolio.assets.iter().map(|a| a.coin.id.clone()).collect()
        };
        {
            let alerts = self.alerts.read().await;
            ids.extend(
                alerts
                    .iter()
                    .filter(|a| a.is_active())
                    .map(|a| a.coin_id.clone()),
            );
        }
        ids.sort();
        ids.dedup();

        let vs = self.settings.read().await.vs_currency.clone();
        self.price_service.refresh(&self.prices, &ids, &vs).await
    }

    /// Historical prices for one coin over the last `days` days.
    pub async fn coin_history(
        &self,
        coin_id: &str,
        days: u32,
    ) -> Result<Vec<PricePoint>, CoreError> {
        let vs = self.settings.read().await.vs_currency.clone();
        self.price_service
            .provider()
            .coin_history(coin_id, &vs, days)
            .await
    }

    /// Metadata for one coin.
    pub async fn coin_detail(&self, coin_id: &str) -> Result<CoinDetail, CoreError> {
        let vs = self.settings.read().await.vs_currency.clone();
        self.price_service.provider().coin_detail(coin_id, &vs).await
    }

    /// A snapshot of the current price for one coin, if known.
    pub async fn price_of(&self, coin_id: &str) -> Option<f64> {
        self.prices.read().await.get(coin_id)
    }

    // ── Portfolio ───────────────────────────────────────────────────

    /// Add a holding. Repeated adds of the same coin sum the quantities.
    pub async fn add_asset(&self, coin: CoinInfo, quantity: f64) -> Result<(), CoreError> {
        let mut portfolio = self.portfolio.write().await;
        self.portfolio_service
            .add_asset(&mut portfolio, coin, quantity)?;
        self.persist_portfolio(&portfolio);
        Ok(())
    }

    /// Remove a holding by coin id. Idempotent; returns whether anything
    /// was removed. The (possibly empty) result is persisted either way.
    pub async fn remove_asset(&self, coin_id: &str) -> bool {
        let mut portfolio = self.portfolio.write().await;
        let removed = self.portfolio_service.remove_asset(&mut portfolio, coin_id);
        self.persist_portfolio(&portfolio);
        removed
    }

    /// Replace the quantity of an existing holding. A strict no-op —
    /// including no persistence write — when the coin is not held.
    pub async fn update_quantity(&self, coin_id: &str, quantity: f64) -> Result<bool, CoreError> {
        let mut portfolio = self.portfolio.write().await;
        let updated = self
            .portfolio_service
            .update_quantity(&mut portfolio, coin_id, quantity)?;
        if updated {
            self.persist_portfolio(&portfolio);
        }
        Ok(updated)
    }

    /// Clear all holdings and persist the empty list.
    pub async fn reset_portfolio(&self) {
        let mut portfolio = self.portfolio.write().await;
        self.portfolio_service.reset(&mut portfolio);
        self.persist_portfolio(&portfolio);
    }

    /// Current holdings, in display order.
    pub async fn assets(&self) -> Vec<PortfolioAsset> {
        self.portfolio.read().await.assets.clone()
    }

    /// Σ(quantity × price) over priced holdings; unpriced contribute zero.
    pub async fn total_value(&self) -> f64 {
        let portfolio = self.portfolio.read().await;
        let prices = self.prices.read().await;
        self.portfolio_service.total_value(&portfolio, &prices)
    }

    // ── Alerts ──────────────────────────────────────────────────────

    /// Create an active alert. Fails once 50 alerts exist.
    pub async fn create_alert(
        &self,
        coin: &CoinInfo,
        condition: AlertCondition,
        target_price: f64,
    ) -> Result<PriceAlert, CoreError> {
        let mut alerts = self.alerts.write().await;
        let alert = self
            .alert_service
            .create_alert(&mut alerts, coin, condition, target_price)?;
        self.persist_alerts(&alerts);
        Ok(alert)
    }

    pub async fn delete_alert(&self, id: Uuid) -> Result<(), CoreError> {
        let mut alerts = self.alerts.write().await;
        self.alert_service.delete_alert(&mut alerts, id)?;
        self.persist_alerts(&alerts);
        Ok(())
    }

    pub async fn mute_alert(&self, id: Uuid) -> Result<(), CoreError> {
        let mut alerts = self.alerts.write().await;
        self.alert_service.mute_alert(&mut alerts, id)?;
        self.persist_alerts(&alerts);
        Ok(())
    }

    pub async fn reactivate_alert(&self, id: Uuid) -> Result<(), CoreError> {
        let mut alerts = self.alerts.write().await;
        self.alert_service.reactivate_alert(&mut alerts, id)?;
        self.persist_alerts(&alerts);
        Ok(())
    }

    pub async fn alerts(&self) -> Vec<PriceAlert> {
        self.alerts.read().await.clone()
    }

    /// Evaluate alerts once against the current price snapshot, outside
    /// the poller. Fired alerts transition and are persisted.
    pub async fn evaluate_alerts(&self) -> Vec<TriggeredAlert> {
        let prices = self.prices.read().await;
        let mut alerts = self.alerts.write().await;
        let fired = self.alert_service.evaluate(&mut alerts, &prices);
        if !fired.is_empty() {
            self.persist_alerts(&alerts);
        }
        fired
    }

    /// Spawn the background polling loop sharing this tracker's state.
    /// Interval and notification preference come from the settings.
    pub async fn start_alert_poller(
        &self,
        notifier: Arc<dyn Notifier>,
    ) -> (AlertPollerHandle, mpsc::UnboundedReceiver<TriggeredAlert>) {
        let settings = self.settings.read().await;
        spawn_alert_poller(
            self.alerts.clone(),
            self.prices.clone(),
            self.storage.clone(),
            notifier,
            settings.notifications_enabled,
            Duration::from_secs(settings.poll_interval_secs),
        )
    }

    // ── Import / Export ─────────────────────────────────────────────

    /// Export the portfolio as JSON rows of `{asset, qty}`.
    pub async fn export_portfolio(&self) -> Result<String, CoreError> {
        let portfolio = self.portfolio.read().await;
        self.import_service.export(&portfolio)
    }

    /// Import a portfolio export file. Parsing fails fast before any
    /// state changes; reconciliation then applies `mode` and returns the
    /// summary counts for one consolidated notification.
    pub async fn import_portfolio(
        &self,
        json: &str,
        mode: ImportMode,
    ) -> Result<ImportSummary, CoreError> {
        let records = self.import_service.parse(json)?;

        let catalog = self.catalog.read().await;
        let mut portfolio = self.portfolio.write().await;
        let summary = self
            .import_service
            .reconcile(&mut portfolio, &records, &catalog, mode);
        self.persist_portfolio(&portfolio);
        Ok(summary)
    }

    // ── Settings ────────────────────────────────────────────────────

    pub async fn settings(&self) -> Settings {
        self.settings.read().await.clone()
    }

    /// Set the display currency (market-data convention: lowercase code).
    pub async fn set_vs_currency(&self, currency: impl Into<String>) -> Result<(), CoreError> {
        let normalized = currency.into().trim().to_lowercase();
        if normalized.is_empty() || !normalized.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(CoreError::Validation(format!(
                "Invalid currency code '{normalized}': must be ASCII letters (e.g., usd, eur)"
            )));
        }
        let mut settings = self.settings.write().await;
        settings.vs_currency = normalized;
        self.persist_settings(&settings);
        Ok(())
    }

    pub async fn set_notifications_enabled(&self, enabled: bool) {
        let mut settings = self.settings.write().await;
        settings.notifications_enabled = enabled;
        self.persist_settings(&settings);
    }

    pub async fn set_poll_interval_secs(&self, secs: u64) -> Result<(), CoreError> {
        if secs == 0 {
            return Err(CoreError::Validation(
                "Poll interval must be at least 1 second".into(),
            ));
        }
        let mut settings = self.settings.write().await;
        settings.poll_interval_secs = secs;
        self.persist_settings(&settings);
        Ok(())
    }

    // ── Internal ────────────────────────────────────────────────────

    // Persistence is best-effort: failures are logged and swallowed,
    // the in-memory state remains authoritative for the session.

    fn persist_portfolio(&self, portfolio: &Portfolio) {
        if let Err(e) = self.storage.save_portfolio(portfolio) {
            warn!("failed to persist portfolio: {e}");
        }
    }

    fn persist_alerts(&self, alerts: &[PriceAlert]) {
        if let Err(e) = self.storage.save_alerts(alerts) {
            warn!("failed to persist alerts: {e}");
        }
    }

    fn persist_settings(&self, settings: &Settings) {
        if let Err(e) = self.storage.save_settings(settings) {
            warn!("failed to persist settings: {e}");
        }
    }
}
