//! Background alert polling loop.
//!
//! A persistent Tokio task that re-evaluates active price alerts against
//! the shared price snapshot on a configurable interval (default 5 min).
//! Transitions that fire are persisted, optionally notified, and surfaced
//! to the caller through an event channel plus a transient triggered list.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{mpsc, watch, Mutex, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::models::alert::{PriceAlert, TriggeredAlert};
use crate::models::price::PriceMap;
use crate::notify::Notifier;
use crate::services::alert_service::AlertService;
use crate::storage::manager::StorageManager;

/// Status of the alert poller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PollerStatus {
    Running,
    Paused,
    Stopped,
}

/// Everything a single evaluation pass needs. Shared between the loop
/// task and the handle (for `check_now`).
struct PollerShared {
    alerts: Arc<RwLock<Vec<PriceAlert>>>,
    prices: Arc<RwLock<PriceMap>>,
    storage: StorageManager,
    notifier: Arc<dyn Notifier>,
    notifications_enabled: RwLock<bool>,
    /// Transient "just triggered" results, distinct from the alerts'
    /// persisted status. Dismissed by the user, not by the state machine.
    triggered: Mutex<Vec<TriggeredAlert>>,
    events: mpsc::UnboundedSender<TriggeredAlert>,
}

impl PollerShared {
    /// One evaluation pass: fire due alerts, persist, notify, publish.
    /// Returns the alerts that fired during this pass.
    async fn run_pass(&self) -> Vec<TriggeredAlert> {
        let service = AlertService::new();
        let fired = {
            let prices = self.prices.read().await;
            let mut alerts = self.alerts.write().await;
            service.evaluate(&mut alerts, &prices)
        };

        if fired.is_empty() {
            return fired;
        }

        // Persist the status transitions (best-effort; memory stays authoritative)
        {
            let alerts = self.alerts.read().await;
            if let Err(e) = self.storage.save_alerts(&alerts) {
                warn!("failed to persist alerts after trigger: {e}");
            }
        }

        let notify = *self.notifications_enabled.read().await;
        let mut triggered = self.triggered.lock().await;
        for event in &fired {
            if notify {
                self.notifier.notify(
                    &format!("{} price alert", event.coin_symbol),
                    &format!(
                        "{} is {} your target of {} (now {})",
                        event.coin_symbol, event.condition, event.target_price,
                        event.triggered_price
                    ),
                );
            }
            triggered.push(event.clone());
            // Receiver may be gone; triggers are still recorded above
            let _ = self.events.send(event.clone());
        }

        fired
    }
}

/// Handle to control the alert poller and inspect its results.
#[derive(Clone)]
pub struct AlertPollerHandle {
    shared: Arc<PollerShared>,
    pause_tx: watch::Sender<bool>,
    cancel_token: CancellationToken,
    status: Arc<RwLock<PollerStatus>>,
    interval_secs: Arc<RwLock<u64>>,
}

impl AlertPollerHandle {
    /// Pause evaluation (the task stays alive, ticks are skipped).
    pub async fn pause(&self) {
        let _ = self.pause_tx.send(true);
        *self.status.write().await = PollerStatus::Paused;
        debug!("alert poller paused");
    }

    /// Resume evaluation.
    pub async fn resume(&self) {
        let _ = self.pause_tx.send(false);
        *self.status.write().await = PollerStatus::Running;
        debug!("alert poller resumed");
    }

    /// Stop the poller entirely (cannot be restarted — spawn a new one).
    pub async fn stop(&self) {
        self.cancel_token.cancel();
        *self.status.write().await = PollerStatus::Stopped;
        debug!("alert poller stopped");
    }

    pub async fn status(&self) -> PollerStatus {
        *self.status.read().await
    }

    pub fn is_paused(&self) -> bool {
        *self.pause_tx.borrow()
    }

    /// Update the polling interval. Takes effect from the next tick.
    pub async fn set_interval(&self, secs: u64) {
        *self.interval_secs.write().await = secs.max(1);
    }

    pub async fn interval(&self) -> u64 {
        *self.interval_secs.read().await
    }

    pub async fn set_notifications_enabled(&self, enabled: bool) {
        *self.shared.notifications_enabled.write().await = enabled;
    }

    /// Force an out-of-band evaluation pass, regardless of pause state.
    /// Returns the alerts that fired during this pass.
    pub async fn check_now(&self) -> Vec<TriggeredAlert> {
        self.shared.run_pass().await
    }

    /// The transient list of recent trigger results.
    pub async fn triggered(&self) -> Vec<TriggeredAlert> {
        self.shared.triggered.lock().await.clone()
    }

    /// Drop one trigger result from the transient list.
    pub async fn dismiss_triggered(&self, alert_id: Uuid) {
        self.shared
            .triggered
            .lock()
            .await
            .retain(|t| t.alert_id != alert_id);
    }

    /// Drop all trigger results from the transient list.
    pub async fn clear_all_triggered(&self) {
        self.shared.triggered.lock().await.clear();
    }
}

/// Spawn the alert poller background task.
///
/// Runs an initial pass immediately, then one per interval. Returns the
/// control handle and the receiver of trigger events.
pub fn spawn_alert_poller(
    alerts: Arc<RwLock<Vec<PriceAlert>>>,
    prices: Arc<RwLock<PriceMap>>,
    storage: StorageManager,
    notifier: Arc<dyn Notifier>,
    notifications_enabled: bool,
    interval: Duration,
) -> (AlertPollerHandle, mpsc::UnboundedReceiver<TriggeredAlert>) {
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let (pause_tx, pause_rx) = watch::channel(false); // starts unpaused

    let shared = Arc::new(PollerShared {
        alerts,
        prices,
        storage,
        notifier,
        notifications_enabled: RwLock::new(notifications_enabled),
        triggered: Mutex::new(Vec::new()),
        events: events_tx,
    });

    let cancel_token = CancellationToken::new();
    let status = Arc::new(RwLock::new(PollerStatus::Running));
    let interval_secs = Arc::new(RwLock::new(interval.as_secs().max(1)));

    let handle = AlertPollerHandle {
        shared: shared.clone(),
        pause_tx,
        cancel_token: cancel_token.clone(),
        status: status.clone(),
        interval_secs: interval_secs.clone(),
    };

    tokio::spawn(poller_loop(shared, pause_rx, cancel_token, interval_secs));

    (handle, events_rx)
}

/// The main poller loop. Single task, so passes never overlap.
async fn poller_loop(
    shared: Arc<PollerShared>,
    pause_rx: watch::Receiver<bool>,
    cancel_token: CancellationToken,
    interval_secs: Arc<RwLock<u64>>,
) {
    // Initial pass before the first sleep
    if !*pause_rx.borrow() {
        let fired = shared.run_pass().await;
        debug!(fired = fired.len(), "alert poller initial pass");
    }

    loop {
        let sleep_for = Duration::from_secs(*interval_secs.read().await);

        tokio::select! {
            _ = cancel_token.cancelled() => {
                debug!("alert poller loop exiting");
                return;
            }
            _ = tokio::time::sleep(sleep_for) => {
                if *pause_rx.borrow() {
                    continue;
                }
                let fired = shared.run_pass().await;
                if !fired.is_empty() {
                    debug!(fired = fired.len(), "alert poller tick fired alerts");
                }
            }
        }
    }
}
