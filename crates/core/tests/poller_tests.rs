// ═══════════════════════════════════════════════════════════════════
// Alert poller tests — background evaluation loop, pause/resume,
// out-of-band checks, triggered-list bookkeeping
// ═══════════════════════════════════════════════════════════════════

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;

use coinfolio_core::models::alert::{AlertCondition, AlertStatus, PriceAlert};
use coinfolio_core::models::coin::CoinInfo;
use coinfolio_core::models::price::PriceMap;
use coinfolio_core::notify::Notifier;
use coinfolio_core::services::alert_poller::{spawn_alert_poller, PollerStatus};
use coinfolio_core::storage::manager::StorageManager;
use coinfolio_core::storage::store::MemoryStore;

struct CountingNotifier {
    count: AtomicUsize,
}

impl CountingNotifier {
    fn new() -> Self {
        Self {
            count: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

impl Notifier for CountingNotifier {
    fn notify(&self, _title: &str, _body: &str) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }
}

fn btc() -> CoinInfo {
    CoinInfo::new("bitcoin", "btc", "Bitcoin")
}

struct Fixture {
    alerts: Arc<RwLock<Vec<PriceAlert>>>,
    prices: Arc<RwLock<PriceMap>>,
    storage: StorageManager,
    notifier: Arc<CountingNotifier>,
}

fn fixture(alerts: Vec<PriceAlert>, price: Option<f64>) -> Fixture {
    let mut prices = PriceMap::new();
    if let Some(p) = price {
        prices.set("bitcoin", p);
    }
    Fixture {
        alerts: Arc::new(RwLock::new(alerts)),
        prices: Arc::new(RwLock::new(prices)),
        storage: StorageManager::new(Arc::new(MemoryStore::new())),
        notifier: Arc::new(CountingNotifier::new()),
    }
}

#[tokio::test]
async fn initial_pass_fires_due_alerts_and_emits_events() {
    let alert = PriceAlert::new(&btc(), AlertCondition::Above, 40000.0);
    let fx = fixture(vec![alert.clone()], Some(42000.0));

    let (handle, mut events) = spawn_alert_poller(
        fx.alerts.clone(),
        fx.prices.clone(),
        fx.storage.clone(),
        fx.notifier.clone(),
        false,
        Duration::from_secs(3600),
    );

    // The initial pass runs before the first sleep
    let event = tokio::time::timeout(Duration::from_secs(2), events.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(event.alert_id, alert.id);
    assert_eq!(event.triggered_price, 42000.0);

    assert_eq!(fx.alerts.read().await[0].status, AlertStatus::Triggered);
    assert_eq!(handle.triggered().await.len(), 1);
    handle.stop().await;
}

#[tokio::test]
async fn trigger_is_persisted_to_storage() {
    let alert = PriceAlert::new(&btc(), AlertCondition::Below, 50000.0);
    let fx = fixture(vec![alert], Some(42000.0));

    let (handle, _events) = spawn_alert_poller(
        fx.alerts.clone(),
        fx.prices.clone(),
        fx.storage.clone(),
        fx.notifier.clone(),
        false,
        Duration::from_secs(3600),
    );
    handle.check_now().await;

    let stored = fx.storage.load_alerts().unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].status, AlertStatus::Triggered);
    handle.stop().await;
}

#[tokio::test]
async fn check_now_works_while_paused() {
    let alert = PriceAlert::new(&btc(), AlertCondition::Above, 1.0);
    let fx = fixture(vec![alert], None);

    let (handle, _events) = spawn_alert_poller(
        fx.alerts.clone(),
        fx.prices.clone(),
        fx.storage.clone(),
        fx.notifier.clone(),
        false,
        Duration::from_secs(3600),
    );
    handle.pause().await;
    assert!(handle.is_paused());
    assert_eq!(handle.status().await, PollerStatus::Paused);

    // No price yet: nothing fires
    assert!(handle.check_now().await.is_empty());

    // Price arrives; an explicit check fires even though ticks are paused
    fx.prices.write().await.set("bitcoin", 42000.0);
    let fired = handle.check_now().await;
    assert_eq!(fired.len(), 1);
    handle.stop().await;
}

#[tokio::test]
async fn triggered_alert_does_not_fire_twice() {
    let alert = PriceAlert::new(&btc(), AlertCondition::Above, 1.0);
    let fx = fixture(vec![alert], Some(42000.0));

    let (handle, _events) = spawn_alert_poller(
        fx.alerts.clone(),
        fx.prices.clone(),
        fx.storage.clone(),
        fx.notifier.clone(),
        false,
        Duration::from_secs(3600),
    );

    let first = handle.check_now().await;
    let second = handle.check_now().await;
    // Only one of the passes can claim the trigger; afterwards it stays quiet
    assert_eq!(first.len() + second.len(), 1);
    assert!(handle.check_now().await.is_empty());
    assert_eq!(handle.triggered().await.len(), 1);
    handle.stop().await;
}

#[tokio::test]
async fn dismiss_and_clear_triggered_list() {
    let a = PriceAlert::new(&btc(), AlertCondition::Above, 1.0);
    let b = PriceAlert::new(&btc(), AlertCondition::Above, 2.0);
    let (a_id, b_id) = (a.id, b.id);
    let fx = fixture(vec![a, b], Some(42000.0));

    let (handle, _events) = spawn_alert_poller(
        fx.alerts.clone(),
        fx.prices.clone(),
        fx.storage.clone(),
        fx.notifier.clone(),
        false,
        Duration::from_secs(3600),
    );
    handle.check_now().await;

    // Both may already have fired on the initial pass; either way both are listed
    let listed = handle.triggered().await;
    assert_eq!(listed.len(), 2);

    handle.dismiss_triggered(a_id).await;
    let listed = handle.triggered().await;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].alert_id, b_id);

    handle.clear_all_triggered().await;
    assert!(handle.triggered().await.is_empty());

    // Dismissal is about the transient list, not the alert's own status
    assert_eq!(fx.alerts.read().await[0].status, AlertStatus::Triggered);
    handle.stop().await;
}

#[tokio::test]
async fn notifier_called_only_when_enabled() {
    let a = PriceAlert::new(&btc(), AlertCondition::Above, 1.0);
    let b = PriceAlert::new(&btc(), AlertCondition::Above, 2.0);
    let fx = fixture(vec![a, b], None);

    let (handle, _events) = spawn_alert_poller(
        fx.alerts.clone(),
        fx.prices.clone(),
        fx.storage.clone(),
        fx.notifier.clone(),
        false,
        Duration::from_secs(3600),
    );

    fx.prices.write().await.set("bitcoin", 42000.0);
    handle.check_now().await;
    assert_eq!(fx.notifier.calls(), 0);

    // Re-arm one alert and enable notifications
    {
        let mut alerts = fx.alerts.write().await;
        alerts[0].status = AlertStatus::Active;
        alerts[0].triggered_at = None;
        alerts[0].triggered_price = None;
    }
    handle.set_notifications_enabled(true).await;
    let fired = handle.check_now().await;
    assert_eq!(fired.len(), 1);
    assert_eq!(fx.notifier.calls(), 1);
    handle.stop().await;
}

#[tokio::test]
async fn stop_halts_the_loop() {
    let fx = fixture(Vec::new(), None);

    let (handle, _events) = spawn_alert_poller(
        fx.alerts.clone(),
        fx.prices.clone(),
        fx.storage.clone(),
        fx.notifier.clone(),
        false,
        Duration::from_millis(10),
    );
    handle.stop().await;
    assert_eq!(handle.status().await, PollerStatus::Stopped);

    // Arm an alert after stopping; ticks no longer run
    fx.prices.write().await.set("bitcoin", 42000.0);
    fx.alerts
        .write()
        .await
        .push(PriceAlert::new(&btc(), AlertCondition::Above, 1.0));
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(fx.alerts.read().await[0].status, AlertStatus::Active);
}

#[tokio::test]
async fn interval_updates_are_visible() {
    let fx = fixture(Vec::new(), None);

    let (handle, _events) = spawn_alert_poller(
        fx.alerts.clone(),
        fx.prices.clone(),
        fx.storage.clone(),
        fx.notifier.clone(),
        false,
        Duration::from_secs(300),
    );
    assert_eq!(handle.interval().await, 300);
    handle.set_interval(60).await;
    assert_eq!(handle.interval().await, 60);
    // Zero is clamped to keep the loop from spinning
    handle.set_interval(0).await;
    assert_eq!(handle.interval().await, 1);
    handle.stop().await;
}

#[tokio::test]
async fn periodic_tick_fires_newly_due_alert() {
    let fx = fixture(Vec::new(), None);

    let (handle, mut events) = spawn_alert_poller(
        fx.alerts.clone(),
        fx.prices.clone(),
        fx.storage.clone(),
        fx.notifier.clone(),
        false,
        Duration::from_secs(1),
    );

    // Becomes due only after the initial pass already ran
    fx.prices.write().await.set("bitcoin", 42000.0);
    fx.alerts
        .write()
        .await
        .push(PriceAlert::new(&btc(), AlertCondition::Above, 40000.0));

    let event = tokio::time::timeout(Duration::from_secs(5), events.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(event.coin_id, "bitcoin");
    handle.stop().await;
}

#[tokio::test]
async fn paused_poller_skips_ticks() {
    let fx = fixture(Vec::new(), None);

    let (handle, mut events) = spawn_alert_poller(
        fx.alerts.clone(),
        fx.prices.clone(),
        fx.storage.clone(),
        fx.notifier.clone(),
        false,
        Duration::from_millis(50),
    );
    handle.pause().await;

    fx.prices.write().await.set("bitcoin", 42000.0);
    fx.alerts
        .write()
        .await
        .push(PriceAlert::new(&btc(), AlertCondition::Above, 1.0));

    // Several intervals pass; the paused loop must not evaluate
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(events.try_recv().is_err());
    assert_eq!(fx.alerts.read().await[0].status, AlertStatus::Active);

    handle.resume().await;
    let event = tokio::time::timeout(Duration::from_secs(5), events.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(event.coin_id, "bitcoin");
    handle.stop().await;
}
