use chrono::Utc;
use uuid::Uuid;

use crate::errors::CoreError;
use crate::models::alert::{AlertCondition, AlertStatus, PriceAlert, TriggeredAlert, MAX_ALERTS};
use crate::models::coin::CoinInfo;
use crate::models::price::PriceMap;

/// Manages the price-alert list and its lifecycle transitions.
///
/// Pure business logic — evaluation against a price snapshot happens here,
/// scheduling lives in `alert_poller`.
pub struct AlertService;

impl AlertService {
    pub fn new() -> Self {
        Self
    }

    /// Create a new active alert. Fails with `AlertLimitReached` once
    /// `MAX_ALERTS` alerts exist, leaving the list untouched.
    pub fn create_alert(
        &self,
        alerts: &mut Vec<PriceAlert>,
        coin: &CoinInfo,
        condition: AlertCondition,
        target_price: f64,
    ) -> Result<PriceAlert, CoreError> {
        if !target_price.is_finite() || target_price <= 0.0 {
            return Err(CoreError::Validation(format!(
                "Target price must be a positive number, got {target_price}"
            )));
        }
        if alerts.len() >= MAX_ALERTS {
            return Err(CoreError::AlertLimitReached { max: MAX_ALERTS });
        }

        let alert = PriceAlert::new(coin, condition, target_price);
        alerts.push(alert.clone());
        Ok(alert)
    }

    /// Delete an alert by id. Fails if the id is unknown.
    pub fn delete_alert(&self, alerts: &mut Vec<PriceAlert>, id: Uuid) -> Result<(), CoreError> {
        let before = alerts.len();
        alerts.retain(|a| a.id != id);
        if alerts.len() == before {
            return Err(CoreError::AlertNotFound(id.to_string()));
        }
        Ok(())
    }

    /// Mute a triggered alert. Only `Triggered → Muted` is a legal move.
    pub fn mute_alert(&self, alerts: &mut Vec<PriceAlert>, id: Uuid) -> Result<(), CoreError> {
        let alert = Self::find_mut(alerts, id)?;
        if alert.status != AlertStatus::Triggered {
            return Err(CoreError::InvalidTransition(format!(
                "alert {id} is {}, only triggered alerts can be muted",
                alert.status
            )));
        }
        alert.status = AlertStatus::Muted;
        Ok(())
    }

    /// Re-arm an alert: `Triggered → Active` or `Muted → Active`.
    /// Clears the recorded trigger so a later firing is fresh.
    pub fn reactivate_alert(&self, alerts: &mut Vec<PriceAlert>, id: Uuid) -> Result<(), CoreError> {
        let alert = Self::find_mut(alerts, id)?;
        match alert.status {
            AlertStatus::Triggered | AlertStatus::Muted => {
                alert.status = AlertStatus::Active;
                alert.triggered_at = None;
                alert.triggered_price = None;
                Ok(())
            }
            AlertStatus::Active => Err(CoreError::InvalidTransition(format!(
                "alert {id} is already active"
            ))),
        }
    }

    /// Evaluate all `Active` alerts against the price snapshot.
    ///
    /// Alerts whose coin has no price are skipped. Alerts whose condition
    /// is met transition to `Triggered` (recording price and time) and are
    /// reported back. `Muted` and already-`Triggered` alerts never fire.
    pub fn evaluate(&self, alerts: &mut [PriceAlert], prices: &PriceMap) -> Vec<TriggeredAlert> {
        let now = Utc::now();
        let mut fired = Vec::new();

        for alert in alerts.iter_mut().filter(|a| a.is_active()) {
            let Some(current) = prices.get(&alert.coin_id) else {
                continue;
            };
            if alert.condition.is_met(current, alert.target_price) {
                alert.status = AlertStatus::Triggered;
                alert.triggered_at = Some(now);
                alert.triggered_price = Some(current);
                fired.push(TriggeredAlert {
                    alert_id: alert.id,
                    coin_id: alert.coin_id.clone(),
                    coin_symbol: alert.coin_symbol.clone(),
                    condition: alert.condition,
                    target_price: alert.target_price,
                    triggered_price: current,
                    triggered_at: now,
                });
            }
        }

        fired
    }

    fn find_mut(alerts: &mut [PriceAlert], id: Uuid) -> Result<&mut PriceAlert, CoreError> {
        alerts
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| CoreError::AlertNotFound(id.to_string()))
    }
}

impl Default for AlertService {
    fn default() -> Self {
        Self::new()
    }
}
