use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::coin::CoinInfo;

/// Maximum number of alerts that may exist at any time.
/// Creation beyond this fails with `CoreError::AlertLimitReached`.
pub const MAX_ALERTS: usize = 50;

/// Direction of a price alert threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertCondition {
    /// Triggers when the current price is at or above the target
    Above,
    /// Triggers when the current price is at or below the target
    Below,
}

impl AlertCondition {
    /// Whether the condition is met at `current` price.
    /// The boundary counts as met in both directions.
    pub fn is_met(&self, current: f64, target: f64) -> bool {
        match self {
            AlertCondition::Above => current >= target,
            AlertCondition::Below => current <= target,
        }
    }
}

impl std::fmt::Display for AlertCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertCondition::Above => write!(f, "above"),
            AlertCondition::Below => write!(f, "below"),
        }
    }
}

/// Lifecycle state of a price alert.
///
/// `Active → Triggered → (Muted | Active)`, and `Muted → Active`.
/// Deletion is external to the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertStatus {
    Active,
    Triggered,
    Muted,
}

impl std::fmt::Display for AlertStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertStatus::Active => write!(f, "active"),
            AlertStatus::Triggered => write!(f, "triggered"),
            AlertStatus::Muted => write!(f, "muted"),
        }
    }
}

/// A user-defined trigger on a coin's price crossing a threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceAlert {
    /// Unique identifier
    pub id: Uuid,

    /// Market-data API id of the watched coin (e.g., "bitcoin")
    pub coin_id: String,

    /// Ticker symbol for display (e.g., "BTC")
    pub coin_symbol: String,

    /// Coin name for display (e.g., "Bitcoin")
    pub coin_name: String,

    /// Optional logo URL for display
    #[serde(default)]
    pub coin_image: Option<String>,

    pub condition: AlertCondition,

    /// Threshold price in the display currency
    pub target_price: f64,

    pub status: AlertStatus,

    pub created_at: DateTime<Utc>,

    /// When the alert last transitioned to `Triggered`
    #[serde(default)]
    pub triggered_at: Option<DateTime<Utc>>,

    /// The price observed at the moment of triggering
    #[serde(default)]
    pub triggered_price: Option<f64>,
}

impl PriceAlert {
    pub fn new(coin: &CoinInfo, condition: AlertCondition, target_price: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            coin_id: coin.id.clone(),
            coin_symbol: coin.symbol.clone(),
            coin_name: coin.name.clone(),
            coin_image: coin.image.clone(),
            condition,
            target_price,
            status: AlertStatus::Active,
            created_at: Utc::now(),
            triggered_at: None,
            triggered_price: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == AlertStatus::Active
    }
}

/// Record of an alert firing, surfaced to the caller by the polling loop.
///
/// Distinct from the alert's persisted `Triggered` status: this is the
/// transient "just triggered" result the UI shows and dismisses.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TriggeredAlert {
    pub alert_id: Uuid,
    pub coin_id: String,
    pub coin_symbol: String,
    pub condition: AlertCondition,
    pub target_price: f64,
    pub triggered_price: f64,
    pub triggered_at: DateTime<Utc>,
}
