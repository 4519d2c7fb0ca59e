use serde::{Deserialize, Serialize};

/// Default alert polling interval: 5 minutes.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 300;

/// User-configurable settings, persisted alongside the portfolio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// The currency in which prices and portfolio values are displayed
    /// (market-data API convention: lowercase, e.g., "usd", "eur").
    pub vs_currency: String,

    /// Whether platform notifications are sent when an alert triggers.
    pub notifications_enabled: bool,

    /// How often the alert poller re-evaluates active alerts, in seconds.
    pub poll_interval_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            vs_currency: "usd".to_string(),
            notifications_enabled: false,
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
        }
    }
}
