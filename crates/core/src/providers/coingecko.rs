use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

use super::traits::MarketDataProvider;
use crate::errors::CoreError;
use crate::models::coin::{CoinDetail, CoinMarket};
use crate::models::price::PricePoint;

const BASE_URL: &str = "https://api.coingecko.com/api/v3";

/// CoinGecko API provider for cryptocurrency market data.
///
/// - **Free**: No API key required on the public tier.
/// - **Endpoints**: `/coins/markets`, `/simple/price`,
///   `/coins/{id}/market_chart`, `/coins/{id}`
///
/// CoinGecko uses lowercase ids like "bitcoin", "ethereum"; those ids are
/// what the portfolio and alerts store.
pub struct CoinGeckoProvider {
    client: Client,
    base_url: String,
}

impl CoinGeckoProvider {
    pub fn new() -> Self {
        Self::with_base_url(BASE_URL)
    }

    /// Point the provider at a different base URL (tests, self-hosted proxy).
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn api_error(message: impl Into<String>) -> CoreError {
        CoreError::Api {
            provider: "CoinGecko".into(),
            message: message.into(),
        }
    }
}

impl Default for CoinGeckoProvider {
    fn default() -> Self {
        Self::new()
    }
}

// ── CoinGecko API response types ────────────────────────────────────

#[derive(Deserialize)]
struct MarketChartResponse {
    /// [unix_millis, price] pairs
    prices: Vec<(i64, f64)>,
}

#[derive(Deserialize)]
struct CoinDetailResponse {
    id: String,
    symbol: String,
    name: String,
    #[serde(default)]
    description: Option<DetailDescription>,
    #[serde(default)]
    image: Option<DetailImage>,
    #[serde(default)]
    market_data: Option<DetailMarketData>,
}

#[derive(Deserialize)]
struct DetailDescription {
    #[serde(default)]
    en: Option<String>,
}

#[derive(Deserialize)]
struct DetailImage {
    #[serde(default)]
    large: Option<String>,
}

#[derive(Deserialize)]
struct DetailMarketData {
    #[serde(default)]
    current_price: HashMap<String, f64>,
}

#[async_trait]
impl MarketDataProvider for CoinGeckoProvider {
    fn name(&self) -> &str {
        "CoinGecko"
    }

    async fn top_coins(
        &self,
        vs_currency: &str,
        limit: usize,
    ) -> Result<Vec<CoinMarket>, CoreError> {
        let url = format!(
            "{}/coins/markets?vs_currency={vs_currency}&order=market_cap_desc&per_page={limit}&page=1",
            self.base_url
        );

        let coins: Vec<CoinMarket> = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()
            .map_err(|e| Self::api_error(format!("markets request failed: {e}")))?
            .json()
            .await
            .map_err(|e| Self::api_error(format!("failed to parse markets response: {e}")))?;

        Ok(coins)
    }

    async fn prices(
        &self,
        coin_ids: &[String],
        vs_currency: &str,
    ) -> Result<HashMap<String, f64>, CoreError> {
        if coin_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let ids = coin_ids.join(",");
        let url = format!(
            "{}/simple/price?ids={ids}&vs_currencies={vs_currency}",
            self.base_url
        );

        // Response shape: { "<id>": { "<vs>": <price> }, ... }
        let raw: HashMap<String, HashMap<String, f64>> = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()
            .map_err(|e| Self::api_error(format!("price request failed: {e}")))?
            .json()
            .await
            .map_err(|e| Self::api_error(format!("failed to parse price response: {e}")))?;

        let prices = raw
            .into_iter()
            .filter_map(|(id, per_currency)| {
                per_currency.get(vs_currency).map(|p| (id, *p))
            })
            .collect();

        Ok(prices)
    }

    async fn coin_history(
        &self,
        coin_id: &str,
        vs_currency: &str,
        days: u32,
    ) -> Result<Vec<PricePoint>, CoreError> {
        let url = format!(
            "{}/coins/{coin_id}/market_chart?vs_currency={vs_currency}&days={days}",
            self.base_url
        );

        let resp: MarketChartResponse = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()
            .map_err(|e| Self::api_error(format!("history request failed for {coin_id}: {e}")))?
            .json()
            .await
            .map_err(|e| Self::api_error(format!("failed to parse history for {coin_id}: {e}")))?;

        let points: Vec<PricePoint> = resp
            .prices
            .into_iter()
            .filter_map(|(millis, price)| {
                let timestamp = chrono::DateTime::from_timestamp_millis(millis)?;
                Some(PricePoint { timestamp, price })
            })
            .collect();

        if points.is_empty() {
            return Err(CoreError::PriceNotAvailable(coin_id.to_string()));
        }

        Ok(points)
    }

    async fn coin_detail(
        &self,
        coin_id: &str,
        vs_currency: &str,
    ) -> Result<CoinDetail, CoreError> {
        let url = format!(
            "{}/coins/{coin_id}?localization=false&tickers=false&market_data=true&community_data=false&developer_data=false",
            self.base_url
        );

        let resp: CoinDetailResponse = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()
            .map_err(|e| Self::api_error(format!("detail request failed for {coin_id}: {e}")))?
            .json()
            .await
            .map_err(|e| Self::api_error(format!("failed to parse detail for {coin_id}: {e}")))?;

        let current_price = resp
            .market_data
            .as_ref()
            .and_then(|m| m.current_price.get(vs_currency).copied());

        Ok(CoinDetail {
            id: resp.id,
            symbol: resp.symbol.to_uppercase(),
            name: resp.name,
            description: resp.description.and_then(|d| d.en).filter(|s| !s.is_empty()),
            image: resp.image.and_then(|i| i.large),
            current_price,
        })
    }
}
