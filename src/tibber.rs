//! Tibber API integration for hourly electricity prices
//!
//! This module fetches today's and tomorrow's hourly prices from Tibber's
//! GraphQL API. Tomorrow's list is empty until Tibber publishes it,
//! typically in the early afternoon.

use crate::collaborators::PriceSource;
use crate::config::TibberConfig;
use crate::error::{GridpilotError, Result};
use crate::logging::get_logger;
use crate::prices::PriceForecast;
use async_trait::async_trait;
use reqwest::header::{ACCEPT, USER_AGENT};
use serde::Deserialize;
use std::time::Duration;

const PRICE_QUERY: &str = "{ viewer { homes { currentSubscription { \
    priceInfo(resolution: HOURLY) { today { total } tomorrow { total } } } } } }";

/// Tibber GraphQL price source
pub struct TibberPriceSource {
    client: reqwest::Client,
    api_url: String,
    access_token: String,
    logger: crate::logging::StructuredLogger,
}

impl TibberPriceSource {
    /// Create a new price source from configuration
    pub fn new(config: &TibberConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            access_token: config.access_token.clone(),
            logger: get_logger("tibber"),
        })
    }
}

#[async_trait]
impl PriceSource for TibberPriceSource {
    async fn fetch_prices(&self) -> Result<PriceForecast> {
        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(self.access_token.trim())
            .header(ACCEPT, "application/json")
            .header(USER_AGENT, concat!("gridpilot/", env!("CARGO_PKG_VERSION")))
            .json(&serde_json::json!({ "query": PRICE_QUERY }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(GridpilotError::api(format!(
                "Tibber API returned status {}",
                response.status()
            )));
        }

        let body = response.text().await?;
        let forecast = parse_price_response(&body)?;
        self.logger.debug(&format!(
            "Fetched prices: {} today, {} tomorrow",
            forecast.today.len(),
            forecast.tomorrow.len()
        ));
        Ok(forecast)
    }
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<ResponseData>,
    errors: Option<Vec<GraphQlError>>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct ResponseData {
    viewer: Viewer,
}

#[derive(Debug, Deserialize)]
struct Viewer {
    homes: Vec<Home>,
}

#[derive(Debug, Deserialize)]
struct Home {
    #[serde(rename = "currentSubscription")]
    current_subscription: Option<Subscription>,
}

#[derive(Debug, Deserialize)]
struct Subscription {
    #[serde(rename = "priceInfo")]
    price_info: Option<PriceInfo>,
}

// `today`/`tomorrow` may be missing or null before publication
#[derive(Debug, Deserialize)]
struct PriceInfo {
    #[serde(default)]
    today: Option<Vec<PricePoint>>,
    #[serde(default)]
    tomorrow: Option<Vec<PricePoint>>,
}

#[derive(Debug, Deserialize)]
struct PricePoint {
    total: f64,
}

/// Parse a Tibber GraphQL price response into a forecast.
///
/// A response that parses as JSON but lacks the expected fields is reported
/// as an API error; the driver treats it the same as a transport failure.
pub fn parse_price_response(body: &str) -> Result<PriceForecast> {
    let response: GraphQlResponse = serde_json::from_str(body)?;

    if let Some(errors) = response.errors
        && let Some(first) = errors.first()
    {
        return Err(GridpilotError::api(format!(
            "Tibber GraphQL error: {}",
            first.message
        )));
    }

    let price_info = response
        .data
        .and_then(|d| d.viewer.homes.into_iter().next())
        .and_then(|h| h.current_subscription)
        .and_then(|s| s.price_info)
        .ok_or_else(|| GridpilotError::api("Tibber response lacks price info"))?;

    let totals = |points: Option<Vec<PricePoint>>| -> Vec<f64> {
        points.unwrap_or_default().iter().map(|p| p.total).collect()
    };

    Ok(PriceForecast {
        today: totals(price_info.today),
        tomorrow: totals(price_info.tomorrow),
    })
}
