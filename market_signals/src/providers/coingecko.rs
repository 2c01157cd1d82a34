use std::collections::BTreeMap;

use chrono::{Days, NaiveDate, Utc};
use reqwest::Client;
use serde_json::Value;

use crate::config::{ProviderSettings, SpotSettings};
use crate::errors::{AnalysisError, Result};
use crate::models::{DailyBar, SpotQuote};
use crate::providers::{api_error, build_client, MarketDataProvider, SpotPriceProvider};

/// Spot prices and daily history for the coins listed in [`SpotSettings`].
#[derive(Clone)]
pub struct CoinGeckoProvider {
    client: Client,
    base_url: String,
    spot: SpotSettings,
}

impl CoinGeckoProvider {
    pub fn new(providers: &ProviderSettings, spot: &SpotSettings) -> Result<Self> {
        Ok(CoinGeckoProvider {
            client: build_client(providers)?,
            base_url: providers.coingecko_api_url.trim_end_matches('/').to_string(),
            spot: spot.clone(),
        })
    }

    pub fn coin_id(&self, ticker: &str) -> Option<&str> {
        self.spot.coin_id(ticker)
    }
}

impl SpotPriceProvider for CoinGeckoProvider {
    async fn spot_price(&self, ticker: &str) -> Result<Option<SpotQuote>> {
        let coin_id = match self.coin_id(ticker) {
            Some(id) => id.to_string(),
            None => {
                tracing::debug!("No coin id mapped for {}", ticker);
                return Ok(None);
            }
        };
        let currency = self.spot.currency.to_lowercase();

        let url = format!("{}/simple/price", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("ids", coin_id.as_str()), ("vs_currencies", currency.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error("CoinGecko", response).await);
        }

        let body = response.text().await?;
        let price = parse_simple_price(&body, &coin_id, &currency)?;

        Ok(Some(SpotQuote {
            ticker: ticker.trim().to_uppercase(),
            coin_id,
            currency,
            price,
            fetched_at: Utc::now(),
        }))
    }
}

impl MarketDataProvider for CoinGeckoProvider {
    async fn daily_bars(&self, ticker: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<DailyBar>> {
        let coin_id = self
            .coin_id(ticker)
            .ok_or_else(|| AnalysisError::DataUnavailable(format!("no coin id mapped for {}", ticker)))?
            .to_string();

        let from = start
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| AnalysisError::InvalidParameter("invalid start date".to_string()))?
            .and_utc()
            .timestamp();
        let to = end
            .checked_add_days(Days::new(1))
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .ok_or_else(|| AnalysisError::InvalidParameter("invalid end date".to_string()))?
            .and_utc()
            .timestamp();

        let url = format!("{}/coins/{}/market_chart/range", self.base_url, coin_id);
        tracing::info!("Fetching CoinGecko history for {} from {} to {}", coin_id, start, end);
        tracing::debug!("URL: {}", url);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("vs_currency", self.spot.currency.to_lowercase()),
                ("from", from.to_string()),
                ("to", to.to_string()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error("CoinGecko", response).await);
        }

        let body = response.text().await?;
        let bars: Vec<DailyBar> = parse_market_chart(&body)?
            .into_iter()
            .filter(|b| b.date >= start && b.date <= end)
            .collect();

        if bars.is_empty() {
            return Err(AnalysisError::DataUnavailable(format!(
                "no CoinGecko prices for {} between {} and {}",
                coin_id, start, end
            )));
        }
        Ok(bars)
    }
}

pub fn parse_simple_price(body: &str, coin_id: &str, currency: &str) -> Result<f64> {
    let json: Value = serde_json::from_str(body)?;
    json.get(coin_id)
        .and_then(|coin| coin.get(currency))
        .and_then(Value::as_f64)
        .ok_or_else(|| {
            AnalysisError::DataUnavailable(format!("no {} price for {}", currency, coin_id))
        })
}

/// Groups `[timestamp_ms, price]` pairs by day and keeps the last price of each.
pub fn parse_market_chart(body: &str) -> Result<Vec<DailyBar>> {
    let json: Value = serde_json::from_str(body)?;
    let prices = json["prices"]
        .as_array()
        .ok_or_else(|| AnalysisError::InvalidDataFormat("missing prices field".to_string()))?;

    let mut daily_prices = BTreeMap::new();

    for price_data in prices {
        let price_array = price_data
            .as_array()
            .ok_or_else(|| AnalysisError::InvalidDataFormat("malformed price entry".to_string()))?;

        let timestamp = price_array
            .first()
            .and_then(Value::as_f64)
            .ok_or_else(|| AnalysisError::InvalidDataFormat("malformed timestamp".to_string()))?;
        let price = price_array
            .get(1)
            .and_then(Value::as_f64)
            .ok_or_else(|| AnalysisError::InvalidDataFormat("malformed price".to_string()))?;

        let datetime = chrono::DateTime::from_timestamp((timestamp / 1000.0) as i64, 0)
            .ok_or_else(|| AnalysisError::InvalidDataFormat("timestamp out of range".to_string()))?;

        daily_prices.insert(datetime.date_naive(), price);
    }

    Ok(daily_prices
        .into_iter()
        .map(|(date, close)| DailyBar {
            date,
            open: None,
            high: None,
            low: None,
            close,
            volume: None,
        })
        .collect())
}
