use chrono::{Days, NaiveDate};
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::config::ProviderSettings;
use crate::errors::{AnalysisError, Result};
use crate::models::DailyBar;
use crate::providers::{api_error, build_client, MarketDataProvider};

/// Daily bars from the public chart endpoint.
#[derive(Clone)]
pub struct YahooChartProvider {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<Quote>,
}

#[derive(Debug, Default, Deserialize)]
struct Quote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

impl YahooChartProvider {
    pub fn new(settings: &ProviderSettings) -> Result<Self> {
        Ok(YahooChartProvider {
            client: build_client(settings)?,
            base_url: settings.yahoo_chart_url.trim_end_matches('/').to_string(),
        })
    }
}

impl MarketDataProvider for YahooChartProvider {
    async fn daily_bars(&self, ticker: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<DailyBar>> {
        let period1 = start
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| AnalysisError::InvalidParameter("invalid start date".to_string()))?
            .and_utc()
            .timestamp();
        // period2 is exclusive
        let period2 = end
            .checked_add_days(Days::new(1))
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .ok_or_else(|| AnalysisError::InvalidParameter("invalid end date".to_string()))?
            .and_utc()
            .timestamp();

        let url = format!("{}/{}", self.base_url, urlencoding::encode(ticker));
        tracing::info!("Fetching daily bars for {} from {} to {}", ticker, start, end);
        tracing::debug!("URL: {}", url);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("period1", period1.to_string()),
                ("period2", period2.to_string()),
                ("interval", "1d".to_string()),
                ("events", "history".to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(AnalysisError::DataUnavailable(format!("unknown ticker {}", ticker)));
        }
        if !status.is_success() {
            return Err(api_error("Yahoo chart", response).await);
        }

        let body = response.text().await?;
        let bars = parse_chart(&body)?;
        if bars.is_empty() {
            return Err(AnalysisError::DataUnavailable(format!(
                "no bars for {} between {} and {}",
                ticker, start, end
            )));
        }

        tracing::info!("Received {} daily bars for {}", bars.len(), ticker);
        Ok(bars)
    }
}

/// Parses a chart response. Bars with a null close are skipped.
pub fn parse_chart(body: &str) -> Result<Vec<DailyBar>> {
    let envelope: ChartEnvelope = serde_json::from_str(body)?;

    if let Some(error) = envelope.chart.error {
        let message = format!(
            "{}: {}",
            error.code,
            error.description.unwrap_or_default()
        );
        return Err(if error.code.eq_ignore_ascii_case("Not Found") {
            AnalysisError::DataUnavailable(message)
        } else {
            AnalysisError::ExternalService(message)
        });
    }

    let result = match envelope.chart.result.and_then(|r| r.into_iter().next()) {
        Some(result) => result,
        None => return Ok(Vec::new()),
    };
    let quote = result.indicators.quote.into_iter().next().unwrap_or_default();

    let mut bars = Vec::with_capacity(result.timestamp.len());
    for (i, ts) in result.timestamp.iter().enumerate() {
        let close = match quote.close.get(i).copied().flatten() {
            Some(close) => close,
            None => continue,
        };
        let date = chrono::DateTime::from_timestamp(*ts, 0)
            .ok_or_else(|| AnalysisError::InvalidDataFormat(format!("invalid timestamp {}", ts)))?
            .date_naive();

        bars.push(DailyBar {
            date,
            open: quote.open.get(i).copied().flatten(),
            high: quote.high.get(i).copied().flatten(),
            low: quote.low.get(i).copied().flatten(),
            close,
            volume: quote.volume.get(i).copied().flatten(),
        });
    }

    Ok(bars)
}
