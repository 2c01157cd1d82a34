//! Thin adapters over the public data sources. Each call is a single request;
//! nothing is retried.

use std::future::Future;
use std::time::Duration;

use chrono::NaiveDate;
use reqwest::{Client, ClientBuilder};

use crate::config::ProviderSettings;
use crate::errors::Result;
use crate::models::{DailyBar, NewsArticle, SpotQuote};

pub mod coingecko;
pub mod google_news;
pub mod yahoo;

pub use coingecko::CoinGeckoProvider;
pub use google_news::GoogleNewsProvider;
pub use yahoo::YahooChartProvider;

pub trait MarketDataProvider: Send + Sync {
    /// Daily bars for `start..=end`. An unknown ticker or an empty range is
    /// `DataUnavailable`; transport failures are `ExternalService`/`HttpError`.
    fn daily_bars(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> impl Future<Output = Result<Vec<DailyBar>>> + Send;
}

pub trait NewsProvider: Send + Sync {
    fn articles(&self, query: &str) -> impl Future<Output = Result<Vec<NewsArticle>>> + Send;
}

pub trait SpotPriceProvider: Send + Sync {
    /// `Ok(None)` when the ticker has no live quote source.
    fn spot_price(&self, ticker: &str) -> impl Future<Output = Result<Option<SpotQuote>>> + Send;
}

/// Stand-in for pipelines that run without a news source.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoNews;

impl NewsProvider for NoNews {
    async fn articles(&self, _query: &str) -> Result<Vec<NewsArticle>> {
        Ok(Vec::new())
    }
}

pub(crate) fn build_client(settings: &ProviderSettings) -> Result<Client> {
    Ok(ClientBuilder::new()
        .timeout(Duration::from_secs(settings.request_timeout_secs))
        .user_agent(settings.user_agent.clone())
        .build()?)
}

/// Turns a non-success response into an error carrying the provider name.
pub(crate) async fn api_error(provider: &str, response: reqwest::Response) -> crate::errors::AnalysisError {
    let status = response.status();
    let error_text = response
        .text()
        .await
        .unwrap_or_else(|_| "unknown error".to_string());
    crate::errors::AnalysisError::ExternalService(format!(
        "{} API error: {} - {}",
        provider, status, error_text
    ))
}
