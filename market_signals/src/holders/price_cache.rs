use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use tokio::sync::Mutex;

use crate::errors::{AnalysisError, Result};
use crate::models::PriceSeries;
use crate::providers::MarketDataProvider;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub ticker: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl CacheKey {
    pub fn new(ticker: &str, start: NaiveDate, end: NaiveDate) -> Self {
        CacheKey {
            ticker: ticker.trim().to_uppercase(),
            start,
            end,
        }
    }
}

/// Cleaned price series keyed by (ticker, start, end), kept for the life of
/// the process. Failed or empty fetches are never stored.
#[derive(Clone, Default)]
pub struct PriceCache {
    series: Arc<Mutex<HashMap<CacheKey, PriceSeries>>>,
}

impl PriceCache {
    pub fn new() -> Self {
        PriceCache {
            series: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub async fn get(&self, key: &CacheKey) -> Option<PriceSeries> {
        let series = self.series.lock().await;
        series.get(key).cloned()
    }

    pub async fn insert(&self, key: CacheKey, value: PriceSeries) {
        let mut series = self.series.lock().await;
        series.insert(key, value);
    }

    /// Returns the cached series or fetches, cleans and stores it.
    pub async fn get_or_fetch<P: MarketDataProvider>(
        &self,
        provider: &P,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries> {
        let key = CacheKey::new(ticker, start, end);
        if let Some(hit) = self.get(&key).await {
            tracing::debug!("Price cache hit for {} {}..{}", key.ticker, start, end);
            return Ok(hit);
        }

        // the lock is not held across the request
        let bars = provider.daily_bars(&key.ticker, start, end).await?;
        let series = PriceSeries::from_bars(&bars).window(start, end);
        if series.is_empty() {
            return Err(AnalysisError::DataUnavailable(format!(
                "no usable prices for {} between {} and {}",
                key.ticker, start, end
            )));
        }

        self.insert(key, series.clone()).await;
        Ok(series)
    }

    pub async fn clear(&self) {
        let mut series = self.series.lock().await;
        series.clear();
    }

    pub async fn len(&self) -> usize {
        let series = self.series.lock().await;
        series.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
