#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Days, NaiveDate, Utc};
use market_signals::errors::{AnalysisError, Result};
use market_signals::models::{DailyBar, NewsArticle, PricePoint, SpotQuote};
use market_signals::{
    AnalysisPipeline, LexiconScorer, MarketDataProvider, NewsProvider, PipelineSettings, PriceSeries,
    SpotPriceProvider,
};

pub fn day(offset: u64) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .checked_add_days(Days::new(offset))
        .unwrap()
}

pub fn series_from(closes: &[f64]) -> PriceSeries {
    PriceSeries::new(
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| PricePoint {
                date: day(i as u64),
                close,
            })
            .collect(),
    )
    .unwrap()
}

pub fn bars_from(closes: &[f64]) -> Vec<DailyBar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| DailyBar {
            date: day(i as u64),
            open: Some(close),
            high: Some(close),
            low: Some(close),
            close,
            volume: None,
        })
        .collect()
}

/// Deterministic zig-zag around an upward drift, with a little
/// pseudo-random jitter so regressions never see a degenerate design.
pub fn wavy_closes(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| {
            let jitter = ((i * 7919) % 101) as f64 / 101.0 - 0.5;
            100.0 + 0.3 * i as f64 + 4.0 * ((i as f64) * 0.7).sin() + 2.0 * jitter
        })
        .collect()
}

#[derive(Clone, Default)]
pub struct StubMarket {
    /// `None` simulates an unreachable provider.
    pub bars: Option<Vec<DailyBar>>,
    pub calls: Arc<AtomicUsize>,
}

impl StubMarket {
    pub fn with_closes(closes: &[f64]) -> Self {
        StubMarket {
            bars: Some(bars_from(closes)),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn unreachable() -> Self {
        StubMarket {
            bars: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl MarketDataProvider for StubMarket {
    async fn daily_bars(&self, _ticker: &str, _start: NaiveDate, _end: NaiveDate) -> Result<Vec<DailyBar>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.bars {
            Some(bars) if bars.is_empty() => Err(AnalysisError::DataUnavailable("no bars".to_string())),
            Some(bars) => Ok(bars.clone()),
            None => Err(AnalysisError::ExternalService("connection refused".to_string())),
        }
    }
}

#[derive(Clone, Default)]
pub struct StubNews {
    pub articles: Option<Vec<NewsArticle>>,
}

impl NewsProvider for StubNews {
    async fn articles(&self, _query: &str) -> Result<Vec<NewsArticle>> {
        match &self.articles {
            Some(articles) => Ok(articles.clone()),
            None => Err(AnalysisError::ExternalService("feed unreachable".to_string())),
        }
    }
}

#[derive(Clone, Default)]
pub struct StubSpot;

impl SpotPriceProvider for StubSpot {
    async fn spot_price(&self, ticker: &str) -> Result<Option<SpotQuote>> {
        if ticker.eq_ignore_ascii_case("BTC-USD") {
            Ok(Some(SpotQuote {
                ticker: "BTC-USD".to_string(),
                coin_id: "bitcoin".to_string(),
                currency: "usd".to_string(),
                price: 67000.0,
                fetched_at: Utc::now(),
            }))
        } else {
            Ok(None)
        }
    }
}

pub fn article(title: &str, published_day: u64) -> NewsArticle {
    let published: DateTime<Utc> = day(published_day).and_hms_opt(12, 0, 0).unwrap().and_utc();
    NewsArticle {
        title: title.to_string(),
        description: String::new(),
        published: Some(published),
        url: None,
    }
}

pub fn pipeline(market: StubMarket, news: Option<StubNews>) -> AnalysisPipeline<StubMarket, StubNews> {
    AnalysisPipeline::new(
        market,
        news,
        Arc::new(LexiconScorer::new().unwrap()),
        PipelineSettings::default(),
    )
}
