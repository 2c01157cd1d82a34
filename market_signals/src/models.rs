use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{AnalysisError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

/// One daily OHLC bar as delivered by a market-data provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyBar {
    pub date: NaiveDate,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: f64,
    pub volume: Option<f64>,
}

/// Ordered closing prices: dates strictly increasing, every close finite.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Builds a series from points that must already be ordered and unique.
    pub fn new(points: Vec<PricePoint>) -> Result<Self> {
        for pair in points.windows(2) {
            if pair[1].date <= pair[0].date {
                return Err(AnalysisError::InvalidDataFormat(format!(
                    "dates must be strictly increasing: {} followed by {}",
                    pair[0].date, pair[1].date
                )));
            }
        }
        if let Some(bad) = points.iter().find(|p| !p.close.is_finite()) {
            return Err(AnalysisError::InvalidDataFormat(format!(
                "non-finite close on {}",
                bad.date
            )));
        }
        Ok(PriceSeries { points })
    }

    /// Cleans raw provider output: drops non-finite closes, sorts by date and
    /// keeps the last observation for a repeated date.
    pub fn from_unsorted(points: Vec<PricePoint>) -> Self {
        let mut points: Vec<PricePoint> = points
            .into_iter()
            .filter(|p| p.close.is_finite())
            .collect();
        // stable sort keeps provider order within a date, so the last one wins below
        points.sort_by_key(|p| p.date);

        let mut cleaned: Vec<PricePoint> = Vec::with_capacity(points.len());
        for point in points {
            match cleaned.last_mut() {
                Some(last) if last.date == point.date => *last = point,
                _ => cleaned.push(point),
            }
        }
        PriceSeries { points: cleaned }
    }

    pub fn from_bars(bars: &[DailyBar]) -> Self {
        Self::from_unsorted(
            bars.iter()
                .map(|b| PricePoint {
                    date: b.date,
                    close: b.close,
                })
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn closes(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.close).collect()
    }

    pub fn first(&self) -> Option<&PricePoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&PricePoint> {
        self.points.last()
    }

    /// Points with `start <= date <= end`.
    pub fn window(&self, start: NaiveDate, end: NaiveDate) -> PriceSeries {
        PriceSeries {
            points: self
                .points
                .iter()
                .filter(|p| p.date >= start && p.date <= end)
                .copied()
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BollingerValue {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MacdValue {
    pub macd: f64,
    pub signal: f64,
    pub histogram: f64,
}

/// A fully populated row of the indicator table. `None` in `sma` or `macd`
/// means the indicator is switched off, never that it is warming up.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorRow {
    pub date: NaiveDate,
    pub close: f64,
    pub ema_short: f64,
    pub ema_long: f64,
    pub sma: Option<f64>,
    pub rsi: f64,
    pub bollinger: BollingerValue,
    pub macd: Option<MacdValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IndicatorTable {
    pub rows: Vec<IndicatorRow>,
}

impl IndicatorTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn latest(&self) -> Option<&IndicatorRow> {
        self.rows.last()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Momentum {
    Overbought,
    Oversold,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BandPosition {
    Above,
    Below,
    Inside,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MacdBias {
    Bullish,
    Bearish,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalSnapshot {
    pub date: NaiveDate,
    pub close: f64,
    pub rsi: f64,
    pub trend: Trend,
    pub momentum: Momentum,
    pub band_position: BandPosition,
    pub macd_bias: Option<MacdBias>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalKind {
    Entry,
    Exit,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalEvent {
    pub date: NaiveDate,
    pub close: f64,
    pub rsi: f64,
    pub kind: SignalKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendLabel {
    Up,
    Down,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastRow {
    pub date: NaiveDate,
    pub predicted_price: f64,
    pub trend: TrendLabel,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastTable {
    pub model: String,
    pub horizon: usize,
    pub last_observed: PricePoint,
    pub rows: Vec<ForecastRow>,
    /// Rows whose raw prediction was pulled back inside the clip band.
    pub clipped_rows: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsArticle {
    pub title: String,
    pub description: String,
    pub published: Option<DateTime<Utc>>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SentimentSample {
    pub date: NaiveDate,
    pub polarity: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SentimentJoinRow {
    pub date: NaiveDate,
    pub close: f64,
    pub lagged_sentiment: f64,
}

/// In-sample fit of price on lagged daily sentiment. This describes how the
/// two series moved together over the analysed window; it is not a validated
/// predictor and carries no out-of-sample claim.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentimentCorrelation {
    pub query: String,
    pub lag_days: i64,
    pub articles_scored: usize,
    pub days_with_news: usize,
    /// `None` when either series has zero variance.
    pub correlation: Option<f64>,
    pub slope: f64,
    pub intercept: f64,
    pub rows: Vec<SentimentJoinRow>,
    pub fitted: Vec<PricePoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceStatistics {
    pub start_price: f64,
    pub end_price: f64,
    pub price_change_absolute: f64,
    pub price_change_percentage: f64,
    pub highest_price: f64,
    pub lowest_price: f64,
    pub average_price: f64,
    pub volatility: f64,
    pub trend: String, // "bullish", "bearish", "sideways"
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpotQuote {
    pub ticker: String,
    pub coin_id: String,
    pub currency: String,
    pub price: f64,
    pub fetched_at: DateTime<Utc>,
}

/// Tickers the caller works with. Append-only and owned by whoever drives
/// the pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Watchlist {
    tickers: Vec<String>,
}

impl Watchlist {
    pub fn new<I, S>(tickers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut list = Watchlist::default();
        for ticker in tickers {
            list.add(ticker.as_ref());
        }
        list
    }

    /// Adds a ticker (upper-cased). Returns false for blanks and duplicates.
    pub fn add(&mut self, ticker: &str) -> bool {
        let normalized = ticker.trim().to_uppercase();
        if normalized.is_empty() || self.contains(&normalized) {
            return false;
        }
        self.tickers.push(normalized);
        true
    }

    pub fn contains(&self, ticker: &str) -> bool {
        let normalized = ticker.trim().to_uppercase();
        self.tickers.iter().any(|t| *t == normalized)
    }

    pub fn tickers(&self) -> &[String] {
        &self.tickers
    }

    pub fn len(&self) -> usize {
        self.tickers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickers.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub ticker: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    #[serde(default)]
    pub forecast_days: Option<usize>,
    #[serde(default)]
    pub include_sentiment: bool,
}

/// An optional stage that failed without aborting the run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageWarning {
    pub stage: String,
    pub error_type: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub ticker: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub generated_at: DateTime<Utc>,
    pub status: String,
    pub rows_fetched: usize,
    pub price_statistics: PriceStatistics,
    pub indicators: IndicatorTable,
    pub latest: SignalSnapshot,
    pub events: Vec<SignalEvent>,
    pub forecast: Option<ForecastTable>,
    pub sentiment: Option<SentimentCorrelation>,
    pub warnings: Vec<StageWarning>,
}
