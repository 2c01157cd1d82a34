use std::sync::Arc;

use chrono::Utc;

use crate::config::{AppConfig, ForecastSettings, IndicatorSettings, NewsSettings};
use crate::errors::{AnalysisError, Result};
use crate::holders::PriceCache;
use crate::models::{AnalysisReport, AnalysisRequest, PriceSeries, SentimentCorrelation, StageWarning};
use crate::providers::{MarketDataProvider, NewsProvider};
use crate::services::sentiment::{self, PolarityScorer};
use crate::services::{forecast, indicators, signals, statistics};

/// Everything a run needs to know, owned by whoever builds the pipeline.
#[derive(Debug, Clone, Default)]
pub struct PipelineSettings {
    pub indicators: IndicatorSettings,
    pub forecast: ForecastSettings,
    pub news: NewsSettings,
}

impl From<&AppConfig> for PipelineSettings {
    fn from(config: &AppConfig) -> Self {
        PipelineSettings {
            indicators: config.indicators.clone(),
            forecast: config.forecast.clone(),
            news: config.news.clone(),
        }
    }
}

/// Fetch → clean → indicators → [forecast] → [sentiment join] for one request.
pub struct AnalysisPipeline<M, N> {
    market: M,
    news: Option<N>,
    cache: PriceCache,
    scorer: Arc<dyn PolarityScorer>,
    settings: PipelineSettings,
}

impl<M, N> AnalysisPipeline<M, N>
where
    M: MarketDataProvider,
    N: NewsProvider,
{
    pub fn new(
        market: M,
        news: Option<N>,
        scorer: Arc<dyn PolarityScorer>,
        settings: PipelineSettings,
    ) -> Self {
        AnalysisPipeline {
            market,
            news,
            cache: PriceCache::new(),
            scorer,
            settings,
        }
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    pub fn cache(&self) -> &PriceCache {
        &self.cache
    }

    pub fn validate(&self, request: &AnalysisRequest) -> Result<()> {
        if request.ticker.trim().is_empty() {
            return Err(AnalysisError::InvalidParameter("ticker cannot be empty".to_string()));
        }
        if request.start >= request.end {
            return Err(AnalysisError::InvalidParameter(format!(
                "start date {} must be before end date {}",
                request.start, request.end
            )));
        }
        if let Some(days) = request.forecast_days {
            let max = self.settings.forecast.max_horizon;
            if days == 0 || days > max {
                return Err(AnalysisError::InvalidParameter(format!(
                    "forecast_days must be between 1 and {}",
                    max
                )));
            }
        }
        Ok(())
    }

    pub async fn run(&self, request: &AnalysisRequest) -> Result<AnalysisReport> {
        self.validate(request)?;
        let ticker = request.ticker.trim().to_uppercase();
        tracing::info!("Starting analysis of {} for {}..{}", ticker, request.start, request.end);

        let series = self
            .cache
            .get_or_fetch(&self.market, &ticker, request.start, request.end)
            .await?;

        let required = self.settings.indicators.largest_window();
        let table = indicators::compute_indicators(&series, &self.settings.indicators)?;
        let latest = signals::snapshot(&table, &self.settings.indicators).ok_or(
            AnalysisError::InsufficientHistory {
                rows: series.len(),
                required,
            },
        )?;
        let events = signals::scan_events(&table, &self.settings.indicators);
        let price_statistics = statistics::price_statistics(&series)?;

        tracing::info!(
            "{}: {} rows, {} indicator rows, trend {:?}, momentum {:?}",
            ticker,
            series.len(),
            table.len(),
            latest.trend,
            latest.momentum
        );

        let mut warnings = Vec::new();

        let forecast = match request.forecast_days {
            Some(horizon) => match forecast::forecast(&series, horizon, &self.settings.forecast) {
                Ok(table) => Some(table),
                Err(e) => {
                    tracing::warn!("Forecast for {} failed: {}", ticker, e);
                    warnings.push(stage_warning("forecast", &e));
                    None
                }
            },
            None => None,
        };

        let sentiment = if request.include_sentiment {
            match self.sentiment(&ticker, &series).await {
                Ok(correlation) => Some(correlation),
                Err(e) => {
                    tracing::warn!("Sentiment join for {} failed: {}", ticker, e);
                    warnings.push(stage_warning("sentiment", &e));
                    None
                }
            }
        } else {
            None
        };

        Ok(AnalysisReport {
            ticker,
            start: request.start,
            end: request.end,
            generated_at: Utc::now(),
            status: "success".to_string(),
            rows_fetched: series.len(),
            price_statistics,
            indicators: table,
            latest,
            events,
            forecast,
            sentiment,
            warnings,
        })
    }

    async fn sentiment(&self, ticker: &str, series: &PriceSeries) -> Result<SentimentCorrelation> {
        let news = match (&self.news, self.settings.news.enabled) {
            (Some(news), true) => news,
            _ => {
                return Err(AnalysisError::DataUnavailable(
                    "no news source configured".to_string(),
                ))
            }
        };

        let query = sentiment::news_query_for(ticker);
        let articles = news.articles(&query).await?;
        if articles.is_empty() {
            return Err(AnalysisError::DataUnavailable(format!("no articles for '{}'", query)));
        }

        sentiment::correlate(
            &query,
            series,
            &articles,
            self.scorer.as_ref(),
            self.settings.news.lag_days,
        )
    }
}

fn stage_warning(stage: &str, error: &AnalysisError) -> StageWarning {
    StageWarning {
        stage: stage.to_string(),
        error_type: error.kind().to_string(),
        message: error.to_string(),
    }
}
