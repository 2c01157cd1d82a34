use std::sync::Arc;

pub mod config;
pub mod errors;
pub mod holders;
pub mod models;
pub mod providers;
pub mod routers;
pub mod services;

pub use config::{load_config, AppConfig};
pub use errors::{AnalysisError, Result};
pub use holders::PriceCache;
pub use models::{
    AnalysisReport, AnalysisRequest, IndicatorRow, IndicatorTable, PricePoint, PriceSeries,
    SignalSnapshot, Watchlist,
};
pub use providers::{
    CoinGeckoProvider, GoogleNewsProvider, MarketDataProvider, NewsProvider, SpotPriceProvider,
    YahooChartProvider,
};
pub use services::{AnalysisPipeline, LexiconScorer, PipelineSettings, PolarityScorer};

pub type DefaultPipeline = AnalysisPipeline<YahooChartProvider, GoogleNewsProvider>;

pub struct AppState<M = YahooChartProvider, N = GoogleNewsProvider, S = CoinGeckoProvider> {
    pub pipeline: Arc<AnalysisPipeline<M, N>>,
    pub spot: Arc<S>,
    pub watchlist: Watchlist,
}

// manual impl: providers themselves need not be Clone
impl<M, N, S> Clone for AppState<M, N, S> {
    fn clone(&self) -> Self {
        AppState {
            pipeline: Arc::clone(&self.pipeline),
            spot: Arc::clone(&self.spot),
            watchlist: self.watchlist.clone(),
        }
    }
}
