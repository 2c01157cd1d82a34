use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use serde_json::json;
use tower_http::cors::CorsLayer;

use crate::errors::AnalysisError;
use crate::models::{AnalysisRequest, SpotQuote};
use crate::providers::{MarketDataProvider, NewsProvider, SpotPriceProvider};
use crate::services::export;
use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
    pub version: String,
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub status: String,
    pub watchlist: Vec<String>,
    pub largest_indicator_window: usize,
    pub max_forecast_days: usize,
    pub cached_series: usize,
    pub available_endpoints: Vec<String>,
}

#[derive(Serialize)]
pub struct WatchlistQuote {
    pub ticker: String,
    pub quote: Option<SpotQuote>,
}

const MAX_CONCURRENT_QUOTES: usize = 4;

fn error_status(error: &AnalysisError) -> StatusCode {
    match error {
        AnalysisError::InvalidParameter(_) => StatusCode::BAD_REQUEST,
        AnalysisError::InsufficientHistory { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        AnalysisError::DataUnavailable(_) => StatusCode::NOT_FOUND,
        AnalysisError::ExternalService(_) | AnalysisError::HttpError(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(stage: &str, error: &AnalysisError) -> Response {
    if error.is_client_error() {
        tracing::warn!("Rejected {} request: {}", stage, error);
    } else {
        tracing::error!("{} failed: {}", stage, error);
    }
    (
        error_status(error),
        Json(json!({
            "status": "error",
            "message": error.to_string(),
            "error_type": error.kind(),
        })),
    )
        .into_response()
}

pub async fn run_analysis<M, N, S>(
    State(state): State<AppState<M, N, S>>,
    Json(req): Json<AnalysisRequest>,
) -> Response
where
    M: MarketDataProvider + 'static,
    N: NewsProvider + 'static,
    S: SpotPriceProvider + 'static,
{
    match state.pipeline.run(&req).await {
        Ok(report) => {
            tracing::info!("Analysis of {} completed", report.ticker);
            Json(report).into_response()
        }
        Err(e) => error_response("analysis", &e),
    }
}

pub async fn export_csv<M, N, S>(
    State(state): State<AppState<M, N, S>>,
    Json(req): Json<AnalysisRequest>,
) -> Response
where
    M: MarketDataProvider + 'static,
    N: NewsProvider + 'static,
    S: SpotPriceProvider + 'static,
{
    let report = match state.pipeline.run(&req).await {
        Ok(report) => report,
        Err(e) => return error_response("csv export", &e),
    };
    match export::indicator_csv_string(&report.indicators) {
        Ok(body) => (
            [(header::CONTENT_TYPE, "text/csv; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(e) => error_response("csv export", &e),
    }
}

pub async fn spot_price<M, N, S>(
    State(state): State<AppState<M, N, S>>,
    Path(ticker): Path<String>,
) -> Response
where
    M: MarketDataProvider + 'static,
    N: NewsProvider + 'static,
    S: SpotPriceProvider + 'static,
{
    match state.spot.spot_price(&ticker).await {
        Ok(Some(quote)) => Json(quote).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "status": "unavailable",
                "message": format!("no live price source for {}", ticker),
            })),
        )
            .into_response(),
        Err(e) => error_response("spot price", &e),
    }
}

pub async fn watchlist_spot<M, N, S>(State(state): State<AppState<M, N, S>>) -> Json<Vec<WatchlistQuote>>
where
    M: MarketDataProvider + 'static,
    N: NewsProvider + 'static,
    S: SpotPriceProvider + 'static,
{
    let tickers = state.watchlist.tickers().to_vec();
    let quotes = stream::iter(tickers)
        .map(|ticker| {
            let spot = Arc::clone(&state.spot);
            async move {
                let quote = match spot.spot_price(&ticker).await {
                    Ok(quote) => quote,
                    Err(e) => {
                        tracing::warn!("Spot lookup for {} failed: {}", ticker, e);
                        None
                    }
                };
                WatchlistQuote { ticker, quote }
            }
        })
        .buffered(MAX_CONCURRENT_QUOTES)
        .collect::<Vec<_>>()
        .await;

    Json(quotes)
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        message: "Market signals API is running".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

pub async fn get_status<M, N, S>(State(state): State<AppState<M, N, S>>) -> Json<StatusResponse>
where
    M: MarketDataProvider + 'static,
    N: NewsProvider + 'static,
    S: SpotPriceProvider + 'static,
{
    let settings = state.pipeline.settings();
    Json(StatusResponse {
        status: "ready".to_string(),
        watchlist: state.watchlist.tickers().to_vec(),
        largest_indicator_window: settings.indicators.largest_window(),
        max_forecast_days: settings.forecast.max_horizon,
        cached_series: state.pipeline.cache().len().await,
        available_endpoints: vec![
            "/".to_string(),
            "/status".to_string(),
            "/api/analysis".to_string(),
            "/api/analysis/csv".to_string(),
            "/api/spot/:ticker".to_string(),
            "/api/watchlist/spot".to_string(),
        ],
    })
}

pub fn create_routes<M, N, S>(state: AppState<M, N, S>) -> Router
where
    M: MarketDataProvider + 'static,
    N: NewsProvider + 'static,
    S: SpotPriceProvider + 'static,
{
    Router::new()
        .route("/", get(health_check))
        .route("/status", get(get_status::<M, N, S>))
        .route("/api/analysis", post(run_analysis::<M, N, S>))
        .route("/api/analysis/csv", post(export_csv::<M, N, S>))
        .route("/api/spot/:ticker", get(spot_price::<M, N, S>))
        .route("/api/watchlist/spot", get(watchlist_spot::<M, N, S>))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
