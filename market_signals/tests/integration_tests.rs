mod common;

use common::{day, series_from, wavy_closes, StubMarket};
use market_signals::config::{ClipPolicy, ForecastModelKind, MacdSettings};
use market_signals::holders::{CacheKey, PriceCache};
use market_signals::models::PricePoint;
use market_signals::services::export::{indicator_csv_string, CSV_HEADER};
use market_signals::services::indicators::compute_indicators;
use market_signals::*;

#[tokio::test]
async fn test_price_cache() {
    let cache = PriceCache::new();
    let key = CacheKey::new("btc-usd", day(0), day(9));
    assert_eq!(key.ticker, "BTC-USD");

    assert!(cache.get(&key).await.is_none());
    cache.insert(key.clone(), series_from(&[1.0, 2.0])).await;
    assert_eq!(cache.len().await, 1);
    assert_eq!(cache.get(&key).await.unwrap().len(), 2);

    // same key regardless of ticker case
    assert!(cache.get(&CacheKey::new("BTC-USD", day(0), day(9))).await.is_some());

    cache.clear().await;
    assert!(cache.is_empty().await);
}

#[tokio::test]
async fn test_cache_trims_to_requested_window() {
    let cache = PriceCache::new();
    let market = StubMarket::with_closes(&wavy_closes(30));

    let series = cache.get_or_fetch(&market, "AAPL", day(5), day(14)).await.unwrap();
    assert_eq!(series.len(), 10);
    assert_eq!(series.first().unwrap().date, day(5));
    assert_eq!(series.last().unwrap().date, day(14));
}

#[test]
fn test_series_cleaning() {
    let raw = vec![
        PricePoint { date: day(2), close: 12.0 },
        PricePoint { date: day(0), close: 10.0 },
        PricePoint { date: day(1), close: f64::NAN },
        PricePoint { date: day(2), close: 12.5 },
        PricePoint { date: day(3), close: 13.0 },
    ];
    let series = PriceSeries::from_unsorted(raw.clone());
    let dates: Vec<_> = series.points().iter().map(|p| p.date).collect();
    assert_eq!(dates, vec![day(0), day(2), day(3)]);
    assert_eq!(series.closes(), vec![10.0, 12.5, 13.0]);

    // the strict constructor refuses the same input
    assert!(PriceSeries::new(raw).is_err());
    assert!(PriceSeries::new(vec![
        PricePoint { date: day(0), close: 1.0 },
        PricePoint { date: day(0), close: 2.0 },
    ])
    .is_err());
}

#[test]
fn test_watchlist_is_append_only_and_unique() {
    let mut watchlist = Watchlist::new(["btc-usd", "AAPL"]);
    assert_eq!(watchlist.len(), 2);

    assert!(watchlist.add("eth-usd"));
    assert!(!watchlist.add("BTC-USD"));
    assert!(!watchlist.add("   "));
    assert!(watchlist.contains("eth-USD"));
    assert_eq!(watchlist.tickers(), ["BTC-USD", "AAPL", "ETH-USD"]);
}

#[test]
fn test_config_validation() {
    let mut config = AppConfig::default();

    // defaults must pass
    assert!(config.validate().is_ok());

    config.indicators.ema_short = 60;
    assert!(config.validate().is_err());
    config.indicators.ema_short = 20;

    config.indicators.oversold = 80.0;
    assert!(config.validate().is_err());
    config.indicators.oversold = 30.0;

    config.indicators.macd = Some(MacdSettings { fast: 26, slow: 12, signal: 9 });
    assert!(config.validate().is_err());
    config.indicators.macd = None;
    assert!(config.validate().is_ok());

    config.forecast.model = ForecastModelKind::Arima { p: 0, d: 1 };
    assert!(config.validate().is_err());
    config.forecast.model = ForecastModelKind::LinearTrend;

    config.forecast.clip = ClipPolicy::Percent { pct: -5.0 };
    assert!(config.validate().is_err());
    config.forecast.clip = ClipPolicy::Volatility { sigmas: 2.0, window: 20 };
    assert!(config.validate().is_ok());

    config.news.max_articles = 0;
    assert!(config.validate().is_err());
    config.news.max_articles = 2000;
    assert!(config.validate().is_err());
    config.news.max_articles = 50;

    config.providers.request_timeout_secs = 0;
    assert!(config.validate().is_err());
}

#[test]
fn test_default_coin_map() {
    let config = AppConfig::default();
    assert_eq!(config.spot.coin_id("BTC-USD"), Some("bitcoin"));
    assert_eq!(config.spot.coin_id("matic-usd"), Some("matic-network"));
    assert_eq!(config.spot.coin_id("TSLA"), None);
}

#[test]
fn test_csv_export() {
    let config = AppConfig::default();
    let table = compute_indicators(&series_from(&wavy_closes(55)), &config.indicators).unwrap();
    let csv = indicator_csv_string(&table).unwrap();

    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), table.len() + 1);
    assert_eq!(lines[0], CSV_HEADER.join(","));
    assert!(lines[1].starts_with("2024-02-19,"));
    assert_eq!(lines[1].split(',').count(), CSV_HEADER.len());
}

#[test]
fn test_csv_export_leaves_disabled_cells_empty() {
    let mut config = AppConfig::default();
    config.indicators.sma = None;
    config.indicators.macd = None;
    let table = compute_indicators(&series_from(&wavy_closes(55)), &config.indicators).unwrap();
    let csv = indicator_csv_string(&table).unwrap();

    let first_row = csv.lines().nth(1).unwrap();
    let cells: Vec<&str> = first_row.split(',').collect();
    assert_eq!(cells[4], "");
    assert_eq!(&cells[9..], ["", "", ""]);
}

#[test]
fn test_block_on_pipeline() {
    let runner = common::pipeline(StubMarket::with_closes(&wavy_closes(70)), None);
    let report = tokio_test::block_on(runner.run(&AnalysisRequest {
        ticker: "AAPL".to_string(),
        start: day(0),
        end: day(69),
        forecast_days: None,
        include_sentiment: false,
    }))
    .unwrap();
    assert_eq!(report.indicators.len(), 21);
}
