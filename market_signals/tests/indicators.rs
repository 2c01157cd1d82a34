mod common;

use common::{day, series_from, wavy_closes};
use market_signals::config::IndicatorSettings;
use market_signals::models::{BandPosition, Momentum, Trend};
use market_signals::services::{indicators::compute_indicators, signals};

#[test]
fn table_drops_warm_up_rows() {
    let settings = IndicatorSettings::default();
    assert_eq!(settings.largest_window(), 50);

    let series = series_from(&wavy_closes(120));
    let table = compute_indicators(&series, &settings).unwrap();

    assert_eq!(table.len(), 120 - (50 - 1));
    assert_eq!(table.rows[0].date, day(49));
    assert_eq!(table.latest().unwrap().date, day(119));
}

#[test]
fn table_length_at_window_boundary() {
    let settings = IndicatorSettings::default();

    let exact = compute_indicators(&series_from(&wavy_closes(50)), &settings).unwrap();
    assert_eq!(exact.len(), 1);

    let short = compute_indicators(&series_from(&wavy_closes(49)), &settings).unwrap();
    assert!(short.is_empty());
}

#[test]
fn rsi_and_bands_stay_ordered() {
    let settings = IndicatorSettings::default();
    let table = compute_indicators(&series_from(&wavy_closes(200)), &settings).unwrap();

    for row in &table.rows {
        assert!((0.0..=100.0).contains(&row.rsi), "rsi {} out of range", row.rsi);
        assert!(row.bollinger.upper >= row.bollinger.middle);
        assert!(row.bollinger.middle >= row.bollinger.lower);
        assert!(row.sma.is_some());
        assert!(row.macd.is_some());
    }
}

#[test]
fn steady_rise_is_overbought_uptrend() {
    let closes: Vec<f64> = (0..80).map(|i| 100.0 + 0.5 * i as f64).collect();
    let settings = IndicatorSettings::default();
    let table = compute_indicators(&series_from(&closes), &settings).unwrap();

    let snapshot = signals::snapshot(&table, &settings).unwrap();
    assert!(snapshot.rsi > 70.0);
    assert_eq!(snapshot.momentum, Momentum::Overbought);
    assert_eq!(snapshot.trend, Trend::Up);
}

#[test]
fn steady_fall_is_oversold_downtrend() {
    let closes: Vec<f64> = (0..80).map(|i| 200.0 - 0.5 * i as f64).collect();
    let settings = IndicatorSettings::default();
    let table = compute_indicators(&series_from(&closes), &settings).unwrap();

    let snapshot = signals::snapshot(&table, &settings).unwrap();
    assert!(snapshot.rsi < 30.0);
    assert_eq!(snapshot.momentum, Momentum::Oversold);
    assert_eq!(snapshot.trend, Trend::Down);
}

#[test]
fn constant_series_collapses_every_indicator() {
    let price = 250.0;
    let settings = IndicatorSettings::default();
    let table = compute_indicators(&series_from(&[price; 60]), &settings).unwrap();
    assert_eq!(table.len(), 11);

    for row in &table.rows {
        assert!((row.ema_short - price).abs() < 1e-9);
        assert!((row.ema_long - price).abs() < 1e-9);
        assert!((row.sma.unwrap() - price).abs() < 1e-9);
        assert!((row.bollinger.upper - price).abs() < 1e-9);
        assert!((row.bollinger.lower - price).abs() < 1e-9);
        assert!((row.rsi - 50.0).abs() < 1e-6);
    }

    let snapshot = signals::snapshot(&table, &settings).unwrap();
    assert_eq!(snapshot.momentum, Momentum::Neutral);
    assert_eq!(snapshot.band_position, BandPosition::Inside);
}

#[test]
fn disabled_indicators_do_not_extend_warm_up() {
    let settings = IndicatorSettings {
        ema_short: 3,
        ema_long: 5,
        sma: None,
        rsi: 4,
        bollinger_period: 5,
        bollinger_k: 2.0,
        macd: None,
        ..IndicatorSettings::default()
    };
    assert_eq!(settings.largest_window(), 5);

    let table = compute_indicators(&series_from(&wavy_closes(10)), &settings).unwrap();
    assert_eq!(table.len(), 6);
    assert!(table.rows.iter().all(|r| r.sma.is_none() && r.macd.is_none()));
}

#[test]
fn longest_optional_window_gates_first_row() {
    let settings = IndicatorSettings {
        ema_short: 3,
        ema_long: 5,
        sma: Some(10),
        rsi: 4,
        bollinger_period: 5,
        bollinger_k: 2.0,
        macd: None,
        ..IndicatorSettings::default()
    };
    assert_eq!(settings.largest_window(), 10);

    let table = compute_indicators(&series_from(&wavy_closes(20)), &settings).unwrap();
    assert_eq!(table.len(), 11);
    assert_eq!(table.rows[0].date, day(9));
    assert!(table.rows.iter().all(|r| r.sma.is_some() && r.macd.is_none()));
}

#[test]
fn macd_window_counts_signal_line() {
    let settings = IndicatorSettings {
        ema_short: 3,
        ema_long: 5,
        sma: None,
        rsi: 4,
        bollinger_period: 5,
        ..IndicatorSettings::default()
    };
    // 26 + 9 - 1
    assert_eq!(settings.largest_window(), 34);
    let table = compute_indicators(&series_from(&wavy_closes(40)), &settings).unwrap();
    assert_eq!(table.len(), 40 - 33);
}

#[test]
fn inverted_ema_windows_are_rejected() {
    let settings = IndicatorSettings {
        ema_short: 50,
        ema_long: 20,
        ..IndicatorSettings::default()
    };
    let err = compute_indicators(&series_from(&wavy_closes(80)), &settings).unwrap_err();
    assert_eq!(err.kind(), "invalid_parameter");
}
