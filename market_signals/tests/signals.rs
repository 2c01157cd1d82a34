mod common;

use common::day;
use market_signals::config::IndicatorSettings;
use market_signals::models::{
    BandPosition, BollingerValue, IndicatorRow, IndicatorTable, MacdBias, MacdValue, Momentum,
    SignalKind, Trend,
};
use market_signals::services::signals;

fn row(offset: u64, close: f64, ema_short: f64, ema_long: f64, rsi: f64) -> IndicatorRow {
    IndicatorRow {
        date: day(offset),
        close,
        ema_short,
        ema_long,
        sma: None,
        rsi,
        bollinger: BollingerValue {
            upper: 110.0,
            middle: 100.0,
            lower: 90.0,
        },
        macd: None,
    }
}

#[test]
fn trend_follows_ema_crossover() {
    assert_eq!(signals::classify_trend(&row(0, 100.0, 101.0, 100.0, 50.0)), Trend::Up);
    assert_eq!(signals::classify_trend(&row(0, 100.0, 99.0, 100.0, 50.0)), Trend::Down);
    // equal averages are not an uptrend
    assert_eq!(signals::classify_trend(&row(0, 100.0, 100.0, 100.0, 50.0)), Trend::Down);
}

#[test]
fn momentum_thresholds_are_strict() {
    let settings = IndicatorSettings::default();
    let at = |rsi| signals::classify_momentum(&row(0, 100.0, 1.0, 1.0, rsi), &settings);

    assert_eq!(at(70.5), Momentum::Overbought);
    assert_eq!(at(70.0), Momentum::Neutral);
    assert_eq!(at(30.0), Momentum::Neutral);
    assert_eq!(at(29.9), Momentum::Oversold);
}

#[test]
fn band_position_against_envelope() {
    assert_eq!(signals::classify_band(&row(0, 111.0, 1.0, 1.0, 50.0)), BandPosition::Above);
    assert_eq!(signals::classify_band(&row(0, 89.0, 1.0, 1.0, 50.0)), BandPosition::Below);
    assert_eq!(signals::classify_band(&row(0, 110.0, 1.0, 1.0, 50.0)), BandPosition::Inside);
}

#[test]
fn macd_bias_only_when_enabled() {
    let mut r = row(0, 100.0, 1.0, 1.0, 50.0);
    assert_eq!(signals::classify_macd(&r), None);

    r.macd = Some(MacdValue {
        macd: 1.5,
        signal: 1.0,
        histogram: 0.5,
    });
    assert_eq!(signals::classify_macd(&r), Some(MacdBias::Bullish));
}

#[test]
fn snapshot_reads_latest_row_only() {
    let settings = IndicatorSettings::default();
    let table = IndicatorTable {
        rows: vec![
            row(0, 100.0, 99.0, 100.0, 20.0),
            row(1, 120.0, 105.0, 100.0, 80.0),
        ],
    };

    let snapshot = signals::snapshot(&table, &settings).unwrap();
    assert_eq!(snapshot.date, day(1));
    assert_eq!(snapshot.trend, Trend::Up);
    assert_eq!(snapshot.momentum, Momentum::Overbought);
    assert_eq!(snapshot.band_position, BandPosition::Above);

    assert!(signals::snapshot(&IndicatorTable::default(), &settings).is_none());
}

#[test]
fn events_need_both_conditions() {
    let settings = IndicatorSettings::default();
    let table = IndicatorTable {
        rows: vec![
            row(0, 95.0, 101.0, 100.0, 25.0), // oversold in uptrend: entry
            row(1, 94.0, 99.0, 100.0, 25.0),  // oversold in downtrend: nothing
            row(2, 96.0, 101.0, 100.0, 45.0), // neutral
            row(3, 108.0, 99.0, 100.0, 75.0), // overbought in downtrend: exit
            row(4, 109.0, 101.0, 100.0, 75.0),
        ],
    };

    let events = signals::scan_events(&table, &settings);
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].kind, SignalKind::Entry);
    assert_eq!(events[0].date, day(0));
    assert_eq!(events[1].kind, SignalKind::Exit);
    assert_eq!(events[1].date, day(3));
}
