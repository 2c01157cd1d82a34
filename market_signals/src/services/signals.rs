use crate::config::IndicatorSettings;
use crate::models::{
    BandPosition, IndicatorRow, IndicatorTable, MacdBias, Momentum, SignalEvent, SignalKind,
    SignalSnapshot, Trend,
};

pub fn classify_trend(row: &IndicatorRow) -> Trend {
    if row.ema_short > row.ema_long {
        Trend::Up
    } else {
        Trend::Down
    }
}

pub fn classify_momentum(row: &IndicatorRow, settings: &IndicatorSettings) -> Momentum {
    if row.rsi > settings.overbought {
        Momentum::Overbought
    } else if row.rsi < settings.oversold {
        Momentum::Oversold
    } else {
        Momentum::Neutral
    }
}

pub fn classify_band(row: &IndicatorRow) -> BandPosition {
    if row.close > row.bollinger.upper {
        BandPosition::Above
    } else if row.close < row.bollinger.lower {
        BandPosition::Below
    } else {
        BandPosition::Inside
    }
}

pub fn classify_macd(row: &IndicatorRow) -> Option<MacdBias> {
    row.macd.map(|m| {
        if m.macd > m.signal {
            MacdBias::Bullish
        } else {
            MacdBias::Bearish
        }
    })
}

/// Classifies the most recent row; `None` for an empty table.
pub fn snapshot(table: &IndicatorTable, settings: &IndicatorSettings) -> Option<SignalSnapshot> {
    let row = table.latest()?;
    Some(SignalSnapshot {
        date: row.date,
        close: row.close,
        rsi: row.rsi,
        trend: classify_trend(row),
        momentum: classify_momentum(row, settings),
        band_position: classify_band(row),
        macd_bias: classify_macd(row),
    })
}

/// Entry: oversold while the short EMA is above the long one.
/// Exit: overbought while the short EMA is below the long one.
pub fn scan_events(table: &IndicatorTable, settings: &IndicatorSettings) -> Vec<SignalEvent> {
    table
        .rows
        .iter()
        .filter_map(|row| {
            let kind = match (classify_momentum(row, settings), classify_trend(row)) {
                (Momentum::Oversold, Trend::Up) => SignalKind::Entry,
                (Momentum::Overbought, Trend::Down) => SignalKind::Exit,
                _ => return None,
            };
            Some(SignalEvent {
                date: row.date,
                close: row.close,
                rsi: row.rsi,
                kind,
            })
        })
        .collect()
}
