use ta::indicators::{
    BollingerBands, ExponentialMovingAverage, MovingAverageConvergenceDivergence,
    RelativeStrengthIndex, SimpleMovingAverage,
};
use ta::Next;

use crate::config::IndicatorSettings;
use crate::errors::{AnalysisError, Result};
use crate::models::{BollingerValue, IndicatorRow, IndicatorTable, MacdValue, PriceSeries};

const NEUTRAL_RSI: f64 = 50.0;

/// Runs every configured indicator over the closes and keeps only the rows
/// where all of them are past their warm-up window.
///
/// An indicator with window `w` is undefined for the first `w - 1` rows, so a
/// series of `n >= largest_window` closes yields `n - (largest_window - 1)`
/// rows. A shorter series yields an empty table; deciding what that means is
/// up to the caller.
pub fn compute_indicators(series: &PriceSeries, settings: &IndicatorSettings) -> Result<IndicatorTable> {
    settings
        .validate()
        .map_err(|e| AnalysisError::InvalidParameter(e.to_string()))?;

    let mut ema_short = ExponentialMovingAverage::new(settings.ema_short).map_err(invalid("ema_short"))?;
    let mut ema_long = ExponentialMovingAverage::new(settings.ema_long).map_err(invalid("ema_long"))?;
    let mut sma = settings
        .sma
        .map(|period| SimpleMovingAverage::new(period).map_err(invalid("sma")))
        .transpose()?;
    let mut rsi = RelativeStrengthIndex::new(settings.rsi).map_err(invalid("rsi"))?;
    let mut bollinger = BollingerBands::new(settings.bollinger_period, settings.bollinger_k)
        .map_err(invalid("bollinger"))?;
    let mut macd = settings
        .macd
        .as_ref()
        .map(|m| {
            MovingAverageConvergenceDivergence::new(m.fast, m.slow, m.signal).map_err(invalid("macd"))
        })
        .transpose()?;
    let macd_window = settings.macd.as_ref().map(|m| m.window());

    let mut rows = Vec::with_capacity(series.len().saturating_sub(settings.largest_window()));

    for (index, point) in series.points().iter().enumerate() {
        // every indicator is stepped on every close so their state stays aligned
        let ema_short_value = warmed(index, settings.ema_short, ema_short.next(point.close));
        let ema_long_value = warmed(index, settings.ema_long, ema_long.next(point.close));
        let sma_value = match (&mut sma, settings.sma) {
            (Some(indicator), Some(period)) => Some(warmed(index, period, indicator.next(point.close))),
            _ => None,
        };
        let rsi_value = warmed(index, settings.rsi, sanitize_rsi(rsi.next(point.close)));
        let bands = bollinger.next(point.close);
        let bands_value = warmed(
            index,
            settings.bollinger_period,
            BollingerValue {
                upper: bands.upper,
                middle: bands.average,
                lower: bands.lower,
            },
        );
        let macd_value = match (&mut macd, macd_window) {
            (Some(indicator), Some(window)) => {
                let out = indicator.next(point.close);
                Some(warmed(
                    index,
                    window,
                    MacdValue {
                        macd: out.macd,
                        signal: out.signal,
                        histogram: out.histogram,
                    },
                ))
            }
            _ => None,
        };

        let (Some(short), Some(long), Some(strength), Some(band)) =
            (ema_short_value, ema_long_value, rsi_value, bands_value)
        else {
            continue;
        };
        // an enabled optional indicator still warming up drops the row too
        let average = match sma_value {
            Some(None) => continue,
            enabled => enabled.flatten(),
        };
        let convergence = match macd_value {
            Some(None) => continue,
            enabled => enabled.flatten(),
        };

        rows.push(IndicatorRow {
            date: point.date,
            close: point.close,
            ema_short: short,
            ema_long: long,
            sma: average,
            rsi: strength,
            bollinger: band,
            macd: convergence,
        });
    }

    tracing::debug!(
        "Indicator pass kept {} of {} rows (largest window {})",
        rows.len(),
        series.len(),
        settings.largest_window()
    );

    Ok(IndicatorTable { rows })
}

fn warmed<T>(index: usize, window: usize, value: T) -> Option<T> {
    (index + 1 >= window).then_some(value)
}

/// A flat series has no gains or losses; report it as neutral.
fn sanitize_rsi(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 100.0)
    } else {
        NEUTRAL_RSI
    }
}

fn invalid(name: &'static str) -> impl Fn(ta::errors::TaError) -> AnalysisError {
    move |e| AnalysisError::InvalidParameter(format!("{}: {:?}", name, e))
}
