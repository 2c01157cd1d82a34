//! Univariate price forecasts.
//!
//! Every model sees only the ordered closes and returns `horizon` raw point
//! predictions. [`forecast`] turns those into dated rows, applies the
//! configured [`ClipPolicy`] and labels each row against the last close.

use chrono::Days;

use crate::config::{ClipPolicy, ForecastModelKind, ForecastSettings};
use crate::errors::{AnalysisError, Result};
use crate::models::{ForecastRow, ForecastTable, PriceSeries, TrendLabel};
use crate::services::regression::{least_squares, mean, simple_ols, std_dev};

pub trait ForecastModel: Send + Sync {
    fn name(&self) -> String;

    fn fit_predict(&self, closes: &[f64], horizon: usize) -> Result<Vec<f64>>;
}

/// Straight line through the closes against their index.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearTrend;

impl ForecastModel for LinearTrend {
    fn name(&self) -> String {
        "linear_trend".to_string()
    }

    fn fit_predict(&self, closes: &[f64], horizon: usize) -> Result<Vec<f64>> {
        let x: Vec<f64> = (0..closes.len()).map(|i| i as f64).collect();
        let fit = simple_ols(&x, closes)?;
        let n = closes.len();
        Ok((n..n + horizon).map(|t| fit.predict(t as f64)).collect())
    }
}

/// ARIMA(p, d, 0): AR(p) with intercept fitted by conditional least squares on
/// the `d`-times differenced closes.
#[derive(Debug, Clone, Copy)]
pub struct Arima {
    pub p: usize,
    pub d: usize,
}

impl ForecastModel for Arima {
    fn name(&self) -> String {
        format!("arima({},{},0)", self.p, self.d)
    }

    fn fit_predict(&self, closes: &[f64], horizon: usize) -> Result<Vec<f64>> {
        if self.p == 0 {
            return Err(AnalysisError::InvalidParameter("ARIMA requires p >= 1".to_string()));
        }

        let mut levels = vec![closes.to_vec()];
        for _ in 0..self.d {
            let next = difference(levels.last().map(Vec::as_slice).unwrap_or_default());
            levels.push(next);
        }
        let z = &levels[self.d];

        // p lagged values per row plus one more row than coefficients
        let required = 2 * self.p + 2;
        if z.len() < required {
            return Err(AnalysisError::ModelFit(format!(
                "ARIMA({},{},0) needs {} closes, got {}",
                self.p,
                self.d,
                required + self.d,
                closes.len()
            )));
        }

        let drift = mean(z).unwrap_or(0.0);
        let predicted = if is_flat(z) {
            // nothing to regress on; the differenced series just repeats
            vec![drift; horizon]
        } else {
            match self.fit(z) {
                Ok(coefficients) => {
                    let mut history = z.clone();
                    let mut predicted = Vec::with_capacity(horizon);
                    for _ in 0..horizon {
                        let t = history.len();
                        let value = coefficients[0]
                            + (1..=self.p)
                                .map(|lag| coefficients[lag] * history[t - lag])
                                .sum::<f64>();
                        history.push(value);
                        predicted.push(value);
                    }
                    predicted
                }
                Err(AnalysisError::ModelFit(reason)) => {
                    tracing::debug!("{} fit degenerate ({}), extending mean drift", self.name(), reason);
                    vec![drift; horizon]
                }
                Err(e) => return Err(e),
            }
        };

        let mut tails: Vec<f64> = levels[..self.d]
            .iter()
            .map(|level| level.last().copied().unwrap_or(0.0))
            .collect();
        Ok(predicted
            .into_iter()
            .map(|mut value| {
                for level in (0..self.d).rev() {
                    value += tails[level];
                    tails[level] = value;
                }
                value
            })
            .collect())
    }
}

impl Arima {
    fn fit(&self, z: &[f64]) -> Result<Vec<f64>> {
        let design: Vec<Vec<f64>> = (self.p..z.len())
            .map(|t| {
                let mut row = Vec::with_capacity(self.p + 1);
                row.push(1.0);
                row.extend((1..=self.p).map(|lag| z[t - lag]));
                row
            })
            .collect();
        least_squares(&design, &z[self.p..])
    }
}

/// True when the spread is rounding noise next to the level.
fn is_flat(values: &[f64]) -> bool {
    let scale = values.iter().fold(1.0_f64, |acc, v| acc.max(v.abs()));
    std_dev(values).map_or(true, |sd| sd <= 1e-9 * scale)
}

fn difference(values: &[f64]) -> Vec<f64> {
    values.windows(2).map(|w| w[1] - w[0]).collect()
}

/// Linear trend plus the mean residual of each phase of a fixed cycle.
#[derive(Debug, Clone, Copy)]
pub struct SeasonalAdditive {
    pub period: usize,
}

impl ForecastModel for SeasonalAdditive {
    fn name(&self) -> String {
        format!("seasonal_additive({})", self.period)
    }

    fn fit_predict(&self, closes: &[f64], horizon: usize) -> Result<Vec<f64>> {
        if self.period < 2 {
            return Err(AnalysisError::InvalidParameter(
                "seasonal period must be at least 2".to_string(),
            ));
        }
        if closes.len() < 2 * self.period {
            return Err(AnalysisError::ModelFit(format!(
                "two full cycles of {} closes are required, got {}",
                self.period,
                closes.len()
            )));
        }

        let x: Vec<f64> = (0..closes.len()).map(|i| i as f64).collect();
        let trend = simple_ols(&x, closes)?;

        let mut buckets = vec![Vec::new(); self.period];
        for (t, close) in closes.iter().enumerate() {
            buckets[t % self.period].push(close - trend.predict(t as f64));
        }
        let seasonal: Vec<f64> = buckets.iter().map(|b| mean(b).unwrap_or(0.0)).collect();

        let n = closes.len();
        Ok((n..n + horizon)
            .map(|t| trend.predict(t as f64) + seasonal[t % self.period])
            .collect())
    }
}

pub fn model_for(kind: &ForecastModelKind) -> Box<dyn ForecastModel> {
    match *kind {
        ForecastModelKind::LinearTrend => Box::new(LinearTrend),
        ForecastModelKind::Arima { p, d } => Box::new(Arima { p, d }),
        ForecastModelKind::SeasonalAdditive { period } => Box::new(SeasonalAdditive { period }),
    }
}

/// Lower and upper bound for predictions, `None` when clipping is off.
pub fn clip_band(policy: &ClipPolicy, closes: &[f64]) -> Option<(f64, f64)> {
    let last = *closes.last()?;
    match *policy {
        ClipPolicy::None => None,
        ClipPolicy::Percent { pct } => {
            let delta = last.abs() * pct / 100.0;
            Some((last - delta, last + delta))
        }
        ClipPolicy::Volatility { sigmas, window } => {
            let start = closes.len().saturating_sub(window);
            let sd = std_dev(&closes[start..])?;
            Some((last - sigmas * sd, last + sigmas * sd))
        }
    }
}

pub fn forecast(series: &PriceSeries, horizon: usize, settings: &ForecastSettings) -> Result<ForecastTable> {
    forecast_with(series, horizon, settings, model_for(&settings.model).as_ref())
}

pub fn forecast_with(
    series: &PriceSeries,
    horizon: usize,
    settings: &ForecastSettings,
    model: &dyn ForecastModel,
) -> Result<ForecastTable> {
    if horizon == 0 || horizon > settings.max_horizon {
        return Err(AnalysisError::InvalidParameter(format!(
            "forecast horizon must be between 1 and {}, got {}",
            settings.max_horizon, horizon
        )));
    }
    let last_observed = *series
        .last()
        .ok_or_else(|| AnalysisError::DataUnavailable("nothing to forecast from".to_string()))?;

    let closes = series.closes();
    let raw = model.fit_predict(&closes, horizon)?;
    if raw.len() != horizon || raw.iter().any(|v| !v.is_finite()) {
        return Err(AnalysisError::ModelFit(format!(
            "{} produced an unusable forecast",
            model.name()
        )));
    }

    let band = clip_band(&settings.clip, &closes);
    let mut clipped_rows = 0;
    let mut rows = Vec::with_capacity(horizon);

    for (step, value) in raw.into_iter().enumerate() {
        let predicted_price = match band {
            Some((low, high)) if value < low || value > high => {
                clipped_rows += 1;
                value.clamp(low, high)
            }
            _ => value,
        };
        let date = last_observed
            .date
            .checked_add_days(Days::new(step as u64 + 1))
            .ok_or_else(|| AnalysisError::InvalidDataFormat("forecast date out of range".to_string()))?;
        let trend = if predicted_price > last_observed.close {
            TrendLabel::Up
        } else {
            TrendLabel::Down
        };
        rows.push(ForecastRow {
            date,
            predicted_price,
            trend,
        });
    }

    if clipped_rows > 0 {
        tracing::info!("{} of {} forecast rows clipped", clipped_rows, horizon);
    }

    Ok(ForecastTable {
        model: model.name(),
        horizon,
        last_observed,
        rows,
        clipped_rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_trend_extends_the_line() {
        let closes: Vec<f64> = (0..10).map(|i| 100.0 + 2.0 * i as f64).collect();
        let out = LinearTrend.fit_predict(&closes, 3).unwrap();
        for (i, v) in out.iter().enumerate() {
            assert!((v - (120.0 + 2.0 * i as f64)).abs() < 1e-9);
        }
    }

    #[test]
    fn arima_with_constant_drift_keeps_drifting() {
        let closes: Vec<f64> = (0..30).map(|i| 50.0 + i as f64).collect();
        let out = Arima { p: 2, d: 1 }.fit_predict(&closes, 4).unwrap();
        assert_eq!(out, vec![80.0, 81.0, 82.0, 83.0]);
    }

    #[test]
    fn arima_handles_float_noise_in_differences() {
        let closes: Vec<f64> = (0..120).map(|i| 100.0 + 0.1 * i as f64).collect();
        let out = Arima { p: 5, d: 1 }.fit_predict(&closes, 3).unwrap();
        for (i, v) in out.iter().enumerate() {
            assert!((v - (112.0 + 0.1 * i as f64)).abs() < 1e-6);
        }
    }

    #[test]
    fn arima_recovers_ar1_process() {
        // z_t = 1 + 0.5 z_{t-1}, no noise
        let mut z = vec![0.0];
        for _ in 0..40 {
            let prev = *z.last().unwrap();
            z.push(1.0 + 0.5 * prev);
        }
        let closes = z;
        let out = Arima { p: 1, d: 0 }.fit_predict(&closes, 2).unwrap();
        assert!((out[0] - 2.0).abs() < 0.05);
        assert!((out[1] - 2.0).abs() < 0.05);
    }

    #[test]
    fn arima_rejects_short_history() {
        let err = Arima { p: 5, d: 1 }.fit_predict(&[1.0, 2.0, 3.0], 2).unwrap_err();
        assert_eq!(err.kind(), "model_fit_error");
    }

    #[test]
    fn seasonal_model_repeats_cycle() {
        let pattern = [1.0, -1.0, -1.0, 1.0];
        let closes: Vec<f64> = (0..16).map(|i| 10.0 + pattern[i % 4]).collect();
        let out = SeasonalAdditive { period: 4 }.fit_predict(&closes, 4).unwrap();
        for (i, v) in out.iter().enumerate() {
            assert!((v - (10.0 + pattern[(16 + i) % 4])).abs() < 1e-6);
        }
    }

    #[test]
    fn percent_band_is_symmetric_around_last_close() {
        let band = clip_band(&ClipPolicy::Percent { pct: 10.0 }, &[90.0, 100.0]).unwrap();
        assert_eq!(band, (90.0, 110.0));
        assert_eq!(clip_band(&ClipPolicy::None, &[1.0]), None);
    }
}
