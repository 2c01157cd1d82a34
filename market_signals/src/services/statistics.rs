use crate::errors::{AnalysisError, Result};
use crate::models::{PriceSeries, PriceStatistics};

pub fn price_statistics(series: &PriceSeries) -> Result<PriceStatistics> {
    let (first, last) = series
        .first()
        .zip(series.last())
        .ok_or_else(|| AnalysisError::DataUnavailable("price series is empty".to_string()))?;

    let start_price = first.close;
    let end_price = last.close;
    let price_values = series.closes();
    let highest_price = price_values.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b));
    let lowest_price = price_values.iter().fold(f64::INFINITY, |a, &b| a.min(b));
    let average_price = price_values.iter().sum::<f64>() / price_values.len() as f64;

    let price_change_absolute = end_price - start_price;
    let price_change_percentage = if start_price != 0.0 {
        (price_change_absolute / start_price) * 100.0
    } else {
        0.0
    };

    let variance = price_values
        .iter()
        .map(|&price| (price - average_price).powi(2))
        .sum::<f64>()
        / price_values.len() as f64;
    let volatility = variance.sqrt();

    let trend = if price_change_percentage > 2.0 {
        "bullish"
    } else if price_change_percentage < -2.0 {
        "bearish"
    } else {
        "sideways"
    };

    Ok(PriceStatistics {
        start_price,
        end_price,
        price_change_absolute,
        price_change_percentage,
        highest_price,
        lowest_price,
        average_price,
        volatility,
        trend: trend.to_string(),
    })
}
