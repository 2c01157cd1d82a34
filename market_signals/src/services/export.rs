use std::io::Write;

use crate::errors::{AnalysisError, Result};
use crate::models::IndicatorTable;

pub const CSV_HEADER: [&str; 12] = [
    "date",
    "close",
    "ema_short",
    "ema_long",
    "sma",
    "rsi",
    "bb_upper",
    "bb_middle",
    "bb_lower",
    "macd",
    "macd_signal",
    "macd_histogram",
];

/// Writes the indicator table as CSV. Disabled indicators leave empty cells.
pub fn write_indicator_csv<W: Write>(table: &IndicatorTable, writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(CSV_HEADER)?;

    let cell = |value: Option<f64>| value.map(|v| v.to_string()).unwrap_or_default();

    for row in &table.rows {
        csv_writer.write_record([
            row.date.format("%Y-%m-%d").to_string(),
            row.close.to_string(),
            row.ema_short.to_string(),
            row.ema_long.to_string(),
            cell(row.sma),
            row.rsi.to_string(),
            row.bollinger.upper.to_string(),
            row.bollinger.middle.to_string(),
            row.bollinger.lower.to_string(),
            cell(row.macd.map(|m| m.macd)),
            cell(row.macd.map(|m| m.signal)),
            cell(row.macd.map(|m| m.histogram)),
        ])?;
    }

    csv_writer.flush()?;
    Ok(())
}

pub fn indicator_csv_string(table: &IndicatorTable) -> Result<String> {
    let mut buffer = Vec::new();
    write_indicator_csv(table, &mut buffer)?;
    String::from_utf8(buffer)
        .map_err(|e| AnalysisError::InvalidDataFormat(format!("CSV output is not UTF-8: {}", e)))
}
