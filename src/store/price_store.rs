use std::path::Path;

use csv::ReaderBuilder;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::errors::{DataError, ParseError};
use crate::models::{PricePoint, PriceSeries};
use crate::utils::{parse_day_first, DateParsingConfig};

#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Price")]
    price: String,
}

fn parse_price(raw: &str) -> Result<f64, ParseError> {
    let cleaned = raw.trim().replace(',', "");
    match cleaned.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(ParseError::Price(raw.to_string())),
    }
}

fn parse_row(row: &CsvRow, config: &DateParsingConfig) -> Result<PricePoint, ParseError> {
    let date = parse_day_first(&row.date, config)?;
    let price = parse_price(&row.price)?;
    Ok(PricePoint::new(date, price))
}

/// Load a `Date,Price` table. Malformed rows are dropped; the result is
/// sorted and unique by date.
pub fn load_prices(path: &Path, config: &DateParsingConfig) -> Result<PriceSeries, DataError> {
    if !path.exists() {
        return Err(DataError::MissingFile(path.to_path_buf()));
    }

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)?;

    let mut points = Vec::new();
    let mut skipped = 0usize;

    for (line_num, result) in reader.deserialize::<CsvRow>().enumerate() {
        let parsed = result
            .map_err(|e| e.to_string())
            .and_then(|row| parse_row(&row, config).map_err(|e| e.to_string()));
        match parsed {
            Ok(point) => points.push(point),
            Err(e) => {
                debug!("Skipping price row at line {}: {}", line_num + 2, e);
                skipped += 1;
            }
        }
    }

    if points.is_empty() {
        return Err(DataError::Empty(path.to_path_buf()));
    }

    let (series, duplicates) = PriceSeries::from_unsorted(points);
    if skipped > 0 || duplicates > 0 {
        warn!(
            "Dropped {} malformed and {} duplicate-date price rows from {}",
            skipped,
            duplicates,
            path.display()
        );
    }
    info!(
        "Loaded {} prices from {} ({} to {})",
        series.len(),
        path.display(),
        series.date_at(0).map(|d| d.to_string()).unwrap_or_default(),
        series.date_at(series.len() - 1).map(|d| d.to_string()).unwrap_or_default(),
    );

    Ok(series)
}
