use std::path::Path;

use csv::ReaderBuilder;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::errors::DataError;
use crate::models::EventRecord;
use crate::utils::{parse_day_first, DateParsingConfig};

#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Short Title")]
    title: String,
    #[serde(rename = "Category", default)]
    category: String,
    #[serde(rename = "Description", default)]
    description: String,
}

/// Load the `Date,Short Title,Category,Description` table, sorted by date.
pub fn load_events(path: &Path, config: &DateParsingConfig) -> Result<Vec<EventRecord>, DataError> {
    if !path.exists() {
        return Err(DataError::MissingFile(path.to_path_buf()));
    }

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)?;

    let mut events = Vec::new();
    let mut skipped = 0usize;

    for (line_num, result) in reader.deserialize::<CsvRow>().enumerate() {
        let row = match result {
            Ok(row) => row,
            Err(e) => {
                debug!("Skipping event row at line {}: {}", line_num + 2, e);
                skipped += 1;
                continue;
            }
        };
        match parse_day_first(&row.date, config) {
            Ok(date) => events.push(EventRecord {
                date,
                title: row.title,
                category: row.category,
                description: row.description,
            }),
            Err(e) => {
                debug!("Skipping event row at line {}: {}", line_num + 2, e);
                skipped += 1;
            }
        }
    }

    if events.is_empty() {
        return Err(DataError::Empty(path.to_path_buf()));
    }
    if skipped > 0 {
        warn!("Dropped {} malformed event rows from {}", skipped, path.display());
    }

    events.sort_by_key(|e| e.date);
    info!("Loaded {} events from {}", events.len(), path.display());

    Ok(events)
}
