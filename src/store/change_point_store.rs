use std::path::Path;

use csv::{ReaderBuilder, WriterBuilder};
use tracing::{info, warn};

use crate::errors::DataError;
use crate::models::ChangePointRecord;

/// Overwrite the summary artifact with `records`.
pub fn write_summary(path: &Path, records: &[ChangePointRecord]) -> Result<(), DataError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut writer = WriterBuilder::new().has_headers(true).from_path(path)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;

    info!("Wrote {} change point record(s) to {}", records.len(), path.display());
    Ok(())
}

/// Read the summary artifact. A missing file means no change point has been
/// computed yet and yields an empty table.
pub fn read_summary(path: &Path) -> Result<Vec<ChangePointRecord>, DataError> {
    if !path.exists() {
        warn!("No change point summary at {}; serving none", path.display());
        return Ok(Vec::new());
    }

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)?;

    let mut records = Vec::new();
    for (line_num, result) in reader.deserialize::<ChangePointRecord>().enumerate() {
        match result {
            Ok(record) => records.push(record),
            Err(e) => warn!("Skipping summary row at line {}: {}", line_num + 2, e),
        }
    }
    records.sort_by_key(|r| r.tau_date);

    info!("Loaded {} change point record(s) from {}", records.len(), path.display());
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_support::fixture_path;
    use chrono::NaiveDate;

    #[test]
    fn test_summary_survives_write_then_read() {
        let path = fixture_path("reports/summary_roundtrip.csv");
        let record = ChangePointRecord {
            tau_index: 4521,
            tau_date: NaiveDate::from_ymd_opt(2005, 3, 14).unwrap(),
            mu1_price: 20.41,
            mu2_price: 71.92,
            pct_change: 252.38,
        };

        write_summary(&path, &[record.clone()]).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("tau_index,tau_date,mu1_price,mu2_price,pct_change"));
        assert!(text.contains("2005-03-14"));

        let loaded = read_summary(&path).unwrap();
        assert_eq!(loaded, vec![record]);
    }

    #[test]
    fn test_missing_summary_is_empty_not_error() {
        let loaded = read_summary(Path::new("/no/such/summary.csv")).unwrap();
        assert!(loaded.is_empty());
    }
}
