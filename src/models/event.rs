use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// An external event annotated against the price history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub date: NaiveDate,
    pub title: String,
    pub category: String,
    pub description: String,
}
