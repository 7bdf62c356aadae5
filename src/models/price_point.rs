use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// One observed price for a given day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub price: f64,
}

impl PricePoint {
    pub fn new(date: NaiveDate, price: f64) -> Self {
        Self { date, price }
    }
}

/// Price history ordered strictly by date.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Sort by date and keep the first row seen for each date.
    /// Returns the series together with the number of duplicate rows dropped.
    pub fn from_unsorted(mut points: Vec<PricePoint>) -> (Self, usize) {
        let before = points.len();
        // stable sort keeps file order among equal dates
        points.sort_by_key(|p| p.date);
        points.dedup_by_key(|p| p.date);
        let dropped = before - points.len();
        (Self { points }, dropped)
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn date_at(&self, index: usize) -> Option<NaiveDate> {
        self.points.get(index).map(|p| p.date)
    }

    pub fn prices(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.price).collect()
    }

    /// Inclusive date range filter; either bound may be open.
    pub fn between(&self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Vec<PricePoint> {
        self.points
            .iter()
            .filter(|p| start.map_or(true, |s| p.date >= s))
            .filter(|p| end.map_or(true, |e| p.date <= e))
            .copied()
            .collect()
    }
}
