use std::sync::Arc;

use tracing::info;

use crate::config::ServerConfig;
use crate::errors::DataError;
use crate::models::{ChangePointRecord, EventRecord, PriceSeries};
use crate::store::{change_point_store, event_store, price_store};

/// Tables loaded once at startup and shared read-only by every request.
#[derive(Clone)]
pub struct AppState {
    pub prices: Arc<PriceSeries>,
    pub events: Arc<Vec<EventRecord>>,
    pub change_points: Arc<Vec<ChangePointRecord>>,
}

impl AppState {
    pub fn new(
        prices: PriceSeries,
        events: Vec<EventRecord>,
        change_points: Vec<ChangePointRecord>,
    ) -> Self {
        Self {
            prices: Arc::new(prices),
            events: Arc::new(events),
            change_points: Arc::new(change_points),
        }
    }

    /// Missing price or event files are fatal; a missing change point
    /// summary only means the batch job has not run yet.
    pub fn load(config: &ServerConfig) -> Result<Self, DataError> {
        let prices = price_store::load_prices(&config.paths.prices_csv, &config.dates)?;
        let events = event_store::load_events(&config.paths.events_csv, &config.dates)?;
        let change_points = change_point_store::read_summary(&config.paths.summary_csv)?;

        info!(
            "State ready: {} prices, {} events, {} change point(s)",
            prices.len(),
            events.len(),
            change_points.len()
        );
        Ok(Self::new(prices, events, change_points))
    }
}
