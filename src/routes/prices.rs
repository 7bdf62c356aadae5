use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::models::PricePoint;
use crate::state::AppState;
use crate::utils::parse_iso;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(get_historical))
}

#[derive(Debug, Deserialize)]
pub struct HistoricalQuery {
    start: Option<String>,
    end: Option<String>,
}

fn parse_bound(name: &str, raw: Option<&str>) -> Result<Option<NaiveDate>, AppError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(value) => parse_iso(value).map(Some).map_err(|_| {
            warn!("Rejecting {}='{}': expected YYYY-MM-DD", name, value);
            AppError::Validation(format!("Invalid {} date '{}', expected YYYY-MM-DD", name, value))
        }),
    }
}

pub async fn get_historical(
    Query(params): Query<HistoricalQuery>,
    State(state): State<AppState>,
) -> Result<Json<Vec<PricePoint>>, AppError> {
    info!(
        "GET /api/historical - start={:?} end={:?}",
        params.start, params.end
    );
    let start = parse_bound("start", params.start.as_deref())?;
    let end = parse_bound("end", params.end.as_deref())?;

    Ok(Json(state.prices.between(start, end)))
}
