use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use tracing::info;

use crate::models::{ChangePointDate, ChangePointRecord};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_change_points))
        .route("/summary", get(get_change_point_summary))
}

pub async fn get_change_points(State(state): State<AppState>) -> Json<Vec<ChangePointDate>> {
    info!("GET /api/changepoints - Listing change point dates");
    Json(
        state
            .change_points
            .iter()
            .map(|cp| ChangePointDate { date: cp.tau_date })
            .collect(),
    )
}

pub async fn get_change_point_summary(State(state): State<AppState>) -> Json<Vec<ChangePointRecord>> {
    info!("GET /api/changepoints/summary - Listing change point summaries");
    Json(state.change_points.as_ref().clone())
}
