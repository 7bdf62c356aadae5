use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use tracing::info;

use crate::models::EventRecord;
use crate::services::event_service;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(get_events))
}

#[derive(Debug, Deserialize)]
pub struct EventsQuery {
    category: Option<String>,
}

pub async fn get_events(
    Query(params): Query<EventsQuery>,
    State(state): State<AppState>,
) -> Json<Vec<EventRecord>> {
    info!("GET /api/events - category={:?}", params.category);
    Json(event_service::filter_by_category(
        &state.events,
        params.category.as_deref(),
    ))
}
