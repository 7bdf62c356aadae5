use axum::Router;
use tower_http::cors::CorsLayer;

use crate::errors::AppError;
use crate::routes::{changepoints, events, health, prices};
use crate::state::AppState;

pub fn create_app(state: AppState) -> Router {
    Router::<AppState>::new()
        .nest("/health", health::router())
        .nest("/api/historical", prices::router())
        .nest("/api/events", events::router())
        .nest("/api/changepoints", changepoints::router())
        .fallback(|| async { AppError::NotFound })
        .layer(CorsLayer::permissive())
        .with_state(state)
}
