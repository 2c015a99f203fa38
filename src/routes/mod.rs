pub mod health;
pub mod ingest;
pub mod vacancy;

use axum::{
    routing::{get, post},
    Router,
};

use crate::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/api/stats", get(vacancy::stats))
        .route("/api/vacancies", get(vacancy::list_vacancies))
        .route("/api/sources", get(vacancy::list_sources))
        .route("/api/analytics", get(vacancy::analytics))
        .route("/api/ingest", post(ingest::trigger_ingest))
        .with_state(state)
}
