use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use tracing::{error, info};
use validator::Validate;

use crate::{
    dto::vacancy_dto::{TriggerIngestPayload, TriggerIngestResponse},
    error::Result,
    AppState,
};

/// Starts an ingestion run in the background and returns immediately.
#[axum::debug_handler]
pub async fn trigger_ingest(
    State(state): State<AppState>,
    payload: Option<Json<TriggerIngestPayload>>,
) -> Result<impl IntoResponse> {
    let Json(payload) = payload.unwrap_or_default();
    payload.validate()?;

    let query = payload
        .query
        .map(|q| q.trim().to_string())
        .filter(|q| !q.is_empty())
        .unwrap_or_else(|| state.default_search_query.to_string());

    let pipeline = state.pipeline.clone();
    let run_query = query.clone();
    tokio::spawn(async move {
        match pipeline.run(&run_query).await {
            Ok(report) => info!(
                query = %run_query,
                found = report.found,
                added = report.added,
                "Manual ingestion finished"
            ),
            Err(e) => error!(query = %run_query, error = %e, "Manual ingestion failed"),
        }
    });

    Ok((
        StatusCode::ACCEPTED,
        Json(TriggerIngestResponse {
            status: "started".to_string(),
            query,
        }),
    ))
}
