use axum::{
    extract::{Query, State},
    response::{IntoResponse, Json},
};
use tracing::error;

use crate::{
    dto::vacancy_dto::{SourcesResponse, VacancyListQuery, VacancyListResponse},
    error::Result,
    AppState,
};

/// Paginated listing. Storage failures still render an (empty) page.
#[axum::debug_handler]
pub async fn list_vacancies(
    State(state): State<AppState>,
    Query(query): Query<VacancyListQuery>,
) -> impl IntoResponse {
    let page = query.page_request();
    match state.vacancy_service.list(query).await {
        Ok(list) => Json(VacancyListResponse::from(list)),
        Err(e) => {
            error!(error = %e, "Failed to list vacancies");
            Json(VacancyListResponse::unavailable(
                page.page,
                page.per_page,
                "Vacancies are temporarily unavailable".to_string(),
            ))
        }
    }
}

#[axum::debug_handler]
pub async fn list_sources(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let sources = state.vacancy_service.sources().await?;
    Ok(Json(SourcesResponse { sources }))
}

#[axum::debug_handler]
pub async fn stats(State(state): State<AppState>) -> Result<impl IntoResponse> {
    Ok(Json(state.vacancy_service.stats().await?))
}

#[axum::debug_handler]
pub async fn analytics(State(state): State<AppState>) -> Result<impl IntoResponse> {
    Ok(Json(state.vacancy_service.analytics().await?))
}
