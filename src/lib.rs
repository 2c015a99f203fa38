pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use std::sync::Arc;

use crate::services::{
    ingestion_service::IngestionPipeline, vacancy_service::VacancyService,
    vacancy_store::VacancyRepository,
};

#[derive(Clone)]
pub struct AppState {
    pub vacancy_service: VacancyService,
    pub pipeline: Arc<IngestionPipeline>,
    pub default_search_query: Arc<str>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn VacancyRepository>,
        pipeline: Arc<IngestionPipeline>,
        default_search_query: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            vacancy_service: VacancyService::new(store),
            pipeline,
            default_search_query: default_search_query.into(),
        }
    }
}
