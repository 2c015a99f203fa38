use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::vacancy::{CitySalary, CompanyCount, Vacancy};
use crate::services::vacancy_service::VacancyList;
use crate::services::vacancy_store::{SortDirection, SortField};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VacancyResponse {
    pub id: uuid::Uuid,
    pub title: String,
    pub company: String,
    pub location: Option<String>,
    pub salary: Option<String>,
    pub salary_min_base: Option<i64>,
    pub salary_max_base: Option<i64>,
    pub description: String,
    pub published_at: DateTime<Utc>,
    pub source: String,
    pub original_url: String,
}

/// Query string of `GET /api/vacancies`. Blank strings count as absent.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct VacancyListQuery {
    pub query: Option<String>,
    pub location: Option<String>,
    pub company: Option<String>,
    pub source: Option<String>,
    pub salary_min: Option<i64>,
    pub salary_max: Option<i64>,
    pub sort: Option<SortField>,
    pub direction: Option<SortDirection>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VacancyListResponse {
    pub items: Vec<VacancyResponse>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
    pub sources: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl VacancyListResponse {
    /// Degraded listing shown when storage is unavailable.
    pub fn unavailable(page: i64, per_page: i64, error: String) -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            page,
            per_page,
            total_pages: 1,
            sources: Vec::new(),
            error: Some(error),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesResponse {
    pub sources: Vec<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatsResponse {
    pub total_vacancies: i64,
    pub sources_count: usize,
    pub cities_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsResponse {
    pub top_companies: Vec<CompanyCount>,
    pub average_salary_by_city: Vec<CitySalary>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct TriggerIngestPayload {
    #[validate(length(max = 200))]
    pub query: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerIngestResponse {
    pub status: String,
    pub query: String,
}

impl From<Vacancy> for VacancyResponse {
    fn from(value: Vacancy) -> Self {
        Self {
            id: value.id,
            title: value.title,
            company: value.company,
            location: value.location,
            salary: value.salary,
            salary_min_base: value.salary_min_base,
            salary_max_base: value.salary_max_base,
            description: value.description,
            published_at: value.published_at,
            source: value.source,
            original_url: value.original_url,
        }
    }
}

impl From<VacancyList> for VacancyListResponse {
    fn from(value: VacancyList) -> Self {
        Self {
            items: value.items.into_iter().map(Into::into).collect(),
            total: value.total,
            page: value.page,
            per_page: value.per_page,
            total_pages: value.total_pages,
            sources: value.sources,
            error: None,
        }
    }
}
