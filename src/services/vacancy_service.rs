use std::sync::Arc;

use tracing::instrument;

use crate::dto::vacancy_dto::{AnalyticsResponse, StatsResponse, VacancyListQuery};
use crate::error::Result;
use crate::models::vacancy::Vacancy;
use crate::services::vacancy_store::{
    PageRequest, VacancyField, VacancyFilter, VacancyRepository, VacancySort,
};

pub const DEFAULT_PER_PAGE: i64 = 20;
pub const MIN_PER_PAGE: i64 = 10;
pub const MAX_PER_PAGE: i64 = 100;
pub const ANALYTICS_LIMIT: i64 = 10;

#[derive(Clone)]
pub struct VacancyService {
    store: Arc<dyn VacancyRepository>,
}

pub struct VacancyList {
    pub items: Vec<Vacancy>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
    pub sources: Vec<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl VacancyListQuery {
    pub fn page_request(&self) -> PageRequest {
        PageRequest {
            page: self.page.unwrap_or(1).max(1),
            per_page: self
                .per_page
                .unwrap_or(DEFAULT_PER_PAGE)
                .clamp(MIN_PER_PAGE, MAX_PER_PAGE),
        }
    }

    pub fn filter(&self) -> VacancyFilter {
        VacancyFilter {
            query: non_blank(self.query.clone()),
            location: non_blank(self.location.clone()),
            company: non_blank(self.company.clone()),
            source: non_blank(self.source.clone()),
            salary_min: self.salary_min,
            salary_max: self.salary_max,
        }
    }

    pub fn sort(&self) -> VacancySort {
        VacancySort {
            field: self.sort.unwrap_or_default(),
            direction: self.direction.unwrap_or_default(),
        }
    }
}

pub fn total_pages(total: i64, per_page: i64) -> i64 {
    if per_page <= 0 {
        return 1;
    }
    ((total + per_page - 1) / per_page).max(1)
}

impl VacancyService {
    pub fn new(store: Arc<dyn VacancyRepository>) -> Self {
        Self { store }
    }

    #[instrument(skip(self))]
    pub async fn list(&self, query: VacancyListQuery) -> Result<VacancyList> {
        let page = query.page_request();
        let filter = query.filter();

        let total = self.store.count(&filter).await?;
        let items = self.store.query(&filter, query.sort(), page).await?;
        let sources = self.store.distinct(VacancyField::Source).await?;

        Ok(VacancyList {
            items,
            total,
            page: page.page,
            per_page: page.per_page,
            total_pages: total_pages(total, page.per_page),
            sources,
        })
    }

    pub async fn sources(&self) -> Result<Vec<String>> {
        self.store.distinct(VacancyField::Source).await
    }

    pub async fn stats(&self) -> Result<StatsResponse> {
        let total_vacancies = self.store.count(&VacancyFilter::default()).await?;
        let sources_count = self.store.distinct(VacancyField::Source).await?.len();
        let cities_count = self.store.distinct(VacancyField::Location).await?.len();
        Ok(StatsResponse {
            total_vacancies,
            sources_count,
            cities_count,
        })
    }

    pub async fn analytics(&self) -> Result<AnalyticsResponse> {
        Ok(AnalyticsResponse {
            top_companies: self.store.top_companies(ANALYTICS_LIMIT).await?,
            average_salary_by_city: self.store.average_salary_by_city(ANALYTICS_LIMIT).await?,
        })
    }

    /// Cheap liveness probe against storage.
    pub async fn ping(&self) -> Result<()> {
        self.store.count(&VacancyFilter::default()).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::services::vacancy_store::{MockVacancyRepository, SortDirection, SortField};

    #[test]
    fn paging_is_clamped() {
        let query = VacancyListQuery::default();
        assert_eq!(query.page_request(), PageRequest { page: 1, per_page: 20 });

        let query = VacancyListQuery {
            page: Some(-3),
            per_page: Some(1),
            ..Default::default()
        };
        assert_eq!(query.page_request(), PageRequest { page: 1, per_page: 10 });

        let query = VacancyListQuery {
            page: Some(4),
            per_page: Some(1000),
            ..Default::default()
        };
        assert_eq!(query.page_request(), PageRequest { page: 4, per_page: 100 });
    }

    #[test]
    fn total_pages_is_never_zero() {
        assert_eq!(total_pages(0, 20), 1);
        assert_eq!(total_pages(20, 20), 1);
        assert_eq!(total_pages(21, 20), 2);
        assert_eq!(total_pages(95, 10), 10);
    }

    #[test]
    fn blank_filters_are_dropped() {
        let query = VacancyListQuery {
            query: Some("  ".into()),
            location: Some(" Москва ".into()),
            source: Some(String::new()),
            sort: Some(SortField::Salary),
            ..Default::default()
        };
        let filter = query.filter();
        assert_eq!(filter.query, None);
        assert_eq!(filter.location.as_deref(), Some("Москва"));
        assert_eq!(filter.source, None);
        assert_eq!(
            query.sort(),
            VacancySort {
                field: SortField::Salary,
                direction: SortDirection::Desc
            }
        );
    }

    #[tokio::test]
    async fn list_reports_pages_and_sources() {
        let mut store = MockVacancyRepository::new();
        store.expect_count().returning(|_| Ok(45));
        store
            .expect_query()
            .withf(|_, _, page| page.page == 2 && page.per_page == 20)
            .returning(|_, _, _| Ok(Vec::new()));
        store
            .expect_distinct()
            .returning(|_| Ok(vec!["hh.ru".to_string(), "superjob.ru".to_string()]));

        let service = VacancyService::new(Arc::new(store));
        let list = service
            .list(VacancyListQuery {
                page: Some(2),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(list.total, 45);
        assert_eq!(list.page, 2);
        assert_eq!(list.total_pages, 3);
        assert_eq!(list.sources.len(), 2);
    }

    #[tokio::test]
    async fn storage_errors_surface_from_stats() {
        let mut store = MockVacancyRepository::new();
        store
            .expect_count()
            .returning(|_| Err(Error::Internal("pool closed".into())));

        let service = VacancyService::new(Arc::new(store));
        assert!(service.stats().await.is_err());
        assert!(service.ping().await.is_err());
    }
}
