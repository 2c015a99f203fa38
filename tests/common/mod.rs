#![allow(dead_code)]

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use vacancy_explorer::{
    error::{Error, Result},
    models::source_record::{NormalizedVacancy, SourceId, SourceRecord},
    models::vacancy::{CitySalary, CompanyCount, Vacancy},
    services::sources::VacancySource,
    services::vacancy_store::{
        PageRequest, VacancyField, VacancyFilter, VacancyRepository, VacancySort,
    },
    utils::salary::CurrencyRates,
};

pub fn published(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 7, day, 12, 0, 0).unwrap()
}

pub fn record(
    source: SourceId,
    slug: &str,
    title: &str,
    company: &str,
    location: Option<&str>,
    salary: Option<&str>,
    day: u32,
) -> SourceRecord {
    SourceRecord {
        title: title.to_string(),
        company: company.to_string(),
        location: location.map(str::to_string),
        raw_salary: salary.map(str::to_string),
        description: format!("{} at {}", title, company),
        published_at: published(day),
        source,
        original_url: format!("https://{}/vacancy/{}", source.as_str(), slug),
    }
}

pub fn normalized(record: SourceRecord) -> NormalizedVacancy {
    NormalizedVacancy::from_record(record, &CurrencyRates::default())
}

/// A canned source that counts how often it was asked.
pub struct FakeSource {
    pub id: SourceId,
    pub records: Vec<SourceRecord>,
    pub fail: bool,
    pub calls: AtomicUsize,
}

impl FakeSource {
    pub fn returning(id: SourceId, records: Vec<SourceRecord>) -> Arc<Self> {
        Arc::new(Self {
            id,
            records,
            fail: false,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing(id: SourceId) -> Arc<Self> {
        Arc::new(Self {
            id,
            records: Vec::new(),
            fail: true,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VacancySource for FakeSource {
    fn source_id(&self) -> SourceId {
        self.id
    }

    async fn parse(&self, _search_query: &str) -> Result<Vec<SourceRecord>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(Error::Internal(format!("{} is down", self.id)));
        }
        Ok(self.records.clone())
    }
}

/// A store whose every call fails, as if the database were unreachable.
pub struct BrokenStore;

fn unreachable_db<T>() -> Result<T> {
    Err(Error::Internal("database unreachable".to_string()))
}

#[async_trait]
impl VacancyRepository for BrokenStore {
    async fn upsert_batch(&self, _batch: &[NormalizedVacancy]) -> Result<u64> {
        unreachable_db()
    }

    async fn count(&self, _filter: &VacancyFilter) -> Result<i64> {
        unreachable_db()
    }

    async fn query(
        &self,
        _filter: &VacancyFilter,
        _sort: VacancySort,
        _page: PageRequest,
    ) -> Result<Vec<Vacancy>> {
        unreachable_db()
    }

    async fn distinct(&self, _field: VacancyField) -> Result<Vec<String>> {
        unreachable_db()
    }

    async fn top_companies(&self, _limit: i64) -> Result<Vec<CompanyCount>> {
        unreachable_db()
    }

    async fn average_salary_by_city(&self, _limit: i64) -> Result<Vec<CitySalary>> {
        unreachable_db()
    }
}
