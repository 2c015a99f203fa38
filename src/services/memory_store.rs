use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::source_record::NormalizedVacancy;
use crate::models::vacancy::{CitySalary, CompanyCount, Vacancy};
use crate::services::vacancy_store::{
    PageRequest, SortDirection, SortField, VacancyField, VacancyFilter, VacancyRepository,
    VacancySort,
};

/// In-process implementation of [`VacancyRepository`].
///
/// Enforces the same uniqueness rules as the database schema. Text search is
/// a case-insensitive substring match over title and description.
#[derive(Clone, Default)]
pub struct MemoryVacancyStore {
    rows: Arc<Mutex<Vec<Vacancy>>>,
}

impl MemoryVacancyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Result<Vec<Vacancy>> {
        Ok(self.lock()?.clone())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<Vacancy>>> {
        self.rows
            .lock()
            .map_err(|_| Error::Internal("vacancy store mutex poisoned".to_string()))
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn matches(vacancy: &Vacancy, filter: &VacancyFilter) -> bool {
    if let Some(query) = &filter.query {
        if !contains_ci(&vacancy.title, query) && !contains_ci(&vacancy.description, query) {
            return false;
        }
    }
    if let Some(location) = &filter.location {
        match &vacancy.location {
            Some(value) if contains_ci(value, location) => {}
            _ => return false,
        }
    }
    if let Some(company) = &filter.company {
        if !contains_ci(&vacancy.company, company) {
            return false;
        }
    }
    if let Some(source) = &filter.source {
        if &vacancy.source != source {
            return false;
        }
    }
    if let Some(salary_min) = filter.salary_min {
        if !vacancy.salary_max_base.is_some_and(|max| max >= salary_min) {
            return false;
        }
    }
    if let Some(salary_max) = filter.salary_max {
        if !vacancy.salary_min_base.is_some_and(|min| min <= salary_max) {
            return false;
        }
    }
    true
}

/// Orders `None` first for ascending and last for descending, like the SQL store.
fn compare_optional<T: Ord>(a: Option<T>, b: Option<T>, direction: SortDirection) -> Ordering {
    let ordering = match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
    };
    match direction {
        SortDirection::Asc => ordering,
        SortDirection::Desc => ordering.reverse(),
    }
}

fn salary_point(vacancy: &Vacancy) -> Option<f64> {
    match (vacancy.salary_min_base, vacancy.salary_max_base) {
        (Some(min), Some(max)) => Some((min as f64 + max as f64) / 2.0),
        (Some(value), None) | (None, Some(value)) => Some(value as f64),
        (None, None) => None,
    }
}

#[async_trait]
impl VacancyRepository for MemoryVacancyStore {
    async fn upsert_batch(&self, batch: &[NormalizedVacancy]) -> Result<u64> {
        if batch.is_empty() {
            return Ok(0);
        }

        let mut rows = self.lock()?;
        let mut urls: HashSet<String> = rows.iter().map(|v| v.original_url.clone()).collect();
        let mut triples: HashSet<(String, String, DateTime<Utc>)> = rows
            .iter()
            .map(|v| (v.title.clone(), v.company.clone(), v.published_at))
            .collect();

        let now = Utc::now();
        let mut inserted = Vec::new();
        for vacancy in batch {
            let record = &vacancy.record;
            let triple = (record.title.clone(), record.company.clone(), record.published_at);
            if urls.contains(&record.original_url) || triples.contains(&triple) {
                continue;
            }
            urls.insert(record.original_url.clone());
            triples.insert(triple);
            inserted.push(Vacancy {
                id: Uuid::new_v4(),
                title: record.title.clone(),
                company: record.company.clone(),
                location: record.location.clone(),
                salary: record.raw_salary.clone(),
                description: record.description.clone(),
                published_at: record.published_at,
                source: record.source.as_str().to_string(),
                original_url: record.original_url.clone(),
                salary_min_base: vacancy.salary_min_base,
                salary_max_base: vacancy.salary_max_base,
                created_at: now,
            });
        }

        let added = inserted.len() as u64;
        rows.extend(inserted);
        Ok(added)
    }

    async fn count(&self, filter: &VacancyFilter) -> Result<i64> {
        let rows = self.lock()?;
        Ok(rows.iter().filter(|v| matches(v, filter)).count() as i64)
    }

    async fn query(
        &self,
        filter: &VacancyFilter,
        sort: VacancySort,
        page: PageRequest,
    ) -> Result<Vec<Vacancy>> {
        let rows = self.lock()?;
        let mut items: Vec<Vacancy> = rows.iter().filter(|v| matches(v, filter)).cloned().collect();
        items.sort_by(|a, b| {
            let ordering = match sort.field {
                SortField::Date => {
                    compare_optional(Some(a.published_at), Some(b.published_at), sort.direction)
                }
                SortField::Salary => {
                    compare_optional(a.salary_max_base, b.salary_max_base, sort.direction)
                }
            };
            ordering.then_with(|| a.id.cmp(&b.id))
        });

        let offset = usize::try_from(page.offset()).unwrap_or(0);
        let limit = usize::try_from(page.per_page).unwrap_or(0);
        Ok(items.into_iter().skip(offset).take(limit).collect())
    }

    async fn distinct(&self, field: VacancyField) -> Result<Vec<String>> {
        let rows = self.lock()?;
        let values: BTreeSet<String> = rows
            .iter()
            .filter_map(|v| match field {
                VacancyField::Source => Some(v.source.clone()),
                VacancyField::Location => v.location.clone(),
                VacancyField::Company => Some(v.company.clone()),
            })
            .collect();
        Ok(values.into_iter().collect())
    }

    async fn top_companies(&self, limit: i64) -> Result<Vec<CompanyCount>> {
        let rows = self.lock()?;
        let mut counts: BTreeMap<String, i64> = BTreeMap::new();
        for vacancy in rows.iter() {
            *counts.entry(vacancy.company.clone()).or_default() += 1;
        }

        let mut result: Vec<CompanyCount> = counts
            .into_iter()
            .map(|(company, vacancies)| CompanyCount { company, vacancies })
            .collect();
        result.sort_by(|a, b| b.vacancies.cmp(&a.vacancies).then_with(|| a.company.cmp(&b.company)));
        result.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(result)
    }

    async fn average_salary_by_city(&self, limit: i64) -> Result<Vec<CitySalary>> {
        let rows = self.lock()?;
        let mut totals: BTreeMap<String, (f64, i64)> = BTreeMap::new();
        for vacancy in rows.iter() {
            let (Some(city), Some(point)) = (&vacancy.location, salary_point(vacancy)) else {
                continue;
            };
            let entry = totals.entry(city.clone()).or_insert((0.0, 0));
            entry.0 += point;
            entry.1 += 1;
        }

        let mut result: Vec<CitySalary> = totals
            .into_iter()
            .map(|(city, (sum, vacancies))| CitySalary {
                city,
                average_salary: sum / vacancies as f64,
                vacancies,
            })
            .collect();
        result.sort_by(|a, b| {
            b.average_salary
                .total_cmp(&a.average_salary)
                .then_with(|| a.city.cmp(&b.city))
        });
        result.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(result)
    }
}
