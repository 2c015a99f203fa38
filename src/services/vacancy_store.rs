use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::{debug, instrument};

#[cfg(test)]
use mockall::automock;

use crate::error::Result;
use crate::models::source_record::NormalizedVacancy;
use crate::models::vacancy::{CitySalary, CompanyCount, Vacancy};

/// Rows per INSERT statement; keeps bind parameters well under the protocol limit.
const INSERT_CHUNK: usize = 500;

const VACANCY_COLUMNS: &str = "id, title, company, location, salary, description, published_at, source, original_url, salary_min_base, salary_max_base, created_at";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VacancyFilter {
    pub query: Option<String>,
    pub location: Option<String>,
    pub company: Option<String>,
    pub source: Option<String>,
    pub salary_min: Option<i64>,
    pub salary_max: Option<i64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortField {
    #[default]
    Date,
    Salary,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VacancySort {
    pub field: SortField,
    pub direction: SortDirection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub per_page: i64,
}

impl PageRequest {
    /// Saturates for pages past the end of any realistic result set.
    pub fn offset(&self) -> i64 {
        self.page
            .max(1)
            .saturating_sub(1)
            .saturating_mul(self.per_page.max(0))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VacancyField {
    Source,
    Location,
    Company,
}

impl VacancyField {
    fn column(&self) -> &'static str {
        match self {
            VacancyField::Source => "source",
            VacancyField::Location => "location",
            VacancyField::Company => "company",
        }
    }
}

/// Storage contract consumed by the ingestion pipeline and the listing API.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait VacancyRepository: Send + Sync {
    /// Inserts every record whose `original_url` (and title/company/date
    /// triple) is not stored yet, atomically. Returns the number inserted.
    async fn upsert_batch(&self, batch: &[NormalizedVacancy]) -> Result<u64>;

    async fn count(&self, filter: &VacancyFilter) -> Result<i64>;

    async fn query(
        &self,
        filter: &VacancyFilter,
        sort: VacancySort,
        page: PageRequest,
    ) -> Result<Vec<Vacancy>>;

    /// Sorted distinct non-null values of `field`.
    async fn distinct(&self, field: VacancyField) -> Result<Vec<String>>;

    async fn top_companies(&self, limit: i64) -> Result<Vec<CompanyCount>>;

    async fn average_salary_by_city(&self, limit: i64) -> Result<Vec<CitySalary>>;
}

#[derive(Clone)]
pub struct PgVacancyStore {
    pool: PgPool,
}

impl PgVacancyStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, filter: &VacancyFilter) {
    builder.push(" WHERE TRUE");
    if let Some(query) = &filter.query {
        builder
            .push(" AND search_vector @@ plainto_tsquery('russian', ")
            .push_bind(query.clone())
            .push(")");
    }
    if let Some(location) = &filter.location {
        builder
            .push(" AND location ILIKE ")
            .push_bind(format!("%{}%", location));
    }
    if let Some(company) = &filter.company {
        builder
            .push(" AND company ILIKE ")
            .push_bind(format!("%{}%", company));
    }
    if let Some(source) = &filter.source {
        builder.push(" AND source = ").push_bind(source.clone());
    }
    if let Some(salary_min) = filter.salary_min {
        builder.push(" AND salary_max_base >= ").push_bind(salary_min);
    }
    if let Some(salary_max) = filter.salary_max {
        builder.push(" AND salary_min_base <= ").push_bind(salary_max);
    }
}

#[async_trait]
impl VacancyRepository for PgVacancyStore {
    #[instrument(skip(self, batch), fields(batch_size = batch.len()))]
    async fn upsert_batch(&self, batch: &[NormalizedVacancy]) -> Result<u64> {
        if batch.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;
        let mut added = 0;
        for chunk in batch.chunks(INSERT_CHUNK) {
            let mut builder = QueryBuilder::<Postgres>::new(
                "INSERT INTO vacancies (title, company, location, salary, description, published_at, source, original_url, salary_min_base, salary_max_base) ",
            );
            builder.push_values(chunk, |mut row, vacancy| {
                let record = &vacancy.record;
                row.push_bind(record.title.clone())
                    .push_bind(record.company.clone())
                    .push_bind(record.location.clone())
                    .push_bind(record.raw_salary.clone())
                    .push_bind(record.description.clone())
                    .push_bind(record.published_at)
                    .push_bind(record.source.as_str())
                    .push_bind(record.original_url.clone())
                    .push_bind(vacancy.salary_min_base)
                    .push_bind(vacancy.salary_max_base);
            });
            // No conflict target: either unique constraint makes a row a duplicate.
            builder.push(" ON CONFLICT DO NOTHING");

            let result = builder.build().execute(&mut *tx).await?;
            added += result.rows_affected();
        }
        tx.commit().await?;

        debug!(added, "Vacancy batch committed");
        Ok(added)
    }

    async fn count(&self, filter: &VacancyFilter) -> Result<i64> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM vacancies");
        push_filters(&mut builder, filter);
        let total = builder
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;
        Ok(total)
    }

    async fn query(
        &self,
        filter: &VacancyFilter,
        sort: VacancySort,
        page: PageRequest,
    ) -> Result<Vec<Vacancy>> {
        let mut builder =
            QueryBuilder::<Postgres>::new(format!("SELECT {} FROM vacancies", VACANCY_COLUMNS));
        push_filters(&mut builder, filter);

        builder.push(" ORDER BY ");
        if let Some(query) = &filter.query {
            builder
                .push("ts_rank(search_vector, plainto_tsquery('russian', ")
                .push_bind(query.clone())
                .push(")) DESC, ");
        }
        let column = match sort.field {
            SortField::Date => "published_at",
            SortField::Salary => "salary_max_base",
        };
        let direction = match sort.direction {
            SortDirection::Asc => "ASC NULLS FIRST",
            SortDirection::Desc => "DESC NULLS LAST",
        };
        builder.push(format!("{} {}, id", column, direction));

        builder
            .push(" LIMIT ")
            .push_bind(page.per_page)
            .push(" OFFSET ")
            .push_bind(page.offset());

        let items = builder
            .build_query_as::<Vacancy>()
            .fetch_all(&self.pool)
            .await?;
        Ok(items)
    }

    async fn distinct(&self, field: VacancyField) -> Result<Vec<String>> {
        let column = field.column();
        let sql = format!(
            "SELECT DISTINCT {column} FROM vacancies WHERE {column} IS NOT NULL ORDER BY {column}"
        );
        let values = sqlx::query_scalar::<_, String>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(values)
    }

    async fn top_companies(&self, limit: i64) -> Result<Vec<CompanyCount>> {
        let rows = sqlx::query_as::<_, CompanyCount>(
            r#"
            SELECT company, COUNT(*) AS vacancies
            FROM vacancies
            GROUP BY company
            ORDER BY vacancies DESC, company
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn average_salary_by_city(&self, limit: i64) -> Result<Vec<CitySalary>> {
        let rows = sqlx::query_as::<_, CitySalary>(
            r#"
            SELECT
                location AS city,
                AVG(COALESCE(
                    (salary_min_base::NUMERIC + salary_max_base) / 2,
                    salary_min_base,
                    salary_max_base
                ))::FLOAT8 AS average_salary,
                COUNT(*) AS vacancies
            FROM vacancies
            WHERE location IS NOT NULL
              AND (salary_min_base IS NOT NULL OR salary_max_base IS NOT NULL)
            GROUP BY location
            ORDER BY average_salary DESC, city
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_follows_page_and_size() {
        assert_eq!(PageRequest { page: 1, per_page: 20 }.offset(), 0);
        assert_eq!(PageRequest { page: 3, per_page: 10 }.offset(), 20);
        assert_eq!(PageRequest { page: 0, per_page: 10 }.offset(), 0);
    }

    #[test]
    fn offset_saturates_for_huge_pages() {
        let page = PageRequest {
            page: i64::MAX,
            per_page: 100,
        };
        assert_eq!(page.offset(), i64::MAX);
    }
}
