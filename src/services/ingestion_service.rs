use std::sync::Arc;

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};

use crate::error::Result;
use crate::models::source_record::{NormalizedVacancy, SourceRecord};
use crate::services::sources::VacancySource;
use crate::services::vacancy_store::VacancyRepository;
use crate::utils::salary::CurrencyRates;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestionReport {
    /// Records collected from all sources before deduplication.
    pub found: usize,
    /// Records the store actually inserted.
    pub added: u64,
}

/// Runs every registered source, normalizes salaries and stores the batch.
///
/// One instance is shared between the periodic job and manual triggers;
/// concurrent runs are independent and rely on the store's uniqueness rules.
pub struct IngestionPipeline {
    sources: Vec<Arc<dyn VacancySource>>,
    store: Arc<dyn VacancyRepository>,
    rates: CurrencyRates,
}

impl IngestionPipeline {
    pub fn new(
        sources: Vec<Arc<dyn VacancySource>>,
        store: Arc<dyn VacancyRepository>,
        rates: CurrencyRates,
    ) -> Self {
        Self {
            sources,
            store,
            rates,
        }
    }

    /// Collects records from all sources in registration order. A failing
    /// source contributes nothing.
    async fn collect(&self, search_query: &str) -> Vec<SourceRecord> {
        let results = join_all(self.sources.iter().map(|source| async move {
            (source.source_id(), source.parse(search_query).await)
        }))
        .await;

        let mut records = Vec::new();
        for (source, result) in results {
            match result {
                Ok(batch) => {
                    info!(%source, found = batch.len(), "Source finished");
                    records.extend(batch);
                }
                Err(e) => {
                    error!(%source, error = %e, "Source failed, continuing without it");
                }
            }
        }
        records
    }

    pub fn normalize(&self, records: Vec<SourceRecord>) -> Vec<NormalizedVacancy> {
        records
            .into_iter()
            .map(|record| NormalizedVacancy::from_record(record, &self.rates))
            .collect()
    }

    /// Storage failures propagate; source failures never do.
    #[instrument(skip(self))]
    pub async fn run(&self, search_query: &str) -> Result<IngestionReport> {
        info!("Starting vacancy ingestion run");

        let records = self.collect(search_query).await;
        if records.is_empty() {
            info!("No vacancies found in any source");
            return Ok(IngestionReport::default());
        }

        let batch = self.normalize(records);
        let found = batch.len();
        let added = self.store.upsert_batch(&batch).await?;

        info!(found, added, "Vacancy ingestion run finished");
        Ok(IngestionReport { found, added })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::models::source_record::SourceId;
    use crate::services::sources::MockVacancySource;
    use crate::services::vacancy_store::MockVacancyRepository;
    use chrono::{TimeZone, Utc};
    use tokio_test::{assert_err, assert_ok};

    fn record(source: SourceId, n: u32, salary: Option<&str>) -> SourceRecord {
        SourceRecord {
            title: format!("Vacancy {n}"),
            company: "Acme".into(),
            location: Some("Москва".into()),
            raw_salary: salary.map(str::to_string),
            description: String::new(),
            published_at: Utc.with_ymd_and_hms(2025, 7, 19, 0, 0, n).unwrap(),
            source,
            original_url: format!("https://example.com/{}/{n}", source.as_str()),
        }
    }

    fn source_returning(id: SourceId, records: Vec<SourceRecord>) -> Arc<dyn VacancySource> {
        let mut source = MockVacancySource::new();
        source.expect_source_id().return_const(id);
        source
            .expect_parse()
            .withf(|query| query == "Python")
            .times(1)
            .returning(move |_| Ok(records.clone()));
        Arc::new(source)
    }

    fn failing_source(id: SourceId) -> Arc<dyn VacancySource> {
        let mut source = MockVacancySource::new();
        source.expect_source_id().return_const(id);
        source
            .expect_parse()
            .times(1)
            .returning(|_| Err(Error::Internal("connection reset".into())));
        Arc::new(source)
    }

    #[tokio::test]
    async fn all_sources_failing_never_touches_storage() {
        let mut store = MockVacancyRepository::new();
        store.expect_upsert_batch().never();

        let pipeline = IngestionPipeline::new(
            vec![
                failing_source(SourceId::HeadHunter),
                failing_source(SourceId::SuperJob),
            ],
            Arc::new(store),
            CurrencyRates::default(),
        );

        let report = assert_ok!(pipeline.run("Python").await);
        assert_eq!(report, IngestionReport { found: 0, added: 0 });
    }

    #[tokio::test]
    async fn empty_sources_short_circuit() {
        let mut store = MockVacancyRepository::new();
        store.expect_upsert_batch().never();

        let pipeline = IngestionPipeline::new(
            vec![source_returning(SourceId::HeadHunter, Vec::new())],
            Arc::new(store),
            CurrencyRates::default(),
        );

        assert_eq!(pipeline.run("Python").await.unwrap(), IngestionReport::default());
    }

    #[tokio::test]
    async fn one_failing_source_does_not_abort_the_run() {
        let mut store = MockVacancyRepository::new();
        store
            .expect_upsert_batch()
            .times(1)
            .withf(|batch| batch.len() == 1 && batch[0].record.source == SourceId::SuperJob)
            .returning(|_| Ok(1));

        let pipeline = IngestionPipeline::new(
            vec![
                failing_source(SourceId::HeadHunter),
                source_returning(
                    SourceId::SuperJob,
                    vec![record(SourceId::SuperJob, 1, Some("от 150 000 руб."))],
                ),
            ],
            Arc::new(store),
            CurrencyRates::default(),
        );

        let report = pipeline.run("Python").await.unwrap();
        assert_eq!(report, IngestionReport { found: 1, added: 1 });
    }

    #[tokio::test]
    async fn batch_is_normalized_and_submitted_once_in_source_order() {
        let mut store = MockVacancyRepository::new();
        store
            .expect_upsert_batch()
            .times(1)
            .withf(|batch| {
                let urls: Vec<&str> = batch.iter().map(|v| v.record.original_url.as_str()).collect();
                urls == [
                    "https://example.com/hh.ru/1",
                    "https://example.com/hh.ru/2",
                    "https://example.com/superjob.ru/3",
                ] && batch[0].salary_min_base == Some(180_000)
                    && batch[0].salary_max_base.is_none()
                    && batch[1].salary_min_base.is_none()
                    && batch[2].salary_min_base == Some(150_000)
                    && batch[2].salary_max_base == Some(250_000)
            })
            .returning(|_| Ok(2));

        let pipeline = IngestionPipeline::new(
            vec![
                source_returning(
                    SourceId::HeadHunter,
                    vec![
                        record(SourceId::HeadHunter, 1, Some("от 2000 USD")),
                        record(SourceId::HeadHunter, 2, None),
                    ],
                ),
                source_returning(
                    SourceId::SuperJob,
                    vec![record(SourceId::SuperJob, 3, Some("150000-250000 руб."))],
                ),
            ],
            Arc::new(store),
            CurrencyRates::default(),
        );

        let report = pipeline.run("Python").await.unwrap();
        assert_eq!(report, IngestionReport { found: 3, added: 2 });
    }

    #[tokio::test]
    async fn storage_failure_propagates() {
        let mut store = MockVacancyRepository::new();
        store
            .expect_upsert_batch()
            .times(1)
            .returning(|_| Err(Error::Internal("transaction rolled back".into())));

        let pipeline = IngestionPipeline::new(
            vec![source_returning(
                SourceId::HeadHunter,
                vec![record(SourceId::HeadHunter, 1, None)],
            )],
            Arc::new(store),
            CurrencyRates::default(),
        );

        assert_err!(pipeline.run("Python").await);
    }
}
