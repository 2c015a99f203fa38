use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::utils::salary::{normalize_salary, CurrencyRates};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceId {
    #[serde(rename = "hh.ru")]
    HeadHunter,
    #[serde(rename = "superjob.ru")]
    SuperJob,
}

impl SourceId {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceId::HeadHunter => "hh.ru",
            SourceId::SuperJob => "superjob.ru",
        }
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One scraped posting as handed over by a source adapter.
///
/// `original_url` is always absolute and identifies the posting across runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct SourceRecord {
    #[validate(length(min = 1))]
    pub title: String,
    #[validate(length(min = 1))]
    pub company: String,
    pub location: Option<String>,
    pub raw_salary: Option<String>,
    pub description: String,
    pub published_at: DateTime<Utc>,
    pub source: SourceId,
    #[validate(url)]
    pub original_url: String,
}

/// A source record with its salary expressed in the base currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedVacancy {
    pub record: SourceRecord,
    pub salary_min_base: Option<i64>,
    pub salary_max_base: Option<i64>,
}

impl NormalizedVacancy {
    pub fn from_record(record: SourceRecord, rates: &CurrencyRates) -> Self {
        let salary = normalize_salary(record.raw_salary.as_deref(), rates);
        Self {
            record,
            salary_min_base: salary.min,
            salary_max_base: salary.max,
        }
    }
}
