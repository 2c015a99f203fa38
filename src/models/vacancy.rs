use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A vacancy as persisted by the store.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Vacancy {
    pub id: Uuid,
    pub title: String,
    pub company: String,
    pub location: Option<String>,
    pub salary: Option<String>,
    pub description: String,
    pub published_at: DateTime<Utc>,
    pub source: String,
    pub original_url: String,
    pub salary_min_base: Option<i64>,
    pub salary_max_base: Option<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct CompanyCount {
    pub company: String,
    pub vacancies: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct CitySalary {
    pub city: String,
    pub average_salary: f64,
    pub vacancies: i64,
}
