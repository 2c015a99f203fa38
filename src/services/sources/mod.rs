pub mod hh;
pub mod superjob;

use async_trait::async_trait;
use std::time::Duration;

#[cfg(test)]
use mockall::automock;

use crate::error::Result;
use crate::models::source_record::{SourceId, SourceRecord};

pub use hh::HeadHunterSource;
pub use superjob::SuperJobSource;

pub const USER_AGENT: &str = "JobVacancyExplorer/1.0 (+https://github.com/Relayn/job-vacancy-explorer)";

/// A job board adapter. Each call owns its HTTP session for the duration of
/// the call and applies its own timeouts and politeness delays.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait VacancySource: Send + Sync {
    fn source_id(&self) -> SourceId;

    async fn parse(&self, search_query: &str) -> Result<Vec<SourceRecord>>;
}

/// Network settings shared by the adapters.
#[derive(Debug, Clone)]
pub struct SourceSettings {
    pub request_timeout: Duration,
    pub request_delay: Duration,
    pub max_pages: u32,
}
