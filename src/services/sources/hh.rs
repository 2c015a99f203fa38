//! hh.ru adapter backed by the public JSON API.

use async_trait::async_trait;
use reqwest::{header::ACCEPT, Client};
use serde::Deserialize;
use std::time::Duration;
use tracing::{error, info, instrument, warn};
use url::Url;

use super::{SourceSettings, VacancySource, USER_AGENT};
use crate::error::{Error, Result};
use crate::models::source_record::{SourceId, SourceRecord};
use crate::utils::time::parse_iso_timestamp;
use crate::utils::validation::{absolutize_url, validate};

const HH_API_URL: &str = "https://api.hh.ru/vacancies";
const HH_SITE_URL: &str = "https://hh.ru";
const PER_PAGE: u32 = 50;
/// The API refuses to page past 2000 results.
const MAX_PAGES: u32 = 20;

const COMPANY_PLACEHOLDER: &str = "Компания не указана";
const LOCATION_PLACEHOLDER: &str = "Местоположение не указано";

#[derive(Debug, Deserialize)]
struct HhPage {
    #[serde(default)]
    items: Vec<serde_json::Value>,
    #[serde(default = "default_pages")]
    pages: u32,
}

fn default_pages() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
struct HhItem {
    id: Option<serde_json::Value>,
    name: Option<String>,
    employer: Option<HhNamed>,
    area: Option<HhNamed>,
    salary: Option<HhSalary>,
    snippet: Option<HhSnippet>,
    published_at: Option<String>,
    alternate_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HhNamed {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct HhSalary {
    pub from: Option<i64>,
    pub to: Option<i64>,
    pub currency: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HhSnippet {
    requirement: Option<String>,
    responsibility: Option<String>,
}

/// Records extracted from one API page.
#[derive(Debug)]
pub struct HhPageResult {
    pub records: Vec<SourceRecord>,
    pub item_count: usize,
    pub pages: u32,
}

pub struct HeadHunterSource {
    area: u32,
    settings: SourceSettings,
    site_url: Url,
}

impl HeadHunterSource {
    pub fn new(area: u32, request_timeout: Duration) -> Result<Self> {
        let site_url = Url::parse(HH_SITE_URL)
            .map_err(|e| Error::Config(format!("Invalid hh.ru site URL: {}", e)))?;
        Ok(Self {
            area,
            settings: SourceSettings {
                request_timeout,
                request_delay: Duration::from_millis(500),
                max_pages: MAX_PAGES,
            },
            site_url,
        })
    }

    async fn fetch_page(&self, client: &Client, search_query: &str, page: u32) -> Result<String> {
        let body = client
            .get(HH_API_URL)
            .header(ACCEPT, "application/json")
            .query(&[
                ("text", search_query.to_string()),
                ("area", self.area.to_string()),
                ("per_page", PER_PAGE.to_string()),
                ("page", page.to_string()),
            ])
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(body)
    }
}

/// Renders the API salary object the way the site displays it,
/// e.g. `"от 100000 до 150000 RUR"`.
pub fn format_salary(salary: &HhSalary) -> Option<String> {
    let mut parts = Vec::new();
    if let Some(from) = salary.from {
        parts.push(format!("от {}", from));
    }
    if let Some(to) = salary.to {
        parts.push(format!("до {}", to));
    }
    if parts.is_empty() {
        return None;
    }
    let currency = salary
        .currency
        .as_deref()
        .unwrap_or("RUR")
        .to_uppercase();
    Some(format!("{} {}", parts.join(" "), currency))
}

fn strip_highlight(text: Option<&str>) -> String {
    text.unwrap_or_default()
        .replace("<highlighttext>", "")
        .replace("</highlighttext>", "")
}

fn named(value: Option<HhNamed>, placeholder: &str) -> String {
    value
        .and_then(|v| v.name)
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| placeholder.to_string())
}

fn record_from_item(item: HhItem, site_url: &Url) -> Option<SourceRecord> {
    let id = item.id.map(|id| id.to_string()).unwrap_or_default();

    let Some(title) = item.name.map(|name| name.trim().to_string()).filter(|n| !n.is_empty())
    else {
        warn!(item_id = %id, "Skipping hh.ru vacancy without a title");
        return None;
    };
    let Some(original_url) = item
        .alternate_url
        .as_deref()
        .and_then(|href| absolutize_url(site_url, href))
    else {
        warn!(item_id = %id, "Skipping hh.ru vacancy without a link");
        return None;
    };
    let Some(published_at) = item.published_at.as_deref().and_then(parse_iso_timestamp) else {
        warn!(item_id = %id, raw = ?item.published_at, "Skipping hh.ru vacancy with unreadable date");
        return None;
    };

    let description = item
        .snippet
        .map(|snippet| {
            format!(
                "{}\n{}",
                strip_highlight(snippet.requirement.as_deref()),
                strip_highlight(snippet.responsibility.as_deref())
            )
        })
        .unwrap_or_default()
        .trim()
        .to_string();

    let record = SourceRecord {
        title,
        company: named(item.employer, COMPANY_PLACEHOLDER),
        location: Some(named(item.area, LOCATION_PLACEHOLDER)),
        raw_salary: item.salary.as_ref().and_then(format_salary),
        description,
        published_at,
        source: SourceId::HeadHunter,
        original_url,
    };

    match validate(&record) {
        Ok(()) => Some(record),
        Err(e) => {
            warn!(item_id = %id, error = %e, "Skipping invalid hh.ru vacancy");
            None
        }
    }
}

/// Parses one `/vacancies` response body. Malformed items are skipped.
pub fn parse_page(body: &str, site_url: &Url) -> Result<HhPageResult> {
    let page: HhPage = serde_json::from_str(body)?;
    let item_count = page.items.len();
    let records = page
        .items
        .into_iter()
        .filter_map(|value| match serde_json::from_value::<HhItem>(value) {
            Ok(item) => record_from_item(item, site_url),
            Err(e) => {
                warn!(error = %e, "Skipping malformed hh.ru item");
                None
            }
        })
        .collect();

    Ok(HhPageResult {
        records,
        item_count,
        pages: page.pages,
    })
}

#[async_trait]
impl VacancySource for HeadHunterSource {
    fn source_id(&self) -> SourceId {
        SourceId::HeadHunter
    }

    #[instrument(skip(self), fields(source = "hh.ru"))]
    async fn parse(&self, search_query: &str) -> Result<Vec<SourceRecord>> {
        info!("Starting hh.ru parse");
        let client = Client::builder()
            .timeout(self.settings.request_timeout)
            .user_agent(USER_AGENT)
            .build()?;

        let mut records = Vec::new();
        let mut page = 0;
        loop {
            let result = match self.fetch_page(&client, search_query, page).await {
                Ok(body) => parse_page(&body, &self.site_url),
                Err(e) => Err(e),
            };
            let result = match result {
                Ok(result) => result,
                Err(e) if page == 0 => return Err(e),
                Err(e) => {
                    error!(page, error = %e, "hh.ru request failed, keeping earlier pages");
                    break;
                }
            };

            if result.item_count == 0 {
                break;
            }
            records.extend(result.records);

            page += 1;
            if page >= result.pages || page >= self.settings.max_pages {
                break;
            }
            tokio::time::sleep(self.settings.request_delay).await;
        }

        info!(found = records.len(), "hh.ru parse finished");
        Ok(records)
    }
}
