//! superjob.ru adapter that scrapes the public search result pages.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use reqwest::{header::ACCEPT, Client, Proxy};
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

use super::{SourceSettings, VacancySource, USER_AGENT};
use crate::error::{Error, Result};
use crate::models::source_record::{SourceId, SourceRecord};
use crate::utils::date_text::parse_date_text;
use crate::utils::time;
use crate::utils::validation::{absolutize_url, validate};

const SUPERJOB_BASE_URL: &str = "https://russia.superjob.ru";
const HTML_ACCEPT: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8";

const COMPANY_PLACEHOLDER: &str = "Не указана";
const LOCATION_PLACEHOLDER: &str = "Не указан";
const SALARY_PLACEHOLDER: &str = "По договоренности";

struct CardSelectors {
    card: Selector,
    title: Selector,
    company: Selector,
    location_pin: Selector,
    span: Selector,
    salary: Selector,
    date: Selector,
    description: Selector,
    next_page: Selector,
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| Error::Parse(format!("Invalid selector {}: {:?}", css, e)))
}

impl CardSelectors {
    fn new() -> Result<Self> {
        Ok(Self {
            card: selector("div.f-test-search-result-item")?,
            title: selector(r#"a[href*="/vakansii/"]"#)?,
            company: selector("span.f-test-text-vacancy-item-company-name")?,
            location_pin: selector(r##"svg use[href="#pin"]"##)?,
            span: selector("span")?,
            salary: selector(".f-test-text-company-item-salary")?,
            date: selector("span._2Q1BH._3doCL._2eclS")?,
            description: selector("span._2Q1BH._3doCL._2k8ZM.rtYnN.sPJuZ")?,
            next_page: selector("a.f-test-button-dalshe")?,
        })
    }
}

/// Records extracted from one search result page.
#[derive(Debug)]
pub struct SearchPage {
    pub records: Vec<SourceRecord>,
    pub card_count: usize,
    pub has_next: bool,
}

pub struct SuperJobSource {
    settings: SourceSettings,
    proxies: Vec<String>,
    base_url: Url,
}

impl SuperJobSource {
    pub fn new(max_pages: u32, request_timeout: Duration, proxies: Vec<String>) -> Result<Self> {
        let base_url = Url::parse(SUPERJOB_BASE_URL)
            .map_err(|e| Error::Config(format!("Invalid superjob.ru base URL: {}", e)))?;
        Ok(Self {
            settings: SourceSettings {
                request_timeout,
                request_delay: Duration::from_secs(1),
                max_pages,
            },
            proxies,
            base_url,
        })
    }

    fn build_client(&self) -> Result<Client> {
        let mut builder = Client::builder()
            .timeout(self.settings.request_timeout)
            .user_agent(USER_AGENT);
        if let Some(proxy) = self.proxies.choose(&mut rand::thread_rng()) {
            debug!(proxy = %proxy, "Routing superjob.ru requests through proxy");
            builder = builder.proxy(Proxy::all(proxy.as_str())?);
        }
        Ok(builder.build()?)
    }

    fn search_url(&self, search_query: &str, page: u32) -> Result<Url> {
        let endpoint = self
            .base_url
            .join("/vacancy/search/")
            .map_err(|e| Error::Parse(e.to_string()))?;
        Url::parse_with_params(
            endpoint.as_str(),
            &[("keywords", search_query), ("page", page.to_string().as_str())],
        )
        .map_err(|e| Error::Parse(e.to_string()))
    }

    async fn fetch_page(&self, client: &Client, url: Url) -> Result<String> {
        let body = client
            .get(url)
            .header(ACCEPT, HTML_ACCEPT)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(body)
    }
}

fn clean_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn non_empty(text: String) -> Option<String> {
    (!text.is_empty()).then_some(text)
}

fn parse_card(
    card: ElementRef<'_>,
    selectors: &CardSelectors,
    base_url: &Url,
    now: DateTime<Utc>,
) -> Option<SourceRecord> {
    let link = card.select(&selectors.title).next()?;
    let original_url = link
        .value()
        .attr("href")
        .and_then(|href| absolutize_url(base_url, href))?;
    let title = clean_text(link);

    let company = card
        .select(&selectors.company)
        .next()
        .map(clean_text)
        .and_then(non_empty)
        .unwrap_or_else(|| COMPANY_PLACEHOLDER.to_string());

    let location = card
        .select(&selectors.location_pin)
        .next()
        .and_then(|pin| {
            pin.ancestors()
                .filter_map(ElementRef::wrap)
                .find(|el| el.value().name() == "div")
        })
        .and_then(|div| div.select(&selectors.span).next())
        .map(clean_text)
        .and_then(non_empty)
        .unwrap_or_else(|| LOCATION_PLACEHOLDER.to_string());

    let raw_salary = card
        .select(&selectors.salary)
        .next()
        .map(clean_text)
        .and_then(non_empty)
        .unwrap_or_else(|| SALARY_PLACEHOLDER.to_string());

    let published_at = card
        .select(&selectors.date)
        .next()
        .map(|el| parse_date_text(&clean_text(el), now))
        .unwrap_or(now);

    let description = card
        .select(&selectors.description)
        .map(clean_text)
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join("\n");

    let record = SourceRecord {
        title,
        company,
        location: Some(location),
        raw_salary: Some(raw_salary),
        description,
        published_at,
        source: SourceId::SuperJob,
        original_url,
    };

    match validate(&record) {
        Ok(()) => Some(record),
        Err(e) => {
            warn!(url = %record.original_url, error = %e, "Skipping invalid superjob.ru card");
            None
        }
    }
}

/// Extracts the vacancy cards of one search result page.
pub fn parse_search_page(html: &str, base_url: &Url, now: DateTime<Utc>) -> Result<SearchPage> {
    let selectors = CardSelectors::new()?;
    let document = Html::parse_document(html);

    let mut card_count = 0;
    let mut records = Vec::new();
    for card in document.select(&selectors.card) {
        card_count += 1;
        match parse_card(card, &selectors, base_url, now) {
            Some(record) => records.push(record),
            None => warn!("Skipping superjob.ru card without a vacancy link"),
        }
    }

    Ok(SearchPage {
        records,
        card_count,
        has_next: document.select(&selectors.next_page).next().is_some(),
    })
}

#[async_trait]
impl VacancySource for SuperJobSource {
    fn source_id(&self) -> SourceId {
        SourceId::SuperJob
    }

    #[instrument(skip(self), fields(source = "superjob.ru"))]
    async fn parse(&self, search_query: &str) -> Result<Vec<SourceRecord>> {
        info!("Starting superjob.ru parse");
        let client = self.build_client()?;

        let mut records = Vec::new();
        for page in 1..=self.settings.max_pages {
            let url = self.search_url(search_query, page)?;
            debug!(%url, "Fetching superjob.ru page");

            let html = match self.fetch_page(&client, url).await {
                Ok(html) => html,
                Err(e) if page == 1 => return Err(e),
                Err(e) => {
                    error!(page, error = %e, "superjob.ru request failed, keeping earlier pages");
                    break;
                }
            };

            let result = parse_search_page(&html, &self.base_url, time::now())?;
            if result.card_count == 0 {
                info!(page, "No vacancy cards on page, stopping");
                break;
            }
            records.extend(result.records);

            if !result.has_next {
                info!(page, "No next page link, stopping");
                break;
            }
            if page < self.settings.max_pages {
                tokio::time::sleep(self.settings.request_delay).await;
            }
        }

        info!(found = records.len(), "superjob.ru parse finished");
        Ok(records)
    }
}
