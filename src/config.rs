use crate::error::{Error, Result};
use crate::utils::salary::CurrencyRates;
use dotenvy::dotenv;
use std::env;
use std::sync::OnceLock;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub database_url: String,
    pub database_max_connections: u32,
    pub scheduler_interval_secs: u64,
    pub default_search_query: String,
    pub currency_rates: CurrencyRates,
    pub proxy_list: Vec<String>,
    pub hh_area: u32,
    pub superjob_max_pages: u32,
    pub request_timeout_secs: u64,
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let currency_rates = currency_rates(
            env::var("CURRENCY_RATES_JSON").ok().as_deref(),
            &get_env_or("BASE_CURRENCY", "RUB"),
        );

        Ok(Self {
            server_address: get_env_or("SERVER_ADDRESS", "0.0.0.0:8080"),
            database_url: get_env("DATABASE_URL")?,
            database_max_connections: get_env_parse_or("DATABASE_MAX_CONNECTIONS", 10)?,
            scheduler_interval_secs: get_env_parse_or("SCHEDULER_INTERVAL", 3600)?,
            default_search_query: get_env_or("DEFAULT_SEARCH_QUERY", "Python"),
            currency_rates,
            proxy_list: parse_proxy_list(&env::var("PROXY_LIST").unwrap_or_default()),
            hh_area: get_env_parse_or("HH_AREA", 1)?,
            superjob_max_pages: get_env_parse_or("SUPERJOB_MAX_PAGES", 5)?,
            request_timeout_secs: get_env_parse_or("REQUEST_TIMEOUT_SECS", 10)?,
        })
    }

    pub fn scheduler_interval(&self) -> Duration {
        Duration::from_secs(self.scheduler_interval_secs.max(1))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

/// Builds the rate table; amounts without a currency marker are read in `base`.
pub fn currency_rates(raw_json: Option<&str>, base: &str) -> CurrencyRates {
    raw_json
        .map(CurrencyRates::from_json_or_default)
        .unwrap_or_default()
        .with_base(base)
}

/// Splits a comma-separated proxy list, dropping blank entries.
pub fn parse_proxy_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|proxy| !proxy.is_empty())
        .map(str::to_string)
        .collect()
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

fn get_env_or(name: &str, default: &str) -> String {
    env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn get_env_parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e))),
        _ => Ok(default),
    }
}

pub fn init_config() -> Result<()> {
    let config = Config::from_env()?;
    CONFIG
        .set(config)
        .map_err(|_| Error::Config("Configuration has already been initialized".to_string()))?;
    Ok(())
}

pub fn get_config() -> &'static Config {
    CONFIG
        .get()
        .expect("Configuration has not been initialized")
}
