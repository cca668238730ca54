//! Configuration module
//!
//! Client settings come from the environment (a `.env` file is loaded first when
//! present). Every value has a default so a bare `ClientConfig::from_env()` talks to
//! a local development server.

use std::env;
use std::time::Duration;

use crate::error::ClientError;

const DEFAULT_API_URL: &str = "http://localhost:8000/api";
const HTTP_TIMEOUT_SECS: u64 = 60;
const SEARCH_DEBOUNCE_MS: u64 = 300;
const RESULT_DISPLAY_MS: u64 = 5000;
const STATS_REFRESH_SECS: u64 = 30;

#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Base URL of the catalog API, without trailing slash (e.g. `http://host/api`).
    pub api_url: String,
    pub request_timeout: Duration,
    /// Quiet period before a typed search term settles.
    pub search_debounce: Duration,
    /// How long a successful upload result stays visible.
    pub result_display: Duration,
    /// Polling period for storage statistics in watch mode.
    pub stats_refresh: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            request_timeout: Duration::from_secs(HTTP_TIMEOUT_SECS),
            search_debounce: Duration::from_millis(SEARCH_DEBOUNCE_MS),
            result_display: Duration::from_millis(RESULT_DISPLAY_MS),
            stats_refresh: Duration::from_secs(STATS_REFRESH_SECS),
        }
    }
}

impl ClientConfig {
    /// Load from environment: STASH_API_URL (or API_URL), STASH_HTTP_TIMEOUT_SECS,
    /// STASH_SEARCH_DEBOUNCE_MS, STASH_RESULT_DISPLAY_MS, STASH_STATS_REFRESH_SECS.
    pub fn from_env() -> Result<Self, ClientError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. `from_env` delegates here.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ClientError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url = lookup("STASH_API_URL")
            .or_else(|| lookup("API_URL"))
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let api_url = api_url.trim().trim_end_matches('/').to_string();
        if api_url.is_empty() {
            return Err(ClientError::Config("STASH_API_URL must not be empty".to_string()));
        }

        Ok(Self {
            api_url,
            request_timeout: Duration::from_secs(parse_number(
                &lookup,
                "STASH_HTTP_TIMEOUT_SECS",
                HTTP_TIMEOUT_SECS,
            )?),
            search_debounce: Duration::from_millis(parse_number(
                &lookup,
                "STASH_SEARCH_DEBOUNCE_MS",
                SEARCH_DEBOUNCE_MS,
            )?),
            result_display: Duration::from_millis(parse_number(
                &lookup,
                "STASH_RESULT_DISPLAY_MS",
                RESULT_DISPLAY_MS,
            )?),
            stats_refresh: Duration::from_secs(parse_number(
                &lookup,
                "STASH_STATS_REFRESH_SECS",
                STATS_REFRESH_SECS,
            )?),
        })
    }
}

fn parse_number<F>(lookup: &F, key: &str, default: u64) -> Result<u64, ClientError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ClientError::Config(format!("{} must be a valid number", key))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = ClientConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.api_url, "http://localhost:8000/api");
        assert_eq!(config.search_debounce, Duration::from_millis(300));
        assert_eq!(config.result_display, Duration::from_millis(5000));
        assert_eq!(config.stats_refresh, Duration::from_secs(30));
        assert_eq!(config.request_timeout, Duration::from_secs(60));
    }

    #[test]
    fn api_url_falls_back_to_generic_variable_and_trims_slash() {
        let config =
            ClientConfig::from_lookup(lookup_from(&[("API_URL", "https://files.example/api/")]))
                .unwrap();
        assert_eq!(config.api_url, "https://files.example/api");

        let config = ClientConfig::from_lookup(lookup_from(&[
            ("API_URL", "https://ignored.example"),
            ("STASH_API_URL", "https://stash.example/api"),
        ]))
        .unwrap();
        assert_eq!(config.api_url, "https://stash.example/api");
    }

    #[test]
    fn timings_are_overridable() {
        let config = ClientConfig::from_lookup(lookup_from(&[
            ("STASH_SEARCH_DEBOUNCE_MS", "150"),
            ("STASH_RESULT_DISPLAY_MS", "1000"),
        ]))
        .unwrap();
        assert_eq!(config.search_debounce, Duration::from_millis(150));
        assert_eq!(config.result_display, Duration::from_millis(1000));
    }

    #[test]
    fn invalid_number_is_a_config_error() {
        let err = ClientConfig::from_lookup(lookup_from(&[("STASH_HTTP_TIMEOUT_SECS", "soon")]))
            .unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
        assert!(err.to_string().contains("STASH_HTTP_TIMEOUT_SECS"));
    }
}
