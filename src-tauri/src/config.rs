//! Process-level configuration read from the environment at startup.
//!
//! User-facing choices (model version, inspection mode) live in
//! [`crate::settings::AppSettings`] instead.

use std::time::Duration;

use anyhow::{Context, Result};

const API_KEY_VAR: &str = "GEMINI_API_KEY";
const API_KEY_FALLBACK_VAR: &str = "GOOGLE_API_KEY";
const BASE_URL_VAR: &str = "BEARINGSCAN_GEMINI_BASE_URL";
const TIMEOUT_VAR: &str = "BEARINGSCAN_REQUEST_TIMEOUT_SECS";
const DEBUG_VAR: &str = "BEARINGSCAN_DEBUG";

const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub gemini_api_key: Option<String>,
    pub gemini_base_url: Option<String>,
    pub request_timeout: Duration,
    pub debug: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            gemini_api_key: None,
            gemini_base_url: None,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            debug: false,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let read = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let gemini_api_key = read(API_KEY_VAR).or_else(|| read(API_KEY_FALLBACK_VAR));
        let gemini_base_url = read(BASE_URL_VAR);

        let request_timeout = match read(TIMEOUT_VAR) {
            Some(raw) => {
                let secs: u64 = raw
                    .parse()
                    .with_context(|| format!("{TIMEOUT_VAR} must be a whole number of seconds, got {raw:?}"))?;
                Duration::from_secs(secs.max(1))
            }
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        let debug = read(DEBUG_VAR)
            .map(|raw| matches!(raw.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
            .unwrap_or(false);

        Ok(Self {
            gemini_api_key,
            gemini_base_url,
            request_timeout,
            debug,
        })
    }
}
