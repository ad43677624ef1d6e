//! Configuration for the epubcfi command-line tool

use std::env;

use crate::cfi::ResolveOptions;

const DEFAULT_LOG_FILTER: &str = "epubcfi=info";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub resolve: ResolveOptions,
    /// tracing filter directive
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            resolve: ResolveOptions::default(),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl Config {
    /// Read `EPUBCFI_IGNORE_IDS` and `EPUBCFI_LOG`, after loading `.env` if
    /// present
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Config {
            resolve: ResolveOptions {
                ignore_ids: lookup("EPUBCFI_IGNORE_IDS")
                    .map(|v| parse_flag(&v))
                    .unwrap_or(false),
            },
            log_filter: lookup("EPUBCFI_LOG").unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
        }
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
