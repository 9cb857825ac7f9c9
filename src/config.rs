use crate::middleware::{DEFAULT_EXCLUDED_PREFIXES, LOCALE_COOKIE_NAME};
use crate::translation::DEFAULT_TRANSLATE_API_URL;
use anyhow::{Context, Result};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    // Server
    pub port: u16,

    // Catalog (in-memory when unset)
    pub database_url: Option<String>,

    // Dictionaries
    pub dictionary_dir: PathBuf,

    // Locale routing
    pub locale_cookie_name: String,
    pub excluded_prefixes: Vec<String>,

    // Machine translation
    pub translate_api_url: String,

    // Admin API (admin endpoints reject every request when unset)
    pub api_key: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            database_url: None,
            dictionary_dir: PathBuf::from("locales"),
            locale_cookie_name: LOCALE_COOKIE_NAME.to_string(),
            excluded_prefixes: DEFAULT_EXCLUDED_PREFIXES
                .iter()
                .map(|p| p.to_string())
                .collect(),
            translate_api_url: DEFAULT_TRANSLATE_API_URL.to_string(),
            api_key: None,
        }
    }
}

/// Non-empty value of an environment variable.
fn env_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Split a comma-separated prefix list, dropping blanks.
pub fn parse_prefix_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let port = match env_var("PORT") {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("PORT must be a port number, got {:?}", raw))?,
            None => defaults.port,
        };

        Ok(Self {
            port,
            database_url: env_var("DATABASE_URL"),
            dictionary_dir: env_var("DICTIONARY_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.dictionary_dir),
            locale_cookie_name: env_var("LOCALE_COOKIE_NAME")
                .unwrap_or(defaults.locale_cookie_name),
            excluded_prefixes: env_var("LOCALE_EXCLUDED_PREFIXES")
                .map(|raw| parse_prefix_list(&raw))
                .unwrap_or(defaults.excluded_prefixes),
            translate_api_url: env_var("TRANSLATE_API_URL")
                .unwrap_or(defaults.translate_api_url),
            api_key: env_var("API_KEY"),
        })
    }
}
