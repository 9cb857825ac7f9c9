//! Dictionary check binary - validates every locale bundle against the default one
//!
//! Usage:
//!   cargo run --bin check-dictionaries              # Check DICTIONARY_DIR (defaults to locales/)
//!   cargo run --bin check-dictionaries -- path/dir  # Check another directory
//!
//! Exits non-zero when a bundle is unreadable or is missing keys. Extra keys
//! and placeholder mismatches are reported as warnings only.

use anyhow::{bail, Result};
use tour_storefront::i18n::{
    Dictionary, DictionarySource, DictionaryValidator, DirectorySource, Locale,
};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("check_dictionaries=info".parse()?)
                .add_directive("tour_storefront=info".parse()?),
        )
        .init();

    let dir = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("DICTIONARY_DIR").ok())
        .unwrap_or_else(|| "locales".to_string());
    let source = DirectorySource::new(&dir);
    info!("Checking dictionaries in {}", source.dir().display());

    let mut bundles: Vec<(Locale, Dictionary)> = Vec::new();
    let mut unreadable = 0;
    for locale in Locale::all() {
        match source.load(locale).await {
            Ok(dictionary) => {
                info!("{}: {} keys", locale, dictionary.keys().len());
                bundles.push((locale, dictionary));
            }
            Err(e) => {
                error!("{}: {}", locale, e);
                unreadable += 1;
            }
        }
    }

    let reports = DictionaryValidator::validate_all(bundles.iter().map(|(l, d)| (*l, d)));
    let mut incomplete = 0;
    for report in &reports {
        for message in &report.errors {
            error!("{}: {}", report.locale, message);
        }
        for message in &report.warnings {
            warn!("{}: {}", report.locale, message);
        }
        if report.has_errors() {
            incomplete += 1;
        } else if report.is_clean() {
            info!("{}: complete", report.locale);
        }
    }

    if unreadable > 0 || incomplete > 0 {
        bail!(
            "Dictionary check failed in {}: {} unreadable, {} incomplete",
            dir,
            unreadable,
            incomplete
        );
    }

    info!("All {} dictionaries are complete", bundles.len());
    Ok(())
}
