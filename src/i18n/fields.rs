//! Localized-field resolution for records with per-locale columns.
//!
//! A localized record stores a default column (`title`) holding the authoring
//! text plus one variant per locale (`title_en`, `title_th`, `title_zh`) that
//! may be null while a translation is pending or after it failed.

use crate::i18n::Locale;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Column-level read access to a record.
pub trait LocalizedRecord {
    /// Raw value of the named column; `None` when absent or null.
    fn field(&self, name: &str) -> Option<&str>;
}

/// Name of the variant column for `base` in `locale` (`title` → `title_th`).
pub fn variant_column(base: &str, locale: Locale) -> String {
    format!("{}_{}", base, locale.code())
}

/// Split a variant column name into its base and locale (`title_th` →
/// `("title", th)`). Columns whose suffix is not a supported code are not
/// variants.
pub fn split_variant_column(name: &str) -> Option<(&str, Locale)> {
    let (base, code) = name.rsplit_once('_')?;
    if base.is_empty() {
        return None;
    }
    Locale::from_code(code).map(|locale| (base, locale))
}

/// Resolve the best available text of `base` for `locale`.
///
/// Order: `<base>_<locale>`, then `<base>_<default>`, then the bare `<base>`
/// column. Absent, null and empty values are all skipped alike. Returns an
/// empty string only when even the bare column is empty.
pub fn get_localized_field<'a, R>(record: &'a R, base: &str, locale: Locale) -> &'a str
where
    R: LocalizedRecord + ?Sized,
{
    let non_empty = move |name: &str| record.field(name).filter(|value| !value.is_empty());

    non_empty(&variant_column(base, locale))
        .or_else(|| non_empty(&variant_column(base, Locale::default_locale())))
        .or_else(|| non_empty(base))
        .unwrap_or("")
}

/// One text value in every supported locale.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizedText {
    pub en: Option<String>,
    pub th: Option<String>,
    pub zh: Option<String>,
}

impl LocalizedText {
    /// The same text for every locale.
    pub fn uniform(text: &str) -> Self {
        Self {
            en: Some(text.to_string()),
            th: Some(text.to_string()),
            zh: Some(text.to_string()),
        }
    }

    pub fn get(&self, locale: Locale) -> Option<&str> {
        match locale.code() {
            "en" => self.en.as_deref(),
            "th" => self.th.as_deref(),
            "zh" => self.zh.as_deref(),
            _ => None,
        }
    }

    pub fn set(&mut self, locale: Locale, text: String) {
        match locale.code() {
            "en" => self.en = Some(text),
            "th" => self.th = Some(text),
            "zh" => self.zh = Some(text),
            _ => {}
        }
    }
}

impl LocalizedRecord for HashMap<String, String> {
    fn field(&self, name: &str) -> Option<&str> {
        self.get(name).map(String::as_str)
    }
}

impl LocalizedRecord for HashMap<String, Option<String>> {
    fn field(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(|value| value.as_deref())
    }
}

impl LocalizedRecord for Map<String, Value> {
    fn field(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }
}

impl LocalizedRecord for Value {
    fn field(&self, name: &str) -> Option<&str> {
        self.as_object().and_then(|map| map.field(name))
    }
}
