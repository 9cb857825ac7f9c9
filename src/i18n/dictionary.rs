//! Dictionary loading, caching and key lookup.
//!
//! A dictionary is a nested JSON object of UI strings for one locale, looked
//! up with dotted keys (`reviews.title`). Bundles come from a
//! [`DictionarySource`] and are cached per locale in a [`DictionaryCache`]
//! owned by the [`DictionaryLoader`]. Callers never see a load error: a
//! bundle that cannot be loaded is replaced by the default locale's bundle,
//! and a key missing from a bundle falls back through [`Translator`].

use crate::i18n::{DictionaryMetrics, Locale};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Errors raised by dictionary sources.
#[derive(Debug, Error)]
pub enum DictionaryError {
    #[error("no dictionary bundle for locale '{0}'")]
    NotFound(String),

    #[error("failed to read dictionary {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid dictionary JSON in {origin}: {source}")]
    Parse {
        origin: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("dictionary root in {0} must be a JSON object")]
    NotAnObject(String),
}

/// Key-value bundle of UI strings for one locale.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dictionary {
    root: Map<String, Value>,
}

impl Dictionary {
    /// Build a dictionary from a JSON value; the root must be an object.
    pub fn from_value(value: Value, origin: &str) -> Result<Self, DictionaryError> {
        match value {
            Value::Object(root) => Ok(Self { root }),
            _ => Err(DictionaryError::NotAnObject(origin.to_string())),
        }
    }

    /// Parse a dictionary from JSON text.
    pub fn from_json_str(json: &str, origin: &str) -> Result<Self, DictionaryError> {
        let value = serde_json::from_str(json).map_err(|source| DictionaryError::Parse {
            origin: origin.to_string(),
            source,
        })?;
        Self::from_value(value, origin)
    }

    /// Look up a dotted key.
    ///
    /// Only non-empty string leaves count as present; objects, numbers and
    /// empty strings all read as missing.
    pub fn get(&self, key: &str) -> Option<&str> {
        let mut segments = key.split('.');
        let mut node = self.root.get(segments.next()?)?;
        for segment in segments {
            node = node.as_object()?.get(segment)?;
        }
        node.as_str().filter(|text| !text.is_empty())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    /// All dotted keys that resolve to a non-empty string, sorted.
    pub fn keys(&self) -> BTreeSet<String> {
        let mut keys = BTreeSet::new();
        collect_keys(&self.root, "", &mut keys);
        keys
    }

    /// Deep-merge `overlay` on top of this dictionary.
    ///
    /// Strings in `overlay` win; empty strings in `overlay` never replace a
    /// value from the base.
    pub fn merged_with(&self, overlay: &Dictionary) -> Dictionary {
        let mut root = self.root.clone();
        merge_into(&mut root, &overlay.root);
        Dictionary { root }
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.root.clone())
    }
}

fn collect_keys(map: &Map<String, Value>, prefix: &str, keys: &mut BTreeSet<String>) {
    for (name, value) in map {
        let key = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{}.{}", prefix, name)
        };
        match value {
            Value::Object(child) => collect_keys(child, &key, keys),
            Value::String(text) if !text.is_empty() => {
                keys.insert(key);
            }
            _ => {}
        }
    }
}

fn merge_into(base: &mut Map<String, Value>, overlay: &Map<String, Value>) {
    for (name, value) in overlay {
        match (base.get_mut(name), value) {
            (Some(Value::Object(base_child)), Value::Object(overlay_child)) => {
                merge_into(base_child, overlay_child)
            }
            (_, Value::String(text)) if text.is_empty() => {}
            _ => {
                base.insert(name.clone(), value.clone());
            }
        }
    }
}

/// Where dictionary bundles come from.
#[async_trait]
pub trait DictionarySource: Send + Sync {
    /// Load the bundle for `locale`.
    async fn load(&self, locale: Locale) -> Result<Dictionary, DictionaryError>;
}

/// Loads `<dir>/<code>.json` from disk.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    dir: PathBuf,
}

impl DirectorySource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the bundle file for a locale code.
    pub fn bundle_path(&self, code: &str) -> PathBuf {
        self.dir.join(format!("{}.json", code))
    }
}

#[async_trait]
impl DictionarySource for DirectorySource {
    async fn load(&self, locale: Locale) -> Result<Dictionary, DictionaryError> {
        let path = self.bundle_path(locale.code());
        let json = tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| DictionaryError::Io {
                path: path.clone(),
                source,
            })?;
        Dictionary::from_json_str(&json, &path.display().to_string())
    }
}

/// In-memory bundles keyed by locale code.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    bundles: HashMap<String, Dictionary>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bundle(mut self, code: &str, dictionary: Dictionary) -> Self {
        self.bundles.insert(code.to_string(), dictionary);
        self
    }
}

#[async_trait]
impl DictionarySource for MemorySource {
    async fn load(&self, locale: Locale) -> Result<Dictionary, DictionaryError> {
        self.bundles
            .get(locale.code())
            .cloned()
            .ok_or_else(|| DictionaryError::NotFound(locale.code().to_string()))
    }
}

/// Process-scoped dictionary cache.
///
/// Entries are written once per locale and read many times. A racing second
/// load of the same locale keeps the first stored value.
#[derive(Debug, Default)]
pub struct DictionaryCache {
    entries: RwLock<HashMap<String, Arc<Dictionary>>>,
}

impl DictionaryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, code: &str) -> Option<Arc<Dictionary>> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.get(code).cloned()
    }

    /// Insert unless present; returns whichever value ends up cached.
    pub fn insert(&self, code: &str, dictionary: Arc<Dictionary>) -> Arc<Dictionary> {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries
            .entry(code.to_string())
            .or_insert(dictionary)
            .clone()
    }

    pub fn clear(&self) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.clear();
    }

    pub fn len(&self) -> usize {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Loads dictionaries through a source and caches them per locale.
pub struct DictionaryLoader {
    source: Arc<dyn DictionarySource>,
    cache: DictionaryCache,
    metrics: Arc<DictionaryMetrics>,
}

impl DictionaryLoader {
    pub fn new(source: impl DictionarySource + 'static) -> Self {
        Self {
            source: Arc::new(source),
            cache: DictionaryCache::new(),
            metrics: Arc::new(DictionaryMetrics::new()),
        }
    }

    pub fn metrics(&self) -> &DictionaryMetrics {
        &self.metrics
    }

    pub fn cache(&self) -> &DictionaryCache {
        &self.cache
    }

    /// Get the dictionary for a locale code.
    ///
    /// Cached bundles are returned without I/O. An unsupported code, or a
    /// bundle that fails to load, yields the default locale's bundle; a failed
    /// supported locale is cached as the default bundle until [`reload`].
    /// If the default bundle itself cannot be loaded, an empty dictionary is
    /// cached in its place.
    ///
    /// [`reload`]: DictionaryLoader::reload
    pub async fn get(&self, code: &str) -> Arc<Dictionary> {
        if let Some(hit) = self.cache.get(code) {
            self.metrics.record_cache_hit();
            return hit;
        }
        self.metrics.record_cache_miss();

        let locale = match Locale::from_code(code) {
            Some(locale) if locale.is_default() => return self.default_dictionary().await,
            Some(locale) => locale,
            None => {
                warn!("Unsupported dictionary locale '{}', serving default bundle", code);
                self.metrics.record_fallback();
                return self.default_dictionary().await;
            }
        };

        let dictionary = match self.load_from_source(locale).await {
            Some(dictionary) => Arc::new(dictionary),
            None => {
                self.metrics.record_fallback();
                self.default_dictionary().await
            }
        };
        self.cache.insert(code, dictionary)
    }

    /// Build a [`Translator`] for a locale.
    pub async fn translator(&self, locale: Locale) -> Translator {
        let dictionary = self.get(locale.code()).await;
        let fallback = self.default_dictionary().await;
        Translator {
            locale,
            dictionary,
            fallback,
            metrics: Arc::clone(&self.metrics),
        }
    }

    /// Load every supported locale into the cache.
    pub async fn preload(&self) {
        for locale in Locale::all() {
            let dictionary = self.get(locale.code()).await;
            debug!(
                "Preloaded dictionary '{}' ({} keys)",
                locale.code(),
                dictionary.keys().len()
            );
        }
    }

    /// Drop every cached bundle so the next request reloads from the source.
    pub fn reload(&self) {
        self.cache.clear();
        info!("Dictionary cache cleared");
    }

    async fn default_dictionary(&self) -> Arc<Dictionary> {
        let default = Locale::default_locale();
        if let Some(hit) = self.cache.get(default.code()) {
            return hit;
        }
        let dictionary = self.load_from_source(default).await.unwrap_or_else(|| {
            error!(
                "Default dictionary '{}' unavailable, serving empty dictionary",
                default.code()
            );
            Dictionary::default()
        });
        self.cache.insert(default.code(), Arc::new(dictionary))
    }

    async fn load_from_source(&self, locale: Locale) -> Option<Dictionary> {
        match self.source.load(locale).await {
            Ok(dictionary) => {
                debug!("Loaded dictionary '{}'", locale.code());
                Some(dictionary)
            }
            Err(e) => {
                self.metrics.record_load_failure();
                warn!("Failed to load dictionary '{}': {}", locale.code(), e);
                None
            }
        }
    }
}

/// String lookup for one locale with a fixed fallback chain.
///
/// `requested bundle → default bundle → literal`. Every call returns a
/// usable, non-empty string (the literal is the key unless one is given).
#[derive(Debug, Clone)]
pub struct Translator {
    locale: Locale,
    dictionary: Arc<Dictionary>,
    fallback: Arc<Dictionary>,
    metrics: Arc<DictionaryMetrics>,
}

impl Translator {
    pub fn locale(&self) -> Locale {
        self.locale
    }

    /// Translate `key`, falling back to the key itself.
    pub fn t<'a>(&'a self, key: &'a str) -> &'a str {
        self.t_or(key, key)
    }

    /// Translate `key`, falling back to `literal` when no bundle has it.
    pub fn t_or<'a>(&'a self, key: &str, literal: &'a str) -> &'a str {
        self.lookup(key).unwrap_or(literal)
    }

    /// Translate `key` and substitute `{name}` placeholders.
    pub fn t_fmt(&self, key: &str, args: &[(&str, &str)]) -> String {
        let mut text = self.t_or(key, key).to_string();
        for (name, value) in args {
            text = text.replace(&format!("{{{}}}", name), value);
        }
        text
    }

    /// The default bundle overlaid with the requested one.
    pub fn to_json(&self) -> Value {
        self.fallback.merged_with(&self.dictionary).to_value()
    }

    fn lookup(&self, key: &str) -> Option<&str> {
        if let Some(text) = self.dictionary.get(key) {
            return Some(text);
        }
        self.metrics.record_missing_key();
        debug!("Missing dictionary key '{}' for '{}'", key, self.locale.code());
        self.fallback.get(key)
    }
}
