//! Internationalization (i18n) for the storefront.
//!
//! Everything that decides which locale is in effect, and which text is shown
//! for it, lives here.
//!
//! # Architecture
//!
//! - `registry`: the closed set of supported locales and their display metadata
//! - `locale`: the validated `Locale` handle
//! - `negotiate`: cookie + `Accept-Language` negotiation
//! - `path`: locale segments in URL paths
//! - `dictionary`: UI string bundles, their cache, and fallback lookup
//! - `fields`: per-locale database column resolution
//! - `metrics`: dictionary cache and lookup counters
//! - `validator`: bundle completeness checks
//!
//! # Example
//!
//! ```rust,ignore
//! use tour_storefront::i18n::{get_localized_field, resolve_locale, DictionaryLoader, DirectorySource};
//!
//! let locale = resolve_locale(cookie, accept_language);
//! let loader = DictionaryLoader::new(DirectorySource::new("locales"));
//! let t = loader.translator(locale).await;
//! let heading = t.t("home.heroTitle");
//! let title = get_localized_field(&tour, "title", locale);
//! ```

mod dictionary;
mod fields;
mod locale;
mod metrics;
mod negotiate;
mod path;
mod registry;
mod validator;

pub use dictionary::{
    Dictionary, DictionaryCache, DictionaryError, DictionaryLoader, DictionarySource,
    DirectorySource, MemorySource, Translator,
};
pub use fields::{
    get_localized_field, split_variant_column, variant_column, LocalizedRecord, LocalizedText,
};
pub use locale::Locale;
pub use metrics::{DictionaryMetrics, MetricsReport};
pub use negotiate::{parse_accept_language, resolve_locale, LanguagePreference};
pub use path::{locale_from_path, localized_path, replace_locale_in_path, split_locale, strip_locale};
pub use registry::{Direction, LocaleConfig, LocaleRegistry};
pub use validator::{DictionaryValidator, ValidationReport};
