//! Locale type: a validated handle onto a registry entry.
//!
//! A `Locale` can only be obtained from the registry, so holding one is proof
//! that the code is supported.

use crate::i18n::{Direction, LocaleConfig, LocaleRegistry};
use serde::{Serialize, Serializer};
use std::fmt;

/// A supported locale.
#[derive(Clone, Copy)]
pub struct Locale {
    config: &'static LocaleConfig,
}

impl Locale {
    /// Create a Locale from a code.
    ///
    /// # Returns
    /// * `Some(Locale)` if the code is supported (exact, case-sensitive match)
    /// * `None` otherwise
    pub fn from_code(code: &str) -> Option<Locale> {
        LocaleRegistry::get()
            .get_by_code(code)
            .map(|config| Locale { config })
    }

    /// The default locale, used as the terminal fallback everywhere.
    pub fn default_locale() -> Locale {
        Locale {
            config: LocaleRegistry::get().default_locale(),
        }
    }

    /// All supported locales in registry order.
    pub fn all() -> impl Iterator<Item = Locale> {
        LocaleRegistry::get()
            .list()
            .iter()
            .map(|config| Locale { config })
    }

    /// The locale code (e.g., "th").
    pub fn code(&self) -> &'static str {
        self.config.code
    }

    /// Full display metadata.
    pub fn config(&self) -> &'static LocaleConfig {
        self.config
    }

    pub fn name(&self) -> &'static str {
        self.config.name
    }

    pub fn native_name(&self) -> &'static str {
        self.config.native_name
    }

    pub fn flag(&self) -> &'static str {
        self.config.flag
    }

    pub fn direction(&self) -> Direction {
        self.config.direction
    }

    /// Check if this is the default locale.
    pub fn is_default(&self) -> bool {
        self.code() == LocaleRegistry::get().default_locale().code
    }
}

impl Default for Locale {
    fn default() -> Self {
        Locale::default_locale()
    }
}

impl PartialEq for Locale {
    fn eq(&self, other: &Self) -> bool {
        self.code() == other.code()
    }
}

impl Eq for Locale {}

impl fmt::Debug for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Locale").field(&self.code()).finish()
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl Serialize for Locale {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== from_code Tests ====================

    #[test]
    fn test_from_code_supported() {
        for code in ["en", "th", "zh"] {
            let locale = Locale::from_code(code).expect("supported");
            assert_eq!(locale.code(), code);
        }
    }

    #[test]
    fn test_from_code_unsupported() {
        assert!(Locale::from_code("fr").is_none());
        assert!(Locale::from_code("").is_none());
        assert!(Locale::from_code("TH").is_none());
        assert!(Locale::from_code("zh-CN").is_none());
    }

    // ==================== Default Tests ====================

    #[test]
    fn test_default_is_english() {
        let locale = Locale::default();
        assert_eq!(locale.code(), "en");
        assert!(locale.is_default());
        assert!(!Locale::from_code("th").unwrap().is_default());
    }

    #[test]
    fn test_all_starts_with_default() {
        let all: Vec<_> = Locale::all().collect();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0], Locale::default_locale());
    }

    // ==================== Trait Tests ====================

    #[test]
    fn test_display_and_debug() {
        let zh = Locale::from_code("zh").unwrap();
        assert_eq!(zh.to_string(), "zh");
        assert_eq!(format!("{:?}", zh), "Locale(\"zh\")");
    }

    #[test]
    fn test_serializes_as_code() {
        let th = Locale::from_code("th").unwrap();
        assert_eq!(serde_json::to_string(&th).unwrap(), "\"th\"");
    }

    #[test]
    fn test_metadata_accessors() {
        let th = Locale::from_code("th").unwrap();
        assert_eq!(th.name(), "Thai");
        assert_eq!(th.native_name(), "ไทย");
        assert_eq!(th.flag(), "🇹🇭");
        assert_eq!(th.direction(), Direction::Ltr);
    }
}
