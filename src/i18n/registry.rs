//! Locale registry: Single source of truth for all supported locales.
//!
//! The set of locales is closed and fixed at compile time. Order matters:
//! the first entry is the default locale and the terminal fallback for every
//! negotiation, dictionary and field lookup.

use serde::Serialize;

/// Text direction of a locale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Ltr,
    Rtl,
}

impl Direction {
    /// The value used for the HTML `dir` attribute.
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Ltr => "ltr",
            Direction::Rtl => "rtl",
        }
    }
}

/// Display metadata for a supported locale.
#[derive(Debug, Clone, Serialize)]
pub struct LocaleConfig {
    /// Canonical locale code used in paths, cookies and column suffixes (e.g., "th")
    pub code: &'static str,

    /// English name of the locale (e.g., "Thai")
    pub name: &'static str,

    /// Name of the locale in its own script (e.g., "ไทย")
    pub native_name: &'static str,

    /// Flag glyph shown by the language switcher
    pub flag: &'static str,

    /// Text direction
    pub direction: Direction,
}

/// Registry of supported locales.
///
/// Read-only for the lifetime of the process; there are no failure modes.
pub struct LocaleRegistry {
    locales: &'static [LocaleConfig],
}

static LOCALES: [LocaleConfig; 3] = [
    LocaleConfig {
        code: "en",
        name: "English",
        native_name: "English",
        flag: "🇬🇧",
        direction: Direction::Ltr,
    },
    LocaleConfig {
        code: "th",
        name: "Thai",
        native_name: "ไทย",
        flag: "🇹🇭",
        direction: Direction::Ltr,
    },
    LocaleConfig {
        code: "zh",
        name: "Chinese",
        native_name: "中文",
        flag: "🇨🇳",
        direction: Direction::Ltr,
    },
];

static REGISTRY: LocaleRegistry = LocaleRegistry { locales: &LOCALES };

impl LocaleRegistry {
    /// Get the global locale registry.
    pub fn get() -> &'static LocaleRegistry {
        &REGISTRY
    }

    /// Get a locale configuration by its code.
    ///
    /// Matching is exact: `"TH"` is not `"th"`.
    ///
    /// # Returns
    /// * `Some(&LocaleConfig)` if the locale is supported
    /// * `None` otherwise
    pub fn get_by_code(&self, code: &str) -> Option<&'static LocaleConfig> {
        self.locales.iter().find(|locale| locale.code == code)
    }

    /// All supported locales, default first.
    pub fn list(&self) -> &'static [LocaleConfig] {
        self.locales
    }

    /// Supported locale codes in registry order.
    pub fn codes(&self) -> impl Iterator<Item = &'static str> {
        self.locales.iter().map(|locale| locale.code)
    }

    /// The default locale (always the first entry).
    pub fn default_locale(&self) -> &'static LocaleConfig {
        &LOCALES[0]
    }

    /// Check whether a code is a supported locale.
    pub fn is_supported(&self, code: &str) -> bool {
        self.get_by_code(code).is_some()
    }
}
