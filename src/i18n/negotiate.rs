//! Locale negotiation from the locale cookie and the `Accept-Language` header.
//!
//! Precedence is strict: a supported cookie value wins outright, then the
//! header's language ranges by descending weight, then the default locale.
//! Nothing here fails; malformed input only ever narrows the candidates.

use crate::i18n::Locale;
use tracing::debug;

/// One parsed entry of an `Accept-Language` header.
#[derive(Debug, Clone, PartialEq)]
pub struct LanguagePreference {
    /// Lower-cased language tag (e.g., "zh-cn")
    pub tag: String,

    /// Quality weight in `(0, 1]`
    pub weight: f32,
}

impl LanguagePreference {
    /// Map this preference onto a supported locale.
    ///
    /// The full tag is tried first, then the primary subtag before the first
    /// hyphen (`zh-cn` → `zh`).
    pub fn matching_locale(&self) -> Option<Locale> {
        if self.tag == "*" {
            return None;
        }
        if let Some(locale) = Locale::from_code(&self.tag) {
            return Some(locale);
        }
        self.tag
            .split('-')
            .next()
            .filter(|prefix| !prefix.is_empty())
            .and_then(Locale::from_code)
    }
}

/// Parse an `Accept-Language` header into preferences sorted by weight.
///
/// Entries are `tag[;q=weight]`. A missing weight means 1.0. Entries with an
/// empty tag or an unparseable weight are skipped, as are `q=0` entries.
/// The sort is stable, so equal weights keep header order.
pub fn parse_accept_language(header: &str) -> Vec<LanguagePreference> {
    let mut preferences: Vec<LanguagePreference> = header
        .split(',')
        .filter_map(parse_entry)
        .filter(|pref| pref.weight > 0.0)
        .collect();

    preferences.sort_by(|a, b| b.weight.total_cmp(&a.weight));
    preferences
}

fn parse_entry(entry: &str) -> Option<LanguagePreference> {
    let mut parts = entry.split(';');
    let tag = parts.next()?.trim().to_lowercase();
    if tag.is_empty() {
        return None;
    }

    let mut weight = 1.0_f32;
    for param in parts {
        let Some((name, value)) = param.split_once('=') else {
            continue;
        };
        if !name.trim().eq_ignore_ascii_case("q") {
            continue;
        }
        match value.trim().parse::<f32>() {
            Ok(q) if q.is_finite() => weight = q.clamp(0.0, 1.0),
            _ => {
                debug!("Skipping Accept-Language entry with malformed weight: {:?}", entry);
                return None;
            }
        }
    }

    Some(LanguagePreference { tag, weight })
}

/// Resolve the locale for a request.
///
/// # Arguments
/// * `cookie_value` - Value of the locale cookie, if the request carried one
/// * `accept_language` - Raw `Accept-Language` header, if present
///
/// # Returns
/// Always a supported locale; the default locale when nothing matches.
pub fn resolve_locale(cookie_value: Option<&str>, accept_language: Option<&str>) -> Locale {
    if let Some(locale) = cookie_value.and_then(Locale::from_code) {
        return locale;
    }

    accept_language
        .map(parse_accept_language)
        .and_then(|preferences| {
            preferences
                .iter()
                .find_map(LanguagePreference::matching_locale)
        })
        .unwrap_or_default()
}
