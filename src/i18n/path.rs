//! Locale segments in URL paths.
//!
//! The locale is always the first path segment (`/th/tours/5`). These helpers
//! are the only place that knows that layout; handlers receive the locale as
//! an explicit value and build links through [`localized_path`].

use crate::i18n::Locale;

/// Split a path into its leading locale segment and the remainder.
///
/// A path carries a locale when it equals `/<code>` or starts with
/// `/<code>/` for a supported code. The remainder keeps its leading slash
/// (or is empty for `/<code>`). Paths without a locale are returned whole.
pub fn split_locale(path: &str) -> (Option<Locale>, &str) {
    let Some(stripped) = path.strip_prefix('/') else {
        return (None, path);
    };
    let (segment, rest) = match stripped.find('/') {
        Some(idx) => stripped.split_at(idx),
        None => (stripped, ""),
    };
    match Locale::from_code(segment) {
        Some(locale) => (Some(locale), rest),
        None => (None, path),
    }
}

/// The locale carried by the first path segment, if any.
pub fn locale_from_path(path: &str) -> Option<Locale> {
    split_locale(path).0
}

/// Remove a leading locale segment, leaving other paths untouched.
///
/// `/th/tours` → `/tours`, `/th` → `/`, `/tours` → `/tours`.
pub fn strip_locale(path: &str) -> &str {
    match split_locale(path) {
        (Some(_), "") => "/",
        (Some(_), rest) => rest,
        (None, path) => path,
    }
}

/// Replace the locale segment of `path` with `locale`, or prepend it.
///
/// `/th/tours/5` → `/zh/tours/5`; `/tours` → `/zh/tours`; `/` → `/zh/`.
/// A trailing `?query` or `#fragment` is carried over untouched.
pub fn replace_locale_in_path(path: &str, locale: Locale) -> String {
    let (path, suffix) = match path.find(|c| c == '?' || c == '#') {
        Some(idx) => path.split_at(idx),
        None => (path, ""),
    };
    let rest = match split_locale(path) {
        (Some(_), rest) => rest,
        (None, rest) if rest.is_empty() || rest.starts_with('/') => rest,
        (None, relative) => return format!("/{}/{}{}", locale.code(), relative, suffix),
    };
    format!("/{}{}{}", locale.code(), rest, suffix)
}

/// Build a link to an application path under `locale`.
///
/// `path` is written as if no locale existed (`/tours/5`); the root maps to
/// the locale's home (`/th`).
pub fn localized_path(locale: Locale, path: &str) -> String {
    let path = path.trim_start_matches('/');
    if path.is_empty() {
        format!("/{}", locale.code())
    } else {
        format!("/{}/{}", locale.code(), path)
    }
}
