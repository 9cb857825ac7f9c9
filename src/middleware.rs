//! Locale routing middleware.
//!
//! Every storefront URL carries its locale as the first path segment. A
//! request without one is redirected to the same path and query under the
//! negotiated locale, and the choice is persisted in the locale cookie so the
//! next un-prefixed request short-circuits on the cookie. Excluded prefixes
//! (API, admin, static assets) are never touched.

use crate::i18n::{locale_from_path, resolve_locale, Locale};
use axum::{
    extract::{Request, State},
    http::{
        header::{ACCEPT_LANGUAGE, COOKIE, LOCATION, SET_COOKIE},
        HeaderMap, HeaderValue, StatusCode,
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::debug;

/// Name of the cookie that remembers the visitor's locale.
pub const LOCALE_COOKIE_NAME: &str = "NEXT_LOCALE";

/// One year, in seconds.
pub const LOCALE_COOKIE_MAX_AGE: u64 = 365 * 24 * 60 * 60;

/// Path prefixes that are never locale-prefixed.
pub const DEFAULT_EXCLUDED_PREFIXES: &[&str] = &[
    "/api",
    "/admin",
    "/_next",
    "/favicon.ico",
    "/logo.png",
    "/images",
    "/img",
];

/// Locale of the current request, inserted as a request extension for every
/// path that already carries a supported locale segment. Storefront handlers
/// take it as an extractor instead of parsing `:lang` again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestLocale(pub Locale);

/// What the middleware does with a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    /// Path is on the exclusion list; pass through untouched.
    Excluded,

    /// Path already starts with a supported locale; pass through.
    Localized(Locale),

    /// Redirect to `location` and persist `locale` in the cookie.
    Redirect { location: String, locale: Locale },
}

/// Configuration of the locale routing middleware.
#[derive(Debug, Clone)]
pub struct LocaleRouting {
    excluded_prefixes: Vec<String>,
    cookie_name: String,
    cookie_max_age: u64,
}

impl Default for LocaleRouting {
    fn default() -> Self {
        Self {
            excluded_prefixes: DEFAULT_EXCLUDED_PREFIXES
                .iter()
                .map(|prefix| prefix.to_string())
                .collect(),
            cookie_name: LOCALE_COOKIE_NAME.to_string(),
            cookie_max_age: LOCALE_COOKIE_MAX_AGE,
        }
    }
}

impl LocaleRouting {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the excluded prefix list.
    pub fn with_excluded_prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded_prefixes = prefixes.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_cookie_name(mut self, name: impl Into<String>) -> Self {
        self.cookie_name = name.into();
        self
    }

    pub fn with_cookie_max_age(mut self, seconds: u64) -> Self {
        self.cookie_max_age = seconds;
        self
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    pub fn excluded_prefixes(&self) -> &[String] {
        &self.excluded_prefixes
    }

    /// Check whether a path is on the exclusion list (plain prefix match).
    pub fn is_excluded(&self, path: &str) -> bool {
        self.excluded_prefixes
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()))
    }

    /// Decide what to do with a request.
    ///
    /// # Arguments
    /// * `path` - Request path (always starts with `/`)
    /// * `query` - Raw query string without the `?`
    /// * `cookie` - Value of the locale cookie
    /// * `accept_language` - Raw `Accept-Language` header
    pub fn decide(
        &self,
        path: &str,
        query: Option<&str>,
        cookie: Option<&str>,
        accept_language: Option<&str>,
    ) -> RouteDecision {
        if self.is_excluded(path) {
            return RouteDecision::Excluded;
        }

        if let Some(locale) = locale_from_path(path) {
            return RouteDecision::Localized(locale);
        }

        let locale = resolve_locale(cookie, accept_language);
        RouteDecision::Redirect {
            location: redirect_target(locale, path, query),
            locale,
        }
    }

    /// `Set-Cookie` value persisting `locale`.
    pub fn cookie_header(&self, locale: Locale) -> String {
        locale_cookie(&self.cookie_name, locale, self.cookie_max_age)
    }

    /// Temporary redirect to `location` that also sets the locale cookie.
    pub fn redirect_response(&self, location: &str, locale: Locale) -> Response {
        redirect_with_cookie(
            StatusCode::TEMPORARY_REDIRECT,
            location,
            &self.cookie_header(locale),
        )
    }
}

/// Build `/<locale><path>[?<query>]`.
pub fn redirect_target(locale: Locale, path: &str, query: Option<&str>) -> String {
    let mut target = format!("/{}{}", locale.code(), path);
    if let Some(query) = query.filter(|q| !q.is_empty()) {
        target.push('?');
        target.push_str(query);
    }
    target
}

/// Format a persistent locale cookie.
pub fn locale_cookie(name: &str, locale: Locale, max_age: u64) -> String {
    format!(
        "{}={}; Path=/; Max-Age={}; SameSite=Lax",
        name,
        locale.code(),
        max_age
    )
}

/// Redirect response carrying a `Set-Cookie` header.
///
/// A location that is not a valid header value degrades to the default
/// locale's home so the response is always usable.
pub fn redirect_with_cookie(status: StatusCode, location: &str, cookie: &str) -> Response {
    let mut response = status.into_response();
    let headers = response.headers_mut();

    let location = HeaderValue::from_str(location)
        .or_else(|_| HeaderValue::from_str(&format!("/{}/", Locale::default_locale().code())));
    if let Ok(value) = location {
        headers.insert(LOCATION, value);
    }
    if let Ok(value) = HeaderValue::from_str(cookie) {
        headers.append(SET_COOKIE, value);
    }

    response
}

/// Extract a cookie value from the `Cookie` header.
///
/// # Returns
/// The value if the cookie is present, or `None` if it is missing or the
/// header is not valid UTF-8.
pub fn extract_cookie(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    headers
        .get(COOKIE)?
        .to_str()
        .ok()?
        .split(';')
        .find_map(|cookie| {
            let (name, value) = cookie.trim().split_once('=')?;
            if name.trim() == cookie_name {
                Some(value.trim().to_string())
            } else {
                None
            }
        })
}

/// axum middleware applying [`LocaleRouting`] to every request.
///
/// Install with `axum::middleware::from_fn_with_state(Arc<LocaleRouting>, locale_redirect)`.
pub async fn locale_redirect(
    State(routing): State<Arc<LocaleRouting>>,
    mut request: Request,
    next: Next,
) -> Response {
    let decision = {
        let headers = request.headers();
        let cookie = extract_cookie(headers, routing.cookie_name());
        let accept_language = headers
            .get(ACCEPT_LANGUAGE)
            .and_then(|value| value.to_str().ok());
        routing.decide(
            request.uri().path(),
            request.uri().query(),
            cookie.as_deref(),
            accept_language,
        )
    };

    match decision {
        RouteDecision::Excluded => next.run(request).await,
        RouteDecision::Localized(locale) => {
            request.extensions_mut().insert(RequestLocale(locale));
            next.run(request).await
        }
        RouteDecision::Redirect { location, locale } => {
            debug!("Redirecting {} to {}", request.uri().path(), location);
            routing.redirect_response(&location, locale)
        }
    }
}
