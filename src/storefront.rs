//! HTTP handlers for the localized storefront and the admin API.
//!
//! Storefront handlers return JSON page models; every piece of text in them
//! is already resolved for the request's locale.

use crate::catalog::{
    average_rating, Announcement, AnnouncementDraft, AnnouncementKind, CatalogError, Review, Tour,
    TourDraft,
};
use crate::currency::{display_price, Currency};
use crate::i18n::{
    get_localized_field, localized_path, replace_locale_in_path, Locale, LocaleConfig,
    LocalizedText, Translator,
};
use crate::middleware::RequestLocale;
use crate::search::{unique_locations, TourFilter, TourQuery};
use crate::security::is_authorized;
use crate::server::AppState;
use crate::translation::{
    translate_announcement_message, translate_review_comment, translate_tour_fields,
};
use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Path, Query, Request, State},
    http::{request::Parts, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Number of tours featured on the home page.
const FEATURED_TOURS: usize = 6;

// ==================== Errors ====================

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<CatalogError> for ApiError {
    fn from(e: CatalogError) -> Self {
        match e {
            CatalogError::Validation(message) => ApiError::BadRequest(message),
            CatalogError::Database(e) => ApiError::Internal(e.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, message.clone()),
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message.clone()),
            ApiError::Internal(detail) => {
                error!("Request failed: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                )
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

// ==================== Extractors ====================

/// Reads the locale the routing middleware attached to the request.
///
/// Requests that reach a storefront handler without it (unsupported or
/// missing locale segment) are 404s.
#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for RequestLocale {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RequestLocale>()
            .copied()
            .ok_or_else(|| ApiError::NotFound(format!("No locale for {}", parts.uri.path())))
    }
}

/// `?currency=` selection shared by the storefront pages.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CurrencyQuery {
    pub currency: Option<String>,
}

impl CurrencyQuery {
    /// Selected display currency; unknown codes fall back to USD.
    pub fn selected(&self) -> Currency {
        self.currency
            .as_deref()
            .and_then(Currency::from_code)
            .unwrap_or_default()
    }
}

// ==================== Page Models ====================

#[derive(Debug, Serialize)]
pub struct TourCard {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub location: String,
    /// Stored price, in the tour's base currency
    pub price: f64,
    pub currency: Currency,
    /// Price converted to `currency` and formatted, e.g. `€414`
    pub display_price: String,
    pub duration: String,
    pub dates: String,
    pub banner_image: Option<String>,
    pub href: String,
}

impl TourCard {
    pub fn localized(tour: &Tour, locale: Locale, currency: Currency) -> Self {
        Self {
            id: tour.id,
            title: get_localized_field(tour, "title", locale).to_string(),
            description: get_localized_field(tour, "description", locale).to_string(),
            location: get_localized_field(tour, "location", locale).to_string(),
            price: tour.price,
            currency,
            display_price: display_price(tour.price, tour.base_currency(), currency),
            duration: tour.duration.clone(),
            dates: tour.dates.clone(),
            banner_image: tour.banner_image.clone(),
            href: localized_path(locale, &format!("/tours/{}", tour.id)),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Hero {
    pub title: String,
    pub subtitle: String,
    pub cta: String,
}

#[derive(Debug, Serialize)]
pub struct AnnouncementView {
    pub message: String,
    #[serde(rename = "type")]
    pub kind: AnnouncementKind,
    pub image_url: Option<String>,
}

impl AnnouncementView {
    /// `None` when the message resolves to nothing in `locale`.
    fn localized(announcement: &Announcement, locale: Locale) -> Option<Self> {
        let message = get_localized_field(announcement, "message", locale);
        if message.is_empty() {
            return None;
        }
        Some(Self {
            message: message.to_string(),
            kind: announcement.kind,
            image_url: announcement.image_url.clone(),
        })
    }
}

#[derive(Debug, Serialize)]
pub struct HomePage {
    pub locale: &'static LocaleConfig,
    pub currency: Currency,
    pub hero: Hero,
    pub announcement: Option<AnnouncementView>,
    pub featured_title: String,
    pub tours: Vec<TourCard>,
    pub view_all_href: String,
}

#[derive(Debug, Serialize)]
pub struct ToursPage {
    pub locale: &'static LocaleConfig,
    pub currency: Currency,
    pub title: String,
    pub description: String,
    pub filters_active: bool,
    pub locations: Vec<String>,
    pub results_label: String,
    pub tours: Vec<TourCard>,
}

#[derive(Debug, Serialize)]
pub struct ReviewView {
    pub id: i64,
    pub user_name: String,
    pub rating: i16,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

impl ReviewView {
    fn localized(review: &Review, t: &Translator) -> Self {
        let locale = t.locale();
        Self {
            id: review.id,
            user_name: review
                .user_name
                .clone()
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| t.t_or("reviews.anonymous", "Anonymous").to_string()),
            rating: review.rating,
            comment: get_localized_field(review, "comment", locale).to_string(),
            created_at: review.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ReviewSection {
    pub title: String,
    pub average_rating: Option<f64>,
    pub count: usize,
    pub summary: String,
    pub items: Vec<ReviewView>,
}

#[derive(Debug, Serialize)]
pub struct TourDetailPage {
    pub locale: &'static LocaleConfig,
    pub currency: Currency,
    pub tour: TourCard,
    pub image_urls: Vec<String>,
    pub back_href: String,
    pub back_label: String,
    pub reviews: ReviewSection,
}

#[derive(Debug, Serialize)]
pub struct LocaleLink {
    pub code: &'static str,
    pub name: &'static str,
    pub native_name: &'static str,
    pub flag: &'static str,
    /// Current page under this locale
    pub href: String,
    /// Endpoint that persists this locale and redirects to `href`
    pub switch_href: String,
    pub active: bool,
}

// ==================== Storefront Handlers ====================

pub async fn home(
    State(state): State<AppState>,
    RequestLocale(locale): RequestLocale,
    Query(display): Query<CurrencyQuery>,
) -> ApiResult<Json<HomePage>> {
    let currency = display.selected();
    let t = state.dictionaries.translator(locale).await;

    let announcement = state
        .catalog
        .active_announcement()
        .await?
        .and_then(|a| AnnouncementView::localized(&a, locale));

    let tours = state.catalog.list_tours().await?;

    Ok(Json(HomePage {
        locale: locale.config(),
        currency,
        hero: Hero {
            title: t.t("home.heroTitle").to_string(),
            subtitle: t.t("home.heroSubtitle").to_string(),
            cta: t.t("home.heroCta").to_string(),
        },
        announcement,
        featured_title: t.t("home.featuredToursTitle").to_string(),
        tours: tours
            .iter()
            .take(FEATURED_TOURS)
            .map(|tour| TourCard::localized(tour, locale, currency))
            .collect(),
        view_all_href: localized_path(locale, "/tours"),
    }))
}

pub async fn tours(
    State(state): State<AppState>,
    RequestLocale(locale): RequestLocale,
    Query(query): Query<TourQuery>,
    Query(display): Query<CurrencyQuery>,
) -> ApiResult<Json<ToursPage>> {
    let currency = display.selected();
    let t = state.dictionaries.translator(locale).await;
    let filter = TourFilter::from(query);

    let all = state.catalog.list_tours().await?;
    let matching: Vec<TourCard> = filter
        .apply(&all, locale)
        .into_iter()
        .map(|tour| TourCard::localized(tour, locale, currency))
        .collect();

    let count = matching.len().to_string();

    Ok(Json(ToursPage {
        locale: locale.config(),
        currency,
        title: t.t("tours.pageTitle").to_string(),
        description: t.t("tours.pageDescription").to_string(),
        filters_active: filter.is_active(),
        locations: unique_locations(&all, locale),
        results_label: t.t_fmt("tours.toursFound", &[("count", count.as_str())]),
        tours: matching,
    }))
}

pub async fn tour_detail(
    State(state): State<AppState>,
    RequestLocale(locale): RequestLocale,
    Path((_, id)): Path<(String, i64)>,
    Query(display): Query<CurrencyQuery>,
) -> ApiResult<Json<TourDetailPage>> {
    let currency = display.selected();
    let tour = state
        .catalog
        .get_tour(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Tour {} not found", id)))?;
    let reviews = state.catalog.list_reviews(id).await?;
    let t = state.dictionaries.translator(locale).await;

    let count = reviews.len();
    let count_text = count.to_string();
    let count_word = if count == 1 {
        t.t("reviews.review")
    } else {
        t.t("reviews.reviews")
    };

    Ok(Json(TourDetailPage {
        locale: locale.config(),
        currency,
        tour: TourCard::localized(&tour, locale, currency),
        image_urls: tour.image_urls.clone(),
        back_href: localized_path(locale, "/tours"),
        back_label: t.t("tourDetail.backToTours").to_string(),
        reviews: ReviewSection {
            title: t.t("reviews.title").to_string(),
            average_rating: average_rating(&reviews),
            count,
            summary: t.t_fmt(
                "reviews.basedOn",
                &[("count", count_text.as_str()), ("label", count_word)],
            ),
            items: reviews.iter().map(|r| ReviewView::localized(r, &t)).collect(),
        },
    }))
}

/// Merged dictionary for client-side rendering.
pub async fn dictionary(
    State(state): State<AppState>,
    RequestLocale(locale): RequestLocale,
) -> Json<Value> {
    Json(state.dictionaries.translator(locale).await.to_json())
}

#[derive(Debug, Deserialize)]
pub struct SwitcherQuery {
    pub path: Option<String>,
}

impl SwitcherQuery {
    /// Only same-site absolute paths are accepted; anything else is the root.
    fn same_site_path(self) -> String {
        self.path
            .filter(|p| p.starts_with('/') && !p.starts_with("//"))
            .unwrap_or_else(|| "/".to_string())
    }
}

/// Language switcher: the current page under every supported locale.
pub async fn locale_switcher(
    RequestLocale(current): RequestLocale,
    Query(query): Query<SwitcherQuery>,
) -> Json<Vec<LocaleLink>> {
    let path = query.same_site_path();
    let encoded = urlencoding::encode(&path);

    Json(
        Locale::all()
            .map(|locale| LocaleLink {
                code: locale.code(),
                name: locale.name(),
                native_name: locale.native_name(),
                flag: locale.flag(),
                href: replace_locale_in_path(&path, locale),
                switch_href: format!("{}?path={}", localized_path(locale, "/switch"), encoded),
                active: locale == current,
            })
            .collect(),
    )
}

/// Persist the locale the visitor picked and send them to the same page
/// under it, so later unprefixed requests negotiate to the new choice.
pub async fn switch_locale(
    State(state): State<AppState>,
    RequestLocale(target): RequestLocale,
    Query(query): Query<SwitcherQuery>,
) -> Response {
    let location = replace_locale_in_path(&query.same_site_path(), target);
    debug!("Switching locale to {}, redirecting to {}", target.code(), location);
    state.routing.redirect_response(&location, target)
}

// ==================== API Handlers ====================

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "locales": Locale::all().map(|l| l.code()).collect::<Vec<_>>(),
        "cached_dictionaries": state.dictionaries.cache().len(),
        "dictionaries": state.dictionaries.metrics().report(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    #[serde(default)]
    pub comment: String,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct TranslatedComment {
    pub comment_en: String,
    pub comment_th: String,
    pub comment_zh: String,
}

impl TranslatedComment {
    fn from_localized(text: LocalizedText, original: &str) -> Self {
        let or_original = |value: Option<String>| value.unwrap_or_else(|| original.to_string());
        Self {
            comment_en: or_original(text.en),
            comment_th: or_original(text.th),
            comment_zh: or_original(text.zh),
        }
    }
}

/// Translate a review comment before the client stores it.
pub async fn translate_review(
    State(state): State<AppState>,
    Json(request): Json<CommentRequest>,
) -> ApiResult<Json<TranslatedComment>> {
    let comment = request.comment.trim();
    if comment.is_empty() {
        return Err(ApiError::BadRequest("Comment is required".to_string()));
    }

    let translated = translate_review_comment(state.translator.as_ref(), comment).await;
    Ok(Json(TranslatedComment::from_localized(translated, comment)))
}

// ==================== Admin Handlers ====================

/// Reject admin requests without a valid `x-api-key` header.
pub async fn require_api_key(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if is_authorized(state.api_key.as_deref(), request.headers()) {
        next.run(request).await
    } else {
        warn!("Rejected admin request to {}", request.uri().path());
        ApiError::Unauthorized.into_response()
    }
}

pub async fn create_tour(
    State(state): State<AppState>,
    Json(draft): Json<TourDraft>,
) -> ApiResult<(StatusCode, Json<Tour>)> {
    draft.validate()?;
    let translations = translate_tour_fields(state.translator.as_ref(), &draft).await;
    let tour = state.catalog.create_tour(&draft, &translations).await?;
    info!("Created tour {} ({})", tour.id, tour.title);
    Ok((StatusCode::CREATED, Json(tour)))
}

pub async fn update_tour(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(draft): Json<TourDraft>,
) -> ApiResult<Json<Tour>> {
    draft.validate()?;
    if state.catalog.get_tour(id).await?.is_none() {
        return Err(ApiError::NotFound(format!("Tour {} not found", id)));
    }

    let translations = translate_tour_fields(state.translator.as_ref(), &draft).await;
    let tour = state
        .catalog
        .update_tour(id, &draft, &translations)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Tour {} not found", id)))?;
    info!("Updated tour {}", id);
    Ok(Json(tour))
}

pub async fn delete_tour(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Json<Value>> {
    if !state.catalog.delete_tour(id).await? {
        return Err(ApiError::NotFound(format!("Tour {} not found", id)));
    }
    info!("Deleted tour {}", id);
    Ok(Json(json!({ "success": true })))
}

pub async fn create_announcement(
    State(state): State<AppState>,
    Json(draft): Json<AnnouncementDraft>,
) -> ApiResult<(StatusCode, Json<Announcement>)> {
    draft.validate()?;

    let translations =
        translate_announcement_message(state.translator.as_ref(), draft.message.trim()).await;
    let announcement = state.catalog.create_announcement(&draft, &translations).await?;
    info!(
        "Created {} announcement {} (active: {})",
        announcement.kind.as_str(),
        announcement.id,
        announcement.is_active
    );
    Ok((StatusCode::CREATED, Json(announcement)))
}

#[derive(Debug, Deserialize)]
pub struct ToggleRequest {
    pub is_active: bool,
}

pub async fn toggle_announcement(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<ToggleRequest>,
) -> ApiResult<Json<Announcement>> {
    let announcement = state
        .catalog
        .set_announcement_active(id, request.is_active)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Announcement {} not found", id)))?;
    info!("Announcement {} active: {}", id, announcement.is_active);
    Ok(Json(announcement))
}

pub async fn delete_announcement(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Value>> {
    if !state.catalog.delete_announcement(id).await? {
        return Err(ApiError::NotFound(format!("Announcement {} not found", id)));
    }
    info!("Deleted announcement {}", id);
    Ok(Json(json!({ "success": true })))
}
