//! Tour catalog storage.
//!
//! Tours, announcements and reviews each carry a default text column holding
//! the authoring-language value plus nullable per-locale variants that are
//! regenerated from machine translation on every write.

use crate::currency::Currency;
use crate::i18n::{split_variant_column, LocalizedRecord, LocalizedText};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::sync::Mutex;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("{0}")]
    Validation(String),
}

pub type Result<T> = std::result::Result<T, CatalogError>;

// ==================== Models ====================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tour {
    pub id: i64,
    pub title: String,
    pub description: String,
    /// Price in `currency`
    pub price: f64,
    /// ISO code of the currency `price` is stored in
    pub currency: String,
    pub duration: String,
    pub dates: String,
    pub location: String,
    pub banner_image: Option<String>,
    pub image_urls: Vec<String>,
    pub title_i18n: LocalizedText,
    pub description_i18n: LocalizedText,
    pub location_i18n: LocalizedText,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Tour {
    /// Currency the price is stored in. Unknown codes are read as USD.
    pub fn base_currency(&self) -> Currency {
        Currency::from_code(&self.currency).unwrap_or_else(|| {
            warn!("Tour {} has unknown currency '{}', assuming USD", self.id, self.currency);
            Currency::default()
        })
    }
}

impl LocalizedRecord for Tour {
    fn field(&self, name: &str) -> Option<&str> {
        if let Some((base, locale)) = split_variant_column(name) {
            let variants = match base {
                "title" => &self.title_i18n,
                "description" => &self.description_i18n,
                "location" => &self.location_i18n,
                _ => return None,
            };
            return variants.get(locale);
        }

        match name {
            "title" => Some(&self.title),
            "description" => Some(&self.description),
            "location" => Some(&self.location),
            "duration" => Some(&self.duration),
            "dates" => Some(&self.dates),
            "banner_image" => self.banner_image.as_deref(),
            _ => None,
        }
    }
}

/// How the storefront presents an announcement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnouncementKind {
    /// Strip across the top of every page
    #[default]
    Banner,
    /// Dismissible dialog, optionally with an image
    Popup,
}

impl AnnouncementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnnouncementKind::Banner => "banner",
            AnnouncementKind::Popup => "popup",
        }
    }

    /// Read a stored value; anything unknown is a banner.
    pub fn parse(value: &str) -> Self {
        match value {
            "popup" => AnnouncementKind::Popup,
            _ => AnnouncementKind::Banner,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Announcement {
    pub id: i64,
    pub message: String,
    pub message_i18n: LocalizedText,
    #[serde(rename = "type")]
    pub kind: AnnouncementKind,
    /// Only popups carry an image
    pub image_url: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl LocalizedRecord for Announcement {
    fn field(&self, name: &str) -> Option<&str> {
        match split_variant_column(name) {
            Some(("message", locale)) => self.message_i18n.get(locale),
            Some(_) => None,
            None if name == "message" => Some(&self.message),
            None => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Review {
    pub id: i64,
    pub tour_id: i64,
    pub user_id: String,
    pub user_name: Option<String>,
    /// 1..=5
    pub rating: i16,
    pub comment: String,
    pub comment_i18n: LocalizedText,
    pub created_at: DateTime<Utc>,
}

impl LocalizedRecord for Review {
    fn field(&self, name: &str) -> Option<&str> {
        match split_variant_column(name) {
            Some(("comment", locale)) => self.comment_i18n.get(locale),
            Some(_) => None,
            None => match name {
                "comment" => Some(&self.comment),
                "user_name" => self.user_name.as_deref(),
                _ => None,
            },
        }
    }
}

/// Mean rating, `None` for a tour without reviews.
pub fn average_rating(reviews: &[Review]) -> Option<f64> {
    if reviews.is_empty() {
        return None;
    }
    let total: i64 = reviews.iter().map(|r| i64::from(r.rating)).sum();
    Some(total as f64 / reviews.len() as f64)
}

// ==================== Drafts ====================

/// Admin input for creating or replacing a tour.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TourDraft {
    pub title: String,
    pub description: String,
    pub price: f64,
    pub duration: String,
    pub dates: String,
    pub location: String,
    #[serde(default)]
    pub banner_image: Option<String>,
    #[serde(default)]
    pub image_urls: Vec<String>,
}

impl TourDraft {
    /// Every text field is required and the price must be positive.
    pub fn validate(&self) -> Result<()> {
        let required = [
            &self.title,
            &self.description,
            &self.duration,
            &self.dates,
            &self.location,
        ];
        if required.iter().any(|value| value.trim().is_empty())
            || !self.price.is_finite()
            || self.price <= 0.0
        {
            return Err(CatalogError::Validation("All fields are required".to_string()));
        }
        Ok(())
    }

    fn banner_image(&self) -> Option<String> {
        self.banner_image.clone().filter(|url| !url.is_empty())
    }
}

/// Admin input for a new announcement.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AnnouncementDraft {
    #[serde(default)]
    pub message: String,
    #[serde(default, rename = "type")]
    pub kind: AnnouncementKind,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub is_active: bool,
}

impl AnnouncementDraft {
    pub fn new(message: impl Into<String>, is_active: bool) -> Self {
        Self {
            message: message.into(),
            is_active,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.message.trim().is_empty() {
            return Err(CatalogError::Validation("Message is required".to_string()));
        }
        Ok(())
    }

    /// Banners never store an image.
    fn image_url(&self) -> Option<String> {
        match self.kind {
            AnnouncementKind::Popup => self.image_url.clone().filter(|url| !url.trim().is_empty()),
            AnnouncementKind::Banner => None,
        }
    }
}

/// Machine-translated variants for the translatable tour fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TourTranslations {
    pub title: LocalizedText,
    pub description: LocalizedText,
    pub location: LocalizedText,
}

impl TourTranslations {
    /// Every variant equal to the authoring text.
    pub fn untranslated(draft: &TourDraft) -> Self {
        Self {
            title: LocalizedText::uniform(&draft.title),
            description: LocalizedText::uniform(&draft.description),
            location: LocalizedText::uniform(&draft.location),
        }
    }
}

/// Input for the review upsert performed after identity-provider login.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReviewDraft {
    pub tour_id: i64,
    pub user_id: String,
    #[serde(default)]
    pub user_name: Option<String>,
    pub rating: i16,
    pub comment: String,
}

impl ReviewDraft {
    pub fn validate(&self) -> Result<()> {
        if !(1..=5).contains(&self.rating) {
            return Err(CatalogError::Validation(
                "Rating must be between 1 and 5".to_string(),
            ));
        }
        if self.comment.trim().is_empty() {
            return Err(CatalogError::Validation("Comment is required".to_string()));
        }
        if self.user_id.is_empty() {
            return Err(CatalogError::Validation("User is required".to_string()));
        }
        Ok(())
    }
}

// ==================== Catalog Trait ====================

#[async_trait]
pub trait TourCatalog: Send + Sync {
    /// All tours, newest first.
    async fn list_tours(&self) -> Result<Vec<Tour>>;

    async fn get_tour(&self, id: i64) -> Result<Option<Tour>>;

    async fn create_tour(&self, draft: &TourDraft, translations: &TourTranslations) -> Result<Tour>;

    /// Replace every field of an existing tour. `None` when the id is unknown.
    async fn update_tour(
        &self,
        id: i64,
        draft: &TourDraft,
        translations: &TourTranslations,
    ) -> Result<Option<Tour>>;

    /// Delete a tour and its reviews. Returns whether it existed.
    async fn delete_tour(&self, id: i64) -> Result<bool>;

    async fn active_announcement(&self) -> Result<Option<Announcement>>;

    /// All announcements, newest first.
    async fn list_announcements(&self) -> Result<Vec<Announcement>>;

    /// Creating an active announcement deactivates all others.
    async fn create_announcement(
        &self,
        draft: &AnnouncementDraft,
        translations: &LocalizedText,
    ) -> Result<Announcement>;

    /// Activating an announcement deactivates all others.
    async fn set_announcement_active(&self, id: i64, is_active: bool)
        -> Result<Option<Announcement>>;

    async fn delete_announcement(&self, id: i64) -> Result<bool>;

    /// Reviews of one tour, newest first.
    async fn list_reviews(&self, tour_id: i64) -> Result<Vec<Review>>;

    /// Insert or replace the review a user left on a tour (one per user and tour).
    async fn upsert_review(&self, draft: &ReviewDraft, translations: &LocalizedText)
        -> Result<Review>;
}

// ==================== Postgres Catalog ====================

const MIGRATIONS: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS tours (
        id BIGSERIAL PRIMARY KEY,
        title TEXT NOT NULL,
        description TEXT NOT NULL,
        price DOUBLE PRECISION NOT NULL,
        currency TEXT NOT NULL DEFAULT 'USD',
        duration TEXT NOT NULL,
        dates TEXT NOT NULL,
        location TEXT NOT NULL,
        banner_image TEXT,
        image_urls TEXT NOT NULL DEFAULT '[]',
        title_en TEXT,
        title_th TEXT,
        title_zh TEXT,
        description_en TEXT,
        description_th TEXT,
        description_zh TEXT,
        location_en TEXT,
        location_th TEXT,
        location_zh TEXT,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )"#,
    r#"CREATE TABLE IF NOT EXISTS announcements (
        id BIGSERIAL PRIMARY KEY,
        message TEXT NOT NULL,
        message_en TEXT,
        message_th TEXT,
        message_zh TEXT,
        type TEXT NOT NULL DEFAULT 'banner',
        image_url TEXT,
        is_active BOOLEAN NOT NULL DEFAULT FALSE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )"#,
    r#"CREATE TABLE IF NOT EXISTS reviews (
        id BIGSERIAL PRIMARY KEY,
        tour_id BIGINT NOT NULL REFERENCES tours(id) ON DELETE CASCADE,
        user_id TEXT NOT NULL,
        user_name TEXT,
        rating SMALLINT NOT NULL CHECK (rating BETWEEN 1 AND 5),
        comment TEXT NOT NULL,
        comment_en TEXT,
        comment_th TEXT,
        comment_zh TEXT,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        UNIQUE (tour_id, user_id)
    )"#,
    "CREATE INDEX IF NOT EXISTS idx_reviews_tour_id ON reviews(tour_id)",
    // Columns added after the first release.
    "ALTER TABLE tours ADD COLUMN IF NOT EXISTS currency TEXT NOT NULL DEFAULT 'USD'",
    "ALTER TABLE announcements ADD COLUMN IF NOT EXISTS type TEXT NOT NULL DEFAULT 'banner'",
    "ALTER TABLE announcements ADD COLUMN IF NOT EXISTS image_url TEXT",
];

#[derive(sqlx::FromRow)]
struct TourRow {
    id: i64,
    title: String,
    description: String,
    price: f64,
    currency: String,
    duration: String,
    dates: String,
    location: String,
    banner_image: Option<String>,
    image_urls: String,
    title_en: Option<String>,
    title_th: Option<String>,
    title_zh: Option<String>,
    description_en: Option<String>,
    description_th: Option<String>,
    description_zh: Option<String>,
    location_en: Option<String>,
    location_th: Option<String>,
    location_zh: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<TourRow> for Tour {
    fn from(row: TourRow) -> Self {
        let image_urls = serde_json::from_str(&row.image_urls).unwrap_or_else(|e| {
            warn!("Tour {} has unreadable image_urls ({}), ignoring", row.id, e);
            Vec::new()
        });

        Tour {
            id: row.id,
            title: row.title,
            description: row.description,
            price: row.price,
            currency: row.currency,
            duration: row.duration,
            dates: row.dates,
            location: row.location,
            banner_image: row.banner_image,
            image_urls,
            title_i18n: LocalizedText {
                en: row.title_en,
                th: row.title_th,
                zh: row.title_zh,
            },
            description_i18n: LocalizedText {
                en: row.description_en,
                th: row.description_th,
                zh: row.description_zh,
            },
            location_i18n: LocalizedText {
                en: row.location_en,
                th: row.location_th,
                zh: row.location_zh,
            },
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct AnnouncementRow {
    id: i64,
    message: String,
    message_en: Option<String>,
    message_th: Option<String>,
    message_zh: Option<String>,
    #[sqlx(rename = "type")]
    kind: String,
    image_url: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
}

impl From<AnnouncementRow> for Announcement {
    fn from(row: AnnouncementRow) -> Self {
        Announcement {
            id: row.id,
            message: row.message,
            message_i18n: LocalizedText {
                en: row.message_en,
                th: row.message_th,
                zh: row.message_zh,
            },
            kind: AnnouncementKind::parse(&row.kind),
            image_url: row.image_url,
            is_active: row.is_active,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ReviewRow {
    id: i64,
    tour_id: i64,
    user_id: String,
    user_name: Option<String>,
    rating: i16,
    comment: String,
    comment_en: Option<String>,
    comment_th: Option<String>,
    comment_zh: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<ReviewRow> for Review {
    fn from(row: ReviewRow) -> Self {
        Review {
            id: row.id,
            tour_id: row.tour_id,
            user_id: row.user_id,
            user_name: row.user_name,
            rating: row.rating,
            comment: row.comment,
            comment_i18n: LocalizedText {
                en: row.comment_en,
                th: row.comment_th,
                zh: row.comment_zh,
            },
            created_at: row.created_at,
        }
    }
}

/// PostgreSQL-backed catalog.
#[derive(Clone)]
pub struct PgCatalog {
    pool: PgPool,
}

impl PgCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a connection pool against `database_url`.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Create tables and indexes that do not exist yet.
    pub async fn migrate(&self) -> Result<()> {
        for statement in MIGRATIONS {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        info!("Catalog schema is up to date");
        Ok(())
    }

    fn image_urls_json(draft: &TourDraft) -> String {
        serde_json::to_string(&draft.image_urls).unwrap_or_else(|_| "[]".to_string())
    }
}

#[async_trait]
impl TourCatalog for PgCatalog {
    async fn list_tours(&self) -> Result<Vec<Tour>> {
        let rows = sqlx::query_as::<_, TourRow>(
            "SELECT * FROM tours ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Tour::from).collect())
    }

    async fn get_tour(&self, id: i64) -> Result<Option<Tour>> {
        let row = sqlx::query_as::<_, TourRow>("SELECT * FROM tours WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Tour::from))
    }

    async fn create_tour(&self, draft: &TourDraft, translations: &TourTranslations) -> Result<Tour> {
        draft.validate()?;
        let row = sqlx::query_as::<_, TourRow>(
            r#"
            INSERT INTO tours (
                title, description, price, duration, dates, location, banner_image, image_urls,
                title_en, title_th, title_zh,
                description_en, description_th, description_zh,
                location_en, location_th, location_zh
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            RETURNING *
            "#,
        )
        .bind(&draft.title)
        .bind(&draft.description)
        .bind(draft.price)
        .bind(&draft.duration)
        .bind(&draft.dates)
        .bind(&draft.location)
        .bind(draft.banner_image())
        .bind(Self::image_urls_json(draft))
        .bind(&translations.title.en)
        .bind(&translations.title.th)
        .bind(&translations.title.zh)
        .bind(&translations.description.en)
        .bind(&translations.description.th)
        .bind(&translations.description.zh)
        .bind(&translations.location.en)
        .bind(&translations.location.th)
        .bind(&translations.location.zh)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn update_tour(
        &self,
        id: i64,
        draft: &TourDraft,
        translations: &TourTranslations,
    ) -> Result<Option<Tour>> {
        draft.validate()?;
        let row = sqlx::query_as::<_, TourRow>(
            r#"
            UPDATE tours
            SET title = $1, description = $2, price = $3, duration = $4, dates = $5,
                location = $6, banner_image = $7, image_urls = $8,
                title_en = $9, title_th = $10, title_zh = $11,
                description_en = $12, description_th = $13, description_zh = $14,
                location_en = $15, location_th = $16, location_zh = $17,
                updated_at = NOW()
            WHERE id = $18
            RETURNING *
            "#,
        )
        .bind(&draft.title)
        .bind(&draft.description)
        .bind(draft.price)
        .bind(&draft.duration)
        .bind(&draft.dates)
        .bind(&draft.location)
        .bind(draft.banner_image())
        .bind(Self::image_urls_json(draft))
        .bind(&translations.title.en)
        .bind(&translations.title.th)
        .bind(&translations.title.zh)
        .bind(&translations.description.en)
        .bind(&translations.description.th)
        .bind(&translations.description.zh)
        .bind(&translations.location.en)
        .bind(&translations.location.th)
        .bind(&translations.location.zh)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Tour::from))
    }

    async fn delete_tour(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM tours WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn active_announcement(&self) -> Result<Option<Announcement>> {
        let row = sqlx::query_as::<_, AnnouncementRow>(
            "SELECT * FROM announcements WHERE is_active LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Announcement::from))
    }

    async fn list_announcements(&self) -> Result<Vec<Announcement>> {
        let rows = sqlx::query_as::<_, AnnouncementRow>(
            "SELECT * FROM announcements ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Announcement::from).collect())
    }

    async fn create_announcement(
        &self,
        draft: &AnnouncementDraft,
        translations: &LocalizedText,
    ) -> Result<Announcement> {
        draft.validate()?;

        let mut tx = self.pool.begin().await?;
        if draft.is_active {
            sqlx::query("UPDATE announcements SET is_active = FALSE WHERE is_active")
                .execute(&mut *tx)
                .await?;
        }
        let row = sqlx::query_as::<_, AnnouncementRow>(
            r#"
            INSERT INTO announcements
                (message, message_en, message_th, message_zh, type, image_url, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(draft.message.trim())
        .bind(&translations.en)
        .bind(&translations.th)
        .bind(&translations.zh)
        .bind(draft.kind.as_str())
        .bind(draft.image_url())
        .bind(draft.is_active)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;

        Ok(row.into())
    }

    async fn set_announcement_active(
        &self,
        id: i64,
        is_active: bool,
    ) -> Result<Option<Announcement>> {
        let mut tx = self.pool.begin().await?;
        if is_active {
            sqlx::query("UPDATE announcements SET is_active = FALSE WHERE is_active AND id <> $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }
        let row = sqlx::query_as::<_, AnnouncementRow>(
            "UPDATE announcements SET is_active = $1 WHERE id = $2 RETURNING *",
        )
        .bind(is_active)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        // Unknown id: leave the current banner alone.
        if row.is_none() {
            tx.rollback().await?;
            return Ok(None);
        }
        tx.commit().await?;

        Ok(row.map(Announcement::from))
    }

    async fn delete_announcement(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM announcements WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_reviews(&self, tour_id: i64) -> Result<Vec<Review>> {
        let rows = sqlx::query_as::<_, ReviewRow>(
            "SELECT * FROM reviews WHERE tour_id = $1 ORDER BY created_at DESC, id DESC",
        )
        .bind(tour_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Review::from).collect())
    }

    async fn upsert_review(
        &self,
        draft: &ReviewDraft,
        translations: &LocalizedText,
    ) -> Result<Review> {
        draft.validate()?;
        let row = sqlx::query_as::<_, ReviewRow>(
            r#"
            INSERT INTO reviews (tour_id, user_id, user_name, rating, comment, comment_en, comment_th, comment_zh)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (tour_id, user_id) DO UPDATE
            SET user_name = EXCLUDED.user_name,
                rating = EXCLUDED.rating,
                comment = EXCLUDED.comment,
                comment_en = EXCLUDED.comment_en,
                comment_th = EXCLUDED.comment_th,
                comment_zh = EXCLUDED.comment_zh,
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(draft.tour_id)
        .bind(&draft.user_id)
        .bind(&draft.user_name)
        .bind(draft.rating)
        .bind(&draft.comment)
        .bind(&translations.en)
        .bind(&translations.th)
        .bind(&translations.zh)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }
}

// ==================== Memory Catalog ====================

#[derive(Default)]
struct MemoryState {
    next_id: i64,
    tours: Vec<Tour>,
    announcements: Vec<Announcement>,
    reviews: Vec<Review>,
}

impl MemoryState {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// In-process catalog used when no database is configured, and in tests.
#[derive(Default)]
pub struct MemoryCatalog {
    state: Mutex<MemoryState>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Newest first; ids break ties between rows written in the same instant.
fn newest_first<T>(items: &mut [T], key: impl Fn(&T) -> (DateTime<Utc>, i64)) {
    items.sort_by(|a, b| key(b).cmp(&key(a)));
}

#[async_trait]
impl TourCatalog for MemoryCatalog {
    async fn list_tours(&self) -> Result<Vec<Tour>> {
        let mut tours = self.lock().tours.clone();
        newest_first(&mut tours, |t| (t.created_at, t.id));
        Ok(tours)
    }

    async fn get_tour(&self, id: i64) -> Result<Option<Tour>> {
        Ok(self.lock().tours.iter().find(|t| t.id == id).cloned())
    }

    async fn create_tour(&self, draft: &TourDraft, translations: &TourTranslations) -> Result<Tour> {
        draft.validate()?;
        let mut state = self.lock();
        let now = Utc::now();
        let tour = Tour {
            id: state.allocate_id(),
            title: draft.title.clone(),
            description: draft.description.clone(),
            price: draft.price,
            currency: Currency::default().code().to_string(),
            duration: draft.duration.clone(),
            dates: draft.dates.clone(),
            location: draft.location.clone(),
            banner_image: draft.banner_image(),
            image_urls: draft.image_urls.clone(),
            title_i18n: translations.title.clone(),
            description_i18n: translations.description.clone(),
            location_i18n: translations.location.clone(),
            created_at: now,
            updated_at: now,
        };
        state.tours.push(tour.clone());
        Ok(tour)
    }

    async fn update_tour(
        &self,
        id: i64,
        draft: &TourDraft,
        translations: &TourTranslations,
    ) -> Result<Option<Tour>> {
        draft.validate()?;
        let mut state = self.lock();
        let Some(tour) = state.tours.iter_mut().find(|t| t.id == id) else {
            return Ok(None);
        };

        tour.title = draft.title.clone();
        tour.description = draft.description.clone();
        tour.price = draft.price;
        tour.duration = draft.duration.clone();
        tour.dates = draft.dates.clone();
        tour.location = draft.location.clone();
        tour.banner_image = draft.banner_image();
        tour.image_urls = draft.image_urls.clone();
        tour.title_i18n = translations.title.clone();
        tour.description_i18n = translations.description.clone();
        tour.location_i18n = translations.location.clone();
        tour.updated_at = Utc::now();

        Ok(Some(tour.clone()))
    }

    async fn delete_tour(&self, id: i64) -> Result<bool> {
        let mut state = self.lock();
        let before = state.tours.len();
        state.tours.retain(|t| t.id != id);
        let existed = state.tours.len() != before;
        if existed {
            state.reviews.retain(|r| r.tour_id != id);
        }
        Ok(existed)
    }

    async fn active_announcement(&self) -> Result<Option<Announcement>> {
        Ok(self.lock().announcements.iter().find(|a| a.is_active).cloned())
    }

    async fn list_announcements(&self) -> Result<Vec<Announcement>> {
        let mut announcements = self.lock().announcements.clone();
        newest_first(&mut announcements, |a| (a.created_at, a.id));
        Ok(announcements)
    }

    async fn create_announcement(
        &self,
        draft: &AnnouncementDraft,
        translations: &LocalizedText,
    ) -> Result<Announcement> {
        draft.validate()?;

        let mut state = self.lock();
        if draft.is_active {
            state.announcements.iter_mut().for_each(|a| a.is_active = false);
        }
        let announcement = Announcement {
            id: state.allocate_id(),
            message: draft.message.trim().to_string(),
            message_i18n: translations.clone(),
            kind: draft.kind,
            image_url: draft.image_url(),
            is_active: draft.is_active,
            created_at: Utc::now(),
        };
        state.announcements.push(announcement.clone());
        Ok(announcement)
    }

    async fn set_announcement_active(
        &self,
        id: i64,
        is_active: bool,
    ) -> Result<Option<Announcement>> {
        let mut state = self.lock();
        if !state.announcements.iter().any(|a| a.id == id) {
            return Ok(None);
        }

        let mut updated = None;
        for announcement in state.announcements.iter_mut() {
            if announcement.id == id {
                announcement.is_active = is_active;
                updated = Some(announcement.clone());
            } else if is_active {
                announcement.is_active = false;
            }
        }
        Ok(updated)
    }

    async fn delete_announcement(&self, id: i64) -> Result<bool> {
        let mut state = self.lock();
        let before = state.announcements.len();
        state.announcements.retain(|a| a.id != id);
        Ok(state.announcements.len() != before)
    }

    async fn list_reviews(&self, tour_id: i64) -> Result<Vec<Review>> {
        let mut reviews: Vec<Review> = self
            .lock()
            .reviews
            .iter()
            .filter(|r| r.tour_id == tour_id)
            .cloned()
            .collect();
        newest_first(&mut reviews, |r| (r.created_at, r.id));
        Ok(reviews)
    }

    async fn upsert_review(
        &self,
        draft: &ReviewDraft,
        translations: &LocalizedText,
    ) -> Result<Review> {
        draft.validate()?;
        let mut state = self.lock();
        if !state.tours.iter().any(|t| t.id == draft.tour_id) {
            return Err(CatalogError::Validation(format!(
                "Tour {} does not exist",
                draft.tour_id
            )));
        }

        let existing = state
            .reviews
            .iter_mut()
            .find(|r| r.tour_id == draft.tour_id && r.user_id == draft.user_id);
        if let Some(review) = existing {
            review.user_name = draft.user_name.clone();
            review.rating = draft.rating;
            review.comment = draft.comment.clone();
            review.comment_i18n = translations.clone();
            return Ok(review.clone());
        }

        let review = Review {
            id: state.allocate_id(),
            tour_id: draft.tour_id,
            user_id: draft.user_id.clone(),
            user_name: draft.user_name.clone(),
            rating: draft.rating,
            comment: draft.comment.clone(),
            comment_i18n: translations.clone(),
            created_at: Utc::now(),
        };
        state.reviews.push(review.clone());
        Ok(review)
    }
}
