//! Application state, router assembly and the HTTP server loop.

use crate::catalog::{MemoryCatalog, PgCatalog, TourCatalog};
use crate::config::Config;
use crate::i18n::{DictionaryLoader, DirectorySource};
use crate::middleware::{locale_redirect, LocaleRouting};
use crate::storefront;
use crate::translation::{GoogleTranslator, MachineTranslator};
use anyhow::{Context, Result};
use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<dyn TourCatalog>,
    pub dictionaries: Arc<DictionaryLoader>,
    pub translator: Arc<dyn MachineTranslator>,
    pub routing: Arc<LocaleRouting>,
    pub api_key: Option<String>,
}

impl AppState {
    /// Build the production state from configuration.
    ///
    /// Connects to and migrates Postgres when `DATABASE_URL` is set, otherwise
    /// serves from an in-memory catalog.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let catalog: Arc<dyn TourCatalog> = match &config.database_url {
            Some(url) => {
                let catalog = PgCatalog::connect(url)
                    .await
                    .context("Failed to connect to the catalog database")?;
                catalog
                    .migrate()
                    .await
                    .context("Failed to migrate the catalog database")?;
                info!("Using PostgreSQL catalog");
                Arc::new(catalog)
            }
            None => {
                info!("DATABASE_URL not set, using in-memory catalog");
                Arc::new(MemoryCatalog::new())
            }
        };

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("Failed to build HTTP client")?;
        let translator = GoogleTranslator::new(client, config.translate_api_url.clone());

        Ok(Self {
            catalog,
            dictionaries: Arc::new(DictionaryLoader::new(DirectorySource::new(
                &config.dictionary_dir,
            ))),
            translator: Arc::new(translator),
            routing: Arc::new(routing_from_config(config)),
            api_key: config.api_key.clone(),
        })
    }
}

/// Locale routing rules derived from configuration.
pub fn routing_from_config(config: &Config) -> LocaleRouting {
    LocaleRouting::new()
        .with_cookie_name(config.locale_cookie_name.clone())
        .with_excluded_prefixes(config.excluded_prefixes.iter().cloned())
}

/// Assemble the full router.
///
/// Locale routing wraps every route: unprefixed storefront paths are
/// redirected before any handler runs, while excluded prefixes (`/api`)
/// pass straight through.
pub fn build_router(state: AppState) -> Router {
    let admin = Router::new()
        .route("/api/tours", post(storefront::create_tour))
        .route(
            "/api/tours/:id",
            put(storefront::update_tour).delete(storefront::delete_tour),
        )
        .route("/api/announcements", post(storefront::create_announcement))
        .route(
            "/api/announcements/:id/toggle",
            post(storefront::toggle_announcement),
        )
        .route(
            "/api/announcements/:id",
            delete(storefront::delete_announcement),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            storefront::require_api_key,
        ));

    Router::new()
        .route("/api/health", get(storefront::health))
        .route("/api/reviews/translate", post(storefront::translate_review))
        .route("/:lang", get(storefront::home))
        .route("/:lang/", get(storefront::home))
        .route("/:lang/tours", get(storefront::tours))
        .route("/:lang/tours/:id", get(storefront::tour_detail))
        .route("/:lang/dictionary", get(storefront::dictionary))
        .route("/:lang/locales", get(storefront::locale_switcher))
        .route("/:lang/switch", get(storefront::switch_locale))
        .merge(admin)
        .layer(middleware::from_fn_with_state(
            Arc::clone(&state.routing),
            locale_redirect,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `port` on all interfaces and serve until the process is stopped.
pub async fn serve(config: &Config) -> Result<()> {
    let state = AppState::from_config(config).await?;
    state.dictionaries.preload().await;

    let app = build_router(state);
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("Storefront listening on {}", addr);
    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
