//! radix-web library - public site of the glassmaking history database
//!
//! Server-rendered pages over the read-only content store, the people search
//! endpoint and the revalidation endpoint that evicts cached pages.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use radix_common::config::SiteConfig;
use radix_common::RichTextRenderer;
use sqlx::SqlitePool;
use tera::Tera;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod cache;
pub mod pages;
pub mod templates;

use cache::PageCache;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Content store (read-only)
    pub db: SqlitePool,
    pub renderer: Arc<RichTextRenderer>,
    pub templates: Arc<Tera>,
    pub cache: Arc<PageCache>,
    /// Bearer token expected by `POST /api/revalidate`
    pub revalidation_token: Option<String>,
}

impl AppState {
    pub fn new(db: SqlitePool, config: &SiteConfig) -> tera::Result<Self> {
        Ok(Self {
            db,
            renderer: Arc::new(RichTextRenderer::new(config.media_base_url.clone())),
            templates: Arc::new(templates::load_templates()?),
            cache: Arc::new(PageCache::new(Duration::from_secs(config.cache_max_age_secs))),
            revalidation_token: config.revalidation_token.clone(),
        })
    }
}

/// Build application router
///
/// HTML pages go through the page cache; JSON endpoints never do.
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;
    use axum::routing::{get, post};

    let pages = Router::new()
        .route("/", get(pages::home))
        .route("/verreries", get(pages::glassworks_index))
        .route("/verreries/:slug", get(pages::glasswork_detail))
        .route("/verriers/:slug", get(pages::craftsman_detail))
        .route("/personnalites/:slug", get(pages::personality_detail))
        .route("/histoires", get(pages::stories_index))
        .route("/histoires/:slug", get(pages::story_detail))
        .route("/recherche", get(pages::search_page))
        .route("/:slug", get(pages::content_page))
        .layer(middleware::from_fn_with_state(state.clone(), cache::cache_pages));

    let api = Router::new()
        .route("/api/custom/recherche-personnes", get(api::search_people))
        .route("/api/revalidate", post(api::revalidate))
        .merge(api::health_routes());

    Router::new()
        .merge(pages)
        .merge(api)
        .fallback(pages::fallback)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
