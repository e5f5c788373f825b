//! Server-rendered HTML pages
//!
//! Every page renders in a single pass from store reads. A failed read is
//! logged and treated as an absent record, so a broken store degrades to
//! empty sections or the 404 page rather than an error page.

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use radix_common::db::list_pages;
use radix_common::models::{EngagementKind, GlassworkRef, Media, PersonRef};
use serde::Serialize;
use tera::Context;
use thiserror::Error;
use tracing::{error, warn};

use crate::templates::render;
use crate::AppState;

mod content;
mod glassworks;
mod home;
mod people;
mod search;
mod stories;

pub use content::content_page;
pub use glassworks::{glasswork_detail, glassworks_index};
pub use home::home;
pub use people::{craftsman_detail, personality_detail};
pub use search::search_page;
pub use stories::{stories_index, story_detail};

/// Pages listed in the footer
const FOOTER_PAGE_LIMIT: i64 = 10;

#[derive(Debug, Error)]
pub enum PageError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Template error: {0}")]
    Template(#[from] tera::Error),
}

pub type PageResult = Result<String, PageError>;

#[derive(Debug, Serialize)]
struct FooterLink {
    title: String,
    href: String,
}

/// Image with its absolute url
#[derive(Debug, Serialize)]
pub(crate) struct ImageView {
    url: String,
    alt: String,
    caption: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
}

impl ImageView {
    pub(crate) fn new(state: &AppState, media: &Media, fallback_alt: &str) -> Self {
        Self {
            url: state.renderer.media_url(&media.url),
            alt: media
                .alt
                .clone()
                .filter(|a| !a.is_empty())
                .unwrap_or_else(|| fallback_alt.to_string()),
            caption: media.caption.clone(),
            width: media.width,
            height: media.height,
        }
    }
}

/// Named link; `href` is absent when the target has no slug
#[derive(Debug, Clone, Serialize)]
pub(crate) struct LinkView {
    pub name: String,
    pub href: Option<String>,
}

impl LinkView {
    pub(crate) fn person(person: &PersonRef, kind: Option<EngagementKind>) -> Self {
        Self {
            name: person.name.clone(),
            href: person_href(person.slug.as_deref(), kind),
        }
    }

    pub(crate) fn glasswork(glasswork: &GlassworkRef) -> Self {
        Self {
            name: glasswork.name.clone(),
            href: glasswork.slug.as_deref().map(glasswork_href),
        }
    }
}

pub(crate) fn glasswork_href(slug: &str) -> String {
    format!("/verreries/{}", slug)
}

/// Personalities live under `/personnalites`, everyone else under `/verriers`
pub(crate) fn person_href(slug: Option<&str>, kind: Option<EngagementKind>) -> Option<String> {
    let slug = slug.filter(|s| !s.is_empty())?;
    Some(match kind {
        Some(EngagementKind::PersonalityRole) => format!("/personnalites/{}", slug),
        _ => format!("/verriers/{}", slug),
    })
}

/// Log a failed store read and fall back to the empty value
pub(crate) fn or_log<T: Default>(result: radix_common::Result<T>, what: &str) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            error!("Error fetching {}: {}", what, e);
            T::default()
        }
    }
}

/// Context shared by every page: the footer links
pub(crate) async fn base_context(state: &AppState) -> Context {
    let pages = or_log(list_pages(&state.db, FOOTER_PAGE_LIMIT).await, "footer pages");
    let links: Vec<FooterLink> = pages
        .into_iter()
        .filter_map(|page| {
            let slug = page.slug?;
            Some(FooterLink {
                title: page.title,
                href: format!("/{}", slug),
            })
        })
        .collect();

    let mut context = Context::new();
    context.insert("footer_pages", &links);
    context
}

/// Turn a page result into a response, rendering the 404 page when needed
pub(crate) async fn respond(state: &AppState, result: PageResult) -> Response {
    match result {
        Ok(html) => Html(html).into_response(),
        Err(PageError::NotFound(what)) => {
            warn!("Not found: {}", what);
            not_found_page(state).await
        }
        Err(PageError::Template(e)) => {
            error!("Template error: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html("<h1>Erreur interne du serveur.</h1>"),
            )
                .into_response()
        }
    }
}

async fn not_found_page(state: &AppState) -> Response {
    let context = base_context(state).await;
    match render(&state.templates, "not_found.html", &context) {
        Ok(html) => (StatusCode::NOT_FOUND, Html(html)).into_response(),
        Err(e) => {
            error!("Template error: {:?}", e);
            (StatusCode::NOT_FOUND, Html("<h1>Page introuvable</h1>".to_string())).into_response()
        }
    }
}

/// Any route without a handler
pub async fn fallback(State(state): State<AppState>) -> Response {
    not_found_page(&state).await
}
