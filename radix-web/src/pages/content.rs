//! Free-form pages addressed by a single slug (legal notice, about...)

use axum::{
    extract::{Path, State},
    response::Response,
};
use radix_common::db::find_page_by_slug;
use serde_json::json;

use super::{base_context, or_log, respond, PageError, PageResult};
use crate::templates::render;
use crate::AppState;

/// GET /:slug
pub async fn content_page(State(state): State<AppState>, Path(slug): Path<String>) -> Response {
    let result = render_page(&state, &slug).await;
    respond(&state, result).await
}

async fn render_page(state: &AppState, slug: &str) -> PageResult {
    let page = or_log(find_page_by_slug(&state.db, slug).await, "page")
        .ok_or_else(|| PageError::NotFound(format!("page '{}'", slug)))?;

    let mut context = base_context(state).await;
    context.insert(
        "page",
        &json!({
            "title": page.title,
            "content_html": state.renderer.render(page.content.as_ref()),
        }),
    );
    Ok(render(&state.templates, "page.html", &context)?)
}
