//! Story listing and detail pages

use axum::{
    extract::{Path, State},
    response::Response,
};
use radix_common::db::{find_story_by_slug, list_stories};
use serde::Serialize;

use super::home::StoryCard;
use super::{base_context, or_log, respond, ImageView, LinkView, PageError, PageResult};
use crate::templates::render;
use crate::AppState;

const STORY_LIST_LIMIT: i64 = 100;

#[derive(Debug, Serialize)]
struct StoryView {
    title: String,
    kind: Option<&'static str>,
    summary: Option<String>,
    image: Option<ImageView>,
    content_html: String,
    related_people: Vec<LinkView>,
    related_glassworks: Vec<LinkView>,
}

/// GET /histoires
pub async fn stories_index(State(state): State<AppState>) -> Response {
    let result = render_index(&state).await;
    respond(&state, result).await
}

async fn render_index(state: &AppState) -> PageResult {
    let stories = or_log(list_stories(&state.db, STORY_LIST_LIMIT).await, "stories");
    let cards: Vec<StoryCard> = stories.iter().map(|s| StoryCard::new(state, s)).collect();

    let mut context = base_context(state).await;
    context.insert("stories", &cards);
    Ok(render(&state.templates, "stories.html", &context)?)
}

/// GET /histoires/:slug
pub async fn story_detail(State(state): State<AppState>, Path(slug): Path<String>) -> Response {
    let result = render_detail(&state, &slug).await;
    respond(&state, result).await
}

async fn render_detail(state: &AppState, slug: &str) -> PageResult {
    let story = or_log(find_story_by_slug(&state.db, slug).await, "story")
        .ok_or_else(|| PageError::NotFound(format!("story '{}'", slug)))?;

    let view = StoryView {
        title: story.title.clone(),
        kind: story.kind.map(|k| k.label()),
        summary: story.summary.clone().filter(|s| !s.trim().is_empty()),
        image: story
            .featured_image
            .as_ref()
            .map(|m| ImageView::new(state, m, &story.title)),
        content_html: state.renderer.render(story.content.as_ref()),
        related_people: story
            .related_people
            .iter()
            .map(|p| LinkView::person(p, None))
            .collect(),
        related_glassworks: story.related_glassworks.iter().map(LinkView::glasswork).collect(),
    };

    let mut context = base_context(state).await;
    context.insert("story", &view);
    Ok(render(&state.templates, "story.html", &context)?)
}
