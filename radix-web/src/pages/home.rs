//! Home page

use axum::{extract::State, response::Response};
use radix_common::db::{glassworks_with_coordinates, list_stories, recent_glassworks};
use radix_common::engagements::MapPoint;
use radix_common::models::{Glasswork, Story};
use radix_common::richtext::extract_plain_text;
use serde::Serialize;

use super::{base_context, glasswork_href, or_log, respond, ImageView, PageResult};
use crate::templates::render;
use crate::AppState;

const FEATURED_GLASSWORKS: i64 = 6;
const RECENT_STORIES: i64 = 3;
const EXCERPT_LENGTH: usize = 120;

/// Card of a glasswork in listings
#[derive(Debug, Serialize)]
pub(crate) struct GlassworkCard {
    name: String,
    href: Option<String>,
    place: Option<String>,
    period: Option<String>,
    excerpt: String,
    image: Option<ImageView>,
}

impl GlassworkCard {
    pub(crate) fn new(state: &AppState, glasswork: &Glasswork) -> Self {
        Self {
            name: glasswork.name.clone(),
            href: glasswork.slug.as_deref().map(glasswork_href),
            place: glasswork
                .place
                .as_ref()
                .and_then(|p| p.display_name())
                .map(str::to_string),
            period: glasswork.period.display(),
            excerpt: extract_plain_text(glasswork.history.as_ref(), EXCERPT_LENGTH),
            image: glasswork
                .media
                .first()
                .map(|m| ImageView::new(state, m, &glasswork.name)),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct StoryCard {
    title: String,
    href: Option<String>,
    kind: Option<&'static str>,
    summary: String,
    image: Option<ImageView>,
}

impl StoryCard {
    pub(crate) fn new(state: &AppState, story: &Story) -> Self {
        let summary = story
            .summary
            .clone()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| extract_plain_text(story.content.as_ref(), EXCERPT_LENGTH));
        Self {
            title: story.title.clone(),
            href: story.slug.as_ref().map(|slug| format!("/histoires/{}", slug)),
            kind: story.kind.map(|k| k.label()),
            summary,
            image: story
                .featured_image
                .as_ref()
                .map(|m| ImageView::new(state, m, &story.title)),
        }
    }
}

/// GET /
pub async fn home(State(state): State<AppState>) -> Response {
    let result = render_home(&state).await;
    respond(&state, result).await
}

async fn render_home(state: &AppState) -> PageResult {
    let glassworks = or_log(
        recent_glassworks(&state.db, FEATURED_GLASSWORKS).await,
        "featured glassworks",
    );
    let stories = or_log(list_stories(&state.db, RECENT_STORIES).await, "recent stories");
    let markers = or_log(glassworks_with_coordinates(&state.db).await, "map markers");

    let points: Vec<MapPoint> = markers.iter().filter_map(MapPoint::for_glasswork).collect();
    let cards: Vec<GlassworkCard> = glassworks.iter().map(|g| GlassworkCard::new(state, g)).collect();
    let story_cards: Vec<StoryCard> = stories.iter().map(|s| StoryCard::new(state, s)).collect();

    let mut context = base_context(state).await;
    context.insert("glassworks", &cards);
    context.insert("stories", &story_cards);
    context.insert(
        "map_points_json",
        &serde_json::to_string(&points).unwrap_or_else(|_| "[]".to_string()),
    );
    Ok(render(&state.templates, "home.html", &context)?)
}
