//! Glasswork catalogue and detail pages

use axum::{
    extract::{Path, State},
    response::Response,
};
use radix_common::db::{engagements_for_glasswork, find_glasswork_by_slug, list_glassworks, recent_glassworks};
use radix_common::engagements::{group_by_person, EngagementSummary};
use radix_common::models::{EngagementKind, Glasswork, HistoricalName, Source};
use serde::Serialize;

use super::home::GlassworkCard;
use super::{base_context, or_log, person_href, respond, ImageView, LinkView, PageError, PageResult};
use crate::templates::render;
use crate::AppState;

/// Other glassworks suggested at the bottom of a detail page
const SUGGESTION_COUNT: usize = 2;

#[derive(Debug, Serialize)]
struct PersonGroupView {
    name: String,
    href: Option<String>,
    engagements: Vec<EngagementSummary>,
}

#[derive(Debug, Serialize)]
struct GlassworkView {
    name: String,
    historical_names: Vec<HistoricalName>,
    period: Option<String>,
    status: Option<&'static str>,
    status_notes: Option<String>,
    place: Option<String>,
    coordinates: Option<[f64; 2]>,
    founders: Vec<LinkView>,
    history_html: String,
    social_aspects_html: Option<String>,
    techniques: Option<String>,
    production_types: Vec<String>,
    gallery: Vec<ImageView>,
    sources: Vec<Source>,
    personalities: Vec<PersonGroupView>,
    craftsmen: Vec<PersonGroupView>,
}

/// GET /verreries
pub async fn glassworks_index(State(state): State<AppState>) -> Response {
    let result = render_index(&state).await;
    respond(&state, result).await
}

async fn render_index(state: &AppState) -> PageResult {
    let glassworks = or_log(list_glassworks(&state.db).await, "glassworks");
    let cards: Vec<GlassworkCard> = glassworks.iter().map(|g| GlassworkCard::new(state, g)).collect();

    let mut context = base_context(state).await;
    context.insert("glassworks", &cards);
    Ok(render(&state.templates, "glassworks.html", &context)?)
}

/// GET /verreries/:slug
pub async fn glasswork_detail(State(state): State<AppState>, Path(slug): Path<String>) -> Response {
    let result = render_detail(&state, &slug).await;
    respond(&state, result).await
}

async fn render_detail(state: &AppState, slug: &str) -> PageResult {
    let glasswork = or_log(find_glasswork_by_slug(&state.db, slug).await, "glasswork")
        .ok_or_else(|| PageError::NotFound(format!("glasswork '{}'", slug)))?;

    let engagements = or_log(
        engagements_for_glasswork(&state.db, glasswork.id).await,
        "glasswork engagements",
    );
    let group = |kind: EngagementKind| -> Vec<PersonGroupView> {
        group_by_person(&engagements, kind)
            .into_iter()
            .map(|g| PersonGroupView {
                href: person_href(g.person.slug.as_deref(), Some(kind)),
                name: g.person.name,
                engagements: g.engagements,
            })
            .collect()
    };
    let personalities = group(EngagementKind::PersonalityRole);
    let craftsmen = group(EngagementKind::CraftOccupation);

    let suggestions: Vec<GlassworkCard> = or_log(
        recent_glassworks(&state.db, SUGGESTION_COUNT as i64 + 1).await,
        "suggested glassworks",
    )
    .iter()
    .filter(|g| g.id != glasswork.id)
    .take(SUGGESTION_COUNT)
    .map(|g| GlassworkCard::new(state, g))
    .collect();

    let view = glasswork_view(state, &glasswork, personalities, craftsmen);

    let mut context = base_context(state).await;
    context.insert("glasswork", &view);
    context.insert("suggestions", &suggestions);
    Ok(render(&state.templates, "glasswork.html", &context)?)
}

fn glasswork_view(
    state: &AppState,
    glasswork: &Glasswork,
    personalities: Vec<PersonGroupView>,
    craftsmen: Vec<PersonGroupView>,
) -> GlassworkView {
    let place = glasswork.place.as_ref();
    GlassworkView {
        name: glasswork.name.clone(),
        historical_names: glasswork.sorted_historical_names(),
        period: glasswork.period.display(),
        status: glasswork.status.map(|s| s.label()),
        status_notes: glasswork.status_notes.clone(),
        place: place.map(|p| p.full_label()).filter(|l| !l.is_empty()),
        coordinates: place.and_then(|p| p.coordinates),
        founders: glasswork
            .founders
            .iter()
            .map(|f| LinkView::person(f, Some(EngagementKind::PersonalityRole)))
            .collect(),
        history_html: state.renderer.render(glasswork.history.as_ref()),
        social_aspects_html: glasswork
            .social_aspects
            .as_ref()
            .map(|doc| state.renderer.render(Some(doc))),
        techniques: glasswork.techniques.clone().filter(|t| !t.trim().is_empty()),
        production_types: glasswork.production_types.clone(),
        gallery: glasswork
            .media
            .iter()
            .map(|m| ImageView::new(state, m, &glasswork.name))
            .collect(),
        sources: glasswork.sources.clone(),
        personalities,
        craftsmen,
    }
}
