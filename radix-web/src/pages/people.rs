//! Person detail pages
//!
//! Craftsmen and personalities are the same records served under two
//! sections; only the links and breadcrumb differ.

use axum::{
    extract::{Path, State},
    response::Response,
};
use radix_common::dates::format_period;
use radix_common::db::{engagements_for_person, events_for_person, find_person_by_slug};
use radix_common::engagements::{build_timeline, group_by_glasswork, sort_chronologically, MapPoint, TimelineItem};
use radix_common::models::{Person, Place};
use serde::Serialize;

use super::{base_context, glasswork_href, or_log, respond, PageError, PageResult};
use crate::templates::render;
use crate::AppState;

#[derive(Debug, Clone, Copy)]
enum Section {
    Craftsmen,
    Personalities,
}

impl Section {
    fn label(self) -> &'static str {
        match self {
            Section::Craftsmen => "Verriers",
            Section::Personalities => "Personnalités",
        }
    }
}

#[derive(Debug, Serialize)]
struct EngagementRow {
    glasswork: String,
    href: Option<String>,
    function: Option<String>,
    period: String,
    kind_label: &'static str,
}

#[derive(Debug, Serialize)]
struct PersonView {
    name: String,
    section: &'static str,
    birth: Option<String>,
    death: Option<String>,
    principal_role: Option<&'static str>,
    specialisation: Option<String>,
    main_activity_period: Option<String>,
    biography_html: String,
    engagements: Vec<EngagementRow>,
    timeline: Vec<TimelineItem>,
}

/// GET /verriers/:slug
pub async fn craftsman_detail(State(state): State<AppState>, Path(slug): Path<String>) -> Response {
    let result = render_person(&state, &slug, Section::Craftsmen).await;
    respond(&state, result).await
}

/// GET /personnalites/:slug
pub async fn personality_detail(State(state): State<AppState>, Path(slug): Path<String>) -> Response {
    let result = render_person(&state, &slug, Section::Personalities).await;
    respond(&state, result).await
}

/// "date, place" with either part optional
fn life_event(date: Option<&str>, place: Option<&Place>) -> Option<String> {
    let parts: Vec<&str> = [
        date.filter(|d| !d.trim().is_empty()),
        place.and_then(|p| p.display_name()),
    ]
    .into_iter()
    .flatten()
    .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(", "))
    }
}

async fn render_person(state: &AppState, slug: &str, section: Section) -> PageResult {
    let person: Person = or_log(find_person_by_slug(&state.db, slug).await, "person")
        .ok_or_else(|| PageError::NotFound(format!("person '{}'", slug)))?;

    let mut engagements = or_log(
        engagements_for_person(&state.db, person.id).await,
        "person engagements",
    );
    sort_chronologically(&mut engagements);
    let events = or_log(events_for_person(&state.db, person.id).await, "biographical events");

    let timeline = build_timeline(&engagements, &events);
    let map_points: Vec<MapPoint> = group_by_glasswork(&engagements);

    let rows = engagements
        .iter()
        .map(|e| EngagementRow {
            glasswork: e.glasswork.name.clone(),
            href: e.glasswork.slug.as_deref().map(glasswork_href),
            function: e.function.as_ref().map(|f| f.name.clone()),
            period: format_period(&e.start, &e.end),
            kind_label: e.kind.label(),
        })
        .collect();

    let birth_text = person
        .birth_date_text
        .clone()
        .or_else(|| person.birth_year.map(|y| y.to_string()));
    let death_text = person
        .death_date_text
        .clone()
        .or_else(|| person.death_year.map(|y| y.to_string()));

    let view = PersonView {
        name: person.display_name(),
        section: section.label(),
        birth: life_event(birth_text.as_deref(), person.birth_place.as_ref()),
        death: life_event(death_text.as_deref(), person.death_place.as_ref()),
        principal_role: person.principal_role.map(|r| r.label()),
        specialisation: person.specialisation.clone().filter(|s| !s.trim().is_empty()),
        main_activity_period: person.main_activity_period.clone().filter(|s| !s.trim().is_empty()),
        biography_html: state.renderer.render(person.biography.as_ref()),
        engagements: rows,
        timeline,
    };

    let mut context = base_context(state).await;
    context.insert("person", &view);
    context.insert(
        "map_points_json",
        &serde_json::to_string(&map_points).unwrap_or_else(|_| "[]".to_string()),
    );
    Ok(render(&state.templates, "person.html", &context)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_life_event_joins_available_parts() {
        let place = Place {
            id: 1,
            town: Some("Baccarat".to_string()),
            ..Default::default()
        };
        assert_eq!(
            life_event(Some("12 mars 1850"), Some(&place)).as_deref(),
            Some("12 mars 1850, Baccarat")
        );
        assert_eq!(life_event(None, Some(&place)).as_deref(), Some("Baccarat"));
        assert_eq!(life_event(Some(" "), None), None);
    }
}
