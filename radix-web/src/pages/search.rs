//! Search results page

use axum::{
    extract::{Query, State},
    response::Response,
};
use radix_common::dates::format_period;
use radix_common::models::EngagementKind;
use serde::Serialize;
use tracing::error;

use super::{base_context, person_href, respond, LinkView, PageResult};
use crate::api::search::{find_people_with_engagements, search_term, PersonMatch, SearchQuery};
use crate::templates::render;
use crate::AppState;

#[derive(Debug, Serialize)]
struct ResultEngagement {
    glasswork: LinkView,
    function: Option<String>,
    period: String,
}

#[derive(Debug, Serialize)]
struct SearchResult {
    name: String,
    href: Option<String>,
    engagements: Vec<ResultEngagement>,
}

impl SearchResult {
    /// Result listed in one category, with only that category's engagements
    fn for_kind(found: &PersonMatch, kind: Option<EngagementKind>) -> Self {
        Self {
            name: found.person.display_name(),
            href: person_href(found.person.slug.as_deref(), kind),
            engagements: found
                .engagements
                .iter()
                .filter(|e| kind.map_or(true, |k| e.kind == k))
                .map(|e| ResultEngagement {
                    glasswork: LinkView::glasswork(&e.glasswork),
                    function: e.function.as_ref().map(|f| f.name.clone()),
                    period: format_period(&e.start, &e.end),
                })
                .collect(),
        }
    }
}

/// Matches split into personalities, craftsmen and people without any
/// engagement; someone with both kinds appears in both lists
#[derive(Debug, Default, Serialize)]
struct SearchGroups {
    personalities: Vec<SearchResult>,
    craftsmen: Vec<SearchResult>,
    others: Vec<SearchResult>,
}

fn group_results(matches: &[PersonMatch]) -> SearchGroups {
    let mut groups = SearchGroups::default();
    for found in matches {
        let has = |kind| found.engagements.iter().any(|e| e.kind == kind);
        if has(EngagementKind::PersonalityRole) {
            groups
                .personalities
                .push(SearchResult::for_kind(found, Some(EngagementKind::PersonalityRole)));
        }
        if has(EngagementKind::CraftOccupation) {
            groups
                .craftsmen
                .push(SearchResult::for_kind(found, Some(EngagementKind::CraftOccupation)));
        }
        if found.engagements.is_empty() {
            groups.others.push(SearchResult::for_kind(found, None));
        }
    }
    groups
}

/// GET /recherche?q=
pub async fn search_page(State(state): State<AppState>, Query(query): Query<SearchQuery>) -> Response {
    let result = render_search(&state, &query).await;
    respond(&state, result).await
}

async fn render_search(state: &AppState, query: &SearchQuery) -> PageResult {
    let term = search_term(query);
    let groups = match term {
        Some(term) => match find_people_with_engagements(&state.db, term).await {
            Ok(matches) => group_results(&matches),
            Err(e) => {
                error!("Error searching people for '{}': {}", term, e);
                SearchGroups::default()
            }
        },
        None => SearchGroups::default(),
    };

    let mut context = base_context(state).await;
    context.insert("query", &term.unwrap_or(""));
    context.insert("results", &groups);
    Ok(render(&state.templates, "search.html", &context)?)
}
