//! People search
//!
//! Matches people by full name and returns each with their engagements,
//! including the founder engagements derived from the glassworks they
//! founded, oldest first.

use std::collections::HashMap;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use radix_common::db;
use radix_common::engagements::{founder_engagement, sort_chronologically};
use radix_common::models::{Engagement, Id, Person, PersonRef};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::SqlitePool;
use tracing::{debug, error};

use crate::AppState;

/// Most people returned for one search
pub const SEARCH_LIMIT: i64 = 50;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

/// A matched person with all of their engagements
#[derive(Debug, Serialize)]
pub struct PersonMatch {
    #[serde(flatten)]
    pub person: Person,
    pub engagements: Vec<Engagement>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub docs: Vec<PersonMatch>,
}

/// Search term, trimmed; `None` when missing or blank
pub fn search_term(query: &SearchQuery) -> Option<&str> {
    query.q.as_deref().map(str::trim).filter(|t| !t.is_empty())
}

/// People whose full name contains `term`, each with real and founder
/// engagements sorted chronologically
pub async fn find_people_with_engagements(
    pool: &SqlitePool,
    term: &str,
) -> radix_common::Result<Vec<PersonMatch>> {
    let people = db::search_people(pool, term, SEARCH_LIMIT).await?;
    let ids: Vec<Id> = people.iter().map(|p| p.id).collect();

    let mut by_person: HashMap<Id, Vec<Engagement>> = HashMap::new();
    for engagement in db::engagements_for_people(pool, &ids).await? {
        by_person.entry(engagement.person.id).or_default().push(engagement);
    }

    let refs: HashMap<Id, PersonRef> = people.iter().map(|p| (p.id, p.to_ref())).collect();
    for (founder_id, glasswork) in db::glassworks_founded_by(pool, &ids).await? {
        if let Some(person) = refs.get(&founder_id) {
            by_person
                .entry(founder_id)
                .or_default()
                .push(founder_engagement(person, &glasswork));
        }
    }

    debug!("Search '{}' matched {} people", term, people.len());
    Ok(people
        .into_iter()
        .map(|person| {
            let mut engagements = by_person.remove(&person.id).unwrap_or_default();
            sort_chronologically(&mut engagements);
            PersonMatch { person, engagements }
        })
        .collect())
}

/// GET /api/custom/recherche-personnes?q=
pub async fn search_people(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<SearchResponse>, SearchError> {
    let term = search_term(&query).ok_or(SearchError::MissingTerm)?;

    let docs = find_people_with_engagements(&state.db, term)
        .await
        .map_err(|e| SearchError::DatabaseError(e.to_string()))?;

    Ok(Json(SearchResponse { docs }))
}

/// Search errors
#[derive(Debug)]
pub enum SearchError {
    MissingTerm,
    DatabaseError(String),
}

impl IntoResponse for SearchError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            SearchError::MissingTerm => (
                StatusCode::BAD_REQUEST,
                "Le terme de recherche est manquant ou invalide.",
            ),
            SearchError::DatabaseError(msg) => {
                error!("People search failed: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Erreur interne du serveur.")
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
