//! Integration tests for the HTML pages
//!
//! Tests cover:
//! - Home, catalogue, detail and free-form pages render from the store
//! - Unknown slugs and routes render the 404 page
//! - Chronological ordering of engagements on glasswork and person pages
//! - Rich-text placeholder for malformed documents
//! - Page cache population

mod helpers;

use axum::http::StatusCode;
use helpers::*;
use radix_common::db::{save_glasswork, GlassworkRecord};
use radix_web::build_router;
use serde_json::json;
use tower::util::ServiceExt; // for `oneshot` method

async fn fetch(app: &TestApp, uri: &str) -> (StatusCode, String) {
    let response = build_router(app.state.clone()).oneshot(get(uri)).await.unwrap();
    let status = response.status();
    (status, body_text(response.into_body()).await)
}

fn position(html: &str, needle: &str) -> usize {
    html.find(needle)
        .unwrap_or_else(|| panic!("'{}' not found in page", needle))
}

#[tokio::test]
async fn test_home_lists_glassworks_and_footer_pages() {
    let app = seeded_app().await;
    let (status, html) = fetch(&app, "/").await;

    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("Verrerie de Meisenthal"));
    assert!(html.contains("Fondée au XVIIIe siècle."));
    assert!(html.contains("Mentions légales"));
}

#[tokio::test]
async fn test_missing_glasswork_is_not_found() {
    let app = seeded_app().await;
    let (status, html) = fetch(&app, "/verreries/inexistante").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(html.contains("Page introuvable"));
}

#[tokio::test]
async fn test_unknown_routes_are_not_found() {
    let app = seeded_app().await;

    for uri in ["/verriers/inconnu", "/personnalites/inconnu", "/histoires/inconnue", "/inconnue", "/a/b/c"] {
        let (status, _) = fetch(&app, uri).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{}", uri);
    }
}

#[tokio::test]
async fn test_glasswork_page_lists_engagements_oldest_first() {
    let app = seeded_app().await;
    let (status, html) = fetch(&app, "/verreries/verrerie-de-meisenthal").await;

    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("Jean Dupont"));
    assert!(html.contains("Marie Walter"));
    assert!(position(&html, "(1830 - 1845)") < position(&html, "(1850)"));
}

#[tokio::test]
async fn test_person_page_timeline_is_chronological() {
    let app = seeded_app().await;
    let (status, html) = fetch(&app, "/verriers/jean-dupont").await;

    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("Souffleur de verre lorrain."));
    assert!(position(&html, ">1830 - 1845<") < position(&html, ">1850<"));
}

#[tokio::test]
async fn test_personality_page_serves_same_record() {
    let app = seeded_app().await;
    let (status, html) = fetch(&app, "/personnalites/marie-walter").await;

    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("Marie Walter"));
    assert!(html.contains("Personnalités"));
}

#[tokio::test]
async fn test_content_page_renders_rich_text() {
    let app = seeded_app().await;
    let (status, html) = fetch(&app, "/mentions-legales").await;

    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("<p>Éditeur du site.</p>"));
}

#[tokio::test]
async fn test_malformed_history_renders_placeholder() {
    let app = empty_app().await;
    save_glasswork(
        &app.state.db,
        &GlassworkRecord {
            name: "Verrerie du Bas".to_string(),
            history: Some(json!({ "root": "pas un arbre" })),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let (status, html) = fetch(&app, "/verreries/verrerie-du-bas").await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("Contenu non disponible."));
}

#[tokio::test]
async fn test_search_page_groups_results() {
    let app = seeded_app().await;
    let (status, html) = fetch(&app, "/recherche?q=dupont").await;

    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("Jean Dupont"));
    assert!(html.contains("Verriers"));
}

#[tokio::test]
async fn test_pages_are_cached_but_not_found_is_not() {
    let app = seeded_app().await;

    fetch(&app, "/verreries").await;
    assert!(app.state.cache.contains("/verreries").await);

    fetch(&app, "/verreries/inexistante").await;
    assert!(!app.state.cache.contains("/verreries/inexistante").await);
}
