//! Shared setup for router tests: a seeded temporary database and the app
//! state built on it

#![allow(dead_code)]

use axum::body::Body;
use axum::http::Request;
use radix_common::config::{ConfigOverrides, SiteConfig, TomlConfig};
use radix_common::db::*;
use radix_common::models::{ApproxDate, EngagementKind, Function, Place};
use radix_web::AppState;
use serde_json::{json, Value};
use tempfile::TempDir;

pub const TOKEN: &str = "test-token";

pub struct TestApp {
    pub state: AppState,
    /// Keeps the database directory alive for the test
    _dir: TempDir,
}

fn config(dir: &TempDir) -> SiteConfig {
    SiteConfig::resolve(
        ConfigOverrides {
            database_path: Some(dir.path().join("radix.db")),
            media_base_url: Some("https://cms.example.org".to_string()),
            revalidation_token: Some(TOKEN.to_string()),
            ..Default::default()
        },
        TomlConfig::default(),
    )
}

/// Empty database
pub async fn empty_app() -> TestApp {
    let dir = TempDir::new().expect("Should create temp dir");
    let config = config(&dir);
    let pool = init_database(&config.database_path)
        .await
        .expect("Should create database");
    let state = AppState::new(pool, &config).expect("Should load templates");
    TestApp { state, _dir: dir }
}

fn paragraph(text: &str) -> Value {
    json!({
        "root": {
            "children": [
                { "type": "paragraph", "children": [{ "type": "text", "text": text, "format": 0 }] }
            ]
        }
    })
}

/// Database with one glasswork, two people and their engagements
///
/// Jean Dupont worked at the glasswork from 1850, then (second record) from
/// 1830 to 1845. Marie Walter founded it.
pub async fn seeded_app() -> TestApp {
    let app = empty_app().await;
    let pool = &app.state.db;

    save_place(
        pool,
        &Place {
            id: 1,
            name: Some("Meisenthal".to_string()),
            town: Some("Meisenthal".to_string()),
            coordinates: Some([7.35, 48.97]),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    save_function(pool, &Function { id: 1, name: "Souffleur".to_string() })
        .await
        .unwrap();
    save_function(pool, &Function { id: 2, name: "Directeur".to_string() })
        .await
        .unwrap();

    let jean = save_person(
        pool,
        &PersonRecord {
            first_name: Some("Jean".to_string()),
            last_name: Some("Dupont".to_string()),
            biography: Some(paragraph("Souffleur de verre lorrain.")),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    let marie = save_person(
        pool,
        &PersonRecord {
            full_name: Some("Marie Walter".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let glasswork = save_glasswork(
        pool,
        &GlassworkRecord {
            name: "Verrerie de Meisenthal".to_string(),
            place_id: Some(1),
            founder_ids: vec![marie],
            history: Some(paragraph("Fondée au XVIIIe siècle.")),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    for (start, end) in [(1850, None), (1830, Some(1845))] {
        save_engagement(
            pool,
            &EngagementRecord {
                id: None,
                glasswork_id: glasswork,
                person_id: jean,
                kind: EngagementKind::CraftOccupation,
                function_id: Some(1),
                start: ApproxDate::year(start),
                end: end.map(ApproxDate::year).unwrap_or_default(),
                description: None,
            },
        )
        .await
        .unwrap();
    }
    save_engagement(
        pool,
        &EngagementRecord {
            id: None,
            glasswork_id: glasswork,
            person_id: marie,
            kind: EngagementKind::PersonalityRole,
            function_id: Some(2),
            start: ApproxDate::year(1790),
            end: ApproxDate::default(),
            description: None,
        },
    )
    .await
    .unwrap();

    save_page(
        pool,
        &PageRecord {
            title: "Mentions légales".to_string(),
            content: Some(paragraph("Éditeur du site.")),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    app
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub fn post_json(uri: &str, token: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub async fn body_text(body: Body) -> String {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    String::from_utf8(bytes.to_vec()).expect("Should be UTF-8")
}

pub async fn body_json(body: Body) -> Value {
    serde_json::from_str(&body_text(body).await).expect("Should parse JSON")
}
