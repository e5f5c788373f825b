//! Integration tests for the SQLite content store
//!
//! Each test works on its own database file in a temporary directory and
//! goes through the same write path as the import tool.

use radix_common::db::*;
use radix_common::engagements::group_by_person;
use radix_common::models::{ApproxDate, EngagementKind, Function, Place};
use sqlx::SqlitePool;
use tempfile::TempDir;

async fn setup_db() -> (TempDir, SqlitePool) {
    let dir = TempDir::new().unwrap();
    let pool = init_database(&dir.path().join("radix.db")).await.unwrap();
    (dir, pool)
}

fn person(first: &str, last: &str) -> PersonRecord {
    PersonRecord {
        first_name: Some(first.to_string()),
        last_name: Some(last.to_string()),
        ..Default::default()
    }
}

async fn seed_glasswork(pool: &SqlitePool, name: &str, founder_ids: Vec<i64>) -> i64 {
    let place_id = save_place(
        pool,
        &Place {
            id: 1,
            name: Some("Meisenthal".to_string()),
            town: Some("Meisenthal".to_string()),
            country: Some("France".to_string()),
            coordinates: Some([7.35, 48.97]),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    save_glasswork(
        pool,
        &GlassworkRecord {
            name: name.to_string(),
            place_id: Some(place_id),
            founder_ids,
            ..Default::default()
        },
    )
    .await
    .unwrap()
}

fn engagement(glasswork_id: i64, person_id: i64, start: i32, end: Option<i32>) -> EngagementRecord {
    EngagementRecord {
        id: None,
        glasswork_id,
        person_id,
        kind: EngagementKind::CraftOccupation,
        function_id: Some(1),
        start: ApproxDate::year(start),
        end: end.map(ApproxDate::year).unwrap_or_default(),
        description: None,
    }
}

#[tokio::test]
async fn test_init_database_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("nested").join("radix.db");

    let pool = init_database(&db_path).await.unwrap();
    assert!(db_path.exists(), "Database file was not created");
    drop(pool);

    let pool = init_database(&db_path).await.unwrap();
    let tables: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN \
         ('places', 'functions', 'people', 'glassworks', 'glasswork_founders', 'engagements', \
          'biographical_events', 'stories', 'story_people', 'story_glassworks', 'pages')",
    )
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(tables, 11);
}

#[tokio::test]
async fn test_connect_readonly_requires_existing_database() {
    let dir = TempDir::new().unwrap();
    let result = connect_readonly(&dir.path().join("missing.db")).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_save_person_derives_full_name_and_slug() {
    let (_dir, pool) = setup_db().await;

    let id = save_person(&pool, &person("Jean", "Dupont")).await.unwrap();
    let saved = find_person_by_slug(&pool, "jean-dupont").await.unwrap().unwrap();
    assert_eq!(saved.id, id);
    assert_eq!(saved.full_name.as_deref(), Some("Jean Dupont"));

    let explicit = PersonRecord {
        id: Some(id),
        slug: Some("Jean Dupont l'Ancien".to_string()),
        ..person("Jean", "Dupont")
    };
    save_person(&pool, &explicit).await.unwrap();
    let saved = find_person_by_slug(&pool, "jean-dupont-l-ancien").await.unwrap().unwrap();
    assert_eq!(saved.id, id);
}

#[tokio::test]
async fn test_update_without_name_keeps_existing_slug() {
    let (_dir, pool) = setup_db().await;

    let id = save_person(&pool, &person("Marie", "Walter")).await.unwrap();
    let nameless = PersonRecord {
        id: Some(id),
        specialisation: Some("Graveuse".to_string()),
        ..Default::default()
    };
    save_person(&pool, &nameless).await.unwrap();

    let saved = find_person_by_slug(&pool, "marie-walter").await.unwrap().unwrap();
    assert_eq!(saved.id, id);
    assert_eq!(saved.specialisation.as_deref(), Some("Graveuse"));
}

#[tokio::test]
async fn test_glasswork_round_trip_with_founders_and_place() {
    let (_dir, pool) = setup_db().await;

    let first = save_person(&pool, &person("Jean", "Dupont")).await.unwrap();
    let second = save_person(&pool, &person("Pierre", "Martin")).await.unwrap();
    let id = seed_glasswork(&pool, "Verrerie de Meisenthal", vec![second, first]).await;

    let glasswork = find_glasswork_by_slug(&pool, "verrerie-de-meisenthal")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(glasswork.id, id);
    let founders: Vec<&str> = glasswork.founders.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(founders, vec!["Pierre Martin", "Jean Dupont"]);

    let place = glasswork.place.unwrap();
    assert_eq!(place.coordinates, Some([7.35, 48.97]));
    assert_eq!(place.slug.as_deref(), Some("meisenthal"));

    let markers = glassworks_with_coordinates(&pool).await.unwrap();
    assert_eq!(markers.len(), 1);

    let founded = glassworks_founded_by(&pool, &[first]).await.unwrap();
    assert_eq!(founded.len(), 1);
    assert_eq!(founded[0].0, first);
    assert_eq!(founded[0].1.id, id);
}

#[tokio::test]
async fn test_missing_glasswork_slug_is_none() {
    let (_dir, pool) = setup_db().await;
    assert!(find_glasswork_by_slug(&pool, "inexistante").await.unwrap().is_none());
}

#[tokio::test]
async fn test_malformed_list_column_reads_as_empty() {
    let (_dir, pool) = setup_db().await;

    let id = seed_glasswork(&pool, "Verrerie de Meisenthal", vec![]).await;
    seed_glasswork(&pool, "Verrerie de Saint-Louis", vec![]).await;
    sqlx::query("UPDATE glassworks SET media = '[{\"url\":', sources = 'oops' WHERE id = ?")
        .bind(id)
        .execute(&pool)
        .await
        .unwrap();

    let glassworks = list_glassworks(&pool).await.unwrap();
    assert_eq!(glassworks.len(), 2);

    let glasswork = find_glasswork_by_slug(&pool, "verrerie-de-meisenthal")
        .await
        .unwrap()
        .unwrap();
    assert!(glasswork.media.is_empty());
    assert!(glasswork.sources.is_empty());
}

#[tokio::test]
async fn test_out_of_range_year_reads_as_none() {
    let (_dir, pool) = setup_db().await;

    let id = save_person(&pool, &person("Jean", "Dupont")).await.unwrap();
    sqlx::query("UPDATE people SET birth_year = ?, death_year = ? WHERE id = ?")
        .bind(4_294_969_126_i64)
        .bind(1875_i64)
        .bind(id)
        .execute(&pool)
        .await
        .unwrap();

    let saved = find_person_by_slug(&pool, "jean-dupont").await.unwrap().unwrap();
    assert_eq!(saved.birth_year, None);
    assert_eq!(saved.death_year, Some(1875));
}

#[tokio::test]
async fn test_save_engagement_computes_admin_title() {
    let (_dir, pool) = setup_db().await;

    let person_id = save_person(&pool, &person("Jean", "Dupont")).await.unwrap();
    let glasswork_id = seed_glasswork(&pool, "Verrerie de Meisenthal", vec![]).await;
    save_function(&pool, &Function { id: 1, name: "Souffleur".to_string() })
        .await
        .unwrap();

    save_engagement(&pool, &engagement(glasswork_id, person_id, 1830, Some(1850)))
        .await
        .unwrap();

    let engagements = engagements_for_person(&pool, person_id).await.unwrap();
    assert_eq!(engagements.len(), 1);
    assert_eq!(
        engagements[0].admin_title.as_deref(),
        Some("Jean Dupont, Souffleur (1830 - 1850) - Verrerie de Meisenthal")
    );
    assert_eq!(engagements[0].function.as_ref().map(|f| f.name.as_str()), Some("Souffleur"));
}

#[tokio::test]
async fn test_engagements_group_oldest_first() {
    let (_dir, pool) = setup_db().await;

    let person_id = save_person(&pool, &person("Jean", "Dupont")).await.unwrap();
    let glasswork_id = seed_glasswork(&pool, "Verrerie de Meisenthal", vec![]).await;
    save_function(&pool, &Function { id: 1, name: "Souffleur".to_string() })
        .await
        .unwrap();

    save_engagement(&pool, &engagement(glasswork_id, person_id, 1850, None))
        .await
        .unwrap();
    save_engagement(&pool, &engagement(glasswork_id, person_id, 1830, Some(1845)))
        .await
        .unwrap();

    let engagements = engagements_for_glasswork(&pool, glasswork_id).await.unwrap();
    let groups = group_by_person(&engagements, EngagementKind::CraftOccupation);
    assert_eq!(groups.len(), 1);
    let years: Vec<Option<i32>> = groups[0].engagements.iter().map(|e| e.start_year).collect();
    assert_eq!(years, vec![Some(1830), Some(1850)]);
}

#[tokio::test]
async fn test_resaving_glasswork_keeps_engagements() {
    let (_dir, pool) = setup_db().await;

    let person_id = save_person(&pool, &person("Jean", "Dupont")).await.unwrap();
    let glasswork_id = seed_glasswork(&pool, "Verrerie de Meisenthal", vec![]).await;
    save_function(&pool, &Function { id: 1, name: "Souffleur".to_string() })
        .await
        .unwrap();
    save_engagement(&pool, &engagement(glasswork_id, person_id, 1830, None))
        .await
        .unwrap();

    save_glasswork(
        &pool,
        &GlassworkRecord {
            id: Some(glasswork_id),
            name: "Verrerie de Meisenthal".to_string(),
            techniques: Some("Verre soufflé".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    assert_eq!(engagements_for_glasswork(&pool, glasswork_id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_search_people_is_case_insensitive() {
    let (_dir, pool) = setup_db().await;

    save_person(&pool, &person("Jean", "Dupont")).await.unwrap();
    save_person(&pool, &person("Pierre", "Martin")).await.unwrap();

    let found = search_people(&pool, "DUPO", 50).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].display_name(), "Jean Dupont");

    assert!(search_people(&pool, "inconnu", 50).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_story_relations_and_pages() {
    let (_dir, pool) = setup_db().await;

    let person_id = save_person(&pool, &person("Jean", "Dupont")).await.unwrap();
    let glasswork_id = seed_glasswork(&pool, "Verrerie de Meisenthal", vec![]).await;
    save_story(
        &pool,
        &StoryRecord {
            title: "La dynastie Dupont".to_string(),
            related_people_ids: vec![person_id],
            related_glassworks_ids: vec![glasswork_id],
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let story = find_story_by_slug(&pool, "la-dynastie-dupont").await.unwrap().unwrap();
    assert_eq!(story.related_people.len(), 1);
    assert_eq!(story.related_glassworks[0].name, "Verrerie de Meisenthal");
    assert_eq!(list_stories(&pool, 3).await.unwrap().len(), 1);

    save_page(
        &pool,
        &PageRecord {
            title: "Mentions légales".to_string(),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    let page = find_page_by_slug(&pool, "mentions-legales").await.unwrap().unwrap();
    assert_eq!(page.title, "Mentions légales");
    assert_eq!(list_pages(&pool, 10).await.unwrap().len(), 1);
}
