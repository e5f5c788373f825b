//! Database initialization
//!
//! Creates the content schema on first run. Every statement is idempotent,
//! so opening an existing database runs the same sequence.

use crate::{Error, Result};
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Open (creating if needed) the content database and its tables
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    sqlx::query("PRAGMA foreign_keys = ON").execute(&pool).await?;
    sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;
    sqlx::query("PRAGMA busy_timeout = 5000").execute(&pool).await?;

    create_places_table(&pool).await?;
    create_functions_table(&pool).await?;
    create_people_table(&pool).await?;
    create_glassworks_table(&pool).await?;
    create_glasswork_founders_table(&pool).await?;
    create_engagements_table(&pool).await?;
    create_biographical_events_table(&pool).await?;
    create_stories_table(&pool).await?;
    create_story_links_tables(&pool).await?;
    create_pages_table(&pool).await?;

    Ok(pool)
}

/// Read-only pool for the web service
///
/// Fails when the database does not exist yet.
pub async fn connect_readonly(db_path: &Path) -> Result<SqlitePool> {
    if !db_path.exists() {
        return Err(Error::NotFound(format!(
            "Database not found: {}. Run radix-import first to create it.",
            db_path.display()
        )));
    }

    let db_url = format!("sqlite://{}?mode=ro", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect(&db_url)
        .await?;

    info!("Opened database read-only: {}", db_path.display());
    Ok(pool)
}

async fn create_places_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS places (
            id INTEGER PRIMARY KEY,
            slug TEXT,
            name TEXT,
            kind TEXT,
            address TEXT,
            town TEXT,
            postal_code TEXT,
            department TEXT,
            region TEXT,
            country TEXT,
            longitude REAL,
            latitude REAL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_functions_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS functions (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_people_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS people (
            id INTEGER PRIMARY KEY,
            slug TEXT,
            last_name TEXT,
            first_name TEXT,
            full_name TEXT,
            birth_date_text TEXT,
            birth_place_id INTEGER REFERENCES places(id) ON DELETE SET NULL,
            death_date_text TEXT,
            death_place_id INTEGER REFERENCES places(id) ON DELETE SET NULL,
            birth_year INTEGER,
            death_year INTEGER,
            principal_role TEXT,
            specialisation TEXT,
            main_activity_period TEXT,
            biography TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_people_slug ON people(slug)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Nested arrays (historical names, media, sources, production types) and
/// rich text are JSON text columns
async fn create_glassworks_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS glassworks (
            id INTEGER PRIMARY KEY,
            slug TEXT,
            name TEXT NOT NULL,
            historical_names TEXT NOT NULL DEFAULT '[]',
            period_text TEXT,
            founded_approx INTEGER,
            closed_approx INTEGER,
            start_year INTEGER,
            start_month INTEGER,
            start_precision TEXT,
            end_year INTEGER,
            end_month INTEGER,
            end_precision TEXT,
            status TEXT,
            status_notes TEXT,
            place_id INTEGER REFERENCES places(id) ON DELETE SET NULL,
            history TEXT,
            techniques TEXT,
            social_aspects TEXT,
            media TEXT NOT NULL DEFAULT '[]',
            sources TEXT NOT NULL DEFAULT '[]',
            production_types TEXT NOT NULL DEFAULT '[]',
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_glassworks_slug ON glassworks(slug)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_glasswork_founders_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS glasswork_founders (
            glasswork_id INTEGER NOT NULL REFERENCES glassworks(id) ON DELETE CASCADE,
            person_id INTEGER NOT NULL REFERENCES people(id) ON DELETE CASCADE,
            position INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (glasswork_id, person_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_engagements_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS engagements (
            id INTEGER PRIMARY KEY,
            glasswork_id INTEGER NOT NULL REFERENCES glassworks(id) ON DELETE CASCADE,
            person_id INTEGER NOT NULL REFERENCES people(id) ON DELETE CASCADE,
            kind TEXT NOT NULL,
            function_id INTEGER REFERENCES functions(id) ON DELETE SET NULL,
            start_year INTEGER,
            start_month INTEGER,
            start_precision TEXT,
            end_year INTEGER,
            end_month INTEGER,
            end_precision TEXT,
            description TEXT,
            admin_title TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_engagements_glasswork ON engagements(glasswork_id)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_engagements_person ON engagements(person_id)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_biographical_events_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS biographical_events (
            id INTEGER PRIMARY KEY,
            person_id INTEGER NOT NULL REFERENCES people(id) ON DELETE CASCADE,
            kind TEXT,
            date_text TEXT,
            year INTEGER,
            month INTEGER,
            day INTEGER,
            precision TEXT,
            place_id INTEGER REFERENCES places(id) ON DELETE SET NULL,
            description TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_stories_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS stories (
            id INTEGER PRIMARY KEY,
            slug TEXT,
            title TEXT NOT NULL,
            kind TEXT,
            summary TEXT,
            content TEXT,
            featured_image TEXT,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_story_links_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS story_people (
            story_id INTEGER NOT NULL REFERENCES stories(id) ON DELETE CASCADE,
            person_id INTEGER NOT NULL REFERENCES people(id) ON DELETE CASCADE,
            position INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (story_id, person_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS story_glassworks (
            story_id INTEGER NOT NULL REFERENCES stories(id) ON DELETE CASCADE,
            glasswork_id INTEGER NOT NULL REFERENCES glassworks(id) ON DELETE CASCADE,
            position INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (story_id, glasswork_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_pages_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS pages (
            id INTEGER PRIMARY KEY,
            slug TEXT,
            title TEXT NOT NULL,
            content TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
