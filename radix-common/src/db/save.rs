//! Write path
//!
//! Each save is an upsert keyed by id that runs the save-time hooks first:
//! slugs for named records, the full name of people, the admin title of
//! engagements. A record without an id is inserted and receives one.

use serde::Deserialize;
use serde_json::Value;
use sqlx::{Row, Sqlite, SqlitePool, Transaction};
use tracing::debug;

use crate::dates::{engagement_admin_title, format_period};
use crate::models::{
    ActivityPeriod, ApproxDate, BiographicalEventKind, EngagementKind, EventDate, Function,
    GlassworkStatus, HistoricalName, Id, Media, Place, PrincipalRole, Source, StoryKind,
};
use crate::slug::{derive_full_name, resolve_slug, NameFields};
use crate::Result;

/// Person as entered, relations by id
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PersonRecord {
    pub id: Option<Id>,
    pub slug: Option<String>,
    pub last_name: Option<String>,
    pub first_name: Option<String>,
    pub full_name: Option<String>,
    pub birth_date_text: Option<String>,
    pub birth_place_id: Option<Id>,
    pub death_date_text: Option<String>,
    pub death_place_id: Option<Id>,
    pub birth_year: Option<i32>,
    pub death_year: Option<i32>,
    pub principal_role: Option<PrincipalRole>,
    pub specialisation: Option<String>,
    pub main_activity_period: Option<String>,
    pub biography: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GlassworkRecord {
    pub id: Option<Id>,
    pub slug: Option<String>,
    pub name: String,
    pub historical_names: Vec<HistoricalName>,
    pub period: ActivityPeriod,
    pub status: Option<GlassworkStatus>,
    pub status_notes: Option<String>,
    pub place_id: Option<Id>,
    pub history: Option<Value>,
    pub techniques: Option<String>,
    pub social_aspects: Option<Value>,
    pub media: Vec<Media>,
    pub sources: Vec<Source>,
    pub founder_ids: Vec<Id>,
    pub production_types: Vec<String>,
    /// Defaults to the save time
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EngagementRecord {
    #[serde(default)]
    pub id: Option<Id>,
    pub glasswork_id: Id,
    pub person_id: Id,
    pub kind: EngagementKind,
    #[serde(default)]
    pub function_id: Option<Id>,
    #[serde(default)]
    pub start: ApproxDate,
    #[serde(default)]
    pub end: ApproxDate,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventRecord {
    #[serde(default)]
    pub id: Option<Id>,
    pub person_id: Id,
    #[serde(default)]
    pub kind: Option<BiographicalEventKind>,
    #[serde(default)]
    pub date_text: Option<String>,
    #[serde(default)]
    pub date: EventDate,
    #[serde(default)]
    pub place_id: Option<Id>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StoryRecord {
    pub id: Option<Id>,
    pub slug: Option<String>,
    pub title: String,
    pub kind: Option<StoryKind>,
    pub summary: Option<String>,
    pub content: Option<Value>,
    pub featured_image: Option<Media>,
    pub related_people_ids: Vec<Id>,
    pub related_glassworks_ids: Vec<Id>,
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PageRecord {
    pub id: Option<Id>,
    pub slug: Option<String>,
    pub title: String,
    pub content: Option<Value>,
}

fn json_text<T: serde::Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}

fn document_text(value: &Option<Value>) -> Result<Option<String>> {
    value.as_ref().map(json_text).transpose()
}

/// Slug currently stored for a record, if it exists
async fn existing_slug(pool: &SqlitePool, table: &'static str, id: Option<Id>) -> Result<Option<String>> {
    let Some(id) = id else {
        return Ok(None);
    };
    let sql = format!("SELECT slug FROM {} WHERE id = ?", table);
    Ok(sqlx::query_scalar::<_, Option<String>>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .flatten())
}

/// Explicit id, else the rowid the insert assigned
fn saved_id(explicit: Option<Id>, last_insert_rowid: i64) -> Id {
    explicit.unwrap_or(last_insert_rowid)
}

pub async fn save_place(pool: &SqlitePool, place: &Place) -> Result<Id> {
    let existing = existing_slug(pool, "places", Some(place.id)).await?;
    let slug = resolve_slug(
        &NameFields {
            explicit_slug: place.slug.as_deref(),
            name: place.name.as_deref().or(place.town.as_deref()),
            ..Default::default()
        },
        existing.as_deref(),
    );
    let (longitude, latitude) = match place.coordinates {
        Some([lon, lat]) => (Some(lon), Some(lat)),
        None => (None, None),
    };

    sqlx::query(
        r#"
        INSERT INTO places (id, slug, name, kind, address, town, postal_code, department,
                            region, country, longitude, latitude)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            slug = excluded.slug, name = excluded.name, kind = excluded.kind,
            address = excluded.address, town = excluded.town,
            postal_code = excluded.postal_code, department = excluded.department,
            region = excluded.region, country = excluded.country,
            longitude = excluded.longitude, latitude = excluded.latitude
        "#,
    )
    .bind(place.id)
    .bind(&slug)
    .bind(&place.name)
    .bind(&place.kind)
    .bind(&place.address)
    .bind(&place.town)
    .bind(&place.postal_code)
    .bind(&place.department)
    .bind(&place.region)
    .bind(&place.country)
    .bind(longitude)
    .bind(latitude)
    .execute(pool)
    .await?;

    Ok(place.id)
}

pub async fn save_function(pool: &SqlitePool, function: &Function) -> Result<Id> {
    sqlx::query(
        "INSERT INTO functions (id, name) VALUES (?, ?) \
         ON CONFLICT(id) DO UPDATE SET name = excluded.name",
    )
    .bind(function.id)
    .bind(&function.name)
    .execute(pool)
    .await?;

    Ok(function.id)
}

/// Save a person, deriving the full name and the slug
pub async fn save_person(pool: &SqlitePool, record: &PersonRecord) -> Result<Id> {
    let full_name = derive_full_name(
        record.full_name.as_deref(),
        record.first_name.as_deref(),
        record.last_name.as_deref(),
    );
    let existing = existing_slug(pool, "people", record.id).await?;
    let slug = resolve_slug(
        &NameFields {
            explicit_slug: record.slug.as_deref(),
            full_name: full_name.as_deref(),
            first_name: record.first_name.as_deref(),
            last_name: record.last_name.as_deref(),
            ..Default::default()
        },
        existing.as_deref(),
    );

    let result = sqlx::query(
        r#"
        INSERT INTO people (id, slug, last_name, first_name, full_name, birth_date_text,
                            birth_place_id, death_date_text, death_place_id, birth_year,
                            death_year, principal_role, specialisation, main_activity_period,
                            biography)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            slug = excluded.slug, last_name = excluded.last_name,
            first_name = excluded.first_name, full_name = excluded.full_name,
            birth_date_text = excluded.birth_date_text, birth_place_id = excluded.birth_place_id,
            death_date_text = excluded.death_date_text, death_place_id = excluded.death_place_id,
            birth_year = excluded.birth_year, death_year = excluded.death_year,
            principal_role = excluded.principal_role, specialisation = excluded.specialisation,
            main_activity_period = excluded.main_activity_period, biography = excluded.biography
        "#,
    )
    .bind(record.id)
    .bind(&slug)
    .bind(&record.last_name)
    .bind(&record.first_name)
    .bind(&full_name)
    .bind(&record.birth_date_text)
    .bind(record.birth_place_id)
    .bind(&record.death_date_text)
    .bind(record.death_place_id)
    .bind(record.birth_year)
    .bind(record.death_year)
    .bind(record.principal_role.map(|r| r.as_str()))
    .bind(&record.specialisation)
    .bind(&record.main_activity_period)
    .bind(document_text(&record.biography)?)
    .execute(pool)
    .await?;

    let id = saved_id(record.id, result.last_insert_rowid());
    debug!("Saved person {} ({:?})", id, slug);
    Ok(id)
}

/// Save a glasswork and replace its founder list
pub async fn save_glasswork(pool: &SqlitePool, record: &GlassworkRecord) -> Result<Id> {
    let existing = existing_slug(pool, "glassworks", record.id).await?;
    let slug = resolve_slug(
        &NameFields {
            explicit_slug: record.slug.as_deref(),
            name: Some(record.name.as_str()),
            ..Default::default()
        },
        existing.as_deref(),
    );
    let period = &record.period;

    let mut tx = pool.begin().await?;
    let result = sqlx::query(
        r#"
        INSERT INTO glassworks (id, slug, name, historical_names, period_text, founded_approx,
                                closed_approx, start_year, start_month, start_precision,
                                end_year, end_month, end_precision, status, status_notes,
                                place_id, history, techniques, social_aspects, media, sources,
                                production_types, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?,
                coalesce(?, CURRENT_TIMESTAMP))
        ON CONFLICT(id) DO UPDATE SET
            slug = excluded.slug, name = excluded.name,
            historical_names = excluded.historical_names, period_text = excluded.period_text,
            founded_approx = excluded.founded_approx, closed_approx = excluded.closed_approx,
            start_year = excluded.start_year, start_month = excluded.start_month,
            start_precision = excluded.start_precision, end_year = excluded.end_year,
            end_month = excluded.end_month, end_precision = excluded.end_precision,
            status = excluded.status, status_notes = excluded.status_notes,
            place_id = excluded.place_id, history = excluded.history,
            techniques = excluded.techniques, social_aspects = excluded.social_aspects,
            media = excluded.media, sources = excluded.sources,
            production_types = excluded.production_types, updated_at = excluded.updated_at
        "#,
    )
    .bind(record.id)
    .bind(&slug)
    .bind(&record.name)
    .bind(json_text(&record.historical_names)?)
    .bind(&period.text)
    .bind(period.founded_approx)
    .bind(period.closed_approx)
    .bind(period.start.year)
    .bind(period.start.month.map(i64::from))
    .bind(period.start.precision.map(|p| p.as_str()))
    .bind(period.end.year)
    .bind(period.end.month.map(i64::from))
    .bind(period.end.precision.map(|p| p.as_str()))
    .bind(record.status.map(|s| s.as_str()))
    .bind(&record.status_notes)
    .bind(record.place_id)
    .bind(document_text(&record.history)?)
    .bind(&record.techniques)
    .bind(document_text(&record.social_aspects)?)
    .bind(json_text(&record.media)?)
    .bind(json_text(&record.sources)?)
    .bind(json_text(&record.production_types)?)
    .bind(&record.updated_at)
    .execute(&mut *tx)
    .await?;
    let id = saved_id(record.id, result.last_insert_rowid());

    sqlx::query("DELETE FROM glasswork_founders WHERE glasswork_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    insert_links(&mut tx, "glasswork_founders", "glasswork_id", "person_id", id, &record.founder_ids).await?;

    tx.commit().await?;
    debug!("Saved glasswork {} ({:?})", id, slug);
    Ok(id)
}

/// Insert ordered link rows (owner, target, position)
async fn insert_links(
    tx: &mut Transaction<'_, Sqlite>,
    table: &'static str,
    owner_column: &'static str,
    target_column: &'static str,
    owner_id: Id,
    target_ids: &[Id],
) -> Result<()> {
    let sql = format!(
        "INSERT OR IGNORE INTO {} ({}, {}, position) VALUES (?, ?, ?)",
        table, owner_column, target_column
    );
    for (position, target_id) in target_ids.iter().enumerate() {
        sqlx::query(&sql)
            .bind(owner_id)
            .bind(*target_id)
            .bind(position as i64)
            .execute(&mut **tx)
            .await?;
    }
    Ok(())
}

/// Save an engagement with its computed admin title
pub async fn save_engagement(pool: &SqlitePool, record: &EngagementRecord) -> Result<Id> {
    let person: Option<String> = sqlx::query(
        "SELECT coalesce(nullif(full_name, ''), last_name) AS name FROM people WHERE id = ?",
    )
    .bind(record.person_id)
    .fetch_optional(pool)
    .await?
    .map(|row| row.try_get::<Option<String>, _>("name"))
    .transpose()?
    .flatten();

    let glasswork: Option<String> = sqlx::query_scalar("SELECT name FROM glassworks WHERE id = ?")
        .bind(record.glasswork_id)
        .fetch_optional(pool)
        .await?;

    let function: Option<String> = match record.function_id {
        Some(function_id) => sqlx::query_scalar("SELECT name FROM functions WHERE id = ?")
            .bind(function_id)
            .fetch_optional(pool)
            .await?,
        None => None,
    };

    let admin_title = engagement_admin_title(
        person.as_deref(),
        function.as_deref(),
        &format_period(&record.start, &record.end),
        glasswork.as_deref(),
        record.id,
    );

    let result = sqlx::query(
        r#"
        INSERT INTO engagements (id, glasswork_id, person_id, kind, function_id, start_year,
                                 start_month, start_precision, end_year, end_month,
                                 end_precision, description, admin_title)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            glasswork_id = excluded.glasswork_id, person_id = excluded.person_id,
            kind = excluded.kind, function_id = excluded.function_id,
            start_year = excluded.start_year, start_month = excluded.start_month,
            start_precision = excluded.start_precision, end_year = excluded.end_year,
            end_month = excluded.end_month, end_precision = excluded.end_precision,
            description = excluded.description, admin_title = excluded.admin_title
        "#,
    )
    .bind(record.id)
    .bind(record.glasswork_id)
    .bind(record.person_id)
    .bind(record.kind.as_str())
    .bind(record.function_id)
    .bind(record.start.year)
    .bind(record.start.month.map(i64::from))
    .bind(record.start.precision.map(|p| p.as_str()))
    .bind(record.end.year)
    .bind(record.end.month.map(i64::from))
    .bind(record.end.precision.map(|p| p.as_str()))
    .bind(&record.description)
    .bind(&admin_title)
    .execute(pool)
    .await?;

    let id = saved_id(record.id, result.last_insert_rowid());
    debug!("Saved engagement {}: {}", id, admin_title);
    Ok(id)
}

pub async fn save_event(pool: &SqlitePool, record: &EventRecord) -> Result<Id> {
    let result = sqlx::query(
        r#"
        INSERT INTO biographical_events (id, person_id, kind, date_text, year, month, day,
                                         precision, place_id, description)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            person_id = excluded.person_id, kind = excluded.kind,
            date_text = excluded.date_text, year = excluded.year, month = excluded.month,
            day = excluded.day, precision = excluded.precision,
            place_id = excluded.place_id, description = excluded.description
        "#,
    )
    .bind(record.id)
    .bind(record.person_id)
    .bind(record.kind.map(|k| k.as_str()))
    .bind(&record.date_text)
    .bind(record.date.year)
    .bind(record.date.month.map(i64::from))
    .bind(record.date.day.map(i64::from))
    .bind(record.date.precision.map(|p| p.as_str()))
    .bind(record.place_id)
    .bind(&record.description)
    .execute(pool)
    .await?;

    Ok(saved_id(record.id, result.last_insert_rowid()))
}

/// Save a story and replace its related people and glassworks
pub async fn save_story(pool: &SqlitePool, record: &StoryRecord) -> Result<Id> {
    let existing = existing_slug(pool, "stories", record.id).await?;
    let slug = resolve_slug(
        &NameFields {
            explicit_slug: record.slug.as_deref(),
            name: Some(record.title.as_str()),
            ..Default::default()
        },
        existing.as_deref(),
    );
    let featured_image = record.featured_image.as_ref().map(json_text).transpose()?;

    let mut tx = pool.begin().await?;
    let result = sqlx::query(
        r#"
        INSERT INTO stories (id, slug, title, kind, summary, content, featured_image, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, coalesce(?, CURRENT_TIMESTAMP))
        ON CONFLICT(id) DO UPDATE SET
            slug = excluded.slug, title = excluded.title, kind = excluded.kind,
            summary = excluded.summary, content = excluded.content,
            featured_image = excluded.featured_image, updated_at = excluded.updated_at
        "#,
    )
    .bind(record.id)
    .bind(&slug)
    .bind(&record.title)
    .bind(record.kind.map(|k| k.as_str()))
    .bind(&record.summary)
    .bind(document_text(&record.content)?)
    .bind(featured_image)
    .bind(&record.updated_at)
    .execute(&mut *tx)
    .await?;
    let id = saved_id(record.id, result.last_insert_rowid());

    for table in ["story_people", "story_glassworks"] {
        sqlx::query(&format!("DELETE FROM {} WHERE story_id = ?", table))
            .bind(id)
            .execute(&mut *tx)
            .await?;
    }
    insert_links(&mut tx, "story_people", "story_id", "person_id", id, &record.related_people_ids).await?;
    insert_links(
        &mut tx,
        "story_glassworks",
        "story_id",
        "glasswork_id",
        id,
        &record.related_glassworks_ids,
    )
    .await?;

    tx.commit().await?;
    Ok(id)
}

pub async fn save_page(pool: &SqlitePool, record: &PageRecord) -> Result<Id> {
    let existing = existing_slug(pool, "pages", record.id).await?;
    let slug = resolve_slug(
        &NameFields {
            explicit_slug: record.slug.as_deref(),
            name: Some(record.title.as_str()),
            ..Default::default()
        },
        existing.as_deref(),
    );

    let result = sqlx::query(
        r#"
        INSERT INTO pages (id, slug, title, content) VALUES (?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            slug = excluded.slug, title = excluded.title, content = excluded.content
        "#,
    )
    .bind(record.id)
    .bind(&slug)
    .bind(&record.title)
    .bind(document_text(&record.content)?)
    .execute(pool)
    .await?;

    Ok(saved_id(record.id, result.last_insert_rowid()))
}
