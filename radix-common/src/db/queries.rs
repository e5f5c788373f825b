//! Read queries
//!
//! Relations come back populated: places are joined in, person and
//! glasswork references carry their display names, founders and story
//! relations are attached in one extra query per list.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde_json::Value;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use tracing::warn;

use crate::models::{
    ActivityPeriod, ApproxDate, BiographicalEvent, BiographicalEventKind, DatePrecision,
    Engagement, EngagementKind, EventDate, EventPrecision, Function, Glasswork, GlassworkRef,
    GlassworkStatus, Id, Media, Page, Person, PersonRef, Place, PrincipalRole, Story, StoryKind,
};
use crate::Result;

// ========================================
// Column helpers
// ========================================

const PLACE_COLUMNS: [&str; 12] = [
    "id",
    "slug",
    "name",
    "kind",
    "address",
    "town",
    "postal_code",
    "department",
    "region",
    "country",
    "longitude",
    "latitude",
];

/// `alias.col AS prefixcol` for every place column
fn place_select(alias: &str, prefix: &str) -> String {
    PLACE_COLUMNS
        .iter()
        .map(|c| format!("{alias}.{c} AS {prefix}{c}"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

fn opt_string(row: &SqliteRow, col: &str) -> Result<Option<String>> {
    Ok(row.try_get::<Option<String>, _>(col)?)
}

fn opt_i32(row: &SqliteRow, col: &str) -> Result<Option<i32>> {
    Ok(row
        .try_get::<Option<i64>, _>(col)?
        .and_then(|v| i32::try_from(v).ok()))
}

fn opt_u32(row: &SqliteRow, col: &str) -> Result<Option<u32>> {
    Ok(row
        .try_get::<Option<i64>, _>(col)?
        .and_then(|v| u32::try_from(v).ok()))
}

/// JSON array column; NULL, blank or malformed reads as empty
fn json_list<T: DeserializeOwned>(row: &SqliteRow, col: &str) -> Result<Vec<T>> {
    let text = match opt_string(row, col)? {
        Some(text) if !text.trim().is_empty() => text,
        _ => return Ok(Vec::new()),
    };
    match serde_json::from_str(&text) {
        Ok(list) => Ok(list),
        Err(e) => {
            warn!("Malformed JSON list in column {}: {}", col, e);
            Ok(Vec::new())
        }
    }
}

/// Rich-text column. Malformed JSON reads as absent so the page shows the
/// placeholder instead of failing.
fn json_document(row: &SqliteRow, col: &str) -> Result<Option<Value>> {
    let text = match opt_string(row, col)? {
        Some(text) if !text.trim().is_empty() => text,
        _ => return Ok(None),
    };
    match serde_json::from_str(&text) {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            warn!("Malformed JSON in column {}: {}", col, e);
            Ok(None)
        }
    }
}

fn approx_date(row: &SqliteRow, prefix: &str) -> Result<ApproxDate> {
    Ok(ApproxDate {
        year: opt_i32(row, &format!("{prefix}year"))?,
        month: opt_u32(row, &format!("{prefix}month"))?,
        precision: opt_string(row, &format!("{prefix}precision"))?
            .and_then(|p| DatePrecision::parse(&p)),
    })
}

fn place_from_row(row: &SqliteRow, prefix: &str) -> Result<Option<Place>> {
    let col = |name: &str| format!("{prefix}{name}");
    let id: Option<i64> = row.try_get(col("id").as_str())?;
    let Some(id) = id else {
        return Ok(None);
    };
    let longitude: Option<f64> = row.try_get(col("longitude").as_str())?;
    let latitude: Option<f64> = row.try_get(col("latitude").as_str())?;

    Ok(Some(Place {
        id,
        slug: opt_string(row, &col("slug"))?,
        name: opt_string(row, &col("name"))?,
        kind: opt_string(row, &col("kind"))?,
        address: opt_string(row, &col("address"))?,
        town: opt_string(row, &col("town"))?,
        postal_code: opt_string(row, &col("postal_code"))?,
        department: opt_string(row, &col("department"))?,
        region: opt_string(row, &col("region"))?,
        country: opt_string(row, &col("country"))?,
        coordinates: match (longitude, latitude) {
            (Some(lon), Some(lat)) => Some([lon, lat]),
            _ => None,
        },
    }))
}

/// Display name from the three name columns of a person
fn person_name(full: Option<String>, first: Option<String>, last: Option<String>) -> String {
    Person {
        full_name: full,
        first_name: first,
        last_name: last,
        ..Default::default()
    }
    .display_name()
}

/// Person reference from `{prefix}id`, `{prefix}slug` and the name columns
fn person_ref_from_row(row: &SqliteRow, prefix: &str) -> Result<PersonRef> {
    let col = |name: &str| format!("{prefix}{name}");
    Ok(PersonRef {
        id: row.try_get(col("id").as_str())?,
        slug: opt_string(row, &col("slug"))?,
        name: person_name(
            opt_string(row, &col("full_name"))?,
            opt_string(row, &col("first_name"))?,
            opt_string(row, &col("last_name"))?,
        ),
    })
}

/// Glasswork reference from `glasswork_id/slug/name` and `gp_` place columns
fn glasswork_ref_from_row(row: &SqliteRow) -> Result<GlassworkRef> {
    Ok(GlassworkRef {
        id: row.try_get("glasswork_id")?,
        slug: opt_string(row, "glasswork_slug")?,
        name: row
            .try_get::<Option<String>, _>("glasswork_name")?
            .unwrap_or_default(),
        place: place_from_row(row, "gp_")?,
    })
}

// ========================================
// Glassworks
// ========================================

fn glasswork_select() -> String {
    format!(
        "SELECT g.*, {} FROM glassworks g LEFT JOIN places gp ON gp.id = g.place_id",
        place_select("gp", "gp_")
    )
}

fn glasswork_from_row(row: &SqliteRow) -> Result<Glasswork> {
    Ok(Glasswork {
        id: row.try_get("id")?,
        slug: opt_string(row, "slug")?,
        name: row.try_get("name")?,
        historical_names: json_list(row, "historical_names")?,
        period: ActivityPeriod {
            text: opt_string(row, "period_text")?,
            founded_approx: opt_i32(row, "founded_approx")?,
            closed_approx: opt_i32(row, "closed_approx")?,
            start: approx_date(row, "start_")?,
            end: approx_date(row, "end_")?,
        },
        status: opt_string(row, "status")?.and_then(|s| GlassworkStatus::parse(&s)),
        status_notes: opt_string(row, "status_notes")?,
        place: place_from_row(row, "gp_")?,
        history: json_document(row, "history")?,
        techniques: opt_string(row, "techniques")?,
        social_aspects: json_document(row, "social_aspects")?,
        media: json_list(row, "media")?,
        sources: json_list(row, "sources")?,
        founders: Vec::new(),
        production_types: json_list(row, "production_types")?,
        updated_at: opt_string(row, "updated_at")?,
    })
}

/// Founders of each glasswork, in their stored order
async fn load_founders(pool: &SqlitePool, glasswork_ids: &[Id]) -> Result<HashMap<Id, Vec<PersonRef>>> {
    let mut founders: HashMap<Id, Vec<PersonRef>> = HashMap::new();
    if glasswork_ids.is_empty() {
        return Ok(founders);
    }

    let sql = format!(
        r#"
        SELECT f.glasswork_id, p.id AS person_id, p.slug AS person_slug,
               p.full_name AS person_full_name, p.first_name AS person_first_name,
               p.last_name AS person_last_name
        FROM glasswork_founders f
        JOIN people p ON p.id = f.person_id
        WHERE f.glasswork_id IN ({})
        ORDER BY f.glasswork_id, f.position, p.id
        "#,
        placeholders(glasswork_ids.len())
    );
    let mut query = sqlx::query(&sql);
    for id in glasswork_ids {
        query = query.bind(*id);
    }

    for row in query.fetch_all(pool).await? {
        let glasswork_id: Id = row.try_get("glasswork_id")?;
        founders
            .entry(glasswork_id)
            .or_default()
            .push(person_ref_from_row(&row, "person_")?);
    }
    Ok(founders)
}

async fn with_founders(pool: &SqlitePool, rows: Vec<SqliteRow>) -> Result<Vec<Glasswork>> {
    let mut glassworks = rows
        .iter()
        .map(glasswork_from_row)
        .collect::<Result<Vec<_>>>()?;
    let ids: Vec<Id> = glassworks.iter().map(|g| g.id).collect();
    let mut founders = load_founders(pool, &ids).await?;
    for glasswork in &mut glassworks {
        glasswork.founders = founders.remove(&glasswork.id).unwrap_or_default();
    }
    Ok(glassworks)
}

pub async fn find_glasswork_by_slug(pool: &SqlitePool, slug: &str) -> Result<Option<Glasswork>> {
    let sql = format!("{} WHERE g.slug = ? ORDER BY g.id LIMIT 1", glasswork_select());
    let rows: Vec<SqliteRow> = sqlx::query(&sql).bind(slug).fetch_all(pool).await?;
    Ok(with_founders(pool, rows).await?.into_iter().next())
}

/// Catalogue, sorted by name
pub async fn list_glassworks(pool: &SqlitePool) -> Result<Vec<Glasswork>> {
    let sql = format!("{} ORDER BY g.name COLLATE NOCASE, g.id", glasswork_select());
    let rows = sqlx::query(&sql).fetch_all(pool).await?;
    with_founders(pool, rows).await
}

/// Most recently updated first
pub async fn recent_glassworks(pool: &SqlitePool, limit: i64) -> Result<Vec<Glasswork>> {
    let sql = format!(
        "{} ORDER BY g.updated_at DESC, g.id DESC LIMIT ?",
        glasswork_select()
    );
    let rows = sqlx::query(&sql).bind(limit).fetch_all(pool).await?;
    with_founders(pool, rows).await
}

/// Glassworks whose place has coordinates, for map markers
pub async fn glassworks_with_coordinates(pool: &SqlitePool) -> Result<Vec<GlassworkRef>> {
    let sql = format!(
        r#"
        SELECT g.id AS glasswork_id, g.slug AS glasswork_slug, g.name AS glasswork_name, {}
        FROM glassworks g
        JOIN places gp ON gp.id = g.place_id
        WHERE gp.longitude IS NOT NULL AND gp.latitude IS NOT NULL
        ORDER BY g.name COLLATE NOCASE
        "#,
        place_select("gp", "gp_")
    );
    sqlx::query(&sql)
        .fetch_all(pool)
        .await?
        .iter()
        .map(glasswork_ref_from_row)
        .collect()
}

/// Glassworks founded by any of the given people, as (founder id, glasswork)
pub async fn glassworks_founded_by(pool: &SqlitePool, person_ids: &[Id]) -> Result<Vec<(Id, Glasswork)>> {
    if person_ids.is_empty() {
        return Ok(Vec::new());
    }
    let sql = format!(
        r#"
        SELECT f.person_id AS founder_id, g.*, {}
        FROM glasswork_founders f
        JOIN glassworks g ON g.id = f.glasswork_id
        LEFT JOIN places gp ON gp.id = g.place_id
        WHERE f.person_id IN ({})
        ORDER BY f.person_id, g.id
        "#,
        place_select("gp", "gp_"),
        placeholders(person_ids.len())
    );
    let mut query = sqlx::query(&sql);
    for id in person_ids {
        query = query.bind(*id);
    }

    query
        .fetch_all(pool)
        .await?
        .iter()
        .map(|row| -> Result<(Id, Glasswork)> {
            let founder_id: Id = row.try_get("founder_id")?;
            Ok((founder_id, glasswork_from_row(row)?))
        })
        .collect()
}

// ========================================
// People
// ========================================

fn person_select() -> String {
    format!(
        r#"
        SELECT p.*, {}, {}
        FROM people p
        LEFT JOIN places bp ON bp.id = p.birth_place_id
        LEFT JOIN places dp ON dp.id = p.death_place_id
        "#,
        place_select("bp", "bp_"),
        place_select("dp", "dp_")
    )
}

fn person_from_row(row: &SqliteRow) -> Result<Person> {
    Ok(Person {
        id: row.try_get("id")?,
        slug: opt_string(row, "slug")?,
        last_name: opt_string(row, "last_name")?,
        first_name: opt_string(row, "first_name")?,
        full_name: opt_string(row, "full_name")?,
        birth_date_text: opt_string(row, "birth_date_text")?,
        birth_place: place_from_row(row, "bp_")?,
        death_date_text: opt_string(row, "death_date_text")?,
        death_place: place_from_row(row, "dp_")?,
        birth_year: opt_i32(row, "birth_year")?,
        death_year: opt_i32(row, "death_year")?,
        principal_role: opt_string(row, "principal_role")?.and_then(|r| PrincipalRole::parse(&r)),
        specialisation: opt_string(row, "specialisation")?,
        main_activity_period: opt_string(row, "main_activity_period")?,
        biography: json_document(row, "biography")?,
    })
}

pub async fn find_person_by_slug(pool: &SqlitePool, slug: &str) -> Result<Option<Person>> {
    let sql = format!("{} WHERE p.slug = ? ORDER BY p.id LIMIT 1", person_select());
    sqlx::query(&sql)
        .bind(slug)
        .fetch_optional(pool)
        .await?
        .as_ref()
        .map(person_from_row)
        .transpose()
}

/// Case-insensitive substring match on the full name
pub async fn search_people(pool: &SqlitePool, term: &str, limit: i64) -> Result<Vec<Person>> {
    let sql = format!(
        "{} WHERE instr(lower(coalesce(p.full_name, '')), lower(?)) > 0 \
         ORDER BY p.full_name COLLATE NOCASE, p.id LIMIT ?",
        person_select()
    );
    sqlx::query(&sql)
        .bind(term.trim())
        .bind(limit)
        .fetch_all(pool)
        .await?
        .iter()
        .map(person_from_row)
        .collect()
}

// ========================================
// Engagements and events
// ========================================

fn engagement_select() -> String {
    format!(
        r#"
        SELECT e.id, e.kind, e.function_id, e.start_year, e.start_month, e.start_precision,
               e.end_year, e.end_month, e.end_precision, e.description, e.admin_title,
               fu.name AS function_name,
               g.id AS glasswork_id, g.slug AS glasswork_slug, g.name AS glasswork_name,
               p.id AS person_id, p.slug AS person_slug, p.full_name AS person_full_name,
               p.first_name AS person_first_name, p.last_name AS person_last_name,
               {}
        FROM engagements e
        JOIN glassworks g ON g.id = e.glasswork_id
        JOIN people p ON p.id = e.person_id
        LEFT JOIN functions fu ON fu.id = e.function_id
        LEFT JOIN places gp ON gp.id = g.place_id
        "#,
        place_select("gp", "gp_")
    )
}

/// `None` for rows with an unknown role category
fn engagement_from_row(row: &SqliteRow) -> Result<Option<Engagement>> {
    let id: Id = row.try_get("id")?;
    let kind_value: String = row.try_get("kind")?;
    let Some(kind) = EngagementKind::parse(&kind_value) else {
        warn!("Skipping engagement {} with unknown kind '{}'", id, kind_value);
        return Ok(None);
    };

    let function_id: Option<Id> = row.try_get("function_id")?;
    let function = match (function_id, opt_string(row, "function_name")?) {
        (Some(id), Some(name)) => Some(Function { id, name }),
        _ => None,
    };

    Ok(Some(Engagement {
        id: id.to_string(),
        glasswork: glasswork_ref_from_row(row)?,
        person: person_ref_from_row(row, "person_")?,
        kind,
        function,
        start: approx_date(row, "start_")?,
        end: approx_date(row, "end_")?,
        description: opt_string(row, "description")?,
        admin_title: opt_string(row, "admin_title")?,
    }))
}

async fn fetch_engagements(pool: &SqlitePool, filter: &str, ids: &[Id]) -> Result<Vec<Engagement>> {
    let sql = format!("{} WHERE {} ORDER BY e.id", engagement_select(), filter);
    let mut query = sqlx::query(&sql);
    for id in ids {
        query = query.bind(*id);
    }
    let mut engagements = Vec::new();
    for row in query.fetch_all(pool).await? {
        if let Some(engagement) = engagement_from_row(&row)? {
            engagements.push(engagement);
        }
    }
    Ok(engagements)
}

pub async fn engagements_for_glasswork(pool: &SqlitePool, glasswork_id: Id) -> Result<Vec<Engagement>> {
    fetch_engagements(pool, "e.glasswork_id = ?", &[glasswork_id]).await
}

pub async fn engagements_for_person(pool: &SqlitePool, person_id: Id) -> Result<Vec<Engagement>> {
    fetch_engagements(pool, "e.person_id = ?", &[person_id]).await
}

pub async fn engagements_for_people(pool: &SqlitePool, person_ids: &[Id]) -> Result<Vec<Engagement>> {
    if person_ids.is_empty() {
        return Ok(Vec::new());
    }
    let filter = format!("e.person_id IN ({})", placeholders(person_ids.len()));
    fetch_engagements(pool, &filter, person_ids).await
}

pub async fn events_for_person(pool: &SqlitePool, person_id: Id) -> Result<Vec<BiographicalEvent>> {
    let sql = format!(
        r#"
        SELECT ev.*, {}
        FROM biographical_events ev
        LEFT JOIN places pl ON pl.id = ev.place_id
        WHERE ev.person_id = ?
        ORDER BY ev.id
        "#,
        place_select("pl", "pl_")
    );

    sqlx::query(&sql)
        .bind(person_id)
        .fetch_all(pool)
        .await?
        .iter()
        .map(|row| -> Result<BiographicalEvent> {
            Ok(BiographicalEvent {
                id: row.try_get("id")?,
                person_id: row.try_get("person_id")?,
                kind: opt_string(row, "kind")?.and_then(|k| BiographicalEventKind::parse(&k)),
                date_text: opt_string(row, "date_text")?,
                date: EventDate {
                    year: opt_i32(row, "year")?,
                    month: opt_u32(row, "month")?,
                    day: opt_u32(row, "day")?,
                    precision: opt_string(row, "precision")?.and_then(|p| EventPrecision::parse(&p)),
                },
                place: place_from_row(row, "pl_")?,
                description: opt_string(row, "description")?,
            })
        })
        .collect()
}

// ========================================
// Stories and pages
// ========================================

fn story_from_row(row: &SqliteRow) -> Result<Story> {
    let featured_image = match json_document(row, "featured_image")? {
        Some(value) => serde_json::from_value::<Media>(value).ok(),
        None => None,
    };
    Ok(Story {
        id: row.try_get("id")?,
        slug: opt_string(row, "slug")?,
        title: row.try_get("title")?,
        kind: opt_string(row, "kind")?.and_then(|k| StoryKind::parse(&k)),
        summary: opt_string(row, "summary")?,
        content: json_document(row, "content")?,
        featured_image,
        related_people: Vec::new(),
        related_glassworks: Vec::new(),
        updated_at: opt_string(row, "updated_at")?,
    })
}

async fn with_story_relations(pool: &SqlitePool, rows: Vec<SqliteRow>) -> Result<Vec<Story>> {
    let mut stories = rows.iter().map(story_from_row).collect::<Result<Vec<_>>>()?;
    if stories.is_empty() {
        return Ok(stories);
    }
    let ids: Vec<Id> = stories.iter().map(|s| s.id).collect();

    let people_sql = format!(
        r#"
        SELECT sp.story_id, p.id AS person_id, p.slug AS person_slug,
               p.full_name AS person_full_name, p.first_name AS person_first_name,
               p.last_name AS person_last_name
        FROM story_people sp
        JOIN people p ON p.id = sp.person_id
        WHERE sp.story_id IN ({})
        ORDER BY sp.story_id, sp.position
        "#,
        placeholders(ids.len())
    );
    let mut query = sqlx::query(&people_sql);
    for id in &ids {
        query = query.bind(*id);
    }
    let mut people: HashMap<Id, Vec<PersonRef>> = HashMap::new();
    for row in query.fetch_all(pool).await? {
        let story_id: Id = row.try_get("story_id")?;
        people
            .entry(story_id)
            .or_default()
            .push(person_ref_from_row(&row, "person_")?);
    }

    let glassworks_sql = format!(
        r#"
        SELECT sg.story_id, g.id AS glasswork_id, g.slug AS glasswork_slug,
               g.name AS glasswork_name, {}
        FROM story_glassworks sg
        JOIN glassworks g ON g.id = sg.glasswork_id
        LEFT JOIN places gp ON gp.id = g.place_id
        WHERE sg.story_id IN ({})
        ORDER BY sg.story_id, sg.position
        "#,
        place_select("gp", "gp_"),
        placeholders(ids.len())
    );
    let mut query = sqlx::query(&glassworks_sql);
    for id in &ids {
        query = query.bind(*id);
    }
    let mut glassworks: HashMap<Id, Vec<GlassworkRef>> = HashMap::new();
    for row in query.fetch_all(pool).await? {
        let story_id: Id = row.try_get("story_id")?;
        glassworks
            .entry(story_id)
            .or_default()
            .push(glasswork_ref_from_row(&row)?);
    }

    for story in &mut stories {
        story.related_people = people.remove(&story.id).unwrap_or_default();
        story.related_glassworks = glassworks.remove(&story.id).unwrap_or_default();
    }
    Ok(stories)
}

pub async fn find_story_by_slug(pool: &SqlitePool, slug: &str) -> Result<Option<Story>> {
    let rows = sqlx::query("SELECT * FROM stories WHERE slug = ? ORDER BY id LIMIT 1")
        .bind(slug)
        .fetch_all(pool)
        .await?;
    Ok(with_story_relations(pool, rows).await?.into_iter().next())
}

/// Most recently updated first
pub async fn list_stories(pool: &SqlitePool, limit: i64) -> Result<Vec<Story>> {
    let rows = sqlx::query("SELECT * FROM stories ORDER BY updated_at DESC, id DESC LIMIT ?")
        .bind(limit)
        .fetch_all(pool)
        .await?;
    with_story_relations(pool, rows).await
}

fn page_from_row(row: &SqliteRow) -> Result<Page> {
    Ok(Page {
        id: row.try_get("id")?,
        slug: opt_string(row, "slug")?,
        title: row.try_get("title")?,
        content: json_document(row, "content")?,
    })
}

pub async fn find_page_by_slug(pool: &SqlitePool, slug: &str) -> Result<Option<Page>> {
    sqlx::query("SELECT * FROM pages WHERE slug = ? ORDER BY id LIMIT 1")
        .bind(slug)
        .fetch_optional(pool)
        .await?
        .as_ref()
        .map(page_from_row)
        .transpose()
}

pub async fn list_pages(pool: &SqlitePool, limit: i64) -> Result<Vec<Page>> {
    sqlx::query("SELECT * FROM pages ORDER BY id LIMIT ?")
        .bind(limit)
        .fetch_all(pool)
        .await?
        .iter()
        .map(page_from_row)
        .collect()
}
