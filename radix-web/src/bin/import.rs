//! radix-import - load a content bundle into the content database
//!
//! Reads a JSON bundle of places, functions, people, glassworks,
//! engagements, events, stories and pages, saves every record through the
//! store write path (slug, full-name and admin-title hooks included), then
//! asks the frontend to revalidate the collections that changed.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use radix_common::config::{ConfigOverrides, SiteConfig};
use radix_common::db::{
    init_database, save_engagement, save_event, save_function, save_glasswork, save_page,
    save_person, save_place, save_story, EngagementRecord, EventRecord, GlassworkRecord,
    PageRecord, PersonRecord, StoryRecord,
};
use radix_common::models::{Function, Place};
use radix_common::revalidate::RevalidationClient;
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for radix-import
#[derive(Parser, Debug)]
#[command(name = "radix-import")]
#[command(about = "Import a JSON content bundle into the Radix Vitri database")]
#[command(version)]
struct Args {
    /// JSON bundle to import
    bundle: PathBuf,

    /// Content database path (created if missing)
    #[arg(short, long, env = "RADIX_DATABASE")]
    database: Option<PathBuf>,

    /// Config file (default: platform config dir)
    #[arg(short, long, env = "RADIX_CONFIG")]
    config: Option<PathBuf>,

    /// Frontend to notify after the import
    #[arg(long, env = "FRONTEND_URL")]
    frontend_url: Option<String>,

    /// Bearer token of the frontend revalidation endpoint
    #[arg(long, env = "PAYLOAD_REVALIDATION_TOKEN", hide_env_values = true)]
    revalidation_token: Option<String>,

    /// Skip frontend revalidation
    #[arg(long)]
    no_revalidate: bool,
}

/// Content bundle; every collection is optional
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ContentBundle {
    places: Vec<Place>,
    functions: Vec<Function>,
    people: Vec<PersonRecord>,
    glassworks: Vec<GlassworkRecord>,
    engagements: Vec<EngagementRecord>,
    events: Vec<EventRecord>,
    stories: Vec<StoryRecord>,
    pages: Vec<PageRecord>,
}

impl ContentBundle {
    /// Frontend collection paths touched by this bundle
    fn changed_collections(&self) -> Vec<&'static str> {
        let mut collections = Vec::new();
        if !self.places.is_empty() {
            collections.push("lieux");
        }
        if !self.people.is_empty() {
            collections.extend(["verriers", "personnalites"]);
        }
        if !self.glassworks.is_empty() {
            collections.push("verreries");
        }
        if !self.engagements.is_empty() {
            collections.push("engagements");
        }
        if !self.stories.is_empty() {
            collections.push("histoires");
        }
        if !self.pages.is_empty() {
            collections.push("pages");
        }
        collections
    }
}

async fn import(pool: &SqlitePool, bundle: &ContentBundle) -> Result<()> {
    for place in &bundle.places {
        save_place(pool, place)
            .await
            .with_context(|| format!("Failed to save place {}", place.id))?;
    }
    for function in &bundle.functions {
        save_function(pool, function)
            .await
            .with_context(|| format!("Failed to save function {}", function.id))?;
    }
    for person in &bundle.people {
        save_person(pool, person)
            .await
            .with_context(|| format!("Failed to save person {:?}", person.id))?;
    }
    for glasswork in &bundle.glassworks {
        save_glasswork(pool, glasswork)
            .await
            .with_context(|| format!("Failed to save glasswork '{}'", glasswork.name))?;
    }
    for engagement in &bundle.engagements {
        save_engagement(pool, engagement).await.with_context(|| {
            format!(
                "Failed to save engagement of person {} at glasswork {}",
                engagement.person_id, engagement.glasswork_id
            )
        })?;
    }
    for event in &bundle.events {
        save_event(pool, event)
            .await
            .with_context(|| format!("Failed to save event of person {}", event.person_id))?;
    }
    for story in &bundle.stories {
        save_story(pool, story)
            .await
            .with_context(|| format!("Failed to save story '{}'", story.title))?;
    }
    for page in &bundle.pages {
        save_page(pool, page)
            .await
            .with_context(|| format!("Failed to save page '{}'", page.title))?;
    }

    info!(
        "Imported {} places, {} functions, {} people, {} glassworks, {} engagements, {} events, {} stories, {} pages",
        bundle.places.len(),
        bundle.functions.len(),
        bundle.people.len(),
        bundle.glassworks.len(),
        bundle.engagements.len(),
        bundle.events.len(),
        bundle.stories.len(),
        bundle.pages.len()
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "radix_import=info,radix_common=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting Radix Vitri import (radix-import) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let args = Args::parse();
    let overrides = ConfigOverrides {
        database_path: args.database.clone(),
        frontend_url: args.frontend_url.clone(),
        revalidation_token: args.revalidation_token.clone(),
        ..Default::default()
    };
    let config = SiteConfig::load(args.config.as_deref(), overrides)
        .context("Failed to load configuration")?;

    let content = std::fs::read_to_string(&args.bundle)
        .with_context(|| format!("Failed to read bundle {}", args.bundle.display()))?;
    let bundle: ContentBundle = serde_json::from_str(&content)
        .with_context(|| format!("Invalid bundle {}", args.bundle.display()))?;

    let pool = init_database(&config.database_path)
        .await
        .context("Failed to open content database")?;
    import(&pool, &bundle).await?;
    pool.close().await;

    if args.no_revalidate {
        info!("Frontend revalidation skipped");
        return Ok(());
    }
    match RevalidationClient::from_config(&config)? {
        Some(client) => {
            for collection in bundle.changed_collections() {
                client.notify(collection).await;
            }
        }
        None => warn!("Frontend not notified of the import"),
    }

    Ok(())
}
