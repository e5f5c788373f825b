//! In-memory page cache
//!
//! Rendered HTML is kept per request path (with its query string) for a
//! configured max age. The revalidation endpoint evicts entries so the next
//! request renders fresh content.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{Request, State},
    http::{Method, StatusCode},
    middleware::Next,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, error};

use crate::AppState;

/// Largest page body the cache will buffer
const MAX_CACHED_PAGE_BYTES: usize = 8 * 1024 * 1024;

/// Default number of pages kept at once
const DEFAULT_MAX_ENTRIES: usize = 1024;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Invalid path '{0}': must start with '/'")]
    InvalidPath(String),
}

struct CachedPage {
    html: String,
    stored_at: Instant,
}

pub struct PageCache {
    max_age: Duration,
    max_entries: usize,
    entries: RwLock<HashMap<String, CachedPage>>,
}

impl PageCache {
    /// A zero max age disables caching
    pub fn new(max_age: Duration) -> Self {
        Self::with_max_entries(max_age, DEFAULT_MAX_ENTRIES)
    }

    pub fn with_max_entries(max_age: Duration, max_entries: usize) -> Self {
        Self {
            max_age,
            max_entries,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.max_age.is_zero()
    }

    /// Fresh cached HTML for a key
    pub async fn get(&self, key: &str) -> Option<String> {
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|page| page.stored_at.elapsed() < self.max_age)
            .map(|page| page.html.clone())
    }

    pub async fn insert(&self, key: impl Into<String>, html: String) {
        if !self.is_enabled() {
            return;
        }
        let key = key.into();
        let mut entries = self.entries.write().await;
        entries.retain(|_, page| page.stored_at.elapsed() < self.max_age);

        // Full of fresh pages: drop the oldest
        while entries.len() >= self.max_entries && !entries.contains_key(&key) {
            let oldest = entries
                .iter()
                .min_by_key(|(_, page)| page.stored_at)
                .map(|(k, _)| k.clone());
            match oldest {
                Some(oldest) => {
                    entries.remove(&oldest);
                }
                None => break,
            }
        }

        entries.insert(
            key,
            CachedPage {
                html,
                stored_at: Instant::now(),
            },
        );
    }

    /// Number of stored pages, stale ones included
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn contains(&self, key: &str) -> bool {
        self.get(key).await.is_some()
    }

    /// Evict a path and its query-string variants
    ///
    /// Returns the number of evicted entries.
    pub async fn revalidate(&self, path: &str) -> Result<usize, CacheError> {
        if !path.starts_with('/') {
            return Err(CacheError::InvalidPath(path.to_string()));
        }
        let query_prefix = format!("{}?", path);
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|key, _| key != path && !key.starts_with(&query_prefix));
        Ok(before - entries.len())
    }
}

/// Middleware serving GET pages from the cache and storing fresh 200 pages
pub async fn cache_pages(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if request.method() != Method::GET || !state.cache.is_enabled() {
        return next.run(request).await;
    }

    let key = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());

    if let Some(html) = state.cache.get(&key).await {
        debug!("Page cache hit: {}", key);
        return Html(html).into_response();
    }

    let response = next.run(request).await;
    if response.status() != StatusCode::OK {
        return response;
    }

    let (parts, body) = response.into_parts();
    let bytes = match axum::body::to_bytes(body, MAX_CACHED_PAGE_BYTES).await {
        Ok(bytes) => bytes,
        Err(e) => {
            error!("Failed to buffer page {}: {}", key, e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };
    if let Ok(html) = std::str::from_utf8(&bytes) {
        state.cache.insert(key, html.to_string()).await;
    }
    Response::from_parts(parts, Body::from(bytes))
}
