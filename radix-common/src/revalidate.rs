//! Frontend revalidation client
//!
//! After content changes, the home page and the collection listing of the
//! changed collection are invalidated on the frontend through its
//! `POST /api/revalidate` endpoint.

use std::time::Duration;

use serde::Serialize;
use tracing::{error, info};

use crate::config::SiteConfig;
use crate::{Error, Result};

const USER_AGENT: &str = concat!("radix-vitri/", env!("CARGO_PKG_VERSION"));

#[derive(Serialize)]
struct RevalidateRequest<'a> {
    path: &'a str,
}

/// Paths invalidated when a collection changes
pub fn paths_for(collection: &str) -> [String; 2] {
    [
        "/".to_string(),
        format!("/{}", collection.trim_matches('/')),
    ]
}

pub struct RevalidationClient {
    http_client: reqwest::Client,
    endpoint: String,
    token: String,
}

impl RevalidationClient {
    pub fn new(frontend_url: &str, token: impl Into<String>) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            http_client,
            endpoint: format!("{}/api/revalidate", frontend_url.trim_end_matches('/')),
            token: token.into(),
        })
    }

    /// Client for the configured frontend, `None` when the frontend url or
    /// the token is missing
    pub fn from_config(config: &SiteConfig) -> Result<Option<Self>> {
        match (&config.frontend_url, &config.revalidation_token) {
            (Some(url), Some(token)) => Ok(Some(Self::new(url, token.clone())?)),
            _ => {
                error!("FRONTEND_URL or PAYLOAD_REVALIDATION_TOKEN missing, revalidation disabled");
                Ok(None)
            }
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Ask the frontend to rebuild one path
    pub async fn revalidate_path(&self, path: &str) -> Result<()> {
        let response = self
            .http_client
            .post(&self.endpoint)
            .bearer_auth(&self.token)
            .json(&RevalidateRequest { path })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Internal(format!(
                "Revalidation of {} failed ({}): {}",
                path, status, body
            )));
        }
        Ok(())
    }

    /// Invalidate the home page and the collection listing
    ///
    /// Failures are logged and never returned. Returns how many paths were
    /// revalidated.
    pub async fn notify(&self, collection: &str) -> usize {
        info!("Revalidating frontend after change in {}", collection);
        let mut revalidated = 0;
        for path in paths_for(collection) {
            match self.revalidate_path(&path).await {
                Ok(()) => {
                    info!("Revalidated path: {}", path);
                    revalidated += 1;
                }
                Err(e) => error!("Revalidation error for {}: {}", path, e),
            }
        }
        revalidated
    }
}
