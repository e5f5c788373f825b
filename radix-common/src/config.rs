//! Site configuration
//!
//! Each setting resolves in priority order:
//! 1. Command-line argument or environment variable (clap merges both)
//! 2. TOML config file
//! 3. Compiled default

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_MEDIA_BASE_URL: &str = "http://localhost:3000";
pub const DEFAULT_CACHE_MAX_AGE_SECS: u64 = 60;

/// Settings as written in `config.toml`; every key is optional
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub bind_addr: Option<String>,
    pub port: Option<u16>,
    pub database_path: Option<PathBuf>,
    pub media_base_url: Option<String>,
    pub revalidation_token: Option<String>,
    pub frontend_url: Option<String>,
    pub cache_max_age_secs: Option<u64>,
}

/// Values supplied on the command line or through the environment
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub bind_addr: Option<String>,
    pub port: Option<u16>,
    pub database_path: Option<PathBuf>,
    pub media_base_url: Option<String>,
    pub revalidation_token: Option<String>,
    pub frontend_url: Option<String>,
    pub cache_max_age_secs: Option<u64>,
}

/// Resolved configuration of the site
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteConfig {
    pub bind_addr: String,
    pub port: u16,
    pub database_path: PathBuf,
    /// Prefix for media urls that are stored relative
    pub media_base_url: String,
    /// Shared secret of the revalidation endpoint. `None` rejects every call.
    pub revalidation_token: Option<String>,
    /// Frontend notified after content imports
    pub frontend_url: Option<String>,
    pub cache_max_age_secs: u64,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self::resolve(ConfigOverrides::default(), TomlConfig::default())
    }
}

impl SiteConfig {
    /// Merge overrides over the TOML file over compiled defaults
    pub fn resolve(overrides: ConfigOverrides, file: TomlConfig) -> Self {
        Self {
            bind_addr: overrides
                .bind_addr
                .or(file.bind_addr)
                .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            port: overrides.port.or(file.port).unwrap_or(DEFAULT_PORT),
            database_path: overrides
                .database_path
                .or(file.database_path)
                .unwrap_or_else(default_database_path),
            media_base_url: overrides
                .media_base_url
                .or(file.media_base_url)
                .unwrap_or_else(|| DEFAULT_MEDIA_BASE_URL.to_string()),
            revalidation_token: non_empty(overrides.revalidation_token)
                .or_else(|| non_empty(file.revalidation_token)),
            frontend_url: non_empty(overrides.frontend_url).or_else(|| non_empty(file.frontend_url)),
            cache_max_age_secs: overrides
                .cache_max_age_secs
                .or(file.cache_max_age_secs)
                .unwrap_or(DEFAULT_CACHE_MAX_AGE_SECS),
        }
    }

    /// Load the TOML file (explicit path, else the platform location) and
    /// apply the overrides
    ///
    /// A missing platform config file is not an error: defaults apply. An
    /// explicit path that cannot be read is.
    pub fn load(explicit_path: Option<&Path>, overrides: ConfigOverrides) -> Result<Self> {
        let file = match explicit_path {
            Some(path) => load_toml_config(path)?,
            None => match find_config_file() {
                Some(path) => load_toml_config(&path)?,
                None => {
                    warn!("No config file found, using defaults");
                    TomlConfig::default()
                }
            },
        };
        Ok(Self::resolve(overrides, file))
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Cannot read {}: {}", path.display(), e)))?;
    let config = toml::from_str::<TomlConfig>(&content)
        .map_err(|e| Error::Config(format!("Invalid TOML in {}: {}", path.display(), e)))?;
    info!("Loaded config file: {}", path.display());
    Ok(config)
}

/// Platform config file location, if one exists
///
/// Linux looks in `~/.config/radix-vitri/config.toml` then
/// `/etc/radix-vitri/config.toml`; other platforms use their config dir.
pub fn find_config_file() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("radix-vitri").join("config.toml"));
    if let Some(path) = user_config.filter(|p| p.exists()) {
        return Some(path);
    }
    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/radix-vitri/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }
    None
}

/// OS-dependent default location of the content database
pub fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("radix-vitri"))
        .unwrap_or_else(|| PathBuf::from("./radix_data"))
        .join("radix.db")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SiteConfig::default();
        assert_eq!(config.bind_addr, DEFAULT_BIND_ADDR);
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.revalidation_token, None);
        assert_eq!(config.cache_max_age_secs, 60);
        assert!(config.database_path.ends_with("radix.db"));
        assert_eq!(config.listen_addr(), "127.0.0.1:3000");
    }

    #[test]
    fn test_overrides_beat_file_values() {
        let file = TomlConfig {
            port: Some(8080),
            media_base_url: Some("https://cms.example.org".to_string()),
            revalidation_token: Some("from-file".to_string()),
            ..Default::default()
        };
        let overrides = ConfigOverrides {
            port: Some(9090),
            revalidation_token: Some("from-cli".to_string()),
            ..Default::default()
        };

        let config = SiteConfig::resolve(overrides, file);
        assert_eq!(config.port, 9090);
        assert_eq!(config.media_base_url, "https://cms.example.org");
        assert_eq!(config.revalidation_token.as_deref(), Some("from-cli"));
    }

    #[test]
    fn test_blank_token_counts_as_missing() {
        let overrides = ConfigOverrides {
            revalidation_token: Some("  ".to_string()),
            ..Default::default()
        };
        let config = SiteConfig::resolve(overrides, TomlConfig::default());
        assert_eq!(config.revalidation_token, None);
    }
}
