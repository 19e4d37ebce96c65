//! Configuration for the deal board
//!
//! Values are layered, lowest priority first:
//!
//! 1. Built-in defaults
//! 2. TOML file (`--config <path>` or `<config dir>/config.toml`)
//! 3. Environment variables (`DEALBOARD_*`)

use crate::board::{default_stages, StageDefinition, StageRegistry};
use anyhow::{anyhow, bail, Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Valid log levels for configuration validation.
pub const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

pub const ENV_SUPABASE_URL: &str = "DEALBOARD_SUPABASE_URL";
pub const ENV_SUPABASE_ANON_KEY: &str = "DEALBOARD_SUPABASE_ANON_KEY";
pub const ENV_TABLE: &str = "DEALBOARD_TABLE";
pub const ENV_LOG_LEVEL: &str = "DEALBOARD_LOG_LEVEL";

/// Get the platform directories for configuration and cached state
pub fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("com", "dealboard", "dealboard")
        .ok_or_else(|| anyhow!("Could not determine home directory"))
}

/// `<config dir>/config.toml`
pub fn default_config_path() -> Result<PathBuf> {
    Ok(project_dirs()?.config_dir().join("config.toml"))
}

/// `<data dir>/session.json`
pub fn session_cache_path() -> Result<PathBuf> {
    Ok(project_dirs()?.data_dir().join("session.json"))
}

/// Full configuration of the board
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub supabase: SupabaseSettings,

    /// Pipeline stages in board order.
    #[serde(default = "default_stages")]
    pub stages: Vec<StageDefinition>,

    #[serde(default)]
    pub roster: Roster,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            supabase: SupabaseSettings::default(),
            stages: default_stages(),
            roster: Roster::default(),
        }
    }
}

/// Where the deals live
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupabaseSettings {
    /// Project URL, e.g. `https://<ref>.supabase.co`
    #[serde(default)]
    pub url: Option<String>,

    /// Public anon key sent as `apikey`
    #[serde(default)]
    pub anon_key: Option<String>,

    #[serde(default = "default_table")]
    pub table: String,
}

fn default_table() -> String {
    "deals".to_string()
}

impl Default for SupabaseSettings {
    fn default() -> Self {
        Self {
            url: None,
            anon_key: None,
            table: default_table(),
        }
    }
}

/// People a deal can be attributed to. Shown to users, never enforced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roster {
    #[serde(default)]
    pub sourcers: Vec<String>,
    #[serde(default)]
    pub partners: Vec<String>,
}

impl Default for Roster {
    fn default() -> Self {
        let names = |list: &[&str]| list.iter().map(|s| s.to_string()).collect();
        Self {
            sourcers: names(&["Tom", "Stephen", "Ben", "Jameson", "Intern"]),
            partners: names(&["Tom", "Stephen", "Ben"]),
        }
    }
}

impl BoardConfig {
    /// Parse a TOML document; missing keys take their defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse configuration")
    }

    /// Load defaults, then the config file, then the environment.
    ///
    /// An explicit `path` must exist; the default location may be absent.
    pub async fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::load_file(path)
                .await?
                .ok_or_else(|| anyhow!("Config file not found: {}", path.display()))?,
            None => {
                let default_path = default_config_path()?;
                Self::load_file(&default_path).await?.unwrap_or_default()
            }
        };

        config.merge_env_vars();
        config.validate()?;
        Ok(config)
    }

    async fn load_file(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            debug!("No config file at {}", path.display());
            return Ok(None);
        }

        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config = Self::from_toml_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        debug!("Loaded config from {}", path.display());
        Ok(Some(config))
    }

    pub fn merge_env_vars(&mut self) {
        self.merge_env_with(|key| std::env::var(key).ok());
    }

    /// Apply overrides from `lookup`, which maps variable names to values
    pub fn merge_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_SUPABASE_URL) {
            self.supabase.url = Some(url);
        }

        if let Some(key) = lookup(ENV_SUPABASE_ANON_KEY) {
            self.supabase.anon_key = Some(key);
        }

        if let Some(table) = lookup(ENV_TABLE) {
            self.supabase.table = table;
        }

        if let Some(level) = lookup(ENV_LOG_LEVEL) {
            self.log_level = level;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !VALID_LOG_LEVELS.contains(&self.log_level.as_str()) {
            bail!(
                "Invalid log_level '{}', expected one of: {}",
                self.log_level,
                VALID_LOG_LEVELS.join(", ")
            );
        }

        if self.supabase.table.trim().is_empty() {
            bail!("supabase.table cannot be empty");
        }

        self.stage_registry()?;
        Ok(())
    }

    /// Freeze the configured stages into a registry
    pub fn stage_registry(&self) -> Result<StageRegistry> {
        Ok(StageRegistry::new(self.stages.clone())?)
    }
}
