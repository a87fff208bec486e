//! Optional `peoplehub.toml` settings.
//!
//! ```toml
//! [database]
//! max_connections = 5
//!
//! [seed]
//! roster_csv = "seeds/employees.csv"
//! rng_seed = 42
//! email_domain = "example.com"
//! ```
//!
//! Every key is optional. Connection URLs are not read from here; they come
//! from `DATABASE_URL` / `PEOPLEHUB_API_URL` or the matching CLI flags.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::debug;

use crate::db::DEFAULT_MAX_CONNECTIONS;
use crate::seed::SeedOptions;

/// Looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "peoplehub.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub max_connections: u32,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub seed: SeedOptions,
}

impl Settings {
    pub fn parse(content: &str) -> Result<Settings> {
        let settings: Settings = toml::from_str(content)?;
        if settings.database.max_connections == 0 {
            anyhow::bail!("database.max_connections must be at least 1");
        }
        Ok(settings)
    }

    /// Load settings from `path`, which must exist, or from
    /// `./peoplehub.toml` when present. Defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Settings> {
        let (path, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };
        if !required && !path.exists() {
            debug!("no {} found, using defaults", DEFAULT_CONFIG_FILE);
            return Ok(Settings::default());
        }
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let mut settings =
            Self::parse(&content).with_context(|| format!("invalid config {}", path.display()))?;

        // Relative roster paths are relative to the config file.
        if let (Some(roster), Some(dir)) = (&settings.seed.roster_csv, path.parent()) {
            if roster.is_relative() && !dir.as_os_str().is_empty() {
                settings.seed.roster_csv = Some(dir.join(roster));
            }
        }
        Ok(settings)
    }
}
