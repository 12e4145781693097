//! Persistent settings for the packer.
//!
//! Stored as pretty JSON at `<config_dir>/datapress/config.json`. A missing
//! or unreadable file yields defaults. The secret can be set here but is never
//! written back; saving a config always stores an empty secret.

use anyhow::{Context as _, Result};
use secrecy::{ExposeSecret as _, SecretString};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::secret::SECRET_ENV_VAR;

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct PressConfig {
    /// Sort object keys before compressing artifacts
    pub canonical: bool,
    /// Entries kept in each leaderboard of a report
    pub leaderboard_size: usize,
    pub output_dir: Option<PathBuf>,
    #[serde(
        serialize_with = "serialize_secret",
        deserialize_with = "deserialize_secret"
    )]
    pub secret: Option<SecretString>,
}

impl Default for PressConfig {
    fn default() -> Self {
        Self {
            canonical: true,
            leaderboard_size: 10,
            output_dir: None,
            secret: None,
        }
    }
}

impl PressConfig {
    /// Secret text from this config, else from [`SECRET_ENV_VAR`].
    pub fn secret_source(&self) -> Option<String> {
        self.secret
            .as_ref()
            .map(|secret| secret.expose_secret().to_owned())
            .or_else(|| std::env::var(SECRET_ENV_VAR).ok())
            .filter(|raw| !raw.trim().is_empty())
    }
}

fn serialize_secret<S>(_secret: &Option<SecretString>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str("")
}

fn deserialize_secret<'de, D>(deserializer: D) -> Result<Option<SecretString>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw
        .filter(|s| !s.trim().is_empty())
        .map(|s| SecretString::new(s.into())))
}

pub fn get_config_path() -> Result<PathBuf> {
    let base_dir = dirs::config_dir().context("Failed to determine config directory")?;
    Ok(base_dir.join("datapress").join("config.json"))
}

/// Load from `path`, falling back to defaults when the file is missing or
/// does not parse.
pub fn load_config_from(path: &Path) -> PressConfig {
    if path.exists()
        && let Ok(content) = std::fs::read_to_string(path)
    {
        match serde_json::from_str::<PressConfig>(&content) {
            Ok(config) => return config,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable config");
            }
        }
    }
    PressConfig::default()
}

pub fn load_config() -> PressConfig {
    match get_config_path() {
        Ok(path) => load_config_from(&path),
        Err(_) => PressConfig::default(),
    }
}

pub fn save_config_to(config: &PressConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let content = serde_json::to_string_pretty(config)?;
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write config to {}", path.display()))?;
    Ok(())
}

pub fn save_config(config: &PressConfig) -> Result<()> {
    save_config_to(config, &get_config_path()?)
}
