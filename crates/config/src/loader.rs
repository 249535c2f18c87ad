use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::{
    env_subst::substitute_env,
    error::{Context, Error, Result},
    schema::ThreadlineConfig,
};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &[
    "threadline.toml",
    "threadline.yaml",
    "threadline.yml",
    "threadline.json",
];

/// Syntax of a config file, chosen by its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Yaml,
    Json,
}

impl ConfigFormat {
    /// Files without an extension are read as TOML.
    pub fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|e| e.to_str()).unwrap_or("toml") {
            "toml" => Ok(Self::Toml),
            "yaml" | "yml" => Ok(Self::Yaml),
            "json" => Ok(Self::Json),
            other => Err(Error::UnsupportedFormat {
                extension: other.to_string(),
            }),
        }
    }
}

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> Result<ThreadlineConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let raw = substitute_env(&raw);
    parse_config(&raw, path)
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. `./threadline.{toml,yaml,yml,json}` (project-local)
/// 2. `~/.config/threadline/threadline.{toml,yaml,yml,json}` (user-global)
///
/// Returns `ThreadlineConfig::default()` if no config file is found or the
/// file fails to load.
pub fn discover_and_load() -> ThreadlineConfig {
    if let Some(path) = find_config_file() {
        debug!(path = %path.display(), "loading config");
        match load_config(&path) {
            Ok(cfg) => return cfg,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
            },
        }
    } else {
        debug!("no config file found, using defaults");
    }
    ThreadlineConfig::default()
}

/// Find the first config file in standard locations.
pub fn find_config_file() -> Option<PathBuf> {
    CONFIG_FILENAMES
        .iter()
        .map(PathBuf::from)
        .find(|p| p.exists())
        .or_else(|| {
            let dir = config_dir()?;
            CONFIG_FILENAMES
                .iter()
                .map(|name| dir.join(name))
                .find(|p| p.exists())
        })
}

/// Returns the user-global config directory (`~/.config/threadline/`).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "threadline").map(|d| d.config_dir().to_path_buf())
}

fn parse_config(raw: &str, path: &Path) -> Result<ThreadlineConfig> {
    match ConfigFormat::from_path(path)? {
        ConfigFormat::Toml => Ok(toml::from_str(raw)?),
        ConfigFormat::Yaml => Ok(serde_yaml::from_str(raw)?),
        ConfigFormat::Json => Ok(serde_json::from_str(raw)?),
    }
}
