/// Config schema types (agent identity, platform limits, thread walking,
/// publishing cadence, retry policy, persistence).
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ThreadlineConfig {
    pub agent: AgentConfig,
    pub platform: PlatformConfig,
    pub thread: ThreadConfig,
    pub publish: PublishConfig,
    pub retry: RetryConfig,
    pub memory: MemoryConfig,
}

/// Who the agent is on the platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Agent name. The agent id is derived from it.
    pub name: String,
    /// Platform handle used to build permanent links for published posts.
    pub username: Option<String>,
    /// Platform user id of the agent's own account. Messages authored by it
    /// are attributed to the agent rather than to a derived entity.
    pub profile_id: Option<String>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: "threadline".into(),
            username: None,
            profile_id: None,
        }
    }
}

/// Platform constants.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    /// Source tag stored on every memory record (e.g. "twitter").
    pub source: String,
    /// Longest text accepted by a standard post, in platform-weighted
    /// characters. Content above this is published as long-form and split
    /// into chunks of at most this length.
    pub post_limit: usize,
    /// Base URL for permanent links: `{permalink_base}/{username}/status/{id}`.
    pub permalink_base: String,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            source: "twitter".into(),
            post_limit: 279,
            permalink_base: "https://twitter.com".into(),
        }
    }
}

/// Ancestry reconstruction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThreadConfig {
    /// Maximum number of parent hops above the seed message.
    pub max_depth: usize,
}

impl Default for ThreadConfig {
    fn default() -> Self {
        Self { max_depth: 10 }
    }
}

/// Pacing between consecutive submissions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishConfig {
    pub delay_min_ms: u64,
    pub delay_max_ms: u64,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            delay_min_ms: 1_000,
            delay_max_ms: 3_000,
        }
    }
}

/// Exponential backoff for structured generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub base_delay_ms: u64,
    pub multiplier: u32,
    /// Unset means retry forever.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_attempts: Option<u32>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: 1_000,
            multiplier: 2,
            max_attempts: None,
        }
    }
}

/// Persistence settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// SQLite database file. Defaults to `memory.db` in the data directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_path: Option<PathBuf>,
}

impl MemoryConfig {
    /// Resolve the database path, falling back to the platform data dir.
    #[must_use]
    pub fn resolved_database_path(&self) -> PathBuf {
        if let Some(path) = &self.database_path {
            return path.clone();
        }
        directories::ProjectDirs::from("", "", "threadline")
            .map(|d| d.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."))
            .join("memory.db")
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = ThreadlineConfig::default();
        assert_eq!(cfg.agent.name, "threadline");
        assert_eq!(cfg.platform.post_limit, 279);
        assert_eq!(cfg.thread.max_depth, 10);
        assert_eq!(cfg.publish.delay_min_ms, 1_000);
        assert_eq!(cfg.publish.delay_max_ms, 3_000);
        assert_eq!(cfg.retry.multiplier, 2);
        assert!(cfg.retry.max_attempts.is_none());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg: ThreadlineConfig = toml::from_str(
            r#"
            [agent]
            username = "bot"

            [retry]
            max_attempts = 5
            "#,
        )
        .unwrap();
        assert_eq!(cfg.agent.name, "threadline");
        assert_eq!(cfg.agent.username.as_deref(), Some("bot"));
        assert_eq!(cfg.retry.max_attempts, Some(5));
        assert_eq!(cfg.retry.base_delay_ms, 1_000);
    }

    #[test]
    fn explicit_database_path_wins() {
        let cfg = MemoryConfig {
            database_path: Some(PathBuf::from("/tmp/x.db")),
        };
        assert_eq!(cfg.resolved_database_path(), PathBuf::from("/tmp/x.db"));
    }
}
