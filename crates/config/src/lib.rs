//! Configuration loading, env substitution, and validation.
//!
//! Config files: `threadline.toml`, `threadline.yaml`, or `threadline.json`.
//! Searched in `./` then `~/.config/threadline/`.
//!
//! Supports `${ENV_VAR}` and `${ENV_VAR:-default}` substitution in the raw
//! file before parsing.

pub mod env_subst;
pub mod error;
pub mod loader;
pub mod schema;
pub mod validate;

pub use {
    error::{Error, Result},
    loader::{ConfigFormat, config_dir, discover_and_load, find_config_file, load_config},
    schema::{
        AgentConfig, MemoryConfig, PlatformConfig, PublishConfig, RetryConfig, ThreadConfig,
        ThreadlineConfig,
    },
    validate::{Diagnostic, Severity, ValidationResult},
};
