//! Configuration loading: embedded TOML defaults, an optional user
//! file, and environment overrides (spec §6.2), in that precedence
//! order — the same "env layered over file" shape as the teacher's
//! `ConfigLoader`.

use super::Config;
use crate::domain::error::{Error, Result};
use ::config::{Config as ConfigBuilder, Environment, File, FileFormat};
use validator::Validate;

/// Embedded default configuration (`config/default.toml`), the
/// single source of truth for default values in the binary.
const DEFAULT_CONFIG_TOML: &str = include_str!("../../config/default.toml");

/// Loads [`Config`] from embedded defaults, an optional TOML file,
/// and environment variables.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfigLoader;

impl ConfigLoader {
    pub fn new() -> Self {
        Self
    }

    /// Load configuration from embedded defaults and environment
    /// variables only (no user file).
    pub fn load(&self) -> Result<Config> {
        self.load_from(None)
    }

    /// Load configuration from embedded defaults, an optional TOML
    /// file at `path`, and environment variables (highest
    /// precedence).
    pub fn load_from(&self, path: Option<&std::path::Path>) -> Result<Config> {
        let mut builder = ConfigBuilder::builder()
            .add_source(File::from_str(DEFAULT_CONFIG_TOML, FileFormat::Toml));

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(false));
        }

        // Spec §6.2: CODE_SEARCH_PROJECT_NAME, CODE_SEARCH_PROJECTS
        // (colon-separated), plus CODE_SEARCH_<SECTION>__<FIELD> for
        // the rest of the tree (e.g. CODE_SEARCH_QUEUE__MAX_CONCURRENT_JOBS).
        builder = builder.add_source(
            Environment::with_prefix("CODE_SEARCH")
                .separator("__")
                .list_separator(":")
                .with_list_parse_key("projects")
                .try_parsing(true),
        );

        let built = builder
            .build()
            .map_err(|e| Error::config(format!("failed to build configuration: {e}")))?;

        let mut config: Config = built
            .try_deserialize()
            .map_err(|e| Error::config(format!("failed to deserialize configuration: {e}")))?;

        if config.index_dir.trim().is_empty() {
            config.index_dir = super::Config::default().index_dir;
        }

        config
            .validate()
            .map_err(|e| Error::config(format!("configuration validation failed: {e}")))?;

        Ok(config)
    }
}
