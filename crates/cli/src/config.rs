//! Configuration loading from sabuk.toml.

use runtime::AutoSelect;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Where materials come from.
    #[serde(default)]
    pub source: SourceConfig,

    /// Which member is viewing.
    #[serde(default)]
    pub member: MemberConfig,

    /// Viewer behavior.
    #[serde(default)]
    pub viewer: ViewerConfig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    #[default]
    Local,
    Rest,
}

/// Material source configuration.
#[derive(Debug, Default, Deserialize)]
pub struct SourceConfig {
    #[serde(default)]
    pub kind: SourceKind,

    /// Local catalog path. Defaults to the data directory.
    pub database: Option<PathBuf>,

    /// Root of the REST API, e.g. `https://example.org/api`.
    pub base_url: Option<String>,

    /// Bearer token for the REST API.
    pub token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MemberConfig {
    pub username: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ViewerConfig {
    #[serde(default)]
    pub auto_select: AutoSelect,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML string.
    pub fn parse(toml: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.source.kind == SourceKind::Rest && self.source.base_url.is_none() {
            return Err(ConfigError::MissingBaseUrl);
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("REST source not configured: set source.base_url")]
    MissingBaseUrl,
}
