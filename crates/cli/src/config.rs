//! Configuration loading from campus-access.toml.

use access::PolicyTable;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Where the policy table comes from.
    #[serde(default)]
    pub policy: PolicyConfig,

    /// Decision audit log.
    #[serde(default)]
    pub audit: AuditConfig,

    /// Logging.
    #[serde(default)]
    pub log: LogConfig,
}

/// Policy source configuration.
#[derive(Debug, Default, Deserialize)]
pub struct PolicyConfig {
    /// TOML policy file. The built-in table is used when unset.
    pub file: Option<PathBuf>,
}

/// Audit log configuration.
#[derive(Debug, Default, Deserialize)]
pub struct AuditConfig {
    /// Record every `check` in the audit database.
    #[serde(default)]
    pub enabled: bool,

    /// Database path. Defaults to the platform data directory.
    pub path: Option<PathBuf>,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
pub struct LogConfig {
    /// `tracing` filter directive, overridden by `RUST_LOG`.
    #[serde(default = "default_filter")]
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
        }
    }
}

fn default_filter() -> String {
    "warn".to_string()
}

/// The policy loaded from configuration.
pub enum ActivePolicy {
    Standard,
    File(PolicyTable),
}

impl ActivePolicy {
    pub fn table(&self) -> &PolicyTable {
        match self {
            ActivePolicy::Standard => PolicyTable::standard(),
            ActivePolicy::File(table) => table,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// Relative paths inside the file are resolved against its directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::parse(&content)?;
        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        Ok(config)
    }

    /// Parse configuration from TOML string.
    pub fn parse(toml: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    fn resolve_paths(&mut self, base: &Path) {
        for path in [&mut self.policy.file, &mut self.audit.path].into_iter().flatten() {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }

    /// Load the configured policy table.
    pub fn policy(&self) -> Result<ActivePolicy, ConfigError> {
        match &self.policy.file {
            Some(file) => Ok(ActivePolicy::File(PolicyTable::load(file)?)),
            None => Ok(ActivePolicy::Standard),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("failed to load policy: {0}")]
    Policy(#[from] access::Error),
}
