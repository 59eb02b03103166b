//! CLI error types.

use std::path::PathBuf;
use thiserror::Error;

/// CLI errors.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Configuration is invalid or the policy it names could not be loaded.
    #[error("config error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// The audit database does not exist.
    ///
    /// Nothing has been recorded yet, or auditing is disabled.
    #[error("audit log not found at {path}. Enable [audit] and run 'campus-access check' first")]
    AuditLogNotFound { path: PathBuf },

    /// No data directory could be determined for the audit database.
    #[error("no data directory available; set audit.path in the config")]
    NoDataDir,

    /// An error occurred in the audit layer.
    #[error(transparent)]
    Audit(#[from] audit::Error),

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
