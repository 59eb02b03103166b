//! Access error types.

use thiserror::Error;

/// Errors raised while building or loading a policy table.
///
/// Evaluation itself never fails; these only come from the configuration
/// surfaces. This enum is marked `#[non_exhaustive]` to allow adding new
/// variants in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The policy table is invalid.
    #[error("invalid policy: {0}")]
    Invalid(String),

    /// Failed to parse a policy file.
    #[error("failed to parse policy: {0}")]
    Parse(String),

    /// A textual label does not name a known role, resource, action or condition.
    #[error("unknown {kind} '{label}'")]
    UnknownLabel { kind: &'static str, label: String },

    /// An I/O error occurred while reading policy.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
