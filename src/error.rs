//! Error types for bubbletea-scrollback.
//!
//! The runtime state machine never fails: an unresolved scroll container, a
//! bogus measurement or a deferred message arriving after teardown all
//! degrade silently. The only fallible surface is loading and validating a
//! [`Config`](crate::config::Config).

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for bubbletea-scrollback.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while building a viewport configuration.
#[derive(Debug, Error)]
pub enum Error {
    /// The configuration file could not be read.
    #[error("failed to read config {path}: {source}")]
    Io {
        /// Path that was being read.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The configuration text is not valid TOML for [`Config`](crate::config::Config).
    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// A configuration value is out of range.
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}
