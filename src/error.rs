//! Typed errors for the discovery core.
//!
//! `CommandError` values travel to the sink as error records; `PluginLoadError`
//! values describe why a single plugin entry was rejected by the loader.

use std::path::PathBuf;
use thiserror::Error;

/// Recoverable failures of the `discover` command. Every variant is reported
/// to the sink; none of them aborts the process.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("`{command}` expects {expected} argument(s), got {} ({actual:?})", .actual.len())]
    ArgumentCount {
        command: String,
        expected: usize,
        actual: Vec<String>,
    },

    #[error("unknown discovery type `{target}` (available: {})", .known.join(", "))]
    UnknownDiscovery { target: String, known: Vec<String> },
}

impl CommandError {
    /// Short machine-friendly tag used in error records.
    pub fn kind(&self) -> &'static str {
        match self {
            CommandError::ArgumentCount { .. } => "argument_count",
            CommandError::UnknownDiscovery { .. } => "unknown_discovery",
        }
    }
}

/// Why one plugin entry could not become a discovery candidate.
#[derive(Debug, Error)]
pub enum PluginLoadError {
    #[error("cannot read plugin directory {}: {source}", .path.display())]
    UnreadableDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot read manifest {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid manifest {}: {source}", .path.display())]
    InvalidManifest {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("plugin {name} declares category `{found}`, expected `{expected}`")]
    CategoryMismatch {
        name: String,
        expected: String,
        found: String,
    },

    #[error("invalid plugin name `{name}` in {}: {reason}", .path.display())]
    InvalidName {
        path: PathBuf,
        name: String,
        reason: &'static str,
    },

    #[error("plugin {name} has an unusable command: {reason}")]
    InvalidCommand { name: String, reason: String },
}
