//! Errors of the configuration and scheduling layer
//!
//! Dispatching itself never fails: unmatched handlers pass the action
//! through, duplicate registrations are ignored.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The config file could not be read.
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid TOML for the expected structure.
    #[error("Invalid config: {0}")]
    Config(#[from] toml::de::Error),

    /// The serial queue thread could not be spawned.
    #[error("Failed to spawn serial queue '{name}': {source}")]
    Spawn {
        name: String,
        #[source]
        source: std::io::Error,
    },
}
