//! Dispatcher configuration
//!
//! Selects the execution context of a dispatcher and whether every action is
//! logged. Usually read from the `[dispatcher]` table of an application's
//! TOML config file; every field has a default.

use crate::dispatcher::Dispatcher;
use crate::error::{Error, Result};
use crate::middleware::LoggingMiddleware;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// Where dispatches run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DispatchMode {
    /// On the thread calling `dispatch`
    #[default]
    Immediate,
    /// On a dedicated background thread, in submission order
    Serial,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatcherConfig {
    #[serde(default)]
    pub mode: DispatchMode,

    /// Thread name of the serial queue
    #[serde(default = "default_queue_name")]
    pub queue_name: String,

    /// Register a logging middleware ahead of every other worker
    #[serde(default)]
    pub log_actions: bool,
}

fn default_queue_name() -> String {
    "flux-dispatcher".to_string()
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            mode: DispatchMode::default(),
            queue_name: default_queue_name(),
            log_actions: false,
        }
    }
}

impl DispatcherConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&content)?;
        log::info!("Loaded dispatcher config from {}", path.display());
        Ok(config)
    }
}

impl Dispatcher {
    /// Build a dispatcher as described by `config`
    pub fn from_config(config: &DispatcherConfig) -> Result<Self> {
        let dispatcher = match config.mode {
            DispatchMode::Immediate => Dispatcher::new(),
            DispatchMode::Serial => Dispatcher::serial(config.queue_name.clone())?,
        };

        if config.log_actions {
            dispatcher.register_worker(Arc::new(LoggingMiddleware::new()));
        }

        log::debug!("Created dispatcher: {:?}", config);
        Ok(dispatcher)
    }
}
