//! Application configuration
//!
//! Loaded from `flux-todo.toml` in the current directory, then from
//! `config.toml` in the platform config directory (~/.config/flux-todo/ on
//! Linux). Missing or invalid files fall back to defaults.

use anyhow::{Context, Result};
use flux::DispatcherConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const APP_NAME: &str = "flux-todo";
const LOCAL_CONFIG_FILE: &str = "flux-todo.toml";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AppConfig {
    /// Title shown above the list
    #[serde(default = "default_title")]
    pub title: String,

    /// Items added when no titles are given on the command line
    #[serde(default = "default_seed_items")]
    pub seed_items: Vec<String>,

    #[serde(default)]
    pub dispatcher: DispatcherConfig,
}

fn default_title() -> String {
    "Todo".to_string()
}

fn default_seed_items() -> Vec<String> {
    vec![
        "Write the release notes".to_string(),
        "Review open pull requests".to_string(),
        "Update dependencies".to_string(),
    ]
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            seed_items: default_seed_items(),
            dispatcher: DispatcherConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load config from CWD first, then the config directory, or use defaults
    pub fn load() -> Self {
        for path in candidate_paths() {
            let Ok(content) = std::fs::read_to_string(&path) else {
                continue;
            };
            match toml::from_str(&content) {
                Ok(config) => {
                    log::info!("Loaded app config from {}", path.display());
                    return config;
                }
                Err(e) => {
                    log::warn!("Failed to parse config file {}: {}", path.display(), e);
                }
            }
        }

        log::debug!("Using default app config");
        Self::default()
    }
}

fn candidate_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(LOCAL_CONFIG_FILE)];
    if let Some(base) = dirs::config_dir() {
        paths.push(base.join(APP_NAME).join("config.toml"));
    }
    paths
}

/// Get the application cache directory, creating it if needed
pub fn cache_dir() -> Result<PathBuf> {
    let base = dirs::cache_dir().context("Could not determine cache directory")?;
    let dir = base.join(APP_NAME);
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create cache directory {}", dir.display()))?;
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flux::DispatchMode;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.title, "Todo");
        assert_eq!(config.seed_items.len(), 3);
        assert_eq!(config.dispatcher, DispatcherConfig::default());
    }

    #[test]
    fn test_config_deserialize() {
        let toml = r#"
            title = "Groceries"
            seed_items = ["milk", "bread"]

            [dispatcher]
            mode = "serial"
            log_actions = true
        "#;
        let config: AppConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.title, "Groceries");
        assert_eq!(config.seed_items, vec!["milk", "bread"]);
        assert_eq!(config.dispatcher.mode, DispatchMode::Serial);
        assert!(config.dispatcher.log_actions);
        assert_eq!(config.dispatcher.queue_name, "flux-dispatcher");
    }

    #[test]
    fn test_config_deserialize_partial() {
        let config: AppConfig = toml::from_str(r#"title = "Chores""#).unwrap();
        assert_eq!(config.title, "Chores");
        // Other fields should use defaults
        assert_eq!(config.seed_items, default_seed_items());
        assert_eq!(config.dispatcher.mode, DispatchMode::Immediate);
    }

    #[test]
    fn test_local_file_is_searched_first() {
        let paths = candidate_paths();
        assert_eq!(paths[0], PathBuf::from(LOCAL_CONFIG_FILE));
    }
}
