//! Configuration management with layered hierarchy

use serde::Deserialize;
use std::path::PathBuf;

use crate::core::Workspace;

/// Rackline configuration with layered hierarchy
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Actor name recorded in the audit trail
    pub actor: Option<String>,

    /// Pager command for long output
    pub pager: Option<String>,
}

impl Config {
    /// Load configuration from all sources, merging in priority order
    pub fn load(workspace: Option<&Workspace>) -> Self {
        let mut config = Config::default();

        // 1. Built-in defaults (already in Default impl)

        // 2. Global user config (~/.config/rackline/config.yaml)
        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                if let Ok(contents) = std::fs::read_to_string(&global_path) {
                    if let Ok(global) = serde_yml::from_str::<Config>(&contents) {
                        config.merge(global);
                    }
                }
            }
        }

        // 3. Workspace config (.rackline/config.yaml)
        if let Some(ws) = workspace {
            let ws_config_path = ws.config_path();
            if ws_config_path.exists() {
                if let Ok(contents) = std::fs::read_to_string(&ws_config_path) {
                    if let Ok(ws_config) = serde_yml::from_str::<Config>(&contents) {
                        config.merge(ws_config);
                    }
                }
            }
        }

        // 4. Environment variables
        if let Ok(actor) = std::env::var("RACKLINE_ACTOR") {
            config.actor = Some(actor);
        }

        config
    }

    /// Get the path to the global config file
    fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "rackline")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Merge another config into this one (other takes precedence)
    fn merge(&mut self, other: Config) {
        if other.actor.is_some() {
            self.actor = other.actor;
        }
        if other.pager.is_some() {
            self.pager = other.pager;
        }
    }

    /// Get the actor name, falling back to git config or username
    pub fn actor(&self) -> String {
        if let Some(ref actor) = self.actor {
            return actor.clone();
        }

        // Try git config
        if let Ok(output) = std::process::Command::new("git")
            .args(["config", "user.name"])
            .output()
        {
            if output.status.success() {
                let name = String::from_utf8_lossy(&output.stdout).trim().to_string();
                if !name.is_empty() {
                    return name;
                }
            }
        }

        // Fall back to username
        std::env::var("USER")
            .or_else(|_| std::env::var("USERNAME"))
            .unwrap_or_else(|_| "unknown".to_string())
    }
}
