//! File loading and merging for client configuration.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use super::types::{default_api_url, default_model, Config};

impl Config {
    /// Loads the global config from `~/.config/mcp-client/config.toml`.
    ///
    /// If no config file exists, creates one with defaults (including an
    /// `{env:VAR}` placeholder for the API key) and returns it.
    pub(super) fn load_global() -> Result<Self> {
        let path = Self::config_path()?;
        if !path.exists() {
            let default_toml = Self::default_toml();
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, &default_toml)
                .with_context(|| format!("Failed to write default config to {:?}", path))?;
            return toml::from_str(&default_toml)
                .with_context(|| "Failed to parse default config".to_string());
        }

        Self::load_file(&path)
    }

    pub(super) fn load_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {:?}", path))?;
        toml::from_str(&contents).with_context(|| format!("Failed to parse config at {:?}", path))
    }

    /// Look for `mcp-client.toml` in `start`, then walk up to the git root.
    pub(super) fn load_project(start: &Path) -> Result<Option<Config>> {
        let mut dir = start.to_path_buf();
        loop {
            let candidate = dir.join(crate::constants::PROJECT_CONFIG_FILENAME);
            if candidate.exists() {
                return Self::load_file(&candidate).map(Some);
            }
            // Stop at git root or filesystem root
            if dir.join(".git").exists() || !dir.pop() {
                break;
            }
        }
        Ok(None)
    }

    /// Merge project config over global config.
    /// Project values win when present.
    pub(super) fn merge(global: Config, project: Config) -> Config {
        Config {
            model: if project.model != default_model() {
                project.model
            } else {
                global.model
            },
            api_url: if project.api_url != default_api_url() {
                project.api_url
            } else {
                global.api_url
            },
            api_key: project.api_key.or(global.api_key),
            max_turns: project.max_turns.or(global.max_turns),
            system_prompt: project.system_prompt.or(global.system_prompt),
        }
    }

    fn default_toml() -> String {
        format!(
            r#"model = "{}"
api_url = "{}"
api_key = "{{env:{}}}"
max_turns = {}
"#,
            default_model(),
            default_api_url(),
            crate::constants::API_KEY_ENV,
            crate::constants::DEFAULT_MAX_TURNS,
        )
    }
}
