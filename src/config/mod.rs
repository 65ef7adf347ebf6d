//! Configuration types and path resolution for the chat client.
//!
//! Settings are stored as TOML at the platform's XDG config path
//! (e.g. `~/.config/mcp-client/config.toml` on Linux); a project-level
//! `mcp-client.toml` overrides them.

mod loader;
mod paths;
mod resolve;
mod types;

pub use types::Config;

use anyhow::Result;

impl Config {
    /// Load config with precedence: project > global > defaults.
    /// Creates default config file if none exists.
    pub fn load() -> Result<Self> {
        let global = Self::load_global()?;
        let project = Self::load_project(&std::env::current_dir()?)?;

        let mut config = global;
        if let Some(proj) = project {
            config = Self::merge(config, proj);
        }

        config.resolve_substitutions();
        Ok(config)
    }
}
