//! Environment variable substitution and API key resolution.

use super::types::Config;

use crate::constants::{API_KEY_ENV, DEFAULT_MAX_TURNS};

impl Config {
    /// Resolve {env:VAR_NAME} patterns in string fields.
    pub(super) fn resolve_substitutions(&mut self) {
        self.model = Self::resolve_str(&self.model);
        self.api_url = Self::resolve_str(&self.api_url);
        if let Some(ref mut key) = self.api_key {
            *key = Self::resolve_str(key);
        }
        if let Some(ref mut sp) = self.system_prompt {
            *sp = Self::resolve_str(sp);
        }
    }

    /// Replace {env:VAR} with the environment variable value.
    ///
    /// Single left-to-right pass: substituted values are not scanned again.
    fn resolve_str(s: &str) -> String {
        let mut result = String::with_capacity(s.len());
        let mut rest = s;
        while let Some(start) = rest.find("{env:") {
            let Some(end) = rest[start..].find('}') else {
                break;
            };
            let var_name = &rest[start + 5..start + end];
            result.push_str(&rest[..start]);
            result.push_str(&std::env::var(var_name).unwrap_or_default());
            rest = &rest[start + end + 1..];
        }
        result.push_str(rest);
        result
    }

    /// Resolve the API key: env var first, then config value. Empty values count as unset.
    pub fn resolve_api_key(&self) -> Option<String> {
        if let Ok(val) = std::env::var(API_KEY_ENV) {
            if !val.is_empty() {
                return Some(val);
            }
        }
        self.api_key.clone().filter(|k| !k.is_empty())
    }

    /// Effective turn bound; `None` means unbounded.
    pub fn max_turns(&self) -> Option<usize> {
        match self.max_turns.unwrap_or(DEFAULT_MAX_TURNS) {
            0 => None,
            n => Some(n),
        }
    }
}
