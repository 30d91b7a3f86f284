//! Configuration: a TOML file in the platform config dir, with CLI flags
//! taking precedence over file values and every key defaulted.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_DEBOUNCE_MS: u64 = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Path to the prebuilt search bundle. Defaults to the platform data
    /// dir when unset here and on the command line.
    pub bundle: Option<PathBuf>,
    /// Base URL prepended to result links when opening them.
    pub site: Option<String>,
    /// Debounce interval for the search pipeline.
    pub debounce_ms: u64,
    /// Clear the query and results when the dialog closes. Off by default:
    /// reopening re-displays the last search.
    pub reset_on_close: bool,
    pub theme: Theme,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bundle: None,
            site: None,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            reset_on_close: false,
            theme: Theme::Dark,
        }
    }
}

impl Config {
    /// Load from `path` if given, otherwise from the default location.
    /// A missing file yields defaults; a malformed file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => default_config_path(),
        };
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config at {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("parsing config at {}", path.display()))
    }
}

pub fn default_config_path() -> PathBuf {
    directories::ProjectDirs::from("dev", "sitefind", "sitefind")
        .map(|dirs| dirs.config_dir().join("config.toml"))
        .unwrap_or_else(|| PathBuf::from("sitefind.toml"))
}
