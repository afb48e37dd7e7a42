//! Configuration file support for persistent settings.
//!
//! Settings are loaded from a TOML file at `~/.config/cull/config.toml` (or
//! the platform-specific equivalent). Values in the file act as defaults that
//! CLI arguments override.
//!
//! # Layering
//!
//! The precedence order is: **CLI argument > config file > hardcoded default**.
//!
//! # Example config
//!
//! ```toml
//! dir = "~/code"
//!
//! [sizing]
//! skip = false
//!
//! [execution]
//! jobs = 8
//!
//! [logging]
//! verbose = false
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Top-level configuration file structure.
///
/// Every field is optional so that missing keys fall through to the
/// hardcoded defaults.
#[derive(Deserialize, Default, Debug)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    /// Default directory to scan.
    pub dir: Option<PathBuf>,

    /// Size measurement options.
    #[serde(default)]
    pub sizing: FileSizingConfig,

    /// Worker-pool options.
    #[serde(default)]
    pub execution: FileExecutionConfig,

    /// Diagnostic output options.
    #[serde(default)]
    pub logging: FileLoggingConfig,
}

/// `[sizing]` table.
#[derive(Deserialize, Default, Debug)]
#[serde(deny_unknown_fields)]
pub struct FileSizingConfig {
    /// Skip size measurement entirely.
    pub skip: Option<bool>,
}

/// `[execution]` table.
#[derive(Deserialize, Default, Debug)]
#[serde(deny_unknown_fields)]
pub struct FileExecutionConfig {
    /// Maximum number of external commands in flight (0 = automatic).
    pub jobs: Option<usize>,
}

/// `[logging]` table.
#[derive(Deserialize, Default, Debug)]
#[serde(deny_unknown_fields)]
pub struct FileLoggingConfig {
    /// Log skipped directories, batch launches and fallbacks.
    pub verbose: Option<bool>,
}

/// Expand a leading `~` in a path to the user's home directory.
///
/// Paths that don't start with `~` are returned unchanged.
#[must_use]
pub fn expand_tilde(path: &Path) -> PathBuf {
    if let Ok(rest) = path.strip_prefix("~")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    path.to_path_buf()
}

impl FileConfig {
    /// Returns the path where the configuration file is expected.
    ///
    /// `<config_dir>/cull/config.toml`, where `<config_dir>` is the platform
    /// configuration directory (`~/.config` on Linux, `%APPDATA%` on Windows).
    /// `None` if that directory cannot be determined.
    #[must_use]
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("cull").join("config.toml"))
    }

    /// Load configuration from the default config file location.
    ///
    /// A missing file yields the default (empty) configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> anyhow::Result<Self> {
        let Some(path) = Self::config_path() else {
            return Ok(Self::default());
        };

        if !path.exists() {
            return Ok(Self::default());
        }

        Self::load_from(&path)
    }

    /// Load configuration from an explicit file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or contains invalid TOML
    /// or unknown keys.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            anyhow::anyhow!("Failed to read config file at {}: {e}", path.display())
        })?;

        toml::from_str(&content).map_err(|e| {
            anyhow::anyhow!("Failed to parse config file at {}: {e}", path.display())
        })
    }
}
