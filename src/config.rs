//! Engine configuration
//!
//! Platform rules (executable extension matching, path separators) and
//! generator limits. Every field has a platform default, so a config file
//! only needs the keys it overrides.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CompletionError, Result};

/// How spec labels are matched against executable labels
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtensionMatching {
    /// `code` matches `code.exe` and `code.cmd`
    Strip,
    /// `code` matches any executable starting with `code`
    Prefix,
}

impl Default for ExtensionMatching {
    fn default() -> Self {
        if cfg!(windows) {
            ExtensionMatching::Strip
        } else {
            ExtensionMatching::Prefix
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    pub extension_matching: ExtensionMatching,
    pub path_separator: char,
    /// Considered only when the native separator is absent from the prefix
    pub alt_path_separator: Option<char>,
    pub generator_timeout_ms: u64,
    pub query_shell_builtins: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let (path_separator, alt_path_separator) = if cfg!(windows) {
            ('\\', Some('/'))
        } else {
            ('/', None)
        };
        Self {
            extension_matching: ExtensionMatching::default(),
            path_separator,
            alt_path_separator,
            generator_timeout_ms: 5_000,
            query_shell_builtins: true,
        }
    }
}

impl EngineConfig {
    /// Load from a YAML (`.yaml`/`.yml`) or JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let config_err = |message: String| CompletionError::Config {
            path: path.to_path_buf(),
            message,
        };

        let content = fs::read_to_string(path).map_err(|e| config_err(e.to_string()))?;
        let is_yaml = path
            .extension()
            .is_some_and(|e| e == "yaml" || e == "yml");

        if is_yaml {
            serde_yaml::from_str(&content).map_err(|e| config_err(e.to_string()))
        } else {
            serde_json::from_str(&content).map_err(|e| config_err(e.to_string()))
        }
    }

    /// Windows-style matching and separators, regardless of host
    pub fn windows() -> Self {
        Self {
            extension_matching: ExtensionMatching::Strip,
            path_separator: '\\',
            alt_path_separator: Some('/'),
            ..Self::default()
        }
    }

    /// Unix-style matching and separators, regardless of host
    pub fn unix() -> Self {
        Self {
            extension_matching: ExtensionMatching::Prefix,
            path_separator: '/',
            alt_path_separator: None,
            ..Self::default()
        }
    }
}
