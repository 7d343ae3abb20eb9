//! Run configuration, read from `bp2nix.toml`

use anyhow::{Context, Result};
use bp2nix_codegen::{DuplicatePolicy, GlobMissPolicy, INDEX_FILE_NAME};
use bp2nix_core::ExportPolicy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

/// Default config file looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "bp2nix.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// File name suffix that marks a Blueprint file in tree mode
    pub input_file_name: String,

    /// Where tree mode writes converted files and the index
    pub output_dir: PathBuf,

    /// Name of the aggregate index inside `output_dir`
    pub index_file: String,

    /// Paths containing any of these substrings are skipped in tree mode
    pub exclude: Vec<String>,

    pub duplicate_policy: DuplicatePolicy,

    pub glob_miss: GlobMissPolicy,

    pub export: ExportPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_file_name: "Android.bp".to_string(),
            output_dir: PathBuf::from("out"),
            index_file: INDEX_FILE_NAME.to_string(),
            exclude: vec!["device/".to_string(), "prebuilts/vndk/".to_string()],
            duplicate_policy: DuplicatePolicy::default(),
            glob_miss: GlobMissPolicy::default(),
            export: ExportPolicy::default(),
        }
    }
}

impl FromStr for Config {
    type Err = toml::de::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        toml::from_str(s)
    }
}

impl Config {
    /// Load configuration from file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        content
            .parse()
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Use `explicit` when given, else `bp2nix.toml` in the working
    /// directory if present, else defaults
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        let local = Path::new(CONFIG_FILE_NAME);
        if local.is_file() {
            debug!("Using {}", local.display());
            return Self::from_file(local);
        }
        Ok(Self::default())
    }
}
