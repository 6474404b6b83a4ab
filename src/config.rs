//! # Configuration
//!
//! Optional TOML settings. Lookup order: an explicit path, then
//! `.commit-delta.toml` in the repository directory or one of its ancestors,
//! then `<config dir>/commit-delta/config.toml`, then built-in defaults.
//!
//! ```toml
//! timezone = "+02:00"
//! top_files = 15
//!
//! [keywords]
//! extra_high = ["rewrite", "overhaul"]
//! low = ["fix", "typo", "lint"]
//! ```

use log::{debug, warn};
use serde::Deserialize;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::analysis::aggregator::{DEFAULT_TOP_DAYS, DEFAULT_TOP_FILES};
use crate::analysis::classifier::{ComplexityClassifier, KeywordTable};
use crate::error::{AnalysisError, Result};
use crate::types::ComplexityTier;
use crate::window::WindowTz;

/// Per-repository config file name
pub const CONFIG_FILENAME: &str = ".commit-delta.toml";
const MAX_TRAVERSAL_DEPTH: usize = 10;

/// Keyword overrides. A tier list replaces the defaults for that tier, an
/// `extra_` list appends to whatever the tier ends up with.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KeywordConfig {
    pub high: Option<Vec<String>>,
    pub medium: Option<Vec<String>>,
    pub low: Option<Vec<String>>,
    pub extra_high: Vec<String>,
    pub extra_medium: Vec<String>,
    pub extra_low: Vec<String>,
}

impl KeywordConfig {
    pub fn to_table(&self) -> KeywordTable {
        let mut table = KeywordTable::default();
        if let Some(high) = &self.high {
            table.high = high.clone();
        }
        if let Some(medium) = &self.medium {
            table.medium = medium.clone();
        }
        if let Some(low) = &self.low {
            table.low = low.clone();
        }
        table.extend(ComplexityTier::High, self.extra_high.iter().cloned());
        table.extend(ComplexityTier::Medium, self.extra_medium.iter().cloned());
        table.extend(ComplexityTier::Low, self.extra_low.iter().cloned());
        table
    }
}

/// Settings for an analysis run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    pub keywords: KeywordConfig,
    pub top_files: usize,
    pub top_days: usize,
    pub timezone: WindowTz,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            keywords: KeywordConfig::default(),
            top_files: DEFAULT_TOP_FILES,
            top_days: DEFAULT_TOP_DAYS,
            timezone: WindowTz::Utc,
        }
    }
}

impl AnalysisConfig {
    pub fn from_toml_str(contents: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// Load a file the user asked for explicitly; any failure is an error.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| AnalysisError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::from_toml_str(&contents).map_err(|e| AnalysisError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Resolve configuration for a repository at `repo_dir`.
    pub fn load(explicit: Option<&Path>, repo_dir: &Path) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from_path(path);
        }
        Ok(Self::discover(repo_dir))
    }

    /// Search the usual places, falling back to defaults.
    pub fn discover(repo_dir: &Path) -> Self {
        repo_dir
            .ancestors()
            .take(MAX_TRAVERSAL_DEPTH)
            .map(|dir| dir.join(CONFIG_FILENAME))
            .chain(user_config_path())
            .find_map(|path| try_load(&path))
            .unwrap_or_else(|| {
                debug!("no config file found, using defaults");
                Self::default()
            })
    }

    pub fn classifier(&self) -> ComplexityClassifier {
        ComplexityClassifier::new(&self.keywords.to_table())
    }
}

fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("commit-delta").join("config.toml"))
}

/// Implicitly discovered files never fail the run
fn try_load(path: &Path) -> Option<AnalysisConfig> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) => {
            if e.kind() != ErrorKind::NotFound {
                warn!("failed to read config file {}: {}", path.display(), e);
            }
            return None;
        }
    };

    match AnalysisConfig::from_toml_str(&contents) {
        Ok(config) => {
            debug!("loaded config from {}", path.display());
            Some(config)
        }
        Err(e) => {
            warn!("ignoring invalid config {}: {}", path.display(), e);
            None
        }
    }
}
