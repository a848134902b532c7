//! Report configuration.
//!
//! Settings are read from a TOML file and can be overridden from the command
//! line. Every key is optional:
//!
//! ```toml
//! [report]
//! title = "Unnamed Diff"
//! root_dir = "."
//! out_dir = ""            # empty: write next to the images
//! images = ["**/*.png"]   # a single string is accepted too
//! verbose = false
//!
//! [rules]
//! baseline_dir = "baseline"
//! current_dir = "current"
//! diff_dir = "diff"
//! ```

use crate::rules::SegmentRules;
use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// File name looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = ".visualdiffrc.toml";

/// Errors that can occur during configuration loading.
#[derive(Debug, Clone)]
pub enum ConfigError {
    /// Configuration file not found at the specified path.
    ConfigNotFound(PathBuf),
    /// Invalid TOML syntax or structure.
    ConfigInvalid(String),
    /// A directory segment name for the path rules is unusable.
    InvalidSegment {
        /// The offending segment name.
        segment: String,
        /// Why it was rejected.
        reason: String,
    },
    /// IO error while reading configuration.
    IoError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ConfigNotFound(path) => {
                write!(f, "Configuration file not found: {}", path.display())
            }
            ConfigError::ConfigInvalid(msg) => write!(f, "Invalid configuration: {}", msg),
            ConfigError::InvalidSegment { segment, reason } => {
                write!(f, "Invalid directory segment '{}': {}", segment, reason)
            }
            ConfigError::IoError(msg) => write!(f, "IO error reading configuration: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Top-level configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(default)]
    pub report: ReportSection,
    #[serde(default)]
    pub rules: RuleSection,
}

/// What to scan and where to write the report.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportSection {
    /// Report title.
    pub title: String,
    /// Directory the images are searched in.
    pub root_dir: PathBuf,
    /// Output directory; empty means `root_dir`.
    pub out_dir: PathBuf,
    /// Glob patterns relative to `root_dir`.
    #[serde(deserialize_with = "one_or_many")]
    pub images: Vec<String>,
    /// Print every processed path.
    pub verbose: bool,
}

impl Default for ReportSection {
    fn default() -> Self {
        Self {
            title: "Unnamed Diff".to_string(),
            root_dir: PathBuf::from("."),
            out_dir: PathBuf::new(),
            images: vec!["**/*.png".to_string()],
            verbose: false,
        }
    }
}

/// Directory segment names used by the default path rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleSection {
    pub baseline_dir: String,
    pub current_dir: String,
    pub diff_dir: String,
}

impl Default for RuleSection {
    fn default() -> Self {
        Self {
            baseline_dir: "baseline".to_string(),
            current_dir: "current".to_string(),
            diff_dir: "diff".to_string(),
        }
    }
}

/// Accepts `images = "*.png"` as well as `images = ["*.png"]`.
fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(pattern) => vec![pattern],
        OneOrMany::Many(patterns) => patterns,
    })
}

/// Command-line values that take precedence over the configuration file.
#[derive(Debug, Clone, Default)]
pub struct ReportOverrides {
    pub title: Option<String>,
    pub root_dir: Option<PathBuf>,
    pub out_dir: Option<PathBuf>,
    pub images: Vec<String>,
    pub verbose: bool,
}

/// Fully resolved settings for one report run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSettings {
    pub title: String,
    pub root_dir: PathBuf,
    pub out_dir: PathBuf,
    pub images: Vec<String>,
    pub verbose: bool,
}

impl ReportConfig {
    /// Load configuration from a file, with fallback to defaults.
    ///
    /// Attempts to load configuration in the following order:
    /// 1. If `config_path` is provided, load from that file
    /// 2. Look for `.visualdiffrc.toml` in the current directory
    /// 3. Look for `~/.config/visual-diff-report/config.toml` in home directory
    /// 4. Fall back to default configuration
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration file is explicitly provided but cannot be read.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = PathBuf::from(LOCAL_CONFIG_FILE);
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Ok(home) = std::env::var("HOME") {
            let home_config = PathBuf::from(home)
                .join(".config")
                .join("visual-diff-report")
                .join("config.toml");
            if home_config.exists() {
                return Self::load_from_file(&home_config);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ConfigNotFound` if file does not exist.
    /// Returns `ConfigError::ConfigInvalid` if TOML parsing fails.
    /// Returns `ConfigError::IoError` if file cannot be read.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))
    }

    /// Applies command-line overrides on top of the file values.
    pub fn apply_overrides(&mut self, overrides: ReportOverrides) {
        if let Some(title) = overrides.title {
            self.report.title = title;
        }
        if let Some(root_dir) = overrides.root_dir {
            self.report.root_dir = root_dir;
        }
        if let Some(out_dir) = overrides.out_dir {
            self.report.out_dir = out_dir;
        }
        if !overrides.images.is_empty() {
            self.report.images = overrides.images;
        }
        self.report.verbose |= overrides.verbose;
    }

    /// Resolves the report section, defaulting the output directory to the root.
    pub fn settings(&self) -> ReportSettings {
        let report = &self.report;
        let out_dir = if report.out_dir.as_os_str().is_empty() {
            report.root_dir.clone()
        } else {
            report.out_dir.clone()
        };

        ReportSettings {
            title: report.title.clone(),
            root_dir: report.root_dir.clone(),
            out_dir,
            images: report.images.clone(),
            verbose: report.verbose,
        }
    }

    /// Validates the segment names and builds the path rules.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidSegment` if a name is empty, contains a
    /// path separator, or is used for more than one role.
    pub fn compile_rules(&self) -> Result<SegmentRules, ConfigError> {
        let RuleSection {
            baseline_dir,
            current_dir,
            diff_dir,
        } = &self.rules;

        for segment in [baseline_dir, current_dir, diff_dir] {
            let reason = if segment.is_empty() {
                "must not be empty"
            } else if segment.contains(['/', '\\']) {
                "must be a single path segment"
            } else if segment == "." || segment == ".." {
                "must name a directory"
            } else {
                continue;
            };
            return Err(ConfigError::InvalidSegment {
                segment: segment.clone(),
                reason: reason.to_string(),
            });
        }

        let names = [baseline_dir, current_dir, diff_dir];
        for (i, name) in names.iter().enumerate() {
            if names[i + 1..].iter().any(|other| other.eq_ignore_ascii_case(name)) {
                return Err(ConfigError::InvalidSegment {
                    segment: name.to_string(),
                    reason: "used for more than one role".to_string(),
                });
            }
        }

        SegmentRules::new(baseline_dir, current_dir, diff_dir).map_err(|e| {
            ConfigError::InvalidSegment {
                segment: baseline_dir.clone(),
                reason: e.to_string(),
            }
        })
    }
}
