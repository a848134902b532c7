//! Report database construction.
//!
//! The database is built once per invocation from a snapshot of the root
//! directory: every image matching the configured glob patterns is resolved
//! through [`pair`](crate::rules::pair) and stored under its logical key.
//! Resolving the same artifact twice (once from its baseline, once from its
//! current image) overwrites the same key with the same record.
use crate::config::ReportSettings;
use crate::output::OutputFormatter;
use crate::rules::{PathRules, classify, normalize_path, pair};
use glob::{MatchOptions, Pattern};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

/// One logical artifact: a baseline and/or current image plus an optional diff.
///
/// At least one of `baseline` and `current` is always set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRecord {
    /// Root-relative path of the reference image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baseline: Option<String>,
    /// Root-relative path of the latest captured image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current: Option<String>,
    /// Root-relative path of the precomputed diff image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diff: Option<String>,
    /// Folder segments used to group the record, ending with its leaf name.
    pub folder_path: Vec<String>,
}

impl ImageRecord {
    /// True when both baseline and current images are present.
    pub fn is_pair(&self) -> bool {
        self.baseline.is_some() && self.current.is_some()
    }

    /// All image paths referenced by this record.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        [&self.baseline, &self.current, &self.diff]
            .into_iter()
            .filter_map(|path| path.as_deref())
    }
}

/// The full report database, embedded as JSON into the generated report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportDatabase {
    /// Display title of the report.
    pub title: String,
    /// Absolute, forward-slash path every record path is relative to.
    pub root_directory: String,
    /// Records by logical key.
    pub records: BTreeMap<String, ImageRecord>,
}

/// Record counts used for summaries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DatabaseStats {
    /// Total number of records.
    pub records: usize,
    /// Records with both a baseline and a current image.
    pub pairs: usize,
    /// Records whose current image is missing.
    pub baseline_only: usize,
    /// Records whose baseline image is missing.
    pub current_only: usize,
    /// Records with a diff image.
    pub with_diff: usize,
}

impl ReportDatabase {
    /// Counts records by completeness.
    pub fn stats(&self) -> DatabaseStats {
        let mut stats = DatabaseStats {
            records: self.records.len(),
            ..Default::default()
        };
        for record in self.records.values() {
            match (&record.baseline, &record.current) {
                (Some(_), Some(_)) => stats.pairs += 1,
                (Some(_), None) => stats.baseline_only += 1,
                (None, Some(_)) => stats.current_only += 1,
                (None, None) => {}
            }
            if record.diff.is_some() {
                stats.with_diff += 1;
            }
        }
        stats
    }

    /// Every image path referenced by any record, deduplicated and sorted.
    pub fn image_paths(&self) -> Vec<&str> {
        let mut paths: Vec<&str> = self.records.values().flat_map(ImageRecord::paths).collect();
        paths.sort_unstable();
        paths.dedup();
        paths
    }

    /// Serializes the database as pretty-printed JSON.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Errors that can occur while building the database.
#[derive(Debug)]
pub enum DatabaseError {
    /// The root directory is missing or not a directory.
    InvalidRootDir {
        path: PathBuf,
        source: std::io::Error,
    },
    /// A glob pattern could not be parsed.
    InvalidGlobPattern { pattern: String, reason: String },
    /// A directory entry could not be read during discovery.
    DiscoveryFailed { path: PathBuf, reason: String },
}

impl std::fmt::Display for DatabaseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidRootDir { path, source } => {
                write!(f, "Invalid root directory {}: {}", path.display(), source)
            }
            Self::InvalidGlobPattern { pattern, reason } => {
                write!(f, "Invalid glob pattern '{}': {}", pattern, reason)
            }
            Self::DiscoveryFailed { path, reason } => {
                write!(f, "Failed to read {}: {}", path.display(), reason)
            }
        }
    }
}

impl std::error::Error for DatabaseError {}

/// Result type for database operations.
pub type DatabaseResult<T> = Result<T, DatabaseError>;

/// Answers whether a file exists. The only filesystem access the builder performs.
pub trait FileProbe {
    fn exists(&self, path: &Path) -> bool;
}

/// Probe backed by the real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiskProbe;

impl FileProbe for DiskProbe {
    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }
}

/// Lazily lists the files under `root` matching any of `patterns`.
///
/// Yielded paths are root-relative and normalized; a file matched by several
/// patterns is yielded once. Wildcards never match a leading `.` in a file
/// name, so hidden files only match when a pattern names the dot.
///
/// # Errors
///
/// Fails up front if a pattern is invalid. Unreadable entries are yielded as
/// errors while iterating.
pub fn discover_images<'a>(
    root: &'a Path,
    patterns: &[String],
) -> DatabaseResult<impl Iterator<Item = DatabaseResult<String>> + use<'a>> {
    let options = MatchOptions {
        case_sensitive: true,
        require_literal_separator: true,
        require_literal_leading_dot: true,
    };
    let escaped_root = Pattern::escape(&root.to_string_lossy());

    let walkers = patterns
        .iter()
        .map(|pattern| {
            let full = format!("{}/{}", escaped_root, normalize_path(pattern));
            glob::glob_with(&full, options).map_err(|e| DatabaseError::InvalidGlobPattern {
                pattern: pattern.clone(),
                reason: e.to_string(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut seen = HashSet::new();
    Ok(walkers
        .into_iter()
        .flatten()
        .filter_map(move |entry| match entry {
            Err(e) => Some(Err(DatabaseError::DiscoveryFailed {
                path: e.path().to_path_buf(),
                reason: e.error().to_string(),
            })),
            Ok(path) => {
                if !path.is_file() {
                    return None;
                }
                let relative = normalize_path(&path.strip_prefix(root).ok()?.to_string_lossy());
                seen.insert(relative.clone()).then_some(Ok(relative))
            }
        }))
}

/// Accumulates records one discovered path at a time.
pub struct DatabaseBuilder<'a> {
    root: PathBuf,
    rules: &'a dyn PathRules,
    probe: &'a dyn FileProbe,
    verbose: bool,
    records: BTreeMap<String, ImageRecord>,
}

impl<'a> DatabaseBuilder<'a> {
    /// Creates a builder resolving paths relative to `root`.
    pub fn new(
        root: impl Into<PathBuf>,
        rules: &'a dyn PathRules,
        probe: &'a dyn FileProbe,
    ) -> Self {
        Self {
            root: root.into(),
            rules,
            probe,
            verbose: false,
            records: BTreeMap::new(),
        }
    }

    /// Enables per-path diagnostics.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Resolves one root-relative path and stores its record, replacing any
    /// record already held under the same key.
    ///
    /// Returns the key when the path was a pairing root.
    pub fn insert_path(&mut self, path: &str) -> Option<String> {
        if self.verbose {
            let role = classify(self.rules, &normalize_path(path));
            OutputFormatter::processed(path, role);
        }

        let (key, record) = pair(self.rules, self.probe, &self.root, path)?;
        self.records.insert(key.clone(), record);
        Some(key)
    }

    /// Consumes discovered paths until the source is exhausted.
    ///
    /// # Errors
    ///
    /// Stops at and returns the first discovery error.
    pub fn extend<I>(&mut self, paths: I) -> DatabaseResult<()>
    where
        I: IntoIterator<Item = DatabaseResult<String>>,
    {
        for path in paths {
            self.insert_path(&path?);
        }
        Ok(())
    }

    /// Finishes the database.
    pub fn build(self, title: impl Into<String>) -> ReportDatabase {
        ReportDatabase {
            title: title.into(),
            root_directory: self.root.to_string_lossy().replace('\\', "/"),
            records: self.records,
        }
    }
}

/// Resolves `root_dir` to an absolute directory path.
///
/// # Errors
///
/// Returns `DatabaseError::InvalidRootDir` if it is missing or not a directory.
pub fn resolve_root(root_dir: &Path) -> DatabaseResult<PathBuf> {
    let root = fs::canonicalize(root_dir).map_err(|e| DatabaseError::InvalidRootDir {
        path: root_dir.to_path_buf(),
        source: e,
    })?;
    if !root.is_dir() {
        return Err(DatabaseError::InvalidRootDir {
            path: root_dir.to_path_buf(),
            source: std::io::Error::other("not a directory"),
        });
    }
    Ok(root)
}

/// Scans the configured root directory and builds the report database.
///
/// # Examples
///
/// ```no_run
/// use visual_diff_report::config::ReportConfig;
/// use visual_diff_report::database::create_db;
///
/// let config = ReportConfig::default();
/// let rules = config.compile_rules().unwrap();
/// let db = create_db(&config.settings(), &rules).unwrap();
/// println!("{} records", db.records.len());
/// ```
pub fn create_db(
    settings: &ReportSettings,
    rules: &dyn PathRules,
) -> DatabaseResult<ReportDatabase> {
    let root = resolve_root(&settings.root_dir)?;
    let probe = DiskProbe;

    let mut builder = DatabaseBuilder::new(root.clone(), rules, &probe).verbose(settings.verbose);
    builder.extend(discover_images(&root, &settings.images)?)?;
    Ok(builder.build(settings.title.clone()))
}
