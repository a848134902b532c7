//! Path classification and pairing rules.
//!
//! Every discovered image is looked at through a [`PathRules`] implementation
//! which decides whether the path is a *baseline* or a *current* image and
//! derives the paths of its counterparts. The default implementation,
//! [`SegmentRules`], relies on directory segments:
//!
//! ```text
//! baseline/login/form.png  <->  current/login/form.png
//!            \
//!             diff/login/form.png
//! ```
//!
//! # Examples
//!
//! ```
//! use visual_diff_report::rules::{PathRules, SegmentRules};
//!
//! let rules = SegmentRules::default();
//! assert!(rules.is_baseline("baseline/login/form.png"));
//! assert_eq!(rules.baseline_to_current("baseline/login/form.png"), "current/login/form.png");
//! assert_eq!(rules.fold("baseline/login/form.png"), vec!["login", "form.png"]);
//! ```
use crate::database::{FileProbe, ImageRecord};
use regex::{Captures, Regex};
use std::fmt;
use std::path::Path;

/// Classification and path derivation capabilities used by the database builder.
///
/// Implementors may override each mapping independently, e.g. for layouts
/// where baseline and current images are not mirrored directory trees.
/// All inputs are normalized, root-relative, forward-slash paths.
pub trait PathRules {
    /// Returns true for paths of baseline (reference) images.
    fn is_baseline(&self, path: &str) -> bool;

    /// Returns true for paths of current (latest captured) images.
    fn is_current(&self, path: &str) -> bool;

    /// Maps a baseline image to the path of its current image.
    fn baseline_to_current(&self, baseline_path: &str) -> String;

    /// Maps a current image to the path of its baseline image.
    fn current_to_baseline(&self, current_path: &str) -> String;

    /// Maps a baseline image to the path of its diff image.
    fn baseline_to_diff(&self, baseline_path: &str) -> String;

    /// Splits a path into the folder segments used for grouping.
    fn fold(&self, path: &str) -> Vec<String>;
}

/// The role a discovered path plays in a comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Reference image.
    Baseline,
    /// Latest captured image.
    Current,
    /// Anything else; assumed to be diff imagery found along the way.
    Diff,
}

impl Role {
    /// Lowercase name used in diagnostics.
    pub fn label(&self) -> &'static str {
        match self {
            Role::Baseline => "baseline",
            Role::Current => "current",
            Role::Diff => "diff",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Determines the role of a path. Baseline wins if both predicates match.
pub fn classify<R: PathRules + ?Sized>(rules: &R, path: &str) -> Role {
    if rules.is_baseline(path) {
        Role::Baseline
    } else if rules.is_current(path) {
        Role::Current
    } else {
        Role::Diff
    }
}

/// Normalizes a path to the root-relative, forward-slash form all rules expect.
///
/// Backslashes become `/`, a leading `/` or drive prefix such as `C:/` is
/// dropped, `.` and empty segments disappear and `..` cancels the preceding
/// segment. A colon not followed by a separator is part of the name.
///
/// # Examples
///
/// ```
/// use visual_diff_report::rules::normalize_path;
///
/// assert_eq!(normalize_path(r"baseline\login\form.png"), "baseline/login/form.png");
/// assert_eq!(normalize_path("./current//a/../b.png"), "current/b.png");
/// assert_eq!(normalize_path("C:/shots/x.png"), "shots/x.png");
/// ```
pub fn normalize_path(path: &str) -> String {
    let unified = path.replace('\\', "/");
    let bytes = unified.as_bytes();
    let rest = if bytes.len() >= 3
        && bytes[0].is_ascii_alphabetic()
        && bytes[1] == b':'
        && bytes[2] == b'/'
    {
        &unified[3..]
    } else {
        unified.as_str()
    };

    let mut segments: Vec<&str> = Vec::new();
    for segment in rest.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.last().is_some_and(|last| *last != "..") {
                    segments.pop();
                } else {
                    segments.push(segment);
                }
            }
            _ => segments.push(segment),
        }
    }
    segments.join("/")
}

/// Default rules: images live under `baseline/`, `current/` and `diff/`
/// directory segments which otherwise mirror each other.
#[derive(Debug, Clone)]
pub struct SegmentRules {
    baseline_dir: String,
    current_dir: String,
    diff_dir: String,
    baseline_segment: Regex,
    current_segment: Regex,
    any_segment: Regex,
}

impl SegmentRules {
    /// Creates rules for the given directory segment names.
    ///
    /// # Errors
    ///
    /// Returns an error if the generated patterns fail to compile.
    pub fn new(
        baseline_dir: &str,
        current_dir: &str,
        diff_dir: &str,
    ) -> Result<Self, regex::Error> {
        let segment = |name: &str| Regex::new(&format!("(^|/){}/", regex::escape(name)));
        let any_segment = Regex::new(&format!(
            "(?i)(^|/)({}|{}|{})/",
            regex::escape(current_dir),
            regex::escape(baseline_dir),
            regex::escape(diff_dir)
        ))?;

        Ok(Self {
            baseline_dir: baseline_dir.to_string(),
            current_dir: current_dir.to_string(),
            diff_dir: diff_dir.to_string(),
            baseline_segment: segment(baseline_dir)?,
            current_segment: segment(current_dir)?,
            any_segment,
        })
    }

    /// Replaces the first segment matched by `pattern` with `replacement/`.
    fn swap_segment(pattern: &Regex, path: &str, replacement: &str) -> String {
        pattern
            .replacen(&normalize_path(path), 1, |caps: &Captures| {
                format!("{}{}/", &caps[1], replacement)
            })
            .into_owned()
    }
}

impl Default for SegmentRules {
    fn default() -> Self {
        Self::new("baseline", "current", "diff").expect("default segment patterns are valid")
    }
}

impl PathRules for SegmentRules {
    fn is_baseline(&self, path: &str) -> bool {
        self.baseline_segment.is_match(&normalize_path(path))
    }

    fn is_current(&self, path: &str) -> bool {
        self.current_segment.is_match(&normalize_path(path))
    }

    fn baseline_to_current(&self, baseline_path: &str) -> String {
        Self::swap_segment(&self.baseline_segment, baseline_path, &self.current_dir)
    }

    fn current_to_baseline(&self, current_path: &str) -> String {
        Self::swap_segment(&self.current_segment, current_path, &self.baseline_dir)
    }

    fn baseline_to_diff(&self, baseline_path: &str) -> String {
        Self::swap_segment(&self.baseline_segment, baseline_path, &self.diff_dir)
    }

    fn fold(&self, path: &str) -> Vec<String> {
        self.any_segment
            .replacen(&normalize_path(path), 1, |caps: &Captures| caps[1].to_string())
            .split('/')
            .filter(|segment| !segment.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Resolves one discovered path into its logical key and record.
///
/// Returns `None` for paths that are neither baseline nor current. Existence
/// checks run against `root.join(candidate)` through `probe`.
///
/// A current image whose baseline is missing still gets the *derived*
/// baseline path as its key, so that the same artifact lands on the same key
/// once its baseline is added.
pub fn pair<R, P>(rules: &R, probe: &P, root: &Path, path: &str) -> Option<(String, ImageRecord)>
where
    R: PathRules + ?Sized,
    P: FileProbe + ?Sized,
{
    let path = normalize_path(path);
    let exists = |candidate: &str| probe.exists(&root.join(candidate));

    let (key, baseline, current) = match classify(rules, &path) {
        Role::Baseline => {
            let current = normalize_path(&rules.baseline_to_current(&path));
            let current = exists(&current).then_some(current);
            (path.clone(), Some(path), current)
        }
        Role::Current => {
            let derived = normalize_path(&rules.current_to_baseline(&path));
            let baseline = exists(&derived).then(|| derived.clone());
            (derived, baseline, Some(path))
        }
        Role::Diff => return None,
    };

    let diff = baseline
        .as_deref()
        .map(|baseline| normalize_path(&rules.baseline_to_diff(baseline)))
        .filter(|diff| exists(diff));
    let folder_path = rules.fold(baseline.as_deref().or(current.as_deref())?);

    Some((
        key,
        ImageRecord {
            baseline,
            current,
            diff,
            folder_path,
        },
    ))
}
