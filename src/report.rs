/// Report output: a static HTML page plus the images it shows.
///
/// The page embeds the whole database as a JSON payload so that a richer
/// viewer can pick it up, and renders the folder tree as nested sections
/// with the baseline, current and diff image of each record.
use crate::database::{ImageRecord, ReportDatabase};
use crate::folder_tree::FolderNode;
use crate::output::OutputFormatter;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the generated page inside the output directory.
pub const INDEX_FILE: &str = "index.html";

/// Element id of the embedded JSON payload.
pub const DB_SCRIPT_ID: &str = "visual-diff-db";

/// Errors that can occur while writing a report.
#[derive(Debug)]
pub enum ReportError {
    /// Failed to create the output directory.
    OutputDirFailed {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to write the HTML page.
    WriteFailed {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to copy an image into the output directory.
    CopyFailed {
        source: PathBuf,
        destination: PathBuf,
        source_error: std::io::Error,
    },
    /// The database could not be serialized.
    SerializeFailed { reason: String },
}

impl std::fmt::Display for ReportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OutputDirFailed { path, source } => {
                write!(
                    f,
                    "Failed to create output directory {}: {}",
                    path.display(),
                    source
                )
            }
            Self::WriteFailed { path, source } => {
                write!(f, "Failed to write {}: {}", path.display(), source)
            }
            Self::CopyFailed {
                source,
                destination,
                source_error,
            } => {
                write!(
                    f,
                    "Failed to copy {} to {}: {}",
                    source.display(),
                    destination.display(),
                    source_error
                )
            }
            Self::SerializeFailed { reason } => {
                write!(f, "Failed to serialize report database: {}", reason)
            }
        }
    }
}

impl std::error::Error for ReportError {}

/// Result type for report operations.
pub type ReportResult<T> = Result<T, ReportError>;

/// What a report run wrote.
#[derive(Debug, Clone)]
pub struct WrittenReport {
    /// Path of the generated page.
    pub index_path: PathBuf,
    /// Number of images copied into the output directory.
    pub copied_images: usize,
}

/// Writes reports to disk.
pub struct ReportWriter;

impl ReportWriter {
    /// Writes `index.html` into `out_dir` and copies every referenced image
    /// there, unless `out_dir` already is the database root.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use visual_diff_report::config::ReportConfig;
    /// use visual_diff_report::database::create_db;
    /// use visual_diff_report::report::ReportWriter;
    /// use std::path::Path;
    ///
    /// let config = ReportConfig::default();
    /// let db = create_db(&config.settings(), &config.compile_rules().unwrap()).unwrap();
    /// let written = ReportWriter::write(&db, Path::new("public"), false).unwrap();
    /// println!("wrote {}", written.index_path.display());
    /// ```
    pub fn write(
        db: &ReportDatabase,
        out_dir: &Path,
        show_progress: bool,
    ) -> ReportResult<WrittenReport> {
        fs::create_dir_all(out_dir).map_err(|e| ReportError::OutputDirFailed {
            path: out_dir.to_path_buf(),
            source: e,
        })?;

        let root = Path::new(&db.root_directory);
        let copied_images = if Self::same_directory(root, out_dir) {
            0
        } else {
            Self::copy_images(db, root, out_dir, show_progress)?
        };

        let generated_at = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        let html = render_html(db, &generated_at)?;
        let index_path = out_dir.join(INDEX_FILE);
        fs::write(&index_path, html).map_err(|e| ReportError::WriteFailed {
            path: index_path.clone(),
            source: e,
        })?;

        Ok(WrittenReport {
            index_path,
            copied_images,
        })
    }

    fn same_directory(a: &Path, b: &Path) -> bool {
        match (fs::canonicalize(a), fs::canonicalize(b)) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        }
    }

    /// Copies every image of the database from `root` to `out_dir`, keeping
    /// relative paths.
    fn copy_images(
        db: &ReportDatabase,
        root: &Path,
        out_dir: &Path,
        show_progress: bool,
    ) -> ReportResult<usize> {
        let paths = db.image_paths();
        let progress =
            show_progress.then(|| OutputFormatter::create_progress_bar(paths.len() as u64));

        for relative in &paths {
            let source = root.join(relative);
            let destination = out_dir.join(relative);

            if let Some(parent) = destination.parent() {
                fs::create_dir_all(parent).map_err(|e| ReportError::OutputDirFailed {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
            }
            fs::copy(&source, &destination).map_err(|e| ReportError::CopyFailed {
                source: source.clone(),
                destination: destination.clone(),
                source_error: e,
            })?;

            if let Some(pb) = &progress {
                pb.set_message(relative.to_string());
                pb.inc(1);
            }
        }

        if let Some(pb) = progress {
            pb.finish_with_message("images copied");
        }
        Ok(paths.len())
    }
}

/// Renders the report page.
///
/// # Errors
///
/// Returns `ReportError::SerializeFailed` if the database cannot be encoded.
pub fn render_html(db: &ReportDatabase, generated_at: &str) -> ReportResult<String> {
    let payload = serde_json::to_string(db).map_err(|e| ReportError::SerializeFailed {
        reason: e.to_string(),
    })?;
    let title = escape_html(&db.title);

    let mut body = String::new();
    match FolderNode::build(db) {
        FolderNode::Branch {
            record: None,
            children,
        } if children.is_empty() => {
            body.push_str("<p class=\"empty\">No images found.</p>\n");
        }
        tree => render_node(&mut body, None, &tree),
    }

    Ok(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title}</title>
<style>
body {{ font-family: sans-serif; margin: 20px; }}
h4 {{ font-weight: 100; margin-top: 0; }}
details {{ margin-left: 10px; }}
summary {{ cursor: pointer; border-bottom: 1px dashed rgba(0, 0, 0, 0.2); padding: 4px 0; }}
.item {{ margin: 10px 0 20px 10px; }}
.images {{ display: flex; gap: 10px; }}
figure {{ margin: 0; flex: 1; }}
figure img {{ max-width: 100%; }}
.missing {{ color: rgba(0, 0, 0, 0.4); font-style: italic; }}
</style>
</head>
<body>
<h1>{title}</h1>
<h4>Generated {generated_at}</h4>
{body}<script type="application/json" id="{script_id}">{payload}</script>
</body>
</html>
"#,
        title = title,
        generated_at = escape_html(generated_at),
        body = body,
        script_id = DB_SCRIPT_ID,
        payload = escape_script(&payload),
    ))
}

/// Renders a node; `name` is `None` for the root, which gets no `<details>`.
fn render_node(out: &mut String, name: Option<&str>, node: &FolderNode<'_>) {
    match node {
        FolderNode::Leaf(record) => render_record(out, name.unwrap_or_default(), record),
        FolderNode::Branch { record, children } => {
            if let Some(name) = name {
                let _ = writeln!(out, "<details open>\n<summary>{}</summary>", escape_html(name));
            }
            if let Some(record) = record {
                let label = record.folder_path.last().map(String::as_str).unwrap_or_default();
                render_record(out, label, record);
            }
            for (child_name, child) in children {
                render_node(out, Some(child_name), child);
            }
            if name.is_some() {
                out.push_str("</details>\n");
            }
        }
    }
}

fn render_record(out: &mut String, label: &str, record: &ImageRecord) {
    let _ = writeln!(
        out,
        "<div class=\"item\">\n<h3>{}</h3>\n<div class=\"images\">",
        escape_html(label)
    );
    for (caption, path) in [
        ("baseline", &record.baseline),
        ("current", &record.current),
        ("diff", &record.diff),
    ] {
        match path {
            Some(path) => {
                let src = escape_html(path);
                let _ = writeln!(
                    out,
                    "<figure><figcaption>{caption}</figcaption><a href=\"{src}\"><img src=\"{src}\" alt=\"{caption}\" loading=\"lazy\"></a></figure>"
                );
            }
            None => {
                let _ = writeln!(
                    out,
                    "<figure><figcaption>{caption}</figcaption><p class=\"missing\">no {caption} image</p></figure>"
                );
            }
        }
    }
    out.push_str("</div>\n</div>\n");
}

/// Escapes text for use in HTML content and attribute values.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Keeps a JSON payload from terminating its surrounding script element.
fn escape_script(json: &str) -> String {
    json.replace("</", "<\\/").replace("<!--", "\\u003c!--")
}
