//! Command-line interface module for visual-diff-report.
//!
//! This module handles command orchestration:
//! - Configuration loading and overrides
//! - Database construction
//! - Report generation (or a dry run of it)
//! - Dumping the database as JSON

use crate::config::{ReportConfig, ReportOverrides, ReportSettings};
use crate::database::{ReportDatabase, create_db};
use crate::output::OutputFormatter;
use crate::report::{INDEX_FILE, ReportWriter};
use crate::rules::PathRules;
use std::path::Path;

/// Represents a CLI command to execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportCommand {
    /// Build the database and write the report.
    Generate {
        /// If true, only show what would be written.
        dry_run: bool,
    },
    /// Print the database as JSON.
    Dump,
}

/// Runs a command with configuration loaded from disk and command-line overrides.
///
/// # Examples
///
/// ```no_run
/// use visual_diff_report::cli::{run_cli_with_config, ReportCommand};
/// use visual_diff_report::config::ReportOverrides;
///
/// let overrides = ReportOverrides {
///     root_dir: Some("test-data".into()),
///     ..Default::default()
/// };
/// match run_cli_with_config(ReportCommand::Generate { dry_run: false }, None, overrides) {
///     Ok(()) => println!("Report generated"),
///     Err(e) => eprintln!("Error: {}", e),
/// }
/// ```
pub fn run_cli_with_config(
    command: ReportCommand,
    config_path: Option<&Path>,
    overrides: ReportOverrides,
) -> Result<(), String> {
    let mut config = ReportConfig::load(config_path)
        .map_err(|e| format!("Error loading configuration: {}", e))?;
    config.apply_overrides(overrides);
    run_cli(command, &config)
}

/// Runs a command with an already assembled configuration.
pub fn run_cli(command: ReportCommand, config: &ReportConfig) -> Result<(), String> {
    let rules = config
        .compile_rules()
        .map_err(|e| format!("Error compiling path rules: {}", e))?;
    run_with_rules(command, &config.settings(), &rules)
}

/// Runs a command with custom path rules.
///
/// Use this to plug in classification and mapping logic that the
/// configuration file cannot express.
pub fn run_with_rules(
    command: ReportCommand,
    settings: &ReportSettings,
    rules: &dyn PathRules,
) -> Result<(), String> {
    let db = create_db(settings, rules).map_err(|e| format!("Error building database: {}", e))?;

    match command {
        ReportCommand::Generate { dry_run: false } => generate_report(&db, settings),
        ReportCommand::Generate { dry_run: true } => generate_report_dry_run(&db, settings),
        ReportCommand::Dump => dump_database(&db),
    }
}

/// Writes the report and prints a summary.
fn generate_report(db: &ReportDatabase, settings: &ReportSettings) -> Result<(), String> {
    if settings.verbose {
        OutputFormatter::labelled("outDir", &settings.out_dir.display().to_string());
    }

    let written = ReportWriter::write(db, &settings.out_dir, !settings.verbose)
        .map_err(|e| format!("Error writing report: {}", e))?;

    OutputFormatter::summary_table(&db.stats());
    if written.copied_images > 0 {
        OutputFormatter::info(&format!(
            "Copied {} images to {}",
            written.copied_images,
            settings.out_dir.display()
        ));
    }
    if db.records.is_empty() {
        OutputFormatter::warning("No baseline or current images matched; the report is empty.");
    }
    OutputFormatter::success(&format!("Report written to {}", written.index_path.display()));

    Ok(())
}

/// Shows what `generate` would write without touching the filesystem.
fn generate_report_dry_run(db: &ReportDatabase, settings: &ReportSettings) -> Result<(), String> {
    OutputFormatter::dry_run_notice(&format!(
        "Report for {} would be written to {}",
        db.root_directory,
        settings.out_dir.join(INDEX_FILE).display()
    ));

    for (key, record) in &db.records {
        let mut parts = Vec::new();
        if record.baseline.is_some() {
            parts.push("baseline");
        }
        if record.current.is_some() {
            parts.push("current");
        }
        if record.diff.is_some() {
            parts.push("diff");
        }
        OutputFormatter::plain(&format!(" - {} [{}]", key, parts.join(", ")));
    }

    OutputFormatter::summary_table(&db.stats());
    OutputFormatter::success("Dry run complete. No files were written.");
    Ok(())
}

/// Prints the database JSON to stdout.
fn dump_database(db: &ReportDatabase) -> Result<(), String> {
    let json = db
        .to_json_pretty()
        .map_err(|e| format!("Error serializing database: {}", e))?;
    println!("{}", json);
    Ok(())
}
