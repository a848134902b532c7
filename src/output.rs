//! Output formatting and styling module.
//!
//! Provides a centralized interface for all CLI output: colored status lines,
//! verbose per-path diagnostics, progress tracking and the report summary.

use crate::database::DatabaseStats;
use crate::rules::Role;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

/// Manages all CLI output with consistent styling and formatting.
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use visual_diff_report::output::OutputFormatter;
    /// OutputFormatter::success("Report written");
    /// ```
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    /// Prints an info message in cyan.
    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    /// Prints a regular message without styling.
    pub fn plain(message: &str) {
        println!("{}", message);
    }

    /// Prints a labelled value, e.g. `outDir /tmp/report`.
    pub fn labelled(label: &str, value: &str) {
        println!("{} {}", label.blue(), value);
    }

    /// Prints a section header.
    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Verbose diagnostic for one discovered path.
    pub fn processed(path: &str, role: Role) {
        println!(
            "{} {} determined as {}",
            "processed".blue(),
            path,
            role.label().cyan()
        );
    }

    /// Creates and returns a progress bar for copying images.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use visual_diff_report::output::OutputFormatter;
    /// let pb = OutputFormatter::create_progress_bar(100);
    /// pb.inc(1);
    /// pb.finish_with_message("copied");
    /// ```
    pub fn create_progress_bar(total: u64) -> ProgressBar {
        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .expect("Invalid progress bar template")
                .progress_chars("█▓░"),
        );
        pb
    }

    /// Prints a summary table of the records in the report.
    pub fn summary_table(stats: &DatabaseStats) {
        Self::header("SUMMARY");

        let rows = [
            ("Complete pairs", stats.pairs),
            ("Baseline only", stats.baseline_only),
            ("Current only", stats.current_only),
            ("With diff", stats.with_diff),
        ];
        let width = rows.iter().map(|(name, _)| name.len()).max().unwrap_or(0);

        println!("{:<width$} | {}", "Kind".bold(), "Records".bold(), width = width);
        println!("{}", "-".repeat(width + 12));
        for (name, count) in rows {
            println!(
                "{:<width$} | {}",
                name,
                count.to_string().green(),
                width = width
            );
        }
        println!("{}", "-".repeat(width + 12));
        println!(
            "{:<width$} | {} {}",
            "Total".bold(),
            stats.records.to_string().green().bold(),
            if stats.records == 1 { "record" } else { "records" },
            width = width
        );
    }

    /// Prints a dry-run notice message.
    pub fn dry_run_notice(message: &str) {
        println!("{}", format!("[DRY RUN] {}", message).yellow());
    }
}
