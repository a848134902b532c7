use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use visual_diff_report::cli::{ReportCommand, run_cli_with_config};
use visual_diff_report::config::ReportOverrides;
use visual_diff_report::output::OutputFormatter;

#[derive(Parser)]
#[command(name = "visual-diff-report")]
#[command(about = "Build a browsable report comparing baseline and current screenshots")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file (defaults to .visualdiffrc.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Report title
    #[arg(long, global = true)]
    title: Option<String>,

    /// Directory the images are searched in
    #[arg(long, global = true)]
    root_dir: Option<PathBuf>,

    /// Output directory (defaults to the root directory)
    #[arg(long, global = true)]
    out_dir: Option<PathBuf>,

    /// Glob pattern for image files, relative to the root directory; repeatable
    #[arg(long = "glob", global = true)]
    images: Vec<String>,

    /// Print every processed file
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the report (default)
    Generate {
        /// Show what would be written without writing anything
        #[arg(long)]
        dry_run: bool,
    },
    /// Print the report database as JSON
    Dump,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let command = match cli.command {
        Some(Commands::Generate { dry_run }) => ReportCommand::Generate { dry_run },
        Some(Commands::Dump) => ReportCommand::Dump,
        None => ReportCommand::Generate { dry_run: false },
    };
    let overrides = ReportOverrides {
        title: cli.title,
        root_dir: cli.root_dir,
        out_dir: cli.out_dir,
        images: cli.images,
        verbose: cli.verbose,
    };

    match run_cli_with_config(command, cli.config.as_deref(), overrides) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            OutputFormatter::error(&e);
            ExitCode::FAILURE
        }
    }
}
