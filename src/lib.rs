//! visual-diff-report - baseline/current screenshot comparison reports
//!
//! This library discovers baseline, current and diff images under a root
//! directory, pairs them into records, groups the records into a folder tree
//! and writes a static report embedding the result as JSON.

pub mod cli;
pub mod config;
pub mod database;
pub mod folder_tree;
pub mod output;
pub mod report;
pub mod rules;

pub use config::{ConfigError, ReportConfig, ReportOverrides, ReportSettings};
pub use database::{
    DatabaseBuilder, DatabaseError, DiskProbe, FileProbe, ImageRecord, ReportDatabase, create_db,
};
pub use folder_tree::FolderNode;
pub use report::{ReportError, ReportWriter};
pub use rules::{PathRules, Role, SegmentRules};

pub use cli::{ReportCommand, run_cli};
