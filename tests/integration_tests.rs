/// Integration tests for visual-diff-report
///
/// These tests lay out screenshot directories on disk and run the complete
/// pipeline against them.
///
/// Test categories:
/// 1. Pairing scenarios
/// 2. Determinism (idempotence, discovery order)
/// 3. Folder tree projection
/// 4. Report generation, dry run and dump
/// 5. Configuration and custom rules
/// 6. Error scenarios
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use visual_diff_report::cli::{ReportCommand, run_cli, run_cli_with_config, run_with_rules};
use visual_diff_report::config::{ReportConfig, ReportOverrides, ReportSettings};
use visual_diff_report::database::{
    DatabaseBuilder, DatabaseError, DiskProbe, ReportDatabase, create_db, resolve_root,
};
use visual_diff_report::folder_tree::FolderNode;
use visual_diff_report::report::{INDEX_FILE, ReportWriter};
use visual_diff_report::rules::{PathRules, SegmentRules};

// ============================================================================
// Test Utilities
// ============================================================================

/// A temporary screenshot directory.
struct TestFixture {
    temp_dir: TempDir,
}

impl TestFixture {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        TestFixture { temp_dir }
    }

    fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Create an image at a relative path, creating parent directories.
    fn create_image(&self, rel_path: &str) {
        let file_path = self.path().join(rel_path);
        fs::create_dir_all(file_path.parent().unwrap()).expect("Failed to create directories");
        fs::write(&file_path, PNG_HEADER).expect("Failed to write image");
    }

    fn create_images(&self, rel_paths: &[&str]) {
        for rel_path in rel_paths {
            self.create_image(rel_path);
        }
    }

    fn settings(&self) -> ReportSettings {
        ReportSettings {
            title: "Fixture".to_string(),
            root_dir: self.path().to_path_buf(),
            out_dir: self.path().to_path_buf(),
            images: vec!["**/*.png".to_string()],
            verbose: false,
        }
    }

    fn config(&self) -> ReportConfig {
        let mut config = ReportConfig::default();
        config.report.root_dir = self.path().to_path_buf();
        config
    }

    fn create_db(&self) -> ReportDatabase {
        create_db(&self.settings(), &SegmentRules::default()).expect("Failed to build database")
    }

    fn assert_file_exists(&self, rel_path: &str) {
        let path = self.path().join(rel_path);
        assert!(path.is_file(), "File should exist: {}", path.display());
    }

    fn assert_file_not_exists(&self, rel_path: &str) {
        let path = self.path().join(rel_path);
        assert!(!path.exists(), "File should not exist: {}", path.display());
    }
}

/// PNG signature plus the start of an IHDR chunk.
const PNG_HEADER: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52,
];

fn strings(segments: &[&str]) -> Vec<String> {
    segments.iter().map(|s| s.to_string()).collect()
}

// ============================================================================
// Test Suite 1: Pairing Scenarios
// ============================================================================

#[test]
fn test_full_triple_yields_single_record() {
    let fixture = TestFixture::new();
    fixture.create_images(&["baseline/shapes.png", "current/shapes.png", "diff/shapes.png"]);

    let db = fixture.create_db();

    assert_eq!(db.records.len(), 1);
    let record = &db.records["baseline/shapes.png"];
    assert_eq!(record.baseline.as_deref(), Some("baseline/shapes.png"));
    assert_eq!(record.current.as_deref(), Some("current/shapes.png"));
    assert_eq!(record.diff.as_deref(), Some("diff/shapes.png"));
    assert_eq!(record.folder_path, strings(&["shapes.png"]));
}

#[test]
fn test_current_only_record() {
    let fixture = TestFixture::new();
    fixture.create_image("current/new.png");

    let db = fixture.create_db();

    assert_eq!(db.records.len(), 1);
    let (key, record) = db.records.iter().next().unwrap();
    assert_eq!(key, "baseline/new.png");
    assert!(!fixture.path().join(key).exists());
    assert_eq!(record.current.as_deref(), Some("current/new.png"));
    assert_eq!(record.baseline, None);
    assert_eq!(record.diff, None);
}

#[test]
fn test_nested_pair_without_diff_directory() {
    let fixture = TestFixture::new();
    fixture.create_images(&["baseline/a/b/x.png", "current/a/b/x.png"]);

    let db = fixture.create_db();

    let record = &db.records["baseline/a/b/x.png"];
    assert!(record.baseline.is_some());
    assert!(record.current.is_some());
    assert_eq!(record.diff, None);
    assert_eq!(record.folder_path, strings(&["a", "b", "x.png"]));
}

#[test]
fn test_baseline_without_current() {
    let fixture = TestFixture::new();
    fixture.create_images(&["baseline/old.png", "diff/old.png"]);

    let db = fixture.create_db();

    let record = &db.records["baseline/old.png"];
    assert_eq!(record.current, None);
    assert_eq!(record.diff.as_deref(), Some("diff/old.png"));
}

#[test]
fn test_stray_diff_images_are_not_records() {
    let fixture = TestFixture::new();
    fixture.create_images(&["diff/orphan.png", "notes/readme.png"]);

    let db = fixture.create_db();
    assert!(db.records.is_empty());
}

#[test]
fn test_only_matching_files_are_discovered() {
    let fixture = TestFixture::new();
    fixture.create_images(&["baseline/a.png", "baseline/.b.png"]);
    fs::write(fixture.path().join("baseline/notes.txt"), "not an image").unwrap();

    let db = fixture.create_db();

    assert_eq!(db.records.keys().collect::<Vec<_>>(), vec!["baseline/a.png"]);
}

#[test]
fn test_overlapping_patterns_discover_once() {
    let fixture = TestFixture::new();
    fixture.create_images(&["baseline/a.png", "current/a.png"]);
    let mut settings = fixture.settings();
    settings.images = vec!["**/*.png".to_string(), "baseline/*.png".to_string()];

    let db = create_db(&settings, &SegmentRules::default()).unwrap();
    assert_eq!(db.records.len(), 1);
}

#[test]
fn test_paths_are_root_relative_and_root_is_absolute() {
    let fixture = TestFixture::new();
    fixture.create_images(&["suite/baseline/login/form.png", "suite/current/login/form.png"]);

    let db = fixture.create_db();

    assert!(Path::new(&db.root_directory).is_absolute());
    assert!(!db.root_directory.contains('\\'));
    for record in db.records.values() {
        for path in record.paths() {
            assert!(!path.starts_with('/'));
            assert!(!path.contains('\\'));
            fixture.assert_file_exists(path);
        }
    }
    let record = &db.records["suite/baseline/login/form.png"];
    assert_eq!(record.folder_path, strings(&["suite", "login", "form.png"]));
}

// ============================================================================
// Test Suite 2: Determinism
// ============================================================================

fn mixed_fixture() -> TestFixture {
    let fixture = TestFixture::new();
    fixture.create_images(&[
        "baseline/home.png",
        "current/home.png",
        "diff/home.png",
        "baseline/settings/profile.png",
        "current/settings/profile.png",
        "baseline/removed.png",
        "current/added.png",
    ]);
    fixture
}

#[test]
fn test_builder_is_idempotent() {
    let fixture = mixed_fixture();
    assert_eq!(fixture.create_db(), fixture.create_db());
}

#[test]
fn test_discovery_order_does_not_change_records() {
    let fixture = mixed_fixture();
    let root = resolve_root(fixture.path()).unwrap();
    let rules = SegmentRules::default();
    let probe = DiskProbe;

    let mut discovered = vec![
        "baseline/home.png",
        "current/home.png",
        "diff/home.png",
        "baseline/settings/profile.png",
        "current/settings/profile.png",
        "baseline/removed.png",
        "current/added.png",
    ];

    let build = |order: &[&str]| {
        let mut builder = DatabaseBuilder::new(root.clone(), &rules, &probe);
        for path in order {
            builder.insert_path(path);
        }
        builder.build("Order")
    };

    let forward = build(&discovered);
    discovered.reverse();
    let backward = build(&discovered);
    discovered.rotate_left(3);
    let rotated = build(&discovered);

    assert_eq!(forward.records, backward.records);
    assert_eq!(forward.records, rotated.records);
    assert_eq!(forward.records, fixture.create_db().records);
    assert_eq!(forward.records.len(), 4);
}

// ============================================================================
// Test Suite 3: Folder Tree
// ============================================================================

#[test]
fn test_folder_tree_round_trip() {
    let fixture = mixed_fixture();
    let db = fixture.create_db();
    let tree = FolderNode::build(&db);

    for record in db.records.values() {
        let found = tree
            .record_at(&record.folder_path)
            .expect("record should be reachable by its folder path");
        assert!(std::ptr::eq(found, record));
    }

    let leaves = tree.leaves();
    assert_eq!(leaves.len(), db.records.len());
    for (_, leaf) in leaves {
        assert!(db.records.values().any(|record| std::ptr::eq(record, leaf)));
    }
}

#[test]
fn test_folder_tree_groups_by_directory() {
    let fixture = mixed_fixture();
    let db = fixture.create_db();
    let tree = FolderNode::build(&db);

    let settings = tree.child("settings").expect("settings folder");
    assert!(matches!(settings, FolderNode::Branch { .. }));
    assert!(matches!(settings.child("profile.png"), Some(FolderNode::Leaf(_))));
    assert!(matches!(tree.child("home.png"), Some(FolderNode::Leaf(_))));
}

// ============================================================================
// Test Suite 4: Generation, Dry Run and Dump
// ============================================================================

#[test]
fn test_generate_copies_images_to_out_dir() {
    let fixture = TestFixture::new();
    fixture.create_images(&["baseline/shapes.png", "current/shapes.png", "diff/shapes.png"]);
    let out = TempDir::new().unwrap();

    let mut config = fixture.config();
    config.report.out_dir = out.path().join("report");

    run_cli(ReportCommand::Generate { dry_run: false }, &config).unwrap();

    let report_dir = out.path().join("report");
    assert!(report_dir.join(INDEX_FILE).is_file());
    assert!(report_dir.join("baseline/shapes.png").is_file());
    assert!(report_dir.join("current/shapes.png").is_file());
    assert!(report_dir.join("diff/shapes.png").is_file());

    let html = fs::read_to_string(report_dir.join(INDEX_FILE)).unwrap();
    assert!(html.contains("<title>Unnamed Diff</title>"));
    assert!(html.contains("baseline/shapes.png"));
}

#[test]
fn test_generate_in_place_does_not_copy() {
    let fixture = TestFixture::new();
    fixture.create_images(&["baseline/a.png", "current/a.png"]);

    let db = fixture.create_db();
    let written = ReportWriter::write(&db, fixture.path(), false).unwrap();

    assert_eq!(written.copied_images, 0);
    fixture.assert_file_exists(INDEX_FILE);
}

#[test]
fn test_generated_page_embeds_database() {
    let fixture = mixed_fixture();
    let db = fixture.create_db();
    let out = TempDir::new().unwrap();

    let written = ReportWriter::write(&db, out.path(), false).unwrap();
    assert_eq!(written.copied_images, db.image_paths().len());

    let html = fs::read_to_string(&written.index_path).unwrap();
    let start_tag = "<script type=\"application/json\" id=\"visual-diff-db\">";
    let start = html.find(start_tag).unwrap() + start_tag.len();
    let end = start + html[start..].find("</script>").unwrap();
    let embedded: ReportDatabase = serde_json::from_str(&html[start..end]).unwrap();

    assert_eq!(embedded, db);
}

#[test]
fn test_verbose_generate_matches_quiet_run() {
    let fixture = mixed_fixture();
    let quiet = fixture.create_db();

    let mut settings = fixture.settings();
    settings.verbose = true;
    let loud = create_db(&settings, &SegmentRules::default()).unwrap();
    assert_eq!(loud, quiet);

    let out = TempDir::new().unwrap();
    settings.out_dir = out.path().to_path_buf();
    run_with_rules(
        ReportCommand::Generate { dry_run: false },
        &settings,
        &SegmentRules::default(),
    )
    .unwrap();

    let html = fs::read_to_string(out.path().join(INDEX_FILE)).unwrap();
    assert!(html.contains("settings"));
    assert!(out.path().join("current/added.png").is_file());
}

#[test]
fn test_dry_run_writes_nothing() {
    let fixture = TestFixture::new();
    fixture.create_images(&["baseline/a.png", "current/a.png"]);
    let out = TempDir::new().unwrap();
    let out_dir = out.path().join("report");

    let mut config = fixture.config();
    config.report.out_dir = out_dir.clone();

    run_cli(ReportCommand::Generate { dry_run: true }, &config).unwrap();

    assert!(!out_dir.exists());
    fixture.assert_file_not_exists(INDEX_FILE);
}

#[test]
fn test_dump_writes_nothing() {
    let fixture = TestFixture::new();
    fixture.create_images(&["baseline/a.png"]);

    run_cli(ReportCommand::Dump, &fixture.config()).unwrap();

    fixture.assert_file_not_exists(INDEX_FILE);
}

// ============================================================================
// Test Suite 5: Configuration and Custom Rules
// ============================================================================

#[test]
fn test_config_file_and_overrides() {
    let fixture = TestFixture::new();
    fixture.create_images(&["expected/a.png", "actual/a.png", "delta/a.png"]);
    let out = TempDir::new().unwrap();

    let config_path = fixture.path().join("report.toml");
    fs::write(
        &config_path,
        format!(
            "[report]\ntitle = \"From file\"\nroot_dir = {:?}\n\n[rules]\nbaseline_dir = \"expected\"\ncurrent_dir = \"actual\"\ndiff_dir = \"delta\"\n",
            fixture.path().to_string_lossy()
        ),
    )
    .unwrap();

    let overrides = ReportOverrides {
        title: Some("From flag".to_string()),
        out_dir: Some(out.path().to_path_buf()),
        ..Default::default()
    };
    run_cli_with_config(
        ReportCommand::Generate { dry_run: false },
        Some(&config_path),
        overrides,
    )
    .unwrap();

    let html = fs::read_to_string(out.path().join(INDEX_FILE)).unwrap();
    assert!(html.contains("<title>From flag</title>"));
    assert!(out.path().join("delta/a.png").is_file());
}

#[test]
fn test_missing_config_file_is_an_error() {
    let result = run_cli_with_config(
        ReportCommand::Dump,
        Some(Path::new("/non/existent/report.toml")),
        ReportOverrides::default(),
    );
    assert!(result.is_err());
}

/// Non-mirrored layout: `shots/<name>.png` against `shots/<name>.actual.png`,
/// with diffs next to them as `<name>.diff.png`.
struct SuffixRules;

impl PathRules for SuffixRules {
    fn is_baseline(&self, path: &str) -> bool {
        path.ends_with(".png") && !path.ends_with(".actual.png") && !path.ends_with(".diff.png")
    }

    fn is_current(&self, path: &str) -> bool {
        path.ends_with(".actual.png")
    }

    fn baseline_to_current(&self, baseline_path: &str) -> String {
        baseline_path.replace(".png", ".actual.png")
    }

    fn current_to_baseline(&self, current_path: &str) -> String {
        current_path.replace(".actual.png", ".png")
    }

    fn baseline_to_diff(&self, baseline_path: &str) -> String {
        baseline_path.replace(".png", ".diff.png")
    }

    fn fold(&self, path: &str) -> Vec<String> {
        path.split('/').map(str::to_string).collect()
    }
}

#[test]
fn test_custom_rules_pair_suffixed_files() {
    let fixture = TestFixture::new();
    fixture.create_images(&[
        "shots/login.png",
        "shots/login.actual.png",
        "shots/login.diff.png",
        "shots/signup.actual.png",
    ]);

    let db = create_db(&fixture.settings(), &SuffixRules).unwrap();

    assert_eq!(db.records.len(), 2);
    let login = &db.records["shots/login.png"];
    assert_eq!(login.current.as_deref(), Some("shots/login.actual.png"));
    assert_eq!(login.diff.as_deref(), Some("shots/login.diff.png"));
    assert_eq!(login.folder_path, strings(&["shots", "login.png"]));

    let signup = &db.records["shots/signup.png"];
    assert_eq!(signup.baseline, None);
    assert_eq!(signup.folder_path, strings(&["shots", "signup.actual.png"]));

    run_with_rules(ReportCommand::Dump, &fixture.settings(), &SuffixRules).unwrap();
}

/// Rules that map everything outside the root; the builder must not crash.
struct EscapingRules;

impl PathRules for EscapingRules {
    fn is_baseline(&self, path: &str) -> bool {
        path.starts_with("baseline/")
    }

    fn is_current(&self, _path: &str) -> bool {
        false
    }

    fn baseline_to_current(&self, _baseline_path: &str) -> String {
        "../../nowhere.png".to_string()
    }

    fn current_to_baseline(&self, current_path: &str) -> String {
        current_path.to_string()
    }

    fn baseline_to_diff(&self, _baseline_path: &str) -> String {
        String::new()
    }

    fn fold(&self, _path: &str) -> Vec<String> {
        Vec::new()
    }
}

#[test]
fn test_misbehaving_rules_do_not_crash() {
    let fixture = TestFixture::new();
    fixture.create_images(&["baseline/a.png", "baseline/b.png"]);

    let db = create_db(&fixture.settings(), &EscapingRules).unwrap();

    assert_eq!(db.records.len(), 2);
    for record in db.records.values() {
        assert_eq!(record.current, None);
        assert_eq!(record.diff, None);
    }
    assert_eq!(FolderNode::build(&db).leaf_count(), 1);
}

// ============================================================================
// Test Suite 6: Error Scenarios
// ============================================================================

#[test]
fn test_missing_root_directory_is_fatal() {
    let mut settings = TestFixture::new().settings();
    settings.root_dir = PathBuf::from("/non/existent/screenshots");

    let result = create_db(&settings, &SegmentRules::default());
    assert!(matches!(result, Err(DatabaseError::InvalidRootDir { .. })));
}

#[test]
fn test_root_must_be_a_directory() {
    let fixture = TestFixture::new();
    fixture.create_image("single.png");
    let mut settings = fixture.settings();
    settings.root_dir = fixture.path().join("single.png");

    let result = create_db(&settings, &SegmentRules::default());
    assert!(matches!(result, Err(DatabaseError::InvalidRootDir { .. })));
}

#[test]
fn test_invalid_glob_pattern_is_reported() {
    let fixture = TestFixture::new();
    let mut settings = fixture.settings();
    settings.images = vec!["[invalid".to_string()];

    let result = create_db(&settings, &SegmentRules::default());
    assert!(matches!(result, Err(DatabaseError::InvalidGlobPattern { .. })));
}

#[test]
fn test_empty_directory_generates_empty_report() {
    let fixture = TestFixture::new();

    run_cli(ReportCommand::Generate { dry_run: false }, &fixture.config()).unwrap();

    fixture.assert_file_exists(INDEX_FILE);
    let html = fs::read_to_string(fixture.path().join(INDEX_FILE)).unwrap();
    assert!(html.contains("No images found."));
}
