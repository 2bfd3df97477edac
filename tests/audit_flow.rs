//! End-to-end audit flow over a fabricated project and dependency closure.
//!
//! These tests lay out a real directory tree (build unit manifest, source and
//! resource roots, descriptor files) plus real jar archives, then drive the
//! library pipeline and the installed binary against them.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use assert_cmd::Command;
use tempfile::TempDir;

use modaudit::model::{ArtifactCoordinate, DependencyNode, PackagingKind, ProjectModel};
use modaudit::report;
use modaudit::resolver::{InheritanceStatus, ResolveOptions};

// ============================================================================
// Fixtures
// ============================================================================

fn write_file(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn write_archive(path: &Path, entries: &[(&str, &str)]) {
    let file = File::create(path).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    let options = zip::write::SimpleFileOptions::default();
    for (name, content) in entries {
        zip.start_file(*name, options).unwrap();
        zip.write_all(content.as_bytes()).unwrap();
    }
    zip.finish().unwrap();
}

/// One project inheriting `lib.Core` (present in the closure) and
/// `lib.Missing` (absent).
fn sample_project(dir: &TempDir) -> ProjectModel {
    let base = dir.path().join("app");
    fs::create_dir_all(base.join("src")).unwrap();
    write_file(
        &base.join("resources/app.moduledesc"),
        r#"<module>
            <inherits name="lib.Core"/>
            <inherits name="lib.Missing"/>
            <source path="client"/>
        </module>"#,
    );

    let jar = dir.path().join("repo/lib-1.0.jar");
    fs::create_dir_all(jar.parent().unwrap()).unwrap();
    write_archive(&jar, &[("lib/Core.moduledesc", "<module/>")]);

    ProjectModel {
        base_dir: base,
        packaging: PackagingKind::Application,
        source_roots: vec!["src".into()],
        dependencies: vec![DependencyNode::new(
            ArtifactCoordinate::new("com.acme", "lib", "1.0"),
            Some(jar),
        )],
    }
}

// ============================================================================
// Library Pipeline
// ============================================================================

#[test]
fn audit_resolves_and_reports_missing_declarations() {
    let dir = TempDir::new().unwrap();
    let project = sample_project(&dir);

    let resolution = modaudit::run_audit(&project, &ResolveOptions::default()).unwrap();
    assert!(resolution.has_warnings);

    let app = resolution.modules.iter().find(|m| m.name == "app").unwrap();
    assert_eq!(
        app.declarations[0].status,
        InheritanceStatus::Resolved {
            artifact: ArtifactCoordinate::new("com.acme", "lib", "1.0"),
        }
    );
    assert_eq!(app.declarations[1].status, InheritanceStatus::Missing);

    // The indexed lib.Core module is processed too and declares nothing.
    let core = resolution
        .modules
        .iter()
        .find(|m| m.name == "lib.Core")
        .unwrap();
    assert!(core.declarations.is_empty());

    let missing = resolution.missing_by_module();
    assert_eq!(missing.len(), 1);
    assert!(missing["app"].contains("lib.Missing"));
}

#[test]
fn persisted_document_mirrors_the_console_findings() {
    let dir = TempDir::new().unwrap();
    let project = sample_project(&dir);

    let resolution = modaudit::run_audit(&project, &ResolveOptions::default()).unwrap();
    let document_path = dir.path().join("inheritance.xml");
    report::write_document(&resolution, &document_path).unwrap();

    let document = fs::read_to_string(&document_path).unwrap();
    assert!(document.contains("<name>app</name>"));
    assert!(document.contains("<declaration>lib.Core</declaration>"));
    assert!(document.contains("<artifact>com.acme:lib:1.0</artifact>"));
    assert!(document.contains("<missing-inherit>lib.Missing</missing-inherit>"));
}

#[test]
fn aggregator_projects_short_circuit_before_any_discovery() {
    let project = ProjectModel {
        base_dir: "/definitely/missing".into(),
        packaging: PackagingKind::Aggregator,
        source_roots: vec!["src".into()],
        dependencies: Vec::new(),
    };

    // Roots do not exist; the aggregator skip must win over discovery errors.
    let resolution = modaudit::run_audit(&project, &ResolveOptions::default()).unwrap();
    assert!(resolution.modules.is_empty());
    assert!(!resolution.has_warnings);
}

#[test]
fn corrupt_dependency_archive_aborts_the_run() {
    let dir = TempDir::new().unwrap();
    let mut project = sample_project(&dir);
    let broken = dir.path().join("repo/broken-1.0.jar");
    fs::write(&broken, b"not a zip").unwrap();
    project
        .dependencies
        .push(DependencyNode::new(
            ArtifactCoordinate::new("com.acme", "broken", "1.0"),
            Some(broken),
        ));

    let err = modaudit::run_audit(&project, &ResolveOptions::default()).unwrap_err();
    assert_eq!(err.exit_code().code(), 3);
    assert!(err.to_string().contains("broken-1.0.jar"));
}

// ============================================================================
// Binary
// ============================================================================

fn write_project_document(dir: &TempDir, project: &ProjectModel) -> std::path::PathBuf {
    let path = dir.path().join("project.json");
    fs::write(&path, serde_json::to_string(project).unwrap()).unwrap();
    path
}

#[test]
fn check_succeeds_with_warnings_by_default() {
    let dir = TempDir::new().unwrap();
    let project = sample_project(&dir);
    let document = write_project_document(&dir, &project);

    Command::cargo_bin("modaudit")
        .unwrap()
        .args(["check", document.to_str().unwrap()])
        .assert()
        .success();
}

#[test]
fn check_fails_with_exit_code_one_when_warnings_are_fatal() {
    let dir = TempDir::new().unwrap();
    let project = sample_project(&dir);
    let document = write_project_document(&dir, &project);

    Command::cargo_bin("modaudit")
        .unwrap()
        .args(["check", document.to_str().unwrap(), "--fail-on-warning"])
        .assert()
        .failure()
        .code(1);
}

#[test]
fn check_persists_the_report_when_asked() {
    let dir = TempDir::new().unwrap();
    let project = sample_project(&dir);
    let document = write_project_document(&dir, &project);
    let report_file = dir.path().join("inheritance.xml");

    Command::cargo_bin("modaudit")
        .unwrap()
        .args([
            "check",
            document.to_str().unwrap(),
            "--file-output",
            "--report-file",
            report_file.to_str().unwrap(),
        ])
        .assert()
        .success();
    assert!(report_file.exists());
}

#[test]
fn check_exits_with_index_code_on_corrupt_archive() {
    let dir = TempDir::new().unwrap();
    let mut project = sample_project(&dir);
    let broken = dir.path().join("repo/broken-1.0.jar");
    fs::write(&broken, b"not a zip").unwrap();
    project.dependencies[0].archive = Some(broken);
    let document = write_project_document(&dir, &project);

    Command::cargo_bin("modaudit")
        .unwrap()
        .args(["check", document.to_str().unwrap()])
        .assert()
        .failure()
        .code(3);
}

#[test]
fn sources_prints_discovered_roots() {
    let dir = TempDir::new().unwrap();
    let unit = dir.path().join("widgets");
    write_file(&unit.join("unit.json"), "{}");
    fs::create_dir_all(unit.join("src")).unwrap();
    write_file(&unit.join("resources/Widgets.moduledesc"), "<module/>");
    write_file(&dir.path().join("unit.json"), "{}");

    let output = Command::cargo_bin("modaudit")
        .unwrap()
        .args(["sources", "--roots", dir.path().to_str().unwrap()])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Source directory:"));
    assert!(stdout.contains("added."));
}

#[test]
fn sources_rejects_both_include_and_exclude_patterns() {
    Command::cargo_bin("modaudit")
        .unwrap()
        .args([
            "sources",
            "--roots",
            "/definitely/missing",
            "--includes",
            "A",
            "--excludes",
            "B",
        ])
        .assert()
        .failure()
        .code(2);
}
