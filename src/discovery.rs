//! Local module discovery.
//!
//! Two independent modes, both yielding candidate descriptor locations:
//!
//! - **Own-module mode** ([`collect_own_descriptors`]): walk every compile
//!   source root of the current project plus its canonical resource root and
//!   collect every `.moduledesc` file. No filtering; this is what the project
//!   itself declares.
//! - **Nested-discovery mode** ([`NestedDiscovery`]): starting from one or
//!   more root directories, descend only into directories that are build
//!   units (marked by a `unit.json` manifest) and report the `src/` and
//!   `resources/` roots of every unit whose resources contain at least one
//!   descriptor matching the configured include/exclude name patterns. Used
//!   by the build system to auto-register additional compile roots.
//!
//! Both modes fail fast on a missing or unreadable directory; there is no
//! per-path recovery here.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::descriptor::{self, DESCRIPTOR_SUFFIX};
use crate::error::AuditError;
use crate::model::{ProjectModel, RESOURCE_ROOT};

/// Marker file identifying a directory as a build unit.
pub const UNIT_MANIFEST: &str = "unit.json";

/// Canonical source root of a build unit, relative to its directory.
pub const SOURCE_ROOT: &str = "src";

// ============================================================================
// Own-Module Discovery
// ============================================================================

/// One descriptor file belonging to the current project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalDescriptor {
    /// Absolute path of the descriptor file.
    pub path: PathBuf,
    /// Logical module name derived from the path relative to its root.
    pub logical_name: String,
}

/// Collect every descriptor the current project itself declares.
///
/// Walks each compile source root plus `base_dir/resources`. Results are
/// sorted by path and deduplicated (overlapping roots keep the first logical
/// name seen). A missing or unreadable root is a fatal error naming the path.
pub fn collect_own_descriptors(
    project: &ProjectModel,
) -> Result<Vec<LocalDescriptor>, AuditError> {
    let mut found: BTreeMap<PathBuf, String> = BTreeMap::new();
    for root in &project.source_roots {
        let root = project.absolute_source_root(root);
        walk_descriptor_root(&root, &mut found)?;
    }
    walk_descriptor_root(&project.resource_root(), &mut found)?;
    Ok(found
        .into_iter()
        .map(|(path, logical_name)| LocalDescriptor { path, logical_name })
        .collect())
}

fn walk_descriptor_root(
    root: &Path,
    found: &mut BTreeMap<PathBuf, String>,
) -> Result<(), AuditError> {
    if !root.is_dir() {
        return Err(AuditError::unreadable_path(root));
    }
    for entry in WalkDir::new(root) {
        let entry = entry.map_err(|e| AuditError::scan(root, e))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if !name.ends_with(DESCRIPTOR_SUFFIX) {
            continue;
        }
        let location = relative_location(root, entry.path());
        debug!("found descriptor {}", entry.path().display());
        found
            .entry(entry.path().to_path_buf())
            .or_insert_with(|| descriptor::logical_name(&location));
    }
    Ok(())
}

/// Path of `path` relative to `root`, with forward slashes on every platform.
fn relative_location(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

// ============================================================================
// Nested Discovery
// ============================================================================

/// Recursive build-unit discovery with include/exclude name filters.
///
/// Patterns are plain substrings matched against descriptor file names (no
/// globs, no regex); include and exclude are mutually exclusive.
#[derive(Debug, Clone, Default)]
pub struct NestedDiscovery {
    roots: Vec<PathBuf>,
    includes: Vec<String>,
    excludes: Vec<String>,
}

impl NestedDiscovery {
    /// Create a discovery over the given root directories.
    pub fn new<I, P>(roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        NestedDiscovery {
            roots: roots.into_iter().map(Into::into).collect(),
            includes: Vec::new(),
            excludes: Vec::new(),
        }
    }

    /// Restrict matches to descriptor names containing one of these patterns.
    pub fn with_includes<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.includes = patterns.into_iter().map(Into::into).collect();
        self
    }

    /// Reject matches whose descriptor names contain one of these patterns.
    pub fn with_excludes<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excludes = patterns.into_iter().map(Into::into).collect();
        self
    }

    /// Run the discovery and return every qualifying source/resource root.
    ///
    /// Configuration is validated before any filesystem access: supplying
    /// both include and exclude patterns is an error.
    pub fn discover(&self) -> Result<BTreeSet<PathBuf>, AuditError> {
        if !self.includes.is_empty() && !self.excludes.is_empty() {
            return Err(AuditError::configuration(
                "only one of 'includes' or 'excludes' can be provided",
            ));
        }
        let mut discovered = BTreeSet::new();
        for root in &self.roots {
            self.descend(root, &mut discovered)?;
        }
        Ok(discovered)
    }

    /// Depth-first descent from one root over an explicit stack.
    ///
    /// Only directories that are build units are entered; a unit whose
    /// resources hold at least one matching descriptor contributes its
    /// `src/` and `resources/` directories, both of which must be readable.
    fn descend(
        &self,
        root: &Path,
        discovered: &mut BTreeSet<PathBuf>,
    ) -> Result<(), AuditError> {
        let mut stack = vec![root.to_path_buf()];
        while let Some(dir) = stack.pop() {
            check_readable_directory(&dir)?;
            if !is_build_unit(&dir) {
                continue;
            }
            debug!("build unit {}", dir.display());
            if self.unit_has_matching_descriptor(&dir)? {
                let sources = dir.join(SOURCE_ROOT);
                check_readable_directory(&sources)?;
                let resources = dir.join(RESOURCE_ROOT);
                check_readable_directory(&resources)?;
                discovered.insert(sources);
                discovered.insert(resources);
            }
            let mut children = child_directories(&dir)?;
            children.sort();
            while let Some(child) = children.pop() {
                stack.push(child);
            }
        }
        Ok(())
    }

    fn unit_has_matching_descriptor(&self, unit: &Path) -> Result<bool, AuditError> {
        let resources = unit.join(RESOURCE_ROOT);
        if !resources.exists() {
            return Ok(false);
        }
        for entry in WalkDir::new(&resources) {
            let entry = entry.map_err(|e| AuditError::scan(&resources, e))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy();
            if name.ends_with(DESCRIPTOR_SUFFIX) && self.matches(&name) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn matches(&self, file_name: &str) -> bool {
        if !self.includes.is_empty() {
            matches_pattern(file_name, &self.includes)
        } else if !self.excludes.is_empty() {
            !matches_pattern(file_name, &self.excludes)
        } else {
            true
        }
    }
}

/// True when the candidate contains any of the patterns as a substring.
fn matches_pattern(candidate: &str, patterns: &[String]) -> bool {
    patterns.iter().any(|p| candidate.contains(p.as_str()))
}

fn is_build_unit(dir: &Path) -> bool {
    dir.join(UNIT_MANIFEST).is_file()
}

fn child_directories(dir: &Path) -> Result<Vec<PathBuf>, AuditError> {
    let mut children = Vec::new();
    let entries = fs::read_dir(dir).map_err(|e| AuditError::scan(dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| AuditError::scan(dir, e))?;
        let path = entry.path();
        if path.is_dir() {
            children.push(path);
        }
    }
    Ok(children)
}

fn check_readable_directory(path: &Path) -> Result<(), AuditError> {
    if !path.is_dir() {
        return Err(AuditError::unreadable_directory(path));
    }
    fs::read_dir(path)
        .map(|_| ())
        .map_err(|_| AuditError::unreadable_directory(path))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::fs;

    use tempfile::TempDir;

    use crate::error::AuditExitCode;
    use crate::model::PackagingKind;

    fn write_file(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn project_at(base_dir: &Path, source_roots: &[&str]) -> ProjectModel {
        ProjectModel {
            base_dir: base_dir.to_path_buf(),
            packaging: PackagingKind::Library,
            source_roots: source_roots.iter().map(PathBuf::from).collect(),
            dependencies: Vec::new(),
        }
    }

    mod own_module_mode {
        use super::*;

        #[test]
        fn collects_descriptors_from_all_roots() {
            let dir = TempDir::new().unwrap();
            let base = dir.path();
            write_file(&base.join("src/com/acme/App.moduledesc"), "<module/>");
            write_file(&base.join("src/com/acme/App.txt"), "not a descriptor");
            write_file(&base.join("resources/com/acme/Widgets.moduledesc"), "<module/>");

            let found = collect_own_descriptors(&project_at(base, &["src"])).unwrap();
            let names: Vec<&str> = found.iter().map(|d| d.logical_name.as_str()).collect();
            assert_eq!(names.len(), 2);
            assert!(names.contains(&"com.acme.App"));
            assert!(names.contains(&"com.acme.Widgets"));
        }

        #[test]
        fn logical_name_is_relative_to_the_walked_root() {
            let dir = TempDir::new().unwrap();
            let base = dir.path();
            write_file(&base.join("resources/com/acme/Deep.moduledesc"), "<module/>");
            fs::create_dir_all(base.join("src")).unwrap();

            let found = collect_own_descriptors(&project_at(base, &["src"])).unwrap();
            assert_eq!(found.len(), 1);
            assert_eq!(found[0].logical_name, "com.acme.Deep");
        }

        #[test]
        fn results_are_sorted_by_path() {
            let dir = TempDir::new().unwrap();
            let base = dir.path();
            write_file(&base.join("resources/b/Two.moduledesc"), "<module/>");
            write_file(&base.join("resources/a/One.moduledesc"), "<module/>");
            fs::create_dir_all(base.join("src")).unwrap();

            let found = collect_own_descriptors(&project_at(base, &["src"])).unwrap();
            assert!(found[0].path < found[1].path);
        }

        #[test]
        fn missing_source_root_is_fatal() {
            let dir = TempDir::new().unwrap();
            let base = dir.path();
            fs::create_dir_all(base.join("resources")).unwrap();

            let err = collect_own_descriptors(&project_at(base, &["no-such-root"])).unwrap_err();
            assert_eq!(err.exit_code(), AuditExitCode::Configuration);
            assert!(err.to_string().contains("no-such-root"));
        }

        #[test]
        fn missing_resource_root_is_fatal() {
            let dir = TempDir::new().unwrap();
            let base = dir.path();
            fs::create_dir_all(base.join("src")).unwrap();

            let err = collect_own_descriptors(&project_at(base, &["src"])).unwrap_err();
            assert!(err.to_string().contains("resources"));
        }
    }

    mod nested_mode {
        use super::*;

        /// Lay out one build unit with a descriptor under its resources.
        fn make_unit(dir: &Path, descriptor_name: &str) {
            write_file(&dir.join(UNIT_MANIFEST), "{}");
            fs::create_dir_all(dir.join(SOURCE_ROOT)).unwrap();
            write_file(
                &dir.join(RESOURCE_ROOT).join(descriptor_name),
                "<module/>",
            );
        }

        #[test]
        fn reports_source_and_resource_roots_of_qualifying_units() {
            let dir = TempDir::new().unwrap();
            let unit = dir.path().join("app");
            make_unit(&unit, "App.moduledesc");
            write_file(&dir.path().join(UNIT_MANIFEST), "{}");

            let discovered = NestedDiscovery::new([dir.path()]).discover().unwrap();
            assert!(discovered.contains(&unit.join(SOURCE_ROOT)));
            assert!(discovered.contains(&unit.join(RESOURCE_ROOT)));
        }

        #[test]
        fn does_not_descend_into_non_unit_directories() {
            let dir = TempDir::new().unwrap();
            write_file(&dir.path().join(UNIT_MANIFEST), "{}");
            // A unit nested below a plain directory is unreachable.
            let hidden = dir.path().join("plain/app");
            make_unit(&hidden, "App.moduledesc");

            let discovered = NestedDiscovery::new([dir.path()]).discover().unwrap();
            assert!(discovered.is_empty());
        }

        #[test]
        fn include_patterns_select_units() {
            let dir = TempDir::new().unwrap();
            write_file(&dir.path().join(UNIT_MANIFEST), "{}");
            let app = dir.path().join("app");
            make_unit(&app, "App.moduledesc");
            let lib = dir.path().join("lib");
            make_unit(&lib, "Core.moduledesc");

            let discovered = NestedDiscovery::new([dir.path()])
                .with_includes(["App"])
                .discover()
                .unwrap();
            assert!(discovered.contains(&app.join(SOURCE_ROOT)));
            assert!(!discovered.contains(&lib.join(SOURCE_ROOT)));
        }

        #[test]
        fn exclude_patterns_reject_units() {
            let dir = TempDir::new().unwrap();
            write_file(&dir.path().join(UNIT_MANIFEST), "{}");
            let app = dir.path().join("app");
            make_unit(&app, "App.moduledesc");
            let lib = dir.path().join("lib");
            make_unit(&lib, "Core.moduledesc");

            let discovered = NestedDiscovery::new([dir.path()])
                .with_excludes(["App"])
                .discover()
                .unwrap();
            assert!(!discovered.contains(&app.join(SOURCE_ROOT)));
            assert!(discovered.contains(&lib.join(SOURCE_ROOT)));
        }

        #[test]
        fn both_patterns_fail_before_any_walk() {
            // The roots do not exist; the configuration error must win.
            let err = NestedDiscovery::new(["/definitely/missing"])
                .with_includes(["A"])
                .with_excludes(["B"])
                .discover()
                .unwrap_err();
            assert!(matches!(err, AuditError::Configuration { .. }));
        }

        #[test]
        fn missing_root_is_fatal() {
            let err = NestedDiscovery::new(["/definitely/missing"])
                .discover()
                .unwrap_err();
            assert!(matches!(err, AuditError::UnreadableDirectory { .. }));
        }

        #[test]
        fn qualifying_unit_without_source_dir_is_fatal() {
            let dir = TempDir::new().unwrap();
            let unit = dir.path();
            write_file(&unit.join(UNIT_MANIFEST), "{}");
            write_file(
                &unit.join(RESOURCE_ROOT).join("App.moduledesc"),
                "<module/>",
            );

            let err = NestedDiscovery::new([unit]).discover().unwrap_err();
            assert!(matches!(err, AuditError::UnreadableDirectory { .. }));
            assert!(err.to_string().contains("src"));
        }

        #[test]
        fn unit_without_matching_descriptor_contributes_nothing() {
            let dir = TempDir::new().unwrap();
            let unit = dir.path();
            write_file(&unit.join(UNIT_MANIFEST), "{}");
            fs::create_dir_all(unit.join(SOURCE_ROOT)).unwrap();
            fs::create_dir_all(unit.join(RESOURCE_ROOT)).unwrap();

            let discovered = NestedDiscovery::new([unit]).discover().unwrap();
            assert!(discovered.is_empty());
        }
    }
}
