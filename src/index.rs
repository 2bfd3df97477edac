//! Dependency artifact indexing.
//!
//! Builds the indexed module universe: every `.moduledesc` entry inside every
//! archive of the transitive dependency closure, mapped to the coordinate of
//! the artifact that owns it. The traversal is pre-order depth-first over the
//! dependency tree, so index order (and therefore suffix-match tie-breaking)
//! is deterministic for a given closure.
//!
//! Unlike per-descriptor parse failures, an unreadable or corrupt archive is
//! fatal for the whole run: with part of the universe missing, every
//! subsequent resolution would be unreliable.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use tracing::debug;
use zip::ZipArchive;

use crate::descriptor::{self, DescriptorError, DESCRIPTOR_SUFFIX};
use crate::error::AuditError;
use crate::model::{ArtifactCoordinate, DependencyNode};

/// File suffix identifying an indexable dependency archive.
pub const ARCHIVE_SUFFIX: &str = ".jar";

// ============================================================================
// Indexed Universe
// ============================================================================

/// One module found inside a dependency archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedModule {
    /// Logical name derived from the archive entry path.
    pub logical_name: String,
    /// Archive the entry lives in.
    pub archive: PathBuf,
    /// Entry path inside the archive.
    pub entry_path: String,
    /// Coordinate of the owning artifact.
    pub coordinate: ArtifactCoordinate,
}

impl IndexedModule {
    /// Human-readable location of this entry (`archive!entry`).
    pub fn location(&self) -> String {
        format!("{}!{}", self.archive.display(), self.entry_path)
    }
}

/// The complete indexed module universe, in discovery order.
#[derive(Debug, Default)]
pub struct ModuleIndex {
    entries: Vec<IndexedModule>,
}

impl ModuleIndex {
    /// All indexed entries, in discovery order.
    pub fn entries(&self) -> &[IndexedModule] {
        &self.entries
    }

    /// Number of indexed entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no archive contributed any module.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve an inheritance declaration against the universe.
    ///
    /// A declaration matches an entry when the entry's logical name ends
    /// with the declared name. The first match in index order wins; further
    /// candidates are reported at debug level but never change the outcome.
    pub fn resolve(&self, declaration: &str) -> Option<&IndexedModule> {
        let mut candidates = self
            .entries
            .iter()
            .filter(|m| m.logical_name.ends_with(declaration));
        let first = candidates.next()?;
        let extra = candidates.count();
        if extra > 0 {
            debug!(
                "{extra} additional index entries match '{declaration}' by suffix; keeping {}",
                first.logical_name
            );
        }
        Some(first)
    }
}

// ============================================================================
// Indexing
// ============================================================================

/// Index every archive in the transitive dependency forest.
///
/// Pre-order depth-first: a node is indexed before its children, children in
/// declaration order. Nodes without a resolved `.jar` archive are skipped.
pub fn index_dependencies(roots: &[DependencyNode]) -> Result<ModuleIndex, AuditError> {
    let mut entries = Vec::new();
    let mut stack: Vec<&DependencyNode> = roots.iter().rev().collect();
    while let Some(node) = stack.pop() {
        index_artifact(node, &mut entries)?;
        for child in node.children.iter().rev() {
            stack.push(child);
        }
    }
    debug!("indexed {} descriptor entries", entries.len());
    Ok(ModuleIndex { entries })
}

fn index_artifact(
    node: &DependencyNode,
    entries: &mut Vec<IndexedModule>,
) -> Result<(), AuditError> {
    let Some(archive) = node.archive.as_deref() else {
        debug!("skipping unresolved artifact {}", node.coordinate);
        return Ok(());
    };
    let is_archive = archive
        .file_name()
        .map(|n| n.to_string_lossy().ends_with(ARCHIVE_SUFFIX))
        .unwrap_or(false);
    if !is_archive {
        debug!("skipping non-archive artifact {}", node.coordinate);
        return Ok(());
    }
    let file = File::open(archive).map_err(|e| AuditError::index(archive, e))?;
    let mut zip = ZipArchive::new(file).map_err(|e| AuditError::index(archive, e))?;
    for i in 0..zip.len() {
        let entry = zip.by_index(i).map_err(|e| AuditError::index(archive, e))?;
        let name = entry.name();
        if name.ends_with(DESCRIPTOR_SUFFIX) {
            entries.push(IndexedModule {
                logical_name: descriptor::logical_name(name),
                archive: archive.to_path_buf(),
                entry_path: name.to_string(),
                coordinate: node.coordinate.clone(),
            });
        }
    }
    Ok(())
}

// ============================================================================
// Entry Reads
// ============================================================================

/// Read the UTF-8 content of one archive entry.
///
/// The archive is opened and closed within this call; failures are the
/// recoverable per-descriptor kind, not indexing errors, because by the time
/// entries are read back the universe is already built.
pub fn read_archive_entry(archive: &Path, entry_path: &str) -> Result<String, DescriptorError> {
    let location = format!("{}!{}", archive.display(), entry_path);
    let file = File::open(archive).map_err(|e| DescriptorError::read(&location, e))?;
    let mut zip = ZipArchive::new(file).map_err(|e| DescriptorError::read(&location, e))?;
    let mut entry = zip
        .by_name(entry_path)
        .map_err(|e| DescriptorError::read(&location, e))?;
    let mut content = String::new();
    entry
        .read_to_string(&mut content)
        .map_err(|e| DescriptorError::read(&location, e))?;
    Ok(content)
}

// ============================================================================
// Tests
// ============================================================================
