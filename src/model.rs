//! Project model: the collaborator contracts consumed by the audit engine.
//!
//! modaudit never talks to the build system directly. The surrounding build
//! tool dumps one JSON document per project containing everything the engine
//! needs: the project base directory, its packaging kind, its compile source
//! roots, and the pre-resolved transitive dependency tree (each node carrying
//! an artifact coordinate and, when resolved, a local archive path). This
//! module defines those types and the document loader.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::AuditError;

/// Canonical resource root of a build unit, relative to its base directory.
pub const RESOURCE_ROOT: &str = "resources";

// ============================================================================
// Artifact Coordinates
// ============================================================================

/// Coordinate of one dependency artifact, as resolved by the build system.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArtifactCoordinate {
    /// Owning group identifier.
    pub group: String,
    /// Artifact name.
    pub name: String,
    /// Resolved version.
    pub version: String,
    /// Optional classifier (not rendered in report output).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classifier: Option<String>,
}

impl ArtifactCoordinate {
    /// Create a coordinate without a classifier.
    pub fn new(
        group: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        ArtifactCoordinate {
            group: group.into(),
            name: name.into(),
            version: version.into(),
            classifier: None,
        }
    }
}

impl fmt::Display for ArtifactCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group, self.name, self.version)
    }
}

// ============================================================================
// Dependency Tree
// ============================================================================

/// One node of the transitive dependency tree.
///
/// `archive` is the locally resolved artifact file when the build system
/// managed to resolve one; unresolved and directory-based artifacts carry
/// `None` and are skipped by the indexer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyNode {
    /// Coordinate of this artifact.
    pub coordinate: ArtifactCoordinate,
    /// Resolved local archive file, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archive: Option<PathBuf>,
    /// Direct children in the dependency tree.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<DependencyNode>,
}

impl DependencyNode {
    /// Create a leaf node.
    pub fn new(coordinate: ArtifactCoordinate, archive: Option<PathBuf>) -> Self {
        DependencyNode {
            coordinate,
            archive,
            children: Vec::new(),
        }
    }
}

// ============================================================================
// Packaging
// ============================================================================

/// Packaging kind of the current project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[derive(Default)]
pub enum PackagingKind {
    /// Non-buildable aggregator of child units; the audit is a no-op.
    Aggregator,
    /// Library unit.
    #[default]
    Library,
    /// Application unit.
    Application,
}

impl fmt::Display for PackagingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PackagingKind::Aggregator => write!(f, "aggregator"),
            PackagingKind::Library => write!(f, "library"),
            PackagingKind::Application => write!(f, "application"),
        }
    }
}

// ============================================================================
// Project Model
// ============================================================================

/// Everything the audit engine consumes about one project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectModel {
    /// Canonical project base directory.
    pub base_dir: PathBuf,
    /// Packaging kind; aggregators short-circuit the audit.
    #[serde(default)]
    pub packaging: PackagingKind,
    /// Ordered compile source roots. Relative roots are joined to `base_dir`.
    #[serde(default)]
    pub source_roots: Vec<PathBuf>,
    /// Pre-resolved transitive dependency tree.
    #[serde(default)]
    pub dependencies: Vec<DependencyNode>,
}

impl ProjectModel {
    /// Load a project model document from disk.
    pub fn load(path: &Path) -> Result<Self, AuditError> {
        let content = fs::read_to_string(path).map_err(|e| AuditError::Model {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        serde_json::from_str(&content).map_err(|e| AuditError::Model {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// The canonical resource root of this project.
    pub fn resource_root(&self) -> PathBuf {
        self.base_dir.join(RESOURCE_ROOT)
    }

    /// A source root made absolute against the project base directory.
    pub fn absolute_source_root(&self, root: &Path) -> PathBuf {
        if root.is_absolute() {
            root.to_path_buf()
        } else {
            self.base_dir.join(root)
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
