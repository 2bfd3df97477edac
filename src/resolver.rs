//! Inheritance resolution.
//!
//! The central algorithm: every discovered descriptor (the project's own
//! files first, then every indexed archive entry) is parsed, and every
//! inheritance declaration it carries is looked up against the full indexed
//! universe by suffix match. The output is one immutable
//! [`ResolutionReport`]; console and document rendering are projections of it
//! in [`crate::report`], never interleaved with resolution.
//!
//! Error recovery is local: a read or parse failure for one descriptor is
//! logged and folds into the warning flag, and the loop continues. The
//! resolver itself cannot fail.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;

use tracing::{debug, error};

use crate::descriptor::{DescriptorError, ModuleDescriptor};
use crate::discovery::LocalDescriptor;
use crate::index::{self, ModuleIndex};
use crate::model::ArtifactCoordinate;

// ============================================================================
// Options
// ============================================================================

/// Knobs consumed by the resolution loop.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResolveOptions {
    /// Print full diagnostic detail for recovered descriptor errors.
    pub verbose: bool,
}

// ============================================================================
// Report Value
// ============================================================================

/// Outcome of one inheritance declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InheritanceStatus {
    /// The declaration matched an indexed module owned by this artifact.
    Resolved { artifact: ArtifactCoordinate },
    /// No indexed module's logical name ends with the declared name.
    Missing,
}

/// One declaration together with its resolution outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclarationOutcome {
    /// The declared inheritance name, as written in the descriptor.
    pub declaration: String,
    /// Resolved or missing.
    pub status: InheritanceStatus,
}

/// Resolution results for one module, declarations in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleResolution {
    /// Logical name of the module.
    pub name: String,
    /// One outcome per declaration, duplicates preserved.
    pub declarations: Vec<DeclarationOutcome>,
}

/// Aggregate output of one resolution run.
///
/// Built once, consumed by the report emitter, then discarded. Modules appear
/// in discovery order: own-module descriptors (sorted by path) first, then
/// indexed entries in index order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionReport {
    /// Per-module resolution results.
    pub modules: Vec<ModuleResolution>,
    /// True iff any declaration is missing or any descriptor failed to
    /// process.
    pub has_warnings: bool,
}

impl ResolutionReport {
    /// An empty, warning-free report.
    pub fn empty() -> Self {
        ResolutionReport::default()
    }

    /// Derive the `module name -> missing declaration set` mapping.
    ///
    /// A declaration appears at most once per module even when declared
    /// twice.
    pub fn missing_by_module(&self) -> BTreeMap<&str, BTreeSet<&str>> {
        let mut missing: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
        for module in &self.modules {
            for outcome in &module.declarations {
                if outcome.status == InheritanceStatus::Missing {
                    missing
                        .entry(module.name.as_str())
                        .or_default()
                        .insert(outcome.declaration.as_str());
                }
            }
        }
        missing
    }

    /// True when at least one module has a missing declaration.
    pub fn has_missing(&self) -> bool {
        self.modules.iter().any(|m| {
            m.declarations
                .iter()
                .any(|d| d.status == InheritanceStatus::Missing)
        })
    }
}

// ============================================================================
// Resolution Loop
// ============================================================================

/// Resolve every discovered descriptor against the indexed universe.
pub fn resolve(
    local: &[LocalDescriptor],
    index: &ModuleIndex,
    options: &ResolveOptions,
) -> ResolutionReport {
    let mut modules = Vec::new();
    let mut has_warnings = false;

    for local_descriptor in local {
        let location = local_descriptor.path.display().to_string();
        let parsed = fs::read_to_string(&local_descriptor.path)
            .map_err(|e| DescriptorError::read(&location, e))
            .and_then(|content| {
                ModuleDescriptor::parse(&content)
                    .map_err(|e| DescriptorError::parse(&location, e))
            });
        match parsed {
            Ok(parsed) => modules.push(resolve_module(
                &local_descriptor.logical_name,
                &parsed,
                index,
                &mut has_warnings,
            )),
            Err(e) => recover(&location, &e, options.verbose, &mut has_warnings),
        }
    }

    for entry in index.entries() {
        let location = entry.location();
        let parsed = index::read_archive_entry(&entry.archive, &entry.entry_path).and_then(
            |content| {
                ModuleDescriptor::parse(&content)
                    .map_err(|e| DescriptorError::parse(&location, e))
            },
        );
        match parsed {
            Ok(parsed) => modules.push(resolve_module(
                &entry.logical_name,
                &parsed,
                index,
                &mut has_warnings,
            )),
            Err(e) => recover(&location, &e, options.verbose, &mut has_warnings),
        }
    }

    ResolutionReport {
        modules,
        has_warnings,
    }
}

fn resolve_module(
    name: &str,
    parsed: &ModuleDescriptor,
    index: &ModuleIndex,
    has_warnings: &mut bool,
) -> ModuleResolution {
    debug!("resolving module {name}");
    if !parsed.source_paths.is_empty() {
        debug!("module {name} exposes source paths {:?}", parsed.source_paths);
    }
    let declarations = parsed
        .inherits
        .iter()
        .map(|declaration| {
            let status = match index.resolve(declaration) {
                Some(entry) => InheritanceStatus::Resolved {
                    artifact: entry.coordinate.clone(),
                },
                None => {
                    *has_warnings = true;
                    InheritanceStatus::Missing
                }
            };
            DeclarationOutcome {
                declaration: declaration.clone(),
                status,
            }
        })
        .collect();
    ModuleResolution {
        name: name.to_string(),
        declarations,
    }
}

/// Log a recovered per-descriptor failure and fold it into the warning flag.
fn recover(location: &str, cause: &DescriptorError, verbose: bool, has_warnings: &mut bool) {
    if verbose {
        error!("{cause}");
    } else {
        error!("failed to process descriptor {location}");
    }
    *has_warnings = true;
}

// ============================================================================
// Tests
// ============================================================================
