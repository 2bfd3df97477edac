//! modaudit: build-graph auditor for missing transitive module declarations.
//!
//! Each build unit (a "module") declares, in a small descriptor document,
//! which other modules it inherits and which of its own source subtrees it
//! exposes. Modules live either as local source within the current project or
//! pre-built inside dependency archives. modaudit determines, without building
//! anything, whether every declared inheritance resolves to a module reachable
//! from the transitive dependency closure, and reports exactly which
//! declarations are unresolved and in which module.
//!
//! The engine is a pure pipeline:
//! - [`discovery`] collects the project's own descriptor files
//! - [`index`] scans every archive in the dependency closure into an ordered
//!   module universe
//! - [`resolver`] classifies every inheritance declaration against that
//!   universe and produces one immutable [`resolver::ResolutionReport`]
//! - [`report`] renders the report to the console and, optionally, to a
//!   persisted XML document

pub mod descriptor;
pub mod discovery;
pub mod error;
pub mod index;
pub mod model;
pub mod report;
pub mod resolver;

use tracing::info;

use crate::error::AuditError;
use crate::model::{PackagingKind, ProjectModel};
use crate::resolver::{ResolutionReport, ResolveOptions};

/// Run the full inheritance audit for one project.
///
/// Aggregator projects carry no buildable sources and short-circuit with an
/// empty, warning-free report. Otherwise the dependency closure is indexed
/// first (a corrupt archive aborts the run before any resolution work), then
/// the project's own descriptors are collected and every declaration is
/// resolved against the indexed universe.
pub fn run_audit(
    project: &ProjectModel,
    options: &ResolveOptions,
) -> Result<ResolutionReport, AuditError> {
    if project.packaging == PackagingKind::Aggregator {
        info!("skipping aggregator project");
        return Ok(ResolutionReport::empty());
    }
    let index = index::index_dependencies(&project.dependencies)?;
    let local = discovery::collect_own_descriptors(project)?;
    Ok(resolver::resolve(&local, &index, options))
}
