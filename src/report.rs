//! Report emission.
//!
//! Two independent, order-preserving projections of one
//! [`ResolutionReport`]:
//!
//! - [`render_console`] writes the human-readable report to the logging
//!   sink: a header per module, one line per declaration (info when
//!   resolved, warn when missing), and a trailing consolidated section
//!   listing every module with missing declarations.
//! - [`write_document`] persists the same information as a UTF-8 XML
//!   document, one `<module>` node per module with either an `<inherit>`
//!   node (declaration + owning coordinate) or a `<missing-inherit>` node
//!   per declaration.
//!
//! Neither projection mutates the report; the caller applies the
//! fail-on-warning policy after emission.

use std::fs;
use std::path::Path;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use tracing::{debug, info, warn};

use crate::error::AuditError;
use crate::resolver::{InheritanceStatus, ResolutionReport};

/// Conventional name of the persisted report document.
pub const DEFAULT_REPORT_FILE: &str = "inheritance.xml";

// ============================================================================
// Console Projection
// ============================================================================

/// Render the report to the logging sink.
pub fn render_console(report: &ResolutionReport) {
    for module in &report.modules {
        info!("*********");
        info!("Module: {}", module.name);
        for outcome in &module.declarations {
            match &outcome.status {
                InheritanceStatus::Resolved { artifact } => {
                    info!("\tinherits {} from {}", outcome.declaration, artifact);
                }
                InheritanceStatus::Missing => {
                    warn!("\tinherits {} from UNKNOWN", outcome.declaration);
                }
            }
        }
    }
    let missing = report.missing_by_module();
    if !missing.is_empty() {
        warn!("Missing inherited modules");
        for (module, declarations) in &missing {
            warn!("*********");
            warn!("Module: {module}");
            for declaration in declarations {
                warn!("\tmissing: {declaration}");
            }
        }
    }
}

// ============================================================================
// Document Projection
// ============================================================================

/// Persist the report as an XML document at `path`.
pub fn write_document(report: &ResolutionReport, path: &Path) -> Result<(), AuditError> {
    let bytes = document_bytes(report).map_err(|e| AuditError::report(path, e))?;
    fs::write(path, bytes).map_err(|e| AuditError::report(path, e))?;
    debug!("wrote report document {}", path.display());
    Ok(())
}

fn document_bytes(report: &ResolutionReport) -> Result<Vec<u8>, String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 4);
    emit(&mut writer, Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    emit(&mut writer, Event::Start(BytesStart::new("inheritance-tree")))?;
    for module in &report.modules {
        emit(&mut writer, Event::Start(BytesStart::new("module")))?;
        emit_text_element(&mut writer, "name", &module.name)?;
        for outcome in &module.declarations {
            match &outcome.status {
                InheritanceStatus::Resolved { artifact } => {
                    emit(&mut writer, Event::Start(BytesStart::new("inherit")))?;
                    emit_text_element(&mut writer, "declaration", &outcome.declaration)?;
                    emit_text_element(&mut writer, "artifact", &artifact.to_string())?;
                    emit(&mut writer, Event::End(BytesEnd::new("inherit")))?;
                }
                InheritanceStatus::Missing => {
                    emit_text_element(&mut writer, "missing-inherit", &outcome.declaration)?;
                }
            }
        }
        emit(&mut writer, Event::End(BytesEnd::new("module")))?;
    }
    emit(&mut writer, Event::End(BytesEnd::new("inheritance-tree")))?;
    Ok(writer.into_inner())
}

fn emit(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<(), String> {
    writer.write_event(event).map_err(|e| e.to_string())
}

fn emit_text_element(
    writer: &mut Writer<Vec<u8>>,
    name: &str,
    text: &str,
) -> Result<(), String> {
    emit(writer, Event::Start(BytesStart::new(name)))?;
    emit(writer, Event::Text(BytesText::new(text)))?;
    emit(writer, Event::End(BytesEnd::new(name)))
}

// ============================================================================
// Tests
// ============================================================================
