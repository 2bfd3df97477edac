//! Module descriptor parsing.
//!
//! A descriptor is a small XML document declaring which modules a build unit
//! inherits and which of its source subtrees it exposes:
//!
//! ```xml
//! <module>
//!     <inherits name="com.acme.Core"/>
//!     <source path="client"/>
//! </module>
//! ```
//!
//! The parser is a single forward pass over the event stream: it extracts the
//! `name` attribute of every `inherits` element and the `path` attribute of
//! every `source` element, in document order, and ignores everything else:
//! unknown elements, nesting, text content. It never materializes a DOM; the
//! resolver may parse hundreds of descriptors per run. Ill-formed markup
//! surfaces a structured [`ParseError`].

use quick_xml::events::BytesStart;
use quick_xml::events::Event;
use quick_xml::Reader;
use thiserror::Error;

/// File suffix identifying a module descriptor, on disk and inside archives.
pub const DESCRIPTOR_SUFFIX: &str = ".moduledesc";

// ============================================================================
// Errors
// ============================================================================

/// Ill-formed descriptor markup.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ParseError {
    message: String,
}

impl ParseError {
    fn new(cause: impl ToString) -> Self {
        ParseError {
            message: cause.to_string(),
        }
    }
}

/// Recoverable failure while processing one descriptor.
///
/// These are caught in the resolver loop, logged, and folded into the
/// aggregate warning flag; they never abort a run.
#[derive(Debug, Error)]
pub enum DescriptorError {
    /// The descriptor bytes could not be read.
    #[error("failed to read descriptor {location}: {message}")]
    Read { location: String, message: String },

    /// The descriptor content is not well-formed markup.
    #[error("failed to parse descriptor {location}: {source}")]
    Parse {
        location: String,
        source: ParseError,
    },
}

impl DescriptorError {
    /// Create a read error.
    pub fn read(location: impl Into<String>, cause: impl ToString) -> Self {
        DescriptorError::Read {
            location: location.into(),
            message: cause.to_string(),
        }
    }

    /// Create a parse error.
    pub fn parse(location: impl Into<String>, source: ParseError) -> Self {
        DescriptorError::Parse {
            location: location.into(),
            source,
        }
    }
}

// ============================================================================
// Module Descriptor
// ============================================================================

/// Parsed representation of one descriptor document.
///
/// Both sequences preserve document order and duplicates. Instances are
/// created fresh per parse call and never mutated by consumers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleDescriptor {
    /// Declared names of modules this one inherits.
    pub inherits: Vec<String>,
    /// Declared relative source subpaths exposed by this module.
    pub source_paths: Vec<String>,
}

impl ModuleDescriptor {
    /// Parse one descriptor document.
    pub fn parse(content: &str) -> Result<Self, ParseError> {
        let mut reader = Reader::from_str(content);
        let mut descriptor = ModuleDescriptor::default();
        loop {
            match reader.read_event() {
                Ok(Event::Start(element)) | Ok(Event::Empty(element)) => {
                    match element.name().as_ref() {
                        b"inherits" => {
                            if let Some(name) = attribute_value(&element, b"name")? {
                                descriptor.inherits.push(name);
                            }
                        }
                        b"source" => {
                            if let Some(path) = attribute_value(&element, b"path")? {
                                descriptor.source_paths.push(path);
                            }
                        }
                        _ => {}
                    }
                }
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(e) => return Err(ParseError::new(e)),
            }
        }
        Ok(descriptor)
    }
}

fn attribute_value(element: &BytesStart<'_>, key: &[u8]) -> Result<Option<String>, ParseError> {
    for attribute in element.attributes() {
        let attribute = attribute.map_err(ParseError::new)?;
        if attribute.key.as_ref() == key {
            let value = attribute.unescape_value().map_err(ParseError::new)?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

// ============================================================================
// Logical Names
// ============================================================================

/// Derive a logical module name from a descriptor's storage location.
///
/// The location is the forward-slash path of the descriptor relative to its
/// root (archive entry path, or file path relative to the walked source or
/// resource root): the descriptor suffix is stripped and path separators
/// become dots, so `com/acme/Foo.moduledesc` names the module `com.acme.Foo`.
pub fn logical_name(location: &str) -> String {
    let stem = location.strip_suffix(DESCRIPTOR_SUFFIX).unwrap_or(location);
    stem.replace('/', ".")
}

// ============================================================================
// Tests
// ============================================================================
