//! Error types and exit code constants for modaudit.
//!
//! This module provides the unified fatal error type (`AuditError`) covering
//! everything that aborts a run: bad configuration, unreadable directories,
//! archive indexing failures, and report persistence failures. Recoverable
//! per-descriptor failures live in [`crate::descriptor::DescriptorError`] and
//! never surface here.
//!
//! ## Exit Code Mapping
//!
//! - `1`: Warnings promoted to a fatal outcome (`--fail-on-warning`)
//! - `2`: Configuration errors (bad input from caller, unreadable roots)
//! - `3`: Indexing errors (dependency archive unreadable or corrupt)
//! - `4`: Report errors (failed to persist the report document)

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

// ============================================================================
// Exit Codes
// ============================================================================

/// Stable process exit codes for fatal outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AuditExitCode {
    /// Run completed but warnings were found and `--fail-on-warning` is set.
    Warnings = 1,
    /// Invalid configuration (bad patterns, missing roots, bad project model).
    Configuration = 2,
    /// Dependency archive indexing failed.
    Index = 3,
    /// Report document could not be written.
    Report = 4,
}

impl AuditExitCode {
    /// Get the numeric code value.
    pub fn code(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for AuditExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ============================================================================
// Unified Error Type
// ============================================================================

/// Unified fatal error type for the audit engine.
///
/// Every variant carries enough context to name the offending path or input.
/// None of these are recoverable: the invocation terminates with the mapped
/// exit code. Per-descriptor parse/read failures are deliberately absent;
/// they are caught in the resolver loop and folded into the warning flag.
#[derive(Debug, Error)]
pub enum AuditError {
    /// Invalid configuration supplied by the caller.
    #[error("invalid configuration: {message}")]
    Configuration { message: String },

    /// Project model document missing, unreadable, or malformed.
    #[error("failed to load project model {}: {message}", .path.display())]
    Model { path: PathBuf, message: String },

    /// A required root path is missing or unreadable.
    #[error("failed to read path {}", .path.display())]
    UnreadablePath { path: PathBuf },

    /// A directory expected during nested discovery is missing or unreadable.
    #[error("directory {} is not a readable directory", .path.display())]
    UnreadableDirectory { path: PathBuf },

    /// Walking a directory subtree failed partway through.
    #[error("{message} while analyzing {}", .path.display())]
    Scan { path: PathBuf, message: String },

    /// A dependency archive could not be opened or enumerated.
    #[error("failed to index archive {}: {message}", .archive.display())]
    Index { archive: PathBuf, message: String },

    /// The persisted report document could not be written.
    #[error("failed to write report {}: {message}", .path.display())]
    Report { path: PathBuf, message: String },

    /// Warnings found and promoted to a fatal outcome by configuration.
    #[error("inheritance problems found")]
    WarningsFound,
}

// ============================================================================
// Exit Code Mapping
// ============================================================================

impl From<&AuditError> for AuditExitCode {
    fn from(err: &AuditError) -> Self {
        match err {
            AuditError::Configuration { .. } => AuditExitCode::Configuration,
            AuditError::Model { .. } => AuditExitCode::Configuration,
            AuditError::UnreadablePath { .. } => AuditExitCode::Configuration,
            AuditError::UnreadableDirectory { .. } => AuditExitCode::Configuration,
            AuditError::Scan { .. } => AuditExitCode::Configuration,
            AuditError::Index { .. } => AuditExitCode::Index,
            AuditError::Report { .. } => AuditExitCode::Report,
            AuditError::WarningsFound => AuditExitCode::Warnings,
        }
    }
}

// ============================================================================
// Convenience Constructors
// ============================================================================

impl AuditError {
    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        AuditError::Configuration {
            message: message.into(),
        }
    }

    /// Create an unreadable path error.
    pub fn unreadable_path(path: impl Into<PathBuf>) -> Self {
        AuditError::UnreadablePath { path: path.into() }
    }

    /// Create an unreadable directory error.
    pub fn unreadable_directory(path: impl Into<PathBuf>) -> Self {
        AuditError::UnreadableDirectory { path: path.into() }
    }

    /// Create a subtree scan error.
    pub fn scan(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        AuditError::Scan {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Create an archive indexing error.
    pub fn index(archive: impl Into<PathBuf>, message: impl ToString) -> Self {
        AuditError::Index {
            archive: archive.into(),
            message: message.to_string(),
        }
    }

    /// Create a report persistence error.
    pub fn report(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        AuditError::Report {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Get the exit code for this error.
    pub fn exit_code(&self) -> AuditExitCode {
        AuditExitCode::from(self)
    }
}

// ============================================================================
// Tests
// ============================================================================
