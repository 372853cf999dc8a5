//! Error types for CourseDocs.
//!
//! Library crates use [`CourseDocsError`] via `thiserror`.
//! The CLI app wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all CourseDocs operations.
#[derive(Debug, thiserror::Error)]
pub enum CourseDocsError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Table loading or shape error (CSV parse failure, unreadable file).
    #[error("table error: {message}")]
    Table { message: String },

    /// .docx template parsing or document rendering error.
    #[error("template error: {message}")]
    Template { message: String },

    /// Archive packaging error.
    #[error("archive error: {0}")]
    Archive(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, CourseDocsError>;

impl CourseDocsError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a table error from any displayable message.
    pub fn table(msg: impl Into<String>) -> Self {
        Self::Table {
            message: msg.into(),
        }
    }

    /// Create a template error from any displayable message.
    pub fn template(msg: impl Into<String>) -> Self {
        Self::Template {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
