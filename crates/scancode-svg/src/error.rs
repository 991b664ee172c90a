//! Error types for bar animation

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while animating an SVG
#[derive(Error, Debug)]
pub enum SvgError {
    /// Source SVG does not exist
    #[error("SVG not found: {}", .0.display())]
    NotFound(PathBuf),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// XML parsing error
    #[error("XML parse error: {0}")]
    XmlError(String),

    /// Invalid SVG structure
    #[error("Invalid SVG structure: {0}")]
    InvalidStructure(String),

    /// The pre-mutation backup could not be written
    #[error("Failed to write backup {}: {source}", path.display())]
    Backup {
        /// Backup path that could not be written
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: io::Error,
    },

    /// Animation parameters out of range
    #[error("Invalid animation options: {0}")]
    InvalidOptions(String),
}

impl From<quick_xml::Error> for SvgError {
    fn from(err: quick_xml::Error) -> Self {
        Self::XmlError(err.to_string())
    }
}

/// Result type for SVG operations
pub type Result<T> = std::result::Result<T, SvgError>;
