//! Error types for the pdffill library

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the pdffill library
#[derive(Error, Debug)]
pub enum Error {
    /// PDF processing error
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// File not found
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// Source document is encrypted
    #[error("PDF is encrypted: {}", .0.display())]
    Encrypted(PathBuf),

    /// A `-s` operand without `=`
    #[error("not an assigment {0}")]
    NotAnAssignment(String),

    /// Required document structure is missing or has the wrong type
    #[error("Malformed PDF structure: {0}")]
    Structure(String),

    /// The updated document could not be serialized or stored
    #[error("failed to convert.")]
    Conversion(#[source] Box<Error>),
}
