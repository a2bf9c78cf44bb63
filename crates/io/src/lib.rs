// Catalog sheet import and result export

pub mod catalog;
pub mod csv;
pub mod json;
pub mod xlsx;

use std::fmt;
use std::path::Path;

pub use catalog::{CatalogSheet, Cell};

/// Excel sheet names are capped at this many characters.
pub const MAX_SHEET_NAME_LEN: usize = 31;

#[derive(Debug)]
pub enum IoError {
    /// File could not be opened or decoded.
    Read { path: String, reason: String },
    /// File could not be created or written.
    Write { path: String, reason: String },
    /// Extension not handled by any importer.
    UnsupportedFormat(String),
}

impl IoError {
    pub(crate) fn read(path: &Path, reason: impl fmt::Display) -> Self {
        Self::Read {
            path: path.display().to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn write(path: &Path, reason: impl fmt::Display) -> Self {
        Self::Write {
            path: path.display().to_string(),
            reason: reason.to_string(),
        }
    }
}

impl fmt::Display for IoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read { path, reason } => write!(f, "cannot read '{path}': {reason}"),
            Self::Write { path, reason } => write!(f, "cannot write '{path}': {reason}"),
            Self::UnsupportedFormat(ext) => write!(f, "unsupported file format: {ext}"),
        }
    }
}

impl std::error::Error for IoError {}
