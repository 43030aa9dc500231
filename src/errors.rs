//! Centralized error handling for lvis2nc
//!
//! Every failure in the conversion core is scoped to a single input file.
//! The batch runner and the archive sync wrap these in [`ConversionError`]
//! so the caller can log the offending file and carry on with the rest.

use std::path::PathBuf;

/// Main error type for lvis2nc operations
#[derive(thiserror::Error, Debug)]
pub enum LvisError {
    /// File name does not carry mission/region/date/release metadata
    #[error("Malformed LVIS file name '{name}': {reason}")]
    MalformedFilename { name: String, reason: String },

    /// A data line could not be split or cast according to its schema
    #[error("Record parse error on line {line}: {message}")]
    RecordParse { line: usize, message: String },

    /// Version tag that maps to neither LDS generation
    #[error("Unsupported LVIS data structure version '{version}'")]
    UnsupportedSchema { version: String },

    /// Subset index past the last data record
    #[error("Subset index {index} out of range ({available} records available)")]
    SubsetOutOfRange { index: usize, available: usize },

    /// Writer asked for a column the record set does not hold
    #[error("Field '{field}' missing from record set")]
    MissingField { field: String },

    /// Permission mode given on the command line is not octal
    #[error("Invalid permission mode '{value}': expected an octal number such as 775")]
    InvalidMode { value: String },

    /// NetCDF file operation errors
    #[error("NetCDF error: {0}")]
    NetCDFError(#[from] netcdf::Error),

    /// I/O operation errors
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Thread pool configuration error
    #[error("Thread pool error: {0}")]
    ThreadPoolError(String),

    /// Archive listing or transfer failure
    #[error("Archive error: {0}")]
    Archive(String),

    /// Generic error for anything else
    #[error("{0}")]
    Generic(String),
}

/// A failure attributed to one input file of a batch
#[derive(thiserror::Error, Debug)]
#[error("{}: {source}", .file.display())]
pub struct ConversionError {
    pub file: PathBuf,
    #[source]
    pub source: LvisError,
}

impl ConversionError {
    pub fn new(file: impl Into<PathBuf>, source: LvisError) -> Self {
        Self {
            file: file.into(),
            source,
        }
    }
}

/// Result type alias for lvis2nc operations
pub type Result<T> = std::result::Result<T, LvisError>;
