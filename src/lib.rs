//! lvis2nc: IceBridge LVIS Level-2 to netCDF-4/HDF5 conversion
//!
//! Converts the whitespace-delimited Level-2 elevation text files of NASA's
//! Land, Vegetation, and Ice Sensor into compressed, grouped and attributed
//! netCDF-4 documents. The column layout (LDS 1.04 or LDS 2.0.2) is chosen
//! from the release identifier in the file name, and every shot gains a
//! `J2000` timestamp.
//!
//! ## Key Features
//!
//! - **Schema Resolution**: Mission, region, date and release parsed from the file name
//! - **Record Parsing**: Column-oriented integer/float arrays with line-accurate errors
//! - **Structured Output**: `Time`, `Geolocation`, `Elevation_Surfaces` (plus `Waveform`
//!   and `Instrument_Parameters` for LDS 2.0.2) groups, deflate-compressed
//! - **Atomic Commit**: Documents are staged and renamed into place
//! - **Batch Processing**: Per-file error isolation with an optional Rayon pool
//! - **Archive Sync**: Modification-time aware mirroring behind an async transport trait
//!
//! ## Module Organization
//!
//! - [`schema`]: File identity, LDS versions and group layouts
//! - [`parser`]: Text body to [`parser::RecordSet`]
//! - [`julian`]: Julian day and J2000 arithmetic
//! - [`attributes`]: Per-field descriptive attributes
//! - [`netcdf_io`]: NetCDF-4 document writer
//! - [`convert`]: Single-file conversion pipeline
//! - [`parallel`]: Batch runner and thread configuration
//! - [`inspect`]: Read-back description of written documents
//! - [`sync`]: Archive mirroring
//! - [`errors`]: Centralized error handling
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use lvis2nc::prelude::*;
//! use std::path::Path;
//!
//! let config = ConvertConfig::default();
//! let summary = convert_file(Path::new("ILVIS2_GL2009_0415_R1704_042.TXT"), &config).unwrap();
//! println!("{} records written to {}", summary.records, summary.output.display());
//! ```

pub mod attributes;
pub mod cli;
pub mod convert;
pub mod errors;
pub mod inspect;
pub mod julian;
pub mod netcdf_io;
pub mod parallel;
pub mod parser;
pub mod schema;
pub mod sync;

pub use errors::{ConversionError, LvisError, Result};

pub mod prelude {
    //! Commonly used imports for convenience
    pub use crate::convert::{convert_bytes, convert_file, ConversionSummary, ConvertConfig};
    pub use crate::errors::{ConversionError, LvisError, Result};
    pub use crate::netcdf_io::{write_records_to_netcdf, NetCDFWriter, WriteOptions};
    pub use crate::parallel::{convert_batch, BatchReport, ParallelConfig};
    pub use crate::parser::{parse_records, Column, RecordSet};
    pub use crate::schema::{FileIdentity, SchemaVersion};
    pub use crate::sync::{sync_archive, ArchiveSource, LocalArchive, SyncOptions};
}
