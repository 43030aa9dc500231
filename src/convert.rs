//! Single-file conversion pipeline
//!
//! Resolves the schema from the file name, parses the text body and writes
//! the netCDF-4 document. Input may come from a local path or from bytes
//! already fetched by the archive sync; the core only ever sees the bytes
//! and the declared file name.

use crate::errors::{LvisError, Result};
use crate::netcdf_io::{write_records_to_netcdf, WriteOptions};
use crate::parser::{parse_records, RecordSet};
use crate::schema::{FileIdentity, SchemaVersion};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Default permission mode of written files
pub const DEFAULT_MODE: u32 = 0o775;

/// Default extension of written documents
pub const DEFAULT_EXTENSION: &str = "H5";

/// Settings shared by every conversion of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertConfig {
    pub write: WriteOptions,
    /// Permission mode applied to each output; `None` keeps `0o666` less the umask
    pub mode: Option<u32>,
    /// Extension replacing `.TXT` on output names
    pub extension: String,
    /// Directory for outputs, defaults to the input's own directory
    pub output_dir: Option<PathBuf>,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            write: WriteOptions::default(),
            mode: Some(DEFAULT_MODE),
            extension: DEFAULT_EXTENSION.to_string(),
            output_dir: None,
        }
    }
}

impl ConvertConfig {
    /// Output document path for an input file
    #[must_use]
    pub fn output_path_for(&self, input: &Path) -> PathBuf {
        let renamed = input.with_extension(&self.extension);
        match (&self.output_dir, renamed.file_name()) {
            (Some(dir), Some(name)) => dir.join(name),
            _ => renamed,
        }
    }
}

/// Outcome of one successful conversion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionSummary {
    pub source: String,
    pub output: PathBuf,
    pub schema: SchemaVersion,
    pub records: usize,
}

/// Resolve the schema from `filename` and parse `text`
pub fn read_records(text: &str, filename: &str, subset: Option<&[usize]>) -> Result<RecordSet> {
    let identity = FileIdentity::from_filename(filename)?;
    let schema = identity.schema();
    debug!(
        file = filename,
        mission = identity.mission.as_str(),
        region = identity.region.code(),
        release = %identity.release,
        schema = %schema,
        "resolved file identity"
    );
    parse_records(text, schema, identity.acquisition_date()?, subset)
}

/// Convert fetched bytes declared as `filename` into a document at `output`
pub fn convert_bytes(
    bytes: &[u8],
    filename: &str,
    output: &Path,
    config: &ConvertConfig,
) -> Result<ConversionSummary> {
    let text = std::str::from_utf8(bytes).map_err(|e| {
        LvisError::IoError(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    })?;
    let records = read_records(text, filename, None)?;
    write_records_to_netcdf(&records, filename, output, config.write)?;
    apply_mode(output, config.mode)?;

    info!(
        source = filename,
        output = %output.display(),
        schema = %records.schema(),
        records = records.len(),
        "converted"
    );
    Ok(ConversionSummary {
        source: filename.to_string(),
        output: output.to_path_buf(),
        schema: records.schema(),
        records: records.len(),
    })
}

/// Convert a local Level-2 file next to itself (or into the output directory)
pub fn convert_file(input: &Path, config: &ConvertConfig) -> Result<ConversionSummary> {
    let bytes = fs::read(input)?;
    let output = config.output_path_for(input);
    convert_bytes(&bytes, &input.to_string_lossy(), &output, config)
}

/// Apply an octal permission mode to a written file
pub fn apply_mode(path: &Path, mode: Option<u32>) -> Result<()> {
    #[cfg(unix)]
    if let Some(mode) = mode {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(mode))?;
    }
    #[cfg(not(unix))]
    let _ = (path, mode);
    Ok(())
}

/// Parse an octal permission mode such as `775` or `0o644`
pub fn parse_mode(value: &str) -> Result<u32> {
    let digits = value
        .trim()
        .trim_start_matches("0o")
        .trim_start_matches("0O");
    u32::from_str_radix(digits, 8)
        .ok()
        .filter(|mode| *mode <= 0o7777)
        .ok_or_else(|| LvisError::InvalidMode {
            value: value.to_string(),
        })
}
