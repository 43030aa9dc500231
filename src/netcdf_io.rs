//! NetCDF-4 output of parsed Level-2 records
//!
//! Each record set becomes one netCDF-4 (HDF5) document: a root
//! `Shot_Number` dimension and coordinate variable, one group per block of
//! related fields, descriptive attributes on every variable, and global
//! attributes describing provenance and the spatial/temporal extent.
//!
//! Documents are staged in a temporary file next to the target and renamed
//! into place only after the netCDF handle has been closed, so a failed
//! conversion never leaves a truncated file under the output name.

use crate::attributes::field_attributes;
use crate::errors::{LvisError, Result};
use crate::julian::j2000_to_datetime;
use crate::parser::{Column, RecordSet};
use crate::schema::{GroupLayout, SHOT_DIMENSION};
use chrono::Local;
use netcdf::{FileMut, GroupMut, VariableMut};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

/// Default deflate level for every dataset
pub const DEFAULT_COMPRESSION_LEVEL: i32 = 4;

/// Dataset storage options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOptions {
    /// Deflate level 0-9, 0 disables compression
    pub compression_level: i32,
    pub shuffle: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            compression_level: DEFAULT_COMPRESSION_LEVEL,
            shuffle: true,
        }
    }
}

const TITLE: &str = "IceBridge LVIS L2 Geolocated Surface Elevation";
const COMMENT: &str = "Operation IceBridge products may include test flight data that are \
    not useful for research and scientific analysis. Test flights usually occur at the \
    beginning of campaigns. Users should read flight reports for the flights that \
    collected any of the data they intend to use";
const SUMMARY: &str = "Surface elevation measurements over areas including Greenland and \
    Antarctica. The data were collected as part of NASA Operation IceBridge funded \
    campaigns.";
const REFERENCES: &str =
    "http://lvis.gsfc.nasa.gov/, http://nsidc.org/data/docs/daac/icebridge/ilvis2";
const PROJECT: &str = "NASA Operation IceBridge";
const INSTRUMENT: &str = "Land, Vegetation, and Ice Sensor (LVIS)";

/// Writer for one record set
pub struct NetCDFWriter<'a> {
    records: &'a RecordSet,
    output_path: &'a Path,
    options: WriteOptions,
}

impl<'a> NetCDFWriter<'a> {
    /// Create a new NetCDF writer
    pub fn new(records: &'a RecordSet, output_path: &'a Path, options: WriteOptions) -> Self {
        Self {
            records,
            output_path,
            options,
        }
    }

    /// Write the document and commit it under the output path
    ///
    /// `source` names the input file and is stored as provenance.
    pub fn write_document(&self, source: &str) -> Result<()> {
        let staging = staging_file(self.output_path)?;

        let mut file = netcdf::create(staging.path())?;
        self.populate(&mut file, source)?;
        // closes the netCDF handle before the rename
        drop(file);

        staging
            .persist(self.output_path)
            .map_err(|e| LvisError::IoError(e.error))?;
        debug!(path = %self.output_path.display(), "committed netCDF document");
        Ok(())
    }

    fn populate(&self, file: &mut FileMut, source: &str) -> Result<()> {
        let n_records = self.records.len();
        file.add_dimension(SHOT_DIMENSION, n_records)?;

        {
            let shots = self
                .records
                .field(SHOT_DIMENSION)
                .ok_or_else(|| LvisError::MissingField {
                    field: SHOT_DIMENSION.to_string(),
                })?;
            let mut var = file.add_variable::<i64>(SHOT_DIMENSION, &[SHOT_DIMENSION])?;
            self.store(&mut var, SHOT_DIMENSION, shots)?;
        }

        for layout in self.records.schema().groups() {
            let mut group = file.add_group(layout.name)?;
            self.write_group(&mut group, layout)?;
        }

        self.write_global_attributes(file, source)?;
        Ok(())
    }

    fn write_group(&self, group: &mut GroupMut, layout: &GroupLayout) -> Result<()> {
        for &field in layout.fields {
            let column = self
                .records
                .field(field)
                .ok_or_else(|| LvisError::MissingField {
                    field: field.to_string(),
                })?;
            let mut var = match column {
                Column::Integer(_) => group.add_variable::<i64>(field, &[SHOT_DIMENSION])?,
                Column::Float(_) => group.add_variable::<f64>(field, &[SHOT_DIMENSION])?,
            };
            var.put_attribute("coordinates", SHOT_DIMENSION)?;
            self.store(&mut var, field, column)?;
        }
        debug!(group = layout.name, datasets = layout.fields.len(), "wrote group");
        Ok(())
    }

    /// Compress, describe and fill one variable
    fn store(&self, var: &mut VariableMut, field: &str, column: &Column) -> Result<()> {
        if self.options.compression_level > 0 {
            var.set_compression(self.options.compression_level, self.options.shuffle)?;
        }

        if let Some(attrs) = field_attributes(field) {
            var.put_attribute("long_name", attrs.long_name.as_str())?;
            if let Some(units) = attrs.units {
                var.put_attribute("units", units)?;
            }
            var.put_attribute("description", attrs.description.as_str())?;
            if let Some((min, max)) = attrs.valid_range {
                var.put_attribute("valid_min", min)?;
                var.put_attribute("valid_max", max)?;
            }
        }

        if column.is_empty() {
            return Ok(());
        }
        match column {
            Column::Integer(values) => var.put_values(&values.to_vec(), ..)?,
            Column::Float(values) => var.put_values(&values.to_vec(), ..)?,
        }
        Ok(())
    }

    fn write_global_attributes(&self, file: &mut FileMut, source: &str) -> Result<()> {
        file.add_attribute("featureType", "trajectory")?;
        file.add_attribute("title", TITLE)?;
        file.add_attribute("comment", COMMENT)?;
        file.add_attribute("summary", SUMMARY)?;
        file.add_attribute("references", REFERENCES)?;
        file.add_attribute(
            "date_created",
            Local::now().format("%Y-%m-%d").to_string(),
        )?;
        file.add_attribute("project", PROJECT)?;
        file.add_attribute("instrument", INSTRUMENT)?;
        file.add_attribute("processing_level", "2")?;
        file.add_attribute("elevation_file", source)?;
        file.add_attribute("version", self.records.schema().tag())?;

        if let Some(bounds) = bounding_box(self.records)? {
            file.add_attribute("geospatial_lat_min", bounds.lat_min)?;
            file.add_attribute("geospatial_lat_max", bounds.lat_max)?;
            file.add_attribute("geospatial_lon_min", bounds.lon_min)?;
            file.add_attribute("geospatial_lon_max", bounds.lon_max)?;
        }
        file.add_attribute("geospatial_lat_units", "degrees_north")?;
        file.add_attribute("geospatial_lon_units", "degrees_east")?;
        file.add_attribute("geospatial_ellipsoid", "WGS84")?;
        file.add_attribute("time_type", "UTC")?;
        file.add_attribute("date_type", "J2000")?;

        if let Some(range) = time_range(self.records)? {
            file.add_attribute("RangeBeginningTime", range.beginning_time)?;
            file.add_attribute("RangeEndingTime", range.ending_time)?;
            file.add_attribute("RangeBeginningDate", range.beginning_date)?;
            file.add_attribute("RangeEndingDate", range.ending_date)?;
            file.add_attribute("DurationTime", range.duration)?;
        }
        Ok(())
    }
}

/// Temporary file beside `target` that is renamed over it on commit
///
/// Created with mode `0o666` less the umask, like a plainly created file,
/// rather than the `0o600` temp-file default, so an unset permission mode
/// leaves committed files with ordinary permissions.
pub fn staging_file(target: &Path) -> Result<NamedTempFile> {
    let dir = target
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut builder = tempfile::Builder::new();
    builder.prefix(".lvis2nc-").suffix(".part");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(std::fs::Permissions::from_mode(0o666));
    }
    Ok(builder.tempfile_in(dir)?)
}

/// Spatial extent of the lowest detected mode
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,
}

/// Min/max of `Latitude_Low` and `Longitude_Low`; `None` for an empty set
pub fn bounding_box(records: &RecordSet) -> Result<Option<BoundingBox>> {
    if records.is_empty() {
        return Ok(None);
    }
    let lat = records.float("Latitude_Low")?;
    let lon = records.float("Longitude_Low")?;
    Ok(Some(BoundingBox {
        lat_min: lat.iter().copied().fold(f64::INFINITY, f64::min),
        lat_max: lat.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        lon_min: lon.iter().copied().fold(f64::INFINITY, f64::min),
        lon_max: lon.iter().copied().fold(f64::NEG_INFINITY, f64::max),
    }))
}

/// Human-readable acquisition range derived from the first and last shot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeRange {
    pub beginning_time: String,
    pub ending_time: String,
    pub beginning_date: String,
    pub ending_date: String,
    /// Whole seconds between the first and last shot
    pub duration: String,
}

/// Range attributes from the J2000 column; `None` for an empty set
pub fn time_range(records: &RecordSet) -> Result<Option<TimeRange>> {
    let j2000 = records.j2000()?;
    let (Some(&first), Some(&last)) = (j2000.first(), j2000.last()) else {
        return Ok(None);
    };
    let invalid = |value: f64| LvisError::Generic(format!("J2000 time {} out of range", value));
    let begin = j2000_to_datetime(first).ok_or_else(|| invalid(first))?;
    let end = j2000_to_datetime(last).ok_or_else(|| invalid(last))?;
    Ok(Some(TimeRange {
        beginning_time: begin.format("%H:%M:%S").to_string(),
        ending_time: end.format("%H:%M:%S").to_string(),
        beginning_date: begin.format("%Y:%m:%d").to_string(),
        ending_date: end.format("%Y:%m:%d").to_string(),
        duration: format!("{:.0}", last - first),
    }))
}

/// Writes a parsed record set to a netCDF-4 document at `output_path`.
pub fn write_records_to_netcdf(
    records: &RecordSet,
    source: &str,
    output_path: &Path,
    options: WriteOptions,
) -> Result<()> {
    let writer = NetCDFWriter::new(records, output_path, options);
    writer.write_document(source)
}
