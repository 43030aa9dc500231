//! Descriptive attributes attached to every output variable
//!
//! The table is static reference data keyed by field name. It is built once
//! on first use and shared by every conversion in the process.

use crate::schema::SchemaVersion;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Variable attributes written alongside one dataset
#[derive(Debug, Clone, PartialEq)]
pub struct FieldAttributes {
    pub long_name: String,
    pub units: Option<&'static str>,
    pub description: String,
    /// Inclusive `(valid_min, valid_max)` bounds
    pub valid_range: Option<(f64, f64)>,
}

impl FieldAttributes {
    fn new(long_name: &str, units: Option<&'static str>, description: &str) -> Self {
        Self {
            long_name: long_name.to_string(),
            units,
            description: description.to_string(),
            valid_range: None,
        }
    }

    fn with_valid_range(mut self, min: f64, max: f64) -> Self {
        self.valid_range = Some((min, max));
        self
    }
}

fn geolocation(
    table: &mut HashMap<&'static str, FieldAttributes>,
    suffix: &'static [&'static str; 3],
    what: &str,
) {
    let [lon, lat, elev] = *suffix;
    table.insert(
        lon,
        FieldAttributes::new(
            lon,
            Some("Degrees East"),
            &format!("Longitude of the {} within the LVIS Level-1B waveform", what),
        ),
    );
    table.insert(
        lat,
        FieldAttributes::new(
            lat,
            Some("Degrees North"),
            &format!("Latitude of the {} within the LVIS Level-1B waveform", what),
        ),
    );
    table.insert(
        elev,
        FieldAttributes::new(
            elev,
            Some("Meters"),
            &format!("Mean Elevation of the {} within the LVIS Level-1B waveform", what),
        ),
    );
}

fn build_table() -> HashMap<&'static str, FieldAttributes> {
    let mut table = HashMap::new();

    table.insert(
        "LVIS_LFID",
        FieldAttributes::new(
            "LVIS Record Index",
            None,
            "LVIS file identification, including date and time of collection and file \
             number. The third through seventh values in first field represent the \
             Modified Julian Date of data collection.",
        ),
    );
    table.insert(
        "Shot_Number",
        FieldAttributes::new("Shot Number", None, "Laser shot assigned during collection"),
    );
    table.insert(
        "Time",
        FieldAttributes::new(
            "Transmit time of each shot",
            Some("Seconds"),
            "UTC decimal seconds of the day",
        ),
    );
    table.insert(
        "J2000",
        FieldAttributes::new(
            "Transmit time of each shot in J2000 seconds",
            Some("seconds since 2000-01-01 12:00:00 UTC"),
            "The transmit time of each shot in the 1 second frame measured as UTC \
             seconds elapsed since Jan 1 2000 12:00:00 UTC.",
        ),
    );

    table.insert(
        "Longitude_Centroid",
        FieldAttributes::new(
            "Longitude_Centroid",
            Some("Degrees East"),
            "Corresponding longitude of the LVIS Level-1B waveform centroid",
        ),
    );
    table.insert(
        "Latitude_Centroid",
        FieldAttributes::new(
            "Latitude_Centroid",
            Some("Degrees North"),
            "Corresponding latitude of the LVIS Level-1B waveform centroid",
        ),
    );
    table.insert(
        "Elevation_Centroid",
        FieldAttributes::new(
            "Elevation_Centroid",
            Some("Meters"),
            "Elevation surface of the LVIS Level-1B waveform centroid",
        ),
    );
    geolocation(
        &mut table,
        &["Longitude_Low", "Latitude_Low", "Elevation_Low"],
        "lowest detected mode",
    );
    geolocation(
        &mut table,
        &["Longitude_High", "Latitude_High", "Elevation_High"],
        "highest detected mode",
    );
    geolocation(
        &mut table,
        &["Longitude_Top", "Latitude_Top", "Elevation_Top"],
        "highest detected signal",
    );

    let rh_fields = SchemaVersion::Lds202
        .fields()
        .iter()
        .filter_map(|f| Some((f.name, f.name.strip_prefix("RH")?)));
    for (name, pct) in rh_fields {
        table.insert(
            name,
            FieldAttributes::new(
                name,
                Some("Meters"),
                &format!(
                    "Height relative to the lowest detected mode at which {}% of the \
                     waveform energy occurs",
                    pct
                ),
            ),
        );
    }

    table.insert(
        "Azimuth",
        FieldAttributes::new("Azimuth", Some("degrees"), "Azimuth angle of the laser beam.")
            .with_valid_range(0.0, 360.0),
    );
    table.insert(
        "Incident_Angle",
        FieldAttributes::new(
            "Incident_Angle",
            Some("degrees"),
            "Off-nadir incident angle of the laser beam.",
        )
        .with_valid_range(0.0, 360.0),
    );
    table.insert(
        "Range",
        FieldAttributes::new(
            "Range",
            Some("meters"),
            "Distance between the instrument and the ground.",
        ),
    );
    table.insert(
        "Complexity",
        FieldAttributes::new("Complexity", None, "Complexity metric for the return waveform."),
    );
    table.insert(
        "Flag1",
        FieldAttributes::new(
            "Flag1",
            None,
            "Flag indicating LVIS channel used to locate lowest detected mode.",
        ),
    );
    table.insert(
        "Flag2",
        FieldAttributes::new(
            "Flag2",
            None,
            "Flag indicating LVIS channel used to calculate RH metrics.",
        ),
    );
    table.insert(
        "Flag3",
        FieldAttributes::new(
            "Flag3",
            None,
            "Flag indicating LVIS channel waveform contained in Level-1B file.",
        ),
    );

    table
}

/// The full attribute table
pub fn attribute_table() -> &'static HashMap<&'static str, FieldAttributes> {
    static TABLE: OnceLock<HashMap<&'static str, FieldAttributes>> = OnceLock::new();
    TABLE.get_or_init(build_table)
}

/// Attributes for one field, if the field is known
#[must_use]
pub fn field_attributes(name: &str) -> Option<&'static FieldAttributes> {
    attribute_table().get(name)
}
