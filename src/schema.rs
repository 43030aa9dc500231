//! LVIS file identity and data structure (LDS) resolution
//!
//! The column layout of a Level-2 text file is never announced inside the
//! file. It is inferred once from the file name: the release token (`R1408`,
//! `R1800`, ...) decides between the LDS 1.04 and LDS 2.0.2 generations, and
//! the date block supplies the acquisition day used as the J2000 baseline.

use crate::errors::{LvisError, Result};
use chrono::NaiveDate;
use regex::Regex;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::OnceLock;

/// Releases at or above this number use the LDS 2.0.2 layout
pub const LDS_202_FIRST_RELEASE: u32 = 18;

/// Name of the derived J2000 column appended to every record set
pub const J2000_FIELD: &str = "J2000";

/// Name of the shared record dimension
pub const SHOT_DIMENSION: &str = "Shot_Number";

/// Airborne altimeter mission tag at the front of a file name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mission {
    /// LVIS on the NASA B-200 (legacy tag)
    Blvis2,
    /// LVIS on the NASA B-200 (later tag)
    Bvlis2,
    /// Operation IceBridge LVIS
    Ilvis2,
    /// Operation IceBridge LVIS Global Hawk
    Ilvgh2,
}

impl Mission {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Blvis2 => "BLVIS2",
            Self::Bvlis2 => "BVLIS2",
            Self::Ilvis2 => "ILVIS2",
            Self::Ilvgh2 => "ILVGH2",
        }
    }
}

impl FromStr for Mission {
    type Err = LvisError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "BLVIS2" => Ok(Self::Blvis2),
            "BVLIS2" => Ok(Self::Bvlis2),
            "ILVIS2" => Ok(Self::Ilvis2),
            "ILVGH2" => Ok(Self::Ilvgh2),
            other => Err(LvisError::MalformedFilename {
                name: s.to_string(),
                reason: format!("unknown mission tag '{}'", other),
            }),
        }
    }
}

/// Campaign region code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    Greenland,
    Antarctica,
}

impl Region {
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Greenland => "GL",
            Self::Antarctica => "AQ",
        }
    }
}

impl FromStr for Region {
    type Err = LvisError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "GL" => Ok(Self::Greenland),
            "AQ" => Ok(Self::Antarctica),
            other => Err(LvisError::MalformedFilename {
                name: s.to_string(),
                reason: format!("unknown region code '{}'", other),
            }),
        }
    }
}

/// LVIS Data Structure generation of a Level-2 text file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaVersion {
    /// LDS 1.04: centroid, low and high mode geolocation
    Lds104,
    /// LDS 2.0.2: low, top and high geolocation plus waveform metrics
    Lds202,
}

/// Storage kind of a text column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Integer,
    Float,
}

/// One positional column of a data line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    pub kind: ColumnKind,
}

const fn int(name: &'static str) -> Field {
    Field {
        name,
        kind: ColumnKind::Integer,
    }
}

const fn float(name: &'static str) -> Field {
    Field {
        name,
        kind: ColumnKind::Float,
    }
}

const LDS_104_FIELDS: [Field; 12] = [
    int("LVIS_LFID"),
    int("Shot_Number"),
    float("Time"),
    float("Longitude_Centroid"),
    float("Latitude_Centroid"),
    float("Elevation_Centroid"),
    float("Longitude_Low"),
    float("Latitude_Low"),
    float("Elevation_Low"),
    float("Longitude_High"),
    float("Latitude_High"),
    float("Elevation_High"),
];

const LDS_202_FIELDS: [Field; 42] = [
    int("LVIS_LFID"),
    int("Shot_Number"),
    float("Time"),
    float("Longitude_Low"),
    float("Latitude_Low"),
    float("Elevation_Low"),
    float("Longitude_Top"),
    float("Latitude_Top"),
    float("Elevation_Top"),
    float("Longitude_High"),
    float("Latitude_High"),
    float("Elevation_High"),
    float("RH10"),
    float("RH15"),
    float("RH20"),
    float("RH25"),
    float("RH30"),
    float("RH35"),
    float("RH40"),
    float("RH45"),
    float("RH50"),
    float("RH55"),
    float("RH60"),
    float("RH65"),
    float("RH70"),
    float("RH75"),
    float("RH80"),
    float("RH85"),
    float("RH90"),
    float("RH95"),
    float("RH96"),
    float("RH97"),
    float("RH98"),
    float("RH99"),
    float("RH100"),
    float("Azimuth"),
    float("Incident_Angle"),
    float("Range"),
    float("Complexity"),
    int("Flag1"),
    int("Flag2"),
    int("Flag3"),
];

/// A named output group and the datasets it holds, in write order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupLayout {
    pub name: &'static str,
    pub fields: &'static [&'static str],
}

const TIME_GROUP: GroupLayout = GroupLayout {
    name: "Time",
    fields: &["LVIS_LFID", "Time", J2000_FIELD],
};

const LDS_104_GROUPS: [GroupLayout; 3] = [
    TIME_GROUP,
    GroupLayout {
        name: "Geolocation",
        fields: &[
            "Longitude_Centroid",
            "Longitude_Low",
            "Longitude_High",
            "Latitude_Centroid",
            "Latitude_Low",
            "Latitude_High",
        ],
    },
    GroupLayout {
        name: "Elevation_Surfaces",
        fields: &["Elevation_Centroid", "Elevation_Low", "Elevation_High"],
    },
];

const LDS_202_GROUPS: [GroupLayout; 5] = [
    TIME_GROUP,
    GroupLayout {
        name: "Geolocation",
        fields: &[
            "Longitude_Low",
            "Longitude_High",
            "Longitude_Top",
            "Latitude_Low",
            "Latitude_High",
            "Latitude_Top",
        ],
    },
    GroupLayout {
        name: "Elevation_Surfaces",
        fields: &["Elevation_Low", "Elevation_High", "Elevation_Top"],
    },
    GroupLayout {
        name: "Waveform",
        fields: &[
            "RH10", "RH15", "RH20", "RH25", "RH30", "RH35", "RH40", "RH45", "RH50", "RH55",
            "RH60", "RH65", "RH70", "RH75", "RH80", "RH85", "RH90", "RH95", "RH96", "RH97",
            "RH98", "RH99", "RH100", "Complexity",
        ],
    },
    GroupLayout {
        name: "Instrument_Parameters",
        fields: &["Azimuth", "Incident_Angle", "Range", "Flag1", "Flag2", "Flag3"],
    },
];

impl SchemaVersion {
    /// Select the layout generation from the two-digit release number
    #[must_use]
    pub const fn from_release(release: u32) -> Self {
        if release >= LDS_202_FIRST_RELEASE {
            Self::Lds202
        } else {
            Self::Lds104
        }
    }

    /// Version number as published with the data structure
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lds104 => "1.04",
            Self::Lds202 => "2.0.2",
        }
    }

    /// Version tag written to the `version` global attribute
    #[must_use]
    pub fn tag(self) -> String {
        format!("LDSv{}", self.as_str())
    }

    /// Ordered column list of a data line
    #[must_use]
    pub fn fields(self) -> &'static [Field] {
        match self {
            Self::Lds104 => &LDS_104_FIELDS,
            Self::Lds202 => &LDS_202_FIELDS,
        }
    }

    /// Number of numeric tokens on every data line
    #[must_use]
    pub fn width(self) -> usize {
        self.fields().len()
    }

    /// Output groups for this generation, in creation order
    #[must_use]
    pub fn groups(self) -> &'static [GroupLayout] {
        match self {
            Self::Lds104 => &LDS_104_GROUPS,
            Self::Lds202 => &LDS_202_GROUPS,
        }
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SchemaVersion {
    type Err = LvisError;

    /// Accepts `1.04`, `2.0.2` and their `LDSv` tagged forms
    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let bare = trimmed
            .strip_prefix("LDSv")
            .or_else(|| trimmed.strip_prefix("LDS"))
            .unwrap_or(trimmed);
        match bare {
            "1.04" => Ok(Self::Lds104),
            "2.0.2" => Ok(Self::Lds202),
            _ => Err(LvisError::UnsupportedSchema {
                version: s.to_string(),
            }),
        }
    }
}

/// Metadata carried by a Level-2 file name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileIdentity {
    pub mission: Mission,
    pub region: Region,
    pub year: i32,
    pub month: u32,
    pub day: u32,
    /// Full release token, e.g. `R1408`
    pub release: String,
    /// First two digits of the release token
    pub release_number: u32,
    pub sequence: String,
}

fn filename_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(concat!(
            r"(?i)^(BLVIS2|BVLIS2|ILVIS2|ILVGH2)_(GL|AQ)(\d+)",
            r"(?:_(\d{4}))?_(R(\d{2})\d*)_(\d+)\.TXT$",
        ))
        .expect("file name pattern is valid")
    })
}

/// Expand a two-digit year: 00-49 are 2000s, 50-99 are 1900s
#[must_use]
pub const fn windowed_year(yy: i32) -> i32 {
    if yy < 50 {
        2000 + yy
    } else {
        1900 + yy
    }
}

fn parse_digits<T: FromStr>(digits: &str, name: &str, what: &str) -> Result<T> {
    digits.parse::<T>().map_err(|_| LvisError::MalformedFilename {
        name: name.to_string(),
        reason: format!("invalid {} '{}'", what, digits),
    })
}

impl FileIdentity {
    /// Extract identity metadata from a file name or path
    ///
    /// Only the final path component is inspected. Accepted date blocks are
    /// `YYYY_MMDD`, `YY_MMDD`, `YYYYMMDD` and `YYMMDD`.
    pub fn from_filename(path: &str) -> Result<Self> {
        let name = Path::new(path)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(path);

        let malformed = |reason: &str| LvisError::MalformedFilename {
            name: name.to_string(),
            reason: reason.to_string(),
        };

        let caps = filename_pattern().captures(name).ok_or_else(|| {
            malformed("expected <MISSION>_<REGION><DATE>_<RELEASE>_<SEQ>.TXT")
        })?;

        let mission: Mission = caps[1].parse()?;
        let region: Region = caps[2].parse()?;
        let block = &caps[3];

        let (year_digits, month_day) = match caps.get(4) {
            Some(mmdd) => (block, mmdd.as_str()),
            None => match block.len() {
                8 => block.split_at(4),
                6 => block.split_at(2),
                _ => return Err(malformed("date block must be YYMMDD or YYYYMMDD")),
            },
        };

        let year: i32 = parse_digits(year_digits, name, "year")?;
        let year = match year_digits.len() {
            2 => windowed_year(year),
            4 => year,
            _ => return Err(malformed("year must have two or four digits")),
        };

        let (mm, dd) = month_day.split_at(2);
        let month: u32 = parse_digits(mm, name, "month")?;
        let day: u32 = parse_digits(dd, name, "day")?;
        if NaiveDate::from_ymd_opt(year, month, day).is_none() {
            return Err(malformed(&format!(
                "{:04}-{:02}-{:02} is not a calendar date",
                year, month, day
            )));
        }

        let release = caps[5].to_ascii_uppercase();
        let release_number: u32 = parse_digits(&caps[6], name, "release")?;

        Ok(Self {
            mission,
            region,
            year,
            month,
            day,
            release,
            release_number,
            sequence: caps[7].to_string(),
        })
    }

    /// Data structure generation implied by the release number
    #[must_use]
    pub const fn schema(&self) -> SchemaVersion {
        SchemaVersion::from_release(self.release_number)
    }

    /// Acquisition calendar day
    pub fn acquisition_date(&self) -> Result<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, self.day).ok_or_else(|| {
            LvisError::Generic(format!(
                "invalid acquisition date {:04}-{:02}-{:02}",
                self.year, self.month, self.day
            ))
        })
    }
}

/// Whether a path names a convertible Level-2 text file (`.TXT`, any case)
#[must_use]
pub fn is_convertible(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("txt"))
}
