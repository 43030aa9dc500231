//! Unit tests for lvis2nc modules
//!
//! Cover file name resolution, time arithmetic, record parsing and the
//! attribute table without touching the filesystem.

use chrono::NaiveDate;
use clap::Parser;
use lvis2nc::{
    attributes::{attribute_table, field_attributes},
    cli::{Cli, Command},
    convert::{parse_mode, read_records, ConvertConfig, DEFAULT_MODE},
    errors::LvisError,
    julian::{j2000_seconds, j2000_to_datetime, julian_day, julian_day_of_date},
    parallel::{get_parallel_info, ParallelConfig},
    parser::{data_lines, is_numeric_token, parse_records, split_columns, Column},
    schema::{
        is_convertible, windowed_year, ColumnKind, FileIdentity, Mission, Region, SchemaVersion,
        J2000_FIELD, SHOT_DIMENSION,
    },
};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

const LDS_104_TEXT: &str = "\
# LVIS Level-2 geolocated elevation product
# LFID SHOTNUMBER TIME GLON GLAT ZG ...
1604150 10001 43200.50 309.512345 69.123456 1201.21 309.512340 69.123450 1199.84 309.512350 69.123460 1203.55
1604150 10002 43200.75 309.512845 69.123956 1202.01 309.512840 69.123950 1200.14 309.512850 69.123960 1204.05
";

fn april_15_2009() -> NaiveDate {
    NaiveDate::from_ymd_opt(2009, 4, 15).expect("valid date")
}

fn lds_202_line(shot: i64, time: f64) -> String {
    let mut tokens = vec![
        "1704150".to_string(),
        shot.to_string(),
        format!("{:.3}", time),
    ];
    for i in 0..9 {
        tokens.push(format!("{:.6}", 300.0 + f64::from(i)));
    }
    for i in 0..23 {
        tokens.push(format!("{:.2}", f64::from(i) * 0.5));
    }
    tokens.extend(["123.4", "4.2", "9876.5", "0.31", "1", "2", "0"].map(String::from));
    tokens.join(" ")
}

#[test]
fn test_error_types() {
    let err = LvisError::MalformedFilename {
        name: "foo.TXT".to_string(),
        reason: "bad".to_string(),
    };
    assert!(format!("{}", err).contains("Malformed LVIS file name 'foo.TXT'"));

    let err = LvisError::RecordParse {
        line: 5,
        message: "short".to_string(),
    };
    assert!(format!("{}", err).contains("line 5"));

    let generic_err = LvisError::Generic("Test error".to_string());
    assert_eq!(format!("{}", generic_err), "Test error");
}

#[test]
fn test_schema_from_release() {
    let id = FileIdentity::from_filename("ILVIS2_AQ2017_1115_R1800_050.TXT").unwrap();
    assert_eq!(id.schema(), SchemaVersion::Lds202);
    assert_eq!(id.release, "R1800");
    assert_eq!(id.release_number, 18);

    let id = FileIdentity::from_filename("ILVIS2_GL2009_0415_R1704_042.TXT").unwrap();
    assert_eq!(id.schema(), SchemaVersion::Lds104);
    assert_eq!(id.mission, Mission::Ilvis2);
    assert_eq!(id.region, Region::Greenland);
    assert_eq!((id.year, id.month, id.day), (2009, 4, 15));
    assert_eq!(id.sequence, "042");

    let id = FileIdentity::from_filename("BLVIS2_GL2012_0301_R1408_001.TXT").unwrap();
    assert_eq!(id.schema(), SchemaVersion::Lds104);
    assert_eq!(id.mission, Mission::Blvis2);

    assert_eq!(SchemaVersion::from_release(17), SchemaVersion::Lds104);
    assert_eq!(SchemaVersion::from_release(18), SchemaVersion::Lds202);
}

#[test]
fn test_filename_date_forms() {
    let compact = FileIdentity::from_filename("ILVGH2_AQ20151020_R1800_003.TXT").unwrap();
    assert_eq!((compact.year, compact.month, compact.day), (2015, 10, 20));
    assert_eq!(compact.region, Region::Antarctica);

    let short = FileIdentity::from_filename("ILVIS2_GL09_0415_R1704_01.TXT").unwrap();
    assert_eq!(short.year, 2009);

    let windowed = FileIdentity::from_filename("ILVIS2_GL960415_R1408_01.txt").unwrap();
    assert_eq!(windowed.year, 1996);

    let with_dir =
        FileIdentity::from_filename("/data/2009.04.15/ILVIS2_GL2009_0415_R1704_042.TXT").unwrap();
    assert_eq!(with_dir.acquisition_date().unwrap(), april_15_2009());
}

#[test]
fn test_malformed_filenames() {
    for name in [
        "ILVIS2_GL0415_R1704_01.TXT",
        "ILVIS2_GL2009_0230_R1704_01.TXT",
        "XLVIS2_GL2009_0415_R1704_01.TXT",
        "ILVIS2_NZ2009_0415_R1704_01.TXT",
        "ILVIS2_GL2009_0415_1704_01.TXT",
        "ILVIS2_GL2009_0415_R1704_01.H5",
        "notes.txt",
    ] {
        let result = FileIdentity::from_filename(name);
        assert!(
            matches!(result, Err(LvisError::MalformedFilename { .. })),
            "{} should be rejected, got {:?}",
            name,
            result
        );
    }
}

#[test]
fn test_year_windowing() {
    assert_eq!(windowed_year(0), 2000);
    assert_eq!(windowed_year(49), 2049);
    assert_eq!(windowed_year(50), 1950);
    assert_eq!(windowed_year(99), 1999);
}

#[test]
fn test_schema_version_tags() {
    assert_eq!(SchemaVersion::Lds104.to_string(), "1.04");
    assert_eq!(SchemaVersion::Lds202.tag(), "LDSv2.0.2");
    assert_eq!("LDSv1.04".parse::<SchemaVersion>().unwrap(), SchemaVersion::Lds104);
    assert_eq!("2.0.2".parse::<SchemaVersion>().unwrap(), SchemaVersion::Lds202);
    assert!(matches!(
        "3.0".parse::<SchemaVersion>(),
        Err(LvisError::UnsupportedSchema { .. })
    ));
}

#[test]
fn test_schema_widths_and_kinds() {
    assert_eq!(SchemaVersion::Lds104.width(), 12);
    assert_eq!(SchemaVersion::Lds202.width(), 42);

    for schema in [SchemaVersion::Lds104, SchemaVersion::Lds202] {
        let fields = schema.fields();
        assert_eq!(fields[0].name, "LVIS_LFID");
        assert_eq!(fields[1].name, SHOT_DIMENSION);
        assert_eq!(fields[2].name, "Time");
        for field in fields {
            let expected = if field.name == "LVIS_LFID"
                || field.name == SHOT_DIMENSION
                || field.name.starts_with("Flag")
            {
                ColumnKind::Integer
            } else {
                ColumnKind::Float
            };
            assert_eq!(field.kind, expected, "{}", field.name);
        }
    }
}

#[test]
fn test_groups_cover_every_field_once() {
    for schema in [SchemaVersion::Lds104, SchemaVersion::Lds202] {
        let mut grouped: Vec<&str> = schema
            .groups()
            .iter()
            .flat_map(|g| g.fields.iter().copied())
            .collect();
        grouped.push(SHOT_DIMENSION);

        let unique: HashSet<&str> = grouped.iter().copied().collect();
        assert_eq!(unique.len(), grouped.len(), "duplicate dataset in {}", schema);

        let mut expected: HashSet<&str> = schema.fields().iter().map(|f| f.name).collect();
        expected.insert(J2000_FIELD);
        assert_eq!(unique, expected);
    }

    let names: Vec<&str> = SchemaVersion::Lds202.groups().iter().map(|g| g.name).collect();
    assert_eq!(
        names,
        [
            "Time",
            "Geolocation",
            "Elevation_Surfaces",
            "Waveform",
            "Instrument_Parameters"
        ]
    );
    assert_eq!(SchemaVersion::Lds104.groups().len(), 3);
}

#[test]
fn test_julian_day() {
    assert_eq!(julian_day_of_date(april_15_2009()), 2_454_936.5);
    assert_eq!(julian_day(2000, 1, 1, 12.0, 0.0, 0.0), 2_451_545.0);
    assert_eq!(julian_day(2000, 1, 1, 0.0, 0.0, 0.0), 2_451_544.5);
}

#[test]
fn test_j2000_seconds() {
    let jd = julian_day_of_date(april_15_2009());
    assert_eq!(j2000_seconds(jd, 43_200.5), 293_068_800.5);
    assert_eq!(j2000_seconds(2_451_545.0, 0.0), 0.0);

    let epoch = j2000_to_datetime(0.0).unwrap();
    assert_eq!(epoch.to_string(), "2000-01-01 12:00:00");
    let shot = j2000_to_datetime(293_068_800.5).unwrap();
    assert_eq!(shot.format("%Y:%m:%d %H:%M:%S").to_string(), "2009:04:15 12:00:00");
    assert!(j2000_to_datetime(f64::NAN).is_none());
}

#[test]
fn test_line_helpers() {
    let lines = data_lines("# header\n1 2 3\n#c\n4 5 6\n");
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0].line, 2);
    assert_eq!(lines[1].line, 4);

    // blank lines are kept; only the remainder after the last newline is not a line
    let lines = data_lines("# header\n1 2 3\n\n4 5 6");
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[1].text, "");

    assert_eq!(split_columns(" 1\t2,3;4  5 "), vec!["1", "2", "3", "4", "5"]);

    for token in ["1", "-2.5", "+.5", "3.", "1e5", "6.02E-23"] {
        assert!(is_numeric_token(token), "{}", token);
    }
    for token in ["", "-", ".", "1e", "abc", "1.2.3", "0x10", "nan"] {
        assert!(!is_numeric_token(token), "{}", token);
    }
}

#[test]
fn test_parse_lds_104() {
    let records =
        parse_records(LDS_104_TEXT, SchemaVersion::Lds104, april_15_2009(), None).unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records.schema(), SchemaVersion::Lds104);

    let names: Vec<&str> = records.field_names().collect();
    assert_eq!(names.len(), 13);
    assert_eq!(names.last(), Some(&J2000_FIELD));
    for name in &names {
        assert_eq!(records.field(name).map(Column::len), Some(2), "{}", name);
    }

    let shots = records.integer(SHOT_DIMENSION).unwrap();
    assert_eq!(shots.to_vec(), vec![10001, 10002]);
    let elevation = records.float("Elevation_Low").unwrap();
    assert_eq!(elevation[1], 1200.14);

    let j2000 = records.j2000().unwrap();
    assert_eq!(j2000[0], 293_068_800.5);
    assert!(j2000[1] >= j2000[0]);
}

#[test]
fn test_parse_lds_202() {
    let text = format!("{}\n{}\n", lds_202_line(1, 100.0), lds_202_line(2, 100.25));
    let records = parse_records(&text, SchemaVersion::Lds202, april_15_2009(), None).unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records.field_names().count(), 43);
    assert_eq!(records.integer("Flag2").unwrap().to_vec(), vec![2, 2]);
    assert_eq!(records.float("RH100").unwrap()[0], 11.0);
    assert_eq!(records.float("Complexity").unwrap()[1], 0.31);
}

#[test]
fn test_parse_rejects_blank_line() {
    let mut rows = LDS_104_TEXT.lines().skip(2);
    let (first, second) = (rows.next().unwrap(), rows.next().unwrap());
    let text = format!("# header\n{}\n\n{}\n", first, second);

    let err = parse_records(&text, SchemaVersion::Lds104, april_15_2009(), None).unwrap_err();
    match err {
        LvisError::RecordParse { line, message } => {
            assert_eq!(line, 3);
            assert!(message.contains("found 0"));
        }
        other => panic!("unexpected error {:?}", other),
    }

    let whitespace = format!("# header\n{}\n   \t\n{}\n", first, second);
    let err = parse_records(&whitespace, SchemaVersion::Lds104, april_15_2009(), None)
        .unwrap_err();
    assert!(matches!(err, LvisError::RecordParse { line: 3, .. }));
}

#[test]
fn test_parse_comment_only_file() {
    let comments = "# only\n# comments\n";
    let records = parse_records(comments, SchemaVersion::Lds104, april_15_2009(), None).unwrap();
    assert!(records.is_empty());
    assert_eq!(records.j2000().unwrap().len(), 0);
}

#[test]
fn test_parse_reports_line_of_wrong_column_count() {
    let text = format!("{}1 2 3\n", LDS_104_TEXT);
    let err = parse_records(&text, SchemaVersion::Lds104, april_15_2009(), None).unwrap_err();
    match err {
        LvisError::RecordParse { line, message } => {
            assert_eq!(line, 5);
            assert!(message.contains("expected 12"));
        }
        other => panic!("unexpected error {:?}", other),
    }

    // 1.04 rows are too short for the 2.0.2 layout
    let err =
        parse_records(LDS_104_TEXT, SchemaVersion::Lds202, april_15_2009(), None).unwrap_err();
    assert!(matches!(err, LvisError::RecordParse { line: 3, .. }));
}

#[test]
fn test_parse_rejects_bad_tokens() {
    let fractional_id = LDS_104_TEXT.replace("1604150 10002", "1604150 10002.5");
    let err = parse_records(&fractional_id, SchemaVersion::Lds104, april_15_2009(), None)
        .unwrap_err();
    assert!(matches!(err, LvisError::RecordParse { line: 4, .. }));

    let garbage = LDS_104_TEXT.replace("1199.84", "12x9");
    let err = parse_records(&garbage, SchemaVersion::Lds104, april_15_2009(), None).unwrap_err();
    assert!(matches!(err, LvisError::RecordParse { line: 3, .. }));
}

#[test]
fn test_parse_subset() {
    let subset = [1, 0];
    let records =
        parse_records(LDS_104_TEXT, SchemaVersion::Lds104, april_15_2009(), Some(&subset)).unwrap();
    assert_eq!(records.integer(SHOT_DIMENSION).unwrap().to_vec(), vec![10002, 10001]);

    let err = parse_records(LDS_104_TEXT, SchemaVersion::Lds104, april_15_2009(), Some(&[5]))
        .unwrap_err();
    assert!(matches!(
        err,
        LvisError::SubsetOutOfRange {
            index: 5,
            available: 2
        }
    ));
}

#[test]
fn test_read_records_uses_filename_schema() {
    let records = read_records(LDS_104_TEXT, "ILVIS2_GL2009_0415_R1704_042.TXT", None).unwrap();
    assert_eq!(records.schema(), SchemaVersion::Lds104);

    let err = read_records(LDS_104_TEXT, "ILVIS2_GL2009_0415_R1800_042.TXT", None).unwrap_err();
    assert!(matches!(err, LvisError::RecordParse { .. }));

    let err = read_records(LDS_104_TEXT, "elevations.TXT", None).unwrap_err();
    assert!(matches!(err, LvisError::MalformedFilename { .. }));
}

#[test]
fn test_attribute_table() {
    for schema in [SchemaVersion::Lds104, SchemaVersion::Lds202] {
        for field in schema.fields() {
            let attrs = field_attributes(field.name).expect("every field is described");
            assert!(!attrs.long_name.is_empty());
            assert!(!attrs.description.is_empty());
        }
    }
    assert!(field_attributes(J2000_FIELD).is_some());
    assert!(field_attributes("Not_A_Field").is_none());

    assert_eq!(field_attributes("Azimuth").unwrap().valid_range, Some((0.0, 360.0)));
    assert_eq!(field_attributes("Elevation_Low").unwrap().units, Some("Meters"));
    assert_eq!(field_attributes("Flag3").unwrap().long_name, "Flag3");
    assert!(field_attributes("RH95")
        .unwrap()
        .description
        .contains("95%"));
    assert!(attribute_table().len() >= 45);
}

#[test]
fn test_parse_mode() {
    assert_eq!(parse_mode("775").unwrap(), DEFAULT_MODE);
    assert_eq!(parse_mode("0o644").unwrap(), 0o644);
    assert_eq!(parse_mode(" 600 ").unwrap(), 0o600);
    for bad in ["999", "17777", "rwx", ""] {
        assert!(
            matches!(parse_mode(bad), Err(LvisError::InvalidMode { .. })),
            "{}",
            bad
        );
    }
}

#[test]
fn test_output_paths() {
    let config = ConvertConfig::default();
    let input = Path::new("/data/ILVIS2_GL2009_0415_R1704_042.TXT");
    assert_eq!(
        config.output_path_for(input),
        PathBuf::from("/data/ILVIS2_GL2009_0415_R1704_042.H5")
    );

    let config = ConvertConfig {
        extension: "nc".to_string(),
        output_dir: Some(PathBuf::from("/out")),
        ..ConvertConfig::default()
    };
    assert_eq!(
        config.output_path_for(input),
        PathBuf::from("/out/ILVIS2_GL2009_0415_R1704_042.nc")
    );

    assert!(is_convertible(Path::new("a.TXT")));
    assert!(is_convertible(Path::new("a.txt")));
    assert!(!is_convertible(Path::new("a.TXT.xml")));
}

#[test]
fn test_parallel_config() {
    let default_config = ParallelConfig::default();
    assert!(default_config.num_threads.is_none());
    assert!(!default_config.is_parallel());

    let config_4 = ParallelConfig::with_threads(4);
    assert_eq!(config_4.num_threads, Some(4));
    assert!(config_4.is_parallel());
    assert!(!ParallelConfig::with_threads(1).is_parallel());

    let all_cores_config = ParallelConfig::all_cores();
    assert!(all_cores_config.num_threads.unwrap() > 0);

    let pool = ParallelConfig::with_threads(2).build_pool().unwrap();
    assert_eq!(pool.current_num_threads(), 2);
}

#[test]
fn test_cli_zero_threads_uses_all_cores() {
    let cli = Cli::try_parse_from(["lvis2nc", "convert", "-t", "0", "a.TXT"]).unwrap();
    let Command::Convert(args) = cli.command else {
        panic!("expected the convert subcommand");
    };
    assert_eq!(args.parallel_config().num_threads, ParallelConfig::all_cores().num_threads);

    let cli = Cli::try_parse_from(["lvis2nc", "convert", "a.TXT"]).unwrap();
    let Command::Convert(args) = cli.command else {
        panic!("expected the convert subcommand");
    };
    assert!(!args.parallel_config().is_parallel());
}

#[test]
fn test_parallel_info() {
    let info = get_parallel_info();
    assert!(info.current_threads > 0);
    assert!(info.available_cores > 0);
    assert!(info.available_parallelism > 0);
}
