//! Level-2 text record parsing
//!
//! Turns the body of an LVIS Level-2 text file into a [`RecordSet`]: one
//! aligned column per schema field plus the derived J2000 column.
//!
//! Lines starting with `#` are header/comment lines and are dropped. Every
//! remaining line is split into columns on whitespace, `,` and `;`. The
//! column count is checked against the schema before any token is cast, so a
//! short or long line fails early with its line number instead of shifting
//! every later field.

use crate::errors::{LvisError, Result};
use crate::julian::{j2000_seconds, julian_day_of_date};
use crate::schema::{ColumnKind, SchemaVersion, J2000_FIELD};
use chrono::NaiveDate;
use ndarray::Array1;
use tracing::debug;

/// One parsed column
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Integer(Array1<i64>),
    Float(Array1<f64>),
}

impl Column {
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Column::Integer(values) => values.len(),
            Column::Float(values) => values.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn kind(&self) -> ColumnKind {
        match self {
            Column::Integer(_) => ColumnKind::Integer,
            Column::Float(_) => ColumnKind::Float,
        }
    }

    #[must_use]
    pub fn as_float(&self) -> Option<&Array1<f64>> {
        match self {
            Column::Float(values) => Some(values),
            Column::Integer(_) => None,
        }
    }

    #[must_use]
    pub fn as_integer(&self) -> Option<&Array1<i64>> {
        match self {
            Column::Integer(values) => Some(values),
            Column::Float(_) => None,
        }
    }
}

/// Parsed shots of one file, aligned by record index across all fields
#[derive(Debug, Clone)]
pub struct RecordSet {
    schema: SchemaVersion,
    columns: Vec<(&'static str, Column)>,
    len: usize,
}

impl RecordSet {
    #[must_use]
    pub fn schema(&self) -> SchemaVersion {
        self.schema
    }

    /// Number of shots
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Field names in column order, `J2000` last
    pub fn field_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.columns.iter().map(|(name, _)| *name)
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Column> {
        self.columns
            .iter()
            .find(|(field, _)| *field == name)
            .map(|(_, column)| column)
    }

    /// Float column by name
    pub fn float(&self, name: &str) -> Result<&Array1<f64>> {
        self.field(name)
            .and_then(Column::as_float)
            .ok_or_else(|| LvisError::MissingField {
                field: name.to_string(),
            })
    }

    /// Integer column by name
    pub fn integer(&self, name: &str) -> Result<&Array1<i64>> {
        self.field(name)
            .and_then(Column::as_integer)
            .ok_or_else(|| LvisError::MissingField {
                field: name.to_string(),
            })
    }

    /// Continuous J2000 seconds of every shot
    pub fn j2000(&self) -> Result<&Array1<f64>> {
        self.float(J2000_FIELD)
    }
}

enum ColumnBuilder {
    Integer(Vec<i64>),
    Float(Vec<f64>),
}

impl ColumnBuilder {
    fn new(kind: ColumnKind, capacity: usize) -> Self {
        match kind {
            ColumnKind::Integer => Self::Integer(Vec::with_capacity(capacity)),
            ColumnKind::Float => Self::Float(Vec::with_capacity(capacity)),
        }
    }

    fn push(&mut self, token: &str, field: &str, line: usize) -> Result<()> {
        match self {
            Self::Integer(values) => {
                let value = token.parse::<i64>().map_err(|_| LvisError::RecordParse {
                    line,
                    message: format!("'{}' is not an integer (field {})", token, field),
                })?;
                values.push(value);
            }
            Self::Float(values) => {
                let value = token.parse::<f64>().map_err(|_| LvisError::RecordParse {
                    line,
                    message: format!("'{}' is not a number (field {})", token, field),
                })?;
                values.push(value);
            }
        }
        Ok(())
    }

    fn finish(self) -> Column {
        match self {
            Self::Integer(values) => Column::Integer(Array1::from(values)),
            Self::Float(values) => Column::Float(Array1::from(values)),
        }
    }
}

/// A retained data line with its 1-based position in the file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataLine<'a> {
    pub line: usize,
    pub text: &'a str,
}

/// Drop `#` comment lines, keeping file order
///
/// Every other line is a record, blank ones included, so a stray empty line
/// fails the column-count check instead of vanishing.
pub fn data_lines(text: &str) -> Vec<DataLine<'_>> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.starts_with('#'))
        .map(|(idx, line)| DataLine {
            line: idx + 1,
            text: line,
        })
        .collect()
}

/// Split a data line into its column tokens
pub fn split_columns(line: &str) -> Vec<&str> {
    line.split(|c: char| c.is_whitespace() || c == ',' || c == ';')
        .filter(|token| !token.is_empty())
        .collect()
}

/// Whether a token is an optionally signed decimal with optional exponent
#[must_use]
pub fn is_numeric_token(token: &str) -> bool {
    let bytes = token.as_bytes();
    let mut pos = 0;

    let digits = |pos: &mut usize| {
        let start = *pos;
        while *pos < bytes.len() && bytes[*pos].is_ascii_digit() {
            *pos += 1;
        }
        *pos - start
    };

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        pos += 1;
    }
    let int_digits = digits(&mut pos);
    let mut frac_digits = 0;
    if bytes.get(pos) == Some(&b'.') {
        pos += 1;
        frac_digits = digits(&mut pos);
    }
    if int_digits + frac_digits == 0 {
        return false;
    }
    if matches!(bytes.get(pos), Some(b'e' | b'E')) {
        pos += 1;
        if matches!(bytes.get(pos), Some(b'+' | b'-')) {
            pos += 1;
        }
        if digits(&mut pos) == 0 {
            return false;
        }
    }
    pos == bytes.len()
}

/// Parse the text body of a Level-2 file
///
/// `date` is the acquisition day used as the J2000 baseline. When `subset`
/// is given, only those record indices (counted after comment stripping)
/// are parsed, in the order listed.
pub fn parse_records(
    text: &str,
    schema: SchemaVersion,
    date: NaiveDate,
    subset: Option<&[usize]>,
) -> Result<RecordSet> {
    let lines = data_lines(text);
    let selected: Vec<DataLine<'_>> = match subset {
        Some(indices) => indices
            .iter()
            .map(|&index| {
                lines
                    .get(index)
                    .copied()
                    .ok_or(LvisError::SubsetOutOfRange {
                        index,
                        available: lines.len(),
                    })
            })
            .collect::<Result<_>>()?,
        None => lines,
    };

    let fields = schema.fields();
    let mut builders: Vec<ColumnBuilder> = fields
        .iter()
        .map(|field| ColumnBuilder::new(field.kind, selected.len()))
        .collect();

    for data_line in &selected {
        let tokens = split_columns(data_line.text);
        if tokens.len() != fields.len() {
            return Err(LvisError::RecordParse {
                line: data_line.line,
                message: format!(
                    "expected {} columns for LDS {}, found {}",
                    fields.len(),
                    schema,
                    tokens.len()
                ),
            });
        }
        for ((token, field), builder) in tokens.iter().zip(fields).zip(builders.iter_mut()) {
            if !is_numeric_token(token) {
                return Err(LvisError::RecordParse {
                    line: data_line.line,
                    message: format!(
                        "malformed numeric token '{}' (field {})",
                        token, field.name
                    ),
                });
            }
            builder.push(token, field.name, data_line.line)?;
        }
    }

    let mut columns: Vec<(&'static str, Column)> = fields
        .iter()
        .zip(builders)
        .map(|(field, builder)| (field.name, builder.finish()))
        .collect();

    let day_julian = julian_day_of_date(date);
    let j2000 = match columns.iter().find(|(name, _)| *name == "Time") {
        Some((_, Column::Float(time))) => time.mapv(|t| j2000_seconds(day_julian, t)),
        _ => {
            return Err(LvisError::MissingField {
                field: "Time".to_string(),
            })
        }
    };
    columns.push((J2000_FIELD, Column::Float(j2000)));

    debug!(
        records = selected.len(),
        schema = %schema,
        "parsed Level-2 records"
    );

    Ok(RecordSet {
        schema,
        columns,
        len: selected.len(),
    })
}
