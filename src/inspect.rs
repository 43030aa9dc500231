//! Read-back inspection of converted documents
//!
//! Opens a written netCDF-4 document and reports its groups, datasets and
//! global attributes. Used by the `inspect` subcommand and by the tests to
//! check the structure of what was written.

use crate::errors::Result;
use crate::schema::{SchemaVersion, SHOT_DIMENSION};
use netcdf::{AttributeValue, File, Variable};

/// One dataset inside a group
#[derive(Debug, Clone, PartialEq)]
pub struct VariableSummary {
    pub name: String,
    pub data_type: String,
    pub length: usize,
    pub long_name: Option<String>,
    pub units: Option<String>,
}

/// One group and its datasets, in file order
#[derive(Debug, Clone, PartialEq)]
pub struct GroupSummary {
    pub name: String,
    pub variables: Vec<VariableSummary>,
}

impl GroupSummary {
    pub fn variable_names(&self) -> Vec<&str> {
        self.variables.iter().map(|v| v.name.as_str()).collect()
    }
}

/// Structure of a converted document
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentSummary {
    pub records: usize,
    pub version: Option<SchemaVersion>,
    pub groups: Vec<GroupSummary>,
    pub global_attributes: Vec<(String, String)>,
}

impl DocumentSummary {
    pub fn group(&self, name: &str) -> Option<&GroupSummary> {
        self.groups.iter().find(|g| g.name == name)
    }

    pub fn global_attribute(&self, name: &str) -> Option<&str> {
        self.global_attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Render an attribute value the way it reads in `ncdump`
pub fn format_attribute_value(value: &AttributeValue) -> String {
    match value {
        AttributeValue::Str(s) => s.clone(),
        AttributeValue::Strs(ss) => ss.join(", "),
        AttributeValue::Double(d) => d.to_string(),
        AttributeValue::Doubles(ds) => format!("{:?}", ds),
        AttributeValue::Float(f) => f.to_string(),
        AttributeValue::Int(i) => i.to_string(),
        AttributeValue::Longlong(i) => i.to_string(),
        AttributeValue::Short(s) => s.to_string(),
        other => format!("{:?}", other),
    }
}

fn string_attribute(var: &Variable, name: &str) -> Option<String> {
    match var.attribute(name)?.value().ok()? {
        AttributeValue::Str(s) => Some(s),
        _ => None,
    }
}

fn summarize_variable(var: &Variable) -> VariableSummary {
    VariableSummary {
        name: var.name(),
        data_type: format!("{:?}", var.vartype()).to_lowercase(),
        length: var.len(),
        long_name: string_attribute(var, "long_name"),
        units: string_attribute(var, "units"),
    }
}

/// Collect the group/dataset structure and global attributes of a document
pub fn summarize_document(file: &File) -> Result<DocumentSummary> {
    let records = file
        .dimension(SHOT_DIMENSION)
        .map(|d| d.len())
        .unwrap_or(0);

    let mut global_attributes = Vec::new();
    for attr in file.attributes() {
        global_attributes.push((attr.name().to_string(), format_attribute_value(&attr.value()?)));
    }

    let version = global_attributes
        .iter()
        .find(|(key, _)| key == "version")
        .and_then(|(_, value)| value.parse::<SchemaVersion>().ok());

    let mut groups = Vec::new();
    for group in file.groups()? {
        groups.push(GroupSummary {
            name: group.name(),
            variables: group.variables().map(|v| summarize_variable(&v)).collect(),
        });
    }

    Ok(DocumentSummary {
        records,
        version,
        groups,
        global_attributes,
    })
}

/// Prints the groups, datasets and global attributes of a converted document.
pub fn print_document(summary: &DocumentSummary) {
    println!("\n===== Document =====");
    println!("- {} = {}", SHOT_DIMENSION, summary.records);
    if let Some(version) = summary.version {
        println!("- LDS version: {}", version);
    }

    println!("\n===== Groups =====");
    for group in &summary.groups {
        println!("- {}", group.name);
        for var in &group.variables {
            let units = var.units.as_deref().unwrap_or("-");
            println!("    {} ({}) [{}] units: {}", var.name, var.data_type, var.length, units);
        }
    }

    println!("\n===== Global Attributes =====");
    for (name, value) in &summary.global_attributes {
        println!("- {}: {}", name, value);
    }
}
