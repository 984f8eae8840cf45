use crate::model::{Offense, Reference};
use crate::output::ReportFormatter;
use crate::run::{Report, RunStatus};
use crate::todo::TodoEntry;
use serde::Serialize;
use std::io::Write;

pub struct JsonOutput;

impl JsonOutput {
    pub fn new() -> Self {
        Self
    }
}

impl Default for JsonOutput {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    status: RunStatus,
    success: bool,
    files_inspected: usize,
    offenses: Vec<JsonOffense<'a>>,
    outstanding: Vec<JsonOffense<'a>>,
    stale: &'a [TodoEntry],
    strict: &'a [TodoEntry],
    warnings: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    references: Vec<JsonReference<'a>>,
}

#[derive(Serialize)]
struct JsonOffense<'a> {
    file: &'a str,
    line: usize,
    column: usize,
    package: &'a str,
    symbol: &'a str,
    symbol_package: Option<&'a str>,
    violation_type: &'static str,
    message: &'a str,
}

#[derive(Serialize)]
pub(crate) struct JsonReference<'a> {
    file: &'a str,
    line: usize,
    column: usize,
    package: &'a str,
    constant: &'a str,
    constant_file: Option<&'a str>,
    constant_package: Option<&'a str>,
}

impl<'a> From<&'a Offense> for JsonOffense<'a> {
    fn from(offense: &'a Offense) -> Self {
        Self {
            file: offense.file(),
            line: offense.reference.location.line,
            column: offense.reference.location.column,
            package: offense.package(),
            symbol: offense.symbol(),
            symbol_package: offense.symbol_package(),
            violation_type: offense.violation_type.as_str(),
            message: &offense.message,
        }
    }
}

impl<'a> From<&'a Reference> for JsonReference<'a> {
    fn from(reference: &'a Reference) -> Self {
        let symbol = reference.symbol.as_ref();
        Self {
            file: &reference.file,
            line: reference.location.line,
            column: reference.location.column,
            package: &reference.package,
            constant: symbol
                .map(|s| s.name.as_str())
                .unwrap_or(&reference.written_name),
            constant_file: symbol.map(|s| s.file.as_str()),
            constant_package: symbol.map(|s| s.package.as_str()),
        }
    }
}

impl ReportFormatter for JsonOutput {
    fn format<W: Write>(&self, report: &Report, writer: &mut W) -> std::io::Result<()> {
        let json_report = JsonReport {
            status: report.status,
            success: report.success(),
            files_inspected: report.files_inspected,
            offenses: report.offenses.iter().map(JsonOffense::from).collect(),
            outstanding: report.outstanding.iter().map(JsonOffense::from).collect(),
            stale: &report.stale,
            strict: &report.strict,
            warnings: report.warnings.iter().map(|w| w.to_string()).collect(),
            references: report.references.iter().map(JsonReference::from).collect(),
        };

        let json = serde_json::to_string_pretty(&json_report).map_err(std::io::Error::other)?;

        writeln!(writer, "{}", json)
    }
}
