mod json;
mod text;

pub use json::JsonOutput;
pub(crate) use json::JsonReference;
pub use text::TextOutput;

use crate::run::Report;
use std::io::Write;

pub trait ReportFormatter {
    fn format<W: Write>(&self, report: &Report, writer: &mut W) -> std::io::Result<()>;
}

/// `1 offense`, `3 offenses`.
pub(crate) fn pluralize(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{} {}", count, singular)
    } else {
        format!("{} {}", count, plural)
    }
}
