use crate::output::{ReportFormatter, pluralize};
use crate::run::Report;
use crate::todo::TodoEntry;
use colored::Colorize;
use std::io::Write;

/// Human-readable report, grouped by kind of finding.
pub struct TextOutput {
    color: bool,
}

impl TextOutput {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    fn heading(&self, text: &str) -> String {
        if self.color {
            text.bold().to_string()
        } else {
            text.to_string()
        }
    }

    fn location(&self, text: String) -> String {
        if self.color {
            text.cyan().to_string()
        } else {
            text
        }
    }

    fn write_entries<W: Write>(
        &self,
        writer: &mut W,
        title: &str,
        entries: &[TodoEntry],
    ) -> std::io::Result<()> {
        writeln!(writer, "{}", self.heading(title))?;
        for entry in entries {
            writeln!(
                writer,
                "  {}: {} violation on ::{} in {}",
                entry.package, entry.violation_type, entry.symbol, entry.file
            )?;
        }
        writeln!(writer)
    }
}

impl Default for TextOutput {
    fn default() -> Self {
        Self::new(false)
    }
}

impl ReportFormatter for TextOutput {
    fn format<W: Write>(&self, report: &Report, writer: &mut W) -> std::io::Result<()> {
        for offense in &report.outstanding {
            writeln!(
                writer,
                "{}",
                self.location(format!("{}:{}", offense.file(), offense.reference.location))
            )?;
            writeln!(writer, "{}\n", offense.message)?;
        }

        if !report.stale.is_empty() {
            self.write_entries(
                writer,
                "Stale allow-list entries (run `packwall update-todo` to remove them):",
                &report.stale,
            )?;
        }

        if !report.strict.is_empty() {
            self.write_entries(
                writer,
                "Strict mode violations (strict packages may not tolerate violations):",
                &report.strict,
            )?;
        }

        if !report.warnings.is_empty() {
            writeln!(writer, "{}", self.heading("Warnings:"))?;
            for warning in &report.warnings {
                writeln!(writer, "  {}", warning)?;
            }
            writeln!(writer)?;
        }

        if report.is_interrupted() {
            writeln!(
                writer,
                "Interrupted after {}; results are partial.",
                pluralize(report.files_inspected, "file", "files")
            )?;
        } else {
            writeln!(
                writer,
                "Inspected {}.",
                pluralize(report.files_inspected, "file", "files")
            )?;
        }

        if report.todo_updated {
            writeln!(writer, "package_todo.toml files have been updated.")?;
        }

        if report.outstanding.is_empty() {
            writeln!(writer, "No offenses detected.")
        } else {
            writeln!(
                writer,
                "{} detected.",
                pluralize(report.outstanding.len(), "offense", "offenses")
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::FileError;
    use crate::model::ViolationType;
    use crate::parser::ParseError;
    use crate::run::{RunStatus, RunWarning};
    use pretty_assertions::assert_eq;

    fn empty_report() -> Report {
        Report {
            status: RunStatus::Completed,
            offenses: Vec::new(),
            outstanding: Vec::new(),
            stale: Vec::new(),
            strict: Vec::new(),
            warnings: Vec::new(),
            files_inspected: 1,
            references: Vec::new(),
            todo_updated: false,
        }
    }

    fn render(report: &Report) -> String {
        let mut out = Vec::new();
        TextOutput::new(false).format(report, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_clean_report() {
        assert_eq!(render(&empty_report()), "Inspected 1 file.\nNo offenses detected.\n");
    }

    #[test]
    fn test_stale_and_warnings_sections() {
        let mut report = empty_report();
        report.status = RunStatus::Interrupted;
        report.files_inspected = 3;
        report.stale.push(TodoEntry {
            package: "packs/billing".to_string(),
            violation_type: ViolationType::Dependency,
            symbol: "Shipping::Label".to_string(),
            file: "packs/billing/invoice.rb".to_string(),
        });
        report.warnings.push(RunWarning::File(FileError::Parse {
            file: "broken.rb".to_string(),
            source: ParseError::Syntax { line: 2, column: 1 },
        }));

        assert_eq!(
            render(&report),
            "Stale allow-list entries (run `packwall update-todo` to remove them):\n\
             \x20 packs/billing: dependency violation on ::Shipping::Label in packs/billing/invoice.rb\n\
             \n\
             Warnings:\n\
             \x20 Failed to parse broken.rb: Syntax error at 2:1\n\
             \n\
             Interrupted after 3 files; results are partial.\n\
             No offenses detected.\n"
        );
    }
}
