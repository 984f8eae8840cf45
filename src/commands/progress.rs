use crate::output::pluralize;
use crate::run::{ProgressEvent, ProgressReporter};
use crate::style;
use colored::Colorize;
use std::io::Write;

/// Prints a dot per inspected file and an `E` per failed one to stderr.
pub struct DotProgress {
    quiet: bool,
}

impl DotProgress {
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }
}

impl ProgressReporter for DotProgress {
    fn report(&self, event: ProgressEvent<'_>) {
        if self.quiet {
            return;
        }
        let mut stderr = std::io::stderr().lock();
        let _ = match event {
            ProgressEvent::Started { total } => writeln!(
                stderr,
                "Inspecting {}",
                pluralize(total, "file", "files")
            ),
            ProgressEvent::Inspected { .. } => write!(stderr, "{}", style::file_marker(false)),
            ProgressEvent::Failed { .. } => write!(stderr, "{}", style::file_marker(true)),
            ProgressEvent::Interrupted => write!(stderr, "\n{}", "Interrupted".yellow().bold()),
            ProgressEvent::Finished { .. } => writeln!(stderr, "\n"),
        };
        let _ = stderr.flush();
    }
}
