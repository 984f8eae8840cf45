use crate::cli::{CheckArgs, OutputFormat};
use crate::output::{JsonOutput, ReportFormatter, TextOutput};
use crate::run::{InterruptFlag, Report, RunDriver};
use crate::style;
use std::io::{self, Write};

use super::{CommandContext, DotProgress};

pub fn cmd_check(args: CheckArgs, interrupt: InterruptFlag) -> i32 {
    let ctx = match CommandContext::for_run(&args.run) {
        Ok(ctx) => ctx,
        Err(code) => return code,
    };
    let files = match ctx.file_set(&args.paths) {
        Ok(files) => files,
        Err(code) => return code,
    };
    let run_context = match ctx.run_context() {
        Ok(run_context) => run_context,
        Err(code) => return code,
    };

    let progress = DotProgress::new(args.quiet || args.format == OutputFormat::Json);
    let report = match RunDriver::new(&run_context, &files)
        .with_progress(&progress)
        .with_interrupt(interrupt)
        .check()
    {
        Ok(report) => report,
        Err(e) => {
            style::error(&e.to_string());
            return 1;
        }
    };

    if let Err(e) = print_report(&report, args.format) {
        style::error(&format!("Failed to write output: {}", e));
        return 1;
    }

    // Exit code 0 = no outstanding, stale or strict-mode findings
    // Exit code 1 = something to fix, or the run was interrupted
    if report.success() { 0 } else { 1 }
}

pub(crate) fn print_report(report: &Report, format: OutputFormat) -> io::Result<()> {
    let mut buffer = Vec::new();
    match format {
        OutputFormat::Text => TextOutput::new(style::is_terminal()).format(report, &mut buffer)?,
        OutputFormat::Json => JsonOutput::new().format(report, &mut buffer)?,
    }
    io::stdout().write_all(&buffer)
}
