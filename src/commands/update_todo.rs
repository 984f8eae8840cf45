use crate::cli::{OutputFormat, UpdateTodoArgs};
use crate::run::{InterruptFlag, RunDriver};
use crate::style;

use super::check::print_report;
use super::{CommandContext, DotProgress};

pub fn cmd_update_todo(args: UpdateTodoArgs, interrupt: InterruptFlag) -> i32 {
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

    let progress = DotProgress::new(args.quiet);
    let report = match RunDriver::new(&run_context, &files)
        .with_progress(&progress)
        .with_interrupt(interrupt)
        .update_todo()
    {
        Ok(report) => report,
        Err(e) => {
            style::error(&e.to_string());
            return 1;
        }
    };

    if let Err(e) = print_report(&report, OutputFormat::Text) {
        style::error(&format!("Failed to write output: {}", e));
        return 1;
    }

    if report.is_interrupted() {
        style::warning("Run interrupted; package_todo.toml files were not changed.");
        return 1;
    }
    if report.strict.is_empty() { 0 } else { 1 }
}
