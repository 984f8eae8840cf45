use crate::cli::{DumpArgs, DumpKind};
use crate::fs::{FileSystem, RealFs, default_fs};
use crate::output::JsonReference;
use crate::packages::{PackageGraph, load_packages};
use crate::run::{InterruptFlag, RunDriver};
use crate::style;
use crate::todo::{FsTodoStore, TodoStore};
use serde::Serialize;
use std::sync::Arc;

use super::CommandContext;

#[derive(Serialize)]
struct Edge<'a> {
    package: &'a str,
    dependency: &'a str,
}

pub fn cmd_dump(args: DumpArgs, interrupt: InterruptFlag) -> i32 {
    let ctx = match CommandContext::for_run(&args.run) {
        Ok(ctx) => ctx,
        Err(code) => return code,
    };

    let json = match args.what {
        DumpKind::References => dump_references(&ctx, &args, interrupt),
        DumpKind::Files => ctx
            .file_set(&args.paths)
            .and_then(|files| to_json(files.as_slice())),
        DumpKind::Packages => load(&ctx).and_then(|packages| {
            let edges = packages.edges();
            let edges: Vec<Edge<'_>> = edges
                .iter()
                .map(|(package, dependency)| Edge {
                    package,
                    dependency,
                })
                .collect();
            to_json(&edges)
        }),
        DumpKind::Todos => load(&ctx).and_then(|packages| {
            let store = FsTodoStore::new(ctx.root.clone(), Arc::new(RealFs::new()));
            match store.load_all(&packages) {
                Ok(allow_list) => to_json(&allow_list.entries()),
                Err(e) => {
                    style::error(&e.to_string());
                    Err(1)
                }
            }
        }),
    };

    let json = match json {
        Ok(json) => json,
        Err(code) => return code,
    };

    match &args.output {
        Some(path) => {
            if let Err(e) = default_fs().write(path, &json) {
                style::error(&format!("Could not write output file: {}", e));
                return 1;
            }
            style::success(&format!("Exported to {}", style::path(path)));
        }
        None => println!("{}", json),
    }
    0
}

fn dump_references(
    ctx: &CommandContext,
    args: &DumpArgs,
    interrupt: InterruptFlag,
) -> Result<String, i32> {
    let files = ctx.file_set(&args.paths)?;
    let run_context = ctx.export_context()?;

    let report = RunDriver::new(&run_context, &files)
        .with_interrupt(interrupt)
        .dump_references()
        .map_err(|e| {
            style::error(&e.to_string());
            1
        })?;

    for warning in &report.warnings {
        style::warning(&warning.to_string());
    }
    if report.is_interrupted() {
        style::warning("Run interrupted; the export is partial.");
    }

    let references: Vec<JsonReference<'_>> =
        report.references.iter().map(JsonReference::from).collect();
    to_json(&references)
}

fn load(ctx: &CommandContext) -> Result<PackageGraph, i32> {
    load_packages(&ctx.root, &ctx.config).map_err(|e| {
        style::error(&e.to_string());
        1
    })
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, i32> {
    serde_json::to_string_pretty(value).map_err(|e| {
        style::error(&format!("Failed to encode output: {}", e));
        1
    })
}
