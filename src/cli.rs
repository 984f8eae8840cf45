use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "packwall")]
#[command(about = "Enforce package boundaries in a Ruby codebase")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Log engine activity to stderr (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Check files for dependency and privacy violations
    Check(CheckArgs),

    /// Rewrite every package_todo.toml from the current violations
    UpdateTodo(UpdateTodoArgs),

    /// Report undeclared dependencies and dependency cycles
    Validate(ValidateArgs),

    /// Export references, files, packages or allow-list entries as JSON
    Dump(DumpArgs),

    /// Generate a starter packwall.toml configuration file
    Init(InitArgs),
}

/// Options shared by every command that runs over source files.
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Project root (defaults to current directory)
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    /// Inspect files one at a time instead of on a worker pool
    #[arg(long)]
    pub serial: bool,

    /// Worker count for parallel runs
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Ignore and don't write the offense cache
    #[arg(long)]
    pub no_cache: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct CheckArgs {
    /// Files or directories to check (defaults to the whole codebase)
    pub paths: Vec<PathBuf>,

    #[command(flatten)]
    pub run: RunArgs,

    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,

    /// Hide the progress dots
    #[arg(long)]
    pub quiet: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct UpdateTodoArgs {
    /// Must be empty; the allow-list always covers the whole codebase
    pub paths: Vec<PathBuf>,

    #[command(flatten)]
    pub run: RunArgs,

    /// Hide the progress dots
    #[arg(long)]
    pub quiet: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct ValidateArgs {
    /// Project root (defaults to current directory)
    #[arg(long, default_value = ".")]
    pub root: PathBuf,
}

#[derive(Parser, Debug, Clone)]
pub struct DumpArgs {
    /// What to export
    pub what: DumpKind,

    /// Files or directories to include (references and files only)
    pub paths: Vec<PathBuf>,

    #[command(flatten)]
    pub run: RunArgs,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Parser, Debug, Clone)]
pub struct InitArgs {
    /// Path where to create packwall.toml (defaults to current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum DumpKind {
    /// Every resolved cross-package reference
    References,
    /// The files a check would inspect
    Files,
    /// Declared dependency edges
    Packages,
    /// Entries of every package_todo.toml
    Todos,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_check_with_paths() {
        let cli = Cli::parse_from([
            "packwall",
            "check",
            "packs/billing",
            "--serial",
            "--format",
            "json",
        ]);
        match cli.command {
            Command::Check(args) => {
                assert_eq!(args.paths, vec![PathBuf::from("packs/billing")]);
                assert!(args.run.serial);
                assert_eq!(args.format, OutputFormat::Json);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_dump() {
        let cli = Cli::parse_from(["packwall", "-v", "dump", "references", "--no-cache"]);
        assert!(cli.verbose);
        assert!(matches!(
            cli.command,
            Command::Dump(DumpArgs {
                what: DumpKind::References,
                ..
            })
        ));
    }
}
