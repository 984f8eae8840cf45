mod check;
mod dump;
mod init;
mod progress;
mod update_todo;
mod validate;

pub use check::cmd_check;
pub use dump::cmd_dump;
pub use init::{cmd_init, cmd_init_with_fs};
pub use progress::DotProgress;
pub use update_todo::cmd_update_todo;
pub use validate::cmd_validate;

use crate::cli::RunArgs;
use crate::config::Config;
use crate::context::RunContext;
use crate::files::FileSet;
use crate::style;
use std::path::{Path, PathBuf};

/// Shared context for command execution, reducing boilerplate across commands.
pub struct CommandContext {
    pub root: PathBuf,
    pub config: Config,
}

impl CommandContext {
    /// Resolve the root and load its configuration.
    /// Returns Err(exit_code) if setup fails.
    pub fn new(root: &Path) -> Result<Self, i32> {
        let root = match root.canonicalize() {
            Ok(p) => p,
            Err(_) => {
                style::error(&format!("Could not resolve path: {}", style::path(root)));
                return Err(1);
            }
        };

        let config = match Config::load(&root) {
            Ok(config) => config,
            Err(e) => {
                style::error(&format!("Failed to load config: {}", e));
                return Err(1);
            }
        };

        Ok(Self { root, config })
    }

    /// Like [`CommandContext::new`], with command-line overrides applied.
    pub fn for_run(args: &RunArgs) -> Result<Self, i32> {
        let mut ctx = Self::new(&args.root)?;
        if args.serial {
            ctx.config.parallel = false;
        }
        if let Some(jobs) = args.jobs {
            ctx.config.jobs = jobs;
        }
        if args.no_cache {
            ctx.config.cache = false;
        }
        Ok(ctx)
    }

    pub fn file_set(&self, paths: &[PathBuf]) -> Result<FileSet, i32> {
        FileSet::from_paths(&self.root, &self.config, paths).map_err(|e| {
            style::error(&e.to_string());
            1
        })
    }

    pub fn run_context(&self) -> Result<RunContext, i32> {
        self.build(false)
    }

    pub fn export_context(&self) -> Result<RunContext, i32> {
        self.build(true)
    }

    fn build(&self, export: bool) -> Result<RunContext, i32> {
        let builder = RunContext::builder(&self.root, self.config.clone());
        let builder = if export { builder.export() } else { builder };
        builder.build().map_err(|e| {
            style::error(&e.to_string());
            1
        })
    }
}
