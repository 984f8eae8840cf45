//! Library API for packwall.
//!
//! Unlike the CLI commands which print output and return exit codes, these
//! functions return proper Result types that can be handled by calling code.
//!
//! # Example
//!
//! ```no_run
//! use packwall::{check, CheckOptions};
//! use std::path::Path;
//!
//! let report = check(Path::new("."), CheckOptions::default())?;
//! for offense in &report.outstanding {
//!     println!("{}", offense);
//! }
//! # Ok::<(), packwall::PackwallError>(())
//! ```

use crate::config::{Config, ConfigError};
use crate::context::{ContextError, RunContext};
use crate::files::{FileSet, FileSetError};
use crate::model::Reference;
use crate::packages::{GraphIssue, PackageError, load_packages};
use crate::run::{InterruptFlag, Report, RunDriver, RunError};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during packwall operations.
#[derive(Debug, Error)]
pub enum PackwallError {
    /// The specified path could not be found or resolved.
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// Configuration file error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Package error: {0}")]
    Package(#[from] PackageError),

    #[error(transparent)]
    Files(#[from] FileSetError),

    #[error(transparent)]
    Context(#[from] ContextError),

    #[error(transparent)]
    Run(#[from] RunError),
}

/// Options for [`check`], [`update_todo`] and [`references`].
#[derive(Debug, Clone, Default)]
pub struct CheckOptions {
    /// Files or directories to inspect, relative to the root. Empty means everything.
    pub paths: Vec<PathBuf>,

    /// Override the configured `parallel` setting.
    pub parallel: Option<bool>,

    /// Override the configured `cache` setting.
    pub cache: Option<bool>,

    /// Cancels the run when set from another thread.
    pub interrupt: Option<InterruptFlag>,
}

struct Prepared {
    context: RunContext,
    files: FileSet,
    interrupt: InterruptFlag,
}

fn prepare(root: &Path, options: CheckOptions, export: bool) -> Result<Prepared, PackwallError> {
    let root = root
        .canonicalize()
        .map_err(|_| PackwallError::PathNotFound(root.to_path_buf()))?;

    let mut config = Config::load(&root)?;
    if let Some(parallel) = options.parallel {
        config.parallel = parallel;
    }
    if let Some(cache) = options.cache {
        config.cache = cache;
    }

    let files = FileSet::from_paths(&root, &config, &options.paths)?;
    let builder = RunContext::builder(&root, config);
    let context = if export {
        builder.export().build()?
    } else {
        builder.build()?
    };

    Ok(Prepared {
        context,
        files,
        interrupt: options.interrupt.unwrap_or_default(),
    })
}

/// Check the codebase at `root` against its stored allow-lists.
pub fn check(root: &Path, options: CheckOptions) -> Result<Report, PackwallError> {
    let prepared = prepare(root, options, false)?;
    let report = RunDriver::new(&prepared.context, &prepared.files)
        .with_interrupt(prepared.interrupt)
        .check()?;
    Ok(report)
}

/// Rewrite every package's allow-list. Fails when `options.paths` is not empty.
pub fn update_todo(root: &Path, options: CheckOptions) -> Result<Report, PackwallError> {
    let prepared = prepare(root, options, false)?;
    let report = RunDriver::new(&prepared.context, &prepared.files)
        .with_interrupt(prepared.interrupt)
        .update_todo()?;
    Ok(report)
}

/// Every resolved reference that crosses a package boundary.
pub fn references(root: &Path, options: CheckOptions) -> Result<Vec<Reference>, PackwallError> {
    let prepared = prepare(root, options, true)?;
    let report = RunDriver::new(&prepared.context, &prepared.files)
        .with_interrupt(prepared.interrupt)
        .dump_references()?;
    Ok(report.references)
}

/// Problems with the package declarations themselves.
pub fn validate(root: &Path) -> Result<Vec<GraphIssue>, PackwallError> {
    let root = root
        .canonicalize()
        .map_err(|_| PackwallError::PathNotFound(root.to_path_buf()))?;
    let config = Config::load(&root)?;
    Ok(load_packages(&root, &config)?.validate())
}
