//! Everything a run needs to process one file, assembled once up front.

use crate::cache::{Cache, CacheKey, DiskCache};
use crate::checker::{Checker, ExportChecker, build_checkers};
use crate::config::{Config, ConfigError};
use crate::digest::{sha256_hex, sha256_parts};
use crate::files::{FileSet, FileSetError};
use crate::fs::{FileSystem, RealFs};
use crate::index::{LoadPaths, SymbolIndex};
use crate::model::{Offense, Reference};
use crate::packages::{PackageError, PackageGraph, load_packages};
use crate::parser::{ParseError, ParserRegistry};
use crate::todo::{FsTodoStore, TodoStore};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum ContextError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Package(#[from] PackageError),
    #[error(transparent)]
    Files(#[from] FileSetError),
    #[error("Failed to start worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

/// Why a single file contributed nothing.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FileError {
    #[error("Failed to read {file}: {message}")]
    Read { file: String, message: String },
    #[error("Failed to parse {file}: {source}")]
    Parse { file: String, source: ParseError },
}

impl FileError {
    pub fn file(&self) -> &str {
        match self {
            FileError::Read { file, .. } | FileError::Parse { file, .. } => file,
        }
    }
}

/// Result of processing one file.
#[derive(Debug, Clone, Default)]
pub struct FileOutcome {
    pub offenses: Vec<Offense>,
    /// Filled only when the context collects references.
    pub references: Vec<Reference>,
}

pub struct RunContext {
    root: PathBuf,
    packages: PackageGraph,
    fs: Arc<dyn FileSystem>,
    registry: ParserRegistry,
    index: SymbolIndex,
    checkers: Vec<Box<dyn Checker>>,
    cache: Option<Box<dyn Cache>>,
    todo_store: Box<dyn TodoStore>,
    collect_references: bool,
    parallel: bool,
    jobs: usize,
    /// Bounds every parallel step of the run, indexing included.
    pool: rayon::ThreadPool,
    config_digest: String,
}

impl RunContext {
    pub fn builder(root: impl Into<PathBuf>, config: Config) -> RunContextBuilder {
        RunContextBuilder::new(root, config)
    }

    /// Load packages from disk and index the whole codebase.
    pub fn from_configuration(root: &Path, config: &Config) -> Result<Self, ContextError> {
        Self::builder(root, config.clone()).build()
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn packages(&self) -> &PackageGraph {
        &self.packages
    }

    pub fn index(&self) -> &SymbolIndex {
        &self.index
    }

    pub fn todo_store(&self) -> &dyn TodoStore {
        self.todo_store.as_ref()
    }

    pub fn parallel(&self) -> bool {
        self.parallel
    }

    pub fn jobs(&self) -> usize {
        self.jobs
    }

    pub fn pool(&self) -> &rayon::ThreadPool {
        &self.pool
    }

    pub fn config_digest(&self) -> &str {
        &self.config_digest
    }

    /// Offenses in `file`, from the cache when its contents are unchanged.
    pub fn process_file(&self, file: &str) -> Result<FileOutcome, FileError> {
        let source = self.read(file)?;

        if self.collect_references {
            let references = self.resolve(file, &source)?;
            let offenses = self.check(&references);
            return Ok(FileOutcome {
                offenses,
                references,
            });
        }

        let content_digest = sha256_hex(source.as_bytes());
        let key = CacheKey {
            file,
            content_digest: &content_digest,
            config_digest: &self.config_digest,
        };

        if let Some(cache) = &self.cache {
            match cache.get(&key) {
                Ok(Some(offenses)) => {
                    debug!(file = %file, "cache hit");
                    return Ok(FileOutcome {
                        offenses,
                        references: Vec::new(),
                    });
                }
                Ok(None) => debug!(file = %file, "cache miss"),
                Err(e) => warn!(file = %file, error = %e, "cache read failed"),
            }
        }

        let references = self.resolve(file, &source)?;
        let offenses = self.check(&references);

        if let Some(cache) = &self.cache {
            if let Err(e) = cache.put(&key, &offenses) {
                warn!(file = %file, error = %e, "cache write failed");
            }
        }

        Ok(FileOutcome {
            offenses,
            references: Vec::new(),
        })
    }

    /// Every constant usage in `file`, resolved where the index knows the name.
    pub fn references(&self, file: &str) -> Result<Vec<Reference>, FileError> {
        let source = self.read(file)?;
        self.resolve(file, &source)
    }

    fn read(&self, file: &str) -> Result<String, FileError> {
        self.fs
            .read_to_string(&self.root.join(file))
            .map_err(|e| FileError::Read {
                file: file.to_string(),
                message: e.to_string(),
            })
    }

    fn resolve(&self, file: &str, source: &str) -> Result<Vec<Reference>, FileError> {
        let usages = self
            .registry
            .extract(file, source)
            .map_err(|source| FileError::Parse {
                file: file.to_string(),
                source,
            })?;
        let package = &self.packages.package_for_path(file).name;

        Ok(usages
            .into_iter()
            .map(|usage| Reference {
                file: file.to_string(),
                package: package.clone(),
                symbol: self
                    .index
                    .resolve(&usage.name, &usage.nesting)
                    .map(|symbol| symbol.resolved()),
                written_name: usage.name,
                location: usage.location,
            })
            .collect())
    }

    /// Run every checker over resolved references. References arrive in
    /// document order, so the first offense kept for a key is the earliest.
    fn check(&self, references: &[Reference]) -> Vec<Offense> {
        let mut seen = HashSet::new();
        let mut offenses = Vec::new();
        for reference in references.iter().filter(|r| r.is_resolved()) {
            for checker in &self.checkers {
                if let Some(violation) = checker.evaluate(reference, &self.packages) {
                    let offense = Offense::new(reference.clone(), violation);
                    if seen.insert(offense.key()) {
                        offenses.push(offense);
                    }
                }
            }
        }
        offenses
    }
}

pub struct RunContextBuilder {
    root: PathBuf,
    config: Config,
    fs: Option<Arc<dyn FileSystem>>,
    packages: Option<PackageGraph>,
    index_files: Option<FileSet>,
    cache: Option<Option<Box<dyn Cache>>>,
    todo_store: Option<Box<dyn TodoStore>>,
    export: bool,
}

impl RunContextBuilder {
    pub fn new(root: impl Into<PathBuf>, config: Config) -> Self {
        Self {
            root: root.into(),
            config,
            fs: None,
            packages: None,
            index_files: None,
            cache: None,
            todo_store: None,
            export: false,
        }
    }

    pub fn fs(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.fs = Some(fs);
        self
    }

    /// Use `packages` instead of loading `package.toml` files.
    pub fn packages(mut self, packages: PackageGraph) -> Self {
        self.packages = Some(packages);
        self
    }

    /// Index these files instead of discovering them under the root.
    pub fn index_files(mut self, files: FileSet) -> Self {
        self.index_files = Some(files);
        self
    }

    /// Override the cache; `None` disables caching.
    pub fn cache(mut self, cache: Option<Box<dyn Cache>>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn todo_store(mut self, store: Box<dyn TodoStore>) -> Self {
        self.todo_store = Some(store);
        self
    }

    /// Collect references instead of checking them: no rule reports and
    /// nothing is cached.
    pub fn export(mut self) -> Self {
        self.export = true;
        self
    }

    pub fn build(self) -> Result<RunContext, ContextError> {
        let config = self.config;
        let root = self.root;
        let fs: Arc<dyn FileSystem> = self.fs.unwrap_or_else(|| Arc::new(RealFs::new()));

        let packages = match self.packages {
            Some(packages) => packages,
            None => load_packages(&root, &config)?,
        };
        let index_files = match self.index_files {
            Some(files) => files,
            None => FileSet::discover(&root, &config)?,
        };

        let load_paths = LoadPaths::from_config(&config);
        let registry =
            ParserRegistry::configured(&config.custom_associations, load_paths.inflector().clone());
        // A serial run stays on one worker throughout.
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(if config.parallel { config.jobs } else { 1 })
            .build()?;
        let index = pool.install(|| {
            SymbolIndex::build(
                &root,
                &index_files,
                &packages,
                &registry,
                &load_paths,
                fs.as_ref(),
            )
        });

        let checkers: Vec<Box<dyn Checker>> = if self.export {
            vec![Box::new(ExportChecker)]
        } else {
            build_checkers(&config.checkers)
        };

        let cache = if self.export {
            None
        } else {
            match self.cache {
                Some(cache) => cache,
                None if config.cache => Some(Box::new(DiskCache::new(
                    config.cache_directory_in(&root),
                    fs.clone(),
                )) as Box<dyn Cache>),
                None => None,
            }
        };

        let todo_store = self
            .todo_store
            .unwrap_or_else(|| Box::new(FsTodoStore::new(root.clone(), fs.clone())));

        let checker_names: Vec<&str> = checkers.iter().map(|c| c.name()).collect();
        let config_digest = sha256_parts([
            checker_names.join(","),
            packages.digest(),
            config.custom_associations.join(","),
            config.acronyms.join(","),
            index.fingerprint(),
        ]);

        debug!(
            packages = packages.len(),
            symbols = index.len(),
            checkers = %checker_names.join(","),
            "run context ready"
        );

        Ok(RunContext {
            root,
            packages,
            fs,
            registry,
            index,
            checkers,
            cache,
            todo_store,
            collect_references: self.export,
            parallel: config.parallel,
            jobs: config.jobs,
            pool,
            config_digest,
        })
    }
}
