//! Index of every constant defined in the codebase.
//!
//! Built once per run from the full file set and shared read-only by the
//! workers afterwards.

mod load_paths;

pub use load_paths::LoadPaths;

use crate::digest::sha256_parts;
use crate::files::FileSet;
use crate::fs::FileSystem;
use crate::model::{Symbol, SymbolKind};
use crate::packages::PackageGraph;
use crate::parser::{ParsedFile, ParserRegistry};
use rayon::prelude::*;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use tracing::{debug, warn};

/// The same constant declared by two different packages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolConflict {
    pub name: String,
    pub kept_package: String,
    pub kept_file: String,
    pub ignored_package: String,
    pub ignored_file: String,
}

impl fmt::Display for SymbolConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "'{}' is defined in both '{}' ({}) and '{}' ({}); using '{}'",
            self.name,
            self.kept_package,
            self.kept_file,
            self.ignored_package,
            self.ignored_file,
            self.kept_package
        )
    }
}

#[derive(Debug, Default)]
pub struct SymbolIndex {
    symbols: HashMap<String, Symbol>,
    conflicts: Vec<SymbolConflict>,
}

impl SymbolIndex {
    /// Parse `files` in parallel and index their definitions.
    ///
    /// Definitions are merged in file order, so the first file to define a
    /// name owns it no matter how the parse work was scheduled.
    pub fn build(
        root: &Path,
        files: &FileSet,
        packages: &PackageGraph,
        registry: &ParserRegistry,
        load_paths: &LoadPaths,
        fs: &dyn FileSystem,
    ) -> Self {
        let parsed: Vec<(String, Option<ParsedFile>)> = files
            .as_slice()
            .par_iter()
            .map(|file| {
                let parsed = fs
                    .read_to_string(&root.join(file))
                    .map_err(|e| e.to_string())
                    .and_then(|source| registry.parse(file, &source).map_err(|e| e.to_string()));
                match parsed {
                    Ok(parsed) => (file.clone(), Some(parsed)),
                    Err(e) => {
                        debug!(file = %file, error = %e, "indexing from path only");
                        (file.clone(), None)
                    }
                }
            })
            .collect();

        let mut index = Self::default();
        for (file, parsed) in parsed {
            let package = packages.package_for_path(&file).name.clone();
            for symbol in file_symbols(&file, &package, parsed.as_ref(), packages, load_paths) {
                index.insert(symbol);
            }
        }

        debug!(
            symbols = index.len(),
            conflicts = index.conflicts.len(),
            "symbol index built"
        );
        index
    }

    /// Index prepared symbols in order; first definition wins.
    pub fn from_symbols<I>(symbols: I) -> Self
    where
        I: IntoIterator<Item = Symbol>,
    {
        let mut index = Self::default();
        for symbol in symbols {
            index.insert(symbol);
        }
        index
    }

    fn insert(&mut self, symbol: Symbol) {
        match self.symbols.get(&symbol.name) {
            None => {
                self.symbols.insert(symbol.name.clone(), symbol);
            }
            Some(existing) if existing.package != symbol.package => {
                warn!(
                    symbol = %symbol.name,
                    kept = %existing.package,
                    ignored = %symbol.package,
                    "constant defined in more than one package"
                );
                self.conflicts.push(SymbolConflict {
                    name: symbol.name.clone(),
                    kept_package: existing.package.clone(),
                    kept_file: existing.file.clone(),
                    ignored_package: symbol.package,
                    ignored_file: symbol.file,
                });
            }
            // Reopened in another file of the same package.
            Some(_) => {}
        }
    }

    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(name.trim_start_matches("::"))
    }

    /// Resolve `name` as written inside `nesting` (outermost scope first).
    ///
    /// Each enclosing scope is tried from the innermost outwards, then the
    /// top level. A leading `::` skips the lexical scopes.
    pub fn resolve(&self, name: &str, nesting: &[String]) -> Option<&Symbol> {
        candidate_names(name, nesting)
            .into_iter()
            .find_map(|candidate| self.symbols.get(&candidate))
    }

    pub fn conflicts(&self) -> &[SymbolConflict] {
        &self.conflicts
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Symbols sorted by name.
    pub fn symbols(&self) -> Vec<&Symbol> {
        let mut symbols: Vec<&Symbol> = self.symbols.values().collect();
        symbols.sort_by(|a, b| a.name.cmp(&b.name));
        symbols
    }

    /// Digest of which file and package own each name. Any change here can
    /// change the outcome of a check for files whose contents did not change.
    pub fn fingerprint(&self) -> String {
        let symbols = self.symbols();
        sha256_parts(
            symbols
                .iter()
                .flat_map(|s| [s.name.as_bytes(), s.package.as_bytes(), s.file.as_bytes()]),
        )
    }
}

/// Fully qualified names `name` may refer to inside `nesting`, in lookup order.
pub fn candidate_names(name: &str, nesting: &[String]) -> Vec<String> {
    if let Some(absolute) = name.strip_prefix("::") {
        return vec![absolute.to_string()];
    }
    nesting
        .iter()
        .rev()
        .map(|scope| format!("{}::{}", scope, name))
        .chain(std::iter::once(name.to_string()))
        .collect()
}

fn file_symbols(
    file: &str,
    package: &str,
    parsed: Option<&ParsedFile>,
    packages: &PackageGraph,
    load_paths: &LoadPaths,
) -> Vec<Symbol> {
    let conventional = load_paths.conventional_name(file, packages);
    let symbol = |name: &str, kind: SymbolKind, line: usize| Symbol {
        name: name.to_string(),
        kind,
        package: package.to_string(),
        file: file.to_string(),
        line,
    };

    let mut symbols: Vec<Symbol> = parsed
        .map(|parsed| {
            parsed
                .definitions
                .iter()
                .filter(|d| {
                    let is_conventional = conventional.as_deref() == Some(d.name.as_str());
                    let wraps_conventional = conventional
                        .as_deref()
                        .is_some_and(|c| c.starts_with(&format!("{}::", d.name)));
                    is_conventional || !(d.namespace_only || wraps_conventional)
                })
                .map(|d| symbol(&d.name, d.kind, d.line))
                .collect()
        })
        .unwrap_or_default();

    if symbols.is_empty() {
        if let Some(name) = conventional {
            symbols.push(symbol(&name, SymbolKind::Conventional, 1));
        }
    }
    symbols
}
