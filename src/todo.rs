//! Tolerated violations ("todo" entries) per package.

use crate::fs::FileSystem;
use crate::model::{OffenseKey, Package, ViolationType};
use crate::packages::PackageGraph;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

pub const TODO_FILE: &str = "package_todo.toml";

#[derive(Debug, Error)]
pub enum TodoError {
    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Failed to encode todo list for '{package}': {source}")]
    Encode {
        package: String,
        source: toml::ser::Error,
    },
    #[error("Unknown violation type '{value}' in {path}")]
    UnknownViolationType { path: PathBuf, value: String },
}

/// One tolerated violation, flattened.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct TodoEntry {
    pub package: String,
    pub violation_type: ViolationType,
    pub symbol: String,
    pub file: String,
}

impl TodoEntry {
    pub fn key(&self) -> OffenseKey {
        OffenseKey {
            package: self.package.clone(),
            violation_type: self.violation_type,
            symbol: self.symbol.clone(),
            file: self.file.clone(),
        }
    }
}

/// violation type -> symbol -> files, all sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageTodo {
    entries: BTreeMap<ViolationType, BTreeMap<String, BTreeSet<String>>>,
}

impl PackageTodo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false when the entry was already present.
    pub fn add(&mut self, violation_type: ViolationType, symbol: &str, file: &str) -> bool {
        self.entries
            .entry(violation_type)
            .or_default()
            .entry(symbol.to_string())
            .or_default()
            .insert(file.to_string())
    }

    pub fn contains(&self, violation_type: ViolationType, symbol: &str, file: &str) -> bool {
        self.entries
            .get(&violation_type)
            .and_then(|symbols| symbols.get(symbol))
            .is_some_and(|files| files.contains(file))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.values().all(|symbols| symbols.values().all(BTreeSet::is_empty))
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// `(violation type, symbol, file)` in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = (ViolationType, &str, &str)> {
        self.entries.iter().flat_map(|(violation_type, symbols)| {
            symbols.iter().flat_map(move |(symbol, files)| {
                files
                    .iter()
                    .map(move |file| (*violation_type, symbol.as_str(), file.as_str()))
            })
        })
    }

    fn parse(content: &str, path: &Path) -> Result<Self, TodoError> {
        let raw: BTreeMap<String, BTreeMap<String, Vec<String>>> =
            toml::from_str(content).map_err(|source| TodoError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        let mut todo = Self::new();
        for (type_name, symbols) in raw {
            let violation_type: ViolationType =
                type_name
                    .parse()
                    .map_err(|_| TodoError::UnknownViolationType {
                        path: path.to_path_buf(),
                        value: type_name.clone(),
                    })?;
            for (symbol, files) in symbols {
                for file in files {
                    todo.add(violation_type, &symbol, &file);
                }
            }
        }
        Ok(todo)
    }

    fn render(&self, package: &str) -> Result<String, TodoError> {
        let raw: BTreeMap<&str, BTreeMap<&str, Vec<&str>>> = self
            .entries
            .iter()
            .filter(|(_, symbols)| !symbols.is_empty())
            .map(|(violation_type, symbols)| {
                let symbols: BTreeMap<&str, Vec<&str>> = symbols
                    .iter()
                    .map(|(symbol, files)| {
                        (symbol.as_str(), files.iter().map(String::as_str).collect())
                    })
                    .collect();
                (violation_type.as_str(), symbols)
            })
            .collect();

        let body = toml::to_string(&raw).map_err(|source| TodoError::Encode {
            package: package.to_string(),
            source,
        })?;
        Ok(format!(
            "# Violations tolerated in '{}' until they are fixed.\n\
             # Regenerate with `packwall update-todo`; do not edit by hand.\n\n{}",
            package, body
        ))
    }
}

/// The tolerated violations of every package.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowList {
    packages: BTreeMap<String, PackageTodo>,
}

impl AllowList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, package: impl Into<String>, todo: PackageTodo) {
        self.packages.insert(package.into(), todo);
    }

    pub fn add(&mut self, key: &OffenseKey) -> bool {
        self.packages
            .entry(key.package.clone())
            .or_default()
            .add(key.violation_type, &key.symbol, &key.file)
    }

    pub fn contains(&self, key: &OffenseKey) -> bool {
        self.packages
            .get(&key.package)
            .is_some_and(|todo| todo.contains(key.violation_type, &key.symbol, &key.file))
    }

    pub fn get(&self, package: &str) -> Option<&PackageTodo> {
        self.packages.get(package)
    }

    pub fn packages(&self) -> impl Iterator<Item = (&str, &PackageTodo)> {
        self.packages.iter().map(|(name, todo)| (name.as_str(), todo))
    }

    pub fn is_empty(&self) -> bool {
        self.packages.values().all(PackageTodo::is_empty)
    }

    pub fn entries(&self) -> Vec<TodoEntry> {
        self.packages
            .iter()
            .flat_map(|(package, todo)| {
                todo.iter().map(move |(violation_type, symbol, file)| TodoEntry {
                    package: package.clone(),
                    violation_type,
                    symbol: symbol.to_string(),
                    file: file.to_string(),
                })
            })
            .collect()
    }
}

/// Where allow-lists live between runs.
pub trait TodoStore: Send + Sync {
    fn load(&self, package: &Package) -> Result<PackageTodo, TodoError>;

    /// Replace the stored list; an empty list removes it.
    fn save(&self, package: &Package, todo: &PackageTodo) -> Result<(), TodoError>;

    fn load_all(&self, packages: &PackageGraph) -> Result<AllowList, TodoError> {
        let mut allow_list = AllowList::new();
        for package in packages.iter() {
            let todo = self.load(package)?;
            if !todo.is_empty() {
                allow_list.insert(package.name.clone(), todo);
            }
        }
        Ok(allow_list)
    }
}

/// `package_todo.toml` next to each package's `package.toml`.
pub struct FsTodoStore {
    root: PathBuf,
    fs: Arc<dyn FileSystem>,
}

impl FsTodoStore {
    pub fn new(root: impl Into<PathBuf>, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            root: root.into(),
            fs,
        }
    }

    pub fn path_for(&self, package: &Package) -> PathBuf {
        self.root
            .join(format!("{}{}", package.path_prefix(), TODO_FILE))
    }
}

impl TodoStore for FsTodoStore {
    fn load(&self, package: &Package) -> Result<PackageTodo, TodoError> {
        let path = self.path_for(package);
        if !self.fs.exists(&path) {
            return Ok(PackageTodo::new());
        }
        let content = self
            .fs
            .read_to_string(&path)
            .map_err(|source| TodoError::Io {
                path: path.clone(),
                source,
            })?;
        PackageTodo::parse(&content, &path)
    }

    fn save(&self, package: &Package, todo: &PackageTodo) -> Result<(), TodoError> {
        let path = self.path_for(package);
        let result = if todo.is_empty() {
            self.fs.remove_file(&path)
        } else {
            let content = todo.render(&package.name)?;
            self.fs.write(&path, &content)
        };
        result.map_err(|source| TodoError::Io { path, source })
    }
}
