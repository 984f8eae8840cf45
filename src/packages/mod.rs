mod loader;

pub use loader::{PACKAGE_FILE, load_packages, parse_package};

use crate::digest::sha256_hex;
use crate::model::{Package, ROOT_PACKAGE};
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PackageError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Invalid value '{value}' for {field} in package '{package}' (expected true, false or \"strict\")")]
    InvalidEnforcement {
        package: String,
        field: &'static str,
        value: String,
    },
    #[error("Package '{0}' is declared more than once")]
    Duplicate(String),
    #[error("Invalid package path pattern: {0}")]
    Config(#[from] crate::config::ConfigError),
}

/// Problems `validate` reports without aborting a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphIssue {
    UnknownDependency { package: String, dependency: String },
    Cycle(Vec<String>),
}

impl std::fmt::Display for GraphIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GraphIssue::UnknownDependency {
                package,
                dependency,
            } => write!(
                f,
                "'{}' depends on '{}', which is not a package",
                package, dependency
            ),
            GraphIssue::Cycle(cycle) => {
                write!(f, "Dependency cycle: {}", cycle.join(" → "))
            }
        }
    }
}

/// All packages of the codebase plus their declared dependency edges.
///
/// Dependencies may name packages that do not exist; such edges are
/// kept in the package's declaration and simply have no graph edge.
pub struct PackageGraph {
    packages: BTreeMap<String, Package>,
    graph: DiGraph<String, ()>,
    node_indices: HashMap<String, NodeIndex>,
    /// Package names ordered deepest path first, for ownership lookups.
    by_depth: Vec<String>,
}

impl PackageGraph {
    /// Build the graph. A root package is added when none is supplied.
    pub fn new<I>(packages: I) -> Result<Self, PackageError>
    where
        I: IntoIterator<Item = Package>,
    {
        let mut by_name = BTreeMap::new();
        for package in packages {
            let name = package.name.clone();
            if by_name.insert(name.clone(), package).is_some() {
                return Err(PackageError::Duplicate(name));
            }
        }
        by_name
            .entry(ROOT_PACKAGE.to_string())
            .or_insert_with(Package::root);

        let mut graph = DiGraph::new();
        let mut node_indices = HashMap::new();
        for name in by_name.keys() {
            let idx = graph.add_node(name.clone());
            node_indices.insert(name.clone(), idx);
        }

        for package in by_name.values() {
            let from_idx = node_indices[&package.name];
            for dependency in &package.dependencies {
                if let Some(to_idx) = node_indices.get(dependency) {
                    graph.add_edge(from_idx, *to_idx, ());
                }
            }
        }

        let mut by_depth: Vec<String> = by_name.keys().cloned().collect();
        by_depth.sort_by(|a, b| {
            let depth = |name: &String| if name == ROOT_PACKAGE { 0 } else { name.len() };
            depth(b).cmp(&depth(a)).then(a.cmp(b))
        });

        Ok(Self {
            packages: by_name,
            graph,
            node_indices,
            by_depth,
        })
    }

    pub fn get(&self, name: &str) -> Option<&Package> {
        self.packages.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Package> {
        self.packages.values()
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    pub fn root(&self) -> &Package {
        // `new` always inserts the root package.
        &self.packages[ROOT_PACKAGE]
    }

    /// The package owning `file`: the one with the longest matching root.
    pub fn package_for_path(&self, file: &str) -> &Package {
        self.by_depth
            .iter()
            .filter_map(|name| self.packages.get(name))
            .find(|package| package.contains(file))
            .unwrap_or_else(|| self.root())
    }

    /// Dependency declarations naming packages that don't exist.
    pub fn unknown_dependencies(&self) -> Vec<GraphIssue> {
        self.packages
            .values()
            .flat_map(|package| {
                package
                    .dependencies
                    .iter()
                    .filter(|dep| !self.packages.contains_key(*dep))
                    .map(|dep| GraphIssue::UnknownDependency {
                        package: package.name.clone(),
                        dependency: dep.clone(),
                    })
            })
            .collect()
    }

    /// Strongly connected groups of more than one package, plus self-dependencies.
    pub fn dependency_cycles(&self) -> Vec<Vec<String>> {
        let mut cycles: Vec<Vec<String>> = tarjan_scc(&self.graph)
            .into_iter()
            .filter(|scc| {
                scc.len() > 1
                    || scc
                        .first()
                        .is_some_and(|idx| self.graph.contains_edge(*idx, *idx))
            })
            .map(|scc| {
                let mut names: Vec<String> =
                    scc.into_iter().map(|idx| self.graph[idx].clone()).collect();
                names.sort();
                names
            })
            .collect();
        cycles.sort();
        cycles
    }

    pub fn validate(&self) -> Vec<GraphIssue> {
        let mut issues = self.unknown_dependencies();
        issues.extend(self.dependency_cycles().into_iter().map(GraphIssue::Cycle));
        issues
    }

    /// Direct dependency edges `(package, dependency)` in name order.
    pub fn edges(&self) -> Vec<(String, String)> {
        self.packages
            .values()
            .flat_map(|p| p.dependencies.iter().map(|d| (p.name.clone(), d.clone())))
            .collect()
    }

    pub fn node_index(&self, name: &str) -> Option<NodeIndex> {
        self.node_indices.get(name).copied()
    }

    /// Stable digest of every package declaration.
    pub fn digest(&self) -> String {
        let packages: Vec<&Package> = self.packages.values().collect();
        let encoded = serde_json::to_vec(&packages).unwrap_or_default();
        sha256_hex(&encoded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn package(name: &str, deps: &[&str]) -> Package {
        let mut p = Package::new(name);
        p.enforce_dependencies = true;
        p.dependencies = deps.iter().map(|d| d.to_string()).collect();
        p
    }

    #[test]
    fn test_root_package_is_implicit() {
        let graph = PackageGraph::new(vec![package("packs/billing", &[])]).unwrap();
        assert_eq!(graph.len(), 2);
        assert!(graph.root().is_root());
        assert!(!graph.root().enforce_dependencies);
    }

    #[test]
    fn test_duplicate_names_are_rejected() {
        let err = PackageGraph::new(vec![package("a", &[]), package("a", &[])]).err();
        assert!(matches!(err, Some(PackageError::Duplicate(name)) if name == "a"));
    }

    #[test]
    fn test_package_for_path_prefers_deepest_root() {
        let graph = PackageGraph::new(vec![
            package("packs/billing", &[]),
            package("packs/billing/engines/tax", &[]),
        ])
        .unwrap();

        assert_eq!(
            graph
                .package_for_path("packs/billing/engines/tax/app/models/rate.rb")
                .name,
            "packs/billing/engines/tax"
        );
        assert_eq!(
            graph
                .package_for_path("packs/billing/app/models/invoice.rb")
                .name,
            "packs/billing"
        );
        assert_eq!(graph.package_for_path("app/models/user.rb").name, ".");
        assert_eq!(
            graph.package_for_path("packs/billing_v2/thing.rb").name,
            "."
        );
    }

    #[test]
    fn test_validate_reports_unknown_dependencies_and_cycles() {
        let graph = PackageGraph::new(vec![
            package("a", &["b"]),
            package("b", &["a", "ghost"]),
            package("c", &["c"]),
        ])
        .unwrap();

        let issues = graph.validate();
        assert!(issues.contains(&GraphIssue::UnknownDependency {
            package: "b".to_string(),
            dependency: "ghost".to_string(),
        }));
        assert!(issues.contains(&GraphIssue::Cycle(vec!["a".to_string(), "b".to_string()])));
        assert!(issues.contains(&GraphIssue::Cycle(vec!["c".to_string()])));
    }

    #[test]
    fn test_digest_changes_with_declarations() {
        let before = PackageGraph::new(vec![package("a", &[])]).unwrap();
        let after = PackageGraph::new(vec![package("a", &["b"])]).unwrap();
        assert_ne!(before.digest(), after.digest());
        assert_eq!(
            before.digest(),
            PackageGraph::new(vec![package("a", &[])]).unwrap().digest()
        );
    }
}
