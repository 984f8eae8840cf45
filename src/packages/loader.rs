use super::{PackageError, PackageGraph};
use crate::config::{Config, compile_pattern};
use crate::model::{Package, ROOT_PACKAGE};
use ignore::WalkBuilder;
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

pub const PACKAGE_FILE: &str = "package.toml";

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawPackage {
    dependencies: Vec<String>,
    enforce_dependencies: Option<Enforcement>,
    enforce_privacy: Option<Enforcement>,
    strict: Option<bool>,
    public_path: Option<String>,
    private_constants: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Enforcement {
    Flag(bool),
    Mode(String),
}

impl Enforcement {
    /// Returns `(enforced, strict)`.
    fn resolve(&self, package: &str, field: &'static str) -> Result<(bool, bool), PackageError> {
        match self {
            Enforcement::Flag(flag) => Ok((*flag, false)),
            Enforcement::Mode(mode) if mode == "strict" => Ok((true, true)),
            Enforcement::Mode(other) => Err(PackageError::InvalidEnforcement {
                package: package.to_string(),
                field,
                value: other.clone(),
            }),
        }
    }
}

/// Parse the contents of one `package.toml` for the package named `name`.
pub fn parse_package(name: &str, content: &str, path: &Path) -> Result<Package, PackageError> {
    let raw: RawPackage = toml::from_str(content).map_err(|source| PackageError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    let (enforce_dependencies, strict_dependencies) = match &raw.enforce_dependencies {
        Some(e) => e.resolve(name, "enforce_dependencies")?,
        None => (false, false),
    };
    let (enforce_privacy, strict_privacy) = match &raw.enforce_privacy {
        Some(e) => e.resolve(name, "enforce_privacy")?,
        None => (false, false),
    };

    let mut package = Package::new(name);
    package.dependencies = raw.dependencies.into_iter().collect();
    package.enforce_dependencies = enforce_dependencies;
    package.enforce_privacy = enforce_privacy;
    package.strict = raw.strict.unwrap_or(strict_dependencies || strict_privacy);
    if let Some(public_path) = raw.public_path {
        package.public_path = public_path;
    }
    package.private_constants = raw.private_constants;
    Ok(package)
}

/// Discover every `package.toml` below `root` and build the package graph.
pub fn load_packages(root: &Path, config: &Config) -> Result<PackageGraph, PackageError> {
    let package_patterns = config
        .package_paths
        .iter()
        .map(|p| compile_pattern(p))
        .collect::<Result<Vec<_>, _>>()?;
    let exclude_patterns = config
        .exclude
        .iter()
        .map(|p| compile_pattern(p))
        .collect::<Result<Vec<_>, _>>()?;

    let walker = WalkBuilder::new(root).hidden(true).git_ignore(true).build();
    let mut packages = Vec::new();

    for entry in walker.flatten() {
        let file_path = entry.path();
        if !file_path.is_file() || file_path.file_name().and_then(|n| n.to_str()) != Some(PACKAGE_FILE) {
            continue;
        }

        let dir = file_path
            .parent()
            .and_then(|d| d.strip_prefix(root).ok())
            .map(crate::files::to_slash)
            .unwrap_or_default();
        let name = if dir.is_empty() {
            ROOT_PACKAGE.to_string()
        } else {
            dir
        };

        if name != ROOT_PACKAGE {
            let candidate = format!("{}/{}", name, PACKAGE_FILE);
            if exclude_patterns.iter().any(|p| p.matches(&candidate)) {
                debug!(package = %name, "skipping excluded package");
                continue;
            }
            if !package_patterns.iter().any(|p| p.matches(&name)) {
                continue;
            }
        }

        let content = std::fs::read_to_string(file_path).map_err(|source| PackageError::Io {
            path: file_path.to_path_buf(),
            source,
        })?;
        packages.push(parse_package(&name, &content, file_path)?);
    }

    debug!(count = packages.len(), "loaded package declarations");
    PackageGraph::new(packages)
}
