use crate::checker::CheckerKind;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const CONFIG_FILE: &str = "packwall.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid glob pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        source: glob::PatternError,
    },
    #[error("Unknown checker '{0}' (expected one of: dependency, privacy)")]
    UnknownChecker(String),
}

/// Engine configuration, read-only for the duration of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Glob patterns selecting source files, relative to the root.
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    /// Glob patterns selecting directories that may hold a `package.toml`.
    pub package_paths: Vec<String>,
    /// Extra directories whose files are named after their path.
    pub load_paths: Vec<String>,
    /// Treat `<package>/app/*` and `<package>/lib` as load paths.
    pub conventional_load_paths: bool,
    pub checkers: Vec<CheckerKind>,
    pub parallel: bool,
    /// Worker count for parallel runs; 0 lets the pool pick.
    pub jobs: usize,
    pub cache: bool,
    /// Relative to the project root unless absolute.
    pub cache_directory: PathBuf,
    /// Extra association-style macros, e.g. `has_one_attached_model`.
    pub custom_associations: Vec<String>,
    pub acronyms: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    include: Option<Vec<String>>,
    exclude: Option<Vec<String>>,
    package_paths: Option<Vec<String>>,
    load_paths: Option<Vec<String>>,
    conventional_load_paths: Option<bool>,
    checkers: Option<Vec<String>>,
    parallel: Option<bool>,
    jobs: Option<usize>,
    cache: Option<bool>,
    cache_directory: Option<PathBuf>,
    custom_associations: Option<Vec<String>>,
    acronyms: Option<Vec<String>>,
}

pub const DEFAULT_INCLUDE: &[&str] = &[
    "**/*.rb",
    "**/*.rake",
    "**/*.ru",
    "**/*.builder",
    "**/*.gemspec",
];

pub const DEFAULT_EXCLUDE: &[&str] = &[
    "bin/**/*",
    "node_modules/**/*",
    "script/**/*",
    "tmp/**/*",
    "vendor/**/*",
];

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            include: strings(DEFAULT_INCLUDE),
            exclude: strings(DEFAULT_EXCLUDE),
            package_paths: vec!["**".to_string()],
            load_paths: Vec::new(),
            conventional_load_paths: true,
            checkers: vec![CheckerKind::Dependency, CheckerKind::Privacy],
            parallel: true,
            jobs: 0,
            cache: true,
            cache_directory: PathBuf::from("tmp/cache/packwall"),
            custom_associations: Vec::new(),
            acronyms: Vec::new(),
        }
    }
}

impl Config {
    /// Load `packwall.toml` from `project_path`, falling back to defaults when absent.
    pub fn load(project_path: &Path) -> Result<Self, ConfigError> {
        let config_path = project_path.join(CONFIG_FILE);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&config_path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = toml::from_str(content)?;
        let defaults = Self::default();

        let checkers = match raw.checkers {
            Some(names) => names
                .iter()
                .map(|name| {
                    name.parse::<CheckerKind>()
                        .map_err(|_| ConfigError::UnknownChecker(name.clone()))
                })
                .collect::<Result<Vec<_>, _>>()?,
            None => defaults.checkers,
        };

        let config = Self {
            include: raw.include.unwrap_or(defaults.include),
            exclude: raw.exclude.unwrap_or(defaults.exclude),
            package_paths: raw.package_paths.unwrap_or(defaults.package_paths),
            load_paths: raw.load_paths.unwrap_or_default(),
            conventional_load_paths: raw
                .conventional_load_paths
                .unwrap_or(defaults.conventional_load_paths),
            checkers,
            parallel: raw.parallel.unwrap_or(defaults.parallel),
            jobs: raw.jobs.unwrap_or(defaults.jobs),
            cache: raw.cache.unwrap_or(defaults.cache),
            cache_directory: raw.cache_directory.unwrap_or(defaults.cache_directory),
            custom_associations: raw.custom_associations.unwrap_or_default(),
            acronyms: raw.acronyms.unwrap_or_default(),
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for pattern in self
            .include
            .iter()
            .chain(&self.exclude)
            .chain(&self.package_paths)
        {
            compile_pattern(pattern)?;
        }
        Ok(())
    }

    pub fn cache_directory_in(&self, root: &Path) -> PathBuf {
        if self.cache_directory.is_absolute() {
            self.cache_directory.clone()
        } else {
            root.join(&self.cache_directory)
        }
    }
}

pub(crate) fn compile_pattern(pattern: &str) -> Result<glob::Pattern, ConfigError> {
    glob::Pattern::new(pattern).map_err(|source| ConfigError::Pattern {
        pattern: pattern.to_string(),
        source,
    })
}

/// Commented starter config written by `packwall init`.
pub fn generate_config_template() -> String {
    r#"# packwall configuration

# Source files to analyze, relative to this file.
include = ["**/*.rb", "**/*.rake", "**/*.ru", "**/*.builder", "**/*.gemspec"]
exclude = ["bin/**/*", "node_modules/**/*", "script/**/*", "tmp/**/*", "vendor/**/*"]

# Directories searched for package.toml files.
package_paths = ["**"]

# Directories whose files define constants named after their path
# (app/models/shipping/label.rb -> Shipping::Label).
# <package>/app/* and <package>/lib are used automatically unless
# conventional_load_paths is false.
load_paths = []
conventional_load_paths = true

# Enabled rules: "dependency", "privacy".
checkers = ["dependency", "privacy"]

# Inspect files on a worker pool. jobs = 0 picks one worker per CPU.
parallel = true
jobs = 0

cache = true
cache_directory = "tmp/cache/packwall"

# Additional association macros resolved like has_many.
custom_associations = []

# Words kept upper-case when mapping paths to constants, e.g. ["API"].
acronyms = []
"#
    .to_string()
}
