//! Selecting the files a run inspects.

use crate::config::{Config, ConfigError, compile_pattern};
use ignore::WalkBuilder;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FileSetError {
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),
    #[error("{0}")]
    Config(#[from] ConfigError),
}

/// Repository-relative path with `/` separators.
pub fn to_slash(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Include/exclude glob filter over repository-relative paths.
#[derive(Debug, Clone)]
pub struct PathMatcher {
    include: Vec<glob::Pattern>,
    exclude: Vec<glob::Pattern>,
}

impl PathMatcher {
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let compile = |patterns: &[String]| {
            patterns
                .iter()
                .map(|p| compile_pattern(p))
                .collect::<Result<Vec<_>, _>>()
        };
        Ok(Self {
            include: compile(&config.include)?,
            exclude: compile(&config.exclude)?,
        })
    }

    pub fn matches(&self, relative: &str) -> bool {
        self.include.iter().any(|p| p.matches(relative))
            && !self.exclude.iter().any(|p| p.matches(relative))
    }
}

/// Ordered, de-duplicated set of files for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSet {
    files: Vec<String>,
    /// True when the caller narrowed the run to explicit paths.
    specified: bool,
}

impl FileSet {
    /// A set covering the whole codebase.
    pub fn full<I, S>(files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::build(files, false)
    }

    /// A caller-restricted subset.
    pub fn specified<I, S>(files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::build(files, true)
    }

    fn build<I, S>(files: I, specified: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let files: BTreeSet<String> = files.into_iter().map(Into::into).collect();
        Self {
            files: files.into_iter().collect(),
            specified,
        }
    }

    /// Every matching file below `root`.
    pub fn discover(root: &Path, config: &Config) -> Result<Self, FileSetError> {
        let matcher = PathMatcher::from_config(config)?;
        Ok(Self::full(walk(root, root, &matcher)))
    }

    /// Files named by `paths` (files or directories, relative to `root`).
    /// An empty list means the whole codebase.
    pub fn from_paths(root: &Path, config: &Config, paths: &[PathBuf]) -> Result<Self, FileSetError> {
        if paths.is_empty() {
            return Self::discover(root, config);
        }

        let matcher = PathMatcher::from_config(config)?;
        let mut files = Vec::new();
        for path in paths {
            let absolute = if path.is_absolute() {
                path.clone()
            } else {
                root.join(path)
            };
            if !absolute.exists() {
                return Err(FileSetError::PathNotFound(path.clone()));
            }
            if absolute.is_dir() {
                files.extend(walk(root, &absolute, &matcher));
            } else if let Ok(relative) = absolute.strip_prefix(root) {
                let relative = to_slash(relative);
                if matcher.matches(&relative) {
                    files.push(relative);
                }
            }
        }
        Ok(Self::specified(files))
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.files.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn is_specified(&self) -> bool {
        self.specified
    }

    pub fn contains(&self, file: &str) -> bool {
        self.files.binary_search_by(|f| f.as_str().cmp(file)).is_ok()
    }
}

fn walk(root: &Path, start: &Path, matcher: &PathMatcher) -> Vec<String> {
    let walker = WalkBuilder::new(start).hidden(true).git_ignore(true).build();
    walker
        .flatten()
        .filter(|entry| entry.path().is_file())
        .filter_map(|entry| {
            entry
                .path()
                .strip_prefix(root)
                .ok()
                .map(to_slash)
        })
        .filter(|relative| matcher.matches(relative))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_set_is_sorted_and_unique() {
        let set = FileSet::full(["b.rb", "a.rb", "b.rb"]);
        assert_eq!(set.as_slice(), &["a.rb".to_string(), "b.rb".to_string()]);
        assert!(set.contains("b.rb"));
        assert!(!set.contains("c.rb"));
        assert!(!set.is_specified());
        assert!(FileSet::specified(["a.rb"]).is_specified());
    }

    #[test]
    fn test_matcher_applies_include_and_exclude() {
        let matcher = PathMatcher::from_config(&Config::default()).unwrap();
        assert!(matcher.matches("app/models/user.rb"));
        assert!(matcher.matches("Rakefile.rake"));
        assert!(matcher.matches("config.ru"));
        assert!(!matcher.matches("vendor/gems/foo/lib/foo.rb"));
        assert!(!matcher.matches("app/assets/app.js"));
    }

    #[test]
    fn test_to_slash() {
        assert_eq!(to_slash(Path::new("packs/billing/app")), "packs/billing/app");
    }
}
