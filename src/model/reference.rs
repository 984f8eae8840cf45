use super::symbol::{ResolvedSymbol, SourceLocation};
use serde::{Deserialize, Serialize};

/// A constant usage as written in one file, before resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawUsage {
    /// Name as written, e.g. `Label`, `Shipping::Label` or `::Shipping::Label`.
    pub name: String,
    pub location: SourceLocation,
    /// Enclosing lexical scopes, outermost first, each fully qualified.
    /// `module A; module B::C; X; end; end` gives `["A", "A::B::C"]` for `X`.
    pub nesting: Vec<String>,
}

impl RawUsage {
    pub fn new(name: impl Into<String>, line: usize, column: usize, nesting: Vec<String>) -> Self {
        Self {
            name: name.into(),
            location: SourceLocation::new(line, column),
            nesting,
        }
    }

    pub fn line(&self) -> usize {
        self.location.line
    }

    pub fn column(&self) -> usize {
        self.location.column
    }
}

/// A usage attributed to its file and package, resolved against the symbol index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub file: String,
    /// Package owning `file`.
    pub package: String,
    /// Name as written at the usage site.
    pub written_name: String,
    pub location: SourceLocation,
    /// `None` when no definition could be found.
    pub symbol: Option<ResolvedSymbol>,
}

impl Reference {
    pub fn is_resolved(&self) -> bool {
        self.symbol.is_some()
    }

    /// True when the reference resolves into a package other than its own.
    pub fn crosses_packages(&self) -> bool {
        self.symbol
            .as_ref()
            .is_some_and(|symbol| symbol.package != self.package)
    }
}
