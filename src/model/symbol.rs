use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    /// 1-based line.
    pub line: usize,
    /// 1-based column.
    pub column: usize,
}

impl SourceLocation {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    Class,
    Module,
    Constant,
    /// Inferred from the file path when the file declares nothing matching it.
    Conventional,
}

/// A fully-qualified constant and the place that defines it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    /// Fully-qualified name without leading `::`, e.g. `Shipping::Label`.
    pub name: String,
    pub kind: SymbolKind,
    pub package: String,
    pub file: String,
    pub line: usize,
}

impl Symbol {
    pub fn resolved(&self) -> ResolvedSymbol {
        ResolvedSymbol {
            name: self.name.clone(),
            package: self.package.clone(),
            file: self.file.clone(),
        }
    }
}

/// The part of a [`Symbol`] carried on a resolved reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResolvedSymbol {
    pub name: String,
    pub package: String,
    pub file: String,
}
