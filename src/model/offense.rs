use super::reference::Reference;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Tag identifying which rule a violation breaks. Also names the checker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationType {
    Dependency,
    Privacy,
}

impl ViolationType {
    pub const ALL: [ViolationType; 2] = [ViolationType::Dependency, ViolationType::Privacy];

    pub fn as_str(&self) -> &'static str {
        match self {
            ViolationType::Dependency => "dependency",
            ViolationType::Privacy => "privacy",
        }
    }
}

impl fmt::Display for ViolationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ViolationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dependency" => Ok(ViolationType::Dependency),
            "privacy" => Ok(ViolationType::Privacy),
            _ => Err(format!("Unknown violation type: {}", s)),
        }
    }
}

/// What a checker returns for a reference it rejects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub violation_type: ViolationType,
    pub message: String,
}

/// Identity of an offense for allow-list matching.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OffenseKey {
    pub package: String,
    pub violation_type: ViolationType,
    pub symbol: String,
    pub file: String,
}

/// One checker's verdict against one reference.
///
/// Equality and hashing only consider the file, symbol and violation type,
/// so rewording messages never invalidates the allow-list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Offense {
    pub reference: Reference,
    pub violation_type: ViolationType,
    pub message: String,
}

impl Offense {
    pub fn new(reference: Reference, violation: Violation) -> Self {
        Self {
            reference,
            violation_type: violation.violation_type,
            message: violation.message,
        }
    }

    pub fn file(&self) -> &str {
        &self.reference.file
    }

    /// Package the offending file belongs to.
    pub fn package(&self) -> &str {
        &self.reference.package
    }

    /// Fully-qualified name of the referenced symbol.
    pub fn symbol(&self) -> &str {
        self.reference
            .symbol
            .as_ref()
            .map(|s| s.name.as_str())
            .unwrap_or(&self.reference.written_name)
    }

    /// Package defining the referenced symbol, if resolved.
    pub fn symbol_package(&self) -> Option<&str> {
        self.reference.symbol.as_ref().map(|s| s.package.as_str())
    }

    pub fn key(&self) -> OffenseKey {
        OffenseKey {
            package: self.package().to_string(),
            violation_type: self.violation_type,
            symbol: self.symbol().to_string(),
            file: self.file().to_string(),
        }
    }

    /// Stable report order: by file, position, symbol, then violation type.
    pub fn report_order(a: &Offense, b: &Offense) -> Ordering {
        a.file()
            .cmp(b.file())
            .then(a.reference.location.cmp(&b.reference.location))
            .then(a.symbol().cmp(b.symbol()))
            .then(a.violation_type.cmp(&b.violation_type))
    }
}

impl PartialEq for Offense {
    fn eq(&self, other: &Self) -> bool {
        self.file() == other.file()
            && self.symbol() == other.symbol()
            && self.violation_type == other.violation_type
    }
}

impl Eq for Offense {}

impl Hash for Offense {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.file().hash(state);
        self.symbol().hash(state);
        self.violation_type.hash(state);
    }
}

impl fmt::Display for Offense {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}\n{}",
            self.file(),
            self.reference.location,
            self.message
        )
    }
}
