mod offense;
mod package;
mod reference;
mod symbol;

pub use offense::{Offense, OffenseKey, Violation, ViolationType};
pub use package::{Package, ROOT_PACKAGE};
pub use reference::{RawUsage, Reference};
pub use symbol::{ResolvedSymbol, SourceLocation, Symbol, SymbolKind};
