//! Rules evaluated against every resolved reference.

use crate::model::{Reference, ResolvedSymbol, Violation, ViolationType};
use crate::packages::PackageGraph;
use std::fmt;
use std::str::FromStr;

/// A single rule. Implementations must be pure: the same reference and
/// package graph always give the same answer, from any thread.
pub trait Checker: Send + Sync {
    fn name(&self) -> &'static str;
    fn evaluate(&self, reference: &Reference, packages: &PackageGraph) -> Option<Violation>;
}

/// Rules that can be enabled from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckerKind {
    Dependency,
    Privacy,
}

impl CheckerKind {
    pub fn name(&self) -> &'static str {
        match self {
            CheckerKind::Dependency => "dependency",
            CheckerKind::Privacy => "privacy",
        }
    }

    pub fn build(&self) -> Box<dyn Checker> {
        match self {
            CheckerKind::Dependency => Box::new(DependencyChecker),
            CheckerKind::Privacy => Box::new(PrivacyChecker),
        }
    }
}

impl fmt::Display for CheckerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CheckerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "dependency" => Ok(CheckerKind::Dependency),
            "privacy" => Ok(CheckerKind::Privacy),
            _ => Err(format!("Unknown checker: {}", s)),
        }
    }
}

/// Build the ordered checker list for `kinds`, dropping repeats.
pub fn build_checkers(kinds: &[CheckerKind]) -> Vec<Box<dyn Checker>> {
    let mut seen = Vec::new();
    kinds
        .iter()
        .filter(|kind| {
            if seen.contains(*kind) {
                false
            } else {
                seen.push(**kind);
                true
            }
        })
        .map(CheckerKind::build)
        .collect()
}

/// The defining symbol when `reference` points into another package.
fn foreign_symbol(reference: &Reference) -> Option<&ResolvedSymbol> {
    reference
        .symbol
        .as_ref()
        .filter(|symbol| symbol.package != reference.package)
}

/// Flags references to packages the referencing package doesn't depend on.
#[derive(Debug, Default, Clone, Copy)]
pub struct DependencyChecker;

impl Checker for DependencyChecker {
    fn name(&self) -> &'static str {
        CheckerKind::Dependency.name()
    }

    fn evaluate(&self, reference: &Reference, packages: &PackageGraph) -> Option<Violation> {
        let symbol = foreign_symbol(reference)?;
        let source = packages.get(&reference.package)?;
        if !source.enforce_dependencies || source.depends_on(&symbol.package) {
            return None;
        }

        Some(Violation {
            violation_type: ViolationType::Dependency,
            message: format!(
                "Dependency violation: ::{} belongs to '{}', but '{}' does not specify a dependency on '{}'.\n\
                 Are we missing an abstraction?\n\
                 Is the code making the reference, and the referenced constant, in the right packages?",
                symbol.name, symbol.package, reference.package, symbol.package
            ),
        })
    }
}

/// Flags references to constants another package keeps private.
#[derive(Debug, Default, Clone, Copy)]
pub struct PrivacyChecker;

impl Checker for PrivacyChecker {
    fn name(&self) -> &'static str {
        CheckerKind::Privacy.name()
    }

    fn evaluate(&self, reference: &Reference, packages: &PackageGraph) -> Option<Violation> {
        let symbol = foreign_symbol(reference)?;
        let owner = packages.get(&symbol.package)?;
        if !owner.is_private_symbol(&symbol.name, &symbol.file) {
            return None;
        }

        Some(Violation {
            violation_type: ViolationType::Privacy,
            message: format!(
                "Privacy violation: '::{}' is private to '{}' but referenced from '{}'.\n\
                 Is there a public entrypoint in '{}' that you can use instead?",
                symbol.name,
                symbol.package,
                reference.package,
                owner.public_dir()
            ),
        })
    }
}

/// Never reports. Used when a run only collects references.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExportChecker;

impl Checker for ExportChecker {
    fn name(&self) -> &'static str {
        "export"
    }

    fn evaluate(&self, _reference: &Reference, _packages: &PackageGraph) -> Option<Violation> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Package, SourceLocation};

    fn graph() -> PackageGraph {
        let mut billing = Package::new("packs/billing");
        billing.enforce_dependencies = true;
        billing.dependencies.insert("packs/core".to_string());

        let mut shipping = Package::new("packs/shipping");
        shipping.enforce_privacy = true;

        let core = Package::new("packs/core");
        PackageGraph::new(vec![billing, shipping, core]).unwrap()
    }

    fn reference(from: &str, symbol: Option<(&str, &str, &str)>) -> Reference {
        Reference {
            file: format!("{}/app/models/invoice.rb", from),
            package: from.to_string(),
            written_name: "Label".to_string(),
            location: SourceLocation::new(1, 1),
            symbol: symbol.map(|(name, package, file)| ResolvedSymbol {
                name: name.to_string(),
                package: package.to_string(),
                file: file.to_string(),
            }),
        }
    }

    const LABEL: (&str, &str, &str) = (
        "Shipping::Label",
        "packs/shipping",
        "packs/shipping/app/models/shipping/label.rb",
    );

    #[test]
    fn test_dependency_checker() {
        let graph = graph();
        let checker = DependencyChecker;

        let violation = checker
            .evaluate(&reference("packs/billing", Some(LABEL)), &graph)
            .unwrap();
        assert_eq!(violation.violation_type, ViolationType::Dependency);
        assert!(violation.message.contains("::Shipping::Label belongs to 'packs/shipping'"));

        let declared = ("Core::Money", "packs/core", "packs/core/app/models/core/money.rb");
        assert!(checker
            .evaluate(&reference("packs/billing", Some(declared)), &graph)
            .is_none());
        // shipping does not enforce dependencies
        assert!(checker
            .evaluate(&reference("packs/shipping", Some(declared)), &graph)
            .is_none());
        assert!(checker.evaluate(&reference("packs/billing", None), &graph).is_none());
    }

    #[test]
    fn test_privacy_checker() {
        let graph = graph();
        let checker = PrivacyChecker;

        let violation = checker
            .evaluate(&reference("packs/core", Some(LABEL)), &graph)
            .unwrap();
        assert_eq!(violation.violation_type, ViolationType::Privacy);

        let public = (
            "Shipping::Api",
            "packs/shipping",
            "packs/shipping/app/public/shipping/api.rb",
        );
        assert!(checker.evaluate(&reference("packs/core", Some(public)), &graph).is_none());
        assert!(checker
            .evaluate(&reference("packs/shipping", Some(LABEL)), &graph)
            .is_none());
    }

    #[test]
    fn test_export_checker_never_reports() {
        assert!(ExportChecker
            .evaluate(&reference("packs/billing", Some(LABEL)), &graph())
            .is_none());
    }

    #[test]
    fn test_build_checkers_keeps_order_and_drops_repeats() {
        let checkers = build_checkers(&[
            CheckerKind::Privacy,
            CheckerKind::Dependency,
            CheckerKind::Privacy,
        ]);
        let names: Vec<&str> = checkers.iter().map(|c| c.name()).collect();
        assert_eq!(names, vec!["privacy", "dependency"]);
    }
}
