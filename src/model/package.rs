use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Name of the package that owns every file not claimed by a nested package.
pub const ROOT_PACKAGE: &str = ".";

/// A named unit of the codebase with its own dependency declarations.
///
/// The package name is its root directory relative to the project root,
/// so `packs/billing` owns every file below `packs/billing/` that no deeper
/// package claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    pub name: String,
    pub dependencies: BTreeSet<String>,
    pub enforce_dependencies: bool,
    pub enforce_privacy: bool,
    /// Strict packages must carry zero tolerated violations.
    pub strict: bool,
    /// Directory (relative to the package root) holding the public API.
    pub public_path: String,
    /// When non-empty, only these constants (and their nested constants) are private.
    pub private_constants: Vec<String>,
}

impl Package {
    pub const DEFAULT_PUBLIC_PATH: &'static str = "app/public/";

    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dependencies: BTreeSet::new(),
            enforce_dependencies: false,
            enforce_privacy: false,
            strict: false,
            public_path: Self::DEFAULT_PUBLIC_PATH.to_string(),
            private_constants: Vec::new(),
        }
    }

    pub fn root() -> Self {
        Self::new(ROOT_PACKAGE)
    }

    pub fn is_root(&self) -> bool {
        self.name == ROOT_PACKAGE
    }

    pub fn depends_on(&self, other: &str) -> bool {
        self.dependencies.contains(other)
    }

    /// Path prefix (with trailing slash) that files of this package start with.
    /// Empty for the root package.
    pub fn path_prefix(&self) -> String {
        if self.is_root() {
            String::new()
        } else {
            format!("{}/", self.name.trim_end_matches('/'))
        }
    }

    /// Whether `file` lies below this package's directory. Ownership also
    /// depends on nested packages; see `PackageGraph::package_for_path`.
    pub fn contains(&self, file: &str) -> bool {
        file.starts_with(&self.path_prefix())
    }

    /// Public API directory relative to the project root, with trailing slash.
    pub fn public_dir(&self) -> String {
        let public = self.public_path.trim_start_matches("./").trim_end_matches('/');
        format!("{}{}/", self.path_prefix(), public)
    }

    /// Whether `symbol` (defined in `defining_file`) is hidden from other packages.
    pub fn is_private_symbol(&self, symbol: &str, defining_file: &str) -> bool {
        if !self.enforce_privacy {
            return false;
        }

        if !self.private_constants.is_empty() {
            return self.private_constants.iter().any(|constant| {
                let constant = constant.trim_start_matches("::");
                symbol == constant
                    || symbol
                        .strip_prefix(constant)
                        .is_some_and(|rest| rest.starts_with("::"))
            });
        }

        !defining_file.starts_with(&self.public_dir())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_prefix_and_contains() {
        let billing = Package::new("packs/billing");
        assert!(billing.contains("packs/billing/app/models/invoice.rb"));
        assert!(!billing.contains("packs/billing_v2/app/models/invoice.rb"));

        let root = Package::root();
        assert_eq!(root.path_prefix(), "");
        assert!(root.contains("app/models/user.rb"));
    }

    #[test]
    fn test_privacy_by_public_path() {
        let mut shipping = Package::new("packs/shipping");
        shipping.enforce_privacy = true;

        assert!(!shipping.is_private_symbol(
            "Shipping::Api",
            "packs/shipping/app/public/shipping/api.rb"
        ));
        assert!(shipping.is_private_symbol(
            "Shipping::Label",
            "packs/shipping/app/models/shipping/label.rb"
        ));

        shipping.enforce_privacy = false;
        assert!(!shipping.is_private_symbol(
            "Shipping::Label",
            "packs/shipping/app/models/shipping/label.rb"
        ));
    }

    #[test]
    fn test_privacy_by_private_constants() {
        let mut shipping = Package::new("packs/shipping");
        shipping.enforce_privacy = true;
        shipping.private_constants = vec!["::Shipping::Internal".to_string()];

        assert!(shipping.is_private_symbol("Shipping::Internal", "x.rb"));
        assert!(shipping.is_private_symbol("Shipping::Internal::Rate", "x.rb"));
        assert!(!shipping.is_private_symbol("Shipping::InternalRate", "x.rb"));
        assert!(!shipping.is_private_symbol("Shipping::Label", "x.rb"));
    }
}
