use crate::config::Config;
use crate::inflect::Inflector;
use crate::packages::PackageGraph;

/// Maps a file path to the constant it is expected to define, the way an
/// autoloader would (`app/models/shipping/label.rb` -> `Shipping::Label`).
#[derive(Debug, Clone)]
pub struct LoadPaths {
    /// Explicit roots with a trailing `/`, longest first.
    explicit: Vec<String>,
    conventional: bool,
    inflector: Inflector,
}

impl LoadPaths {
    pub fn new(explicit: &[String], conventional: bool, inflector: Inflector) -> Self {
        let mut explicit: Vec<String> = explicit
            .iter()
            .map(|p| format!("{}/", p.trim_start_matches("./").trim_end_matches('/')))
            .collect();
        explicit.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
        explicit.dedup();
        Self {
            explicit,
            conventional,
            inflector,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.load_paths,
            config.conventional_load_paths,
            Inflector::with_acronyms(config.acronyms.iter().cloned()),
        )
    }

    pub fn inflector(&self) -> &Inflector {
        &self.inflector
    }

    pub fn conventional_name(&self, file: &str, packages: &PackageGraph) -> Option<String> {
        let relative = self.relative_to_load_path(file, packages)?;
        let stem = match relative.rsplit_once('.') {
            Some((stem, _ext)) if !stem.is_empty() && !stem.ends_with('/') => stem,
            _ => relative,
        };
        let name = self.inflector.camelize(stem);
        (!name.is_empty()).then_some(name)
    }

    fn relative_to_load_path<'f>(&self, file: &'f str, packages: &PackageGraph) -> Option<&'f str> {
        if let Some(rest) = self.explicit.iter().find_map(|root| file.strip_prefix(root.as_str())) {
            return Some(rest);
        }
        if !self.conventional {
            return None;
        }

        let package = packages.package_for_path(file);
        let inside = file.strip_prefix(package.path_prefix().as_str())?;

        if let Some(rest) = inside.strip_prefix("lib/") {
            return Some(rest);
        }
        let under_app = inside.strip_prefix("app/")?;
        let (_dir, rest) = under_app.split_once('/')?;
        Some(rest.strip_prefix("concerns/").unwrap_or(rest))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Package;

    fn graph() -> PackageGraph {
        PackageGraph::new(vec![Package::new("packs/shipping")]).unwrap()
    }

    #[test]
    fn test_conventional_roots() {
        let load_paths = LoadPaths::new(&[], true, Inflector::new());
        let graph = graph();
        let name = |file: &str| load_paths.conventional_name(file, &graph);

        assert_eq!(
            name("packs/shipping/app/models/shipping/label.rb"),
            Some("Shipping::Label".to_string())
        );
        assert_eq!(
            name("packs/shipping/app/models/concerns/trackable.rb"),
            Some("Trackable".to_string())
        );
        assert_eq!(
            name("packs/shipping/lib/shipping/rates_table.rb"),
            Some("Shipping::RatesTable".to_string())
        );
        assert_eq!(name("app/services/user_sync.rb"), Some("UserSync".to_string()));
        assert_eq!(name("packs/shipping/config/routes.rb"), None);
        assert_eq!(name("packs/shipping/app/README.rb"), None);
    }

    #[test]
    fn test_explicit_load_paths_win_and_honour_acronyms() {
        let load_paths = LoadPaths::new(
            &["components/".to_string(), "components/api".to_string()],
            false,
            Inflector::with_acronyms(["API"]),
        );
        let graph = graph();

        assert_eq!(
            load_paths.conventional_name("components/api/v1/api_client.rb", &graph),
            Some("V1::APIClient".to_string())
        );
        assert_eq!(
            load_paths.conventional_name("components/api_gateway.rb", &graph),
            Some("APIGateway".to_string())
        );
        assert_eq!(
            load_paths.conventional_name("packs/shipping/app/models/label.rb", &graph),
            None
        );
    }
}
