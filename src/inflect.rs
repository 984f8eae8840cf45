//! Name inflection used to map paths and association names onto constants.

use std::collections::HashMap;

/// Converts between snake_case file/association names and CamelCase constants.
#[derive(Debug, Clone, Default)]
pub struct Inflector {
    /// Lowercase word -> exact spelling, e.g. "api" -> "API".
    acronyms: HashMap<String, String>,
}

impl Inflector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_acronyms<I, S>(acronyms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let acronyms = acronyms
            .into_iter()
            .map(Into::into)
            .map(|a: String| (a.to_lowercase(), a))
            .collect();
        Self { acronyms }
    }

    /// `line_items` -> `LineItems`, `admin/users` -> `Admin::Users`.
    pub fn camelize(&self, term: &str) -> String {
        term.split('/')
            .filter(|segment| !segment.is_empty())
            .map(|segment| self.camelize_segment(segment))
            .collect::<Vec<_>>()
            .join("::")
    }

    fn camelize_segment(&self, segment: &str) -> String {
        segment
            .split('_')
            .filter(|word| !word.is_empty())
            .map(|word| match self.acronyms.get(&word.to_lowercase()) {
                Some(acronym) => acronym.clone(),
                None => capitalize(word),
            })
            .collect()
    }

    /// `line_items` -> `LineItem`. The last path segment is singularized.
    pub fn classify(&self, term: &str) -> String {
        let (prefix, last) = match term.rsplit_once('/') {
            Some((prefix, last)) => (Some(prefix), last),
            None => (None, term),
        };
        let singular = singularize(last);
        match prefix {
            Some(prefix) => self.camelize(&format!("{prefix}/{singular}")),
            None => self.camelize(&singular),
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(c) => c.to_uppercase().chain(chars).collect(),
    }
}

const UNCOUNTABLE: &[&str] = &[
    "equipment",
    "information",
    "rice",
    "money",
    "species",
    "series",
    "fish",
    "sheep",
    "news",
    "data",
    "metadata",
];

const IRREGULAR: &[(&str, &str)] = &[
    ("people", "person"),
    ("men", "man"),
    ("women", "woman"),
    ("children", "child"),
    ("moves", "move"),
    ("sexes", "sex"),
];

/// English singularization covering the common ActiveRecord association shapes.
pub fn singularize(word: &str) -> String {
    if !word.is_ascii() {
        return word.to_string();
    }
    let lower = word.to_ascii_lowercase();
    if UNCOUNTABLE.iter().any(|u| lower.ends_with(u)) {
        return word.to_string();
    }
    for (plural, singular) in IRREGULAR {
        if let Some(stem) = lower.strip_suffix(plural) {
            if stem.is_empty() || stem.ends_with('_') {
                return format!("{}{}", &word[..stem.len()], singular);
            }
        }
    }

    let replace = |suffix: &str, with: &str| -> Option<String> {
        lower
            .strip_suffix(suffix)
            .map(|_| format!("{}{}", &word[..word.len() - suffix.len()], with))
    };

    if let Some(s) = replace("ies", "y") {
        return s;
    }
    if lower.ends_with("sses") || lower.ends_with("shes") || lower.ends_with("ches") {
        return word[..word.len() - 2].to_string();
    }
    if lower.ends_with("xes") || lower.ends_with("zzes") {
        return word[..word.len() - 2].to_string();
    }
    if let Some(s) = replace("ves", "f").filter(|_| lower.ends_with("lves")) {
        return s;
    }
    if lower.ends_with("ss") || lower.ends_with("us") || lower.ends_with("is") {
        return word.to_string();
    }
    if let Some(s) = replace("s", "") {
        return s;
    }
    word.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camelize_paths() {
        let inflector = Inflector::new();
        assert_eq!(inflector.camelize("line_items"), "LineItems");
        assert_eq!(inflector.camelize("shipping/label"), "Shipping::Label");
        assert_eq!(inflector.camelize("v2/order__state"), "V2::OrderState");
    }

    #[test]
    fn test_camelize_with_acronyms() {
        let inflector = Inflector::with_acronyms(["API", "HTML"]);
        assert_eq!(inflector.camelize("api/html_renderer"), "API::HTMLRenderer");
    }

    #[test]
    fn test_singularize() {
        assert_eq!(singularize("orders"), "order");
        assert_eq!(singularize("categories"), "category");
        assert_eq!(singularize("addresses"), "address");
        assert_eq!(singularize("boxes"), "box");
        assert_eq!(singularize("matches"), "match");
        assert_eq!(singularize("shelves"), "shelf");
        assert_eq!(singularize("status"), "status");
        assert_eq!(singularize("people"), "person");
        assert_eq!(singularize("sales_people"), "sales_person");
        assert_eq!(singularize("metadata"), "metadata");
        assert_eq!(singularize("customer"), "customer");
    }

    #[test]
    fn test_classify() {
        let inflector = Inflector::new();
        assert_eq!(inflector.classify("line_items"), "LineItem");
        assert_eq!(inflector.classify("billing/invoices"), "Billing::Invoice");
        assert_eq!(inflector.classify("shipping_label"), "ShippingLabel");
    }
}
