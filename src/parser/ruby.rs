use crate::define_parser;
use crate::inflect::Inflector;
use crate::model::{RawUsage, SymbolKind};
use crate::parser::common::{ensure_well_formed, parse_tree};
use crate::parser::{Definition, LanguageParser, ParseError, ParsedFile};
use std::collections::HashSet;
use tree_sitter::Node;

define_parser!(RUBY_PARSER);

/// ActiveRecord macros whose first symbol argument names a model.
pub const ASSOCIATION_METHODS: &[&str] = &[
    "has_one",
    "has_many",
    "belongs_to",
    "has_and_belongs_to_many",
];

pub struct RubyParser {
    associations: HashSet<String>,
    inflector: Inflector,
}

impl RubyParser {
    pub fn new() -> Self {
        Self::with_associations(&[], Inflector::new())
    }

    pub fn with_associations(custom: &[String], inflector: Inflector) -> Self {
        let associations = ASSOCIATION_METHODS
            .iter()
            .map(|m| m.to_string())
            .chain(custom.iter().cloned())
            .collect();
        Self {
            associations,
            inflector,
        }
    }
}

impl Default for RubyParser {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageParser for RubyParser {
    fn extensions(&self) -> &[&str] {
        &["rb", "rake", "ru", "builder", "gemspec"]
    }

    fn parse_file(&self, _path: &str, source: &str) -> Result<ParsedFile, ParseError> {
        let tree = parse_tree(&RUBY_PARSER, || tree_sitter_ruby::LANGUAGE.into(), source)?;
        ensure_well_formed(&tree)?;

        let mut walker = Walker {
            source: source.as_bytes(),
            parser: self,
            scopes: Vec::new(),
            parsed: ParsedFile::default(),
        };
        walker.visit(tree.root_node());

        let mut parsed = walker.parsed;
        mark_namespace_wrappers(&mut parsed.definitions);
        Ok(parsed)
    }
}

/// Modules that are strict ancestors of another declaration in the same
/// file only open a scope there.
fn mark_namespace_wrappers(definitions: &mut [Definition]) {
    let names: Vec<String> = definitions.iter().map(|d| d.name.clone()).collect();
    for definition in definitions.iter_mut() {
        if definition.kind != SymbolKind::Module {
            continue;
        }
        let prefix = format!("{}::", definition.name);
        definition.namespace_only = names.iter().any(|n| n.starts_with(&prefix));
    }
}

struct Walker<'a> {
    source: &'a [u8],
    parser: &'a RubyParser,
    /// Fully-qualified lexical scopes, outermost first.
    scopes: Vec<String>,
    parsed: ParsedFile,
}

impl<'a> Walker<'a> {
    fn text(&self, node: Node<'_>) -> &'a str {
        node.utf8_text(self.source).unwrap_or("")
    }

    fn visit(&mut self, node: Node<'_>) {
        match node.kind() {
            "class" | "module" => self.visit_namespace(node),
            "constant" => {
                let name = self.text(node).to_string();
                self.record_usage(node, name);
            }
            "scope_resolution" => self.visit_scope_resolution(node),
            "assignment" | "operator_assignment" => self.visit_assignment(node),
            "call" => self.visit_call(node),
            "comment" => {}
            _ => self.visit_children(node, &[]),
        }
    }

    fn visit_children(&mut self, node: Node<'_>, skip: &[Option<Node<'_>>]) {
        let skip: Vec<usize> = skip.iter().flatten().map(|n| n.id()).collect();
        let mut cursor = node.walk();
        let children: Vec<Node<'_>> = node
            .named_children(&mut cursor)
            .filter(|child| !skip.contains(&child.id()))
            .collect();
        for child in children {
            self.visit(child);
        }
    }

    fn visit_namespace(&mut self, node: Node<'_>) {
        let name_node = node.child_by_field_name("name");
        let superclass = node.child_by_field_name("superclass");

        let Some(name) = name_node.and_then(|n| self.constant_path(n)) else {
            self.visit_children(node, &[]);
            return;
        };

        // The superclass is evaluated in the scope enclosing the class.
        if let Some(superclass) = superclass {
            self.visit(superclass);
        }

        let qualified = self.qualify(&name);
        let kind = if node.kind() == "class" {
            SymbolKind::Class
        } else {
            SymbolKind::Module
        };
        self.define(node, qualified.clone(), kind);

        self.scopes.push(qualified);
        self.visit_children(node, &[name_node, superclass]);
        self.scopes.pop();
    }

    fn visit_scope_resolution(&mut self, node: Node<'_>) {
        match self.constant_path(node) {
            Some(path) => self.record_usage(node, path),
            None => {
                // `obj::Const` with a dynamic receiver; only the receiver can hold constants.
                if let Some(scope) = node.child_by_field_name("scope") {
                    self.visit(scope);
                }
            }
        }
    }

    fn visit_assignment(&mut self, node: Node<'_>) {
        let left = node.child_by_field_name("left");
        let right = node.child_by_field_name("right");

        if let Some(left) = left {
            if left.kind() == "left_assignment_list" {
                let mut cursor = left.walk();
                let targets: Vec<Node<'_>> = left.named_children(&mut cursor).collect();
                for target in targets {
                    self.assign_target(target);
                }
            } else {
                self.assign_target(left);
            }
        }

        if let Some(right) = right {
            self.visit(right);
        }
    }

    fn assign_target(&mut self, target: Node<'_>) {
        match self.constant_path(target) {
            Some(path) => {
                let qualified = self.qualify(&path);
                self.define(target, qualified, SymbolKind::Constant);
            }
            None => self.visit(target),
        }
    }

    fn visit_call(&mut self, node: Node<'_>) {
        let method_node = node.child_by_field_name("method");
        if node.child_by_field_name("receiver").is_none() {
            let method = method_node.map(|m| self.text(m));
            if method.is_some_and(|m| self.parser.associations.contains(m)) {
                if let Some(target) = node
                    .child_by_field_name("arguments")
                    .and_then(|args| self.association_target(args))
                {
                    self.record_usage(node, target);
                }
            }
        }
        // `Money(1)` names a method, not the constant `Money`.
        self.visit_children(node, &[method_node]);
    }

    /// `has_many :line_items` -> `LineItem`; `class_name: "Billing::Line"` wins when present.
    fn association_target(&self, arguments: Node<'_>) -> Option<String> {
        let mut cursor = arguments.walk();
        let args: Vec<Node<'_>> = arguments.named_children(&mut cursor).collect();

        let first = args.first()?;
        if first.kind() != "simple_symbol" {
            return None;
        }
        let association = self.text(*first).trim_start_matches(':');

        let class_name = args
            .iter()
            .filter(|arg| arg.kind() == "pair")
            .find_map(|pair| {
                let key = pair.child_by_field_name("key")?;
                let value = pair.child_by_field_name("value")?;
                let key_text = self.text(key).trim_start_matches(':').trim_end_matches(':');
                if key_text == "class_name" {
                    self.plain_string(value)
                } else {
                    None
                }
            });

        Some(class_name.unwrap_or_else(|| self.parser.inflector.classify(association)))
    }

    /// Contents of a string literal without interpolation.
    fn plain_string(&self, node: Node<'_>) -> Option<String> {
        if node.kind() != "string" {
            return None;
        }
        let mut cursor = node.walk();
        let parts: Vec<Node<'_>> = node.named_children(&mut cursor).collect();
        match parts.as_slice() {
            [content] if content.kind() == "string_content" => {
                Some(self.text(*content).to_string()).filter(|s| !s.is_empty())
            }
            _ => None,
        }
    }

    /// `Foo`, `Foo::Bar` or `::Foo::Bar` when `node` is a static constant path.
    fn constant_path(&self, node: Node<'_>) -> Option<String> {
        match node.kind() {
            "constant" => Some(self.text(node).to_string()),
            "scope_resolution" => {
                let name = node.child_by_field_name("name")?;
                if name.kind() != "constant" {
                    return None;
                }
                match node.child_by_field_name("scope") {
                    None => Some(format!("::{}", self.text(name))),
                    Some(scope) => {
                        Some(format!("{}::{}", self.constant_path(scope)?, self.text(name)))
                    }
                }
            }
            _ => None,
        }
    }

    fn qualify(&self, name: &str) -> String {
        if let Some(absolute) = name.strip_prefix("::") {
            return absolute.to_string();
        }
        match self.scopes.last() {
            Some(scope) => format!("{}::{}", scope, name),
            None => name.to_string(),
        }
    }

    fn define(&mut self, node: Node<'_>, name: String, kind: SymbolKind) {
        self.parsed.definitions.push(Definition {
            name,
            kind,
            line: node.start_position().row + 1,
            namespace_only: false,
        });
    }

    fn record_usage(&mut self, node: Node<'_>, name: String) {
        let position = node.start_position();
        self.parsed.usages.push(RawUsage::new(
            name,
            position.row + 1,
            position.column + 1,
            self.scopes.clone(),
        ));
    }
}
