use super::ParseError;
use std::cell::RefCell;
use std::thread::LocalKey;
use tree_sitter::{Language, Node, Parser, Tree};

/// Macro to define a thread-local parser. The language is attached lazily by
/// [`parse_tree`], so construction itself cannot fail.
/// Usage: `define_parser!(PARSER_NAME)`
#[macro_export]
macro_rules! define_parser {
    ($name:ident) => {
        thread_local! {
            static $name: std::cell::RefCell<tree_sitter::Parser> =
                std::cell::RefCell::new(tree_sitter::Parser::new());
        }
    };
}

/// Parse `source` with a thread-local parser, attaching `language` on first use.
pub fn parse_tree(
    parser: &'static LocalKey<RefCell<Parser>>,
    language: impl FnOnce() -> Language,
    source: &str,
) -> Result<Tree, ParseError> {
    parser.with(|cell| {
        let mut parser = cell.borrow_mut();
        if parser.language().is_none() {
            parser
                .set_language(&language())
                .map_err(|e| ParseError::Language(e.to_string()))?;
        }
        parser
            .parse(source, None)
            .ok_or_else(|| ParseError::Parse("Failed to parse file".to_string()))
    })
}

/// Innermost ERROR or MISSING node on the first erroneous branch.
///
/// Recovery often wraps a whole construct in one ERROR node; descending
/// points at the token that actually broke the parse.
pub fn first_error(node: Node<'_>) -> Option<Node<'_>> {
    if !node.has_error() && !node.is_missing() {
        return None;
    }
    let mut cursor = node.walk();
    let children: Vec<Node<'_>> = node.children(&mut cursor).collect();
    children
        .into_iter()
        .find_map(first_error)
        .or(Some(node))
}

/// Fail with a positioned syntax error when the tree contains error nodes.
pub fn ensure_well_formed(tree: &Tree) -> Result<(), ParseError> {
    match first_error(tree.root_node()) {
        Some(node) => {
            let position = node.start_position();
            Err(ParseError::Syntax {
                line: position.row + 1,
                column: position.column + 1,
            })
        }
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    define_parser!(TEST_PARSER);

    fn tree(source: &str) -> Tree {
        parse_tree(&TEST_PARSER, || tree_sitter_ruby::LANGUAGE.into(), source).unwrap()
    }

    #[test]
    fn test_error_is_innermost() {
        for source in [
            "module Billing\n  class Invoice\n    def ship(\n      Label\n  end\nend\n",
            "class Foo\n  def bar\n    baz(1,\n  end\nend\n",
            "x = [1, 2\n",
        ] {
            let tree = tree(source);
            let node = first_error(tree.root_node()).unwrap();
            assert!(node.is_error() || node.is_missing());
            let mut cursor = node.walk();
            assert!(
                node.children(&mut cursor)
                    .all(|child| !child.has_error() && !child.is_missing()),
                "error node in {:?} still contains errors",
                source
            );
        }
    }

    #[test]
    fn test_error_position_skips_valid_lines() {
        let err = ensure_well_formed(&tree("puts 1\nputs 2\nfoo(\n")).unwrap_err();
        assert!(matches!(err, ParseError::Syntax { line, .. } if line >= 3));
    }

    #[test]
    fn test_well_formed_tree() {
        assert!(first_error(tree("class Foo; end\n").root_node()).is_none());
    }
}
