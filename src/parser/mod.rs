mod common;
mod ruby;

use crate::inflect::Inflector;
use crate::model::{RawUsage, SymbolKind};
use std::path::Path;
use thiserror::Error;

pub use ruby::{ASSOCIATION_METHODS, RubyParser};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Syntax error at {line}:{column}")]
    Syntax { line: usize, column: usize },
    #[error("Failed to load grammar: {0}")]
    Language(String),
    #[error("Failed to parse: {0}")]
    Parse(String),
    #[error("Unsupported language for file: {0}")]
    UnsupportedLanguage(String),
}

/// A constant declared in a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Definition {
    /// Fully qualified, without leading `::`.
    pub name: String,
    pub kind: SymbolKind,
    pub line: usize,
    /// A module that only wraps other declarations of the same file.
    pub namespace_only: bool,
}

/// Everything the engine needs from one parsed source file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedFile {
    pub definitions: Vec<Definition>,
    pub usages: Vec<RawUsage>,
}

pub trait LanguageParser: Send + Sync {
    fn extensions(&self) -> &[&str];
    fn parse_file(&self, path: &str, source: &str) -> Result<ParsedFile, ParseError>;
}

pub struct ParserRegistry {
    parsers: Vec<Box<dyn LanguageParser>>,
}

impl ParserRegistry {
    pub fn new() -> Self {
        Self::with_ruby(RubyParser::new())
    }

    pub fn with_ruby(parser: RubyParser) -> Self {
        Self {
            parsers: vec![Box::new(parser)],
        }
    }

    /// Registry whose Ruby parser also understands `custom_associations`.
    pub fn configured(custom_associations: &[String], inflector: Inflector) -> Self {
        Self::with_ruby(RubyParser::with_associations(custom_associations, inflector))
    }

    pub fn find_parser(&self, path: &str) -> Option<&dyn LanguageParser> {
        let ext = Path::new(path).extension()?.to_str()?;
        self.parsers
            .iter()
            .find(|p| p.extensions().contains(&ext))
            .map(|p| p.as_ref())
    }

    pub fn parse(&self, path: &str, source: &str) -> Result<ParsedFile, ParseError> {
        let parser = self
            .find_parser(path)
            .ok_or_else(|| ParseError::UnsupportedLanguage(path.to_string()))?;
        parser.parse_file(path, source)
    }

    /// Every constant usage in `source`, in document order.
    pub fn extract(&self, path: &str, source: &str) -> Result<Vec<RawUsage>, ParseError> {
        self.parse(path, source).map(|parsed| parsed.usages)
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::new()
    }
}
