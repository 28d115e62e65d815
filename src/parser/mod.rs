//! Java parsing with tree-sitter
//!
//! Split into submodules:
//! - `types`: error type
//! - `lower`: conversion of the tree-sitter tree into the [`SyntaxTree`] arena

mod lower;
pub mod types;

pub use types::ParserError;

use std::path::Path;

use crate::syntax::SyntaxTree;

/// Files above this size are refused rather than parsed
const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Java source parser
///
/// Holds only the grammar handle, so a single instance can be shared by
/// reference across rayon workers. Each call builds its own
/// `tree_sitter::Parser`, which is not `Sync`.
///
/// # Example
///
/// ```
/// use jade::parser::JavaParser;
///
/// let parser = JavaParser::new();
/// let tree = parser.parse_source("package a; class A { void run() {} }")?;
/// assert_eq!(tree.package(), Some("a"));
/// assert_eq!(tree.methods().count(), 1);
/// # Ok::<(), jade::parser::ParserError>(())
/// ```
#[derive(Clone)]
pub struct JavaParser {
    language: tree_sitter::Language,
}

impl Default for JavaParser {
    fn default() -> Self {
        Self::new()
    }
}

impl JavaParser {
    pub fn new() -> Self {
        Self {
            language: tree_sitter_java::LANGUAGE.into(),
        }
    }

    /// Parse Java source text into a syntax tree.
    ///
    /// A tree containing `ERROR` or `MISSING` nodes is rejected with
    /// [`ParserError::Syntax`] carrying the first offending line.
    pub fn parse_source(&self, source: &str) -> Result<SyntaxTree, ParserError> {
        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&self.language)
            .map_err(|e| ParserError::ParseFailed(format!("{:?}", e)))?;

        let tree = parser
            .parse(source, None)
            .ok_or_else(|| ParserError::ParseFailed("tree-sitter returned no tree".into()))?;

        let root = tree.root_node();
        if root.has_error() {
            let line = lower::first_error_line(root).unwrap_or(1);
            return Err(ParserError::Syntax(line));
        }

        Ok(lower::Lowerer::new(source).lower_program(root))
    }

    /// Read and parse a Java file.
    ///
    /// CRLF line endings are normalized first; line numbers are unaffected.
    pub fn parse_file(&self, path: &Path) -> Result<SyntaxTree, ParserError> {
        let _span = tracing::debug_span!("parse_file", path = %path.display()).entered();

        let meta = std::fs::metadata(path)?;
        if meta.len() > MAX_FILE_SIZE {
            return Err(ParserError::TooLarge(meta.len()));
        }

        let source = match std::fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) if e.kind() == std::io::ErrorKind::InvalidData => {
                return Err(ParserError::NonUtf8(path.display().to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        let source = if source.contains('\r') {
            source.replace("\r\n", "\n")
        } else {
            source
        };

        self.parse_source(&source)
    }
}
