//! Error type for the Java front-end

use thiserror::Error;

/// Errors that can occur while turning Java source into a [`crate::syntax::SyntaxTree`]
#[derive(Error, Debug)]
pub enum ParserError {
    /// The source contains a syntax error; the file is excluded from analysis
    #[error("Syntax error at line {0}")]
    Syntax(u32),
    /// Tree-sitter could not produce a tree at all
    #[error("Failed to parse: {0}")]
    ParseFailed(String),
    /// File exceeds the size limit and was not read
    #[error("File too large ({0} bytes)")]
    TooLarge(u64),
    /// File is not valid UTF-8
    #[error("Not valid UTF-8: {0}")]
    NonUtf8(String),
    /// File read error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
