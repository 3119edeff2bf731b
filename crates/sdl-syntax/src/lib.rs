//! Lexing, the AST, and the recursive-descent parser for the SDL grammar.

pub mod ast;
pub mod lex;
pub mod parser;

pub use ast::AstFile;
pub use lex::{lex, Keyword, Spanned, Token};
pub use parser::parse;

use sdl_diagnostics::Diagnostic;

/// Lexes then parses `src`, stopping at the first diagnostic either stage
/// produces (spec.md §4.2, §4.3).
pub fn parse_source(src: &str, file: &str) -> Result<AstFile, Diagnostic> {
    let tokens = lex(src, file)?;
    parse(tokens, file)
}
