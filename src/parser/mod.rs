pub mod ast;
pub mod layout;
pub mod lexer;
pub mod parse;

pub use lexer::{Lexer, Span, Spanned, Token};
pub use parse::Parser;

use crate::error::ParseError;

/// Lexes, resolves layout and parses a whole source file.
pub fn parse_source(source: &str) -> Result<ast::AstModule, ParseError> {
    let tokens = Lexer::new(source).tokenize()?;
    let tokens = layout::resolve(source, tokens)?;
    Parser::new(&tokens).parse_module()
}
