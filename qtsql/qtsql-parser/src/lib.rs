pub mod error;
pub mod lexer;
pub mod parser;
pub mod span;

use crate::error::Error;
use crate::parser::pr::Query;

/// Build the fragment AST from intermediate query text.
pub fn parse_source(source: &str) -> Result<Query, Vec<Error>> {
    let tokens = lexer::lex_source(source)?;
    log::debug!("lexed {} tokens", tokens.0.len());

    parser::parse_lr_to_pr(source, tokens.0)
}
