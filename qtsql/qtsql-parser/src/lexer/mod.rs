use chumsky::error::Simple;
use chumsky::prelude::*;

use self::lr::{Literal, Token, TokenKind, Tokens};
use crate::error::{Error, Reason, WithErrorInfo};
use crate::span::Span;

pub mod lr;

pub(crate) type LexError = Simple<char>;

/// Lex query text into tokens. Whitespace is dropped; comments are kept.
pub fn lex_source(source: &str) -> Result<Tokens, Vec<Error>> {
    lexer().parse(source).map(Tokens).map_err(|errors| {
        errors
            .into_iter()
            .map(|e| convert_lexer_error(source, e))
            .collect()
    })
}

pub fn lexer() -> impl Parser<char, Vec<Token>, Error = LexError> {
    let whitespace = filter(|x: &char| x.is_whitespace()).repeated().ignored();

    let comment = just("//")
        .ignore_then(none_of("\r\n").repeated())
        .collect::<String>()
        .map(TokenKind::Comment);

    let operator = choice((just("<>"), just("<="), just(">="), just("!=")))
        .map(|op: &str| TokenKind::Operator(op.to_string()));

    let control = one_of("()[],.;*=<>+-/%").map(TokenKind::Control);

    let param = just('&').ignore_then(ident_part()).map(TokenKind::Param);

    let literal = literal().map(TokenKind::Literal);

    let ident = ident_part().map(TokenKind::Ident);

    let token = choice((comment, operator, control, param, literal, ident));

    whitespace
        .clone()
        .ignore_then(token.map_with_span(|kind, span| Token { kind, span }))
        .repeated()
        .then_ignore(whitespace)
        .then_ignore(end())
}

pub fn ident_part() -> impl Parser<char, String, Error = LexError> + Clone {
    filter(|c: &char| c.is_alphabetic() || *c == '_')
        .chain::<char, _, _>(filter(|c: &char| c.is_alphanumeric() || *c == '_').repeated())
        .collect()
}

pub(crate) fn literal() -> impl Parser<char, Literal, Error = LexError> + Clone {
    let number = text::digits(10)
        .then(just('.').ignore_then(text::digits(10)).or_not())
        .map(|(int, frac): (String, Option<String>)| match frac {
            Some(frac) => format!("{int}.{frac}"),
            None => int,
        })
        .map(Literal::Number)
        .labelled("number");

    let string = quoted_string('"').map(Literal::String);

    let single_quoted = quoted_string('\'').map(Literal::SingleQuoted);

    choice((number, string, single_quoted))
}

/// A string delimited by `quote`, where a doubled `quote` stands for itself.
pub(crate) fn quoted_string(quote: char) -> impl Parser<char, String, Error = LexError> + Clone {
    let escaped = just(quote).then(just(quote)).to(quote);

    just(quote)
        .ignore_then(escaped.or(filter(move |c: &char| *c != quote)).repeated())
        .then_ignore(just(quote))
        .collect::<String>()
        .labelled("string")
}

fn convert_lexer_error(source: &str, e: LexError) -> Error {
    // Spans are in chars rather than bytes, so we can't index into the str.
    let span = e.span();
    let found: String = source
        .chars()
        .skip(span.start)
        .take(span.end - span.start)
        .collect();

    let found = if found.is_empty() {
        "end of input".to_string()
    } else {
        format!("`{found}`")
    };

    Error::new(Reason::Unexpected { found }).with_span(Some(Span::from(span)))
}
