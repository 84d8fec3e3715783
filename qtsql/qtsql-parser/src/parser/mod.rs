use chumsky::error::Error as _;
use chumsky::error::{Simple, SimpleReason};
use chumsky::prelude::*;
use chumsky::Stream;
use itertools::Itertools;

use self::pr::{FragmentKind, Keyword, PropertyRef, Source, SourceKind};
use crate::error::{Error, Reason, WithErrorInfo};
use crate::lexer::lr::{self, TokenKind};
use crate::span::Span;

pub mod pr;

pub(crate) type PError = Simple<TokenKind, Span>;

/// Build the fragment AST from lexed tokens.
///
/// `source` is needed to recover the whitespace between tokens, which the
/// lexer drops.
pub fn parse_lr_to_pr(source: &str, lr: Vec<lr::Token>) -> Result<pr::Query, Vec<Error>> {
    // Comments don't make it into the AST
    let semantic_tokens = lr
        .into_iter()
        .filter(|token| !matches!(token.kind, TokenKind::Comment(_)))
        .map(|token| (token.kind, Span::from(token.span)))
        .collect_vec();

    let len = source.chars().count();
    let stream = Stream::from_iter(Span::new(len, len), semantic_tokens.into_iter());

    let fragments = query().parse(stream).map_err(|errors| {
        log::debug!("parse errors: {errors:?}");
        errors.into_iter().map(convert_parser_error).collect_vec()
    })?;

    Ok(with_whitespace(source, fragments))
}

fn query() -> impl Parser<TokenKind, Vec<(FragmentKind, Span)>, Error = PError> {
    let literal = filter_map(|span, token: TokenKind| match token {
        TokenKind::Literal(literal) => Ok(FragmentKind::Literal(literal)),
        _ => Err(PError::expected_input_found(span, None, Some(token))),
    });

    let verbatim = any().map(|token: TokenKind| FragmentKind::Verbatim(token.to_string()));

    let keyword_fragment = filter_map(|span, token: TokenKind| match &token {
        TokenKind::Ident(word) => match Keyword::from_word(word) {
            Some(kw) => Ok(FragmentKind::Keyword(kw)),
            None => Err(PError::expected_input_found(span, None, Some(token))),
        },
        _ => Err(PError::expected_input_found(span, None, Some(token))),
    });

    choice((
        source().map(FragmentKind::Source),
        property().map(FragmentKind::Property),
        keyword_fragment,
        literal,
        verbatim,
    ))
    .map_with_span(|kind, span| (kind, span))
    .repeated()
    .then_ignore(end())
}

/// `from <name> as <alias>`, or the same with `join`.
fn source() -> impl Parser<TokenKind, Source, Error = PError> + Clone {
    let join = filter_map(|span, token: TokenKind| match &token {
        TokenKind::Ident(word) if word.eq_ignore_ascii_case("join") => Ok(SourceKind::Join),
        _ => Err(PError::expected_input_found(span, None, Some(token))),
    });

    keyword(Keyword::From)
        .to(SourceKind::From)
        .or(join)
        .then(ident().separated_by(ctrl('.')).at_least(1))
        .then_ignore(keyword(Keyword::As))
        .then(ident())
        .map(|((kind, name), alias)| Source { kind, name, alias })
        .labelled("source")
}

/// `alias.prop[.prop...]` or `FUNC(alias.prop[.prop...])`.
///
/// A call is only recognized when the function name is written right before
/// the parenthesis; its argument may be a bare identifier, so a path missing
/// its alias can still be reported.
fn property() -> impl Parser<TokenKind, PropertyRef, Error = PError> + Clone {
    let path = ident()
        .then(ctrl('.').ignore_then(ident()).repeated().at_least(1))
        .map(|(first, rest)| std::iter::once(first).chain(rest).collect_vec());

    let function_name = ident()
        .map_with_span(|name, span: Span| (name, span))
        .then(just(TokenKind::Control('(')).map_with_span(|_, span: Span| span))
        .try_map(|((name, name_span), paren_span), span| {
            if name_span.end == paren_span.start && Keyword::from_word(&name).is_none() {
                Ok(name)
            } else {
                Err(PError::custom(span, "not a function call"))
            }
        });

    let call = function_name
        .then(ident().separated_by(ctrl('.')).at_least(1))
        .then_ignore(ctrl(')'))
        .map(|(function, path)| PropertyRef {
            function: Some(function),
            path,
        });

    call.or(path.map(|path| PropertyRef {
        function: None,
        path,
    }))
    .labelled("property")
}

fn ident() -> impl Parser<TokenKind, String, Error = PError> + Clone {
    filter_map(|span, token: TokenKind| match token {
        TokenKind::Ident(ident) => Ok(ident),
        _ => Err(PError::expected_input_found(span, None, Some(token))),
    })
}

fn keyword(kw: Keyword) -> impl Parser<TokenKind, (), Error = PError> + Clone {
    filter_map(move |span, token: TokenKind| match &token {
        TokenKind::Ident(word) if Keyword::from_word(word) == Some(kw) => Ok(()),
        _ => Err(PError::expected_input_found(span, None, Some(token))),
    })
}

fn ctrl(char: char) -> impl Parser<TokenKind, (), Error = PError> + Clone {
    just(TokenKind::Control(char)).ignored()
}

/// Attaches the whitespace between tokens to the fragments following it.
fn with_whitespace(source: &str, fragments: Vec<(FragmentKind, Span)>) -> pr::Query {
    let chars = source.chars().collect_vec();

    // Comments are dropped, along with the whitespace around them.
    let gap = |start: usize, end: usize| -> String {
        let text: String = chars[start..end].iter().collect();
        if text.chars().all(char::is_whitespace) {
            text
        } else {
            " ".to_string()
        }
    };

    let mut position = 0;
    let mut result = Vec::with_capacity(fragments.len());
    for (kind, span) in fragments {
        result.push(pr::Fragment {
            kind,
            leading: gap(position, span.start),
            span,
        });
        position = span.end;
    }

    pr::Query {
        fragments: result,
        trailing: gap(position, chars.len()),
    }
}

fn convert_parser_error(e: PError) -> Error {
    let span = e.span();

    if let SimpleReason::Custom(message) = e.reason() {
        return Error::new_simple(message).with_span(Some(span));
    }

    let found = e
        .found()
        .map(|t| format!("`{t}`"))
        .unwrap_or_else(|| "end of input".to_string());

    let expected = e
        .expected()
        .filter_map(|t| t.as_ref().map(|t| format!("`{t}`")))
        .sorted()
        .collect_vec();

    let reason = if expected.is_empty() {
        Reason::Unexpected { found }
    } else {
        Reason::Expected {
            who: e.label().map(|l| l.to_string()),
            expected: expected.join(" or "),
            found,
        }
    };

    Error::new(reason).with_span(Some(span))
}
