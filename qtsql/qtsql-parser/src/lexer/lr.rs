use enum_as_inner::EnumAsInner;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Tokens(pub Vec<Token>);

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    /// Character offsets within the query text.
    pub span: std::ops::Range<usize>,
}

#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize, EnumAsInner)]
pub enum TokenKind {
    Ident(String),
    Literal(Literal),
    /// A parameter such as `&p0`
    Param(String),

    /// Multi-char comparison operators: `<>`, `<=`, `>=`, `!=`
    Operator(String),

    /// single-char control tokens
    Control(char),

    /// A `//` line comment, without the leading slashes.
    Comment(String),
}

#[derive(Debug, EnumAsInner, PartialEq, Eq, Hash, Clone, Serialize, Deserialize, strum::AsRefStr)]
pub enum Literal {
    Number(String),
    /// A string in the platform convention, delimited by `"`, with `""`
    /// standing for a quote inside.
    String(String),
    /// A string in the target convention, delimited by `'`.
    SingleQuoted(String),
}

impl Literal {
    /// Renders the literal in the target dialect, where strings are always
    /// delimited by single quotes.
    pub fn to_sql(&self) -> String {
        match self {
            Literal::Number(n) => n.clone(),
            Literal::String(s) | Literal::SingleQuoted(s) => quote_sql_string(s),
        }
    }
}

/// Quotes a value as a target dialect string literal.
pub fn quote_sql_string(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

impl std::fmt::Display for Literal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Literal::Number(n) => f.write_str(n),
            Literal::String(s) => write!(f, "\"{}\"", s.replace('"', "\"\"")),
            Literal::SingleQuoted(s) => f.write_str(&quote_sql_string(s)),
        }
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenKind::Ident(s) => {
                if s.is_empty() {
                    // FYI this shows up in errors
                    write!(f, "an identifier")
                } else {
                    write!(f, "{s}")
                }
            }
            TokenKind::Literal(lit) => write!(f, "{lit}"),
            TokenKind::Param(name) => write!(f, "&{name}"),
            TokenKind::Operator(op) => f.write_str(op),
            TokenKind::Control(c) => write!(f, "{c}"),
            TokenKind::Comment(s) => write!(f, "//{s}"),
        }
    }
}

impl std::fmt::Debug for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}..{}: {:?}", self.span.start, self.span.end, self.kind)
    }
}
