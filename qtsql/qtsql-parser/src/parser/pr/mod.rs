//! Parser Representation: the small AST of the intermediate query text.
//!
//! The intermediate grammar is only partially structured: the compiler cares
//! about table sources, property paths and the six normalizable keywords.
//! Every other token is kept verbatim, so the query can be re-emitted with
//! its original spelling and spacing.

use enum_as_inner::EnumAsInner;
use serde::{Deserialize, Serialize};

pub use self::keyword::Keyword;
use crate::lexer::lr::Literal;
use crate::span::Span;

mod keyword;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Query {
    pub fragments: Vec<Fragment>,

    /// Whitespace after the last fragment.
    pub trailing: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fragment {
    pub kind: FragmentKind,
    pub span: Span,

    /// Whitespace between the previous fragment and this one.
    pub leading: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, EnumAsInner)]
pub enum FragmentKind {
    Keyword(Keyword),
    Source(Source),
    Property(PropertyRef),
    Literal(Literal),
    /// Any other token, emitted as written.
    Verbatim(String),
}

/// `from <name> as <alias>` or `join <name> as <alias>`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub kind: SourceKind,
    /// Query name segments, such as `["Справочник", "Контрагенты"]`.
    pub name: Vec<String>,
    pub alias: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum SourceKind {
    From,
    Join,
}

/// `alias.prop[.prop...]`, optionally wrapped in a function call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyRef {
    pub function: Option<String>,
    pub path: Vec<String>,
}

impl Source {
    pub fn query_name(&self) -> String {
        self.name.join(".")
    }
}

impl PropertyRef {
    pub fn path_string(&self) -> String {
        self.path.join(".")
    }
}

impl std::fmt::Display for PropertyRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.function {
            Some(function) => write!(f, "{function}({})", self.path_string()),
            None => f.write_str(&self.path_string()),
        }
    }
}
