use std::fmt::Debug;

use serde::Serialize;

use crate::span::Span;


/// A qtsql error. Used internally, exposed as qtsql::ErrorMessage.
#[derive(Debug, Clone)]
pub struct Error {
    /// Message kind. Currently only Error is implemented.
    pub kind: MessageKind,
    pub span: Option<Span>,
    pub reason: Reason,
    pub hints: Vec<String>,
    /// Machine readable identifier error code eg, "E0001"
    pub code: Option<&'static str>,
}

/// Multiple qtsql errors. Used internally, exposed as qtsql::ErrorMessages.
#[derive(Debug, Clone)]
pub struct Errors(pub Vec<Error>);

/// Compile message kind. Currently only Error is implemented.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum MessageKind {
    Error,
    Warning,
    Lint,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reason {
    Simple(String),
    Expected {
        who: Option<String>,
        expected: String,
        found: String,
    },
    Unexpected {
        found: String,
    },
    NotFound {
        name: String,
        namespace: String,
    },
    /// A builder received a second projection.
    DuplicateProjection,
    /// Two sources were registered under the same alias.
    DuplicateAlias {
        alias: String,
    },
    UnknownAlias {
        alias: String,
        path: String,
    },
    /// A property path without an alias segment.
    MalformedPropertyPath {
        path: String,
    },
    UnknownFunction {
        name: String,
        path: String,
    },
    FunctionScopeMismatch {
        function: String,
        scope: String,
        supported: String,
        path: String,
    },
    /// A table mapping has no property of this name.
    UnknownProperty {
        property: String,
        table: String,
        path: String,
    },
    /// A property was traversed, but it doesn't reference another table.
    MissingNestedMapping {
        property: String,
        path: String,
    },
    Bug {
        details: Option<String>,
    },
}

impl Reason {
    /// Machine readable code for the reasons that have one.
    pub fn code(&self) -> Option<&'static str> {
        Some(match self {
            Reason::DuplicateProjection => "E0001",
            Reason::UnknownAlias { .. } => "E0002",
            Reason::MalformedPropertyPath { .. } => "E0003",
            Reason::UnknownFunction { .. } => "E0004",
            Reason::FunctionScopeMismatch { .. } => "E0005",
            Reason::MissingNestedMapping { .. } => "E0006",
            Reason::DuplicateAlias { .. } => "E0007",
            Reason::NotFound { .. } => "E0008",
            Reason::UnknownProperty { .. } => "E0009",
            _ => return None,
        })
    }
}

impl Error {
    pub fn new(reason: Reason) -> Self {
        Error {
            kind: MessageKind::Error,
            span: None,
            code: reason.code(),
            reason,
            hints: Vec::new(),
        }
    }

    pub fn new_simple<S: ToString>(reason: S) -> Self {
        Error::new(Reason::Simple(reason.to_string()))
    }

    /// Used for things that you *think* should never happen, but are not sure.
    pub fn new_assert<S: ToString>(details: S) -> Self {
        Error::new(Reason::Bug {
            details: Some(details.to_string()),
        })
    }
}

impl std::fmt::Display for Reason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Reason::Simple(text) => f.write_str(text),
            Reason::Expected {
                who,
                expected,
                found,
            } => {
                if let Some(who) = who {
                    write!(f, "{who} ")?;
                }
                write!(f, "expected {expected}, but found {found}")
            }
            Reason::Unexpected { found } => write!(f, "unexpected {found}"),
            Reason::NotFound { name, namespace } => write!(f, "{namespace} `{name}` not found"),
            Reason::DuplicateProjection => f.write_str("projection already set"),
            Reason::DuplicateAlias { alias } => {
                write!(f, "alias `{alias}` is already used by another source")
            }
            Reason::UnknownAlias { alias, path } => {
                write!(f, "can't find query table by alias `{alias}` in `{path}`")
            }
            Reason::MalformedPropertyPath { path } => {
                write!(f, "property path requires an alias, found `{path}`")
            }
            Reason::UnknownFunction { name, path } => {
                write!(f, "unexpected function `{name}` for `{path}`")
            }
            Reason::FunctionScopeMismatch {
                function,
                scope,
                supported,
                path,
            } => write!(
                f,
                "function `{function}` not supported for scope `{scope}` in `{path}`, it is only supported for {supported}"
            ),
            Reason::UnknownProperty {
                property,
                table,
                path,
            } => write!(f, "table `{table}` has no property `{property}`, in `{path}`"),
            Reason::MissingNestedMapping { property, path } => {
                write!(f, "no table mapping for property `{property}` in `{path}`")
            }
            Reason::Bug { details } => {
                write!(f, "internal compiler error")?;
                if let Some(details) = details {
                    write!(f, "; {details}")?;
                }
                Ok(())
            }
        }
    }
}

impl From<Error> for Errors {
    fn from(error: Error) -> Self {
        Errors(vec![error])
    }
}

// Needed for anyhow
impl std::error::Error for Error {}

// Needed for anyhow
impl std::error::Error for Errors {}

// Needed for StdError
impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Debug::fmt(&self, f)
    }
}

// Needed for StdError
impl std::fmt::Display for Errors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Debug::fmt(&self, f)
    }
}

pub trait WithErrorInfo: Sized {
    fn push_hint<S: Into<String>>(self, hint: S) -> Self;

    fn with_hints<S: Into<String>, I: IntoIterator<Item = S>>(self, hints: I) -> Self;

    fn with_span(self, span: Option<Span>) -> Self;

    fn with_span_fallback(self, span: Option<Span>) -> Self;

    fn with_code(self, code: &'static str) -> Self;
}

impl WithErrorInfo for Error {
    fn push_hint<S: Into<String>>(mut self, hint: S) -> Self {
        self.hints.push(hint.into());
        self
    }

    fn with_hints<S: Into<String>, I: IntoIterator<Item = S>>(mut self, hints: I) -> Self {
        self.hints = hints.into_iter().map(|x| x.into()).collect();
        self
    }

    fn with_span(mut self, span: Option<Span>) -> Self {
        self.span = span;
        self
    }

    fn with_code(mut self, code: &'static str) -> Self {
        self.code = Some(code);
        self
    }

    fn with_span_fallback(mut self, span: Option<Span>) -> Self {
        self.span = self.span.or(span);
        self
    }
}

impl<T, E: WithErrorInfo> WithErrorInfo for Result<T, E> {
    fn push_hint<S: Into<String>>(self, hint: S) -> Self {
        self.map_err(|e| e.push_hint(hint))
    }

    fn with_hints<S: Into<String>, I: IntoIterator<Item = S>>(self, hints: I) -> Self {
        self.map_err(|e| e.with_hints(hints))
    }

    fn with_span(self, span: Option<Span>) -> Self {
        self.map_err(|e| e.with_span(span))
    }

    fn with_span_fallback(self, span: Option<Span>) -> Self {
        self.map_err(|e| e.with_span_fallback(span))
    }

    fn with_code(self, code: &'static str) -> Self {
        self.map_err(|e| e.with_code(code))
    }
}
