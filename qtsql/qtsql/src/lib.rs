//! # qtsql
//!
//! Compiler from the intermediate query text of a business-data platform to
//! SQL over the platform's physical tables.
//!
//! Queries are written against the platform's names (`Справочник.Контрагенты`,
//! `src.Владелец.Наименование`). Table metadata, supplied through a
//! [metadata::TableMappingSource], maps them to database tables and columns.
//! Property paths that walk through references become left joins inside a
//! subquery that replaces the source table.
//!
//! ```ascii
//!    QueryBuilder
//!         │ build
//!         ▼
//!   intermediate text
//!         │ query_to_tokens / query_to_pr
//!         ▼
//!     PR (fragments)
//!         │ pr_to_sql
//!         ▼
//!        SQL
//! ```
//!
//! You probably want to start with [compile]:
//!
//! ```ignore
//! let store = qtsql::metadata::MappingStore::from_yaml(&schema)?;
//! let sql = qtsql::compile(
//!     "ВЫБРАТЬ src.ИНН ИЗ Справочник.Контрагенты КАК src",
//!     &store,
//!     &qtsql::Options::default(),
//! )?;
//! assert_eq!(sql, "select src._Fld2040 from _Reference112 as src");
//! ```

#![forbid(unsafe_code)]
#![allow(clippy::result_large_err)]

use anstream::adapter::strip_str;
use serde::{Deserialize, Serialize};

pub use error_message::{ErrorMessage, ErrorMessages, SourceLocation};
pub use qtsql_parser::error::{Error, Errors, MessageKind, Reason, WithErrorInfo};
pub use qtsql_parser::lexer::lr;
pub use qtsql_parser::parser::pr;
pub use qtsql_parser::span::Span;

pub mod builder;
pub mod debug;
mod error_message;
pub mod metadata;
pub mod semantic;
pub mod sql;
pub mod utils;

use metadata::TableMappingSource;

pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Version of the compiler, as recorded in debug logs.
pub fn compiler_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Compile intermediate query text into an SQL string.
///
/// This is a wrapper for:
/// - [query_to_pr]: lex and parse the text into fragments.
/// - [pr_to_sql]: register sources, resolve property paths and emit SQL.
///
/// Each call resolves against a fresh entity graph, so calls are
/// independent and may run concurrently over a shared `mappings`.
pub fn compile(
    query: &str,
    mappings: &dyn TableMappingSource,
    options: &Options,
) -> Result<String, ErrorMessages> {
    debug::log_entry(|| debug::DebugEntryKind::ReprQuery(query.to_string()));

    let result = parse(query).and_then(|pr| {
        let resolution = semantic::resolve(pr, mappings)?;
        Ok(sql::compile(resolution, options)?)
    });

    result.map_err(|e| compose(ErrorMessages::from(e), query, options))
}

/// Compilation options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Options {
    /// Pass generated SQL string through a formatter that splits it
    /// into multiple lines and prettifies indentation and spacing.
    ///
    /// Defaults to false.
    pub format: bool,

    /// Table that maps stored enumeration orders to value names.
    ///
    /// Defaults to [metadata::ENUM_MAPPINGS_TABLE].
    pub enum_mappings_table: String,

    /// Whether to use ANSI colors in error messages.
    pub display: DisplayOptions,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            format: false,
            enum_mappings_table: metadata::ENUM_MAPPINGS_TABLE.to_string(),
            display: DisplayOptions::AnsiColor,
        }
    }
}

impl Options {
    pub fn with_format(mut self, format: bool) -> Self {
        self.format = format;
        self
    }

    pub fn no_format(self) -> Self {
        self.with_format(false)
    }

    pub fn with_enum_mappings_table<S: Into<String>>(mut self, table: S) -> Self {
        self.enum_mappings_table = table.into();
        self
    }

    pub fn with_display(mut self, display: DisplayOptions) -> Self {
        self.display = display;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::EnumString)]
#[strum(serialize_all = "snake_case")]
#[non_exhaustive]
pub enum DisplayOptions {
    /// Plain text
    Plain,
    /// With ANSI colors
    AnsiColor,
}

/// Lex query text into Lexer Representation.
pub fn query_to_tokens(query: &str) -> Result<lr::Tokens, ErrorMessages> {
    debug::log_stage(debug::Stage::Parsing(debug::StageParsing::Lexer));
    let tokens = qtsql_parser::lexer::lex_source(query)
        .map_err(|e| ErrorMessages::from(e).composed("", query))?;

    debug::log_entry(|| debug::DebugEntryKind::ReprLr(tokens.clone()));
    Ok(tokens)
}

/// Parse query text into Parser Representation.
pub fn query_to_pr(query: &str) -> Result<pr::Query, ErrorMessages> {
    parse(query).map_err(|e| ErrorMessages::from(e).composed("", query))
}

/// Resolve the fragments against table metadata and generate SQL.
///
/// Errors carry spans but no display, since the query text isn't available.
pub fn pr_to_sql(
    pr: pr::Query,
    mappings: &dyn TableMappingSource,
    options: &Options,
) -> Result<String, ErrorMessages> {
    semantic::resolve(pr, mappings)
        .and_then(|resolution| sql::compile(resolution, options))
        .map_err(ErrorMessages::from)
}

fn parse(query: &str) -> Result<pr::Query, Errors> {
    debug::log_stage(debug::Stage::Parsing(debug::StageParsing::Lexer));
    let tokens = qtsql_parser::lexer::lex_source(query).map_err(Errors)?;
    debug::log_entry(|| debug::DebugEntryKind::ReprLr(tokens.clone()));

    debug::log_stage(debug::Stage::Parsing(debug::StageParsing::Parser));
    let pr = qtsql_parser::parser::parse_lr_to_pr(query, tokens.0).map_err(Errors)?;
    debug::log_entry(|| debug::DebugEntryKind::ReprPr(pr.clone()));

    Ok(pr)
}

fn compose(errors: ErrorMessages, query: &str, options: &Options) -> ErrorMessages {
    let error_messages = errors.composed("", query);
    match options.display {
        DisplayOptions::AnsiColor => error_messages,
        DisplayOptions::Plain => ErrorMessages {
            inner: error_messages
                .inner
                .into_iter()
                .map(|e| ErrorMessage {
                    display: e.display.map(|s| strip_str(&s).to_string()),
                    ..e
                })
                .collect(),
        },
    }
}

/// JSON serialization and deserialization functions
pub mod json {
    use super::*;

    /// JSON serialization
    pub fn from_pr(pr: &pr::Query) -> Result<String, ErrorMessages> {
        serde_json::to_string(pr).map_err(convert_json_err)
    }

    /// JSON deserialization
    pub fn to_pr(json: &str) -> Result<pr::Query, ErrorMessages> {
        serde_json::from_str(json).map_err(convert_json_err)
    }

    fn convert_json_err(err: serde_json::Error) -> ErrorMessages {
        ErrorMessages::from(Error::new_simple(err.to_string()))
    }
}
