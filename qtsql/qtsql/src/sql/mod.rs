//! Backend for translating a resolved query into the target SQL text.

mod ast;
mod gen_query;

pub use ast::{Comparand, JoinClause, JoinEqCondition, SelectClause, SelectColumn};
use sqlformat::{format, FormatOptions, QueryParams};

use crate::debug;
use crate::semantic::{Resolution, ResolvedKind};
use crate::{Options, Result, WithErrorInfo};

/// Translate a resolved query into SQL.
///
/// Fragments are emitted with the whitespace they were written with, so
/// everything the compiler doesn't understand keeps its original spelling.
pub fn compile(resolution: Resolution, options: &Options) -> Result<String> {
    debug::log_stage(debug::Stage::Sql);

    let Resolution {
        fragments,
        trailing,
        mut graph,
    } = resolution;

    let mut sql = String::new();
    for fragment in fragments {
        sql += &fragment.leading;

        match fragment.kind {
            ResolvedKind::Keyword(keyword) => sql += keyword.sql(),
            ResolvedKind::Source { kind, alias } => {
                let table =
                    gen_query::translate_source(&mut graph, &alias, &options.enum_mappings_table)
                        .with_span(Some(fragment.span))?;
                sql += kind.as_ref();
                sql.push(' ');
                sql += &table;
            }
            ResolvedKind::Column(column) => sql += &column.to_string(),
            ResolvedKind::Literal(literal) => sql += &literal.to_sql(),
            ResolvedKind::Verbatim(text) => sql += &text,
        }
    }
    sql += &trailing;

    let sql = if options.format {
        format(&sql, &QueryParams::None, &FormatOptions::default())
    } else {
        sql
    };

    debug::log_entry(|| debug::DebugEntryKind::ReprSql(sql.clone()));
    Ok(sql)
}
