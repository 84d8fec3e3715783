//! Semantic analysis: registers the sources of a query and resolves its
//! property paths, building the entity graph as a side effect.

mod graph;
mod resolver;

use enum_as_inner::EnumAsInner;
use serde::Serialize;

pub use self::graph::{
    EntityGraph, EntityId, PropertyId, QueryEntity, QueryEntityProperty, MAIN_TABLE_ALIAS,
    NESTED_FIELD_PREFIX, NESTED_TABLE_PREFIX,
};
pub use self::resolver::FunctionName;
use crate::debug::{self, DebugEntryKind, Stage, StageSemantic};
use crate::lr::Literal;
use crate::metadata::TableMappingSource;
use crate::pr::{self, FragmentKind, Keyword, SourceKind};
use crate::{Result, Span, WithErrorInfo};

/// A query with every path resolved, ready to be emitted.
pub struct Resolution<'m> {
    pub fragments: Vec<Resolved>,
    pub trailing: String,
    pub graph: EntityGraph<'m>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resolved {
    pub kind: ResolvedKind,
    pub span: Span,
    pub leading: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, EnumAsInner)]
pub enum ResolvedKind {
    Keyword(Keyword),
    /// A registered source. Its SQL depends on the whole graph, so it's only
    /// rendered after all paths are resolved.
    Source {
        kind: SourceKind,
        alias: String,
    },
    Column(ColumnRef),
    Literal(Literal),
    Verbatim(String),
}

/// `table.column`, as read by the outer query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnRef {
    pub table: String,
    pub column: String,
}

impl std::fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.table, self.column)
    }
}

/// Runs source registration, then path resolution, over a fresh graph.
pub fn resolve(query: pr::Query, mappings: &dyn TableMappingSource) -> Result<Resolution<'_>> {
    let mut graph = EntityGraph::new(mappings);

    debug::log_stage(Stage::Semantic(StageSemantic::Sources));
    for fragment in &query.fragments {
        if let FragmentKind::Source(source) = &fragment.kind {
            graph
                .register_root(&source.alias, &source.query_name())
                .with_span(Some(fragment.span))?;
        }
    }

    debug::log_stage(Stage::Semantic(StageSemantic::Paths));
    let mut fragments = Vec::with_capacity(query.fragments.len());
    for fragment in query.fragments {
        let kind = match fragment.kind {
            FragmentKind::Keyword(keyword) => ResolvedKind::Keyword(keyword),
            FragmentKind::Source(source) => ResolvedKind::Source {
                kind: source.kind,
                alias: source.alias,
            },
            FragmentKind::Property(property) => ResolvedKind::Column(
                graph
                    .resolve_property(&property)
                    .with_span(Some(fragment.span))?,
            ),
            FragmentKind::Literal(literal) => ResolvedKind::Literal(literal),
            FragmentKind::Verbatim(text) => ResolvedKind::Verbatim(text),
        };
        fragments.push(Resolved {
            kind,
            span: fragment.span,
            leading: fragment.leading,
        });
    }

    debug::log_entry(|| {
        DebugEntryKind::ReprGraph(serde_json::to_value(&graph).unwrap_or_default())
    });

    Ok(Resolution {
        fragments,
        trailing: query.trailing,
        graph,
    })
}
