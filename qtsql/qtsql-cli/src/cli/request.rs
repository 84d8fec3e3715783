use serde::Deserialize;

use qtsql::builder::{BuiltQuery, Ordering, Projection, QueryBuilder, QuerySource, Value};
use qtsql::Result;

/// A query described as a document, for `qtsql build`.
///
/// Parameters are added before the where parts, so the parts can refer to
/// them as `&p0`, `&p1`, ...
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QueryRequest {
    source: String,
    table_section: Option<String>,
    projection: Option<Vec<String>>,
    #[serde(default)]
    parameters: Vec<Value>,
    #[serde(default, rename = "where")]
    where_parts: Vec<String>,
    orderings: Option<Vec<Ordering>>,
    take: Option<usize>,
}

impl QueryRequest {
    pub fn build(self) -> Result<BuiltQuery> {
        let mut builder = QueryBuilder::new();
        builder.set_source(QuerySource::Name(self.source));

        if let Some(section) = self.table_section {
            builder.set_table_section(section);
        }
        if let Some(fields) = self.projection {
            builder.set_projection(Projection::new(fields))?;
        }
        for value in self.parameters {
            builder.add_parameter(value);
        }
        for part in self.where_parts {
            builder.add_where_part(part);
        }
        if let Some(orderings) = self.orderings {
            builder.set_orderings(orderings);
        }
        if let Some(take) = self.take {
            builder.set_take(take);
        }

        builder.build()
    }
}
