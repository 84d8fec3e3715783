//! Assembles intermediate query text in the platform's vocabulary from a
//! structured description of a query.
//!
//! ```ignore
//! let mut builder = QueryBuilder::new();
//! builder.set_source(QuerySource::Name("Справочник.Контрагенты".into()));
//! let p = builder.add_parameter(Value::String("7701".into()));
//! builder.add_where_part(format!("src.ИНН = &{p}"));
//! let query = builder.build()?;
//! ```

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::metadata::{ConfigurationName, TableMappingSource, REFERENCE_PROPERTY};
use crate::{Error, ErrorMessages, Options, Reason, Result};

/// Alias of the source in the generated text.
pub const SOURCE_ALIAS: &str = "src";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum QuerySource {
    /// A query name, such as `Справочник.Контрагенты`.
    Name(String),
    Type(ConfigurationName),
}

/// Explicit selection, as a list of field expressions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    pub fields: Vec<String>,
}

impl Projection {
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Projection {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    pub fn selection(&self) -> String {
        self.fields.join(", ")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ordering {
    pub field: String,
    pub ascending: bool,
}

impl Ordering {
    pub fn asc<S: Into<String>>(field: S) -> Self {
        Ordering {
            field: field.into(),
            ascending: true,
        }
    }

    pub fn desc<S: Into<String>>(field: S) -> Self {
        Ordering {
            field: field.into(),
            ascending: false,
        }
    }
}

/// A value bound to a query parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    /// Identity of a reference-carrying entity.
    Reference(String),
}

/// Output of [QueryBuilder::build].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuiltQuery {
    /// The source's configuration name, when it could be resolved.
    pub source: Option<ConfigurationName>,
    pub query_text: String,
    /// Parameters in the order they were added.
    pub parameters: Vec<(String, Value)>,
    pub projection: Option<Projection>,
}

/// SQL ready for execution, with the values of its parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledQuery {
    pub sql: String,
    pub parameters: Vec<(String, Value)>,
}

impl BuiltQuery {
    /// Compiles the query text, carrying the parameters along.
    pub fn compile(
        &self,
        mappings: &dyn TableMappingSource,
        options: &Options,
    ) -> Result<CompiledQuery, ErrorMessages> {
        let sql = crate::compile(&self.query_text, mappings, options)?;
        Ok(CompiledQuery {
            sql,
            parameters: self.parameters.clone(),
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    source_name: Option<String>,
    source: Option<ConfigurationName>,
    table_section: Option<String>,
    projection: Option<Projection>,
    where_parts: Vec<String>,
    parameters: Vec<(String, Value)>,
    orderings: Option<Vec<Ordering>>,
    take: Option<usize>,
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_source(&mut self, source: QuerySource) {
        match source {
            QuerySource::Name(name) => {
                self.source = ConfigurationName::parse(&name);
                self.source_name = Some(name);
            }
            QuerySource::Type(name) => {
                self.source_name = Some(name.fullname());
                self.source = Some(name);
            }
        }
    }

    /// Targets a repeating section of the source instead of its root table.
    pub fn set_table_section<S: Into<String>>(&mut self, name: S) {
        self.table_section = Some(name.into());
    }

    pub fn set_projection(&mut self, projection: Projection) -> Result<()> {
        if self.projection.is_some() {
            return Err(Error::new(Reason::DuplicateProjection));
        }
        self.projection = Some(projection);
        Ok(())
    }

    pub fn add_where_part<S: Into<String>>(&mut self, part: S) {
        self.where_parts.push(part.into());
    }

    /// Stores the value under a fresh name and returns the name.
    pub fn add_parameter(&mut self, value: Value) -> String {
        let name = format!("p{}", self.parameters.len());
        self.parameters.push((name.clone(), value));
        name
    }

    pub fn set_orderings(&mut self, orderings: Vec<Ordering>) {
        self.orderings = Some(orderings);
    }

    pub fn set_take(&mut self, take: usize) {
        self.take = Some(take);
    }

    pub fn build(&self) -> Result<BuiltQuery> {
        let Some(source_name) = &self.source_name else {
            return Err(Error::new_simple("query source is not set"));
        };

        let mut text = String::from("ВЫБРАТЬ ");
        if let Some(take) = self.take {
            text += &format!("ПЕРВЫЕ {take} ");
        }

        let selection = match &self.projection {
            Some(projection) => projection.selection(),
            None if self.source.as_ref().is_some_and(|s| s.has_reference()) => {
                format!("{SOURCE_ALIAS}.{REFERENCE_PROPERTY}")
            }
            None => "*".to_string(),
        };
        text += &selection;

        text += " ИЗ ";
        text += source_name;
        if let Some(section) = &self.table_section {
            text += ".";
            text += section;
        }
        text += &format!(" КАК {SOURCE_ALIAS}");

        match self.where_parts.as_slice() {
            [] => {}
            [part] => text += &format!(" ГДЕ {part}"),
            parts => text += &format!(" ГДЕ ({})", parts.join(" И ")),
        }

        if let Some(orderings) = self.orderings.as_ref().filter(|o| !o.is_empty()) {
            let fields = orderings
                .iter()
                .map(|o| {
                    if o.ascending {
                        o.field.clone()
                    } else {
                        format!("{} УБЫВ", o.field)
                    }
                })
                .join(",");
            text += &format!(" УПОРЯДОЧИТЬ ПО {fields}");
        }

        log::debug!("built query: {text}");

        Ok(BuiltQuery {
            source: self.source.clone(),
            query_text: text,
            parameters: self.parameters.clone(),
            projection: self.projection.clone(),
        })
    }
}
