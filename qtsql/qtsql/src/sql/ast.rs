//! The few SQL constructs the emitter synthesizes: a select over one table,
//! with left joins.

use std::fmt::{self, Display, Formatter};

use itertools::Itertools;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectClause {
    pub table_name: String,
    pub table_alias: String,
    pub columns: Vec<SelectColumn>,
    pub joins: Vec<JoinClause>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectColumn {
    pub table: String,
    pub name: String,
    pub alias: Option<String>,
}

/// `left join <table> as <alias> on <conditions>`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JoinClause {
    pub table_name: String,
    pub table_alias: String,
    /// Conjuncts, all on columns of the joined table.
    pub conditions: Vec<JoinEqCondition>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JoinEqCondition {
    pub column: String,
    pub comparand: Comparand,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Comparand {
    /// Already quoted or otherwise valid SQL.
    Constant(String),
    Column { table: String, column: String },
}

impl SelectClause {
    pub fn new<S: Into<String>>(table_name: S, table_alias: S) -> Self {
        SelectClause {
            table_name: table_name.into(),
            table_alias: table_alias.into(),
            columns: Vec::new(),
            joins: Vec::new(),
        }
    }
}

impl Display for SelectClause {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "select {} from {} as {}",
            self.columns.iter().join(", "),
            self.table_name,
            self.table_alias
        )?;
        for join in &self.joins {
            write!(f, " {join}")?;
        }
        Ok(())
    }
}

impl Display for SelectColumn {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.table, self.name)?;
        if let Some(alias) = &self.alias {
            write!(f, " as {alias}")?;
        }
        Ok(())
    }
}

impl Display for JoinClause {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let conditions = self
            .conditions
            .iter()
            .map(|c| format!("{}.{} = {}", self.table_alias, c.column, c.comparand))
            .join(" and ");
        write!(
            f,
            "left join {} as {} on {conditions}",
            self.table_name, self.table_alias
        )
    }
}

impl Display for Comparand {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Comparand::Constant(value) => f.write_str(value),
            Comparand::Column { table, column } => write!(f, "{table}.{column}"),
        }
    }
}
