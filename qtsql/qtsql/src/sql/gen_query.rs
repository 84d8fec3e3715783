//! Translates a registered source into the table expression of the outer
//! query: the bare table, or a subquery with the joins its paths need.

use super::ast::{Comparand, JoinClause, JoinEqCondition, SelectClause, SelectColumn};
use crate::lr::quote_sql_string;
use crate::metadata::{
    ENUM_NAME_COLUMN, ENUM_VALUE_NAME_COLUMN, ORDER_INDEX_COLUMN, REFERENCE_PROPERTY,
};
use crate::semantic::{EntityGraph, EntityId, QueryEntity, QueryEntityProperty};
use crate::utils::NameGenerator;
use crate::{Error, Result};

/// Renders `<table> as <alias>` for the source registered under `alias`.
pub(super) fn translate_source(
    graph: &mut EntityGraph,
    alias: &str,
    enum_mappings_table: &str,
) -> Result<String> {
    let Some(root) = graph.root(alias) else {
        return Err(Error::new_assert(format!(
            "source `{alias}` was never registered"
        )));
    };

    let (entities, tables) = graph.split_for_emit();
    let entity = &entities[root.0];

    if !entity.has_nested() {
        return Ok(format!("{} as {alias}", entity.mapping.db_table_name));
    }

    let mut select = SelectClause::new(
        entity.mapping.db_table_name.as_str(),
        entity.alias.as_str(),
    );
    let mut ctx = Context {
        entities,
        tables,
        enum_mappings_table,
    };
    ctx.add_entity(root, &mut select)?;

    log::debug!("source {alias} needs {} joins", select.joins.len());
    Ok(format!("({select}) as {alias}"))
}

struct Context<'a, 'm> {
    entities: &'a [QueryEntity<'m>],
    tables: &'a mut NameGenerator,
    enum_mappings_table: &'a str,
}

impl<'a, 'm> Context<'a, 'm> {
    /// Adds the columns of the entity and of everything nested in it, depth
    /// first, in the order the properties were referenced.
    fn add_entity(&mut self, id: EntityId, select: &mut SelectClause) -> Result<()> {
        let entities = self.entities;
        let entity = &entities[id.0];

        for property in &entity.properties {
            self.add_property(entity, property, select)?;
        }
        Ok(())
    }

    fn add_property(
        &mut self,
        entity: &'a QueryEntity<'m>,
        property: &'a QueryEntityProperty<'m>,
        select: &mut SelectClause,
    ) -> Result<()> {
        let column = &property.mapping.column_name;

        if property.selected {
            if entity.mapping.is_enumeration() {
                // enumeration values are stored by order; their names live
                // in the lookup table
                let lookup = self.tables.gen();
                select.joins.push(JoinClause {
                    table_name: self.enum_mappings_table.to_string(),
                    table_alias: lookup.clone(),
                    conditions: vec![
                        JoinEqCondition {
                            column: ENUM_NAME_COLUMN.to_string(),
                            comparand: Comparand::Constant(quote_sql_string(
                                entity.mapping.object_name(),
                            )),
                        },
                        JoinEqCondition {
                            column: ORDER_INDEX_COLUMN.to_string(),
                            comparand: Comparand::Column {
                                table: entity.alias.clone(),
                                column: column.clone(),
                            },
                        },
                    ],
                });
                select.columns.push(SelectColumn {
                    table: lookup,
                    name: ENUM_VALUE_NAME_COLUMN.to_string(),
                    alias: property.alias.clone(),
                });
                return Ok(());
            }

            select.columns.push(SelectColumn {
                table: entity.alias.clone(),
                name: column.clone(),
                alias: property.alias.clone(),
            });
        }

        let Some(nested_id) = property.nested else {
            return Ok(());
        };
        let entities = self.entities;
        let nested = &entities[nested_id.0];

        let Some(reference) = nested.mapping.property(REFERENCE_PROPERTY) else {
            return Err(Error::new_assert(format!(
                "nested table `{}` has no reference property",
                nested.mapping.query_name
            )));
        };
        select.joins.push(JoinClause {
            table_name: nested.mapping.db_table_name.clone(),
            table_alias: nested.alias.clone(),
            conditions: vec![JoinEqCondition {
                column: reference.column_name.clone(),
                comparand: Comparand::Column {
                    table: entity.alias.clone(),
                    column: column.clone(),
                },
            }],
        });

        self.add_entity(nested_id, select)
    }
}
