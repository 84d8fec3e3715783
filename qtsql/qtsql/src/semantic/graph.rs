//! Arena of the query entities instantiated during one compilation.

use serde::Serialize;

use crate::metadata::{PropertyMapping, TableMapping, TableMappingSource, REFERENCE_PROPERTY};
use crate::utils::{eq_ignore_case, NameGenerator};
use crate::{Error, Reason, Result, WithErrorInfo};

/// Alias of a root entity inside its own subquery.
pub const MAIN_TABLE_ALIAS: &str = "__nested_main_table";

pub const NESTED_TABLE_PREFIX: &str = "__nested_table";
pub const NESTED_FIELD_PREFIX: &str = "__nested_field";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct EntityId(pub(crate) usize);

/// Position of a property within its entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PropertyId {
    pub entity: EntityId,
    pub index: usize,
}

/// One instantiation of a mapped table within a query.
#[derive(Debug, Serialize)]
pub struct QueryEntity<'m> {
    pub mapping: &'m TableMapping,
    pub alias: String,
    /// Properties in the order they were first referenced.
    pub properties: Vec<QueryEntityProperty<'m>>,
}

#[derive(Debug, Serialize)]
pub struct QueryEntityProperty<'m> {
    pub mapping: &'m PropertyMapping,
    /// Output name, for columns addressed from outside the subquery.
    pub alias: Option<String>,
    /// A path ends on this property.
    pub selected: bool,
    /// The entity this property references, once a path went through it.
    pub nested: Option<EntityId>,
}

impl QueryEntity<'_> {
    pub fn has_nested(&self) -> bool {
        self.properties.iter().any(|p| p.nested.is_some())
    }
}

/// The entity graph: a forest of entities, one tree per registered source.
///
/// Nested entities are owned by the property that discovered them, so edges
/// only point from parent to child.
#[derive(Serialize)]
pub struct EntityGraph<'m> {
    #[serde(skip)]
    mappings: &'m dyn TableMappingSource,

    pub(super) entities: Vec<QueryEntity<'m>>,

    /// Registered sources, by alias as written.
    pub(super) roots: Vec<(String, EntityId)>,

    #[serde(skip)]
    pub(super) tables: NameGenerator,
    #[serde(skip)]
    pub(super) fields: NameGenerator,
}

impl<'m> EntityGraph<'m> {
    pub fn new(mappings: &'m dyn TableMappingSource) -> Self {
        EntityGraph {
            mappings,
            entities: Vec::new(),
            roots: Vec::new(),
            tables: NameGenerator::new(NESTED_TABLE_PREFIX),
            fields: NameGenerator::new(NESTED_FIELD_PREFIX),
        }
    }

    /// Registers a source under `alias`. Aliases are unique, ignoring case.
    pub fn register_root(&mut self, alias: &str, query_name: &str) -> Result<EntityId> {
        if self.root(alias).is_some() {
            return Err(Error::new(Reason::DuplicateAlias {
                alias: alias.to_string(),
            }));
        }

        let mapping = self.table_mapping(query_name)?;
        let id = self.push_entity(mapping, MAIN_TABLE_ALIAS.to_string());
        self.roots.push((alias.to_string(), id));

        log::debug!("registered {query_name} as {alias}");
        Ok(id)
    }

    pub fn root(&self, alias: &str) -> Option<EntityId> {
        self.roots
            .iter()
            .find(|(a, _)| eq_ignore_case(a, alias))
            .map(|(_, id)| *id)
    }

    pub fn roots(&self) -> impl Iterator<Item = (&str, EntityId)> {
        self.roots.iter().map(|(alias, id)| (alias.as_str(), *id))
    }

    pub fn entity(&self, id: EntityId) -> &QueryEntity<'m> {
        &self.entities[id.0]
    }

    pub fn property(&self, id: PropertyId) -> &QueryEntityProperty<'m> {
        &self.entity(id.entity).properties[id.index]
    }

    pub(super) fn property_mut(&mut self, id: PropertyId) -> &mut QueryEntityProperty<'m> {
        &mut self.entities[id.entity.0].properties[id.index]
    }

    /// Returns the entity's property of this name, instantiating it on first
    /// use. `path` is the property path being resolved, for errors.
    pub fn get_or_create_property(
        &mut self,
        entity: EntityId,
        name: &str,
        path: &str,
    ) -> Result<PropertyId> {
        let query_entity = &self.entities[entity.0];

        let existing = query_entity
            .properties
            .iter()
            .position(|p| eq_ignore_case(&p.mapping.property_name, name));
        if let Some(index) = existing {
            return Ok(PropertyId { entity, index });
        }

        let table = query_entity.mapping;
        let Some(mapping) = table.property(name) else {
            return Err(Error::new(Reason::UnknownProperty {
                property: name.to_string(),
                table: table.query_name.clone(),
                path: path.to_string(),
            }));
        };

        let properties = &mut self.entities[entity.0].properties;
        properties.push(QueryEntityProperty {
            mapping,
            alias: None,
            selected: false,
            nested: None,
        });
        Ok(PropertyId {
            entity,
            index: properties.len() - 1,
        })
    }

    /// Returns the entity referenced by the property, instantiating it the
    /// first time a path goes through the property.
    pub fn get_or_create_nested(&mut self, property: PropertyId, path: &str) -> Result<EntityId> {
        let query_property = self.property(property);
        if let Some(nested) = query_property.nested {
            return Ok(nested);
        }

        let mapping = query_property.mapping;
        let Some(nested_table) = mapping.nested_table() else {
            return Err(Error::new(Reason::MissingNestedMapping {
                property: mapping.property_name.clone(),
                path: path.to_string(),
            }));
        };

        let table = self
            .table_mapping(nested_table)
            .push_hint(format!("referenced by `{path}`"))?;

        // the join to a nested entity is made on its reference
        if table.property(REFERENCE_PROPERTY).is_none() {
            return Err(Error::new(Reason::UnknownProperty {
                property: REFERENCE_PROPERTY.to_string(),
                table: table.query_name.clone(),
                path: path.to_string(),
            }));
        }

        let alias = self.tables.gen();
        let id = self.push_entity(table, alias);
        self.property_mut(property).nested = Some(id);

        Ok(id)
    }

    fn table_mapping(&self, query_name: &str) -> Result<&'m TableMapping> {
        let mappings: &'m dyn TableMappingSource = self.mappings;
        mappings.table_mapping(query_name).ok_or_else(|| {
            Error::new(Reason::NotFound {
                name: query_name.to_string(),
                namespace: "table".to_string(),
            })
        })
    }

    fn push_entity(&mut self, mapping: &'m TableMapping, alias: String) -> EntityId {
        self.entities.push(QueryEntity {
            mapping,
            alias,
            properties: Vec::new(),
        });
        EntityId(self.entities.len() - 1)
    }

    /// Entities for reading, plus the table alias generator for the joins
    /// added while emitting SQL.
    pub(crate) fn split_for_emit(&mut self) -> (&[QueryEntity<'m>], &mut NameGenerator) {
        (&self.entities, &mut self.tables)
    }
}
