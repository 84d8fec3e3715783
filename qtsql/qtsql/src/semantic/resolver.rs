use itertools::Itertools;

use super::graph::EntityGraph;
use super::ColumnRef;
use crate::metadata::{Scope, NAME_PROPERTY, ORDER_PROPERTY};
use crate::pr::PropertyRef;
use crate::utils::eq_ignore_case;
use crate::{Error, Reason, Result};

/// Functions that may wrap a property path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::EnumIter)]
pub enum FunctionName {
    /// Redirects a reference to a human-readable (or, for enumerations,
    /// ordering) property of the referenced entity.
    Representation,
}

impl FunctionName {
    /// Matches either spelling, ignoring case.
    pub fn from_name(name: &str) -> Option<Self> {
        use strum::IntoEnumIterator;

        FunctionName::iter()
            .find(|f| eq_ignore_case(f.native(), name) || eq_ignore_case(f.english(), name))
    }

    pub fn native(&self) -> &'static str {
        match self {
            FunctionName::Representation => "ПРЕДСТАВЛЕНИЕ",
        }
    }

    pub fn english(&self) -> &'static str {
        match self {
            FunctionName::Representation => "REPRESENTATION",
        }
    }

    pub fn supported_scopes(&self) -> &'static [Scope] {
        match self {
            FunctionName::Representation => &[Scope::Enumeration, Scope::Catalog],
        }
    }

    /// The property the function reads on an entity of `scope`.
    fn target_property(&self, scope: Scope) -> Option<&'static str> {
        match (self, scope) {
            (FunctionName::Representation, Scope::Catalog) => Some(NAME_PROPERTY),
            (FunctionName::Representation, Scope::Enumeration) => Some(ORDER_PROPERTY),
            _ => None,
        }
    }
}

impl EntityGraph<'_> {
    /// Resolves `alias.prop[.prop...]`, optionally wrapped in a function,
    /// into the column the outer query should read.
    ///
    /// Each hop but the last goes through a nested entity. Columns that are
    /// read through a hop, or through a function, get a synthetic alias so
    /// the outer query can address them.
    pub fn resolve_property(&mut self, property: &PropertyRef) -> Result<ColumnRef> {
        let path = property.path_string();

        let [alias, hops @ .., last] = property.path.as_slice() else {
            return Err(Error::new(Reason::MalformedPropertyPath { path }));
        };

        let function = match &property.function {
            Some(name) => Some(FunctionName::from_name(name).ok_or_else(|| {
                Error::new(Reason::UnknownFunction {
                    name: name.clone(),
                    path: path.clone(),
                })
            })?),
            None => None,
        };

        let Some(mut entity) = self.root(alias) else {
            return Err(Error::new(Reason::UnknownAlias {
                alias: alias.clone(),
                path,
            }));
        };

        let mut needs_alias = false;
        for hop in hops {
            let property = self.get_or_create_property(entity, hop, &path)?;
            entity = self.get_or_create_nested(property, &path)?;
            needs_alias = true;
        }

        let mut terminal = self.get_or_create_property(entity, last, &path)?;

        if let Some(function) = function {
            let nested = self.get_or_create_nested(terminal, &path)?;
            let scope = self.entity(nested).mapping.scope;

            let Some(target) = function.target_property(scope) else {
                return Err(Error::new(Reason::FunctionScopeMismatch {
                    function: function.native().to_string(),
                    scope: scope.to_string(),
                    supported: function
                        .supported_scopes()
                        .iter()
                        .map(|s| format!("`{s}`"))
                        .join(" and "),
                    path,
                }));
            };
            terminal = self.get_or_create_property(nested, target, &path)?;
            needs_alias = true;
        }

        let fields = &mut self.fields;
        let terminal = &mut self.entities[terminal.entity.0].properties[terminal.index];
        terminal.selected = true;
        if terminal.alias.is_none() && needs_alias {
            terminal.alias = Some(fields.gen());
        }

        let column = match &terminal.alias {
            Some(alias) => alias.clone(),
            None => terminal.mapping.column_name.clone(),
        };
        log::debug!("resolved {property} to {alias}.{column}");

        Ok(ColumnRef {
            table: alias.clone(),
            column,
        })
    }
}
