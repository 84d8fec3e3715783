//! The schema facts the compiler consumes: which table a query name maps to,
//! which column a property maps to and which table a reference property
//! points at.
//!
//! The compiler only reads metadata through [TableMappingSource]. The
//! [MappingStore] is an in-memory implementation, loadable from YAML or JSON.

mod store;

use serde::{Deserialize, Serialize};

pub use self::store::MappingStore;
use crate::utils::eq_ignore_case;

/// Property holding the identity of a reference-carrying entity.
pub const REFERENCE_PROPERTY: &str = "Ссылка";

/// Display-name property of a catalog.
pub const NAME_PROPERTY: &str = "Наименование";

/// Order-index property of an enumeration.
pub const ORDER_PROPERTY: &str = "Порядок";

/// Shared lookup table translating stored enumeration values into names.
pub const ENUM_MAPPINGS_TABLE: &str = "simple1c__enumMappings";
pub const ENUM_NAME_COLUMN: &str = "enumName";
pub const ORDER_INDEX_COLUMN: &str = "orderIndex";
pub const ENUM_VALUE_NAME_COLUMN: &str = "enumValueName";

/// Answers the compiler's questions about the schema.
///
/// Lookups are expected to be case-insensitive and deterministic for the
/// duration of a compilation.
pub trait TableMappingSource {
    fn table_mapping(&self, query_name: &str) -> Option<&TableMapping>;
}

/// Category of a mapped entity.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::EnumIter,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Scope {
    Catalog,
    Document,
    Enumeration,
    InformationRegister,
    AccumulationRegister,
    AccountingRegister,
    ChartOfAccounts,
    ChartOfCharacteristicTypes,
    /// A repeating section of a document or catalog.
    TableSection,
}

impl Scope {
    /// Whether rows of this scope are addressable through [REFERENCE_PROPERTY].
    pub fn has_reference(&self) -> bool {
        match self {
            Scope::Catalog
            | Scope::Document
            | Scope::Enumeration
            | Scope::ChartOfAccounts
            | Scope::ChartOfCharacteristicTypes => true,
            Scope::InformationRegister
            | Scope::AccumulationRegister
            | Scope::AccountingRegister
            | Scope::TableSection => false,
        }
    }

    /// Prefix of query names of this scope, as in `Справочник.Контрагенты`.
    pub fn native_prefix(&self) -> Option<&'static str> {
        Some(match self {
            Scope::Catalog => "Справочник",
            Scope::Document => "Документ",
            Scope::Enumeration => "Перечисление",
            Scope::InformationRegister => "РегистрСведений",
            Scope::AccumulationRegister => "РегистрНакопления",
            Scope::AccountingRegister => "РегистрБухгалтерии",
            Scope::ChartOfAccounts => "ПланСчетов",
            Scope::ChartOfCharacteristicTypes => "ПланВидовХарактеристик",
            Scope::TableSection => return None,
        })
    }

    pub fn from_native_prefix(prefix: &str) -> Option<Scope> {
        use strum::IntoEnumIterator;

        Scope::iter().find(|scope| {
            scope
                .native_prefix()
                .is_some_and(|p| eq_ignore_case(p, prefix))
        })
    }
}

/// A query name split into its scope and object name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConfigurationName {
    pub scope: Scope,
    pub name: String,
}

impl ConfigurationName {
    pub fn new<S: Into<String>>(scope: Scope, name: S) -> Self {
        ConfigurationName {
            scope,
            name: name.into(),
        }
    }

    /// Parses `Справочник.Контрагенты`. Names with an unknown prefix, or
    /// without one, give `None`.
    pub fn parse(full_name: &str) -> Option<Self> {
        let (prefix, name) = full_name.split_once('.')?;
        if name.is_empty() || name.contains('.') {
            return None;
        }
        let scope = Scope::from_native_prefix(prefix)?;
        Some(ConfigurationName::new(scope, name))
    }

    pub fn fullname(&self) -> String {
        match self.scope.native_prefix() {
            Some(prefix) => format!("{prefix}.{}", self.name),
            None => self.name.clone(),
        }
    }

    pub fn has_reference(&self) -> bool {
        self.scope.has_reference()
    }
}

impl std::fmt::Display for ConfigurationName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.fullname())
    }
}

/// Binds a query name to a physical table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableMapping {
    pub query_name: String,
    pub db_table_name: String,
    pub scope: Scope,
    #[serde(default)]
    pub properties: Vec<PropertyMapping>,
}

impl TableMapping {
    pub fn new<S: Into<String>>(query_name: S, db_table_name: S, scope: Scope) -> Self {
        TableMapping {
            query_name: query_name.into(),
            db_table_name: db_table_name.into(),
            scope,
            properties: Vec::new(),
        }
    }

    pub fn with_property(mut self, property: PropertyMapping) -> Self {
        self.properties.push(property);
        self
    }

    /// Looks up a property, ignoring case.
    pub fn property(&self, name: &str) -> Option<&PropertyMapping> {
        self.properties
            .iter()
            .find(|p| eq_ignore_case(&p.property_name, name))
    }

    pub fn is_enumeration(&self) -> bool {
        self.scope == Scope::Enumeration
    }

    /// The query name without its scope prefix: `ВидыКонтрагентов` for
    /// `Перечисление.ВидыКонтрагентов`.
    pub fn object_name(&self) -> &str {
        match self.query_name.split_once('.') {
            Some((prefix, name)) if Scope::from_native_prefix(prefix).is_some() => name,
            _ => &self.query_name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyMapping {
    pub property_name: String,
    pub column_name: String,

    /// Query name of the table this property references, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nested_table_name: Option<String>,
}

impl PropertyMapping {
    pub fn new<S: Into<String>>(property_name: S, column_name: S) -> Self {
        PropertyMapping {
            property_name: property_name.into(),
            column_name: column_name.into(),
            nested_table_name: None,
        }
    }

    pub fn with_nested_table<S: Into<String>>(mut self, query_name: S) -> Self {
        self.nested_table_name = Some(query_name.into());
        self
    }

    /// The referenced table; an empty name counts as none.
    pub fn nested_table(&self) -> Option<&str> {
        self.nested_table_name
            .as_deref()
            .filter(|name| !name.is_empty())
    }
}
