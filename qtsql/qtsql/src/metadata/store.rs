use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{TableMapping, TableMappingSource};
use crate::{Error, Result, WithErrorInfo};

/// In-memory metadata, keyed by lowercased query name.
#[derive(Debug, Clone, Default)]
pub struct MappingStore {
    tables: HashMap<String, TableMapping>,
}

/// On-disk layout of a metadata file.
#[derive(Debug, Default, Serialize, Deserialize)]
struct MappingFile {
    tables: Vec<TableMapping>,
}

impl MappingStore {
    pub fn new<I>(tables: I) -> Result<Self>
    where
        I: IntoIterator<Item = TableMapping>,
    {
        let mut store = MappingStore::default();
        for table in tables {
            store.insert(table)?;
        }
        Ok(store)
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        let file: MappingFile = serde_yaml::from_str(text)
            .map_err(|e| Error::new_simple(e.to_string()))
            .push_hint("metadata is expected as a list of `tables`")?;
        Self::new(file.tables)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let file: MappingFile = serde_json::from_str(text)
            .map_err(|e| Error::new_simple(e.to_string()))
            .push_hint("metadata is expected as a list of `tables`")?;
        Self::new(file.tables)
    }

    /// Adds a table; a query name may only be mapped once.
    pub fn insert(&mut self, table: TableMapping) -> Result<()> {
        let key = table.query_name.to_lowercase();
        if self.tables.contains_key(&key) {
            return Err(Error::new_simple(format!(
                "table `{}` is mapped more than once",
                table.query_name
            )));
        }
        log::debug!(
            "mapping {} to {} ({})",
            table.query_name,
            table.db_table_name,
            table.scope
        );
        self.tables.insert(key, table);
        Ok(())
    }

    /// Tables, ordered by query name.
    pub fn tables(&self) -> Vec<&TableMapping> {
        let mut tables: Vec<_> = self.tables.values().collect();
        tables.sort_by(|a, b| a.query_name.cmp(&b.query_name));
        tables
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

impl TableMappingSource for MappingStore {
    fn table_mapping(&self, query_name: &str) -> Option<&TableMapping> {
        self.tables.get(&query_name.to_lowercase())
    }
}
