use std::sync::OnceLock;

use qtsql::metadata::MappingStore;

mod error_messages;
mod sql;

/// Metadata of the test configuration, parsed once.
pub(crate) fn schema() -> &'static MappingStore {
    static SCHEMA: OnceLock<MappingStore> = OnceLock::new();
    SCHEMA.get_or_init(|| {
        MappingStore::from_yaml(include_str!("data/schema.yaml")).unwrap()
    })
}
