use tracing::error;

use personsearch_core::error::{Result, SearchError};
use personsearch_core::traits::{EntityStore, RecordKind};
use personsearch_core::types::{EntityId, PersonRecord};

/// Loads the records behind a result page, in page order.
pub struct EntityMaterializer<S> where S: EntityStore {
    store: S,
    kind: RecordKind,
}

impl<S> EntityMaterializer<S> where S: EntityStore {
    pub fn new(store: S) -> Self { Self { store, kind: RecordKind::Person } }

    /// An id the store cannot resolve fails the whole page.
    pub fn materialize(&self, ids: &[EntityId]) -> Result<Vec<PersonRecord>> {
        let mut records = Vec::with_capacity(ids.len());
        for &id in ids {
            match self.store.load_by_id(self.kind, id)? {
                Some(record) => records.push(record),
                None => {
                    error!(entity_id = id, kind = ?self.kind, "indexed entity missing from store");
                    return Err(SearchError::Consistency { id });
                }
            }
        }
        Ok(records)
    }
}
