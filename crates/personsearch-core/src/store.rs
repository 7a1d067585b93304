//! In-memory [`EntityStore`] keyed by person id.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::{Result, SearchError};
use crate::traits::{EntityStore, RecordKind};
use crate::types::{EntityId, PersonRecord};

#[derive(Debug, Clone, Default)]
pub struct InMemoryPersonStore {
    records: HashMap<EntityId, PersonRecord>,
}

impl InMemoryPersonStore {
    pub fn new(records: impl IntoIterator<Item = PersonRecord>) -> Self {
        Self { records: records.into_iter().map(|r| (r.person_id, r)).collect() }
    }

    /// Load a JSON array of person records.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|e| SearchError::IndexUnavailable(format!("cannot read {}: {}", path.display(), e)))?;
        let records: Vec<PersonRecord> = serde_json::from_str(&raw)
            .map_err(|e| SearchError::IndexUnavailable(format!("cannot parse {}: {}", path.display(), e)))?;
        Ok(Self::new(records))
    }

    pub fn len(&self) -> usize { self.records.len() }

    pub fn is_empty(&self) -> bool { self.records.is_empty() }
}

impl EntityStore for InMemoryPersonStore {
    fn load_by_id(&self, kind: RecordKind, id: EntityId) -> Result<Option<PersonRecord>> {
        let record = self.records.get(&id);
        Ok(match kind {
            RecordKind::Person => record.cloned(),
            RecordKind::Patient => record.filter(|r| r.is_patient).cloned(),
        })
    }
}
