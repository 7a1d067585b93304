use crate::error::Result;
use crate::predicate::Predicate;
use crate::types::{EntityId, IndexHit, PersonRecord};

/// Read-only full-text index the matchers' predicates run against.
///
/// `execute` returns every document matching `predicate`, best score first.
/// `count` is the number of matching documents, not people: one person can own
/// several name, identifier or attribute documents, so it is only good for
/// telling an empty sub-query from a non-empty one.
/// Implementations report backend failures as `SearchError::IndexUnavailable`.
pub trait IndexClient: Send + Sync {
    fn execute(&self, predicate: &Predicate) -> Result<Vec<IndexHit>>;
    fn count(&self, predicate: &Predicate) -> Result<u64>;
}

/// Record classes an [`EntityStore`] can resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Person,
    Patient,
}

/// Primary-key lookup of fully-loaded records.
pub trait EntityStore: Send + Sync {
    fn load_by_id(&self, kind: RecordKind, id: EntityId) -> Result<Option<PersonRecord>>;
}

impl<T: IndexClient + ?Sized> IndexClient for &T {
    fn execute(&self, predicate: &Predicate) -> Result<Vec<IndexHit>> { (**self).execute(predicate) }
    fn count(&self, predicate: &Predicate) -> Result<u64> { (**self).count(predicate) }
}

impl<T: EntityStore + ?Sized> EntityStore for &T {
    fn load_by_id(&self, kind: RecordKind, id: EntityId) -> Result<Option<PersonRecord>> {
        (**self).load_by_id(kind, id)
    }
}
