use std::collections::HashSet;

use personsearch_core::types::EntityId;

/// Remaining `(skip, take)` of a page that may span several sub-queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationBudget {
    remaining_start: usize,
    remaining_length: usize,
}

impl PaginationBudget {
    pub fn new(start: usize, length: usize) -> Self {
        Self { remaining_start: start, remaining_length: length }
    }

    pub fn remaining_start(&self) -> usize { self.remaining_start }
    pub fn remaining_length(&self) -> usize { self.remaining_length }
    pub fn is_exhausted(&self) -> bool { self.remaining_length == 0 }

    /// Charge one phase's fresh, ordered ids against the budget and return the
    /// slice that belongs on the page. Ids before it were skipped by `start`.
    pub fn take<'a>(&mut self, fresh: &'a [EntityId]) -> &'a [EntityId] {
        let matched = fresh.len();
        if matched <= self.remaining_start {
            self.remaining_start -= matched;
            return &[];
        }
        let from = self.remaining_start;
        let to = matched.min(from + self.remaining_length);
        self.remaining_start = 0;
        self.remaining_length -= to - from;
        &fresh[from..to]
    }
}

/// Ids already matched by an earlier phase of the same request, whether they
/// were emitted or skipped by `start`.
#[derive(Debug, Default)]
pub struct DedupSet {
    seen: HashSet<EntityId>,
}

impl DedupSet {
    pub fn contains(&self, id: EntityId) -> bool { self.seen.contains(&id) }

    /// Ids of `ordered` not seen before, order preserved.
    pub fn fresh(&self, ordered: impl IntoIterator<Item = EntityId>) -> Vec<EntityId> {
        ordered.into_iter().filter(|id| !self.seen.contains(id)).collect()
    }

    pub fn extend(&mut self, ids: &[EntityId]) { self.seen.extend(ids.iter().copied()); }

    pub fn len(&self) -> usize { self.seen.len() }
    pub fn is_empty(&self) -> bool { self.seen.is_empty() }
}
