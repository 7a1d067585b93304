//! personsearch-federated
//!
//! Cascading identifier, name and attribute search over a person index, with
//! one pagination budget shared across the sub-queries.

pub mod budget;
pub mod cancel;
pub mod coordinator;
pub mod materializer;

use serde::Serialize;

use personsearch_core::config::ConfigSource;
use personsearch_core::error::Result;
use personsearch_core::traits::{EntityStore, IndexClient};
use personsearch_core::types::{PersonRecord, SearchRequest};

pub use budget::{DedupSet, PaginationBudget};
pub use cancel::CancelToken;
pub use coordinator::FederatedSearchCoordinator;
pub use materializer::EntityMaterializer;

/// One page of loaded person records.
#[derive(Debug, Clone, Serialize)]
pub struct SearchPage {
    pub people: Vec<PersonRecord>,
    pub has_more: bool,
}

/// Search followed by materialization: the caller-facing entry point.
pub struct PersonSearch<I, C, S> where I: IndexClient, C: ConfigSource, S: EntityStore {
    coordinator: FederatedSearchCoordinator<I, C>,
    materializer: EntityMaterializer<S>,
}

impl<I, C, S> PersonSearch<I, C, S> where I: IndexClient, C: ConfigSource, S: EntityStore {
    pub fn new(index: I, config: C, store: S) -> Self {
        Self { coordinator: FederatedSearchCoordinator::new(index, config), materializer: EntityMaterializer::new(store) }
    }

    /// Run `query` with the paging and filters of `opts`.
    pub fn search(&self, query: Option<&str>, opts: SearchRequest) -> Result<SearchPage> {
        self.search_with_cancel(query, opts, &CancelToken::new())
    }

    pub fn search_with_cancel(&self, query: Option<&str>, opts: SearchRequest, cancel: &CancelToken) -> Result<SearchPage> {
        let req = SearchRequest { raw_query: query.map(str::to_string), ..opts };
        let response = self.coordinator.search_with_cancel(&req, cancel)?;
        let people = self.materializer.materialize(&response.entity_ids)?;
        Ok(SearchPage { people, has_more: response.has_more })
    }
}
