//! personsearch-text
//!
//! Tantivy-backed person index: one document per name, identifier and
//! attribute, queried through the `IndexClient` predicate interface.

pub mod tantivy_utils;
pub mod index;
pub mod search;

pub use index::PersonIndexer;
pub use search::TantivyIndexClient;
