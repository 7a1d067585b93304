//! personsearch-core
//!
//! Query normalization, field selection, soundex and identifier matchers that
//! build typed index predicates, plus the configuration, error and boundary
//! traits shared by the index backend and the federated coordinator.

pub mod config;
pub mod error;
pub mod fields;
pub mod filters;
pub mod identifier;
pub mod name;
pub mod normalize;
pub mod predicate;
pub mod soundex;
pub mod store;
pub mod traits;
pub mod types;
