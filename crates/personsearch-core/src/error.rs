use thiserror::Error;

use crate::types::EntityId;

/// Coarse classification of a [`SearchError`], stable across messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Configuration,
    IndexUnavailable,
    Consistency,
    Cancelled,
}

#[derive(Debug, Error)]
pub enum SearchError {
    /// Malformed request: bad paging values, unknown identifier type.
    #[error("Invalid request: {0}")]
    Validation(String),

    /// Administrator configuration is missing or unparsable.
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// The index backend failed or timed out mid-search.
    #[error("Index unavailable: {0}")]
    IndexUnavailable(String),

    /// The index returned an id the entity store cannot resolve.
    #[error("Index/store inconsistency: entity {id} is indexed but not stored")]
    Consistency { id: EntityId },

    #[error("Search cancelled before {0}")]
    Cancelled(String),
}

impl SearchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SearchError::Validation(_) => ErrorKind::Validation,
            SearchError::Configuration(_) => ErrorKind::Configuration,
            SearchError::IndexUnavailable(_) => ErrorKind::IndexUnavailable,
            SearchError::Consistency { .. } => ErrorKind::Consistency,
            SearchError::Cancelled(_) => ErrorKind::Cancelled,
        }
    }
}

impl From<regex::Error> for SearchError {
    fn from(e: regex::Error) -> Self {
        SearchError::Configuration(format!("bad identifier pattern: {e}"))
    }
}

pub type Result<T> = std::result::Result<T, SearchError>;
