//! Plain (non-phonetic) field matching for person names and attributes.

use crate::config::SearchConfig;
use crate::fields::{self, select_fields};
use crate::predicate::Predicate;
use crate::types::{EntityKind, IndexField, MatchMode, NameToken};

/// Every token must hit one of `fields`; the best tier decides the score.
fn all_tokens_match(kind: EntityKind, fields: &[IndexField], tokens: &[NameToken]) -> Predicate {
    if tokens.is_empty() || fields.is_empty() {
        return Predicate::MatchNone;
    }
    let per_token = tokens.iter().map(|t| {
        let value = t.text.to_lowercase();
        Predicate::or(fields.iter().map(|f| Predicate::field_match(f, &value)))
    });
    Predicate::and(
        std::iter::once(Predicate::term(fields::KIND, kind.as_str()).filter()).chain(per_token),
    )
}

#[derive(Debug, Clone)]
pub struct NameFieldMatcher {
    fields: Vec<IndexField>,
}

impl NameFieldMatcher {
    pub fn new(mode: MatchMode) -> Self {
        Self { fields: select_fields(EntityKind::Name, mode) }
    }

    pub fn fields(&self) -> &[IndexField] { &self.fields }

    pub fn build_query(&self, tokens: &[NameToken]) -> Predicate {
        all_tokens_match(EntityKind::Name, &self.fields, tokens)
    }
}

/// Matches searchable person attribute values.
#[derive(Debug, Clone)]
pub struct AttributeMatcher {
    fields: Vec<IndexField>,
}

impl AttributeMatcher {
    pub fn new(config: &SearchConfig) -> Self {
        Self { fields: select_fields(EntityKind::Attribute, config.attribute_match_mode) }
    }

    pub fn build_query(&self, tokens: &[NameToken]) -> Predicate {
        let values = all_tokens_match(EntityKind::Attribute, &self.fields, tokens);
        Predicate::and(vec![values, Predicate::term(fields::SEARCHABLE, true).filter()])
    }
}
