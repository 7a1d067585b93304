//! Domain types shared by the matchers, the index backends and the coordinator.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

use crate::config::SearchConfig;

/// Primary key of a person record.
pub type EntityId = u64;

/// Reference to a configured patient identifier type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentifierTypeRef(pub u64);

impl fmt::Display for IdentifierTypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

/// How strictly text fields are matched. Declared from strictest to loosest,
/// so `Exact < Start < Anywhere`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum MatchMode {
    Exact,
    #[default]
    Start,
    Anywhere,
}

impl FromStr for MatchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "EXACT" => Ok(MatchMode::Exact),
            "START" => Ok(MatchMode::Start),
            "ANYWHERE" => Ok(MatchMode::Anywhere),
            other => Err(format!("unknown match mode '{other}'")),
        }
    }
}

/// The independently indexed entity classes a person can be found through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Identifier,
    Name,
    Attribute,
}

impl EntityKind {
    /// Value stored in the index `kind` field for documents of this class.
    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Identifier => "identifier",
            EntityKind::Name => "name",
            EntityKind::Attribute => "attribute",
        }
    }
}

/// Indicates which sub-query produced a result, in cascade priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SourceKind {
    Identifier,
    Name,
    Attribute,
}

/// A searchable index field together with the tier it is matched at.
///
/// The same physical field may appear more than once with different tiers:
/// `givenName` at `Exact` is a term match, at `Start` a prefix match and at
/// `Anywhere` a substring match.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexField {
    pub name: &'static str,
    pub tier: MatchMode,
    pub boost: f32,
}

/// One whitespace-separated token of a name query. Position is zero-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameToken {
    pub position: usize,
    pub text: String,
}

/// Boost applied when the token at `position` matches the soundex code of `field`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldTokenWeight {
    pub position: usize,
    pub field: &'static str,
    pub boost: f32,
}

/// A document-level hit as returned by an index backend. Several documents
/// (names, identifiers, attributes) may belong to the same entity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndexHit {
    pub entity_id: EntityId,
    pub score: f32,
}

/// Ranked, per-entity result of one sub-query before pagination.
#[derive(Debug, Clone)]
pub struct SubQueryResult {
    pub source: SourceKind,
    pub ordered_hits: Vec<IndexHit>,
    pub total_matched: u64,
}

impl SubQueryResult {
    /// Collapse document hits to one hit per entity (best score wins) and
    /// order them by score descending, then entity id ascending.
    pub fn from_index_hits(source: SourceKind, hits: Vec<IndexHit>) -> Self {
        let mut best: HashMap<EntityId, f32> = HashMap::with_capacity(hits.len());
        for h in hits {
            best.entry(h.entity_id)
                .and_modify(|s| { if h.score > *s { *s = h.score; } })
                .or_insert(h.score);
        }
        let mut ordered_hits: Vec<IndexHit> = best
            .into_iter()
            .map(|(entity_id, score)| IndexHit { entity_id, score })
            .collect();
        ordered_hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.entity_id.cmp(&b.entity_id))
        });
        let total_matched = ordered_hits.len() as u64;
        Self { source, ordered_hits, total_matched }
    }
}

/// A single person search as issued by a caller.
///
/// `start` and `length` are signed so that malformed paging coming from an
/// outer API surface is reported as a validation error instead of wrapping.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub raw_query: Option<String>,
    pub locale: Option<String>,
    pub include_voided: bool,
    pub match_mode: MatchMode,
    pub start: i64,
    pub length: Option<i64>,
    pub identifier_types: BTreeSet<IdentifierTypeRef>,
    pub dead: Option<bool>,
    pub gender: Option<String>,
    pub birth_year: Option<i32>,
    pub phonetic: bool,
    pub exact_identifier: bool,
}

impl Default for SearchRequest {
    fn default() -> Self {
        Self {
            raw_query: None,
            locale: None,
            include_voided: false,
            match_mode: MatchMode::Start,
            start: 0,
            length: None,
            identifier_types: BTreeSet::new(),
            dead: None,
            gender: None,
            birth_year: None,
            phonetic: false,
            exact_identifier: false,
        }
    }
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self { raw_query: Some(query.into()), ..Self::default() }
    }

    /// Like [`SearchRequest::new`] but takes the name match mode from the
    /// deployment configuration.
    pub fn with_defaults(query: impl Into<String>, config: &SearchConfig) -> Self {
        Self { match_mode: config.name_match_mode, ..Self::new(query) }
    }

    pub fn page(mut self, start: i64, length: Option<i64>) -> Self {
        self.start = start;
        self.length = length;
        self
    }

    /// `birth_year == 0` means unspecified.
    pub fn effective_birth_year(&self) -> Option<i32> {
        self.birth_year.filter(|y| *y != 0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub entity_ids: Vec<EntityId>,
    pub has_more: bool,
}

impl SearchResponse {
    pub fn empty() -> Self { Self::default() }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonName {
    pub given_name: Option<String>,
    #[serde(default)]
    pub middle_name: Option<String>,
    #[serde(default)]
    pub family_name: Option<String>,
    #[serde(default)]
    pub family_name2: Option<String>,
    #[serde(default)]
    pub voided: bool,
}

impl PersonName {
    pub fn new(given: &str, middle: Option<&str>, family: &str) -> Self {
        Self {
            given_name: Some(given.to_string()),
            middle_name: middle.map(str::to_string),
            family_name: Some(family.to_string()),
            family_name2: None,
            voided: false,
        }
    }

    pub fn full_name(&self) -> String {
        [&self.given_name, &self.middle_name, &self.family_name, &self.family_name2]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientIdentifier {
    pub identifier: String,
    pub identifier_type: IdentifierTypeRef,
    #[serde(default)]
    pub voided: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonAttribute {
    pub attribute_type: String,
    pub value: String,
    #[serde(default = "default_searchable")]
    pub searchable: bool,
    #[serde(default)]
    pub voided: bool,
}

fn default_searchable() -> bool { true }

/// A fully-loaded person as held by the entity store and fed to indexers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonRecord {
    pub person_id: EntityId,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub birthdate: Option<NaiveDate>,
    #[serde(default)]
    pub dead: bool,
    #[serde(default)]
    pub voided: bool,
    #[serde(default)]
    pub is_patient: bool,
    #[serde(default)]
    pub names: Vec<PersonName>,
    #[serde(default)]
    pub identifiers: Vec<PatientIdentifier>,
    #[serde(default)]
    pub attributes: Vec<PersonAttribute>,
}

impl PersonRecord {
    pub fn new(person_id: EntityId) -> Self {
        Self {
            person_id,
            gender: None,
            birthdate: None,
            dead: false,
            voided: false,
            is_patient: true,
            names: Vec::new(),
            identifiers: Vec::new(),
            attributes: Vec::new(),
        }
    }

    /// First non-voided name, falling back to the first name.
    pub fn preferred_name(&self) -> Option<&PersonName> {
        self.names.iter().find(|n| !n.voided).or_else(|| self.names.first())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapse_keeps_best_score_and_orders_ties_by_id() {
        let hits = vec![
            IndexHit { entity_id: 7, score: 1.0 },
            IndexHit { entity_id: 3, score: 2.0 },
            IndexHit { entity_id: 7, score: 2.0 },
            IndexHit { entity_id: 5, score: 0.5 },
        ];
        let r = SubQueryResult::from_index_hits(SourceKind::Name, hits);
        let ids: Vec<EntityId> = r.ordered_hits.iter().map(|h| h.entity_id).collect();
        assert_eq!(ids, vec![3, 7, 5]);
        assert_eq!(r.total_matched, 3);
    }

    #[test]
    fn match_mode_parses_case_insensitively() {
        assert_eq!("anywhere".parse::<MatchMode>(), Ok(MatchMode::Anywhere));
        assert!("fuzzy".parse::<MatchMode>().is_err());
        assert!(MatchMode::Exact < MatchMode::Anywhere);
    }

    #[test]
    fn zero_birth_year_is_unspecified() {
        let req = SearchRequest { birth_year: Some(0), ..SearchRequest::new("x") };
        assert_eq!(req.effective_birth_year(), None);
    }
}
