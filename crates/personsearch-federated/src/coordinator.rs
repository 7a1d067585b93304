use tracing::{debug, debug_span, error, warn};

use personsearch_core::config::{ConfigSource, SearchConfig};
use personsearch_core::error::{Result, SearchError};
use personsearch_core::filters::{birth_year_range, PersonFilter};
use personsearch_core::identifier::IdentifierMatcher;
use personsearch_core::name::{AttributeMatcher, NameFieldMatcher};
use personsearch_core::normalize::{is_numeric_shaped, normalize, tokenize};
use personsearch_core::predicate::Predicate;
use personsearch_core::soundex::SoundexNameMatcher;
use personsearch_core::traits::IndexClient;
use personsearch_core::types::{NameToken, SearchRequest, SearchResponse, SourceKind, SubQueryResult};

use crate::budget::{DedupSet, PaginationBudget};
use crate::cancel::CancelToken;

/// One planned sub-query of the cascade.
#[derive(Debug, Clone)]
struct Phase {
    source: SourceKind,
    predicate: Predicate,
}

impl Phase {
    fn stage(&self) -> &'static str {
        match self.source {
            SourceKind::Identifier => "identifier phase",
            SourceKind::Name => "name phase",
            SourceKind::Attribute => "attribute phase",
        }
    }
}

/// Runs the identifier, name and attribute sub-queries of one request in
/// priority order and stitches a single page out of them.
pub struct FederatedSearchCoordinator<I, C> where I: IndexClient, C: ConfigSource {
    index: I,
    config: C,
}

impl<I, C> FederatedSearchCoordinator<I, C> where I: IndexClient, C: ConfigSource {
    pub fn new(index: I, config: C) -> Self { Self { index, config } }

    pub fn search(&self, req: &SearchRequest) -> Result<SearchResponse> {
        self.search_with_cancel(req, &CancelToken::new())
    }

    pub fn search_with_cancel(&self, req: &SearchRequest, cancel: &CancelToken) -> Result<SearchResponse> {
        let config = self.config.search_config().map_err(|e| {
            warn!(error = %e, "search rejected: unusable search configuration");
            e
        })?;
        let (start, length) = validate(req, &config)?;

        let normalized = normalize(req.raw_query.as_deref().unwrap_or_default());
        let tokens = tokenize(&normalized);
        let query = tokens.iter().map(|t| t.text.as_str()).collect::<Vec<_>>().join(" ");
        let type_only = query.is_empty() && !req.identifier_types.is_empty();

        let span = debug_span!("person_search", query = %query, start, length, locale = ?req.locale);
        let _guard = span.enter();

        if !type_only && query.chars().count() < config.min_search_characters.max(1) {
            debug!(min = config.min_search_characters, "query blank or too short");
            return Ok(SearchResponse::empty());
        }

        let phases = plan(req, &config, &query, &tokens, type_only)?;
        let mut budget = PaginationBudget::new(start, length);
        let mut seen = DedupSet::default();
        let mut entity_ids = Vec::new();
        let mut has_more = false;

        for (i, phase) in phases.iter().enumerate() {
            cancel.check(phase.stage())?;
            if budget.is_exhausted() {
                has_more = self.probe(&phases[i..], &seen, cancel)?;
                break;
            }
            let result = self.run(phase)?;
            let fresh = seen.fresh(result.ordered_hits.iter().map(|h| h.entity_id));
            let skipped = budget.remaining_start().min(fresh.len());
            let page = budget.take(&fresh);
            debug!(
                phase = phase.stage(),
                matched = result.total_matched,
                fresh = fresh.len(),
                emitted = page.len(),
                "phase complete"
            );
            entity_ids.extend_from_slice(page);
            seen.extend(&fresh);
            if skipped + page.len() < fresh.len() {
                has_more = true;
                break;
            }
        }

        debug!(results = entity_ids.len(), has_more, "search complete");
        Ok(SearchResponse { entity_ids, has_more })
    }

    fn run(&self, phase: &Phase) -> Result<SubQueryResult> {
        let hits = self.index.execute(&phase.predicate).map_err(|e| {
            error!(phase = phase.stage(), error = %e, "sub-query failed");
            e
        })?;
        Ok(SubQueryResult::from_index_hits(phase.source, hits))
    }

    fn matches_nothing(&self, phase: &Phase) -> Result<bool> {
        let documents = self.index.count(&phase.predicate).map_err(|e| {
            error!(phase = phase.stage(), error = %e, "sub-query count failed");
            e
        })?;
        Ok(documents == 0)
    }

    /// Whether any of the not-yet-run `phases` would contribute a new id.
    /// A phase whose predicate matches no document is not executed.
    fn probe(&self, phases: &[Phase], seen: &DedupSet, cancel: &CancelToken) -> Result<bool> {
        for phase in phases {
            cancel.check(phase.stage())?;
            if self.matches_nothing(phase)? {
                continue;
            }
            let result = self.run(phase)?;
            if result.ordered_hits.iter().any(|h| !seen.contains(h.entity_id)) {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

/// Checked `(start, length)`, with `length` capped at the configured maximum.
fn validate(req: &SearchRequest, config: &SearchConfig) -> Result<(usize, usize)> {
    let start = usize::try_from(req.start)
        .map_err(|_| SearchError::Validation(format!("start must not be negative, got {}", req.start)))?;
    let length = match req.length {
        Some(l) if l <= 0 => return Err(SearchError::Validation(format!("length must be positive, got {l}"))),
        Some(l) => usize::try_from(l).unwrap_or(usize::MAX).min(config.max_results),
        None => config.max_results,
    };
    if let Some(unknown) = req.identifier_types.iter().find(|t| !config.knows_identifier_type(**t)) {
        return Err(SearchError::Validation(format!("unknown identifier type {unknown}")));
    }
    if let Some(year) = req.effective_birth_year() {
        if birth_year_range(year).is_none() {
            return Err(SearchError::Validation(format!("birth year {year} is out of range")));
        }
    }
    Ok((start, length))
}

/// Sub-queries to run for `req`, highest priority first.
fn plan(
    req: &SearchRequest,
    config: &SearchConfig,
    query: &str,
    tokens: &[NameToken],
    type_only: bool,
) -> Result<Vec<Phase>> {
    let person_filter = PersonFilter::from_request(req);
    let mut phases = Vec::with_capacity(3);

    if type_only || !req.identifier_types.is_empty() || is_numeric_shaped(query) {
        let matcher = IdentifierMatcher::new(config)?;
        let ids = matcher.build_query(query, &req.identifier_types, req.exact_identifier, req.include_voided)?;
        // voided rows are already handled by the identifier matcher
        let owner = PersonFilter { include_voided: true, ..person_filter.clone() };
        phases.push(Phase { source: SourceKind::Identifier, predicate: Predicate::and(vec![ids, owner.to_predicate()]) });
    }
    if type_only {
        return Ok(phases);
    }

    let names = if req.phonetic {
        let soundex = SoundexNameMatcher::new().build_query(
            tokens,
            person_filter.birth_year,
            person_filter.gender.as_deref(),
            req.include_voided,
        );
        let dead = PersonFilter { include_voided: true, gender: None, birth_year: None, dead: req.dead };
        Predicate::and(vec![soundex, dead.to_predicate()])
    } else {
        let plain = NameFieldMatcher::new(req.match_mode).build_query(tokens);
        Predicate::and(vec![plain, person_filter.to_predicate()])
    };
    phases.push(Phase { source: SourceKind::Name, predicate: names });

    let attributes = AttributeMatcher::new(config).build_query(tokens);
    phases.push(Phase {
        source: SourceKind::Attribute,
        predicate: Predicate::and(vec![attributes, person_filter.to_predicate()]),
    });
    Ok(phases)
}
