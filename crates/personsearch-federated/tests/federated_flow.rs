use std::collections::BTreeSet;
use std::sync::Mutex;

use chrono::NaiveDate;

use personsearch_core::config::SearchConfig;
use personsearch_core::error::{ErrorKind, Result, SearchError};
use personsearch_core::predicate::Predicate;
use personsearch_core::store::InMemoryPersonStore;
use personsearch_core::traits::IndexClient;
use personsearch_core::types::{
    IdentifierTypeRef, IndexHit, MatchMode, PatientIdentifier, PersonAttribute, PersonName, PersonRecord,
    SearchRequest,
};
use personsearch_federated::{CancelToken, FederatedSearchCoordinator, PersonSearch};
use personsearch_text::{PersonIndexer, TantivyIndexClient};

fn person(id: u64, given: &str, family: &str) -> PersonRecord {
    let mut p = PersonRecord::new(id);
    p.names.push(PersonName::new(given, None, family));
    p
}

fn with_identifier(mut p: PersonRecord, value: &str) -> PersonRecord {
    p.identifiers.push(PatientIdentifier {
        identifier: value.to_string(),
        identifier_type: IdentifierTypeRef(1),
        voided: false,
    });
    p
}

fn with_attribute(mut p: PersonRecord, value: &str) -> PersonRecord {
    p.attributes.push(PersonAttribute {
        attribute_type: "Birthplace".into(),
        value: value.to_string(),
        searchable: true,
        voided: false,
    });
    p
}

fn client_for(people: &[PersonRecord]) -> TantivyIndexClient {
    let indexer = PersonIndexer::in_ram();
    indexer.index_people(people).expect("index");
    indexer.client().expect("client")
}

/// P1(identifier "1001A"), P2("John Smith"), P3("Jon Smith", identifier "2002B").
fn scenario_people() -> Vec<PersonRecord> {
    vec![
        with_identifier(person(1, "Alice", "Brown"), "1001A"),
        person(2, "John", "Smith"),
        with_identifier(person(3, "Jon", "Smith"), "2002B"),
    ]
}

fn scenario() -> FederatedSearchCoordinator<TantivyIndexClient, SearchConfig> {
    FederatedSearchCoordinator::new(client_for(&scenario_people()), SearchConfig::default())
}

/// Matches "smi" in all three phases, with overlaps between them.
fn cascade() -> FederatedSearchCoordinator<TantivyIndexClient, SearchConfig> {
    let mut voided = person(15, "Fay", "Smit");
    voided.voided = true;
    let people = vec![
        with_identifier(person(10, "Ann", "Smith"), "SMI-100"),
        with_identifier(person(11, "Bob", "Jones"), "SMI-200"),
        with_attribute(person(12, "Carl", "Smith"), "Smithfield"),
        person(13, "Dora", "Smithers"),
        with_attribute(person(14, "Eve", "Stone"), "Smithfield"),
        voided,
    ];
    let config = SearchConfig { attribute_match_mode: MatchMode::Start, ..SearchConfig::default() };
    FederatedSearchCoordinator::new(client_for(&people), config)
}

fn cascade_request() -> SearchRequest {
    let mut req = SearchRequest::new("smi");
    req.identifier_types.insert(IdentifierTypeRef(1));
    req
}

#[test]
fn scenario_a_name_phase_only() {
    let res = scenario().search(&SearchRequest::new("Smith").page(0, Some(10))).expect("search");
    assert_eq!(res.entity_ids.len(), 2);
    assert_eq!(res.entity_ids.iter().copied().collect::<BTreeSet<_>>(), BTreeSet::from([2, 3]));
    assert!(!res.has_more);
}

#[test]
fn scenario_b_exact_identifier() {
    let mut req = SearchRequest::new("2002B");
    req.exact_identifier = true;
    let res = scenario().search(&req).expect("search");
    assert_eq!(res.entity_ids, vec![3]);
}

#[test]
fn scenario_c_single_item_pages() {
    let coordinator = scenario();
    let first = coordinator.search(&SearchRequest::new("Smith").page(0, Some(1))).expect("page 1");
    let second = coordinator.search(&SearchRequest::new("Smith").page(1, Some(1))).expect("page 2");
    assert_eq!(first.entity_ids.len(), 1);
    assert_eq!(second.entity_ids.len(), 1);
    assert_ne!(first.entity_ids, second.entity_ids);
    assert!(first.has_more);
    assert!(!second.has_more);
}

#[test]
fn phases_are_ordered_by_priority_without_duplicates() {
    let res = cascade().search(&cascade_request()).expect("search");
    let ids = res.entity_ids;
    assert_eq!(ids.len(), 5, "{ids:?}");
    assert_eq!(ids[..2].iter().copied().collect::<BTreeSet<_>>(), BTreeSet::from([10, 11]));
    assert_eq!(ids[2..4].iter().copied().collect::<BTreeSet<_>>(), BTreeSet::from([12, 13]));
    assert_eq!(ids[4], 14);
    assert!(!ids.contains(&15), "voided person excluded");
    assert!(!res.has_more);
}

#[test]
fn consecutive_pages_partition_the_full_result() {
    let coordinator = cascade();
    let full = coordinator.search(&cascade_request()).expect("full").entity_ids;
    for k in 1..=4i64 {
        let mut stitched = Vec::new();
        let mut start = 0;
        loop {
            let page = coordinator.search(&cascade_request().page(start, Some(k))).expect("page");
            stitched.extend(page.entity_ids);
            if !page.has_more {
                break;
            }
            start += k;
        }
        assert_eq!(stitched, full, "page size {k}");
    }
}

#[test]
fn has_more_ignores_later_duplicates() {
    let coordinator = FederatedSearchCoordinator::new(
        client_for(&[with_identifier(person(1, "Ann", "Smith"), "SMI-1")]),
        SearchConfig::default(),
    );
    let res = coordinator.search(&cascade_request().page(0, Some(1))).expect("search");
    assert_eq!(res.entity_ids, vec![1]);
    assert!(!res.has_more, "name phase only re-finds person 1");

    let res = cascade().search(&cascade_request().page(0, Some(2))).expect("search");
    assert!(res.has_more, "name phase has fresh matches");
}

#[test]
fn blank_and_short_queries_are_empty_pages() {
    let coordinator = scenario();
    for req in [SearchRequest::default(), SearchRequest::new(""), SearchRequest::new(" , "), SearchRequest::new("s")] {
        let res = coordinator.search(&req).expect("search");
        assert!(res.entity_ids.is_empty());
        assert!(!res.has_more);
    }
}

#[test]
fn identifier_type_only_search() {
    let mut req = SearchRequest::default();
    req.identifier_types.insert(IdentifierTypeRef(1));
    let res = scenario().search(&req).expect("search");
    assert_eq!(res.entity_ids, vec![1, 3]);
}

#[test]
fn soundex_ranks_exact_spelling_above_sound_alike() {
    let mut smythe = PersonRecord::new(1);
    smythe.names.push(PersonName::new("Jon", Some("A"), "Smythe"));
    let mut smith = PersonRecord::new(2);
    smith.names.push(PersonName::new("Jon", Some("B"), "Smith"));
    let coordinator = FederatedSearchCoordinator::new(client_for(&[smythe, smith]), SearchConfig::default());
    let mut req = SearchRequest::new("Jon Smith");
    req.phonetic = true;
    let ids = coordinator.search(&req).expect("search").entity_ids;
    assert_eq!(ids, vec![2, 1]);
}

#[test]
fn phonetic_birth_year_filter() {
    let mut people = scenario_people();
    people[1].birthdate = NaiveDate::from_ymd_opt(1980, 3, 1);
    let coordinator = FederatedSearchCoordinator::new(client_for(&people), SearchConfig::default());
    let run = |year: i32| {
        let mut req = SearchRequest::new("Smith");
        req.phonetic = true;
        req.birth_year = Some(year);
        coordinator.search(&req).expect("search").entity_ids.into_iter().collect::<BTreeSet<_>>()
    };
    assert_eq!(run(0), BTreeSet::from([2, 3]), "zero means no birth year");
    assert_eq!(run(1990), BTreeSet::from([3]), "unknown birthdate passes");
    assert_eq!(run(1980), BTreeSet::from([2, 3]));
}

#[test]
fn voided_people_need_include_voided() {
    let mut voided = person(7, "John", "Smith");
    voided.voided = true;
    let coordinator = FederatedSearchCoordinator::new(client_for(&[voided]), SearchConfig::default());
    for phonetic in [false, true] {
        let mut req = SearchRequest::new("John Smith");
        req.phonetic = phonetic;
        assert!(coordinator.search(&req).expect("search").entity_ids.is_empty());
        req.include_voided = true;
        assert_eq!(coordinator.search(&req).expect("search").entity_ids, vec![7]);
    }
}

#[test]
fn person_filters_apply_to_identifier_phase() {
    let mut people = scenario_people();
    people[0].gender = Some("F".into());
    people[0].dead = true;
    let coordinator = FederatedSearchCoordinator::new(client_for(&people), SearchConfig::default());

    let mut req = SearchRequest::new("1001A");
    req.gender = Some("m".into());
    assert!(coordinator.search(&req).expect("search").entity_ids.is_empty());

    let mut req = SearchRequest::new("1001A");
    req.dead = Some(true);
    assert_eq!(coordinator.search(&req).expect("search").entity_ids, vec![1]);
}

#[test]
fn invalid_requests_are_rejected() {
    let coordinator = scenario();
    let kind = |req: SearchRequest| coordinator.search(&req).expect_err("invalid").kind();
    assert_eq!(kind(SearchRequest::new("Smith").page(-1, None)), ErrorKind::Validation);
    assert_eq!(kind(SearchRequest::new("Smith").page(0, Some(0))), ErrorKind::Validation);

    let bad_config = SearchConfig { max_results: 0, ..SearchConfig::default() };
    let coordinator = FederatedSearchCoordinator::new(client_for(&[]), bad_config);
    assert_eq!(coordinator.search(&SearchRequest::new("Smith")).expect_err("config").kind(), ErrorKind::Configuration);
}

#[test]
fn cancelled_search_stops_before_the_first_phase() {
    let token = CancelToken::new();
    token.cancel();
    let err = scenario().search_with_cancel(&SearchRequest::new("Smith"), &token).expect_err("cancelled");
    assert_eq!(err.kind(), ErrorKind::Cancelled);
}

/// Answers identifier queries and fails everything else.
struct FlakyIndex;

impl IndexClient for FlakyIndex {
    fn execute(&self, predicate: &Predicate) -> Result<Vec<IndexHit>> {
        if predicate.to_string().contains("kind:identifier") {
            Ok(vec![IndexHit { entity_id: 1, score: 1.0 }])
        } else {
            Err(SearchError::IndexUnavailable("connection reset".into()))
        }
    }

    fn count(&self, _predicate: &Predicate) -> Result<u64> { Ok(1) }
}

/// Cancels its token while answering the identifier sub-query and records
/// every sub-query it is asked to run.
struct CancellingIndex {
    token: CancelToken,
    calls: Mutex<Vec<String>>,
}

impl IndexClient for CancellingIndex {
    fn execute(&self, predicate: &Predicate) -> Result<Vec<IndexHit>> {
        let rendered = predicate.to_string();
        let identifier = rendered.contains("kind:identifier");
        self.calls.lock().expect("calls").push(rendered);
        if identifier {
            self.token.cancel();
        }
        Ok(vec![IndexHit { entity_id: 1, score: 1.0 }])
    }

    fn count(&self, _predicate: &Predicate) -> Result<u64> { Ok(1) }
}

#[test]
fn cancel_during_identifier_phase_skips_later_phases() {
    let token = CancelToken::new();
    let index = CancellingIndex { token: token.clone(), calls: Mutex::new(Vec::new()) };
    let coordinator = FederatedSearchCoordinator::new(&index, SearchConfig::default());
    let err = coordinator.search_with_cancel(&SearchRequest::new("1001A"), &token).expect_err("cancelled");
    assert_eq!(err.kind(), ErrorKind::Cancelled);
    let calls = index.calls.lock().expect("calls");
    assert_eq!(calls.len(), 1, "{calls:?}");
    assert!(calls[0].contains("kind:identifier"));
}

#[test]
fn failing_phase_fails_the_whole_search() {
    let coordinator = FederatedSearchCoordinator::new(FlakyIndex, SearchConfig::default());
    let err = coordinator.search(&SearchRequest::new("1001A")).expect_err("name phase fails");
    assert_eq!(err.kind(), ErrorKind::IndexUnavailable);
}

/// Name sub-queries find person 1; attribute sub-queries report no documents
/// and fail if executed anyway.
struct EmptyAttributeIndex;

impl IndexClient for EmptyAttributeIndex {
    fn execute(&self, predicate: &Predicate) -> Result<Vec<IndexHit>> {
        if predicate.to_string().contains("kind:attribute") {
            Err(SearchError::IndexUnavailable("attribute shard offline".into()))
        } else {
            Ok(vec![IndexHit { entity_id: 1, score: 1.0 }])
        }
    }

    fn count(&self, predicate: &Predicate) -> Result<u64> {
        Ok(if predicate.to_string().contains("kind:attribute") { 0 } else { 1 })
    }
}

#[test]
fn has_more_skips_phases_with_no_documents() {
    let coordinator = FederatedSearchCoordinator::new(EmptyAttributeIndex, SearchConfig::default());
    let res = coordinator.search(&SearchRequest::new("Smith").page(0, Some(1))).expect("search");
    assert_eq!(res.entity_ids, vec![1]);
    assert!(!res.has_more);
}

#[test]
fn facade_loads_records_in_page_order() {
    let people = scenario_people();
    let store = InMemoryPersonStore::new(people.clone());
    let search = PersonSearch::new(client_for(&people), SearchConfig::default(), store);
    let page = search.search(Some("Smith"), SearchRequest::default()).expect("page");
    let ids: Vec<u64> = page.people.iter().map(|p| p.person_id).collect();
    assert_eq!(ids.len(), 2);
    assert!(ids.iter().all(|id| [2, 3].contains(id)));

    let partial = InMemoryPersonStore::new(people.into_iter().filter(|p| p.person_id != 3));
    let search = PersonSearch::new(client_for(&scenario_people()), SearchConfig::default(), partial);
    let err = search.search(Some("Smith"), SearchRequest::default()).expect_err("drift");
    assert!(matches!(err, SearchError::Consistency { id: 3 }));
}
