use std::ops::Bound;
use std::path::PathBuf;

use tantivy::collector::{Count, TopDocs};
use tantivy::query::{
	AllQuery, BooleanQuery, BoostQuery, ConstScoreQuery, EmptyQuery, Occur, Query, RangeQuery, RegexQuery, TermQuery,
};
use tantivy::schema::{Field, Schema, Value};
use tantivy::{Index, IndexReader, ReloadPolicy, TantivyDocument, Term};
use tracing::{debug, trace};

use personsearch_core::error::{Result, SearchError};
use personsearch_core::fields::PERSON_ID;
use personsearch_core::predicate::{Predicate, TermValue};
use personsearch_core::traits::IndexClient;
use personsearch_core::types::IndexHit;

use crate::tantivy_utils::{record_option, register_tokenizer, unavailable, MISSING};

/// Executes [`Predicate`] trees against a tantivy person index.
pub struct TantivyIndexClient {
	reader: IndexReader,
	schema: Schema,
	person_id_field: Field,
}

impl TantivyIndexClient {
	pub fn open(index_dir: PathBuf) -> Result<Self> {
		let index = Index::open_in_dir(&index_dir).map_err(unavailable)?;
		register_tokenizer(&index);
		Self::new(index)
	}

	pub fn new(index: Index) -> Result<Self> {
		let reader = index.reader_builder().reload_policy(ReloadPolicy::Manual).try_into().map_err(unavailable)?;
		let schema = index.schema();
		let person_id_field = schema.get_field(PERSON_ID).map_err(|e| SearchError::Configuration(e.to_string()))?;
		Ok(Self { reader, schema, person_id_field })
	}

	fn field(&self, name: &str) -> Result<Field> {
		self.schema.get_field(name).map_err(|_| SearchError::Configuration(format!("unknown index field '{name}'")))
	}

	fn regex_query(&self, field: &str, pattern: &str) -> Result<Box<dyn Query>> {
		let query = RegexQuery::from_pattern(pattern, self.field(field)?)
			.map_err(|e| SearchError::Configuration(format!("invalid pattern for {field}: {e}")))?;
		Ok(Box::new(query))
	}

	fn term_query(&self, term: Term) -> Box<dyn Query> {
		let option = record_option(&self.schema, term.field());
		Box::new(TermQuery::new(term, option))
	}

	/// Translate a predicate tree into a tantivy query.
	pub fn to_query(&self, predicate: &Predicate) -> Result<Box<dyn Query>> {
		Ok(match predicate {
			Predicate::MatchAll => Box::new(AllQuery),
			Predicate::MatchNone => Box::new(EmptyQuery),
			Predicate::Term { field, value } => {
				let f = self.field(field)?;
				let term = match value {
					TermValue::Text(s) => Term::from_field_text(f, s),
					TermValue::Bool(b) => Term::from_field_bool(f, *b),
					TermValue::U64(v) => Term::from_field_u64(f, *v),
					TermValue::I64(v) => Term::from_field_i64(f, *v),
				};
				self.term_query(term)
			}
			Predicate::Prefix { field, value } => self.regex_query(field, &format!("{}.*", regex::escape(value)))?,
			Predicate::Contains { field, value } => self.regex_query(field, &format!(".*{}.*", regex::escape(value)))?,
			Predicate::Regex { field, pattern } => self.regex_query(field, pattern)?,
			Predicate::Range { field, lower, upper } => {
				let f = self.field(field)?;
				Box::new(RangeQuery::new(
					Bound::Included(Term::from_field_i64(f, *lower)),
					Bound::Excluded(Term::from_field_i64(f, *upper)),
				))
			}
			Predicate::Missing { field } => self.term_query(Term::from_field_text(self.field(MISSING)?, field)),
			Predicate::And(parts) => {
				let mut clauses: Vec<(Occur, Box<dyn Query>)> = Vec::with_capacity(parts.len());
				for part in parts {
					clauses.push(match part {
						Predicate::Not(inner) => (Occur::MustNot, self.to_query(inner)?),
						other => (Occur::Must, self.to_query(other)?),
					});
				}
				// A purely negative boolean query matches nothing in tantivy.
				if clauses.iter().all(|(occur, _)| *occur == Occur::MustNot) {
					clauses.push((Occur::Must, Box::new(AllQuery)));
				}
				Box::new(BooleanQuery::new(clauses))
			}
			Predicate::Or(parts) => {
				let mut clauses: Vec<(Occur, Box<dyn Query>)> = Vec::with_capacity(parts.len());
				for part in parts {
					clauses.push((Occur::Should, self.to_query(part)?));
				}
				Box::new(BooleanQuery::new(clauses))
			}
			Predicate::Not(inner) => Box::new(BooleanQuery::new(vec![
				(Occur::Must, Box::new(AllQuery) as Box<dyn Query>),
				(Occur::MustNot, self.to_query(inner)?),
			])),
			Predicate::Boost(inner, boost) => Box::new(BoostQuery::new(self.to_query(inner)?, *boost)),
			Predicate::Filter(inner) => Box::new(ConstScoreQuery::new(self.to_query(inner)?, 0.0)),
		})
	}
}

impl IndexClient for TantivyIndexClient {
	fn execute(&self, predicate: &Predicate) -> Result<Vec<IndexHit>> {
		if predicate.is_never() { return Ok(Vec::new()); }
		let query = self.to_query(predicate)?;
		let searcher = self.reader.searcher();
		let total = searcher.search(&*query, &Count).map_err(unavailable)?;
		trace!(query = %predicate, total, "executing index query");
		if total == 0 { return Ok(Vec::new()); }
		let top_docs = searcher.search(&*query, &TopDocs::with_limit(total)).map_err(unavailable)?;
		let mut hits = Vec::with_capacity(top_docs.len());
		for (score, address) in top_docs {
			let doc: TantivyDocument = searcher.doc(address).map_err(unavailable)?;
			let entity_id = doc
				.get_first(self.person_id_field)
				.and_then(|v| v.as_u64())
				.ok_or_else(|| SearchError::IndexUnavailable(format!("document {address:?} has no {PERSON_ID}")))?;
			hits.push(IndexHit { entity_id, score });
		}
		debug!(hits = hits.len(), "index query returned");
		Ok(hits)
	}

	fn count(&self, predicate: &Predicate) -> Result<u64> {
		if predicate.is_never() { return Ok(0); }
		let query = self.to_query(predicate)?;
		let total = self.reader.searcher().search(&*query, &Count).map_err(unavailable)?;
		Ok(total as u64)
	}
}
