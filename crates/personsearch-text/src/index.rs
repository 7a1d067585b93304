use std::path::PathBuf;
use tantivy::schema::{Field, Schema};
use tantivy::{Index, IndexWriter, TantivyDocument, Term};
use tracing::{debug, info};

use personsearch_core::error::{Result, SearchError};
use personsearch_core::fields::*;
use personsearch_core::filters::day_timestamp;
use personsearch_core::soundex::soundex_words;
use personsearch_core::types::{EntityKind, PersonRecord};

use crate::search::TantivyIndexClient;
use crate::tantivy_utils::{build_schema, register_tokenizer, unavailable, MISSING};

const WRITER_HEAP_BYTES: usize = 50_000_000;

/// Writes person records as one document per name, identifier and attribute.
pub struct PersonIndexer {
	index: Index,
	schema: Schema,
}

impl PersonIndexer {
	/// Create a fresh index in `index_dir`, replacing any existing one.
	pub fn new(index_dir: PathBuf) -> Result<Self> {
		let schema = build_schema();
		if index_dir.exists() { std::fs::remove_dir_all(&index_dir).map_err(unavailable)?; }
		std::fs::create_dir_all(&index_dir).map_err(unavailable)?;
		let index = Index::create_in_dir(&index_dir, schema.clone()).map_err(unavailable)?;
		register_tokenizer(&index);
		Ok(Self { index, schema })
	}

	pub fn in_ram() -> Self {
		let schema = build_schema();
		let index = Index::create_in_ram(schema.clone());
		register_tokenizer(&index);
		Self { index, schema }
	}

	/// Index (or re-index) `people`. Existing documents of the same persons are
	/// replaced. Returns the number of documents written.
	pub fn index_people(&self, people: &[PersonRecord]) -> Result<usize> {
		let mut writer: IndexWriter = self.index.writer(WRITER_HEAP_BYTES).map_err(unavailable)?;
		let mut written = 0;
		for person in people {
			written += self.add_person(&mut writer, person)?;
		}
		writer.commit().map_err(unavailable)?;
		info!(people = people.len(), documents = written, "indexed person records");
		Ok(written)
	}

	/// Reader over everything committed so far.
	pub fn client(&self) -> Result<TantivyIndexClient> { TantivyIndexClient::new(self.index.clone()) }

	fn field(&self, name: &str) -> Result<Field> {
		self.schema.get_field(name).map_err(|e| SearchError::Configuration(e.to_string()))
	}

	fn add_person(&self, writer: &mut IndexWriter, person: &PersonRecord) -> Result<usize> {
		writer.delete_term(Term::from_field_u64(self.field(PERSON_ID)?, person.person_id));
		let mut docs = Vec::new();
		for name in &person.names {
			let mut doc = self.person_doc(person, EntityKind::Name, name.voided)?;
			let parts = [
				(GIVEN_NAME, GIVEN_NAME_SOUNDEX, &name.given_name),
				(MIDDLE_NAME, MIDDLE_NAME_SOUNDEX, &name.middle_name),
				(FAMILY_NAME, FAMILY_NAME_SOUNDEX, &name.family_name),
				(FAMILY_NAME2, FAMILY_NAME2_SOUNDEX, &name.family_name2),
			];
			for (text_field, soundex_field, value) in parts {
				let Some(value) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) else { continue };
				doc.add_text(self.field(text_field)?, value);
				for code in soundex_words(value) {
					doc.add_text(self.field(soundex_field)?, &code);
				}
			}
			docs.push(doc);
		}
		for id in &person.identifiers {
			let mut doc = self.person_doc(person, EntityKind::Identifier, id.voided)?;
			doc.add_text(self.field(IDENTIFIER)?, &id.identifier);
			doc.add_text(self.field(IDENTIFIER_LOWER)?, id.identifier.to_lowercase());
			doc.add_u64(self.field(IDENTIFIER_TYPE)?, id.identifier_type.0);
			docs.push(doc);
		}
		for attr in &person.attributes {
			let mut doc = self.person_doc(person, EntityKind::Attribute, attr.voided)?;
			doc.add_text(self.field(ATTRIBUTE_VALUE)?, &attr.value);
			doc.add_text(self.field(ATTRIBUTE_TYPE)?, &attr.attribute_type);
			doc.add_bool(self.field(SEARCHABLE)?, attr.searchable);
			docs.push(doc);
		}
		let count = docs.len();
		for doc in docs {
			writer.add_document(doc).map_err(unavailable)?;
		}
		debug!(person_id = person.person_id, documents = count, "queued person documents");
		Ok(count)
	}

	/// Person-level fields shared by every document of `person`.
	fn person_doc(&self, person: &PersonRecord, kind: EntityKind, voided: bool) -> Result<TantivyDocument> {
		let mut doc = TantivyDocument::default();
		doc.add_text(self.field(KIND)?, kind.as_str());
		doc.add_u64(self.field(PERSON_ID)?, person.person_id);
		doc.add_bool(self.field(VOIDED)?, voided);
		doc.add_bool(self.field(PERSON_VOIDED)?, person.voided);
		doc.add_bool(self.field(IS_PATIENT)?, person.is_patient);
		doc.add_bool(self.field(DEAD)?, person.dead);
		match person.gender.as_deref().map(str::trim).filter(|g| !g.is_empty()) {
			Some(gender) => doc.add_text(self.field(GENDER)?, gender.to_uppercase()),
			None => doc.add_text(self.field(MISSING)?, GENDER),
		}
		match person.birthdate {
			Some(date) => doc.add_i64(self.field(BIRTHDATE)?, day_timestamp(date)),
			None => doc.add_text(self.field(MISSING)?, BIRTHDATE),
		}
		Ok(doc)
	}
}
