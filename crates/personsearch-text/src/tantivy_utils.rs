use tantivy::schema::{
	FieldType, IndexRecordOption, Schema, TextFieldIndexing, TextOptions, FAST, INDEXED, STORED, STRING,
};
use tantivy::tokenizer::{LowerCaser, TextAnalyzer, WhitespaceTokenizer};
use tantivy::Index;

use personsearch_core::error::SearchError;
use personsearch_core::fields::*;

/// Lists the names of fields a document has no value for.
pub const MISSING: &str = "_missing";
pub const NAME_TOKENIZER: &str = "person_name";

const NAME_TEXT_FIELDS: [&str; 5] = [GIVEN_NAME, MIDDLE_NAME, FAMILY_NAME, FAMILY_NAME2, ATTRIBUTE_VALUE];
const KEYWORD_FIELDS: [&str; 10] = [
	KIND, GENDER, MISSING, GIVEN_NAME_SOUNDEX, MIDDLE_NAME_SOUNDEX, FAMILY_NAME_SOUNDEX,
	FAMILY_NAME2_SOUNDEX, IDENTIFIER_LOWER, ATTRIBUTE_TYPE, IDENTIFIER,
];
const FLAG_FIELDS: [&str; 5] = [VOIDED, PERSON_VOIDED, IS_PATIENT, DEAD, SEARCHABLE];

pub fn build_schema() -> Schema {
	let mut schema_builder = Schema::builder();
	schema_builder.add_u64_field(PERSON_ID, INDEXED | STORED | FAST);
	schema_builder.add_u64_field(IDENTIFIER_TYPE, INDEXED | FAST);
	schema_builder.add_i64_field(BIRTHDATE, INDEXED | FAST);
	for name in FLAG_FIELDS { schema_builder.add_bool_field(name, INDEXED); }
	for name in KEYWORD_FIELDS {
		let options = if name == IDENTIFIER { STRING | STORED } else { STRING };
		schema_builder.add_text_field(name, options);
	}
	let name_indexing = TextFieldIndexing::default().set_tokenizer(NAME_TOKENIZER).set_index_option(IndexRecordOption::WithFreqs);
	let name_options = TextOptions::default().set_indexing_options(name_indexing);
	for name in NAME_TEXT_FIELDS { schema_builder.add_text_field(name, name_options.clone()); }
	schema_builder.build()
}

/// Names are split on whitespace only so that `o'brien` or `jean-luc` stay whole
/// terms, matching how queries are tokenized.
pub fn register_tokenizer(index: &Index) {
	let tokenizer = TextAnalyzer::builder(WhitespaceTokenizer::default())
		.filter(LowerCaser)
		.build();
	index.tokenizers().register(NAME_TOKENIZER, tokenizer);
}

/// Postings detail to request for a term query on `field`.
pub fn record_option(schema: &Schema, field: tantivy::schema::Field) -> IndexRecordOption {
	match schema.get_field_entry(field).field_type() {
		FieldType::Str(options) => options.get_indexing_options().map_or(IndexRecordOption::Basic, |i| i.index_option()),
		_ => IndexRecordOption::Basic,
	}
}

pub(crate) fn unavailable(e: impl std::fmt::Display) -> SearchError {
	SearchError::IndexUnavailable(e.to_string())
}
