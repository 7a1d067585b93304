//! Index field names and the match-mode driven field selection.

use crate::types::{EntityKind, IndexField, MatchMode};

pub const KIND: &str = "kind";
pub const PERSON_ID: &str = "personId";
pub const VOIDED: &str = "voided";
pub const PERSON_VOIDED: &str = "personVoided";
pub const IS_PATIENT: &str = "isPatient";
pub const DEAD: &str = "dead";
pub const GENDER: &str = "gender";
pub const BIRTHDATE: &str = "birthdate";

pub const GIVEN_NAME: &str = "givenName";
pub const MIDDLE_NAME: &str = "middleName";
pub const FAMILY_NAME: &str = "familyName";
pub const FAMILY_NAME2: &str = "familyName2";

pub const GIVEN_NAME_SOUNDEX: &str = "givenNameSoundex";
pub const MIDDLE_NAME_SOUNDEX: &str = "middleNameSoundex";
pub const FAMILY_NAME_SOUNDEX: &str = "familyNameSoundex";
pub const FAMILY_NAME2_SOUNDEX: &str = "familyName2Soundex";

pub const IDENTIFIER: &str = "identifier";
pub const IDENTIFIER_LOWER: &str = "identifierLower";
pub const IDENTIFIER_TYPE: &str = "identifierType";

pub const ATTRIBUTE_VALUE: &str = "attributeValue";
pub const ATTRIBUTE_TYPE: &str = "attributeType";
pub const SEARCHABLE: &str = "searchable";

/// Plain name fields, in the same order as [`SOUNDEX_FIELDS`].
pub const NAME_FIELDS: [&str; 4] = [GIVEN_NAME, MIDDLE_NAME, FAMILY_NAME, FAMILY_NAME2];

/// Soundex fields in positional order: given, middle, family, family2.
pub const SOUNDEX_FIELDS: [&str; 4] =
    [GIVEN_NAME_SOUNDEX, MIDDLE_NAME_SOUNDEX, FAMILY_NAME_SOUNDEX, FAMILY_NAME2_SOUNDEX];

const fn field(name: &'static str, tier: MatchMode, boost: f32) -> IndexField {
    IndexField { name, tier, boost }
}

const NAME_EXACT: [IndexField; 4] = [
    field(GIVEN_NAME, MatchMode::Exact, 8.0),
    field(MIDDLE_NAME, MatchMode::Exact, 4.0),
    field(FAMILY_NAME, MatchMode::Exact, 8.0),
    field(FAMILY_NAME2, MatchMode::Exact, 4.0),
];
const NAME_START: [IndexField; 4] = [
    field(GIVEN_NAME, MatchMode::Start, 4.0),
    field(MIDDLE_NAME, MatchMode::Start, 2.0),
    field(FAMILY_NAME, MatchMode::Start, 4.0),
    field(FAMILY_NAME2, MatchMode::Start, 2.0),
];
const NAME_ANYWHERE: [IndexField; 4] = [
    field(GIVEN_NAME, MatchMode::Anywhere, 2.0),
    field(MIDDLE_NAME, MatchMode::Anywhere, 1.0),
    field(FAMILY_NAME, MatchMode::Anywhere, 2.0),
    field(FAMILY_NAME2, MatchMode::Anywhere, 1.0),
];

const ATTRIBUTE_EXACT: IndexField = field(ATTRIBUTE_VALUE, MatchMode::Exact, 4.0);
const ATTRIBUTE_START: IndexField = field(ATTRIBUTE_VALUE, MatchMode::Start, 2.0);
const ATTRIBUTE_ANYWHERE: IndexField = field(ATTRIBUTE_VALUE, MatchMode::Anywhere, 1.0);

const IDENTIFIER_EXACT: IndexField = field(IDENTIFIER, MatchMode::Exact, 8.0);
const IDENTIFIER_START: IndexField = field(IDENTIFIER, MatchMode::Start, 4.0);
const IDENTIFIER_ANYWHERE: IndexField = field(IDENTIFIER, MatchMode::Anywhere, 2.0);

/// Fields to search for `kind` under `mode`, highest tier first.
///
/// For attributes `mode` is the deployment's attribute match mode: the
/// substring variant is only appended when it is `Anywhere`.
pub fn select_fields(kind: EntityKind, mode: MatchMode) -> Vec<IndexField> {
    match (kind, mode) {
        (EntityKind::Name, MatchMode::Exact) => NAME_EXACT.to_vec(),
        (EntityKind::Name, MatchMode::Start) => [NAME_EXACT, NAME_START].concat(),
        (EntityKind::Name, MatchMode::Anywhere) => [NAME_EXACT, NAME_START, NAME_ANYWHERE].concat(),
        (EntityKind::Attribute, MatchMode::Exact) => vec![ATTRIBUTE_EXACT],
        (EntityKind::Attribute, MatchMode::Start) => vec![ATTRIBUTE_EXACT, ATTRIBUTE_START],
        (EntityKind::Attribute, MatchMode::Anywhere) => vec![ATTRIBUTE_EXACT, ATTRIBUTE_ANYWHERE],
        (EntityKind::Identifier, MatchMode::Exact) => vec![IDENTIFIER_EXACT],
        (EntityKind::Identifier, MatchMode::Start) => vec![IDENTIFIER_EXACT, IDENTIFIER_START],
        (EntityKind::Identifier, MatchMode::Anywhere) => {
            vec![IDENTIFIER_EXACT, IDENTIFIER_START, IDENTIFIER_ANYWHERE]
        }
    }
}
