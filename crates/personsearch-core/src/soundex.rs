//! Phonetic (American Soundex) name matching with positional weighting.
//!
//! Indexers store the soundex code of every word of each name part in the
//! `*Soundex` fields; [`SoundexNameMatcher`] turns a tokenized query into a
//! weighted disjunction over those fields. Token position decides which field
//! a token is most likely to represent: the first token leans towards the given
//! name and the last towards the family names, whatever the query length.

use crate::fields::{self, NAME_FIELDS, SOUNDEX_FIELDS};
use crate::filters::PersonFilter;
use crate::predicate::Predicate;
use crate::types::{EntityKind, FieldTokenWeight, NameToken};

/// Share of a soundex boost given to the same token spelled exactly.
const SPELLING_BOOST: f32 = 0.5;

fn spelled_field(soundex_field: &str) -> Option<&'static str> {
    SOUNDEX_FIELDS.iter().position(|f| *f == soundex_field).map(|i| NAME_FIELDS[i])
}

fn digit(c: char) -> Option<char> {
    match c {
        'B' | 'F' | 'P' | 'V' => Some('1'),
        'C' | 'G' | 'J' | 'K' | 'Q' | 'S' | 'X' | 'Z' => Some('2'),
        'D' | 'T' => Some('3'),
        'L' => Some('4'),
        'M' | 'N' => Some('5'),
        'R' => Some('6'),
        _ => None,
    }
}

/// Four character American Soundex code of `word`, ignoring non-letters.
/// Returns `None` when `word` has no ASCII letter.
pub fn soundex(word: &str) -> Option<String> {
    let mut letters = word.chars().filter(char::is_ascii_alphabetic).map(|c| c.to_ascii_uppercase());
    let first = letters.next()?;
    let mut code = String::with_capacity(4);
    code.push(first);
    let mut last = digit(first);
    for c in letters {
        if code.len() == 4 { break; }
        match c {
            // H and W do not separate equal codes
            'H' | 'W' => {}
            'A' | 'E' | 'I' | 'O' | 'U' | 'Y' => last = None,
            _ => {
                let d = digit(c);
                if d.is_some() && d != last {
                    code.extend(d);
                }
                last = d;
            }
        }
    }
    while code.len() < 4 { code.push('0'); }
    Some(code)
}

/// Soundex codes for each whitespace-separated word of a stored name part.
pub fn soundex_words(value: &str) -> Vec<String> {
    value.split_whitespace().filter_map(soundex).collect()
}

fn row(position: usize, boosts: [f32; 4]) -> impl Iterator<Item = FieldTokenWeight> {
    SOUNDEX_FIELDS
        .into_iter()
        .zip(boosts)
        .map(move |(field, boost)| FieldTokenWeight { position, field, boost })
}

/// The `(token, field) -> boost` table for a query of `token_count` tokens.
/// Queries longer than three tokens get a flat table.
pub fn positional_weights(token_count: usize) -> Vec<FieldTokenWeight> {
    match token_count {
        0 => Vec::new(),
        1 => row(0, [1.0; 4]).collect(),
        2 => row(0, [2.0, 2.0, 1.0, 1.0]).chain(row(1, [1.0, 1.0, 2.0, 2.0])).collect(),
        3 => row(0, [6.0, 2.0, 1.0, 1.0])
            .chain(row(1, [2.0, 6.0, 1.0, 1.0]))
            .chain(row(2, [1.0, 1.0, 6.0, 6.0]))
            .collect(),
        n => (0..n).flat_map(|p| row(p, [1.0; 4])).collect(),
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SoundexNameMatcher;

impl SoundexNameMatcher {
    pub fn new() -> Self { Self }

    /// Phonetic name sub-query. With up to three tokens every token must match
    /// some soundex field; longer queries accept any token on any field. A
    /// token spelled exactly as stored scores above a phonetic-only match.
    pub fn build_query(
        &self,
        tokens: &[NameToken],
        birth_year: Option<i32>,
        gender: Option<&str>,
        include_voided: bool,
    ) -> Predicate {
        let name_clause = self.name_clause(tokens);
        if name_clause.is_never() {
            return Predicate::MatchNone;
        }
        let filter = PersonFilter {
            include_voided,
            gender: gender.map(str::to_string),
            birth_year,
            dead: None,
        };
        Predicate::and(vec![
            Predicate::term(fields::KIND, EntityKind::Name.as_str()).filter(),
            name_clause,
            filter.to_predicate(),
        ])
    }

    fn name_clause(&self, tokens: &[NameToken]) -> Predicate {
        let codes: Vec<Option<String>> = tokens.iter().map(|t| soundex(&t.text)).collect();
        if codes.iter().all(Option::is_none) {
            return Predicate::MatchNone;
        }
        let weights = positional_weights(tokens.len());
        let clause_for = |position: usize| -> Option<Predicate> {
            let code = codes.get(position)?.as_deref()?;
            let spelling = tokens[position].text.to_lowercase();
            let row: Vec<&FieldTokenWeight> = weights.iter().filter(|w| w.position == position).collect();
            let phonetic = row.iter().map(|w| Predicate::term(w.field, code).boost(w.boost));
            let exact = row.iter().filter_map(|w| {
                let field = spelled_field(w.field)?;
                Some(Predicate::term(field, spelling.clone()).boost(w.boost * SPELLING_BOOST))
            });
            Some(Predicate::or(phonetic.chain(exact).collect::<Vec<_>>()))
        };
        if tokens.len() > 3 {
            Predicate::or((0..tokens.len()).filter_map(clause_for))
        } else {
            Predicate::and((0..tokens.len()).filter_map(clause_for))
        }
    }
}
