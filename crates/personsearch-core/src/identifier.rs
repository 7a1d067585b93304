//! Identifier sub-query construction: exact, template, regex and prefix/substring matching.
//!
//! Administrators can configure
//! - search pattern templates (`search_patterns`), a comma separated list such as
//!   `@SEARCH@,@SEARCH-1@-@CHECKDIGIT@`, expanded per query and OR-ed together;
//! - an identifier regex (`regex`) containing `@SEARCH@`. A leading `^X*@SEARCH@`
//!   also declares `X` as padding, stripped from queries before matching;
//! - literal `prefix`/`suffix` strings wrapped around the query in the fallback
//!   prefix/substring match.

use regex::Regex;
use std::collections::BTreeSet;
use std::sync::OnceLock;

use crate::config::SearchConfig;
use crate::error::{Result, SearchError};
use crate::fields::{self, select_fields};
use crate::filters::not_voided;
use crate::predicate::Predicate;
use crate::types::{EntityKind, IdentifierTypeRef, IndexField, MatchMode};

pub const SEARCH: &str = "@SEARCH@";
pub const SEARCH_MINUS_ONE: &str = "@SEARCH-1@";
pub const CHECKDIGIT: &str = "@CHECKDIGIT@";

static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
static PADDING: OnceLock<Regex> = OnceLock::new();

fn placeholder() -> &'static Regex {
    PLACEHOLDER.get_or_init(|| Regex::new(r"@[A-Z0-9-]+@").expect("static placeholder regex"))
}

fn padding_shape() -> &'static Regex {
    PADDING.get_or_init(|| Regex::new(r"^\^(\\?.)\*@SEARCH@").expect("static padding regex"))
}

/// Split and check a comma separated template list.
pub fn parse_search_patterns(raw: &str) -> Result<Vec<String>> {
    let mut templates = Vec::new();
    for part in raw.split(',') {
        let template = part.trim();
        if template.is_empty() {
            return Err(SearchError::Configuration(format!("empty identifier search pattern in '{raw}'")));
        }
        let mut found = false;
        for m in placeholder().find_iter(template) {
            match m.as_str() {
                SEARCH | SEARCH_MINUS_ONE | CHECKDIGIT => found = true,
                other => {
                    return Err(SearchError::Configuration(format!(
                        "unknown placeholder {other} in identifier search pattern '{template}'"
                    )))
                }
            }
        }
        if !found {
            return Err(SearchError::Configuration(format!(
                "identifier search pattern '{template}' has no placeholder"
            )));
        }
        templates.push(template.to_string());
    }
    Ok(templates)
}

/// `identifier` without its last character, and that character. Both are
/// empty for identifiers shorter than two characters.
fn split_check_digit(identifier: &str) -> (&str, &str) {
    match identifier.char_indices().next_back() {
        Some((i, _)) if i > 0 => identifier.split_at(i),
        _ => ("", ""),
    }
}

/// Substitute `identifier` into one template.
pub fn expand_template(template: &str, identifier: &str) -> String {
    let (minus_one, check_digit) = split_check_digit(identifier);
    template
        .replace(SEARCH_MINUS_ONE, minus_one)
        .replace(CHECKDIGIT, check_digit)
        .replace(SEARCH, identifier)
}

/// Concrete search strings for `identifier`, de-duplicated. A template whose
/// placeholders all expand to nothing contributes no string, even when it
/// carries literal separators.
pub fn expand_search_patterns(templates: &[String], identifier: &str) -> Vec<String> {
    let (minus_one, _) = split_check_digit(identifier);
    let mut out: Vec<String> = Vec::new();
    for t in templates {
        if minus_one.is_empty() && !t.contains(SEARCH) {
            continue;
        }
        let s = expand_template(t, identifier);
        if !s.is_empty() && !out.contains(&s) {
            out.push(s);
        }
    }
    out
}

/// Administrator identifier regex with its padding character, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct IdentifierRegex {
    raw: String,
    padding: Option<char>,
}

impl IdentifierRegex {
    pub fn parse(raw: &str) -> Result<Self> {
        if !raw.contains(SEARCH) {
            return Err(SearchError::Configuration(format!("identifier regex '{raw}' lacks {SEARCH}")));
        }
        let padding = padding_shape()
            .captures(raw)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().chars().last());
        Ok(Self { raw: raw.to_string(), padding })
    }

    pub fn padding(&self) -> Option<char> { self.padding }

    /// Remove a leading run of the padding character, keeping at least one
    /// character of input.
    pub fn strip_padding<'a>(&self, identifier: &'a str) -> &'a str {
        match self.padding {
            Some(p) => {
                let stripped = identifier.trim_start_matches(p);
                if stripped.is_empty() { identifier } else { stripped }
            }
            None => identifier,
        }
    }

    /// Pattern for a whole-term regex match of `identifier`. Anchors are
    /// dropped since term regexes are implicitly anchored.
    pub fn compile_for(&self, identifier: &str) -> Result<String> {
        let substituted = self.raw.replace(SEARCH, &regex::escape(identifier));
        let body = substituted.strip_prefix('^').unwrap_or(&substituted);
        let body = body.strip_suffix('$').unwrap_or(body).to_string();
        Regex::new(&format!("^(?:{body})$"))?;
        Ok(body)
    }
}

/// Builds the identifier sub-query from a request-scoped [`SearchConfig`].
#[derive(Debug, Clone)]
pub struct IdentifierMatcher {
    templates: Vec<String>,
    regex: Option<IdentifierRegex>,
    prefix: String,
    suffix: String,
    match_mode: MatchMode,
    case_sensitive: bool,
}

impl IdentifierMatcher {
    pub fn new(config: &SearchConfig) -> Result<Self> {
        let id = &config.identifier;
        let templates = match id.search_patterns.as_deref().map(str::trim) {
            Some(p) if !p.is_empty() => parse_search_patterns(p)?,
            _ => Vec::new(),
        };
        let regex = match id.regex.as_deref().map(str::trim) {
            Some(r) if !r.is_empty() => Some(IdentifierRegex::parse(r)?),
            _ => None,
        };
        Ok(Self {
            templates,
            regex,
            prefix: id.prefix.clone(),
            suffix: id.suffix.clone(),
            match_mode: id.match_mode,
            case_sensitive: id.case_sensitive,
        })
    }

    /// Identifier sub-query restricted to non-voided patients of the given
    /// types. A blank identifier with types given matches every identifier of
    /// those types; blank with no types matches nothing.
    pub fn build_query(
        &self,
        raw_identifier: &str,
        identifier_types: &BTreeSet<IdentifierTypeRef>,
        exact: bool,
        include_voided: bool,
    ) -> Result<Predicate> {
        let raw = raw_identifier.trim();
        let value_clause = if raw.is_empty() {
            if identifier_types.is_empty() {
                return Ok(Predicate::MatchNone);
            }
            Predicate::MatchAll
        } else {
            let identifier = match &self.regex {
                Some(r) => r.strip_padding(raw),
                None => raw,
            };
            self.value_clause(identifier, exact)?
        };
        if value_clause.is_never() {
            return Ok(Predicate::MatchNone);
        }

        let mut parts = vec![
            Predicate::term(fields::KIND, EntityKind::Identifier.as_str()).filter(),
            value_clause,
        ];
        if !identifier_types.is_empty() {
            let types = identifier_types.iter().map(|t| Predicate::term(fields::IDENTIFIER_TYPE, t.0));
            parts.push(Predicate::or(types).filter());
        }
        parts.push(Predicate::term(fields::IS_PATIENT, true).filter());
        if !include_voided {
            parts.push(not_voided().filter());
        }
        Ok(Predicate::and(parts))
    }

    fn physical(&self, field: IndexField) -> IndexField {
        if self.case_sensitive || field.name != fields::IDENTIFIER {
            field
        } else {
            IndexField { name: fields::IDENTIFIER_LOWER, ..field }
        }
    }

    fn cased(&self, value: &str) -> String {
        if self.case_sensitive { value.to_string() } else { value.to_lowercase() }
    }

    fn value_clause(&self, identifier: &str, exact: bool) -> Result<Predicate> {
        let exact_field = self.physical(select_fields(EntityKind::Identifier, MatchMode::Exact)[0]);
        if exact {
            return Ok(Predicate::field_match(&exact_field, &self.cased(identifier)));
        }
        if !self.templates.is_empty() {
            let alternatives = expand_search_patterns(&self.templates, identifier)
                .into_iter()
                .map(|s| Predicate::field_match(&exact_field, &self.cased(&s)));
            return Ok(Predicate::or(alternatives));
        }
        if let Some(regex) = &self.regex {
            // regexes carry their own character classes, so match the stored casing
            return Ok(Predicate::Regex { field: fields::IDENTIFIER, pattern: regex.compile_for(identifier)? });
        }
        let padded = self.cased(&format!("{}{}{}", self.prefix, identifier, self.suffix));
        let alternatives = select_fields(EntityKind::Identifier, self.match_mode)
            .into_iter()
            .map(|f| Predicate::field_match(&self.physical(f), &padded));
        Ok(Predicate::or(alternatives))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IdentifierSearchConfig;

    fn matcher(id: IdentifierSearchConfig) -> IdentifierMatcher {
        IdentifierMatcher::new(&SearchConfig { identifier: id, ..SearchConfig::default() }).expect("matcher")
    }

    #[test]
    fn template_placeholders_expand() {
        assert_eq!(expand_template("@SEARCH-1@-@CHECKDIGIT@", "1001A"), "1001-A");
        assert_eq!(expand_template("@SEARCH@", "1001A"), "1001A");
        assert_eq!(expand_template("@SEARCH-1@", "7"), "");
        assert_eq!(expand_template("@CHECKDIGIT@", "7"), "");
    }

    #[test]
    fn expansion_drops_empty_and_duplicate_strings() {
        let templates = parse_search_patterns("@SEARCH@, @SEARCH-1@, @SEARCH@").expect("templates");
        assert_eq!(expand_search_patterns(&templates, "7"), vec!["7".to_string()]);

        let templates = parse_search_patterns("@SEARCH@,@SEARCH-1@-@CHECKDIGIT@").expect("templates");
        assert_eq!(expand_search_patterns(&templates, "7"), vec!["7".to_string()]);
        assert_eq!(expand_search_patterns(&templates, "1001A"), vec!["1001A".to_string(), "1001-A".to_string()]);

        let templates = parse_search_patterns("@SEARCH-1@-@CHECKDIGIT@").expect("templates");
        assert!(expand_search_patterns(&templates, "7").is_empty());
    }

    #[test]
    fn malformed_templates_are_configuration_errors() {
        for bad in ["@SEARCH@,,@SEARCH-1@", "@SEARCH@,@FOO@", "literal"] {
            let err = parse_search_patterns(bad).expect_err(bad);
            assert!(matches!(err, SearchError::Configuration(_)), "{bad}");
        }
    }

    #[test]
    fn padding_is_detected_and_stripped() {
        let r = IdentifierRegex::parse("^0*@SEARCH@([A-Z]+-[0-9])?$").expect("regex");
        assert_eq!(r.padding(), Some('0'));
        assert_eq!(r.strip_padding("000123"), "123");
        assert_eq!(r.strip_padding("000"), "000");
        let pattern = r.compile_for("123").expect("pattern");
        assert_eq!(pattern, "0*123([A-Z]+-[0-9])?");
        assert!(IdentifierRegex::parse("^[0-9]+$").is_err());
    }

    #[test]
    fn exact_search_is_single_term_on_lowercase_field() {
        let m = matcher(IdentifierSearchConfig::default());
        let p = m.build_query("2002B", &BTreeSet::new(), true, false).expect("query");
        let Predicate::And(parts) = p else { panic!("expected conjunction") };
        assert!(parts.iter().any(|p| matches!(p, Predicate::Boost(inner, _)
            if **inner == Predicate::term(fields::IDENTIFIER_LOWER, "2002b"))));
    }

    #[test]
    fn fallback_wraps_prefix_and_suffix() {
        let m = matcher(IdentifierSearchConfig {
            prefix: "MRN-".into(),
            suffix: "".into(),
            case_sensitive: true,
            ..IdentifierSearchConfig::default()
        });
        let p = m.value_clause("42", false).expect("clause");
        let Predicate::Or(alts) = p else { panic!("expected disjunction") };
        assert!(alts.iter().any(|a| matches!(a, Predicate::Boost(inner, _)
            if matches!(&**inner, Predicate::Prefix { field, value } if *field == fields::IDENTIFIER && value == "MRN-42"))));
    }

    #[test]
    fn blank_identifier_without_types_matches_nothing() {
        let m = matcher(IdentifierSearchConfig::default());
        assert_eq!(m.build_query("  ", &BTreeSet::new(), false, false).expect("query"), Predicate::MatchNone);
        let types: BTreeSet<_> = [IdentifierTypeRef(1)].into_iter().collect();
        assert_ne!(m.build_query("", &types, false, false).expect("query"), Predicate::MatchNone);
    }
}
