//! Person-level restrictions shared by every sub-query.

use chrono::NaiveDate;

use crate::fields;
use crate::predicate::Predicate;
use crate::types::SearchRequest;

/// Seconds since the epoch at UTC midnight of `date`; the unit birthdates are
/// indexed in.
pub fn day_timestamp(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc().timestamp()).unwrap_or_default()
}

/// `[Jan 1 of year, Jan 1 of year + 1)` as indexed timestamps, `None` when the
/// year is outside the calendar range.
pub fn birth_year_range(year: i32) -> Option<(i64, i64)> {
    let lower = NaiveDate::from_ymd_opt(year, 1, 1)?;
    let upper = NaiveDate::from_ymd_opt(year.checked_add(1)?, 1, 1)?;
    Some((day_timestamp(lower), day_timestamp(upper)))
}

/// Born in `year` or birthdate unknown.
pub fn birth_year_predicate(year: i32) -> Predicate {
    match birth_year_range(year) {
        Some((lower, upper)) => Predicate::or(vec![
            Predicate::Range { field: fields::BIRTHDATE, lower, upper },
            Predicate::Missing { field: fields::BIRTHDATE },
        ]),
        None => Predicate::MatchNone,
    }
}

/// Non-voided entity row belonging to a non-voided person.
pub fn not_voided() -> Predicate {
    Predicate::and(vec![
        Predicate::term(fields::VOIDED, false),
        Predicate::term(fields::PERSON_VOIDED, false),
    ])
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PersonFilter {
    pub include_voided: bool,
    pub gender: Option<String>,
    pub birth_year: Option<i32>,
    pub dead: Option<bool>,
}

impl PersonFilter {
    pub fn from_request(req: &SearchRequest) -> Self {
        Self {
            include_voided: req.include_voided,
            gender: req.gender.clone(),
            birth_year: req.effective_birth_year(),
            dead: req.dead,
        }
    }

    /// Non-scoring conjunction of all active restrictions.
    pub fn to_predicate(&self) -> Predicate {
        let mut parts = Vec::new();
        if !self.include_voided {
            parts.push(not_voided());
        }
        if let Some(gender) = self.gender.as_deref().map(str::trim).filter(|g| !g.is_empty()) {
            parts.push(Predicate::term(fields::GENDER, gender.to_uppercase()));
        }
        if let Some(year) = self.birth_year.filter(|y| *y != 0) {
            parts.push(birth_year_predicate(year));
        }
        if let Some(dead) = self.dead {
            parts.push(Predicate::term(fields::DEAD, dead));
        }
        Predicate::and(parts).filter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn birth_year_range_is_half_open_calendar_year() {
        let (lo, hi) = birth_year_range(1970).expect("range");
        assert_eq!(lo, 0);
        assert_eq!(hi, 365 * 86_400);
    }

    #[test]
    fn birth_year_keeps_unknown_birthdates() {
        let p = birth_year_predicate(1980);
        let Predicate::Or(parts) = p else { panic!("expected disjunction") };
        assert!(parts.contains(&Predicate::Missing { field: fields::BIRTHDATE }));
    }

    #[test]
    fn include_voided_without_other_filters_matches_all() {
        let f = PersonFilter { include_voided: true, ..PersonFilter::default() };
        assert_eq!(f.to_predicate(), Predicate::MatchAll);
        let f = PersonFilter { include_voided: true, birth_year: Some(0), ..PersonFilter::default() };
        assert_eq!(f.to_predicate(), Predicate::MatchAll);
    }

    #[test]
    fn gender_is_upper_cased() {
        let f = PersonFilter { include_voided: true, gender: Some("f".into()), ..PersonFilter::default() };
        assert_eq!(f.to_predicate(), Predicate::Filter(Box::new(Predicate::term(fields::GENDER, "F"))));
    }
}
