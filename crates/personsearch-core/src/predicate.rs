//! Typed query predicates handed to an [`IndexClient`](crate::traits::IndexClient).
//!
//! Matchers build a tree of match, boolean and range nodes; backends translate
//! it into their own query objects. Values are carried verbatim, so escaping
//! only happens when a predicate is rendered as text (see the `Display` impl).

use std::fmt;

use crate::normalize::escape;
use crate::types::{IndexField, MatchMode};

#[derive(Debug, Clone, PartialEq)]
pub enum TermValue {
    Text(String),
    Bool(bool),
    U64(u64),
    I64(i64),
}

impl From<&str> for TermValue {
    fn from(s: &str) -> Self { TermValue::Text(s.to_string()) }
}
impl From<String> for TermValue {
    fn from(s: String) -> Self { TermValue::Text(s) }
}
impl From<bool> for TermValue {
    fn from(b: bool) -> Self { TermValue::Bool(b) }
}
impl From<u64> for TermValue {
    fn from(v: u64) -> Self { TermValue::U64(v) }
}
impl From<i64> for TermValue {
    fn from(v: i64) -> Self { TermValue::I64(v) }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    MatchAll,
    MatchNone,
    /// Whole-term equality.
    Term { field: &'static str, value: TermValue },
    /// Some indexed term of `field` starts with `value`.
    Prefix { field: &'static str, value: String },
    /// Some indexed term of `field` contains `value`.
    Contains { field: &'static str, value: String },
    /// Some indexed term of `field` fully matches `pattern`.
    Regex { field: &'static str, pattern: String },
    /// `lower <= field < upper`.
    Range { field: &'static str, lower: i64, upper: i64 },
    /// The document has no value for `field`.
    Missing { field: &'static str },
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
    Not(Box<Predicate>),
    Boost(Box<Predicate>, f32),
    /// Restricts matches without contributing to the score.
    Filter(Box<Predicate>),
}

impl Predicate {
    pub fn term(field: &'static str, value: impl Into<TermValue>) -> Self {
        Predicate::Term { field, value: value.into() }
    }

    /// Match `value` against `field` with the operator its tier implies,
    /// boosted by the field boost.
    pub fn field_match(field: &IndexField, value: &str) -> Self {
        let node = match field.tier {
            MatchMode::Exact => Predicate::term(field.name, value),
            MatchMode::Start => Predicate::Prefix { field: field.name, value: value.to_string() },
            MatchMode::Anywhere => Predicate::Contains { field: field.name, value: value.to_string() },
        };
        node.boost(field.boost)
    }

    /// Conjunction with identity/absorbing elements folded away.
    pub fn and(parts: impl IntoIterator<Item = Predicate>) -> Self {
        let mut out = Vec::new();
        for p in parts {
            match p {
                Predicate::MatchAll => {}
                Predicate::MatchNone => return Predicate::MatchNone,
                Predicate::And(inner) => out.extend(inner),
                other => out.push(other),
            }
        }
        match out.len() {
            0 => Predicate::MatchAll,
            1 => out.remove(0),
            _ => Predicate::And(out),
        }
    }

    /// Disjunction; an empty disjunction never matches.
    pub fn or(parts: impl IntoIterator<Item = Predicate>) -> Self {
        let mut out = Vec::new();
        for p in parts {
            match p {
                Predicate::MatchNone => {}
                Predicate::Or(inner) => out.extend(inner),
                other => out.push(other),
            }
        }
        match out.len() {
            0 => Predicate::MatchNone,
            1 => out.remove(0),
            _ => Predicate::Or(out),
        }
    }

    pub fn negate(self) -> Self {
        match self {
            Predicate::MatchAll => Predicate::MatchNone,
            Predicate::MatchNone => Predicate::MatchAll,
            Predicate::Not(inner) => *inner,
            other => Predicate::Not(Box::new(other)),
        }
    }

    pub fn boost(self, boost: f32) -> Self {
        if (boost - 1.0).abs() < f32::EPSILON || self.is_never() {
            return self;
        }
        Predicate::Boost(Box::new(self), boost)
    }

    pub fn filter(self) -> Self {
        match self {
            Predicate::MatchAll | Predicate::MatchNone | Predicate::Filter(_) => self,
            other => Predicate::Filter(Box::new(other)),
        }
    }

    pub fn is_never(&self) -> bool { matches!(self, Predicate::MatchNone) }
}

impl fmt::Display for TermValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TermValue::Text(s) => write!(f, "{}", escape(s)),
            TermValue::Bool(b) => write!(f, "{b}"),
            TermValue::U64(v) => write!(f, "{v}"),
            TermValue::I64(v) => write!(f, "{v}"),
        }
    }
}

/// Lucene-style rendering, for logs and debugging.
impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::MatchAll => write!(f, "*:*"),
            Predicate::MatchNone => write!(f, "-*:*"),
            Predicate::Term { field, value } => write!(f, "{field}:{value}"),
            Predicate::Prefix { field, value } => write!(f, "{field}:{}*", escape(value)),
            Predicate::Contains { field, value } => write!(f, "{field}:*{}*", escape(value)),
            Predicate::Regex { field, pattern } => write!(f, "{field}:/{pattern}/"),
            Predicate::Range { field, lower, upper } => write!(f, "{field}:[{lower} TO {upper}}}"),
            Predicate::Missing { field } => write!(f, "-{field}:*"),
            Predicate::And(parts) => {
                write!(f, "(")?;
                for (i, p) in parts.iter().enumerate() {
                    if i > 0 { write!(f, " ")?; }
                    write!(f, "+{p}")?;
                }
                write!(f, ")")
            }
            Predicate::Or(parts) => {
                write!(f, "(")?;
                for (i, p) in parts.iter().enumerate() {
                    if i > 0 { write!(f, " ")?; }
                    write!(f, "{p}")?;
                }
                write!(f, ")")
            }
            Predicate::Not(inner) => write!(f, "-{inner}"),
            Predicate::Boost(inner, b) => write!(f, "{inner}^{b}"),
            Predicate::Filter(inner) => write!(f, "#{inner}"),
        }
    }
}
