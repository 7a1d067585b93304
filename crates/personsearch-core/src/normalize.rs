//! Query normalization and name tokenization.

use regex::Regex;
use std::sync::OnceLock;

use crate::types::NameToken;

const RESERVED: &[char] = &[
    '+', '-', '&', '|', '!', '(', ')', '{', '}', '[', ']', '^', '"', '~', '*', '?', ':', '\\', '/',
];

static SEPARATORS: OnceLock<Regex> = OnceLock::new();

fn separators() -> &'static Regex {
    // commas (with any surrounding whitespace) and whitespace runs
    SEPARATORS.get_or_init(|| Regex::new(r"(?:\s*,[\s,]*)|\s+").expect("static separator regex"))
}

/// Backslash-escape characters reserved by index query syntax.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if RESERVED.contains(&c) { out.push('\\'); }
        out.push(c);
    }
    out
}

/// Inverse of [`escape`]: drops the backslash in front of any escaped character.
pub fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() { out.push(next); }
        } else {
            out.push(c);
        }
    }
    out
}

/// Collapse commas and whitespace runs to single spaces, trim, then escape.
pub fn normalize(raw: &str) -> String {
    let collapsed = separators().replace_all(raw, " ");
    escape(collapsed.trim())
}

/// Split a normalized query into positioned, unescaped tokens.
pub fn tokenize(normalized: &str) -> Vec<NameToken> {
    normalized
        .split_whitespace()
        .map(unescape)
        .filter(|t| !t.is_empty())
        .enumerate()
        .map(|(position, text)| NameToken { position, text })
        .collect()
}

/// `true` if the query looks like an identifier rather than a name.
pub fn is_numeric_shaped(s: &str) -> bool { s.chars().any(|c| c.is_ascii_digit()) }
