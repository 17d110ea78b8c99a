//! Package-manager version ordering.
//!
//! Debian and RPM version strings are not semver. They carry an optional epoch
//! (`1:`), any number of dot separated components and a trailing release
//! (`-1`, `-1.el8`). This module provides a numeric-aware total order over such
//! strings and the "minor branch" key used to group patch releases.

mod minor;

use std::cmp::Ordering;
use std::fmt;

pub use minor::{MinorBranch, extract_minor};

/// One run of a tokenized version string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Token {
    /// Digits with leading zeros removed ("0" for an all-zero run).
    Number(String),
    Text(String),
}

impl Ord for Token {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            // Unbounded integers: more significant digits wins, then lexical.
            (Token::Number(a), Token::Number(b)) => {
                a.len().cmp(&b.len()).then_with(|| a.cmp(b))
            }
            (Token::Text(a), Token::Text(b)) => a.cmp(b),
            (Token::Number(_), Token::Text(_)) => Ordering::Greater,
            (Token::Text(_), Token::Number(_)) => Ordering::Less,
        }
    }
}

impl PartialOrd for Token {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Ordered representation of a version string.
///
/// Two keys compare token by token. A key that runs out of tokens first is the
/// smaller one, so `22.3` sorts before `22.3.4`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VersionKey {
    tokens: Vec<Token>,
}

impl VersionKey {
    pub fn new(version: &str) -> Self {
        Self {
            tokens: tokenize(strip_epoch(version)),
        }
    }
}

impl From<&str> for VersionKey {
    fn from(version: &str) -> Self {
        VersionKey::new(version)
    }
}

impl fmt::Display for VersionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for token in &self.tokens {
            match token {
                Token::Number(n) => write!(f, "{}", n)?,
                Token::Text(t) => write!(f, "{}", t)?,
            }
        }
        Ok(())
    }
}

/// Compares two version strings.
pub fn compare(a: &str, b: &str) -> Ordering {
    VersionKey::new(a).cmp(&VersionKey::new(b))
}

/// Compares two version strings, falling back to the raw text when they are equal
/// under [`compare`]. This is a strict total order over distinct strings.
pub fn compare_strict(a: &str, b: &str) -> Ordering {
    compare(a, b).then_with(|| a.cmp(b))
}

/// Removes a leading epoch (`1:`, `12:`) if present.
pub fn strip_epoch(version: &str) -> &str {
    match version.split_once(':') {
        Some((epoch, rest)) if !epoch.is_empty() && epoch.bytes().all(|b| b.is_ascii_digit()) => {
            rest
        }
        _ => version,
    }
}

fn tokenize(version: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut numeric = false;

    for c in version.chars() {
        let is_digit = c.is_ascii_digit();
        if !current.is_empty() && is_digit != numeric {
            tokens.push(make_token(std::mem::take(&mut current), numeric));
        }
        numeric = is_digit;
        current.push(c);
    }
    if !current.is_empty() {
        tokens.push(make_token(current, numeric));
    }

    tokens
}

fn make_token(run: String, numeric: bool) -> Token {
    if numeric {
        let trimmed = run.trim_start_matches('0');
        Token::Number(if trimmed.is_empty() {
            "0".to_string()
        } else {
            trimmed.to_string()
        })
    } else {
        Token::Text(run)
    }
}
