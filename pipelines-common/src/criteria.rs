//! Filter and sort criteria vocabulary
//!
//! A filterable view declares two finite key sets (one for filters, one for
//! sort) by implementing [`CriteriaKey`] on its own enums. Values are kept in a
//! single closed [`CriteriaValue`] type so they serialize to the same JSON the
//! address bar carries.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::Hash;
use std::sync::OnceLock;

/// A key from a view's fixed criteria vocabulary.
///
/// `as_str` is the name used in the JSON projection written to the URL.
/// Two distinct keys of the same type must never return the same string.
pub trait CriteriaKey: Copy + Eq + Hash + fmt::Debug + Send + Sync + 'static {
    fn as_str(&self) -> &'static str;
}

impl CriteriaKey for &'static str {
    fn as_str(&self) -> &'static str {
        *self
    }
}

/// Value stored under a criteria key
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CriteriaValue {
    Number(i64),
    Text(String),
}

impl CriteriaValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CriteriaValue::Text(s) => Some(s),
            CriteriaValue::Number(_) => None,
        }
    }

    pub fn as_number(&self) -> Option<i64> {
        match self {
            CriteriaValue::Number(n) => Some(*n),
            CriteriaValue::Text(_) => None,
        }
    }

    /// Text form of this value. Numbers become their decimal representation.
    pub fn stringified(self) -> CriteriaValue {
        match self {
            CriteriaValue::Number(n) => CriteriaValue::Text(n.to_string()),
            text => text,
        }
    }
}

impl fmt::Display for CriteriaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CriteriaValue::Number(n) => write!(f, "{}", n),
            CriteriaValue::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for CriteriaValue {
    fn from(value: &str) -> Self {
        CriteriaValue::Text(value.to_string())
    }
}

impl From<String> for CriteriaValue {
    fn from(value: String) -> Self {
        CriteriaValue::Text(value)
    }
}

impl From<i64> for CriteriaValue {
    fn from(value: i64) -> Self {
        CriteriaValue::Number(value)
    }
}

impl From<i32> for CriteriaValue {
    fn from(value: i32) -> Self {
        CriteriaValue::Number(value as i64)
    }
}

impl From<u32> for CriteriaValue {
    fn from(value: u32) -> Self {
        CriteriaValue::Number(value as i64)
    }
}

/// Which criteria map a change belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CriteriaKind {
    Filter,
    Sort,
}

impl fmt::Display for CriteriaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CriteriaKind::Filter => write!(f, "filter"),
            CriteriaKind::Sort => write!(f, "sort"),
        }
    }
}

/// One criteria change: bulk-update input and observer payload.
///
/// `None` as the value always means the key was (or should be) removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyValueChange<FC, SC> {
    Filter(FC, Option<CriteriaValue>),
    Sort(SC, Option<CriteriaValue>),
}

impl<FC: CriteriaKey, SC: CriteriaKey> KeyValueChange<FC, SC> {
    pub fn filter(key: FC, value: impl Into<CriteriaValue>) -> Self {
        KeyValueChange::Filter(key, Some(value.into()))
    }

    pub fn clear_filter(key: FC) -> Self {
        KeyValueChange::Filter(key, None)
    }

    pub fn sort(key: SC, value: impl Into<CriteriaValue>) -> Self {
        KeyValueChange::Sort(key, Some(value.into()))
    }

    pub fn clear_sort(key: SC) -> Self {
        KeyValueChange::Sort(key, None)
    }

    pub fn kind(&self) -> CriteriaKind {
        match self {
            KeyValueChange::Filter(..) => CriteriaKind::Filter,
            KeyValueChange::Sort(..) => CriteriaKind::Sort,
        }
    }

    pub fn key_str(&self) -> &'static str {
        match self {
            KeyValueChange::Filter(key, _) => key.as_str(),
            KeyValueChange::Sort(key, _) => key.as_str(),
        }
    }

    pub fn value(&self) -> Option<&CriteriaValue> {
        match self {
            KeyValueChange::Filter(_, value) | KeyValueChange::Sort(_, value) => value.as_ref(),
        }
    }
}

fn signed_integer_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[+-]?[0-9]+$").expect("static pattern is valid"))
}

/// Normalize a filter value: filters are always stored as text.
pub fn normalize_filter_value(value: CriteriaValue) -> CriteriaValue {
    value.stringified()
}

/// Normalize a sort value coming from bulk input.
///
/// Signed digit-only text becomes a number, empty text is absent, any other
/// text passes through. Digit strings outside the `i64` range stay text.
pub fn normalize_sort_value(value: CriteriaValue) -> Option<CriteriaValue> {
    match value {
        CriteriaValue::Number(n) => Some(CriteriaValue::Number(n)),
        CriteriaValue::Text(text) if text.is_empty() => None,
        CriteriaValue::Text(text) => {
            if signed_integer_pattern().is_match(&text) {
                if let Ok(n) = text.parse::<i64>() {
                    return Some(CriteriaValue::Number(n));
                }
            }
            Some(CriteriaValue::Text(text))
        }
    }
}
