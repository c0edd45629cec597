//! Bulk update input and its application to a criteria map

use crate::error::ProjectionError;
use indexmap::IndexMap;
use pipelines_common::{CriteriaKey, CriteriaKind, CriteriaValue, KeyValueChange};
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

/// Input accepted by `FiltersSortManager::bulk_update`.
#[derive(Debug, Clone, PartialEq)]
pub enum BulkUpdate<FC, SC> {
    /// Typed changes. Later entries for the same key win.
    Changes(Vec<KeyValueChange<FC, SC>>),
    /// JSON-encoded halves, as read back from the URL.
    Projection(CriteriaProjection),
}

impl<FC, SC> From<Vec<KeyValueChange<FC, SC>>> for BulkUpdate<FC, SC> {
    fn from(changes: Vec<KeyValueChange<FC, SC>>) -> Self {
        BulkUpdate::Changes(changes)
    }
}

impl<FC, SC> From<CriteriaProjection> for BulkUpdate<FC, SC> {
    fn from(projection: CriteriaProjection) -> Self {
        BulkUpdate::Projection(projection)
    }
}

/// Query-string projection of both criteria maps.
///
/// Each half is the JSON object text written under its query parameter.
/// A missing half reads as an empty object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CriteriaProjection {
    pub filter: Option<String>,
    pub sort: Option<String>,
}

impl CriteriaProjection {
    pub fn new(filter: Option<String>, sort: Option<String>) -> Self {
        Self { filter, sort }
    }

    /// Pick the two projection parameters out of a raw query string.
    /// A leading `?` is accepted; other parameters are ignored.
    pub fn from_query(
        query: &str,
        filter_key: &str,
        sort_key: &str,
    ) -> Result<Self, ProjectionError> {
        let query = query.strip_prefix('?').unwrap_or(query);
        let pairs: Vec<(String, String)> = serde_urlencoded::from_str(query)?;

        let mut projection = Self::default();
        for (key, value) in pairs {
            if key == filter_key {
                projection.filter = Some(value);
            } else if key == sort_key {
                projection.sort = Some(value);
            }
        }
        Ok(projection)
    }
}

/// Parsed input for one criteria map. `None` values request removal.
pub(crate) type CriteriaInput<K> = HashMap<K, Option<CriteriaValue>>;

/// Split typed changes per map, keeping the last value seen for each key.
pub(crate) fn split_changes<FC: CriteriaKey, SC: CriteriaKey>(
    changes: Vec<KeyValueChange<FC, SC>>,
) -> (CriteriaInput<FC>, CriteriaInput<SC>) {
    let mut filters = HashMap::new();
    let mut sorts = HashMap::new();
    for change in changes {
        match change {
            KeyValueChange::Filter(key, value) => {
                filters.insert(key, value);
            }
            KeyValueChange::Sort(key, value) => {
                sorts.insert(key, value);
            }
        }
    }
    (filters, sorts)
}

/// Decode one projection half. JSON `null` and a missing half are empty.
pub(crate) fn parse_projection_half(
    raw: Option<&str>,
    kind: CriteriaKind,
) -> Result<IndexMap<String, Value>, ProjectionError> {
    let Some(raw) = raw else {
        return Ok(IndexMap::new());
    };
    let parsed: Option<IndexMap<String, Value>> =
        serde_json::from_str(raw).map_err(|source| ProjectionError::Json { kind, source })?;
    Ok(parsed.unwrap_or_default())
}

/// Resolve projection entries against the known vocabulary.
pub(crate) fn resolve_known<K: CriteriaKey>(
    entries: IndexMap<String, Value>,
    known: &[K],
) -> CriteriaInput<K> {
    entries
        .into_iter()
        .filter_map(|(name, value)| match known.iter().find(|k| k.as_str() == name) {
            Some(key) => Some((*key, json_to_criteria_value(value))),
            None => {
                debug!("Ignoring unknown criteria key '{}'", name);
                None
            }
        })
        .collect()
}

fn json_to_criteria_value(value: Value) -> Option<CriteriaValue> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(CriteriaValue::Text(s)),
        Value::Number(n) => Some(match n.as_i64() {
            Some(n) => CriteriaValue::Number(n),
            None => CriteriaValue::Text(n.to_string()),
        }),
        Value::Bool(b) => Some(CriteriaValue::Text(b.to_string())),
        other => {
            debug!("Ignoring non-scalar criteria value {}", other);
            None
        }
    }
}

/// Apply parsed input to one criteria map, walking the known keys in order.
///
/// Returns the `(key, value)` pairs that actually changed storage.
pub(crate) fn apply_known<K: CriteriaKey>(
    store: &mut IndexMap<K, CriteriaValue>,
    known: &[K],
    input: &CriteriaInput<K>,
    clear_previous_values: bool,
    normalize: fn(CriteriaValue) -> Option<CriteriaValue>,
) -> Vec<(K, Option<CriteriaValue>)> {
    let mut applied = Vec::new();

    for key in known {
        match input.get(key) {
            Some(value) => match value.clone().and_then(normalize) {
                Some(value) => {
                    if store.get(key) != Some(&value) {
                        store.insert(*key, value.clone());
                        applied.push((*key, Some(value)));
                    }
                }
                None => {
                    if store.shift_remove(key).is_some() {
                        applied.push((*key, None));
                    }
                }
            },
            None => {
                if clear_previous_values && store.shift_remove(key).is_some() {
                    applied.push((*key, None));
                }
            }
        }
    }

    applied
}
