use super::UrlStateManager;
use crate::error::NavigationError;
use async_trait::async_trait;
use indexmap::IndexMap;
use pipelines_common::UpdateStrategy;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, error};

/// One address-bar state recorded by [`HistoryUrlState`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub url: String,
    /// How the entry was produced. `None` for the initial page load.
    pub strategy: Option<UpdateStrategy>,
}

struct HistoryState {
    base_url: String,
    params: IndexMap<String, String>,
    entries: Vec<HistoryEntry>,
}

/// In-memory URL state with a browser-like history stack.
///
/// Query parameters keep insertion order, so the composed URL is stable for
/// a given sequence of writes. Used by headless hosts and by tests that need
/// to observe what the address bar would show.
pub struct HistoryUrlState {
    state: Mutex<HistoryState>,
}

impl HistoryUrlState {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            state: Mutex::new(HistoryState {
                entries: vec![HistoryEntry {
                    url: base_url.clone(),
                    strategy: None,
                }],
                base_url,
                params: IndexMap::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HistoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn query_param(&self, key: &str) -> Option<String> {
        self.lock().params.get(key).cloned()
    }

    /// URL the cached parameters would produce right now.
    pub fn composed_url(&self) -> String {
        compose_url(&self.lock())
    }

    /// URL of the top history entry (what the address bar shows).
    pub fn current_url(&self) -> String {
        let state = self.lock();
        state
            .entries
            .last()
            .map(|entry| entry.url.clone())
            .unwrap_or_else(|| state.base_url.clone())
    }

    pub fn history(&self) -> Vec<HistoryEntry> {
        self.lock().entries.clone()
    }

    fn push(&self, strategy: UpdateStrategy) -> String {
        let mut state = self.lock();
        let url = compose_url(&state);
        state.entries.push(HistoryEntry {
            url: url.clone(),
            strategy: Some(strategy),
        });
        url
    }
}

fn compose_url(state: &HistoryState) -> String {
    if state.params.is_empty() {
        return state.base_url.clone();
    }

    let pairs: Vec<(&str, &str)> = state
        .params
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();

    match serde_urlencoded::to_string(&pairs) {
        Ok(query) => {
            let separator = if state.base_url.contains('?') { '&' } else { '?' };
            format!("{}{}{}", state.base_url, separator, query)
        }
        Err(e) => {
            error!("Failed to encode query parameters: {}", e);
            state.base_url.clone()
        }
    }
}

#[async_trait]
impl UrlStateManager for HistoryUrlState {
    fn set_query_param(&self, key: &str, value: Option<&str>) {
        let mut state = self.lock();
        match value {
            Some(value) => {
                state.params.insert(key.to_string(), value.to_string());
            }
            None => {
                state.params.shift_remove(key);
            }
        }
    }

    fn location_to_url(&self) {
        let url = self.push(UpdateStrategy::LocationToUrl);
        debug!("Location updated to {}", url);
    }

    fn replace_to_url(&self) {
        let mut state = self.lock();
        let url = compose_url(&state);
        let entry = HistoryEntry {
            url: url.clone(),
            strategy: Some(UpdateStrategy::ReplaceToUrl),
        };
        match state.entries.last_mut() {
            Some(top) => *top = entry,
            None => state.entries.push(entry),
        }
        debug!("Location replaced with {}", url);
    }

    async fn navigate_to_url(&self) -> Result<bool, NavigationError> {
        let mut state = self.lock();
        let url = compose_url(&state);
        if state.entries.last().map(|entry| entry.url.as_str()) == Some(url.as_str()) {
            debug!("Navigation to {} skipped, already current", url);
            return Ok(false);
        }
        state.entries.push(HistoryEntry {
            url: url.clone(),
            strategy: Some(UpdateStrategy::NavigateToUrl),
        });
        debug!("Navigated to {}", url);
        Ok(true)
    }

    fn change_base_url(&self, url: &str) {
        self.lock().base_url = url.to_string();
    }
}
