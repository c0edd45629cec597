#![allow(dead_code)]

use async_trait::async_trait;
use pipelines_ui::{
    FiltersSortManager, KeyValueChange, MutationObserver, NavigationError, UpdateStrategy,
    UrlStateManager,
};
use std::collections::BTreeMap;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub type Manager = FiltersSortManager<&'static str, &'static str>;
pub type Change = KeyValueChange<&'static str, &'static str>;
pub type Batches = Arc<Mutex<Vec<Vec<Change>>>>;

/// Initialize tracing for tests with proper test output handling
pub fn tracing_init() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_line_number(true)
        .with_target(false)
        .with_file(true)
        .try_init();
}

/// Collaborator call, with the cached params snapshotted at dispatch time
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlCall {
    SetQueryParam(String, Option<String>),
    Dispatch(UpdateStrategy, BTreeMap<String, String>),
    ChangeBaseUrl(String),
}

/// UrlStateManager that records every call it receives
#[derive(Default)]
pub struct RecordingUrlState {
    calls: Mutex<Vec<UrlCall>>,
    params: Mutex<BTreeMap<String, String>>,
    reject_navigation: AtomicBool,
}

impl RecordingUrlState {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn rejecting_navigation() -> Arc<Self> {
        let state = Self::default();
        state.reject_navigation.store(true, Ordering::SeqCst);
        Arc::new(state)
    }

    pub fn calls(&self) -> Vec<UrlCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    /// Values passed to `set_query_param` for one key, in order
    pub fn param_writes(&self, key: &str) -> Vec<Option<String>> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                UrlCall::SetQueryParam(k, v) if k == key => Some(v),
                _ => None,
            })
            .collect()
    }

    pub fn set_query_param_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, UrlCall::SetQueryParam(..)))
            .count()
    }

    pub fn dispatches(&self) -> Vec<(UpdateStrategy, BTreeMap<String, String>)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                UrlCall::Dispatch(strategy, params) => Some((strategy, params)),
                _ => None,
            })
            .collect()
    }

    fn record_dispatch(&self, strategy: UpdateStrategy) {
        let params = self.params.lock().unwrap().clone();
        self.calls
            .lock()
            .unwrap()
            .push(UrlCall::Dispatch(strategy, params));
    }
}

#[async_trait]
impl UrlStateManager for RecordingUrlState {
    fn set_query_param(&self, key: &str, value: Option<&str>) {
        {
            let mut params = self.params.lock().unwrap();
            match value {
                Some(v) => {
                    params.insert(key.to_string(), v.to_string());
                }
                None => {
                    params.remove(key);
                }
            }
        }
        self.calls.lock().unwrap().push(UrlCall::SetQueryParam(
            key.to_string(),
            value.map(str::to_string),
        ));
    }

    fn location_to_url(&self) {
        self.record_dispatch(UpdateStrategy::LocationToUrl);
    }

    fn replace_to_url(&self) {
        self.record_dispatch(UpdateStrategy::ReplaceToUrl);
    }

    async fn navigate_to_url(&self) -> Result<bool, NavigationError> {
        self.record_dispatch(UpdateStrategy::NavigateToUrl);
        if self.reject_navigation.load(Ordering::SeqCst) {
            return Err(NavigationError::Rejected("guard refused".to_string()));
        }
        Ok(true)
    }

    fn change_base_url(&self, url: &str) {
        self.calls
            .lock()
            .unwrap()
            .push(UrlCall::ChangeBaseUrl(url.to_string()));
    }
}

/// Build a manager over `&'static str` keys
pub fn manager(
    url_state: Arc<RecordingUrlState>,
    known_filters: &[&'static str],
    known_sorts: &[&'static str],
) -> Manager {
    FiltersSortManager::builder(url_state)
        .known_filter_criteria(known_filters.iter().copied())
        .known_sort_criteria(known_sorts.iter().copied())
        .build()
}

/// Register an observer that records every batch it receives
pub fn observe(manager: &mut Manager) -> Batches {
    let batches: Batches = Arc::new(Mutex::new(Vec::new()));
    let sink = batches.clone();
    manager.register_mutation_observer(MutationObserver::new(move |changes: &[Change]| {
        sink.lock().unwrap().push(changes.to_vec());
        Ok(())
    }));
    batches
}

/// Let the debounce timer and any spawned navigation run to completion
pub async fn settle(delay: Duration) {
    tokio::time::sleep(delay + Duration::from_millis(1)).await;
    for _ in 0..5 {
        tokio::task::yield_now().await;
    }
}

/// Shared buffer that captures formatted log output
#[derive(Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Route this thread's log output into a buffer for the guard's lifetime
pub fn capture_logs() -> (LogCapture, tracing::subscriber::DefaultGuard) {
    let capture = LogCapture::default();
    let writer = capture.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .finish();
    let guard = tracing::subscriber::set_default(subscriber);
    (capture, guard)
}
