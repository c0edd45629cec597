use super::bulk::{
    apply_known, parse_projection_half, resolve_known, split_changes, BulkUpdate, CriteriaInput,
    CriteriaProjection,
};
use super::debounce::UrlUpdateScheduler;
use super::observer::{MutationObserver, ObserverRegistry};
use crate::config::FiltersSortConfig;
use crate::url_state::UrlStateManager;
use indexmap::IndexMap;
use pipelines_common::{
    normalize_filter_value, normalize_sort_value, CriteriaKey, CriteriaKind, CriteriaValue,
    KeyValueChange, UpdateStrategy,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error};

const PROJECTION_ERROR_PREFIX: &str = "FiltersSortManager: failed to parse criteria projection";

/// Filter and sort criteria for one filterable view.
///
/// Holds two independent criteria maps keyed by the view's own key types,
/// mirrors them into query parameters of a [`UrlStateManager`], and tells
/// registered observers about every change.
///
/// All mutations apply synchronously. Only the browser URL write is deferred
/// (debounced on the tokio runtime), and at most one such write is pending.
pub struct FiltersSortManager<FC: CriteriaKey, SC: CriteriaKey> {
    filter_criteria: IndexMap<FC, CriteriaValue>,
    sort_criteria: IndexMap<SC, CriteriaValue>,
    known_filter_criteria: Vec<FC>,
    known_sort_criteria: Vec<SC>,
    url_state: Arc<dyn UrlStateManager>,
    observers: ObserverRegistry<FC, SC>,
    scheduler: UrlUpdateScheduler,
    update_strategy: UpdateStrategy,
    filter_param_key: String,
    sort_param_key: String,
}

/// Builder for creating a FiltersSortManager
pub struct FiltersSortManagerBuilder<FC: CriteriaKey, SC: CriteriaKey> {
    url_state: Arc<dyn UrlStateManager>,
    known_filter_criteria: Vec<FC>,
    known_sort_criteria: Vec<SC>,
    filter_criteria: IndexMap<FC, CriteriaValue>,
    sort_criteria: IndexMap<SC, CriteriaValue>,
    config: FiltersSortConfig,
}

impl<FC: CriteriaKey, SC: CriteriaKey> FiltersSortManagerBuilder<FC, SC> {
    /// Filter keys accepted by bulk updates
    pub fn known_filter_criteria(mut self, keys: impl IntoIterator<Item = FC>) -> Self {
        self.known_filter_criteria = keys.into_iter().collect();
        self
    }

    /// Sort keys accepted by bulk updates
    pub fn known_sort_criteria(mut self, keys: impl IntoIterator<Item = SC>) -> Self {
        self.known_sort_criteria = keys.into_iter().collect();
        self
    }

    /// Initial filter values. Values are stored as text.
    pub fn filter_criteria<V: Into<CriteriaValue>>(
        mut self,
        criteria: impl IntoIterator<Item = (FC, V)>,
    ) -> Self {
        self.filter_criteria = criteria
            .into_iter()
            .map(|(key, value)| (key, normalize_filter_value(value.into())))
            .collect();
        self
    }

    /// Initial sort values, stored as given
    pub fn sort_criteria<V: Into<CriteriaValue>>(
        mut self,
        criteria: impl IntoIterator<Item = (SC, V)>,
    ) -> Self {
        self.sort_criteria = criteria
            .into_iter()
            .map(|(key, value)| (key, value.into()))
            .collect();
        self
    }

    pub fn config(mut self, config: FiltersSortConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> FiltersSortManager<FC, SC> {
        FiltersSortManager {
            filter_criteria: self.filter_criteria,
            sort_criteria: self.sort_criteria,
            known_filter_criteria: self.known_filter_criteria,
            known_sort_criteria: self.known_sort_criteria,
            url_state: self.url_state,
            observers: ObserverRegistry::new(),
            scheduler: UrlUpdateScheduler::new(self.config.debounce()),
            update_strategy: self.config.update_strategy,
            filter_param_key: self.config.filter_param_key,
            sort_param_key: self.config.sort_param_key,
        }
    }
}

impl<FC: CriteriaKey, SC: CriteriaKey> FiltersSortManager<FC, SC> {
    pub fn builder(url_state: Arc<dyn UrlStateManager>) -> FiltersSortManagerBuilder<FC, SC> {
        FiltersSortManagerBuilder {
            url_state,
            known_filter_criteria: Vec::new(),
            known_sort_criteria: Vec::new(),
            filter_criteria: IndexMap::new(),
            sort_criteria: IndexMap::new(),
            config: FiltersSortConfig::default(),
        }
    }

    // --- Queries ---

    pub fn filter_criteria(&self) -> &IndexMap<FC, CriteriaValue> {
        &self.filter_criteria
    }

    pub fn sort_criteria(&self) -> &IndexMap<SC, CriteriaValue> {
        &self.sort_criteria
    }

    pub fn get_filter(&self, key: FC) -> Option<&CriteriaValue> {
        self.filter_criteria.get(&key)
    }

    pub fn get_sort(&self, key: SC) -> Option<&CriteriaValue> {
        self.sort_criteria.get(&key)
    }

    pub fn has_filter(&self, key: FC) -> bool {
        self.filter_criteria.contains_key(&key)
    }

    pub fn has_any_filter(&self) -> bool {
        !self.filter_criteria.is_empty()
    }

    pub fn has_sort(&self, key: SC) -> bool {
        self.sort_criteria.contains_key(&key)
    }

    pub fn has_any_sort(&self) -> bool {
        !self.sort_criteria.is_empty()
    }

    pub fn known_filter_criteria(&self) -> &[FC] {
        &self.known_filter_criteria
    }

    pub fn known_sort_criteria(&self) -> &[SC] {
        &self.known_sort_criteria
    }

    pub fn update_strategy(&self) -> UpdateStrategy {
        self.update_strategy
    }

    pub fn debouncing_time(&self) -> Duration {
        self.scheduler.delay()
    }

    pub fn url_state(&self) -> &Arc<dyn UrlStateManager> {
        &self.url_state
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    // --- Single-criterion mutation ---

    /// Set or clear (`None`) one filter. Values are stored as text.
    ///
    /// Setting the value already stored is a full no-op. Observers receive the
    /// value as passed in, before it is stored as text.
    pub fn set_filter(&mut self, key: FC, value: Option<CriteriaValue>, update_browser_url: bool) {
        let stored = value.clone().map(normalize_filter_value);
        if self.filter_criteria.get(&key) == stored.as_ref() {
            debug!("Filter '{}' unchanged, skipping", key.as_str());
            return;
        }

        match stored {
            Some(v) => {
                self.filter_criteria.insert(key, v);
            }
            None => {
                self.filter_criteria.shift_remove(&key);
            }
        }

        self.sync_filter_query_param();
        if update_browser_url {
            self.update_browser_url(None, false);
        }
        self.observers.notify(&[KeyValueChange::Filter(key, value)]);
    }

    /// Set or clear (`None`) one sort criterion. The value is stored as given.
    ///
    /// There is no `delete_sort`; passing `None` here is how a sort key is removed.
    pub fn set_sort(&mut self, key: SC, value: Option<CriteriaValue>, update_browser_url: bool) {
        if self.sort_criteria.get(&key) == value.as_ref() {
            debug!("Sort '{}' unchanged, skipping", key.as_str());
            return;
        }

        match &value {
            Some(v) => {
                self.sort_criteria.insert(key, v.clone());
            }
            None => {
                self.sort_criteria.shift_remove(&key);
            }
        }

        self.sync_sort_query_param();
        if update_browser_url {
            self.update_browser_url(None, false);
        }
        self.observers.notify(&[KeyValueChange::Sort(key, value)]);
    }

    /// Remove one filter. Returns false, with no side effects, if it was not set.
    pub fn delete_filter(&mut self, key: FC, update_browser_url: bool) -> bool {
        if self.filter_criteria.shift_remove(&key).is_none() {
            return false;
        }

        self.sync_filter_query_param();
        if update_browser_url {
            self.update_browser_url(None, false);
        }
        self.observers.notify(&[KeyValueChange::Filter(key, None)]);
        true
    }

    // --- Bulk mutation ---

    /// Remove every filter. Safe on an empty map: the query parameter is
    /// still rewritten and a URL update still scheduled if requested.
    pub fn clear_filters(&mut self, update_browser_url: bool, notify_observers: bool) {
        let changes: Vec<KeyValueChange<FC, SC>> = self
            .filter_criteria
            .drain(..)
            .map(|(key, _)| KeyValueChange::Filter(key, None))
            .collect();

        self.sync_filter_query_param();
        if update_browser_url {
            self.update_browser_url(None, false);
        }
        if notify_observers {
            self.observers.notify(&changes);
        }
    }

    pub fn clear_sort(&mut self, update_browser_url: bool, notify_observers: bool) {
        let changes: Vec<KeyValueChange<FC, SC>> = self
            .sort_criteria
            .drain(..)
            .map(|(key, _)| KeyValueChange::Sort(key, None))
            .collect();

        self.sync_sort_query_param();
        if update_browser_url {
            self.update_browser_url(None, false);
        }
        if notify_observers {
            self.observers.notify(&changes);
        }
    }

    /// Clear filters, then sort, with the same flags.
    pub fn clear(&mut self, update_browser_url: bool, notify_observers: bool) {
        self.clear_filters(update_browser_url, notify_observers);
        self.clear_sort(update_browser_url, notify_observers);
    }

    /// Apply many changes at once, restricted to the known criteria.
    ///
    /// With `clear_previous_values`, known keys absent from the input are
    /// removed. Filters are processed before sort and each map rewrites its
    /// own query parameter. Typed changes produce one observer batch; a
    /// projection produces up to two (filter, then sort). `None` input does
    /// nothing. Bulk updates never schedule a browser URL write.
    pub fn bulk_update(
        &mut self,
        updates: impl Into<Option<BulkUpdate<FC, SC>>>,
        clear_previous_values: bool,
    ) {
        let Some(updates) = updates.into() else {
            return;
        };

        match updates {
            BulkUpdate::Changes(changes) => {
                let (filters, sorts) = split_changes(changes);
                let mut applied = self.apply_filter_input(&filters, clear_previous_values);
                applied.extend(self.apply_sort_input(&sorts, clear_previous_values));
                self.observers.notify(&applied);
            }
            BulkUpdate::Projection(projection) => {
                let filters =
                    parse_projection_half(projection.filter.as_deref(), CriteriaKind::Filter)
                        .inspect_err(|e| error!("{}: {}", PROJECTION_ERROR_PREFIX, e))
                        .unwrap_or_default();
                let filters = resolve_known(filters, &self.known_filter_criteria);
                let applied = self.apply_filter_input(&filters, clear_previous_values);
                self.observers.notify(&applied);

                let sorts = parse_projection_half(projection.sort.as_deref(), CriteriaKind::Sort)
                    .inspect_err(|e| error!("{}: {}", PROJECTION_ERROR_PREFIX, e))
                    .unwrap_or_default();
                let sorts = resolve_known(sorts, &self.known_sort_criteria);
                let applied = self.apply_sort_input(&sorts, clear_previous_values);
                self.observers.notify(&applied);
            }
        }
    }

    /// Restore criteria from a raw URL query string (deep link).
    ///
    /// Reads this manager's filter and sort parameters and applies them as a
    /// projection bulk update. An undecodable query counts as empty.
    pub fn restore_from_query(&mut self, query: &str, clear_previous_values: bool) {
        let projection =
            CriteriaProjection::from_query(query, &self.filter_param_key, &self.sort_param_key)
                .inspect_err(|e| error!("{}: {}", PROJECTION_ERROR_PREFIX, e))
                .unwrap_or_default();
        self.bulk_update(BulkUpdate::Projection(projection), clear_previous_values);
    }

    fn apply_filter_input(
        &mut self,
        input: &CriteriaInput<FC>,
        clear_previous_values: bool,
    ) -> Vec<KeyValueChange<FC, SC>> {
        let applied = apply_known(
            &mut self.filter_criteria,
            &self.known_filter_criteria,
            input,
            clear_previous_values,
            |value| Some(normalize_filter_value(value)),
        );
        self.sync_filter_query_param();
        applied
            .into_iter()
            .map(|(key, value)| KeyValueChange::Filter(key, value))
            .collect()
    }

    fn apply_sort_input(
        &mut self,
        input: &CriteriaInput<SC>,
        clear_previous_values: bool,
    ) -> Vec<KeyValueChange<FC, SC>> {
        let applied = apply_known(
            &mut self.sort_criteria,
            &self.known_sort_criteria,
            input,
            clear_previous_values,
            normalize_sort_value,
        );
        self.sync_sort_query_param();
        applied
            .into_iter()
            .map(|(key, value)| KeyValueChange::Sort(key, value))
            .collect()
    }

    // --- Serialization ---

    /// JSON projection of the filters, `None` when there are none.
    pub fn serialize_filters(&self) -> Option<String> {
        serialize_criteria(&self.filter_criteria)
    }

    /// JSON projection of the sort criteria, `None` when there are none.
    pub fn serialize_sort(&self) -> Option<String> {
        serialize_criteria(&self.sort_criteria)
    }

    fn sync_filter_query_param(&self) {
        let serialized = self.serialize_filters();
        self.url_state
            .set_query_param(&self.filter_param_key, serialized.as_deref());
    }

    fn sync_sort_query_param(&self) {
        let serialized = self.serialize_sort();
        self.url_state
            .set_query_param(&self.sort_param_key, serialized.as_deref());
    }

    // --- Browser URL synchronization ---

    /// Reflect the cached query parameters into the browser URL.
    ///
    /// `strategy` overrides the configured default for this call. Any pending
    /// update is cancelled first; without `skip_debouncing` the dispatch waits
    /// for the debounce period, and a later call within it replaces this one.
    pub fn update_browser_url(&mut self, strategy: Option<UpdateStrategy>, skip_debouncing: bool) {
        let strategy = strategy.unwrap_or(self.update_strategy);
        self.scheduler
            .schedule(Arc::clone(&self.url_state), strategy, skip_debouncing);
    }

    pub fn cancel_scheduled_browser_url_update(&mut self) {
        self.scheduler.cancel();
    }

    pub fn has_scheduled_browser_url_update(&self) -> bool {
        self.scheduler.is_pending()
    }

    pub fn change_update_strategy(&mut self, strategy: UpdateStrategy) {
        self.update_strategy = strategy;
    }

    /// Applies to updates scheduled after this call.
    pub fn change_debouncing_time(&mut self, delay: Duration) {
        self.scheduler.set_delay(delay);
    }

    /// Swap the URL-state collaborator. A pending update for the old one is cancelled.
    pub fn change_url_state_manager(&mut self, url_state: Arc<dyn UrlStateManager>) {
        self.scheduler.cancel();
        self.url_state = url_state;
    }

    // --- Mutation observers ---

    /// Returns false if the observer was already registered.
    pub fn register_mutation_observer(&mut self, observer: MutationObserver<FC, SC>) -> bool {
        self.observers.register(observer)
    }

    pub fn delete_mutation_observer(&mut self, observer: &MutationObserver<FC, SC>) -> bool {
        self.observers.remove(observer)
    }
}

fn serialize_criteria<K: CriteriaKey>(criteria: &IndexMap<K, CriteriaValue>) -> Option<String> {
    if criteria.is_empty() {
        return None;
    }

    let projection: IndexMap<&str, &CriteriaValue> = criteria
        .iter()
        .map(|(key, value)| (key.as_str(), value))
        .collect();

    match serde_json::to_string(&projection) {
        Ok(json) => Some(json),
        Err(e) => {
            error!("FiltersSortManager: failed to serialize criteria: {}", e);
            None
        }
    }
}
