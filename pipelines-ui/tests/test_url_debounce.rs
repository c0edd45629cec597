mod support;

use pipelines_ui::{
    CriteriaValue, FiltersSortConfig, FiltersSortManager, HistoryUrlState, UpdateStrategy,
};
use std::sync::Arc;
use std::time::Duration;
use support::{capture_logs, manager, settle, tracing_init, RecordingUrlState};

const DEBOUNCE: Duration = Duration::from_millis(300);

fn text(s: &str) -> Option<CriteriaValue> {
    Some(CriteriaValue::Text(s.to_string()))
}

#[tokio::test(start_paused = true)]
async fn test_rapid_sets_coalesce_into_one_dispatch() {
    tracing_init();
    let url_state = RecordingUrlState::new();
    let mut m = manager(url_state.clone(), &[], &[]);
    m.change_update_strategy(UpdateStrategy::LocationToUrl);

    m.set_filter("c1", text("first"), true);
    tokio::time::sleep(Duration::from_millis(100)).await;
    m.set_filter("c1", text("second"), true);

    assert!(url_state.dispatches().is_empty());
    settle(DEBOUNCE).await;

    let dispatches = url_state.dispatches();
    assert_eq!(dispatches.len(), 1);
    assert_eq!(dispatches[0].0, UpdateStrategy::LocationToUrl);
    assert_eq!(
        dispatches[0].1.get("filter").map(String::as_str),
        Some(r#"{"c1":"second"}"#)
    );
    assert_eq!(url_state.param_writes("filter").len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_each_call_resets_the_timer() {
    let url_state = RecordingUrlState::new();
    let mut m = manager(url_state.clone(), &[], &[]);
    m.change_update_strategy(UpdateStrategy::ReplaceToUrl);

    m.set_filter("a", text("1"), true);
    tokio::time::sleep(Duration::from_millis(250)).await;
    m.set_filter("a", text("2"), true);
    tokio::time::sleep(Duration::from_millis(250)).await;

    assert!(url_state.dispatches().is_empty());
    assert!(m.has_scheduled_browser_url_update());

    settle(Duration::from_millis(50)).await;
    assert_eq!(url_state.dispatches().len(), 1);
    assert!(!m.has_scheduled_browser_url_update());
}

#[tokio::test(start_paused = true)]
async fn test_last_strategy_wins() {
    let url_state = RecordingUrlState::new();
    let mut m = manager(url_state.clone(), &[], &[]);

    m.update_browser_url(Some(UpdateStrategy::ReplaceToUrl), false);
    m.update_browser_url(Some(UpdateStrategy::LocationToUrl), false);
    settle(DEBOUNCE).await;

    let strategies: Vec<_> = url_state.dispatches().into_iter().map(|(s, _)| s).collect();
    assert_eq!(strategies, vec![UpdateStrategy::LocationToUrl]);
}

#[tokio::test(start_paused = true)]
async fn test_skip_debouncing_dispatches_now() {
    let url_state = RecordingUrlState::new();
    let mut m = manager(url_state.clone(), &[], &[]);

    m.update_browser_url(Some(UpdateStrategy::ReplaceToUrl), true);
    assert_eq!(url_state.dispatches().len(), 1);
    assert!(!m.has_scheduled_browser_url_update());
}

#[tokio::test(start_paused = true)]
async fn test_skip_debouncing_cancels_pending_update() {
    let url_state = RecordingUrlState::new();
    let mut m = manager(url_state.clone(), &[], &[]);
    m.change_update_strategy(UpdateStrategy::LocationToUrl);

    m.set_filter("a", text("1"), true);
    m.update_browser_url(Some(UpdateStrategy::ReplaceToUrl), true);
    settle(DEBOUNCE).await;

    let strategies: Vec<_> = url_state.dispatches().into_iter().map(|(s, _)| s).collect();
    assert_eq!(strategies, vec![UpdateStrategy::ReplaceToUrl]);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_scheduled_update() {
    let url_state = RecordingUrlState::new();
    let mut m = manager(url_state.clone(), &[], &[]);

    m.set_filter("a", text("1"), true);
    assert!(m.has_scheduled_browser_url_update());
    m.cancel_scheduled_browser_url_update();
    m.cancel_scheduled_browser_url_update();
    settle(DEBOUNCE).await;

    assert!(url_state.dispatches().is_empty());
    assert!(m.has_filter("a"));
    assert_eq!(url_state.param_writes("filter").len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_update_flag_false_never_dispatches() {
    let url_state = RecordingUrlState::new();
    let mut m = manager(url_state.clone(), &[], &[]);

    m.set_filter("a", text("1"), false);
    m.set_sort("b", text("asc"), false);
    m.clear(false, true);
    settle(DEBOUNCE).await;

    assert!(url_state.dispatches().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_clear_on_empty_map_can_still_dispatch() {
    let url_state = RecordingUrlState::new();
    let mut m = manager(url_state.clone(), &[], &[]);
    m.change_update_strategy(UpdateStrategy::LocationToUrl);

    m.clear_filters(true, true);
    settle(DEBOUNCE).await;

    assert_eq!(url_state.dispatches().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_navigation_rejection_is_logged() {
    let (logs, _guard) = capture_logs();
    let url_state = RecordingUrlState::rejecting_navigation();
    let mut m = manager(url_state.clone(), &[], &[]);

    m.set_filter("a", text("1"), true);
    settle(DEBOUNCE).await;

    assert_eq!(url_state.dispatches().len(), 1);
    assert_eq!(url_state.dispatches()[0].0, UpdateStrategy::NavigateToUrl);
    assert!(m.has_filter("a"));
    let output = logs.contents();
    assert!(output.contains("browser URL navigation failed"));
    assert!(output.contains("guard refused"));
}

#[tokio::test(start_paused = true)]
async fn test_change_debouncing_time() {
    let url_state = RecordingUrlState::new();
    let mut m = manager(url_state.clone(), &[], &[]);
    m.change_debouncing_time(Duration::from_millis(20));
    assert_eq!(m.debouncing_time(), Duration::from_millis(20));

    m.update_browser_url(Some(UpdateStrategy::LocationToUrl), false);
    settle(Duration::from_millis(20)).await;

    assert_eq!(url_state.dispatches().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_dropping_manager_cancels_pending_update() {
    let url_state = RecordingUrlState::new();
    {
        let mut m = manager(url_state.clone(), &[], &[]);
        m.set_filter("a", text("1"), true);
    }
    settle(DEBOUNCE).await;

    assert!(url_state.dispatches().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_changing_url_state_manager_cancels_pending_update() {
    let old = RecordingUrlState::new();
    let new = RecordingUrlState::new();
    let mut m = manager(old.clone(), &[], &[]);

    m.set_filter("a", text("1"), true);
    m.change_url_state_manager(new.clone());
    m.set_filter("a", text("2"), false);
    settle(DEBOUNCE).await;

    assert!(old.dispatches().is_empty());
    assert!(new.dispatches().is_empty());
    assert_eq!(new.param_writes("filter"), vec![Some(r#"{"a":"2"}"#.to_string())]);
}

#[test]
fn test_without_runtime_sync_strategies_dispatch_immediately() {
    let url_state = RecordingUrlState::new();
    let mut m = manager(url_state.clone(), &[], &[]);
    m.change_update_strategy(UpdateStrategy::ReplaceToUrl);

    m.set_filter("a", text("1"), true);

    assert_eq!(url_state.dispatches().len(), 1);
    assert!(!m.has_scheduled_browser_url_update());
}

#[test]
fn test_without_runtime_navigation_runs_on_caller() {
    let url_state = RecordingUrlState::new();
    let mut m = manager(url_state.clone(), &[], &[]);
    assert_eq!(m.update_strategy(), UpdateStrategy::NavigateToUrl);

    m.set_filter("a", text("1"), true);
    m.update_browser_url(None, true);

    let dispatches = url_state.dispatches();
    assert_eq!(dispatches.len(), 2);
    assert!(dispatches
        .iter()
        .all(|(strategy, _)| *strategy == UpdateStrategy::NavigateToUrl));
    assert_eq!(
        dispatches[0].1.get("filter").map(String::as_str),
        Some(r#"{"a":"1"}"#)
    );
    assert!(!m.has_scheduled_browser_url_update());
}

#[test]
fn test_without_runtime_navigation_rejection_is_logged() {
    let (logs, _guard) = capture_logs();
    let url_state = RecordingUrlState::rejecting_navigation();
    let mut m = manager(url_state.clone(), &[], &[]);

    m.update_browser_url(None, true);

    assert_eq!(url_state.dispatches().len(), 1);
    let output = logs.contents();
    assert!(output.contains("browser URL navigation failed"));
    assert!(output.contains("guard refused"));
}

#[tokio::test(start_paused = true)]
async fn test_history_backed_url_state() {
    let url_state = Arc::new(HistoryUrlState::new("/data-jobs"));
    let mut m: FiltersSortManager<&'static str, &'static str> =
        FiltersSortManager::builder(url_state.clone())
            .known_filter_criteria(["team"])
            .known_sort_criteria(["name"])
            .config(FiltersSortConfig {
                debounce_ms: 50,
                ..FiltersSortConfig::default()
            })
            .build();

    m.set_filter("team", text("core"), true);
    m.set_sort("name", Some(CriteriaValue::Number(-1)), true);
    settle(Duration::from_millis(50)).await;

    assert_eq!(
        url_state.current_url(),
        "/data-jobs?filter=%7B%22team%22%3A%22core%22%7D&sort=%7B%22name%22%3A-1%7D"
    );
    assert_eq!(url_state.history().len(), 2);

    m.clear(true, true);
    settle(Duration::from_millis(50)).await;
    assert_eq!(url_state.current_url(), "/data-jobs");
}
