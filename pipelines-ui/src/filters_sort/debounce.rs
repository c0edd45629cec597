//! Debounced browser URL updates
//!
//! At most one update is pending per scheduler. Scheduling again aborts the
//! pending task first, so a burst of calls results in one dispatch that uses
//! the strategy of the last call.

use crate::error::NavigationError;
use crate::url_state::UrlStateManager;
use futures::executor::block_on;
use pipelines_common::UpdateStrategy;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

pub(crate) struct UrlUpdateScheduler {
    delay: Duration,
    pending: Option<JoinHandle<()>>,
}

impl UrlUpdateScheduler {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Applies to updates scheduled after this call.
    pub fn set_delay(&mut self, delay: Duration) {
        self.delay = delay;
    }

    pub fn is_pending(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Abort the pending update, if any. Already-dispatched work is unaffected.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            if !handle.is_finished() {
                debug!("Cancelling scheduled browser URL update");
            }
            handle.abort();
        }
    }

    pub fn schedule(
        &mut self,
        url_state: Arc<dyn UrlStateManager>,
        strategy: UpdateStrategy,
        skip_debouncing: bool,
    ) {
        self.cancel();

        if skip_debouncing {
            dispatch(url_state, strategy);
            return;
        }

        match Handle::try_current() {
            Ok(handle) => {
                let delay = self.delay;
                debug!(
                    "Browser URL update ({:?}) scheduled in {}ms",
                    strategy,
                    delay.as_millis()
                );
                self.pending = Some(handle.spawn(async move {
                    tokio::time::sleep(delay).await;
                    dispatch(url_state, strategy);
                }));
            }
            Err(_) => {
                warn!("No async runtime for debounced URL update, dispatching immediately");
                dispatch(url_state, strategy);
            }
        }
    }
}

impl Drop for UrlUpdateScheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Run one strategy against the collaborator.
///
/// Navigation runs on its own task so cancelling a later schedule never
/// interrupts a navigation that has already started. Without a runtime it is
/// driven to completion on the calling thread.
pub(crate) fn dispatch(url_state: Arc<dyn UrlStateManager>, strategy: UpdateStrategy) {
    match strategy {
        UpdateStrategy::LocationToUrl => url_state.location_to_url(),
        UpdateStrategy::ReplaceToUrl => url_state.replace_to_url(),
        UpdateStrategy::NavigateToUrl => match Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    log_navigation(url_state.navigate_to_url().await);
                });
            }
            Err(_) => {
                debug!("No async runtime available, navigating on the calling thread");
                log_navigation(block_on(url_state.navigate_to_url()));
            }
        },
    }
}

fn log_navigation(outcome: Result<bool, NavigationError>) {
    match outcome {
        Ok(navigated) => debug!("Browser URL navigation finished: {}", navigated),
        Err(e) => error!("FiltersSortManager: browser URL navigation failed: {}", e),
    }
}
