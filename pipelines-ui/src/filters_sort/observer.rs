//! Mutation observers
//!
//! Observers are invoked synchronously, in registration order, with the full
//! batch of changes from one logical mutation. Each invocation is isolated:
//! an error or panic in one observer is logged and the next one still runs.

use crate::error::ObserverError;
use pipelines_common::KeyValueChange;
use std::any::Any;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::error;

type ObserverFn<FC, SC> =
    dyn Fn(&[KeyValueChange<FC, SC>]) -> Result<(), ObserverError> + Send + Sync;

/// Callback notified with every non-empty batch of criteria changes.
///
/// Cloning shares the callback. Registration identity is the shared callback,
/// so a clone of a registered observer counts as already registered.
pub struct MutationObserver<FC, SC> {
    callback: Arc<ObserverFn<FC, SC>>,
}

impl<FC, SC> MutationObserver<FC, SC> {
    pub fn new(
        callback: impl Fn(&[KeyValueChange<FC, SC>]) -> Result<(), ObserverError>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        Self {
            callback: Arc::new(callback),
        }
    }

    /// Whether both handles point at the same callback.
    pub fn same_as(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.callback, &other.callback)
    }
}

impl<FC, SC> Clone for MutationObserver<FC, SC> {
    fn clone(&self) -> Self {
        Self {
            callback: Arc::clone(&self.callback),
        }
    }
}

impl<FC, SC> PartialEq for MutationObserver<FC, SC> {
    fn eq(&self, other: &Self) -> bool {
        self.same_as(other)
    }
}

impl<FC, SC> fmt::Debug for MutationObserver<FC, SC> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MutationObserver")
            .field("callback", &Arc::as_ptr(&self.callback))
            .finish()
    }
}

/// Ordered, identity-unique set of observers
pub(crate) struct ObserverRegistry<FC, SC> {
    observers: Vec<MutationObserver<FC, SC>>,
}

impl<FC, SC> ObserverRegistry<FC, SC> {
    pub fn new() -> Self {
        Self {
            observers: Vec::new(),
        }
    }

    /// Returns false if the observer was already registered.
    pub fn register(&mut self, observer: MutationObserver<FC, SC>) -> bool {
        if self.observers.iter().any(|o| o.same_as(&observer)) {
            return false;
        }
        self.observers.push(observer);
        true
    }

    pub fn remove(&mut self, observer: &MutationObserver<FC, SC>) -> bool {
        match self.observers.iter().position(|o| o.same_as(observer)) {
            Some(index) => {
                self.observers.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    /// Deliver one batch to every observer. Empty batches are suppressed.
    ///
    /// All observers borrow the same slice, so none of them can alter what
    /// the others receive.
    pub fn notify(&self, changes: &[KeyValueChange<FC, SC>]) {
        if changes.is_empty() {
            return;
        }

        for (index, observer) in self.observers.iter().enumerate() {
            let outcome = catch_unwind(AssertUnwindSafe(|| (observer.callback)(changes)));
            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    error!(
                        "FiltersSortManager: mutation observer #{} failed: {}",
                        index, e
                    );
                }
                Err(panic) => {
                    error!(
                        "FiltersSortManager: mutation observer #{} panicked: {}",
                        index,
                        panic_message(panic.as_ref())
                    );
                }
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&'static str>() {
        *message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.as_str()
    } else {
        "non-string panic payload"
    }
}
