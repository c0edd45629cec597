//! Filter/sort criteria state with URL synchronization
//!
//! [`FiltersSortManager`] owns a view's filter and sort criteria. Every
//! mutation:
//!
//! 1. commits to the in-memory maps,
//! 2. rewrites the JSON projection cached in the [`UrlStateManager`](crate::UrlStateManager),
//! 3. optionally schedules a debounced browser URL write,
//! 4. notifies mutation observers synchronously.
//!
//! Collaborator and observer failures are logged and never reach the caller.

mod bulk;
mod debounce;
mod manager;
mod observer;

pub use bulk::{BulkUpdate, CriteriaProjection};
pub use manager::{FiltersSortManager, FiltersSortManagerBuilder};
pub use observer::MutationObserver;
