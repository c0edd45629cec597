//! URL-state collaborator surface
//!
//! The filters/sort manager never touches the address bar directly. It writes
//! query parameters into a [`UrlStateManager`] and asks it to reflect them
//! with one of three strategies.

mod history;

pub use history::{HistoryEntry, HistoryUrlState};

use crate::error::NavigationError;
use async_trait::async_trait;

/// Host-provided bridge between criteria state and the browser URL.
#[async_trait]
pub trait UrlStateManager: Send + Sync {
    /// Cache a query parameter value. `None` removes the parameter.
    fn set_query_param(&self, key: &str, value: Option<&str>);

    /// Push the composed URL onto history without router navigation.
    fn location_to_url(&self);

    /// Replace the current history entry with the composed URL.
    fn replace_to_url(&self);

    /// Navigate to the composed URL through the router.
    async fn navigate_to_url(&self) -> Result<bool, NavigationError>;

    fn change_base_url(&self, url: &str);
}
