use serde::{Deserialize, Serialize};

/// How criteria state is reflected into the address bar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateStrategy {
    /// Router navigation (async, may be rejected)
    NavigateToUrl,
    /// Push the composed URL onto history without navigating
    LocationToUrl,
    /// Replace the current history entry with the composed URL
    ReplaceToUrl,
}

#[allow(clippy::derivable_impls)]
impl Default for UpdateStrategy {
    fn default() -> Self {
        UpdateStrategy::NavigateToUrl
    }
}
