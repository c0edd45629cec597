//! pipelines-ui - UI state plumbing for the data-pipelines console
//!
//! Holds the filter/sort criteria synchronizer used by listing views, the
//! URL-state collaborator it writes through, and their configuration.

pub mod config;
pub mod error;
pub mod filters_sort;
pub mod url_state;

pub use config::*;
pub use error::*;
pub use filters_sort::*;
pub use pipelines_common::{
    CriteriaKey, CriteriaKind, CriteriaValue, KeyValueChange, UpdateStrategy,
};
pub use url_state::*;
