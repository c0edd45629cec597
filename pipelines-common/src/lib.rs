//! Shared vocabulary types for the data-pipelines console.
//!
//! Pure data with no I/O, used by the UI state crate and by host views that
//! declare their filter and sort criteria.

pub mod criteria;
pub mod update_strategy;

pub use criteria::*;
pub use update_strategy::*;
