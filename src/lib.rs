//! List-view synchronization for inventory screens: filter mapping, query
//! state, stale-safe fetching and priority-tiered sorting.

pub mod config;
pub mod domain;
pub mod infra;
pub mod logging;
pub mod platform;
pub mod ui;
pub mod usecase;
