//! Structural algorithms over a snapshot of the skill table.
//!
//! `forest` holds the arena (records keyed by id plus a child index) and
//! answers ancestor, descendant and cycle queries. `filter` prunes a
//! materialized forest down to the branches matching a search query. All
//! traversals use explicit stacks, so deep trees never exhaust the call stack.

pub mod filter;
pub mod forest;

pub use filter::filter_forest;
pub use forest::{ForestError, SkillForest};
