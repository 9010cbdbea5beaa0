//! Infrastructure layer for SkillTree.
//!
//! Contains the SQLite implementation of the repository trait defined in
//! `skilltree-core`, the global config loader, and data directory resolution.

pub mod config;
pub mod sqlite;
