//! Hierarchy engine and repository trait definitions for SkillTree.
//!
//! This crate defines the "ports" (repository traits) that the infrastructure
//! layer implements, the in-memory forest arena used for every structural
//! query, and the `HierarchyService` that enforces the forest invariants.
//! It depends only on `skilltree-types` -- never on `skilltree-infra` or any
//! database/IO crate.

pub mod hierarchy;
pub mod repository;
pub mod service;
