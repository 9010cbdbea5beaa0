//! Shared domain types for SkillTree.
//!
//! This crate contains the core domain types used across the SkillTree
//! workspace: Skill, its request/response shapes, the derived hierarchy
//! views, configuration, and the associated error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod config;
pub mod error;
pub mod skill;
