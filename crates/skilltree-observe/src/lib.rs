//! Observability setup for SkillTree binaries.

pub mod tracing_setup;
