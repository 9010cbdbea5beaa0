//! Request extractors for the REST API.

pub mod actor;
pub mod query;
