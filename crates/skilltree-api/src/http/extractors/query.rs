//! Query parameter extractors for list endpoints.

use serde::Deserialize;

/// Query parameters for the skill forest endpoint.
#[derive(Debug, Deserialize, Default)]
pub struct SkillListQuery {
    /// Case-insensitive name filter. Blank means no filter.
    pub search: Option<String>,
}
