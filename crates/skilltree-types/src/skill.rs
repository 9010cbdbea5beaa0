use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

use crate::error::SkillError;

/// Minimum skill name length (characters, after trimming).
pub const NAME_MIN_CHARS: usize = 2;
/// Maximum skill name length (characters, after trimming).
pub const NAME_MAX_CHARS: usize = 100;
/// Maximum description length (characters).
pub const DESCRIPTION_MAX_CHARS: usize = 500;

/// Unique identifier for a skill, wrapping a UUID v7 (time-sortable).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SkillId(pub Uuid);

impl SkillId {
    /// Create a new SkillId using UUID v7.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Create a SkillId from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for SkillId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SkillId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SkillId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// A node in the skill forest.
///
/// Structure is carried only by `parent_id`; ancestors, depth and children
/// are derived on demand and never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skill {
    pub id: SkillId,
    /// Display name, stored trimmed.
    pub name: String,
    pub description: Option<String>,
    /// Opaque presentation icon token, stored verbatim.
    pub icon: Option<String>,
    /// Presentation color index, stored verbatim.
    pub color: Option<i64>,
    /// `None` for roots.
    pub parent_id: Option<SkillId>,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Record handed to the repository on insert. The store assigns the id and
/// the timestamps.
#[derive(Debug, Clone, Default)]
pub struct NewSkill {
    pub name: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub color: Option<i64>,
    pub parent_id: Option<SkillId>,
    pub created_by: Option<String>,
}

/// Column-level patch applied by the repository.
///
/// Outer `None` leaves the column untouched; `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SkillPatch {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub icon: Option<Option<String>>,
    pub color: Option<Option<i64>>,
    pub parent_id: Option<Option<SkillId>>,
}

impl SkillPatch {
    /// Whether the patch touches the structural `parent_id` column.
    pub fn moves(&self) -> bool {
        self.parent_id.is_some()
    }
}

/// Request to create a new skill. Only `name` is required.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateSkillRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub color: Option<i64>,
    #[serde(default)]
    pub parent_id: Option<SkillId>,
}

/// Request to update a skill. Absent fields are left unchanged.
///
/// `parent_id` is tri-state: absent (keep), `null` (move to root), or an id
/// (reparent). An empty `description` or `icon` clears the field.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateSkillRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<i64>,
    #[serde(
        default,
        deserialize_with = "deserialize_some",
        skip_serializing_if = "Option::is_none"
    )]
    pub parent_id: Option<Option<SkillId>>,
}

/// Lets an explicit JSON `null` deserialize as `Some(None)` while a missing
/// field stays `None` through `#[serde(default)]`.
fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Minimal reference to a skill, used for ancestor paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillRef {
    pub id: SkillId,
    pub name: String,
}

impl From<&Skill> for SkillRef {
    fn from(skill: &Skill) -> Self {
        Self {
            id: skill.id,
            name: skill.name.clone(),
        }
    }
}

/// A skill with its position in the forest, returned by create and update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillView {
    #[serde(flatten)]
    pub skill: Skill,
    /// Root first, direct parent last.
    pub ancestors: Vec<SkillRef>,
    pub depth: usize,
}

impl SkillView {
    /// Attach an ancestor chain; depth is its length.
    pub fn new(skill: Skill, ancestors: Vec<SkillRef>) -> Self {
        Self {
            depth: ancestors.len(),
            ancestors,
            skill,
        }
    }
}

/// Structural counters for a single skill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillStats {
    pub direct_child_count: usize,
    pub total_descendants: usize,
    pub depth: usize,
}

/// Full single-skill view: ancestors, one level of children, and stats.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillDetail {
    #[serde(flatten)]
    pub skill: Skill,
    pub ancestors: Vec<SkillRef>,
    pub children: Vec<Skill>,
    pub stats: SkillStats,
}

/// A skill with its subtree materialized, as returned by forest listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillNode {
    #[serde(flatten)]
    pub skill: Skill,
    pub children: Vec<SkillNode>,
}

impl SkillNode {
    /// Number of nodes in this subtree, including `self`.
    pub fn subtree_len(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.children.iter());
        }
        count
    }
}

/// Trim and validate a skill name, returning the stored form.
///
/// # Examples
///
/// ```
/// use skilltree_types::skill::validate_name;
///
/// assert_eq!(validate_name("  Algebra ").unwrap(), "Algebra");
/// assert!(validate_name("x").is_err());
/// ```
pub fn validate_name(name: &str) -> Result<String, SkillError> {
    let trimmed = name.trim();
    let len = trimmed.chars().count();
    if len < NAME_MIN_CHARS {
        return Err(SkillError::Validation(format!(
            "name must be at least {NAME_MIN_CHARS} characters"
        )));
    }
    if len > NAME_MAX_CHARS {
        return Err(SkillError::Validation(format!(
            "name must be at most {NAME_MAX_CHARS} characters"
        )));
    }
    Ok(trimmed.to_string())
}

/// Validate an optional description. Empty strings normalize to `None`.
pub fn validate_description(description: Option<String>) -> Result<Option<String>, SkillError> {
    match description {
        Some(d) if d.trim().is_empty() => Ok(None),
        Some(d) if d.chars().count() > DESCRIPTION_MAX_CHARS => Err(SkillError::Validation(
            format!("description must be at most {DESCRIPTION_MAX_CHARS} characters"),
        )),
        other => Ok(other),
    }
}
