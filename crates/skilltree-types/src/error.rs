use std::fmt;

use thiserror::Error;

/// Which record a `NotFound` error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotFoundKind {
    /// The skill addressed by the request.
    Skill,
    /// The parent named by `parent_id` in a create or update.
    Parent,
}

impl fmt::Display for NotFoundKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotFoundKind::Skill => write!(f, "skill"),
            NotFoundKind::Parent => write!(f, "parent"),
        }
    }
}

/// Errors surfaced by the hierarchy engine.
///
/// `Validation`, `NotFound` and `Cycle` are deterministic and never retried.
/// `Storage` is retried once at the engine boundary before it is surfaced.
#[derive(Debug, Error)]
pub enum SkillError {
    #[error("invalid skill: {0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(NotFoundKind),

    #[error("new parent is this skill's own parent or descendant")]
    Cycle,

    #[error("storage error: {0}")]
    Storage(String),
}

impl SkillError {
    /// Whether the engine may transparently retry the failed operation.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SkillError::Storage(_))
    }
}

/// Errors from repository operations (used by trait definitions in skilltree-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}

/// A missing row is the addressed skill; every other store failure is
/// reported as storage.
impl From<RepositoryError> for SkillError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::NotFound => SkillError::NotFound(NotFoundKind::Skill),
            other => SkillError::Storage(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_error_mentions_parent_or_descendant() {
        let err = SkillError::Cycle;
        assert!(err.to_string().contains("parent or descendant"));
    }

    #[test]
    fn test_not_found_display() {
        assert_eq!(
            SkillError::NotFound(NotFoundKind::Parent).to_string(),
            "parent not found"
        );
        assert_eq!(
            SkillError::NotFound(NotFoundKind::Skill).to_string(),
            "skill not found"
        );
    }

    #[test]
    fn test_only_storage_is_retryable() {
        assert!(SkillError::Storage("disk I/O error".to_string()).is_retryable());
        assert!(!SkillError::Cycle.is_retryable());
        assert!(!SkillError::Validation("x".to_string()).is_retryable());
        assert!(!SkillError::NotFound(NotFoundKind::Skill).is_retryable());
    }

    #[test]
    fn test_repository_error_mapping() {
        assert!(matches!(
            SkillError::from(RepositoryError::NotFound),
            SkillError::NotFound(NotFoundKind::Skill)
        ));
        assert!(matches!(
            SkillError::from(RepositoryError::Connection),
            SkillError::Storage(_)
        ));
    }

    #[test]
    fn test_repository_error_display() {
        let err = RepositoryError::Query("syntax error".to_string());
        assert_eq!(err.to_string(), "query error: syntax error");
    }
}
