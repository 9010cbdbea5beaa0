//! Skill repository trait definition.

use skilltree_types::error::RepositoryError;
use skilltree_types::skill::{NewSkill, Skill, SkillId, SkillPatch};

/// Repository trait for skill persistence.
///
/// Plain CRUD over individual records: implementations enforce column-level
/// constraints only and never validate tree structure. Implementations live
/// in skilltree-infra (e.g., SqliteSkillRepository).
pub trait SkillRepository: Send + Sync {
    /// Insert a new skill. The store assigns the id and timestamps and
    /// returns the persisted record.
    fn insert(
        &self,
        skill: &NewSkill,
    ) -> impl std::future::Future<Output = Result<Skill, RepositoryError>> + Send;

    /// Get a skill by its unique ID.
    fn get(
        &self,
        id: &SkillId,
    ) -> impl std::future::Future<Output = Result<Option<Skill>, RepositoryError>> + Send;

    /// Apply a column patch and bump `updated_at`. Returns the updated record,
    /// or `RepositoryError::NotFound` if the row does not exist.
    fn update(
        &self,
        id: &SkillId,
        patch: &SkillPatch,
    ) -> impl std::future::Future<Output = Result<Skill, RepositoryError>> + Send;

    /// Permanently delete a single skill row.
    fn delete(
        &self,
        id: &SkillId,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Delete every listed row in one transaction. Either all rows disappear
    /// or none do. Returns the number of rows removed.
    fn delete_many(
        &self,
        ids: &[SkillId],
    ) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;

    /// Load every skill record.
    fn list_all(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<Skill>, RepositoryError>> + Send;
}
