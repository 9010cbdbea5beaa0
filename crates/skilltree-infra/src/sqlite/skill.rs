//! SQLite skill repository implementation.
//!
//! Implements `SkillRepository` from `skilltree-core` using sqlx with split
//! read/write pools. Only column constraints are enforced here; tree rules
//! belong to the hierarchy engine.

use chrono::{DateTime, Utc};
use skilltree_core::repository::skill::SkillRepository;
use skilltree_types::error::RepositoryError;
use skilltree_types::skill::{NewSkill, Skill, SkillId, SkillPatch};
use sqlx::Row;

use super::pool::DatabasePool;

/// SQLite-backed implementation of `SkillRepository`.
pub struct SqliteSkillRepository {
    pool: DatabasePool,
}

impl SqliteSkillRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

/// Internal row type for mapping SQLite rows to domain Skill.
struct SkillRow {
    id: String,
    name: String,
    description: Option<String>,
    icon: Option<String>,
    color: Option<i64>,
    parent_id: Option<String>,
    created_by: Option<String>,
    created_at: String,
    updated_at: String,
}

impl SkillRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            icon: row.try_get("icon")?,
            color: row.try_get("color")?,
            parent_id: row.try_get("parent_id")?,
            created_by: row.try_get("created_by")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_skill(self) -> Result<Skill, RepositoryError> {
        let id = parse_id(&self.id)?;
        let parent_id = self.parent_id.as_deref().map(parse_id).transpose()?;

        Ok(Skill {
            id,
            name: self.name,
            description: self.description,
            icon: self.icon,
            color: self.color,
            parent_id,
            created_by: self.created_by,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

fn parse_id(s: &str) -> Result<SkillId, RepositoryError> {
    s.parse::<SkillId>()
        .map_err(|e| RepositoryError::Query(format!("invalid skill id '{s}': {e}")))
}

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

fn query_error(e: sqlx::Error) -> RepositoryError {
    match e {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            RepositoryError::Connection
        }
        sqlx::Error::Database(db_err) if db_err.message().contains("FOREIGN KEY") => {
            RepositoryError::Conflict(db_err.message().to_string())
        }
        other => RepositoryError::Query(other.to_string()),
    }
}

fn decode(row: &sqlx::sqlite::SqliteRow) -> Result<Skill, RepositoryError> {
    SkillRow::from_row(row)
        .map_err(|e| RepositoryError::Query(e.to_string()))?
        .into_skill()
}

impl SkillRepository for SqliteSkillRepository {
    async fn insert(&self, skill: &NewSkill) -> Result<Skill, RepositoryError> {
        let now = Utc::now();
        let record = Skill {
            id: SkillId::new(),
            name: skill.name.clone(),
            description: skill.description.clone(),
            icon: skill.icon.clone(),
            color: skill.color,
            parent_id: skill.parent_id,
            created_by: skill.created_by.clone(),
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            "INSERT INTO skills (id, name, description, icon, color, parent_id, created_by, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(record.id.to_string())
        .bind(&record.name)
        .bind(&record.description)
        .bind(&record.icon)
        .bind(record.color)
        .bind(record.parent_id.map(|p| p.to_string()))
        .bind(&record.created_by)
        .bind(format_datetime(&record.created_at))
        .bind(format_datetime(&record.updated_at))
        .execute(&self.pool.writer)
        .await
        .map_err(query_error)?;

        Ok(record)
    }

    async fn get(&self, id: &SkillId) -> Result<Option<Skill>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM skills WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_error)?;

        row.as_ref().map(decode).transpose()
    }

    async fn update(&self, id: &SkillId, patch: &SkillPatch) -> Result<Skill, RepositoryError> {
        let mut tx = self.pool.writer.begin().await.map_err(query_error)?;

        let row = sqlx::query("SELECT * FROM skills WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&mut *tx)
            .await
            .map_err(query_error)?
            .ok_or(RepositoryError::NotFound)?;
        let mut skill = decode(&row)?;

        if let Some(name) = &patch.name {
            skill.name = name.clone();
        }
        if let Some(description) = &patch.description {
            skill.description = description.clone();
        }
        if let Some(icon) = &patch.icon {
            skill.icon = icon.clone();
        }
        if let Some(color) = patch.color {
            skill.color = color;
        }
        if let Some(parent_id) = patch.parent_id {
            skill.parent_id = parent_id;
        }
        skill.updated_at = Utc::now();

        sqlx::query(
            "UPDATE skills SET name = ?, description = ?, icon = ?, color = ?, parent_id = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(&skill.name)
        .bind(&skill.description)
        .bind(&skill.icon)
        .bind(skill.color)
        .bind(skill.parent_id.map(|p| p.to_string()))
        .bind(format_datetime(&skill.updated_at))
        .bind(id.to_string())
        .execute(&mut *tx)
        .await
        .map_err(query_error)?;

        tx.commit().await.map_err(query_error)?;
        Ok(skill)
    }

    async fn delete(&self, id: &SkillId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM skills WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool.writer)
            .await
            .map_err(query_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn delete_many(&self, ids: &[SkillId]) -> Result<u64, RepositoryError> {
        let mut tx = self.pool.writer.begin().await.map_err(query_error)?;

        let mut removed = 0;
        for id in ids {
            let result = sqlx::query("DELETE FROM skills WHERE id = ?")
                .bind(id.to_string())
                .execute(&mut *tx)
                .await
                .map_err(query_error)?;
            removed += result.rows_affected();
        }

        // Deferred foreign keys are checked here; a leftover child rolls the
        // whole batch back.
        tx.commit().await.map_err(query_error)?;
        Ok(removed)
    }

    async fn list_all(&self) -> Result<Vec<Skill>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM skills ORDER BY created_at, id")
            .fetch_all(&self.pool.reader)
            .await
            .map_err(query_error)?;

        rows.iter().map(decode).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::pool::database_url;

    async fn test_pool() -> DatabasePool {
        let dir = tempfile::tempdir().unwrap();
        let url = database_url(dir.path());
        // Leak tempdir so it lives for the test
        std::mem::forget(dir);
        DatabasePool::new(&url).await.unwrap()
    }

    fn new_skill(name: &str, parent_id: Option<SkillId>) -> NewSkill {
        NewSkill {
            name: name.to_string(),
            parent_id,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let repo = SqliteSkillRepository::new(test_pool().await);
        let record = NewSkill {
            name: "Math".to_string(),
            description: Some("Numbers".to_string()),
            icon: Some("calculator".to_string()),
            color: Some(2),
            parent_id: None,
            created_by: Some("admin".to_string()),
        };

        let created = repo.insert(&record).await.unwrap();
        assert_eq!(created.created_at, created.updated_at);

        let found = repo.get(&created.id).await.unwrap().unwrap();
        assert_eq!(found.name, "Math");
        assert_eq!(found.description.as_deref(), Some("Numbers"));
        assert_eq!(found.icon.as_deref(), Some("calculator"));
        assert_eq!(found.color, Some(2));
        assert_eq!(found.created_by.as_deref(), Some("admin"));
        assert!(found.parent_id.is_none());
    }

    #[tokio::test]
    async fn test_get_missing_returns_none() {
        let repo = SqliteSkillRepository::new(test_pool().await);
        assert!(repo.get(&SkillId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_insert_with_unknown_parent_is_rejected() {
        let repo = SqliteSkillRepository::new(test_pool().await);
        let err = repo
            .insert(&new_skill("Orphan", Some(SkillId::new())))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
        assert!(repo.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_patch() {
        let repo = SqliteSkillRepository::new(test_pool().await);
        let math = repo.insert(&new_skill("Math", None)).await.unwrap();
        let algebra = repo
            .insert(&NewSkill {
                description: Some("Old".to_string()),
                ..new_skill("Algebra", None)
            })
            .await
            .unwrap();

        let patch = SkillPatch {
            name: Some("Algebra I".to_string()),
            description: Some(None),
            parent_id: Some(Some(math.id)),
            ..Default::default()
        };
        let updated = repo.update(&algebra.id, &patch).await.unwrap();
        assert_eq!(updated.name, "Algebra I");
        assert!(updated.description.is_none());
        assert_eq!(updated.parent_id, Some(math.id));
        assert!(updated.updated_at >= algebra.updated_at);

        let found = repo.get(&algebra.id).await.unwrap().unwrap();
        assert_eq!(found, updated);
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let repo = SqliteSkillRepository::new(test_pool().await);
        let err = repo
            .update(&SkillId::new(), &SkillPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));
    }

    #[tokio::test]
    async fn test_delete() {
        let repo = SqliteSkillRepository::new(test_pool().await);
        let math = repo.insert(&new_skill("Math", None)).await.unwrap();

        repo.delete(&math.id).await.unwrap();
        assert!(repo.get(&math.id).await.unwrap().is_none());

        let err = repo.delete(&math.id).await.unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));
    }

    #[tokio::test]
    async fn test_delete_many_removes_subtree_in_any_order() {
        let repo = SqliteSkillRepository::new(test_pool().await);
        let math = repo.insert(&new_skill("Math", None)).await.unwrap();
        let algebra = repo.insert(&new_skill("Algebra", Some(math.id))).await.unwrap();
        let linear = repo
            .insert(&new_skill("Linear Equations", Some(algebra.id)))
            .await
            .unwrap();
        let physics = repo.insert(&new_skill("Physics", None)).await.unwrap();

        // Parent first: only valid because the foreign key is deferred.
        let removed = repo
            .delete_many(&[math.id, algebra.id, linear.id])
            .await
            .unwrap();
        assert_eq!(removed, 3);

        let remaining = repo.list_all().await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, physics.id);
    }

    #[tokio::test]
    async fn test_delete_many_is_all_or_nothing() {
        let repo = SqliteSkillRepository::new(test_pool().await);
        let math = repo.insert(&new_skill("Math", None)).await.unwrap();
        let algebra = repo.insert(&new_skill("Algebra", Some(math.id))).await.unwrap();
        repo.insert(&new_skill("Linear Equations", Some(algebra.id)))
            .await
            .unwrap();

        // Leaving a child behind violates the foreign key at commit.
        let err = repo.delete_many(&[math.id, algebra.id]).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
        assert_eq!(repo.list_all().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_list_all_in_creation_order() {
        let repo = SqliteSkillRepository::new(test_pool().await);
        let mut ids = Vec::new();
        for name in ["Math", "Physics", "Chemistry"] {
            ids.push(repo.insert(&new_skill(name, None)).await.unwrap().id);
        }

        let listed: Vec<SkillId> = repo.list_all().await.unwrap().iter().map(|s| s.id).collect();
        assert_eq!(listed, ids);
    }

    #[tokio::test]
    async fn test_corrupted_row_is_query_error() {
        let pool = test_pool().await;
        sqlx::query(
            "INSERT INTO skills (id, name, created_at, updated_at) VALUES ('not-a-uuid', 'Broken', 'x', 'x')",
        )
        .execute(&pool.writer)
        .await
        .unwrap();

        let repo = SqliteSkillRepository::new(pool);
        let err = repo.list_all().await.unwrap_err();
        assert!(matches!(err, RepositoryError::Query(_)));
    }
}
