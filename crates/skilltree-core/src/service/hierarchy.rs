//! Hierarchy engine.
//!
//! Wraps a `SkillRepository` and owns every structural rule: cycle
//! prevention on reparent, ancestor/descendant computation, atomic cascade
//! delete, forest assembly, and search filtering.
//!
//! Concurrency: the repository contract does not promise serializable
//! isolation across a read-check-write sequence, so structural mutations
//! (create under a parent, reparent, delete) run under one async mutex.
//! Root-only creates, pure field edits and all reads skip the lock.

use std::future::Future;

use skilltree_types::error::{NotFoundKind, RepositoryError, SkillError};
use skilltree_types::skill::{
    CreateSkillRequest, NewSkill, SkillDetail, SkillId, SkillNode, SkillPatch, SkillRef,
    SkillView, UpdateSkillRequest, validate_description, validate_name,
};
use tokio::sync::{Mutex, MutexGuard};

use crate::hierarchy::{ForestError, SkillForest, filter_forest};
use crate::repository::skill::SkillRepository;

impl From<ForestError> for SkillError {
    fn from(e: ForestError) -> Self {
        SkillError::Storage(format!("inconsistent hierarchy: {e}"))
    }
}

/// Service enforcing the forest invariants on top of a plain repository.
pub struct HierarchyService<R: SkillRepository> {
    repo: R,
    structure_lock: Mutex<()>,
    storage_retries: u32,
}

impl<R: SkillRepository> HierarchyService<R> {
    /// Create a service that retries a failed store call once.
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            structure_lock: Mutex::new(()),
            storage_retries: 1,
        }
    }

    /// Override how many times a failed store call is retried.
    pub fn with_storage_retries(mut self, retries: u32) -> Self {
        self.storage_retries = retries;
        self
    }

    #[cfg(test)]
    pub(crate) fn repository(&self) -> &R {
        &self.repo
    }

    /// Create a skill, optionally under an existing parent.
    #[tracing::instrument(
        name = "skill.create",
        skip(self, request, created_by),
        fields(parent_id = ?request.parent_id)
    )]
    pub async fn create(
        &self,
        request: CreateSkillRequest,
        created_by: Option<String>,
    ) -> Result<SkillView, SkillError> {
        let name = validate_name(&request.name)?;
        let description = validate_description(request.description)?;

        // A new node has no descendants, so it cannot close a cycle. The lock
        // only keeps the parent from being deleted between check and insert.
        let _guard = self.lock_if(request.parent_id.is_some()).await;

        // Ancestors come from the pre-insert snapshot; nothing after the
        // commit may fail the request.
        let ancestors = match &request.parent_id {
            Some(parent_id) => {
                let forest = self.load_forest().await?;
                let parent = forest
                    .get(parent_id)
                    .ok_or(SkillError::NotFound(NotFoundKind::Parent))?;
                let mut chain = forest.ancestor_refs(parent_id)?;
                chain.push(SkillRef::from(parent));
                chain
            }
            None => Vec::new(),
        };

        let record = NewSkill {
            name,
            description,
            icon: request.icon.filter(|i| !i.is_empty()),
            color: request.color,
            parent_id: request.parent_id,
            created_by,
        };
        let skill = self.store("insert", || self.repo.insert(&record)).await?;

        tracing::info!(skill_id = %skill.id, name = %skill.name, "skill created");
        Ok(SkillView::new(skill, ancestors))
    }

    /// Apply a partial update. Reparenting is checked against the current tree.
    #[tracing::instrument(name = "skill.update", skip(self, request), fields(skill_id = %id))]
    pub async fn update(
        &self,
        id: &SkillId,
        request: UpdateSkillRequest,
    ) -> Result<SkillView, SkillError> {
        let _guard = self.lock_if(request.parent_id.is_some()).await;

        let forest = self.load_forest().await?;
        let current = forest
            .get(id)
            .cloned()
            .ok_or(SkillError::NotFound(NotFoundKind::Skill))?;

        let mut patch = SkillPatch::default();
        if let Some(name) = request.name {
            patch.name = Some(validate_name(&name)?);
        }
        if let Some(description) = request.description {
            patch.description = Some(validate_description(Some(description))?);
        }
        if let Some(icon) = request.icon {
            patch.icon = Some(Some(icon).filter(|i| !i.is_empty()));
        }
        if let Some(color) = request.color {
            patch.color = Some(Some(color));
        }

        // Ancestors after the write, computed from the pre-write snapshot.
        let mut ancestors = None;
        if let Some(new_parent) = request.parent_id {
            if new_parent != current.parent_id {
                ancestors = Some(match &new_parent {
                    Some(candidate) => Self::check_reparent(&forest, id, candidate)?,
                    None => Vec::new(),
                });
                patch.parent_id = Some(new_parent);
            }
        }
        let ancestors = match ancestors {
            Some(chain) => chain,
            None => forest.ancestor_refs(id)?,
        };

        let moved = patch.moves();
        let skill = self.store("update", || self.repo.update(id, &patch)).await?;

        if moved {
            tracing::info!(from = ?current.parent_id, to = ?skill.parent_id, "skill reparented");
        } else {
            tracing::debug!("skill fields updated");
        }
        Ok(SkillView::new(skill, ancestors))
    }

    /// Delete a skill and its whole subtree in one atomic commit.
    ///
    /// Returns the number of records removed (1 + total descendants).
    #[tracing::instrument(name = "skill.delete", skip(self), fields(skill_id = %id))]
    pub async fn delete(&self, id: &SkillId) -> Result<usize, SkillError> {
        let _guard = self.structure_lock.lock().await;

        let forest = self.load_forest().await?;
        if !forest.contains(id) {
            return Err(SkillError::NotFound(NotFoundKind::Skill));
        }

        let mut doomed = vec![*id];
        doomed.extend(forest.descendants(id));

        let removed = if doomed.len() == 1 {
            self.store("delete", || self.repo.delete(id)).await?;
            1
        } else {
            let rows = self
                .store("delete_many", || self.repo.delete_many(&doomed))
                .await?;
            usize::try_from(rows).unwrap_or(usize::MAX)
        };

        tracing::info!(removed, "skill subtree deleted");
        Ok(removed)
    }

    /// A skill with its ancestors, direct children, and structural stats.
    #[tracing::instrument(name = "skill.get", skip(self), fields(skill_id = %id))]
    pub async fn get(&self, id: &SkillId) -> Result<SkillDetail, SkillError> {
        let forest = self.load_forest().await?;
        let skill = forest
            .get(id)
            .cloned()
            .ok_or(SkillError::NotFound(NotFoundKind::Skill))?;

        Ok(SkillDetail {
            skill,
            ancestors: forest.ancestor_refs(id)?,
            children: forest.children(id).into_iter().cloned().collect(),
            stats: forest.stats(id)?,
        })
    }

    /// All roots with their subtrees, optionally filtered by a name query.
    #[tracing::instrument(name = "skill.list_forest", skip(self))]
    pub async fn list_forest(&self, search: Option<&str>) -> Result<Vec<SkillNode>, SkillError> {
        let forest = self.load_forest().await?;
        if forest.is_empty() {
            return Ok(Vec::new());
        }
        let roots = forest.materialize();
        tracing::debug!(skills = forest.len(), roots = roots.len(), "forest loaded");

        Ok(match search {
            Some(query) => {
                let kept = filter_forest(roots, query);
                let matched: usize = kept.iter().map(SkillNode::subtree_len).sum();
                tracing::debug!(query, matched, "forest filtered");
                kept
            }
            None => roots,
        })
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    async fn lock_if(&self, structural: bool) -> Option<MutexGuard<'_, ()>> {
        if structural {
            Some(self.structure_lock.lock().await)
        } else {
            None
        }
    }

    /// Reject a candidate parent that is the skill itself, does not exist,
    /// or sits inside the skill's own subtree. On success returns the
    /// skill's ancestor chain as it will read once moved under `candidate`.
    fn check_reparent(
        forest: &SkillForest,
        id: &SkillId,
        candidate: &SkillId,
    ) -> Result<Vec<SkillRef>, SkillError> {
        if candidate == id {
            return Err(SkillError::Cycle);
        }

        let parent = forest
            .get(candidate)
            .ok_or(SkillError::NotFound(NotFoundKind::Parent))?;
        if forest.would_create_cycle(id, candidate)? {
            tracing::warn!(candidate = %candidate, "reparent rejected: would create a cycle");
            return Err(SkillError::Cycle);
        }

        let mut chain = forest.ancestor_refs(candidate)?;
        chain.push(SkillRef::from(parent));
        Ok(chain)
    }

    async fn load_forest(&self) -> Result<SkillForest, SkillError> {
        let skills = self.store("list_all", || self.repo.list_all()).await?;
        Ok(SkillForest::from_skills(skills))
    }

    /// Run a store call, retrying storage failures up to `storage_retries`
    /// times. Deterministic failures return immediately.
    async fn store<T, F, Fut>(&self, operation: &'static str, mut call: F) -> Result<T, SkillError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, RepositoryError>>,
    {
        let mut attempt = 0;
        loop {
            let err = match call().await {
                Ok(value) => return Ok(value),
                Err(err) => SkillError::from(err),
            };
            if !err.is_retryable() {
                return Err(err);
            }
            if attempt < self.storage_retries {
                attempt += 1;
                tracing::warn!(operation, attempt, error = %err, "store call failed, retrying");
                continue;
            }
            tracing::error!(operation, error = %err, "store call failed");
            return Err(err);
        }
    }
}
