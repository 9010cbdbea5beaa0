//! Arena representation of the skill forest.
//!
//! Records are keyed by id and structure lives in a separate child index
//! (`parent_id -> child ids`). Nodes never point at each other; every parent
//! lookup goes back through the arena. The arena is rebuilt from a full
//! `list_all` snapshot per operation, which is cheap at the expected scale
//! (thousands of rows).

use std::collections::{HashMap, HashSet};

use skilltree_types::skill::{Skill, SkillId, SkillNode, SkillRef, SkillStats};
use thiserror::Error;

/// Structural inconsistencies found while walking a snapshot.
///
/// These can only arise from data written outside the engine, since the
/// engine never commits a cycle or a dangling parent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ForestError {
    #[error("skill {0} is not in the forest")]
    Unknown(SkillId),

    #[error("skill {child} references missing parent {parent}")]
    DanglingParent { child: SkillId, parent: SkillId },

    #[error("parent chain starting at {0} exceeds {1} hops")]
    ChainTooLong(SkillId, usize),
}

/// Snapshot of all skills with a child index.
#[derive(Debug, Clone, Default)]
pub struct SkillForest {
    nodes: HashMap<SkillId, Skill>,
    children: HashMap<SkillId, Vec<SkillId>>,
    roots: Vec<SkillId>,
}

impl SkillForest {
    /// Build the arena from a flat list of records.
    ///
    /// Roots and sibling lists are ordered by `created_at`, then id. A record
    /// whose parent is missing from the snapshot is listed as a root so it
    /// stays reachable; `ancestors` still reports the dangling reference.
    pub fn from_skills(skills: Vec<Skill>) -> Self {
        let nodes: HashMap<SkillId, Skill> = skills.into_iter().map(|s| (s.id, s)).collect();

        let mut children: HashMap<SkillId, Vec<SkillId>> = HashMap::new();
        let mut roots = Vec::new();
        for skill in nodes.values() {
            match skill.parent_id {
                Some(parent) if nodes.contains_key(&parent) => {
                    children.entry(parent).or_default().push(skill.id);
                }
                _ => roots.push(skill.id),
            }
        }

        let sort_key = |id: &SkillId| nodes.get(id).map(|s| (s.created_at, s.id));
        roots.sort_by_key(sort_key);
        for siblings in children.values_mut() {
            siblings.sort_by_key(sort_key);
        }

        Self {
            nodes,
            children,
            roots,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: &SkillId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn get(&self, id: &SkillId) -> Option<&Skill> {
        self.nodes.get(id)
    }

    /// Direct children of `id` in display order. Empty for unknown ids.
    pub fn children(&self, id: &SkillId) -> Vec<&Skill> {
        self.child_ids(id)
            .iter()
            .filter_map(|child| self.nodes.get(child))
            .collect()
    }

    fn child_ids(&self, id: &SkillId) -> &[SkillId] {
        self.children.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    // -----------------------------------------------------------------------
    // Ancestor queries
    // -----------------------------------------------------------------------

    /// Path from the forest root down to the direct parent of `id`.
    pub fn ancestors(&self, id: &SkillId) -> Result<Vec<&Skill>, ForestError> {
        let skill = self.nodes.get(id).ok_or(ForestError::Unknown(*id))?;
        self.chain_above(skill)
    }

    /// Walk parent links upward from `skill`, bounded by the node count.
    fn chain_above<'a>(&'a self, skill: &'a Skill) -> Result<Vec<&'a Skill>, ForestError> {
        let limit = self.nodes.len();
        let mut chain = Vec::new();
        let mut current = skill;

        while let Some(parent_id) = current.parent_id {
            if chain.len() >= limit {
                return Err(ForestError::ChainTooLong(skill.id, limit));
            }
            let parent = self
                .nodes
                .get(&parent_id)
                .ok_or(ForestError::DanglingParent {
                    child: current.id,
                    parent: parent_id,
                })?;
            chain.push(parent);
            current = parent;
        }

        chain.reverse();
        Ok(chain)
    }

    /// Ancestors as lightweight references, root first.
    pub fn ancestor_refs(&self, id: &SkillId) -> Result<Vec<SkillRef>, ForestError> {
        Ok(self
            .ancestors(id)?
            .into_iter()
            .map(SkillRef::from)
            .collect())
    }

    pub fn depth(&self, id: &SkillId) -> Result<usize, ForestError> {
        Ok(self.ancestors(id)?.len())
    }

    /// Whether making `candidate_parent` the parent of `id` would close a cycle.
    ///
    /// True when the candidate is `id` itself or when `id` appears anywhere on
    /// the candidate's ancestor chain (i.e. the candidate is a descendant).
    pub fn would_create_cycle(
        &self,
        id: &SkillId,
        candidate_parent: &SkillId,
    ) -> Result<bool, ForestError> {
        if id == candidate_parent {
            return Ok(true);
        }
        let candidate = self
            .nodes
            .get(candidate_parent)
            .ok_or(ForestError::Unknown(*candidate_parent))?;
        Ok(self.chain_above(candidate)?.iter().any(|s| s.id == *id))
    }

    // -----------------------------------------------------------------------
    // Descendant queries
    // -----------------------------------------------------------------------

    /// Every descendant of `id` in depth-first pre-order, excluding `id`.
    pub fn descendants(&self, id: &SkillId) -> Vec<SkillId> {
        let mut seen: HashSet<SkillId> = HashSet::from([*id]);
        let mut out = Vec::new();
        let mut stack: Vec<SkillId> = self.child_ids(id).iter().rev().copied().collect();

        while let Some(current) = stack.pop() {
            if !seen.insert(current) {
                continue;
            }
            out.push(current);
            stack.extend(self.child_ids(&current).iter().rev().copied());
        }

        out
    }

    pub fn total_descendants(&self, id: &SkillId) -> usize {
        self.descendants(id).len()
    }

    pub fn stats(&self, id: &SkillId) -> Result<SkillStats, ForestError> {
        Ok(SkillStats {
            direct_child_count: self.child_ids(id).len(),
            total_descendants: self.total_descendants(id),
            depth: self.depth(id)?,
        })
    }

    // -----------------------------------------------------------------------
    // Materialization
    // -----------------------------------------------------------------------

    /// The full subtree rooted at `id`, or `None` for unknown ids.
    pub fn subtree(&self, id: &SkillId) -> Option<SkillNode> {
        if !self.contains(id) {
            return None;
        }

        let mut order = vec![*id];
        order.extend(self.descendants(id));

        // Reverse pre-order visits every child before its parent.
        let mut built: HashMap<SkillId, SkillNode> = HashMap::with_capacity(order.len());
        for current in order.iter().rev() {
            let Some(skill) = self.nodes.get(current) else {
                continue;
            };
            let children = self
                .child_ids(current)
                .iter()
                .filter_map(|child| built.remove(child))
                .collect();
            built.insert(
                *current,
                SkillNode {
                    skill: skill.clone(),
                    children,
                },
            );
        }

        built.remove(id)
    }

    /// Every root with its subtree fully materialized.
    pub fn materialize(&self) -> Vec<SkillNode> {
        self.roots.iter().filter_map(|id| self.subtree(id)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    /// Build skills with strictly increasing `created_at` so ordering is stable.
    struct Builder {
        skills: Vec<Skill>,
    }

    impl Builder {
        fn new() -> Self {
            Self { skills: Vec::new() }
        }

        fn add(&mut self, name: &str, parent: Option<SkillId>) -> SkillId {
            let at = Utc::now() + Duration::milliseconds(self.skills.len() as i64);
            let id = SkillId::new();
            self.skills.push(Skill {
                id,
                name: name.to_string(),
                description: None,
                icon: None,
                color: None,
                parent_id: parent,
                created_by: None,
                created_at: at,
                updated_at: at,
            });
            id
        }

        fn build(self) -> SkillForest {
            SkillForest::from_skills(self.skills)
        }
    }

    fn names(skills: &[&Skill]) -> Vec<String> {
        skills.iter().map(|s| s.name.clone()).collect()
    }

    #[test]
    fn test_ancestors_root_first() {
        let mut b = Builder::new();
        let math = b.add("Math", None);
        let algebra = b.add("Algebra", Some(math));
        let linear = b.add("Linear Equations", Some(algebra));
        let forest = b.build();

        assert!(forest.ancestors(&math).unwrap().is_empty());
        assert_eq!(names(&forest.ancestors(&algebra).unwrap()), vec!["Math"]);
        assert_eq!(
            names(&forest.ancestors(&linear).unwrap()),
            vec!["Math", "Algebra"]
        );
        assert_eq!(forest.depth(&linear).unwrap(), 2);
    }

    #[test]
    fn test_children_in_creation_order() {
        let mut b = Builder::new();
        let math = b.add("Math", None);
        b.add("Geometry", Some(math));
        b.add("Algebra", Some(math));
        let forest = b.build();

        assert_eq!(names(&forest.children(&math)), vec!["Geometry", "Algebra"]);
        assert!(forest.children(&SkillId::new()).is_empty());
    }

    #[test]
    fn test_descendants_and_stats() {
        let mut b = Builder::new();
        let math = b.add("Math", None);
        let algebra = b.add("Algebra", Some(math));
        b.add("Linear Equations", Some(algebra));
        b.add("Quadratics", Some(algebra));
        let geometry = b.add("Geometry", Some(math));
        let forest = b.build();

        assert_eq!(forest.total_descendants(&math), 4);
        assert_eq!(forest.total_descendants(&geometry), 0);

        let stats = forest.stats(&algebra).unwrap();
        assert_eq!(stats.direct_child_count, 2);
        assert_eq!(stats.total_descendants, 2);
        assert_eq!(stats.depth, 1);
    }

    #[test]
    fn test_depth_matches_ancestors_and_descendant_sums_hold() {
        let mut b = Builder::new();
        let mut ids = Vec::new();
        for i in 0..40 {
            // Deterministic mixed shape: some roots, some chains, some fans.
            let parent = match i % 5 {
                0 => None,
                1 | 2 => ids.last().copied(),
                _ => ids.get(i / 2).copied(),
            };
            ids.push(b.add(&format!("skill-{i}"), parent));
        }
        let forest = b.build();

        for id in &ids {
            assert_eq!(
                forest.depth(id).unwrap(),
                forest.ancestors(id).unwrap().len()
            );
            let expected: usize = forest
                .children(id)
                .iter()
                .map(|c| 1 + forest.total_descendants(&c.id))
                .sum();
            assert_eq!(forest.total_descendants(id), expected);
        }
    }

    #[test]
    fn test_would_create_cycle() {
        let mut b = Builder::new();
        let math = b.add("Math", None);
        let algebra = b.add("Algebra", Some(math));
        let linear = b.add("Linear Equations", Some(algebra));
        let physics = b.add("Physics", None);
        let forest = b.build();

        assert!(forest.would_create_cycle(&math, &math).unwrap());
        assert!(forest.would_create_cycle(&math, &linear).unwrap());
        assert!(forest.would_create_cycle(&algebra, &linear).unwrap());
        assert!(!forest.would_create_cycle(&linear, &math).unwrap());
        assert!(!forest.would_create_cycle(&math, &physics).unwrap());
        assert_eq!(
            forest.would_create_cycle(&math, &SkillId::new()).map_err(|_| ()),
            Err(())
        );
    }

    #[test]
    fn test_deep_chain_is_iterative() {
        let mut b = Builder::new();
        let mut parent = None;
        let mut ids = Vec::new();
        for i in 0..20_000 {
            let id = b.add(&format!("level-{i}"), parent);
            ids.push(id);
            parent = Some(id);
        }
        let forest = b.build();

        assert_eq!(forest.depth(&ids[19_999]).unwrap(), 19_999);
        assert_eq!(forest.total_descendants(&ids[0]), 19_999);
        assert!(!forest.would_create_cycle(&ids[19_999], &ids[0]).unwrap());
        assert!(forest.would_create_cycle(&ids[0], &ids[19_999]).unwrap());

        // Nested SkillNode values drop recursively, so keep the materialized
        // part shallow enough for the test thread's stack.
        let tail = forest.subtree(&ids[19_000]).unwrap();
        assert_eq!(tail.subtree_len(), 1_000);
    }

    #[test]
    fn test_corrupted_cycle_is_bounded() {
        let now = Utc::now();
        let a = SkillId::new();
        let b = SkillId::new();
        let make = |id: SkillId, parent: SkillId, name: &str| Skill {
            id,
            name: name.to_string(),
            description: None,
            icon: None,
            color: None,
            parent_id: Some(parent),
            created_by: None,
            created_at: now,
            updated_at: now,
        };
        let forest = SkillForest::from_skills(vec![make(a, b, "A"), make(b, a, "B")]);

        assert!(matches!(
            forest.ancestors(&a),
            Err(ForestError::ChainTooLong(_, 2))
        ));
        assert_eq!(forest.descendants(&a), vec![b]);
        assert!(forest.materialize().is_empty());
    }

    #[test]
    fn test_dangling_parent_listed_as_root() {
        let now = Utc::now();
        let orphan = Skill {
            id: SkillId::new(),
            name: "Orphan".to_string(),
            description: None,
            icon: None,
            color: None,
            parent_id: Some(SkillId::new()),
            created_by: None,
            created_at: now,
            updated_at: now,
        };
        let id = orphan.id;
        let forest = SkillForest::from_skills(vec![orphan]);

        let roots = forest.materialize();
        assert_eq!(roots.len(), 1);
        assert_eq!(roots[0].skill.id, id);
        assert!(matches!(
            forest.ancestors(&id),
            Err(ForestError::DanglingParent { .. })
        ));
    }

    #[test]
    fn test_materialize_preserves_shape() {
        let mut b = Builder::new();
        let math = b.add("Math", None);
        let algebra = b.add("Algebra", Some(math));
        b.add("Linear Equations", Some(algebra));
        b.add("Geometry", Some(math));
        b.add("Physics", None);
        let forest = b.build();

        let roots = forest.materialize();
        assert_eq!(roots.len(), 2);
        assert_eq!(roots[0].skill.name, "Math");
        assert_eq!(roots[0].children.len(), 2);
        assert_eq!(roots[0].children[0].skill.name, "Algebra");
        assert_eq!(roots[0].children[0].children[0].skill.name, "Linear Equations");
        assert_eq!(roots[1].skill.name, "Physics");
        assert!(roots[1].children.is_empty());
    }
}
