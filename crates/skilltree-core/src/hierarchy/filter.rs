//! Search filtering over a materialized forest.
//!
//! A node survives when its own name contains the query (case-insensitive)
//! or when some descendant survives. A node that matches directly keeps its
//! whole subtree untouched; a node kept only for a descendant keeps just the
//! surviving branches.

use skilltree_types::skill::{Skill, SkillNode};

/// Case-insensitive substring match against an already-lowercased needle.
pub fn name_matches(skill: &Skill, needle_lower: &str) -> bool {
    skill.name.to_lowercase().contains(needle_lower)
}

enum Frame {
    Visit(SkillNode),
    Assemble { node: SkillNode, child_count: usize },
}

/// Prune `forest` to the branches matching `query`.
///
/// A blank query returns the forest unchanged. Runs with an explicit stack,
/// post-order, so depth is limited only by memory. Applying the same query
/// to an already-filtered forest returns it unchanged.
pub fn filter_forest(forest: Vec<SkillNode>, query: &str) -> Vec<SkillNode> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return forest;
    }

    let mut stack: Vec<Frame> = forest.into_iter().rev().map(Frame::Visit).collect();
    // One entry per visited node, in visit order; `None` marks a pruned branch.
    let mut results: Vec<Option<SkillNode>> = Vec::new();

    while let Some(frame) = stack.pop() {
        match frame {
            Frame::Visit(mut node) => {
                if name_matches(&node.skill, &needle) {
                    results.push(Some(node));
                    continue;
                }
                let children = std::mem::take(&mut node.children);
                stack.push(Frame::Assemble {
                    node,
                    child_count: children.len(),
                });
                stack.extend(children.into_iter().rev().map(Frame::Visit));
            }
            Frame::Assemble { mut node, child_count } => {
                let start = results.len() - child_count;
                let kept: Vec<SkillNode> = results.drain(start..).flatten().collect();
                if kept.is_empty() {
                    results.push(None);
                } else {
                    node.children = kept;
                    results.push(Some(node));
                }
            }
        }
    }

    results.into_iter().flatten().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use skilltree_types::skill::SkillId;

    fn node(name: &str, children: Vec<SkillNode>) -> SkillNode {
        let now = Utc::now();
        SkillNode {
            skill: Skill {
                id: SkillId::new(),
                name: name.to_string(),
                description: None,
                icon: None,
                color: None,
                parent_id: None,
                created_by: None,
                created_at: now,
                updated_at: now,
            },
            children,
        }
    }

    fn names(nodes: &[SkillNode]) -> Vec<&str> {
        nodes.iter().map(|n| n.skill.name.as_str()).collect()
    }

    fn math_forest() -> Vec<SkillNode> {
        vec![
            node(
                "Math",
                vec![
                    node("Algebra", vec![node("Linear Equations", vec![])]),
                    node("Geometry", vec![node("Triangles", vec![])]),
                ],
            ),
            node("Physics", vec![node("Mechanics", vec![])]),
        ]
    }

    #[test]
    fn test_descendant_match_prunes_siblings() {
        let filtered = filter_forest(math_forest(), "alg");
        assert_eq!(names(&filtered), vec!["Math"]);
        assert_eq!(names(&filtered[0].children), vec!["Algebra"]);
    }

    #[test]
    fn test_direct_match_keeps_full_subtree() {
        let filtered = filter_forest(math_forest(), "ALGEBRA");
        let algebra = &filtered[0].children[0];
        assert_eq!(names(&algebra.children), vec!["Linear Equations"]);

        let filtered = filter_forest(math_forest(), "math");
        assert_eq!(filtered[0].subtree_len(), 5);
    }

    #[test]
    fn test_deep_match_keeps_path_only() {
        let filtered = filter_forest(math_forest(), "triang");
        assert_eq!(names(&filtered), vec!["Math"]);
        assert_eq!(names(&filtered[0].children), vec!["Geometry"]);
        assert_eq!(names(&filtered[0].children[0].children), vec!["Triangles"]);
    }

    #[test]
    fn test_multiple_roots_keep_order() {
        let filtered = filter_forest(math_forest(), "e");
        // Math survives through Algebra/Geometry, Physics through Mechanics.
        assert_eq!(names(&filtered), vec!["Math", "Physics"]);
    }

    #[test]
    fn test_no_match_is_empty() {
        assert!(filter_forest(math_forest(), "chemistry").is_empty());
    }

    #[test]
    fn test_blank_query_is_identity() {
        let forest = math_forest();
        let filtered = filter_forest(forest.clone(), "   ");
        assert_eq!(filtered, forest);
    }

    #[test]
    fn test_filter_is_idempotent() {
        for query in ["alg", "e", "triangles", "math", "zzz"] {
            let once = filter_forest(math_forest(), query);
            let twice = filter_forest(once.clone(), query);
            assert_eq!(once, twice, "query {query:?}");
        }
    }
}
