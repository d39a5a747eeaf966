//! Structural equality and change collection between tree states

use crate::model::StateNode;

/// Structural equality of two trees
///
/// Fields are compared in a fixed order and the first difference
/// short-circuits: id, root flag, payload presence, payload bytes, child
/// count, then children pairwise in order. Children with the same content in
/// a different order are *not* equal.
pub fn is_equal(a: &StateNode, b: &StateNode) -> bool {
    if a.id != b.id {
        return false;
    }
    if a.is_root != b.is_root {
        return false;
    }
    if a.payload.is_some() != b.payload.is_some() {
        return false;
    }
    if a.payload != b.payload {
        return false;
    }
    if a.children.len() != b.children.len() {
        return false;
    }
    a.children
        .iter()
        .zip(b.children.iter())
        .all(|(x, y)| is_equal(x, y))
}

/// The nodes touched by a merge, in notification order
///
/// Every entry is a copy of a post-merge node whose subtree differs from
/// what it was before the merge (or that did not exist before). Order is
/// depth-first, parent before children.
#[derive(Clone, Debug, Default)]
pub struct ChangeSet {
    pub nodes: Vec<StateNode>,
}

impl ChangeSet {
    pub fn new(nodes: Vec<StateNode>) -> Self {
        ChangeSet { nodes }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StateNode> {
        self.nodes.iter()
    }

    /// Ids of the changed nodes, in order
    pub fn ids(&self) -> Vec<&str> {
        self.nodes.iter().map(|n| n.id.as_str()).collect()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.iter().any(|n| n.id == id)
    }
}

/// Collect the changed subtree after merging `incoming` at a merge point
///
/// `before` is the merge point as it was before the merge (`None` when the
/// node was newly added) and `after` is the same node once merged. Only the
/// incoming tree is walked, so nodes the merge never reached are not
/// visited; subtrees equal to their pre-merge counterpart are pruned.
pub fn collect_changes(
    incoming: &StateNode,
    before: Option<&StateNode>,
    after: &StateNode,
) -> ChangeSet {
    let mut nodes = Vec::new();
    collect_recursive(incoming, before, after, &mut nodes);
    ChangeSet::new(nodes)
}

fn collect_recursive(
    incoming: &StateNode,
    before: Option<&StateNode>,
    after: &StateNode,
    out: &mut Vec<StateNode>,
) {
    if let Some(before) = before {
        if is_equal(before, after) {
            return;
        }
    }

    out.push(after.clone());

    for (i, child) in incoming.children.iter().enumerate() {
        // Merge folds duplicate ids into the first match; visit it once.
        if incoming.children[..i].iter().any(|c| c.id == child.id) {
            continue;
        }
        let Some(after_child) = after.child(&child.id) else {
            continue;
        };
        let before_child = before.and_then(|b| b.child(&child.id));
        collect_recursive(child, before_child, after_child, out);
    }
}
