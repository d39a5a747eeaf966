//! Depth-first lookup by id

use crate::model::StateNode;

/// Find the first node with the given id
///
/// Parent before children, children in list order; the first match ends the
/// search.
pub fn find<'a>(node: &'a StateNode, id: &str) -> Option<&'a StateNode> {
    if node.id == id {
        return Some(node);
    }
    node.children.iter().find_map(|child| find(child, id))
}

/// Mutable variant of [`find`], same visiting order
pub fn find_mut<'a>(node: &'a mut StateNode, id: &str) -> Option<&'a mut StateNode> {
    if node.id == id {
        return Some(node);
    }
    node.children.iter_mut().find_map(|child| find_mut(child, id))
}
