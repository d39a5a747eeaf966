//! Additive in-place merge of an incoming tree into a live tree

use crate::model::StateNode;

/// Merge `incoming` into `target` in place
///
/// Every field except `children` is overwritten by the incoming value. Each
/// incoming child is merged into the first target child with the same id,
/// or appended as a copy when there is none. Target children that the
/// incoming tree does not mention are left as they are: merging never
/// deletes. Removal has to be modelled as data (e.g. a payload field).
pub fn merge_into(incoming: &StateNode, target: &mut StateNode) {
    if target.id != incoming.id {
        target.id.clone_from(&incoming.id);
    }
    target.payload.clone_from(&incoming.payload);
    target.is_root = incoming.is_root;

    for child in &incoming.children {
        match target.child_mut(&child.id) {
            Some(existing) => merge_into(child, existing),
            None => target.children.push(deep_copy(child)),
        }
    }
}

/// Full structural copy of a tree
///
/// Payload buffers are immutable and shared by reference count; everything
/// else is duplicated, so mutating the copy never reaches the original.
pub fn deep_copy(node: &StateNode) -> StateNode {
    StateNode {
        id: node.id.clone(),
        payload: node.payload.clone(),
        children: node.children.iter().map(deep_copy).collect(),
        is_root: node.is_root,
    }
}
