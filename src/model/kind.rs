//! Typed state kinds

use super::StateNode;
use crate::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// A kind of state node: a fixed id plus the model its payload decodes to
///
/// Kinds replace a type hierarchy of states. There is only one node type;
/// a kind is a tag that knows its id and how to read and write its payload.
///
/// ```ignore
/// struct Counter;
///
/// impl StateKind for Counter {
///     const ID: &'static str = "Counter";
///     type Model = i64;
/// }
///
/// let node = Counter::node(&0)?;
/// assert_eq!(Counter::decode(&node), Some(0));
/// ```
pub trait StateKind {
    /// Id shared by every node of this kind
    const ID: &'static str;

    /// Decoded payload type
    type Model: Serialize + DeserializeOwned;

    /// An empty node of this kind, used as an observer target or lookup key
    fn shape() -> StateNode {
        StateNode::new(Self::ID)
    }

    /// A node of this kind carrying `model`
    fn node(model: &Self::Model) -> Result<StateNode> {
        Self::shape().with_model(model)
    }

    /// Decode a node's payload if the node is of this kind
    fn decode(node: &StateNode) -> Option<Self::Model> {
        if node.id != Self::ID {
            return None;
        }
        node.payload_as()
    }
}
