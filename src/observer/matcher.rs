//! Matching rules that route a changed node to observers

use crate::model::{StateKind, StateNode};
use std::fmt;
use std::sync::Arc;

/// Predicate evaluated against the whole post-merge tree
pub type Predicate = Arc<dyn Fn(&StateNode) -> bool + Send + Sync>;

/// The id an observer is interested in
///
/// Built from a plain id, from a shape node (only its id is kept) or from a
/// [`StateKind`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Target(String);

impl Target {
    pub fn new(id: impl Into<String>) -> Self {
        Target(id.into())
    }

    pub fn of<K: StateKind>() -> Self {
        Target(K::ID.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether a changed node has this target's identity
    pub fn matches(&self, node: &StateNode) -> bool {
        node.id == self.0
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Target {
    fn from(id: &str) -> Self {
        Target(id.to_string())
    }
}

impl From<String> for Target {
    fn from(id: String) -> Self {
        Target(id)
    }
}

impl From<&StateNode> for Target {
    fn from(shape: &StateNode) -> Self {
        Target(shape.id.clone())
    }
}

impl From<StateNode> for Target {
    fn from(shape: StateNode) -> Self {
        Target(shape.id)
    }
}

/// The three observer kinds
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ObserverKind {
    Single,
    Multi,
    Conditional,
}

/// How an observer decides whether a changed node concerns it
#[derive(Clone)]
pub enum Matcher {
    /// Fires when the changed node has the target id
    Single(Target),
    /// Fires when any of the targets matches; scanning stops at the first hit
    AnyOf(Vec<Target>),
    /// Fires when the target matches and the predicate accepts the tree
    Conditional { target: Target, predicate: Predicate },
}

impl Matcher {
    pub fn kind(&self) -> ObserverKind {
        match self {
            Matcher::Single(_) => ObserverKind::Single,
            Matcher::AnyOf(_) => ObserverKind::Multi,
            Matcher::Conditional { .. } => ObserverKind::Conditional,
        }
    }

    /// Decide whether `changed` should be delivered
    ///
    /// `tree` is the whole tree after the merge; only conditional matchers
    /// look at it, and only once the target has matched.
    pub fn matches(&self, changed: &StateNode, tree: &StateNode) -> bool {
        match self {
            Matcher::Single(target) => target.matches(changed),
            Matcher::AnyOf(targets) => targets.iter().any(|t| t.matches(changed)),
            Matcher::Conditional { target, predicate } => {
                target.matches(changed) && predicate(tree)
            }
        }
    }
}

impl fmt::Debug for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Matcher::Single(target) => f.debug_tuple("Single").field(target).finish(),
            Matcher::AnyOf(targets) => f.debug_tuple("AnyOf").field(targets).finish(),
            Matcher::Conditional { target, .. } => f
                .debug_struct("Conditional")
                .field("target", target)
                .finish_non_exhaustive(),
        }
    }
}
