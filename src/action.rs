//! Actions and reducers

use crate::model::StateNode;
use std::sync::Arc;

/// Something that knows how to transform the state tree
///
/// `reduce` receives its own copy of the current root and returns the new
/// tree (or the same one). It must be total: when a precondition is not met,
/// return `old` unchanged. Reducers run while the store holds its write lock:
/// they may read the store, but calling `reduce` or `dispatch` from one
/// panics. Side effects belong in middleware.
pub trait Action: Send + Sync {
    fn reduce(&self, old: StateNode) -> StateNode;

    /// Name used in logs
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Shared handle to an action, as passed along the middleware chain
pub type ActionRef = Arc<dyn Action>;

/// A reducer as a plain function
pub type Reducer = fn(StateNode) -> StateNode;

impl Action for Reducer {
    fn reduce(&self, old: StateNode) -> StateNode {
        self(old)
    }

    fn name(&self) -> &str {
        "reducer"
    }
}

/// An action built from a closure
pub struct FnAction<F> {
    name: String,
    reducer: F,
}

/// Create a named action from a closure
pub fn from_fn<F>(name: impl Into<String>, reducer: F) -> FnAction<F>
where
    F: Fn(StateNode) -> StateNode + Send + Sync,
{
    FnAction {
        name: name.into(),
        reducer,
    }
}

impl<F> Action for FnAction<F>
where
    F: Fn(StateNode) -> StateNode + Send + Sync,
{
    fn reduce(&self, old: StateNode) -> StateNode {
        (self.reducer)(old)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl<F> std::fmt::Debug for FnAction<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnAction").field("name", &self.name).finish()
    }
}
