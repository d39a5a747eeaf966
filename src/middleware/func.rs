//! Closure-based middleware

use super::{Chain, Middleware};
use crate::action::ActionRef;
use crate::model::StateNode;

/// A middleware built from a closure, see [`from_fn`]
pub struct FnMiddleware<F> {
    name: String,
    apply: F,
}

/// Create a named middleware from a closure
///
/// ```ignore
/// let audit = middleware::from_fn("audit", |state, action, chain| {
///     tracing::info!(action = action.name(), "dispatching");
///     chain.next(state, action);
/// });
/// ```
pub fn from_fn<F>(name: impl Into<String>, apply: F) -> FnMiddleware<F>
where
    F: Fn(StateNode, ActionRef, Chain<'_>) + Send + Sync,
{
    FnMiddleware {
        name: name.into(),
        apply,
    }
}

impl<F> Middleware for FnMiddleware<F>
where
    F: Fn(StateNode, ActionRef, Chain<'_>) + Send + Sync,
{
    fn apply(&self, state: StateNode, action: ActionRef, chain: Chain<'_>) {
        (self.apply)(state, action, chain)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl<F> std::fmt::Debug for FnMiddleware<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnMiddleware")
            .field("name", &self.name)
            .finish()
    }
}
