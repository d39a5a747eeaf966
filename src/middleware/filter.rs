//! Middleware that consumes unwanted actions

use super::{Chain, Middleware};
use crate::action::{Action, ActionRef};
use crate::model::StateNode;
use std::sync::Arc;

type Accept = Arc<dyn Fn(&dyn Action, &StateNode) -> bool + Send + Sync>;

/// Forwards actions the predicate accepts and swallows the rest
///
/// A swallowed action never reaches the store and produces no transition.
pub struct Filter {
    name: String,
    accept: Accept,
}

impl Filter {
    pub fn new<F>(name: impl Into<String>, accept: F) -> Self
    where
        F: Fn(&dyn Action, &StateNode) -> bool + Send + Sync + 'static,
    {
        Filter {
            name: name.into(),
            accept: Arc::new(accept),
        }
    }

    /// Swallow every action with the given name
    pub fn reject_named(action_name: impl Into<String>) -> Self {
        let rejected = action_name.into();
        let name = format!("reject:{}", rejected);
        Filter::new(name, move |action, _| action.name() != rejected)
    }
}

impl Middleware for Filter {
    fn apply(&self, state: StateNode, action: ActionRef, chain: Chain<'_>) {
        if (self.accept)(action.as_ref(), &state) {
            chain.next(state, action);
        } else {
            tracing::debug!(
                filter = %self.name,
                action = action.name(),
                "action consumed by filter"
            );
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Debug for Filter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Filter").field("name", &self.name).finish()
    }
}
