//! Logging middleware

use super::{Chain, Middleware};
use crate::action::ActionRef;
use crate::model::StateNode;

/// Logs each action on its way in and the resulting state on its way out,
/// then carries on down the chain
#[derive(Clone, Debug)]
pub struct Logger {
    label: String,
}

impl Logger {
    pub fn new(label: impl Into<String>) -> Self {
        Logger {
            label: label.into(),
        }
    }
}

impl Default for Logger {
    fn default() -> Self {
        Logger::new("statetree")
    }
}

impl Middleware for Logger {
    fn apply(&self, state: StateNode, action: ActionRef, chain: Chain<'_>) {
        let name = action.name().to_string();
        tracing::info!(
            target: "statetree::middleware",
            label = %self.label,
            state = %state.id,
            action = %name,
            "action in"
        );

        let store = chain.store();
        chain.next(state, action);

        tracing::info!(
            target: "statetree::middleware",
            label = %self.label,
            state = %store.state_name(),
            action = %name,
            "action out"
        );
    }

    fn name(&self) -> &str {
        &self.label
    }
}
