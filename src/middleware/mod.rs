//! Middleware: interceptors between `dispatch` and `reduce`
//!
//! A middleware receives the current state, the action and a [`Chain`]
//! cursor. For every action it does not fully consume it calls
//! [`Chain::next`], which hands the action to the following middleware or,
//! at the end of the chain, reduces it on the store. A middleware may also:
//! - reduce or dispatch a different, synthesized action instead
//! - spawn a task that dispatches later, returning without calling `next`
//! - drop the action altogether
//!
//! Only [`Store::dispatch`](crate::Store::dispatch) enters the chain; direct
//! `reduce` calls bypass it.

mod filter;
mod func;
mod logger;

pub use filter::Filter;
pub use func::{from_fn, FnMiddleware};
pub use logger::Logger;

use crate::action::ActionRef;
use crate::model::StateNode;
use crate::store::Store;
use std::sync::Arc;

/// An interceptor in the dispatch chain
pub trait Middleware: Send + Sync {
    fn apply(&self, state: StateNode, action: ActionRef, chain: Chain<'_>);

    /// Name used in logs
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Shared handle to a middleware
pub type MiddlewareRef = Arc<dyn Middleware>;

/// Position of a middleware within its chain
///
/// Bundles the chain, the index of the middleware currently running and the
/// store the chain belongs to.
#[derive(Clone, Copy)]
pub struct Chain<'a> {
    middlewares: &'a [MiddlewareRef],
    index: usize,
    store: &'a Store,
}

impl<'a> Chain<'a> {
    pub(crate) fn new(middlewares: &'a [MiddlewareRef], store: &'a Store) -> Self {
        Chain {
            middlewares,
            index: 0,
            store,
        }
    }

    /// Index of the middleware currently running
    pub fn index(&self) -> usize {
        self.index
    }

    /// Number of middlewares in the chain
    pub fn len(&self) -> usize {
        self.middlewares.len()
    }

    pub fn is_empty(&self) -> bool {
        self.middlewares.is_empty()
    }

    /// The store this chain dispatches into
    pub fn store(&self) -> &'a Store {
        self.store
    }

    /// Whether the running middleware is the last one
    pub fn is_last(&self) -> bool {
        self.index + 1 >= self.middlewares.len()
    }

    /// Start the chain at its first middleware
    pub(crate) fn run(self, state: StateNode, action: ActionRef) {
        match self.middlewares.first() {
            Some(first) => {
                self.trace_hop(first.as_ref(), action.as_ref());
                first.apply(state, action, self);
            }
            None => {
                self.store.reduce(action.as_ref());
            }
        }
    }

    /// Forward the action to the next middleware, or reduce it at chain end
    pub fn next(self, state: StateNode, action: ActionRef) {
        let next_index = self.index + 1;
        match self.middlewares.get(next_index) {
            Some(next) => {
                let chain = Chain {
                    index: next_index,
                    ..self
                };
                chain.trace_hop(next.as_ref(), action.as_ref());
                next.apply(state, action, chain);
            }
            None => {
                self.store.reduce(action.as_ref());
                if self.store.log_mode() {
                    tracing::info!(action = action.name(), "store reduced action at chain end");
                }
            }
        }
    }

    fn trace_hop(&self, middleware: &dyn Middleware, action: &dyn crate::Action) {
        if self.store.log_mode() {
            tracing::info!(
                middleware = middleware.name(),
                index = self.index,
                state = %self.store.state_name(),
                action = action.name(),
                "middleware received action"
            );
        } else {
            tracing::trace!(
                middleware = middleware.name(),
                index = self.index,
                action = action.name(),
                "middleware received action"
            );
        }
    }
}

impl std::fmt::Debug for Chain<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chain")
            .field("index", &self.index)
            .field("len", &self.middlewares.len())
            .finish()
    }
}
