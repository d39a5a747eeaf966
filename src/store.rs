//! The store: single owner of the state tree
//!
//! This module provides the main entry point for interacting with statetree.

use crate::action::{Action, ActionRef};
use crate::config::StoreConfig;
use crate::middleware::{Chain, Middleware, MiddlewareRef};
use crate::model::{StateKind, StateNode};
use crate::observer::{Observer, ObserverRegistry};
use crate::ops::{self, ChangeSet};
use parking_lot::ReentrantMutex;
use std::cell::RefCell;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

/// The single source of truth
///
/// Provides:
/// - Snapshot reads (`state`, `lookup`)
/// - Transitions (`reduce`, and `dispatch` through the middleware chain)
/// - Subscriptions for observers
///
/// `Store` is a handle: clones share the same tree, so a middleware can move
/// a clone into a background task and dispatch from there later. Every tree
/// handed out is a copy; nothing outside the store can reach the live tree.
#[derive(Clone)]
pub struct Store {
    inner: Arc<Inner>,
}

struct Inner {
    /// The live tree. All writes are serialized through this lock. It is
    /// reentrant so a reducer running under it can still read the store.
    tree: ReentrantMutex<RefCell<StateNode>>,
    /// Set while a reducer runs; guards against writes from inside one
    reducing: AtomicBool,
    observers: ObserverRegistry,
    middleware: Vec<MiddlewareRef>,
    log_mode: AtomicBool,
}

/// Builder for a [`Store`]; the middleware chain is fixed once built
pub struct StoreBuilder {
    root: StateNode,
    middleware: Vec<MiddlewareRef>,
    log_mode: bool,
}

impl StoreBuilder {
    /// Append a middleware to the chain
    pub fn middleware(mut self, middleware: impl Middleware + 'static) -> Self {
        self.middleware.push(Arc::new(middleware));
        self
    }

    /// Append an already shared middleware to the chain
    pub fn middleware_ref(mut self, middleware: MiddlewareRef) -> Self {
        self.middleware.push(middleware);
        self
    }

    pub fn log_mode(mut self, on: bool) -> Self {
        self.log_mode = on;
        self
    }

    /// Apply settings from a config
    pub fn config(mut self, config: &StoreConfig) -> Self {
        self.log_mode = config.log_mode;
        self
    }

    pub fn build(self) -> Store {
        let mut root = self.root;
        root.is_root = true;
        tracing::debug!(
            root = %root.id,
            nodes = root.node_count(),
            middleware = self.middleware.len(),
            "store created"
        );
        Store {
            inner: Arc::new(Inner {
                tree: ReentrantMutex::new(RefCell::new(root)),
                reducing: AtomicBool::new(false),
                observers: ObserverRegistry::new(),
                middleware: self.middleware,
                log_mode: AtomicBool::new(self.log_mode),
            }),
        }
    }
}

impl Store {
    /// Create a store without middleware
    pub fn new(initial: StateNode) -> Self {
        Self::builder(initial).build()
    }

    /// Start building a store around an initial tree
    pub fn builder(initial: StateNode) -> StoreBuilder {
        StoreBuilder {
            root: initial,
            middleware: Vec::new(),
            log_mode: false,
        }
    }

    /// Create a store with an empty root as described by `config`
    pub fn from_config(config: &StoreConfig) -> Self {
        Self::builder(config.initial_root()).config(config).build()
    }

    // === Reads ===

    /// A copy of the whole current tree
    pub fn state(&self) -> StateNode {
        ops::deep_copy(&self.inner.tree.lock().borrow())
    }

    /// Id of the root node
    pub fn state_name(&self) -> String {
        self.inner.tree.lock().borrow().id.clone()
    }

    /// A copy of the first node with `id`, searching depth-first
    pub fn lookup(&self, id: &str) -> Option<StateNode> {
        let guard = self.inner.tree.lock();
        let tree = guard.borrow();
        ops::find(&tree, id).map(ops::deep_copy)
    }

    /// Look up a node of kind `K` and decode its payload
    pub fn lookup_kind<K: StateKind>(&self) -> Option<K::Model> {
        self.lookup(K::ID).and_then(|node| K::decode(&node))
    }

    /// Check whether the current tree is structurally equal to `other`
    pub fn is_deep_equal(&self, other: &StateNode) -> bool {
        ops::is_equal(&self.inner.tree.lock().borrow(), other)
    }

    // === Transitions ===

    /// Apply an action directly, bypassing middleware
    ///
    /// The reducer runs on a copy of the current tree. If its result is equal
    /// to what is already there, nothing is written and nobody is notified.
    /// Otherwise the result is merged in and observers of the changed nodes
    /// are called once the lock has been released. Returns a copy of the
    /// tree after the transition.
    ///
    /// # Panics
    ///
    /// When called from inside a reducer, directly or through `dispatch`.
    /// Reducers may read the store but never write to it.
    pub fn reduce(&self, action: &dyn Action) -> StateNode {
        let (tree, changes) = {
            let guard = self.inner.tree.lock();
            let snapshot = ops::deep_copy(&guard.borrow());
            let result = {
                let Some(_reducing) = Reducing::enter(&self.inner.reducing) else {
                    panic!(
                        "reducer called back into Store::reduce with action `{}`",
                        action.name()
                    );
                };
                action.reduce(snapshot)
            };

            let mut live = guard.borrow_mut();
            match merge_result(&mut live, result) {
                Some(changes) => (ops::deep_copy(&live), changes),
                None => {
                    tracing::trace!(action = action.name(), "no-op transition");
                    return ops::deep_copy(&live);
                }
            }
        };

        if self.log_mode() {
            tracing::info!(
                action = action.name(),
                changed = ?changes.ids(),
                "store reduced action"
            );
        } else {
            tracing::debug!(
                action = action.name(),
                changed = changes.len(),
                "store reduced action"
            );
        }

        self.notify(&tree, &changes);
        tree
    }

    /// Send an action through the middleware chain
    ///
    /// With no middleware configured this is the same as [`Store::reduce`].
    pub fn dispatch(&self, action: impl Action + 'static) {
        self.dispatch_arc(Arc::new(action));
    }

    /// Send a shared action through the middleware chain
    pub fn dispatch_arc(&self, action: ActionRef) {
        if self.inner.middleware.is_empty() {
            self.reduce(action.as_ref());
            return;
        }
        Chain::new(&self.inner.middleware, self).run(self.state(), action);
    }

    fn notify(&self, tree: &StateNode, changes: &ChangeSet) {
        for changed in changes.iter() {
            for observer in self.inner.observers.matching(changed, tree) {
                observer.notify(ops::deep_copy(changed));
            }
        }
    }

    // === Subscriptions ===

    /// Register an observer; returns false if it is already registered
    pub fn subscribe(&self, observer: Arc<Observer>) -> bool {
        self.inner.observers.add(observer)
    }

    /// Remove an observer; returns false if it was not registered
    pub fn unsubscribe(&self, observer: &Arc<Observer>) -> bool {
        self.inner.observers.remove(observer)
    }

    pub fn observer_count(&self) -> usize {
        self.inner.observers.len()
    }

    // === Settings ===

    pub fn log_mode(&self) -> bool {
        self.inner.log_mode.load(Ordering::Relaxed)
    }

    pub fn set_log_mode(&self, on: bool) {
        self.inner.log_mode.store(on, Ordering::Relaxed);
    }

    /// Names of the configured middleware, in chain order
    pub fn middleware_names(&self) -> Vec<String> {
        self.inner
            .middleware
            .iter()
            .map(|m| m.name().to_string())
            .collect()
    }

    /// A handle that does not keep the store alive
    pub fn downgrade(&self) -> WeakStore {
        WeakStore {
            inner: Arc::downgrade(&self.inner),
        }
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("root", &self.state_name())
            .field("observers", &self.observer_count())
            .field("middleware", &self.middleware_names())
            .finish()
    }
}

/// Non-owning store handle for background work
///
/// A task holding a `WeakStore` finds nothing to dispatch into once every
/// [`Store`] handle has been dropped.
#[derive(Clone)]
pub struct WeakStore {
    inner: Weak<Inner>,
}

impl WeakStore {
    pub fn upgrade(&self) -> Option<Store> {
        self.inner.upgrade().map(|inner| Store { inner })
    }
}

impl fmt::Debug for WeakStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakStore")
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}

/// Marks a reducer as running until dropped
struct Reducing<'a>(&'a AtomicBool);

impl<'a> Reducing<'a> {
    /// `None` if a reducer is already running under this lock
    fn enter(flag: &'a AtomicBool) -> Option<Self> {
        if flag.swap(true, Ordering::Relaxed) {
            return None;
        }
        Some(Reducing(flag))
    }
}

impl Drop for Reducing<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Relaxed);
    }
}

/// Merge a reducer result into the live tree
///
/// A result flagged as root, or carrying the root's id, is the whole tree
/// and merges at the root, taking over its id. Any other result is a
/// subtree: it merges at the first node carrying its id, or becomes a new
/// child of the root when no node does. Returns `None` when nothing changed.
fn merge_result(live: &mut StateNode, mut result: StateNode) -> Option<ChangeSet> {
    if result.is_empty_state() {
        tracing::debug!("reducer produced no usable state, transition dropped");
        return None;
    }

    if result.is_root || result.id == live.id {
        result.is_root = true;
        return merge_at(&result, live);
    }

    result.is_root = false;
    if let Some(target) = ops::find_mut(live, &result.id) {
        return merge_at(&result, target);
    }

    let wrapper = StateNode {
        id: live.id.clone(),
        payload: live.payload.clone(),
        children: vec![result],
        is_root: true,
    };
    merge_at(&wrapper, live)
}

fn merge_at(incoming: &StateNode, target: &mut StateNode) -> Option<ChangeSet> {
    if ops::is_equal(incoming, target) {
        return None;
    }
    let before = ops::deep_copy(target);
    ops::merge_into(incoming, target);
    let changes = ops::collect_changes(incoming, Some(&before), target);
    if changes.is_empty() {
        None
    } else {
        Some(changes)
    }
}
