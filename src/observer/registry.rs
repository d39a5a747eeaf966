//! Observer handles and the registry that holds them

use super::{Matcher, ObserverKind, Predicate, Target};
use crate::model::{StateKind, StateNode};
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

/// Callback invoked with a copy of the changed node
pub type ChangeHandler = Arc<dyn Fn(StateNode) + Send + Sync>;

/// A registered interest in part of the state tree
///
/// Observers are compared by identity: keep the `Arc` returned by the
/// constructors to unsubscribe later.
pub struct Observer {
    matcher: Matcher,
    handler: ChangeHandler,
}

impl Observer {
    /// Observe every change to nodes with the target's id
    pub fn single<F>(target: impl Into<Target>, handler: F) -> Arc<Self>
    where
        F: Fn(StateNode) + Send + Sync + 'static,
    {
        Self::with_matcher(Matcher::Single(target.into()), handler)
    }

    /// Observe a [`StateKind`]
    pub fn of<K: StateKind, F>(handler: F) -> Arc<Self>
    where
        F: Fn(StateNode) + Send + Sync + 'static,
    {
        Self::single(Target::of::<K>(), handler)
    }

    /// Observe changes to any of several ids
    pub fn any_of<I, T, F>(targets: I, handler: F) -> Arc<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<Target>,
        F: Fn(StateNode) + Send + Sync + 'static,
    {
        let targets = targets.into_iter().map(Into::into).collect();
        Self::with_matcher(Matcher::AnyOf(targets), handler)
    }

    /// Observe changes to an id, gated by a predicate over the whole tree
    pub fn conditional<P, F>(target: impl Into<Target>, predicate: P, handler: F) -> Arc<Self>
    where
        P: Fn(&StateNode) -> bool + Send + Sync + 'static,
        F: Fn(StateNode) + Send + Sync + 'static,
    {
        let predicate: Predicate = Arc::new(predicate);
        Self::with_matcher(
            Matcher::Conditional {
                target: target.into(),
                predicate,
            },
            handler,
        )
    }

    pub fn with_matcher<F>(matcher: Matcher, handler: F) -> Arc<Self>
    where
        F: Fn(StateNode) + Send + Sync + 'static,
    {
        Arc::new(Observer {
            matcher,
            handler: Arc::new(handler),
        })
    }

    pub fn matcher(&self) -> &Matcher {
        &self.matcher
    }

    pub fn kind(&self) -> ObserverKind {
        self.matcher.kind()
    }

    /// Deliver a changed node
    pub fn notify(&self, node: StateNode) {
        (self.handler)(node)
    }
}

impl fmt::Debug for Observer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observer")
            .field("matcher", &self.matcher)
            .finish_non_exhaustive()
    }
}

/// The set of registered observers
///
/// Registration order carries no meaning; every observer is evaluated
/// against every changed node.
#[derive(Default)]
pub struct ObserverRegistry {
    observers: RwLock<Vec<Arc<Observer>>>,
}

impl ObserverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an observer; returns false if it was already registered
    pub fn add(&self, observer: Arc<Observer>) -> bool {
        let mut observers = self.observers.write();
        if observers.iter().any(|o| Arc::ptr_eq(o, &observer)) {
            return false;
        }
        observers.push(observer);
        true
    }

    /// Remove an observer; returns false if it was not registered
    pub fn remove(&self, observer: &Arc<Observer>) -> bool {
        let mut observers = self.observers.write();
        let before = observers.len();
        observers.retain(|o| !Arc::ptr_eq(o, observer));
        observers.len() != before
    }

    pub fn contains(&self, observer: &Arc<Observer>) -> bool {
        self.observers.read().iter().any(|o| Arc::ptr_eq(o, observer))
    }

    pub fn len(&self) -> usize {
        self.observers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.read().is_empty()
    }

    /// Number of observers of one kind
    pub fn count(&self, kind: ObserverKind) -> usize {
        self.observers
            .read()
            .iter()
            .filter(|o| o.kind() == kind)
            .count()
    }

    /// Observers that want `changed`, cloned out so the lock is not held
    /// while they run
    pub fn matching(&self, changed: &StateNode, tree: &StateNode) -> Vec<Arc<Observer>> {
        let observers: Vec<Arc<Observer>> = self.observers.read().clone();
        observers
            .into_iter()
            .filter(|o| o.matcher().matches(changed, tree))
            .collect()
    }
}

impl fmt::Debug for ObserverRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverRegistry")
            .field("len", &self.len())
            .finish()
    }
}
