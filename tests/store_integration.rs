//! Store Integration Tests
//!
//! End-to-end scenarios against the public API: reducers, merging,
//! observers, middleware, and middleware that finishes its work later on a
//! tokio task.
//!
//! Run with:
//! ```bash
//! cargo test --test store_integration
//! ```

use parking_lot::Mutex;
use statetree::middleware::{self, Chain, Filter, Logger, Middleware};
use statetree::{
    action, Action, ActionRef, Observer, ObserverKind, StateKind, StateNode, Store, StoreConfig,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

struct Counter;

impl StateKind for Counter {
    const ID: &'static str = "Counter";
    type Model = i64;
}

struct Increment;

impl Action for Increment {
    fn reduce(&self, mut old: StateNode) -> StateNode {
        if let Some(node) = old.find_mut(Counter::ID) {
            let value = Counter::decode(node).unwrap_or(0);
            node.set_model(&(value + 1)).unwrap();
        }
        old
    }

    fn name(&self) -> &str {
        "Increment"
    }
}

fn seed() -> StateNode {
    StateNode::root("root")
        .with_child(Counter::node(&0).unwrap())
        .with_child(StateNode::new("Other").with_payload("a"))
}

fn todos() -> StateNode {
    StateNode::root("root")
        .with_child(
            StateNode::new("Todos")
                .with_child(StateNode::new("t1").with_payload("write docs"))
                .with_child(StateNode::new("t2").with_payload("ship")),
        )
        .with_child(StateNode::new("Filter").with_payload("all"))
}

/// Subscribe an observer that records every node it receives
fn record(
    store: &Store,
    observer: impl FnOnce(Box<dyn Fn(StateNode) + Send + Sync>) -> Arc<Observer>,
) -> Arc<Mutex<Vec<StateNode>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    store.subscribe(observer(Box::new(move |node| sink.lock().push(node))));
    seen
}

// ============================================================================
// Equality and Copies
// ============================================================================

#[test]
fn test_distinct_identical_trees_are_equal() {
    let store = Store::new(todos());
    assert!(store.is_deep_equal(&todos()));
    assert_eq!(store.state(), todos());
    assert_ne!(store.state(), seed());
}

#[test]
fn test_mutating_a_read_never_affects_the_store() {
    let store = Store::new(todos());

    let mut state = store.state();
    state.child_mut("Todos").unwrap().children.clear();
    state.child_mut("Filter").unwrap().payload = Some("done".into());

    let mut found = store.lookup("t1").unwrap();
    found.id = "t9".into();

    assert!(store.is_deep_equal(&todos()));
    assert!(store.lookup("t1").is_some());
}

// ============================================================================
// Transitions
// ============================================================================

#[test]
fn test_identity_reducer_changes_nothing() {
    let store = Store::new(todos());
    let calls = Arc::new(AtomicUsize::new(0));
    for id in ["root", "Todos", "t1", "t2", "Filter"] {
        let calls = calls.clone();
        store.subscribe(Observer::single(id, move |_| {
            calls.fetch_add(1, Ordering::SeqCst);
        }));
    }

    store.dispatch(action::from_fn("Identity", |old: StateNode| old));
    store.reduce(&action::from_fn("Rebuild", |_old: StateNode| todos()));

    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(store.is_deep_equal(&todos()));
}

#[test]
fn test_merge_is_additive() {
    let store = Store::new(todos());

    store.reduce(&action::from_fn("AddTodo", |_old: StateNode| {
        StateNode::new("Todos").with_child(StateNode::new("t3").with_payload("celebrate"))
    }));

    let state = store.state();
    let todo_ids: Vec<&str> = state
        .child("Todos")
        .unwrap()
        .children
        .iter()
        .map(|c| c.id.as_str())
        .collect();
    assert_eq!(todo_ids, vec!["t1", "t2", "t3"]);
    assert_eq!(state.child("Filter").unwrap().payload_str(), Some("all"));
    assert_eq!(
        state.find("t1").unwrap().payload_str(),
        Some("write docs")
    );
}

#[test]
fn test_whole_tree_result_merges_at_root() {
    let store = Store::new(todos());
    let roots = record(&store, |h| Observer::single("root", h));
    let filters = record(&store, |h| Observer::single("Filter", h));
    let todo_items = record(&store, |h| Observer::any_of(["t1", "t2"], h));

    store.reduce(&action::from_fn("ShowDone", |mut old: StateNode| {
        old.child_mut("Filter").unwrap().payload = Some("done".into());
        old
    }));

    assert_eq!(roots.lock().len(), 1);
    assert_eq!(filters.lock()[0].payload_str(), Some("done"));
    assert!(todo_items.lock().is_empty());
}

#[test]
fn test_changed_nodes_are_reported_depth_first() {
    let store = Store::new(todos());
    let order = Arc::new(Mutex::new(Vec::new()));
    let sink = order.clone();
    store.subscribe(Observer::any_of(
        ["root", "Todos", "t1", "t2", "Filter"],
        move |node: StateNode| sink.lock().push(node.id),
    ));

    store.reduce(&action::from_fn("Reword", |mut old: StateNode| {
        old.find_mut("t2").unwrap().payload = Some("ship it".into());
        old
    }));

    assert_eq!(*order.lock(), vec!["root", "Todos", "t2"]);
}

// ============================================================================
// Observers
// ============================================================================

#[test]
fn test_counter_scenario() {
    let store = Store::new(seed());
    let counters = record(&store, |h| Observer::of::<Counter, _>(h));
    let others = record(&store, |h| Observer::single("Other", h));

    store.dispatch(Increment);

    let counters = counters.lock();
    assert_eq!(counters.len(), 1);
    assert_eq!(counters[0].payload_str(), Some("1"));
    assert!(others.lock().is_empty());
    assert_eq!(store.lookup_kind::<Counter>(), Some(1));
}

#[test]
fn test_conditional_observer_gating() {
    let store = Store::new(seed());
    let never = record(&store, |h| Observer::conditional("Counter", |_: &StateNode| false, h));
    let past_one = record(&store, |h| {
        Observer::conditional(
            "Counter",
            |tree: &StateNode| {
                tree.find(Counter::ID)
                    .and_then(Counter::decode)
                    .map_or(false, |value| value > 1)
            },
            h,
        )
    });

    store.dispatch(Increment);
    store.dispatch(Increment);
    store.dispatch(Increment);

    assert!(never.lock().is_empty());
    let past_one = past_one.lock();
    let values: Vec<_> = past_one.iter().filter_map(Counter::decode).collect();
    assert_eq!(values, vec![2, 3]);
}

#[test]
fn test_any_of_observer_sees_each_changed_target() {
    let store = Store::new(seed());
    let seen = record(&store, |h| Observer::any_of(["Counter", "Other"], h));

    store.reduce(&action::from_fn("Both", |mut old: StateNode| {
        old.child_mut("Counter").unwrap().payload = Some("5".into());
        old.child_mut("Other").unwrap().payload = Some("b".into());
        old
    }));

    let ids: Vec<String> = seen.lock().iter().map(|n| n.id.clone()).collect();
    assert_eq!(ids, vec!["Counter", "Other"]);
}

#[test]
fn test_observer_kinds_and_unsubscribe() {
    let store = Store::new(seed());
    let calls = Arc::new(AtomicUsize::new(0));
    let counting = |calls: &Arc<AtomicUsize>| {
        let calls = calls.clone();
        move |_: StateNode| {
            calls.fetch_add(1, Ordering::SeqCst);
        }
    };

    let single = Observer::single("Counter", counting(&calls));
    let multi = Observer::any_of(["Counter"], counting(&calls));
    let conditional = Observer::conditional("Counter", |_: &StateNode| true, counting(&calls));
    assert_eq!(single.kind(), ObserverKind::Single);
    assert_eq!(multi.kind(), ObserverKind::Multi);
    assert_eq!(conditional.kind(), ObserverKind::Conditional);

    for observer in [&single, &multi, &conditional] {
        assert!(store.subscribe(observer.clone()));
    }
    assert!(!store.subscribe(single.clone()));
    assert_eq!(store.observer_count(), 3);

    store.dispatch(Increment);
    assert_eq!(calls.load(Ordering::SeqCst), 3);

    store.unsubscribe(&multi);
    store.dispatch(Increment);
    assert_eq!(calls.load(Ordering::SeqCst), 5);
}

#[test]
fn test_lookup_miss_is_none() {
    let store = Store::new(seed());
    assert!(store.lookup("Missing").is_none());
    assert!(store.lookup_kind::<Counter>().is_some());
}

// ============================================================================
// Middleware
// ============================================================================

#[test]
fn test_forwarding_then_reducing_middleware() {
    let forward = middleware::from_fn("forward", |state, action, chain: Chain<'_>| {
        chain.next(state, action)
    });
    let apply = middleware::from_fn("apply", |_state, action: ActionRef, chain: Chain<'_>| {
        chain.store().reduce(action.as_ref());
    });
    let store = Store::builder(seed())
        .middleware(forward)
        .middleware(apply)
        .build();
    let seen = record(&store, |h| Observer::single("Counter", h));

    store.dispatch(Increment);
    assert_eq!(seen.lock().len(), 1);
    store.dispatch(Increment);
    assert_eq!(seen.lock().len(), 2);
    assert_eq!(store.middleware_names(), vec!["forward", "apply"]);
}

#[test]
fn test_non_forwarding_middleware_blocks_transition() {
    let store = Store::builder(seed())
        .middleware(Filter::new("closed", |_, _| false))
        .middleware(Logger::default())
        .build();
    let seen = record(&store, |h| Observer::single("Counter", h));

    store.dispatch(Increment);

    assert!(seen.lock().is_empty());
    assert_eq!(store.lookup_kind::<Counter>(), Some(0));
}

#[test]
fn test_config_applies_log_mode() {
    let config = StoreConfig::from_json(r#"{"log_mode": true, "root_id": "app"}"#).unwrap();
    let store = Store::builder(config.initial_root().with_child(Counter::node(&0).unwrap()))
        .config(&config)
        .middleware(Logger::new("audit"))
        .build();

    store.dispatch(Increment);

    assert!(store.log_mode());
    assert_eq!(store.state_name(), "app");
    assert_eq!(store.lookup_kind::<Counter>(), Some(1));
}

// ============================================================================
// Concurrency and Background Work
// ============================================================================

/// Records the request, then finishes it from a tokio task
struct Deferred {
    delay: Duration,
}

impl Middleware for Deferred {
    fn apply(&self, _state: StateNode, request: ActionRef, chain: Chain<'_>) {
        let store = chain.store();
        store.reduce(&action::from_fn("Pending", |_old: StateNode| {
            StateNode::new("Status").with_payload("pending")
        }));

        let weak = store.downgrade();
        let delay = self.delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(store) = weak.upgrade() {
                store.reduce(request.as_ref());
                store.reduce(&action::from_fn("Done", |_old: StateNode| {
                    StateNode::new("Status").with_payload("done")
                }));
            }
        });
    }
}

#[tokio::test]
async fn test_spawned_reduce_notifies_observers() {
    let store = Store::builder(seed())
        .middleware(Deferred {
            delay: Duration::from_millis(10),
        })
        .build();

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    store.subscribe(Observer::single("Status", move |node: StateNode| {
        let _ = tx.send(node.payload_str().map(str::to_string));
    }));

    store.dispatch(Increment);
    assert_eq!(store.lookup_kind::<Counter>(), Some(0));
    assert_eq!(rx.recv().await.unwrap().as_deref(), Some("pending"));

    let done = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(done.as_deref(), Some("done"));
    assert_eq!(store.lookup_kind::<Counter>(), Some(1));
}

#[tokio::test]
async fn test_weak_store_fails_to_upgrade_after_drop() {
    let store = Store::new(seed());
    let weak = store.downgrade();
    let (tx, rx) = tokio::sync::oneshot::channel();

    let task = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        let _ = tx.send(weak.upgrade().is_some());
    });

    drop(store);
    task.await.unwrap();
    assert!(!rx.await.unwrap());
}

#[test]
fn test_concurrent_dispatch_loses_no_updates() {
    let store = Store::new(seed());
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = calls.clone();
    store.subscribe(Observer::of::<Counter, _>(move |_| {
        seen.fetch_add(1, Ordering::SeqCst);
    }));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let store = store.clone();
            std::thread::spawn(move || {
                for _ in 0..25 {
                    store.dispatch(Increment);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(store.lookup_kind::<Counter>(), Some(200));
    assert_eq!(calls.load(Ordering::SeqCst), 200);
}
