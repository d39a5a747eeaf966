//! # statetree
//!
//! A hierarchical state store with observers and middleware.
//!
//! Application state lives in a single tree of [`StateNode`]s owned by a
//! [`Store`]. Changes happen only through actions, whose reducers produce a
//! new tree that is merged into the live one. Observers subscribe to node ids
//! and are told about every node whose value changed.
//!
//! ## Core Concepts
//!
//! - **State nodes**: an id, an optional opaque payload, ordered children
//! - **Actions**: pure transformations from the old tree to a new one
//! - **Merge**: additive; nodes present only in the live tree survive
//! - **Observers**: single-id, any-of-ids, or conditional on the whole tree
//! - **Middleware**: interceptors between `dispatch` and `reduce`
//!
//! ## Example
//!
//! ```ignore
//! use statetree::{action, Observer, StateNode, Store};
//!
//! let store = Store::new(
//!     StateNode::root("root").with_child(StateNode::new("Counter").with_payload("0")),
//! );
//! store.subscribe(Observer::single("Counter", |node| {
//!     println!("counter is now {:?}", node.payload_str());
//! }));
//! store.dispatch(action::from_fn("Increment", |mut old: StateNode| {
//!     old.child_mut("Counter").unwrap().payload = Some("1".into());
//!     old
//! }));
//! ```

pub mod action;
pub mod config;
pub mod middleware;
pub mod model;
pub mod observer;
pub mod ops;

mod error;
mod store;

pub use action::{Action, ActionRef, Reducer};
pub use config::StoreConfig;
pub use error::{Error, Result};
pub use middleware::{Chain, Middleware, MiddlewareRef};
pub use model::{StateKind, StateNode};
pub use observer::{Matcher, Observer, ObserverKind, Target};
pub use ops::ChangeSet;
pub use store::{Store, StoreBuilder, WeakStore};
