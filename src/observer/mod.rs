//! Observers: who gets told about which changes
//!
//! Three kinds of observer exist, all expressed as a [`Matcher`]:
//! - single-state: one target id
//! - multi-state: any of several target ids
//! - conditional: one target id plus a predicate over the whole tree
//!
//! Every observer receives its own copy of the changed node.

mod matcher;
mod registry;

pub use matcher::{Matcher, ObserverKind, Predicate, Target};
pub use registry::{ChangeHandler, Observer, ObserverRegistry};
