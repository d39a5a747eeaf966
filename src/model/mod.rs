//! Core data model types for statetree

mod kind;
mod node;

pub use kind::StateKind;
pub use node::StateNode;
