//! Tree operations: equality, merge, lookup and change collection

mod diff;
mod find;
mod merge;

pub use diff::{collect_changes, is_equal, ChangeSet};
pub use find::{find, find_mut};
pub use merge::{deep_copy, merge_into};
