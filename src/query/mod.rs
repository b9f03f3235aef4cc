//! The query pipeline: lookup patching, predicate pruning, execution, and
//! group-adjacent materialization.

pub mod executor;
pub mod grouping;
pub mod patcher;
pub mod pruner;

pub use executor::{EntityStream, GroupStream, KeyStream, QueryExecutor};
pub use grouping::{Group, GroupAdjacent};
pub use patcher::LookupPatcher;
pub use pruner::{prune, Verdict};
