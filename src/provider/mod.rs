//! The remote tabular provider seam.
//!
//! Everything below the engine is reached through [`TabularProvider`]: one
//! blocking call per fetch, ordered rows keyed by backend field name with
//! raw text cell values. Wire protocol and authentication live behind the
//! implementation; the engine never retries a failed call.

pub mod memory;

use crate::core::EngineResult;
use crate::document::WireQuery;
use std::collections::HashMap;

pub use memory::MemoryProvider;

/// One result row: backend field name to raw text value. A field absent from
/// the map was not part of the row (sparse views are legal).
pub type Row = HashMap<String, String>;

/// Blocking handle to the remote list store.
pub trait TabularProvider {
    /// Run one query and return the matching rows in store order.
    fn execute_query(&self, query: &WireQuery) -> EngineResult<Vec<Row>>;

    /// Current version token of a list.
    fn get_list_version(&self, list: &str) -> EngineResult<String>;
}
