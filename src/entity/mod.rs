//! Entity-side machinery: identity caches, lazy lookup references, and the
//! row-to-entity materializer.

pub mod cache;
pub mod lookup;
pub mod materializer;

pub use cache::EntityCache;
pub use lookup::{LookupCollectionRef, LookupRef};
pub use materializer::Materializer;
