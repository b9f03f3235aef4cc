//! ListQuery - a provider-side query engine for remote tabular list stores
//!
//! This crate sits between a compiled filter/projection/grouping document
//! (produced by an external query compiler) and a remote tabular list store:
//! it resolves cross-list sub-predicates via subqueries, simplifies the
//! filter algebraically, performs a single fetch, and reconstructs typed,
//! cached, lazily-linked entities from the raw rows.

pub mod config;
pub mod context;
pub mod core;
pub mod document;
pub mod entity;
pub mod metadata;
pub mod provider;
pub mod query;
pub mod utils;
