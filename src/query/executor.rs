//! Query execution.
//!
//! The executor runs the strictly ordered pipeline: version gate, projection
//! synthesis, patch, prune, diagnostic rendering, one remote fetch, then
//! materialization. All three entry points return lazy fallible iterators:
//! nothing touches the provider until the first pull, which performs the
//! complete fetch; later pulls materialize in memory. The streams are finite
//! and non-restartable; re-running a query means executing the pipeline
//! again from a fresh document clone.

use crate::context::QueryContext;
use crate::core::{EngineError, EngineResult, ScalarValue};
use crate::document::{QueryDocument, WireQuery};
use crate::entity::Materializer;
use crate::metadata::Entity;
use crate::provider::Row;
use crate::query::grouping::{Group, GroupAdjacent};
use crate::query::patcher::LookupPatcher;
use crate::query::pruner::{prune, Verdict};
use std::cell::RefCell;
use std::rc::Rc;

/// Executor facade over one context.
pub struct QueryExecutor<'a> {
    ctx: &'a QueryContext,
}

impl<'a> QueryExecutor<'a> {
    pub fn new(ctx: &'a QueryContext) -> Self {
        Self { ctx }
    }

    /// Flat path: one entity per row. The document must carry no grouping.
    pub fn execute<T: Entity>(&self, doc: QueryDocument<T>) -> EntityStream<'a, T> {
        EntityStream {
            ctx: self.ctx,
            doc: Some(doc),
            rows: None,
            done: false,
        }
    }

    /// Full-group path: the document must carry a grouping without the
    /// key-only projection.
    pub fn execute_grouped<T: Entity>(&self, doc: QueryDocument<T>) -> GroupStream<'a, T> {
        GroupStream {
            ctx: self.ctx,
            doc: Some(doc),
            inner: None,
            done: false,
        }
    }

    /// Key-only path: the document must carry a grouping with the key-only
    /// projection; entity construction is skipped entirely, but every row is
    /// still read (the store offers no server-side distinct).
    pub fn execute_group_keys<T: Entity>(&self, doc: QueryDocument<T>) -> KeyStream<'a, T> {
        KeyStream {
            ctx: self.ctx,
            doc: Some(doc),
            inner: None,
            done: false,
        }
    }
}

/// Steps (a) through the single fetch, shared by all three paths. Returns
/// the fetched rows, or no rows at all when the filter pruned to constant
/// false (in which case the provider is never called).
fn run_pipeline<T: Entity>(
    ctx: &QueryContext,
    mut doc: QueryDocument<T>,
) -> EngineResult<Vec<Row>> {
    let meta = T::meta();

    // (a) Version-consistency gate, before any row fetch. Context setting
    // overrides the list-level override, which overrides the type default.
    let check = ctx
        .version_check_override()
        .or(meta.check_version)
        .unwrap_or_else(T::check_version_default);
    if check {
        let live = ctx.list_version(meta.list)?;
        if live != meta.version {
            return Err(EngineError::VersionMismatch {
                list: meta.list.to_string(),
                expected: meta.version.to_string(),
                actual: live,
            });
        }
    }

    // (b) Synthesize the projection when the compiler gave none.
    let view_fields = match doc.projection.take() {
        Some(fields) => fields,
        None => meta.mapped_projection(),
    };

    // (c) Patch, then prune.
    let mut filter = None;
    if let Some(tree) = doc.filter.take() {
        let patched = LookupPatcher::new(ctx).patch(tree, meta)?;
        let (pruned, verdict) = prune(patched);
        match verdict {
            Verdict::False => {
                log::debug!(
                    "filter for list '{}' pruned to constant false, skipping fetch",
                    meta.list
                );
                return Ok(Vec::new());
            }
            Verdict::True => {
                log::debug!(
                    "filter for list '{}' pruned to constant true, dropped",
                    meta.list
                );
            }
            Verdict::Unknown => filter = Some(pruned),
        }
    }

    // (d)+(e) Diagnostics happen inside the fetch funnel, immediately before
    // the provider call.
    let wire = WireQuery {
        list: meta.list.to_string(),
        view_fields,
        filter,
        order: doc.order,
    };
    ctx.fetch(&wire)
}

/// Lazy flat stream of materialized entities.
pub struct EntityStream<'a, T: Entity> {
    ctx: &'a QueryContext,
    doc: Option<QueryDocument<T>>,
    rows: Option<std::vec::IntoIter<Row>>,
    done: bool,
}

impl<'a, T: Entity> Iterator for EntityStream<'a, T> {
    type Item = EngineResult<Rc<RefCell<T>>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if self.rows.is_none() {
            let doc = self.doc.take()?;
            if doc.grouping.is_some() {
                self.done = true;
                return Some(Err(EngineError::configuration(
                    "grouped document handed to the flat execution path",
                )));
            }
            match run_pipeline(self.ctx, doc) {
                Ok(rows) => self.rows = Some(rows.into_iter()),
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
        match self.rows.as_mut()?.next() {
            Some(row) => match Materializer::new(self.ctx).get_item(&row) {
                Ok(entity) => Some(Ok(entity)),
                Err(e) => {
                    // Mid-stream materialization failure; earlier items have
                    // already been yielded and stay yielded.
                    self.done = true;
                    Some(Err(e))
                }
            },
            None => {
                self.done = true;
                None
            }
        }
    }
}

type EntityPairs<'a, T> =
    Box<dyn Iterator<Item = EngineResult<(ScalarValue, Rc<RefCell<T>>)>> + 'a>;

/// Lazy stream of full groups.
pub struct GroupStream<'a, T: Entity> {
    ctx: &'a QueryContext,
    doc: Option<QueryDocument<T>>,
    inner: Option<GroupAdjacent<EntityPairs<'a, T>, ScalarValue, Rc<RefCell<T>>>>,
    done: bool,
}

impl<'a, T: Entity> Iterator for GroupStream<'a, T> {
    type Item = EngineResult<Group<ScalarValue, Rc<RefCell<T>>>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if self.inner.is_none() {
            let mut doc = self.doc.take()?;
            let Some(grouping) = doc.grouping.take() else {
                self.done = true;
                return Some(Err(EngineError::configuration(
                    "ungrouped document handed to the grouped execution path",
                )));
            };
            if grouping.key_only {
                self.done = true;
                return Some(Err(EngineError::configuration(
                    "key-only grouping handed to the full-group execution path",
                )));
            }
            let rows = match run_pipeline(self.ctx, doc) {
                Ok(rows) => rows,
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            };
            let ctx = self.ctx;
            let selector = grouping.selector;
            let pairs: EntityPairs<'a, T> = Box::new(rows.into_iter().map(move |row| {
                let entity = Materializer::new(ctx).get_item(&row)?;
                let key = selector(&entity.borrow());
                Ok((key, entity))
            }));
            self.inner = Some(GroupAdjacent::new(pairs));
        }
        match self.inner.as_mut()?.next() {
            Some(Ok(group)) => Some(Ok(group)),
            Some(Err(e)) => {
                self.done = true;
                Some(Err(e))
            }
            None => {
                self.done = true;
                None
            }
        }
    }
}

type KeyPairs<'a> = Box<dyn Iterator<Item = EngineResult<(ScalarValue, ())>> + 'a>;

/// Lazy stream of distinct-adjacent grouping keys, no entity construction.
pub struct KeyStream<'a, T: Entity> {
    ctx: &'a QueryContext,
    doc: Option<QueryDocument<T>>,
    inner: Option<GroupAdjacent<KeyPairs<'a>, ScalarValue, ()>>,
    done: bool,
}

impl<'a, T: Entity> Iterator for KeyStream<'a, T> {
    type Item = EngineResult<ScalarValue>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if self.inner.is_none() {
            let mut doc = self.doc.take()?;
            let Some(grouping) = doc.grouping.take() else {
                self.done = true;
                return Some(Err(EngineError::configuration(
                    "ungrouped document handed to the key-only execution path",
                )));
            };
            if !grouping.key_only {
                self.done = true;
                return Some(Err(EngineError::configuration(
                    "full-group document handed to the key-only execution path",
                )));
            }
            let rows = match run_pipeline(self.ctx, doc) {
                Ok(rows) => rows,
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            };
            let meta = T::meta();
            let Some(key_fd) = meta.field_by_name(grouping.key_field) else {
                self.done = true;
                return Some(Err(EngineError::configuration(format!(
                    "grouping key column '{}' is not mapped on list '{}'",
                    grouping.key_field, meta.list
                ))));
            };
            let key_field = grouping.key_field;
            let pairs: KeyPairs<'a> = Box::new(rows.into_iter().map(move |row| {
                let raw = row.get(key_field).ok_or_else(|| {
                    EngineError::shape(format!("row is missing grouping key column '{key_field}'"))
                })?;
                let key = ScalarValue::parse(key_fd.field_type, raw)?;
                Ok((key, ()))
            }));
            self.inner = Some(GroupAdjacent::new(pairs));
        }
        match self.inner.as_mut()?.next() {
            Some(Ok(group)) => Some(Ok(group.key)),
            Some(Err(e)) => {
                self.done = true;
                Some(Err(e))
            }
            None => {
                self.done = true;
                None
            }
        }
    }
}
