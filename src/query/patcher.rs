//! Lookup patching: rewrite cross-list sub-predicates into inline
//! disjunctions.
//!
//! Every patch marker stands for "the outer lookup field references an item
//! of the target list matching this sub-predicate". The patcher resolves it
//! by running a minimal identifier-only subquery against the target list and
//! folding the matching ids into a right-associated OR of by-id equality
//! comparisons on the outer field. Zero matches substitute a constant false,
//! which the pruner then propagates. Subqueries run one per marker,
//! sequentially, never batched.

use crate::context::QueryContext;
use crate::core::{EngineError, EngineResult};
use crate::document::{PredicateNode, WireQuery};
use crate::metadata::EntityMeta;

pub struct LookupPatcher<'a> {
    ctx: &'a QueryContext,
}

impl<'a> LookupPatcher<'a> {
    pub fn new(ctx: &'a QueryContext) -> Self {
        Self { ctx }
    }

    /// Rewrite the tree, replacing every patch marker. The returned tree
    /// contains no markers.
    pub fn patch(&self, node: PredicateNode, meta: &EntityMeta) -> EngineResult<PredicateNode> {
        match node {
            PredicateNode::And(left, right) => Ok(PredicateNode::and(
                self.patch(*left, meta)?,
                self.patch(*right, meta)?,
            )),
            PredicateNode::Or(left, right) => Ok(PredicateNode::or(
                self.patch(*left, meta)?,
                self.patch(*right, meta)?,
            )),
            PredicateNode::PatchMarker { field, filter } => {
                self.resolve_marker(&field, filter.map(|b| *b), meta)
            }
            other => Ok(other),
        }
    }

    fn resolve_marker(
        &self,
        field: &str,
        filter: Option<PredicateNode>,
        meta: &EntityMeta,
    ) -> EngineResult<PredicateNode> {
        let fd = meta.field_by_name(field).ok_or_else(|| {
            EngineError::configuration(format!(
                "patch marker on unmapped field '{field}' of list '{}'",
                meta.list
            ))
        })?;
        if !fd.field_type.is_lookup() {
            return Err(EngineError::configuration(format!(
                "patch marker on non-lookup field '{field}' ({:?})",
                fd.field_type
            )));
        }
        let list = fd.lookup_list.ok_or_else(|| {
            EngineError::configuration(format!("lookup field '{field}' names no target list"))
        })?;

        // Minimal subquery: identifier column only.
        let wire = WireQuery {
            list: list.to_string(),
            view_fields: vec![fd.lookup_key.to_string()],
            filter,
            order: Vec::new(),
        };
        let rows = self.ctx.fetch(&wire)?;

        let mut ids = Vec::with_capacity(rows.len());
        for row in &rows {
            let raw = row.get(fd.lookup_key).ok_or_else(|| {
                EngineError::shape(format!(
                    "subquery row from list '{list}' is missing identifier column '{}'",
                    fd.lookup_key
                ))
            })?;
            let id = raw.trim().parse::<i64>().map_err(|_| {
                EngineError::shape(format!("invalid identifier value '{raw}' from list '{list}'"))
            })?;
            ids.push(id);
        }
        log::debug!(
            "patched marker on '{field}' against list '{list}': {} matching ids",
            ids.len()
        );

        let mut iter = ids.into_iter().rev();
        let Some(last) = iter.next() else {
            // Zero matching items: no outer row can satisfy the marker.
            return Ok(PredicateNode::Constant(false));
        };
        let mut node = PredicateNode::eq_lookup_id(field, last);
        for id in iter {
            node = PredicateNode::or(PredicateNode::eq_lookup_id(field, id), node);
        }
        Ok(node)
    }
}
