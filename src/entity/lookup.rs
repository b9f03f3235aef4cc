//! Lazy foreign-key references.
//!
//! A lookup handle wraps one (or several) foreign ids into another list and
//! resolves to the target entity at most once. When deferred loading is
//! disabled on the context, binding resolves immediately; otherwise the
//! first access does. Resolution consults the target's identity cache before
//! issuing a by-id fetch.
//!
//! Eager binding recurses through the lookup graph: the referenced entity is
//! fetched and populated before the referring one enters its cache. Cyclic
//! lookup mappings therefore require deferred loading to stay enabled; lazy
//! resolution breaks the cycle through the identity cache.

use crate::context::QueryContext;
use crate::core::{EngineError, EngineResult, ScalarValue};
use crate::document::{PredicateNode, WireQuery};
use crate::entity::materializer::Materializer;
use crate::metadata::Entity;
use std::cell::{OnceCell, RefCell};
use std::fmt;
use std::rc::Rc;

/// Lazy handle to a single foreign item.
pub struct LookupRef<T: Entity> {
    id: i64,
    target: OnceCell<Rc<RefCell<T>>>,
}

impl<T: Entity> LookupRef<T> {
    /// Bind a handle to (context, id), resolving eagerly when deferred
    /// loading is disabled for the context. Eager binding does not support
    /// cyclic lookup mappings.
    pub fn bind(ctx: &QueryContext, id: i64) -> EngineResult<Self> {
        let handle = Self {
            id,
            target: OnceCell::new(),
        };
        if !ctx.deferred_loading() {
            handle.resolve(ctx)?;
        }
        Ok(handle)
    }

    /// The unresolved foreign key.
    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn is_resolved(&self) -> bool {
        self.target.get().is_some()
    }

    /// Target entity, fetched on first call and cached on the handle.
    pub fn resolve(&self, ctx: &QueryContext) -> EngineResult<Rc<RefCell<T>>> {
        if let Some(target) = self.target.get() {
            return Ok(Rc::clone(target));
        }
        let entity = fetch_by_id::<T>(ctx, self.id)?;
        let _ = self.target.set(Rc::clone(&entity));
        Ok(entity)
    }
}

impl<T: Entity> fmt::Debug for LookupRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LookupRef")
            .field("id", &self.id)
            .field("resolved", &self.is_resolved())
            .finish()
    }
}

impl<T: Entity> Clone for LookupRef<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            target: self.target.clone(),
        }
    }
}

/// Lazy handle to a set of foreign items, resolved together at most once.
pub struct LookupCollectionRef<T: Entity> {
    ids: Vec<i64>,
    targets: OnceCell<Vec<Rc<RefCell<T>>>>,
}

impl<T: Entity> LookupCollectionRef<T> {
    pub fn bind(ctx: &QueryContext, ids: Vec<i64>) -> EngineResult<Self> {
        let handle = Self {
            ids,
            targets: OnceCell::new(),
        };
        if !ctx.deferred_loading() {
            handle.resolve(ctx)?;
        }
        Ok(handle)
    }

    pub fn ids(&self) -> &[i64] {
        &self.ids
    }

    pub fn is_resolved(&self) -> bool {
        self.targets.get().is_some()
    }

    /// Target entities in id order. Ids are fetched one by one, each going
    /// through the target's identity cache.
    pub fn resolve(&self, ctx: &QueryContext) -> EngineResult<Vec<Rc<RefCell<T>>>> {
        if let Some(targets) = self.targets.get() {
            return Ok(targets.clone());
        }
        let mut targets = Vec::with_capacity(self.ids.len());
        for id in &self.ids {
            targets.push(fetch_by_id::<T>(ctx, *id)?);
        }
        let _ = self.targets.set(targets.clone());
        Ok(targets)
    }
}

impl<T: Entity> fmt::Debug for LookupCollectionRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LookupCollectionRef")
            .field("ids", &self.ids)
            .field("resolved", &self.is_resolved())
            .finish()
    }
}

impl<T: Entity> Clone for LookupCollectionRef<T> {
    fn clone(&self) -> Self {
        Self {
            ids: self.ids.clone(),
            targets: self.targets.clone(),
        }
    }
}

/// Fetch one item by primary key: identity cache first, then a full-
/// projection query filtered on the key column.
fn fetch_by_id<T: Entity>(ctx: &QueryContext, id: i64) -> EngineResult<Rc<RefCell<T>>> {
    let source = ctx.source::<T>();
    if let Some(hit) = source.cache().get(id) {
        return Ok(hit);
    }

    let meta = T::meta();
    let wire = WireQuery {
        list: meta.list.to_string(),
        view_fields: meta.mapped_projection(),
        filter: Some(PredicateNode::eq(meta.key.field, ScalarValue::Int(id))),
        order: Vec::new(),
    };
    let rows = ctx.fetch(&wire)?;
    let row = rows.first().ok_or_else(|| {
        EngineError::provider(format!("item {id} not found in list '{}'", meta.list))
    })?;
    Materializer::new(ctx).get_item(row)
}
