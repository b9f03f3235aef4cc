//! The per-context state the pipeline threads explicitly: the provider
//! handle, the settings, the optional diagnostic sink, and the registry of
//! per-list entity sources.
//!
//! A context (and everything hanging off it) is single-threaded by contract;
//! sharing one across threads is not supported, which is why the registry
//! and caches use plain interior mutability.

use crate::config::Settings;
use crate::core::EngineResult;
use crate::document::WireQuery;
use crate::entity::cache::EntityCache;
use crate::metadata::Entity;
use crate::provider::{Row, TabularProvider};
use crate::query::executor::QueryExecutor;
use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::collections::HashMap;
use std::io::Write;
use std::rc::Rc;

/// Per-list source object: owns the identity cache for one entity type.
///
/// At most one live instance per id for the lifetime of this object.
pub struct ListSource<T: Entity> {
    cache: EntityCache<T>,
}

impl<T: Entity> ListSource<T> {
    fn new() -> Self {
        Self {
            cache: EntityCache::new(),
        }
    }

    pub fn cache(&self) -> &EntityCache<T> {
        &self.cache
    }
}

/// Engine context: provider handle, settings, diagnostic sink, source
/// registry.
pub struct QueryContext {
    provider: Rc<dyn TabularProvider>,
    settings: Settings,
    sink: Option<RefCell<Box<dyn Write>>>,
    sources: RefCell<HashMap<TypeId, Rc<dyn Any>>>,
}

impl QueryContext {
    pub fn new(provider: Rc<dyn TabularProvider>) -> Self {
        Self::with_settings(provider, Settings::default())
    }

    pub fn with_settings(provider: Rc<dyn TabularProvider>, settings: Settings) -> Self {
        Self {
            provider,
            settings,
            sink: None,
            sources: RefCell::new(HashMap::new()),
        }
    }

    /// Install the diagnostic sink receiving a rendering of every wire query
    /// immediately before its remote fetch. Sink failures never propagate.
    pub fn set_log_sink(&mut self, sink: Box<dyn Write>) {
        self.sink = Some(RefCell::new(sink));
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Whether lookup references resolve lazily on first access.
    pub fn deferred_loading(&self) -> bool {
        self.settings.deferred_loading
    }

    /// Context-level version-check override, if any.
    pub fn version_check_override(&self) -> Option<bool> {
        self.settings.version_check
    }

    /// Executor facade over this context.
    pub fn executor(&self) -> QueryExecutor<'_> {
        QueryExecutor::new(self)
    }

    /// The source object (and identity cache) for one entity type, created
    /// on first use and kept for the context's lifetime.
    pub fn source<T: Entity>(&self) -> Rc<ListSource<T>> {
        let mut sources = self.sources.borrow_mut();
        let entry = sources
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Rc::new(ListSource::<T>::new()) as Rc<dyn Any>);
        Rc::clone(entry)
            .downcast::<ListSource<T>>()
            .expect("source registry entry keyed by TypeId holds that type")
    }

    /// Single funnel for every remote fetch: diagnostics first, then the
    /// blocking provider call. No retry on failure.
    pub(crate) fn fetch(&self, wire: &WireQuery) -> EngineResult<Vec<Row>> {
        self.render_diagnostics(wire);
        log::debug!("executing remote fetch: {wire}");
        self.provider.execute_query(wire)
    }

    pub(crate) fn list_version(&self, list: &str) -> EngineResult<String> {
        self.provider.get_list_version(list)
    }

    fn render_diagnostics(&self, wire: &WireQuery) {
        if let Some(sink) = &self.sink {
            let mut sink = sink.borrow_mut();
            if let Err(e) = writeln!(sink, "{wire}") {
                log::warn!("diagnostic sink write failed: {e}");
            }
        }
    }
}
