//! Per-source identity cache.
//!
//! One live instance per primary key for the lifetime of the owning list
//! source: entries are only ever appended or overwritten, never evicted.
//! Unsynchronized by contract (the whole pipeline is single-threaded).

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

pub struct EntityCache<T> {
    items: RefCell<HashMap<i64, Rc<RefCell<T>>>>,
}

impl<T> EntityCache<T> {
    pub fn new() -> Self {
        Self {
            items: RefCell::new(HashMap::new()),
        }
    }

    pub fn get(&self, id: i64) -> Option<Rc<RefCell<T>>> {
        self.items.borrow().get(&id).map(Rc::clone)
    }

    pub fn insert(&self, id: i64, item: Rc<RefCell<T>>) {
        self.items.borrow_mut().insert(id, item);
    }

    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }
}

impl<T> Default for EntityCache<T> {
    fn default() -> Self {
        Self::new()
    }
}
