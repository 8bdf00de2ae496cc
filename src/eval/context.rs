// Run-time evaluation context: binds tuple slots (nesting levels) to
// pointers into relation storage. Backed by `im::Vector` so a context can
// be cloned cheaply at every nested scan -- structural sharing means a
// parallel worker's per-partition context never copies the slots bound by
// its enclosing scans; contexts are created fresh per query and per
// parallel worker.

use crate::eval::relation::StoredTuple;
use crate::models::value::Value;
use im::Vector;
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct Context {
    slots: Vector<StoredTuple>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a new context with `tuple` bound at `level`, leaving `self`
    /// untouched (the enclosing scan keeps its own view for its next
    /// iteration).
    pub fn bind(&self, level: u32, tuple: StoredTuple) -> Self {
        let mut slots = self.slots.clone();
        let idx = level as usize;
        while slots.len() < idx {
            slots.push_back(Arc::from(Vec::new()));
        }
        if idx < slots.len() {
            slots.set(idx, tuple);
        } else {
            slots.push_back(tuple);
        }
        Self { slots }
    }

    pub fn element(&self, level: u32, column: usize) -> Value {
        self.slots
            .get(level as usize)
            .and_then(|tuple| tuple.get(column))
            .copied()
            .unwrap_or(Value::Undefined)
    }

    pub fn tuple_at(&self, level: u32) -> Option<&StoredTuple> {
        self.slots.get(level as usize)
    }
}
