// Mapping between fixed-arity tuples of domain values and record indices.
// Index 0 is reserved for the nil record in every arity;
// each arity owns an independent interning namespace. Thread-safety
// mirrors the symbol table: concurrent reads, single-lock mutation.

use crate::models::value::{Tuple, Value};
use dashmap::DashMap;
use parking_lot::RwLock;
use std::sync::Arc;

pub type RecordId = u32;
pub const NIL_RECORD: RecordId = 0;

#[derive(Default)]
struct Namespace {
    forward: ahash::AHashMap<Box<[Value]>, RecordId>,
    backward: Vec<Box<[Value]>>,
}

impl Namespace {
    fn new() -> Self {
        // slot 0 is the nil record; never matched by `pack`.
        Self {
            forward: Default::default(),
            backward: vec![Box::from([])],
        }
    }
}

#[derive(Default)]
pub struct RecordTable {
    namespaces: DashMap<u32, Arc<RwLock<Namespace>>, ahash::RandomState>,
}

impl RecordTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn namespace(&self, arity: u32) -> Arc<RwLock<Namespace>> {
        self.namespaces
            .entry(arity)
            .or_insert_with(|| Arc::new(RwLock::new(Namespace::new())))
            .clone()
    }

    /// Interns `values` (arity `values.len()`), returning the record index.
    /// Equal tuples (within the same arity) yield the same index.
    pub fn pack(&self, values: &[Value]) -> RecordId {
        let ns = self.namespace(values.len() as u32);
        if let Some(existing) = ns.read().forward.get(values) {
            return *existing;
        }
        let mut guard = ns.write();
        if let Some(existing) = guard.forward.get(values) {
            return *existing;
        }
        let id = guard.backward.len() as RecordId;
        let boxed: Box<[Value]> = values.into();
        guard.backward.push(boxed.clone());
        guard.forward.insert(boxed, id);
        id
    }

    /// Recovers the tuple for `id` under the given arity. Returns an empty
    /// tuple for the nil record.
    pub fn unpack(&self, id: RecordId, arity: u32) -> Tuple {
        if id == NIL_RECORD {
            return Box::from([]);
        }
        let ns = self.namespace(arity);
        let guard = ns.read();
        guard
            .backward
            .get(id as usize)
            .cloned()
            .unwrap_or_else(|| Box::from([]))
    }

    pub fn is_nil(id: RecordId) -> bool {
        id == NIL_RECORD
    }
}
