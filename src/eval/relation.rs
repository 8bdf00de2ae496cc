// Run-time relation storage. One `Spine`-backed ordered index per
// lex-order the index analysis chose for this relation, kept in sync on
// every insert. `data_structures::spine::Spine` already gives the
// "ordered container keyed by a permutation of columns" contract, so the
// index layer here just tags instances with which permutation they sort
// by rather than reinventing a B-tree.
//
// Representation-specific behaviour: the `EqRel` variant
// maintains a union-find closure over its two columns; the
// `ProvenanceBTree` variant replaces a stored tuple on conflicting insert
// iff the new tuple's auxiliary `<level, rule>` columns are lexicographically
// smaller.

use crate::data_structures::spine::Spine;
use crate::models::relation::{RelationRef, RelationRepr};
use crate::models::value::Value;
use ahash::AHashMap;
use parking_lot::RwLock;
use std::cmp::Ordering;
use std::sync::Arc;

pub type StoredTuple = Arc<[Value]>;

#[derive(Clone)]
pub struct OrderedTuple {
    pub perm: Arc<[usize]>,
    pub data: StoredTuple,
}

impl PartialEq for OrderedTuple {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data
    }
}
impl Eq for OrderedTuple {}
impl PartialOrd for OrderedTuple {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for OrderedTuple {
    fn cmp(&self, other: &Self) -> Ordering {
        for &col in self.perm.iter() {
            match self.data[col].cmp(&other.data[col]) {
                Ordering::Equal => continue,
                ord => return ord,
            }
        }
        Ordering::Equal
    }
}

fn sentinel_tuple(perm: &Arc<[usize]>, arity: usize, pattern: &[Option<Value>], lower: bool) -> OrderedTuple {
    let mut data = vec![if lower { Value::min_sentinel() } else { Value::max_sentinel() }; arity];
    for (col, value) in pattern.iter().enumerate() {
        if let Some(v) = value {
            data[col] = *v;
        }
    }
    OrderedTuple { perm: perm.clone(), data: Arc::from(data) }
}

#[derive(Default)]
struct EqRelState {
    parent: AHashMap<Value, Value>,
}

impl EqRelState {
    fn find(&mut self, v: Value) -> Value {
        let parent = *self.parent.entry(v).or_insert(v);
        if parent == v {
            v
        } else {
            let root = self.find(parent);
            self.parent.insert(v, root);
            root
        }
    }

    fn union(&mut self, a: Value, b: Value) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            self.parent.insert(ra, rb);
        }
    }

    /// All known elements grouped by equivalence class.
    fn groups(&mut self) -> Vec<Vec<Value>> {
        let keys: Vec<Value> = self.parent.keys().copied().collect();
        let mut by_root: AHashMap<Value, Vec<Value>> = AHashMap::new();
        for k in keys {
            let root = self.find(k);
            by_root.entry(root).or_default().push(k);
        }
        by_root.into_values().collect()
    }
}

pub struct Relation {
    pub reference: RelationRef,
    indices: Vec<(Arc<[usize]>, RwLock<Spine<OrderedTuple>>)>,
    eqrel: Option<RwLock<EqRelState>>,
    /// data-columns -> full stored tuple, used only by the provenance
    /// B-tree variant to find the currently-stored derivation for a tuple.
    prov_keys: Option<RwLock<AHashMap<Box<[Value]>, StoredTuple>>>,
}

impl Relation {
    pub fn new(reference: RelationRef, orders: Vec<Vec<usize>>) -> Self {
        let arity = reference.arity;
        let orders = if orders.is_empty() { vec![(0..arity).collect()] } else { orders };
        let indices = orders
            .into_iter()
            .map(|perm| (Arc::<[usize]>::from(perm), RwLock::new(Spine::new())))
            .collect();
        let eqrel = matches!(reference.repr, RelationRepr::EqRel)
            .then(|| RwLock::new(EqRelState::default()));
        let prov_keys = matches!(reference.repr, RelationRepr::ProvenanceBTree)
            .then(|| RwLock::new(AHashMap::default()));
        Self { reference, indices, eqrel, prov_keys }
    }

    pub fn arity(&self) -> usize {
        self.reference.arity
    }

    fn data_slice<'a>(&self, tuple: &'a [Value]) -> &'a [Value] {
        &tuple[..self.reference.data_arity()]
    }

    fn insert_into_indices(&self, tuple: StoredTuple) -> bool {
        let mut added = false;
        for (i, (perm, spine)) in self.indices.iter().enumerate() {
            let ordered = OrderedTuple { perm: perm.clone(), data: tuple.clone() };
            let was_added = spine.write().insert(ordered);
            if i == 0 {
                added = was_added;
            }
        }
        added
    }

    fn remove_from_indices(&self, tuple: &StoredTuple) {
        for (perm, spine) in &self.indices {
            let ordered = OrderedTuple { perm: perm.clone(), data: tuple.clone() };
            spine.write().remove(&ordered);
        }
    }

    /// Rebuilds the materialized closure from the union-find state: every
    /// pair `(a, b)` (including `(a, a)`) within a class is present in the
    /// base indices.
    fn materialize_eqrel(&self) {
        let Some(eqrel) = &self.eqrel else { return };
        let groups = eqrel.write().groups();
        for group in groups {
            for &a in &group {
                for &b in &group {
                    self.insert_into_indices(Arc::from(vec![a, b]));
                }
            }
        }
    }

    /// Inserts `tuple`, returning whether it was new.
    pub fn insert(&self, tuple: StoredTuple) -> bool {
        if let Some(prov) = &self.prov_keys {
            let key: Box<[Value]> = self.data_slice(&tuple).into();
            let mut keys = prov.write();
            let aux_arity = self.reference.aux_arity;
            match keys.get(&key).cloned() {
                Some(existing) => {
                    let existing_aux = &existing[existing.len() - aux_arity..];
                    let new_aux = &tuple[tuple.len() - aux_arity..];
                    if new_aux < existing_aux {
                        self.remove_from_indices(&existing);
                        self.insert_into_indices(tuple.clone());
                        keys.insert(key, tuple);
                        true
                    } else {
                        false
                    }
                }
                None => {
                    keys.insert(key, tuple.clone());
                    self.insert_into_indices(tuple)
                }
            }
        } else if self.eqrel.is_some() {
            let added = self.insert_into_indices(tuple.clone());
            if added && tuple.len() >= 2 {
                self.eqrel.as_ref().unwrap().write().union(tuple[0], tuple[1]);
                self.materialize_eqrel();
            }
            added
        } else {
            self.insert_into_indices(tuple)
        }
    }

    pub fn contains(&self, tuple: &[Value]) -> bool {
        let (perm, spine) = &self.indices[0];
        let ordered = OrderedTuple { perm: perm.clone(), data: Arc::from(tuple.to_vec()) };
        spine.read().contains(&ordered)
    }

    pub fn empty(&self) -> bool {
        self.indices[0].1.read().len() == 0
    }

    pub fn size(&self) -> usize {
        self.indices[0].1.read().len()
    }

    pub fn purge(&self) {
        for (perm, spine) in &self.indices {
            *spine.write() = Spine::new();
            let _ = perm;
        }
        if let Some(eqrel) = &self.eqrel {
            *eqrel.write() = EqRelState::default();
        }
        if let Some(prov) = &self.prov_keys {
            prov.write().clear();
        }
    }

    /// Unions `other`'s tuples into `self`, returning whether any tuple was
    /// new (used by `Statement::Assign`/semi-naive merge).
    pub fn insert_all(&self, other: &Relation) -> bool {
        let mut any = false;
        for tuple in other.iter_all() {
            if self.insert(tuple) {
                any = true;
            }
        }
        any
    }

    /// `self := self \ other`: drop every tuple of `self` already present
    /// in `other` (used to shrink `@new_R` down to genuinely-new tuples
    /// before it becomes the next `@delta_R`).
    pub fn subtract(&self, other: &Relation) {
        let survivors: Vec<StoredTuple> =
            self.iter_all().filter(|t| !other.contains(t)).collect();
        self.purge();
        for tuple in survivors {
            self.insert(tuple);
        }
    }

    pub fn iter_all(&self) -> impl Iterator<Item = StoredTuple> + '_ {
        self.indices[0].1.read().iter().map(|ot| ot.data.clone()).collect::<Vec<_>>().into_iter()
    }

    /// Chooses the index whose prefix best matches `pattern`'s bound
    /// columns and returns the tuples within bounds built from that
    /// pattern (`None` columns widen to the domain's min/max sentinel).
    /// Every candidate is still checked against the full pattern before
    /// being handed to the caller, so an imperfect index choice only costs
    /// performance, never correctness.
    pub fn range(&self, pattern: &[Option<Value>]) -> Vec<StoredTuple> {
        let equal_cols: std::collections::HashSet<usize> =
            pattern.iter().enumerate().filter(|(_, v)| v.is_some()).map(|(i, _)| i).collect();
        let index_idx = self
            .indices
            .iter()
            .position(|(perm, _)| {
                let prefix: std::collections::HashSet<usize> =
                    perm.iter().take(equal_cols.len()).copied().collect();
                prefix == equal_cols
            })
            .unwrap_or(0);
        let (perm, spine) = &self.indices[index_idx];
        let lo = sentinel_tuple(perm, self.arity(), pattern, true);
        let hi = sentinel_tuple(perm, self.arity(), pattern, false);
        let guard = spine.read();
        guard
            .range(&lo, &hi)
            .filter(|ot| matches_pattern(&ot.data, pattern))
            .map(|ot| ot.data.clone())
            .collect()
    }

    /// Splits the full tuple set into `parts` roughly equal slices for
    /// partitioned parallel scans; each part is independent.
    pub fn partition(&self, parts: usize) -> Vec<Vec<StoredTuple>> {
        let all: Vec<StoredTuple> = self.iter_all().collect();
        if parts <= 1 || all.is_empty() {
            return vec![all];
        }
        let chunk = all.len().div_ceil(parts);
        all.chunks(chunk.max(1)).map(|c| c.to_vec()).collect()
    }
}

fn matches_pattern(tuple: &[Value], pattern: &[Option<Value>]) -> bool {
    pattern.iter().enumerate().all(|(col, v)| match v {
        Some(expected) => tuple[col] == *expected,
        None => true,
    })
}
