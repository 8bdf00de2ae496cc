// Injective string <-> symbol index mapping. Grow-only;
// concurrent lookups must be safe while mutation serializes through a
// single lock -- `lasso::ThreadedRodeo` gives us exactly that contract, so
// we lean on it rather than hand-rolling an interner on top of `RwLock` +
// `HashMap`.

use crate::models::value::SymbolId;
use lasso::ThreadedRodeo;

#[derive(Default)]
pub struct SymbolTable {
    rodeo: ThreadedRodeo<SymbolId, ahash::RandomState>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up `s`, interning it if this is the first time it's been seen.
    pub fn lookup(&self, s: &str) -> SymbolId {
        self.rodeo.get_or_intern(s)
    }

    pub fn try_lookup(&self, s: &str) -> Option<SymbolId> {
        self.rodeo.get(s)
    }

    pub fn resolve(&self, id: SymbolId) -> &str {
        self.rodeo.resolve(&id)
    }

    pub fn len(&self) -> usize {
        self.rodeo.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rodeo.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_of_lookup_is_identity() {
        let table = SymbolTable::new();
        for s in ["alice", "bob", "alice", "carol"] {
            let id = table.lookup(s);
            assert_eq!(table.resolve(id), s);
        }
    }

    #[test]
    fn equal_strings_intern_to_the_same_symbol() {
        let table = SymbolTable::new();
        assert_eq!(table.lookup("x"), table.lookup("x"));
    }

    #[test]
    fn concurrent_lookup_is_safe() {
        use std::sync::Arc;
        let table = Arc::new(SymbolTable::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let table = table.clone();
                std::thread::spawn(move || table.lookup(&format!("sym{}", i % 4)))
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(table.len(), 4);
    }
}
