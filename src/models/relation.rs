// Relation references and search signatures. A `RelationRef`
// is the static description a relation is translated against; the run-time
// relation storage lives in `crate::eval::relation_env`.

use std::sync::Arc;

/// Interned relation identifier threaded through IR-R. Cheap to clone,
/// `Send + Sync` so it can cross `rayon` worker boundaries untouched.
pub type RelationId = Arc<str>;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ColumnType {
    Signed,
    Unsigned,
    Float,
    Symbol,
    Record,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RelationRepr {
    BTree,
    Brie,
    EqRel,
    ProvenanceBTree,
}

#[derive(Clone, Debug)]
pub struct RelationRef {
    pub name: RelationId,
    pub arity: usize,
    pub aux_arity: usize,
    pub column_types: Vec<ColumnType>,
    pub repr: RelationRepr,
}

impl RelationRef {
    pub fn new(name: impl Into<Arc<str>>, column_types: Vec<ColumnType>) -> Self {
        let arity = column_types.len();
        Self {
            name: name.into(),
            arity,
            aux_arity: 0,
            column_types,
            repr: RelationRepr::BTree,
        }
    }

    pub fn with_aux(mut self, aux_arity: usize) -> Self {
        self.aux_arity = aux_arity;
        self.arity += aux_arity;
        self
    }

    pub fn with_repr(mut self, repr: RelationRepr) -> Self {
        self.repr = repr;
        self
    }

    /// Non-auxiliary column count -- the columns application-level equality
    /// considers.
    pub fn data_arity(&self) -> usize {
        self.arity - self.aux_arity
    }
}

/// Per-column constraint of a search signature.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, PartialOrd, Ord)]
pub enum ColumnConstraint {
    None,
    Equal,
    Inequal,
}

/// A search signature: one constraint per column of the relation it's
/// evaluated against.
pub type SearchSignature = Vec<ColumnConstraint>;

/// `lhs` is a (non-strict) subset of `rhs` under the equality-bit
/// compatibility rules: `Equal ⊂ Equal`, `None ⊂ {Equal, Inequal}`,
/// `Inequal ⊂ Inequal`, `None ⊂ None`.
pub fn is_subset(lhs: &[ColumnConstraint], rhs: &[ColumnConstraint]) -> bool {
    if lhs.len() != rhs.len() {
        return false;
    }
    lhs.iter().zip(rhs.iter()).all(|(l, r)| match (l, r) {
        (ColumnConstraint::None, _) => true,
        (ColumnConstraint::Equal, ColumnConstraint::Equal) => true,
        (ColumnConstraint::Inequal, ColumnConstraint::Inequal) => true,
        _ => false,
    })
}

/// Two signatures are comparable iff one is a subset of the other.
pub fn comparable(a: &[ColumnConstraint], b: &[ColumnConstraint]) -> bool {
    is_subset(a, b) || is_subset(b, a)
}

/// A signature containing an `Inequal` column never has outgoing chain
/// edges to other signatures -- it is only ever a chain tail.
pub fn has_inequality(sig: &[ColumnConstraint]) -> bool {
    sig.iter().any(|c| *c == ColumnConstraint::Inequal)
}

pub fn is_empty_signature(sig: &[ColumnConstraint]) -> bool {
    sig.iter().all(|c| *c == ColumnConstraint::None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ColumnConstraint::*;

    #[test]
    fn none_is_subset_of_everything_columnwise() {
        assert!(is_subset(&[None, None], &[Equal, Inequal]));
        assert!(is_subset(&[None], &[None]));
    }

    #[test]
    fn equal_is_only_subset_of_equal() {
        assert!(is_subset(&[Equal], &[Equal]));
        assert!(!is_subset(&[Equal], &[Inequal]));
        assert!(!is_subset(&[Equal], &[None]));
    }

    #[test]
    fn inequality_bearing_signature_has_no_outgoing_edge() {
        let sig = vec![Equal, Inequal];
        assert!(has_inequality(&sig));
    }
}
