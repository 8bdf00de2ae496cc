// Provenance explanation: walks a subproof tree built from generated
// subproof subroutines, recursively reconstructing a witnessing derivation
// for a derived fact. Without this module those subroutines would be
// generated but never driven by anything in this crate.

use crate::eval::env::RelationEnv;
use crate::eval::functors::{call_user_functor, eval_binop, eval_intrinsic};
use crate::eval::subroutine::SubroutineTable;
use crate::models::ir_a::{ArgumentA, ClauseA, LiteralA, Program};
use crate::models::value::Value;
use ahash::AHashMap;
use std::sync::Arc;

/// `rule_id` of a leaf explanation backed by a stored fact (or any tuple no
/// registered clause could re-derive), rather than a clause of `clauses`.
pub const BASE_FACT_RULE: usize = usize::MAX;

/// One node of a derivation: the tuple, which clause of its relation
/// derived it (`BASE_FACT_RULE` for a base fact), and the explanation of
/// each positive body atom that clause needed.
#[derive(Clone, Debug, PartialEq)]
pub struct Explanation {
    pub relation: Arc<str>,
    pub tuple: Vec<Value>,
    pub rule_id: usize,
    pub children: Vec<Explanation>,
}

/// Registers one subproof subroutine per clause of `program`, grouped by
/// head relation in the same order `SubroutineTable::invoke` reports
/// clause indices in -- the pairing `explain` relies on to recover the
/// clause a witness row came from.
pub fn build_subroutine_table(program: &Program) -> (SubroutineTable, AHashMap<Arc<str>, Vec<ClauseA>>) {
    let mut table = SubroutineTable::new();
    let mut clauses_by_relation: AHashMap<Arc<str>, Vec<ClauseA>> = AHashMap::default();
    for clause in &program.clauses {
        if clause.is_fact() {
            continue;
        }
        let relation = clause.head.relation.clone();
        let (subroutine, names) = crate::translate::translate_subproof(clause);
        table.register(relation.clone(), subroutine, names);
        clauses_by_relation.entry(relation).or_default().push(clause.clone());
    }
    (table, clauses_by_relation)
}

/// Explains one tuple of `relation`: finds a clause whose subproof
/// subroutine can re-derive it, then recurses into each positive body atom
/// of that clause. Relations with no registered subroutine (facts, or
/// relations supplied from outside the program) bottom out as a base-fact
/// leaf rather than recursing further.
pub fn explain(
    relation: &str,
    tuple: &[Value],
    subroutines: &SubroutineTable,
    clauses_by_relation: &AHashMap<Arc<str>, Vec<ClauseA>>,
    env: &RelationEnv,
) -> Explanation {
    let registered = subroutines.for_relation(relation);
    if registered.is_empty() {
        return base_fact(relation, tuple);
    }

    let witness = subroutines
        .invoke(relation, tuple, env)
        .into_iter()
        .find_map(|(clause_index, mut rows)| rows.pop().map(|row| (clause_index, row)));

    let Some((clause_index, row)) = witness else {
        return base_fact(relation, tuple);
    };

    let names = subroutines.names_for(relation, clause_index);
    let bindings: AHashMap<&str, Value> =
        names.iter().map(|n| n.as_ref()).zip(row.iter().copied()).collect();

    let clause = &clauses_by_relation[relation][clause_index];
    let children = clause
        .body
        .iter()
        .filter_map(|literal| match literal {
            LiteralA::Positive(atom) => Some(atom),
            _ => None,
        })
        .map(|atom| {
            let child_tuple: Vec<Value> =
                atom.args.iter().map(|arg| resolve_argument(arg, &bindings, env)).collect();
            explain(&atom.relation, &child_tuple, subroutines, clauses_by_relation, env)
        })
        .collect();

    Explanation { relation: Arc::from(relation), tuple: tuple.to_vec(), rule_id: clause_index, children }
}

fn base_fact(relation: &str, tuple: &[Value]) -> Explanation {
    Explanation {
        relation: Arc::from(relation),
        tuple: tuple.to_vec(),
        rule_id: BASE_FACT_RULE,
        children: Vec::new(),
    }
}

fn resolve_argument(arg: &ArgumentA, bindings: &AHashMap<&str, Value>, env: &RelationEnv) -> Value {
    match arg {
        ArgumentA::Variable(name) => bindings.get(name.as_ref()).copied().unwrap_or(Value::Undefined),
        ArgumentA::Constant(value) => *value,
        ArgumentA::Underscore => Value::Undefined,
        ArgumentA::BinOp { op, lhs, rhs } => {
            let lhs = resolve_argument(lhs, bindings, env);
            let rhs = resolve_argument(rhs, bindings, env);
            eval_binop(*op, lhs, rhs, &env.diagnostics)
        }
        ArgumentA::Intrinsic { op, args } => {
            let values: Vec<Value> = args.iter().map(|a| resolve_argument(a, bindings, env)).collect();
            eval_intrinsic(*op, &values, &env.symbols, &env.diagnostics)
        }
        ArgumentA::RecordCtor { fields, .. } => {
            let values: Vec<Value> = fields.iter().map(|a| resolve_argument(a, bindings, env)).collect();
            Value::Unsigned(env.records.pack(&values) as u64)
        }
        ArgumentA::UserFunctor { name, args, returns_symbol } => {
            let values: Vec<Value> = args.iter().map(|a| resolve_argument(a, bindings, env)).collect();
            call_user_functor(env.user_functors.as_ref(), name, &values, *returns_symbol, &env.symbols)
                .unwrap_or(Value::Undefined)
        }
    }
}
