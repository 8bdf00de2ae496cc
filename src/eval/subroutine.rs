// Provenance subproof subroutines. `translate::translate_subproof` turns
// a clause into an `Operation` tree whose leaves are `Return` rather than
// `Project`; this module registers those trees by name and invokes them
// against bound
// head-variable values to recover a witnessing row of body bindings,
// which `crate::explain` walks recursively into a derivation tree.

use crate::eval::context::Context;
use crate::eval::env::RelationEnv;
use crate::eval::relation::StoredTuple;
use crate::models::ir_r::Operation;
use crate::models::value::Value;
use ahash::AHashMap;
use std::sync::Arc;

/// Registry of subproof subroutines, keyed by the relation name whose
/// clause they were translated from. A relation derived by more than one
/// clause owns one subroutine per clause. Each entry carries the sorted
/// variable names its `Return` leaves emit values in, so a caller can
/// rebind a witness row onto the clause body it came from.
#[derive(Default)]
pub struct SubroutineTable {
    subroutines: AHashMap<Arc<str>, Vec<(Operation, Vec<Arc<str>>)>>,
}

impl SubroutineTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, relation: Arc<str>, subroutine: Operation, names: Vec<Arc<str>>) {
        self.subroutines.entry(relation).or_default().push((subroutine, names));
    }

    pub fn for_relation(&self, relation: &str) -> &[(Operation, Vec<Arc<str>>)] {
        self.subroutines.get(relation).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Returns the variable name bound to each column of the witness rows
    /// `invoke` produces for `relation`'s clause at `clause_index`.
    pub fn names_for(&self, relation: &str, clause_index: usize) -> &[Arc<str>] {
        &self.for_relation(relation)[clause_index].1
    }

    /// Runs every registered subroutine for `relation` with `head_values`
    /// bound at level 0, returning each clause's index alongside the rows
    /// of body-variable values it produced. An empty inner vector means
    /// that clause could not derive `head_values`.
    pub fn invoke(
        &self,
        relation: &str,
        head_values: &[Value],
        env: &RelationEnv,
    ) -> Vec<(usize, Vec<Vec<Value>>)> {
        let head_tuple: StoredTuple = Arc::from(head_values.to_vec());
        self.for_relation(relation)
            .iter()
            .enumerate()
            .map(|(clause_index, (subroutine, _))| {
                let ctx = Context::new().bind(0, head_tuple.clone());
                (clause_index, run_subroutine(subroutine, &ctx, env))
            })
            .collect()
    }
}

fn run_subroutine(op: &Operation, ctx: &Context, env: &RelationEnv) -> Vec<Vec<Value>> {
    let mut rows = Vec::new();
    walk_returns(op, ctx, env, &mut rows);
    rows
}

fn walk_returns(op: &Operation, ctx: &Context, env: &RelationEnv, rows: &mut Vec<Vec<Value>>) {
    use crate::eval::expr::{eval_condition, eval_expression};

    match op {
        Operation::Scan { relation, level, then } => {
            let Some(relation) = env.get(relation) else { return };
            for tuple in relation.iter_all() {
                let ctx = ctx.bind(*level, tuple);
                walk_returns(then, &ctx, env, rows);
            }
        }
        Operation::IndexScan { relation, level, pattern, then } => {
            let Some(relation) = env.get(relation) else { return };
            let values: Vec<Option<Value>> =
                pattern.iter().map(|slot| slot.as_ref().map(|e| eval_expression(e, &ctx, env))).collect();
            for tuple in relation.range(&values) {
                let ctx = ctx.bind(*level, tuple);
                walk_returns(then, &ctx, env, rows);
            }
        }
        Operation::Filter { condition, then } => {
            if eval_condition(condition, ctx, env) {
                walk_returns(then, ctx, env, rows);
            }
        }
        Operation::UnpackRecord { source, arity, level, then } => {
            let record_id = eval_expression(source, ctx, env).unsigned_view() as u32;
            if crate::models::record_table::RecordTable::is_nil(record_id) {
                return;
            }
            let fields = env.records.unpack(record_id, *arity as u32);
            let ctx = ctx.bind(*level, Arc::from(fields.into_vec()));
            walk_returns(then, &ctx, env, rows);
        }
        Operation::Aggregate { .. } => {
            // Aggregates never appear inside a subproof body: provenance
            // is restricted to positive-literal bodies.
        }
        Operation::Project { .. } => {}
        Operation::Return { values } => {
            rows.push(values.iter().map(|e| eval_expression(e, ctx, env)).collect());
        }
    }
}
