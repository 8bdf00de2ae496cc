// Search-signature gathering: walks a translated `Statement` tree and
// records, per relation, every partial search pattern the program probes it
// with. `chain_cover` picks indexes given a relation's signatures, but
// something has to collect those signatures from the operation tree first --
// this is that pass.

use crate::models::ir_r::{Condition, Operation, Statement};
use crate::models::relation::{ColumnConstraint, SearchSignature};
use ahash::AHashMap;

fn signature_of(pattern: &[Option<crate::models::ir_r::Expression>]) -> SearchSignature {
    pattern
        .iter()
        .map(|slot| if slot.is_some() { ColumnConstraint::Equal } else { ColumnConstraint::None })
        .collect()
}

fn record(map: &mut AHashMap<String, Vec<SearchSignature>>, relation: &str, signature: SearchSignature) {
    let signatures = map.entry(relation.to_string()).or_default();
    if !signatures.contains(&signature) {
        signatures.push(signature);
    }
}

fn walk_condition(condition: &Condition, map: &mut AHashMap<String, Vec<SearchSignature>>) {
    match condition {
        Condition::ExistenceCheck { relation, pattern, .. } => {
            record(map, relation, signature_of(pattern));
        }
        Condition::EmptinessCheck { relation, pattern } => {
            record(map, relation, signature_of(pattern));
        }
        Condition::Conjunction(conditions) => {
            for c in conditions {
                walk_condition(c, map);
            }
        }
        Condition::Negation(inner) => walk_condition(inner, map),
        Condition::True | Condition::Compare { .. } | Condition::Match { .. } | Condition::Contains { .. } => {}
    }
}

fn walk_operation(op: &Operation, map: &mut AHashMap<String, Vec<SearchSignature>>) {
    match op {
        Operation::Scan { then, .. } => walk_operation(then, map),
        Operation::IndexScan { relation, pattern, then, .. } => {
            record(map, relation, signature_of(pattern));
            walk_operation(then, map);
        }
        Operation::Aggregate { body, then, .. } => {
            walk_operation(body, map);
            walk_operation(then, map);
        }
        Operation::Filter { condition, then } => {
            walk_condition(condition, map);
            walk_operation(then, map);
        }
        Operation::UnpackRecord { then, .. } => walk_operation(then, map),
        Operation::Project { .. } | Operation::Return { .. } => {}
    }
}

fn walk_statement(stmt: &Statement, map: &mut AHashMap<String, Vec<SearchSignature>>) {
    match stmt {
        Statement::Insert { operation, .. } => walk_operation(operation, map),
        Statement::Sequence(statements) | Statement::Parallel(statements) => {
            for s in statements {
                walk_statement(s, map);
            }
        }
        Statement::Loop { body, .. } => walk_statement(body, map),
        Statement::Assign { .. }
        | Statement::Clear { .. }
        | Statement::Subtract { .. }
        | Statement::Load { .. }
        | Statement::Store { .. }
        | Statement::Noop => {}
    }
}

/// Collects every search signature a translated program probes each relation
/// with, keyed by the relation name exactly as it appears in the operation
/// tree -- so `@delta_R`/`@new_R` auxiliaries get their own entries distinct
/// from `R`'s. `crate::pipeline` merges those back onto a shared base name
/// before calling `chain_cover`, since a delta/new auxiliary should reuse
/// its base relation's index layout.
pub fn gather_signatures(program: &Statement) -> AHashMap<String, Vec<SearchSignature>> {
    let mut map = AHashMap::default();
    walk_statement(program, &mut map);
    map
}
