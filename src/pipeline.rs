// End-to-end orchestration: IR-A program -> IR-R statement tree -> index
// analysis -> relation registration -> evaluation, in one entry point.

use crate::config::Config;
use crate::eval::env::RelationEnv;
use crate::eval::exec::eval_statement;
use crate::index_analysis::{chain_cover, signatures::gather_signatures};
use crate::models::ir_a::{ArgumentA, AtomA, LiteralA, Program};
use crate::models::ir_r::{Condition, Operation, Statement};
use crate::models::relation::{ColumnType, RelationId, RelationRef, SearchSignature};
use crate::models::value::Value;
use crate::translate::program::{translate_program, DELTA_PREFIX, NEW_PREFIX};
use ahash::{AHashMap, AHashSet};

/// Strips a `@delta_`/`@new_` prefix down to the base relation name a
/// semi-naive auxiliary shares its index layout with: an auxiliary
/// relation is searched the same way its base relation is.
fn canonical_name(name: &str) -> &str {
    name.strip_prefix(DELTA_PREFIX).or_else(|| name.strip_prefix(NEW_PREFIX)).unwrap_or(name)
}

fn column_type_of(value: &Value) -> ColumnType {
    match value {
        Value::Signed(_) => ColumnType::Signed,
        Value::Unsigned(_) => ColumnType::Unsigned,
        Value::Float(_) => ColumnType::Float,
        Value::Symbol(_) => ColumnType::Symbol,
        Value::Undefined => ColumnType::Signed,
    }
}

/// Infers each relation's arity and column types from every atom occurrence
/// in `program` (head or body), defaulting a column to `ColumnType::Signed`
/// unless a constant argument at that position pins down a different kind.
/// IR-A carries no richer per-relation schema, so this "infer from usage,
/// default to an integer column" rule is what spares a host embedding this
/// crate from hand-writing its own schema pass.
fn infer_schema(program: &Program) -> AHashMap<RelationId, Vec<ColumnType>> {
    let mut schema: AHashMap<RelationId, Vec<ColumnType>> = AHashMap::default();

    let mut note_atom = |atom: &AtomA| {
        let entry = schema
            .entry(atom.relation.clone())
            .or_insert_with(|| vec![ColumnType::Signed; atom.args.len()]);
        if entry.len() < atom.args.len() {
            entry.resize(atom.args.len(), ColumnType::Signed);
        }
        for (column, arg) in atom.args.iter().enumerate() {
            if let ArgumentA::Constant(value) = arg {
                entry[column] = column_type_of(value);
            }
        }
    };

    for clause in &program.clauses {
        note_atom(&clause.head);
        for literal in &clause.body {
            match literal {
                LiteralA::Positive(atom) | LiteralA::Negative(atom) => note_atom(atom),
                _ => {}
            }
        }
    }
    schema
}

fn collect_relation_names(stmt: &Statement, names: &mut AHashSet<RelationId>) {
    match stmt {
        Statement::Insert { target, operation } => {
            names.insert(target.clone());
            collect_from_operation(operation, names);
        }
        Statement::Assign { target, source } | Statement::Subtract { target, source } => {
            names.insert(target.clone());
            names.insert(source.clone());
        }
        Statement::Clear { target } => {
            names.insert(target.clone());
        }
        Statement::Sequence(statements) | Statement::Parallel(statements) => {
            for s in statements {
                collect_relation_names(s, names);
            }
        }
        Statement::Loop { watch, body } => {
            names.extend(watch.iter().cloned());
            collect_relation_names(body, names);
        }
        Statement::Load { target, .. } => {
            names.insert(target.clone());
        }
        Statement::Store { source, .. } => {
            names.insert(source.clone());
        }
        Statement::Noop => {}
    }
}

fn collect_from_operation(op: &Operation, names: &mut AHashSet<RelationId>) {
    match op {
        Operation::Scan { relation, then, .. } => {
            names.insert(relation.clone());
            collect_from_operation(then, names);
        }
        Operation::IndexScan { relation, then, .. } => {
            names.insert(relation.clone());
            collect_from_operation(then, names);
        }
        Operation::Aggregate { body, then, .. } => {
            collect_from_operation(body, names);
            collect_from_operation(then, names);
        }
        Operation::Filter { condition, then } => {
            collect_from_condition(condition, names);
            collect_from_operation(then, names);
        }
        Operation::UnpackRecord { then, .. } => collect_from_operation(then, names),
        Operation::Project { .. } | Operation::Return { .. } => {}
    }
}

fn collect_from_condition(condition: &Condition, names: &mut AHashSet<RelationId>) {
    match condition {
        Condition::ExistenceCheck { relation, .. } | Condition::EmptinessCheck { relation, .. } => {
            names.insert(relation.clone());
        }
        Condition::Conjunction(conditions) => {
            for c in conditions {
                collect_from_condition(c, names);
            }
        }
        Condition::Negation(inner) => collect_from_condition(inner, names),
        Condition::True | Condition::Compare { .. } | Condition::Match { .. } | Condition::Contains { .. } => {}
    }
}

/// Runs chain-cover index analysis per canonical relation name, merging the
/// search signatures of a relation with those of its `@delta_`/`@new_`
/// auxiliaries first so all three end up sharing one index layout.
fn orders_by_canonical(translated: &Statement) -> AHashMap<String, Vec<Vec<usize>>> {
    let raw = gather_signatures(translated);
    let mut merged: AHashMap<String, Vec<SearchSignature>> = AHashMap::default();
    for (name, signatures) in raw {
        let bucket = merged.entry(canonical_name(&name).to_string()).or_default();
        for signature in signatures {
            if !bucket.contains(&signature) {
                bucket.push(signature);
            }
        }
    }
    merged
        .into_iter()
        .map(|(name, signatures)| {
            let chains = chain_cover(&signatures);
            (name, chains.into_iter().map(|c| c.lex_order).collect())
        })
        .collect()
}

/// Translates `program`, registers every relation its statement tree
/// touches (base relations and their semi-naive auxiliaries alike) with the
/// index layout chain-cover analysis picked for it, and returns the
/// statement tree alongside the environment ready to evaluate it against.
/// Splitting compilation from evaluation like this lets a caller register
/// extra relations (e.g. an EDB relation materialized by an external
/// loader, or a non-default `RelationRepr`) before running `eval_statement`.
pub fn compile(program: &Program, config: Config) -> (Statement, RelationEnv) {
    let translated = translate_program(program);
    let schema = infer_schema(program);
    let orders = orders_by_canonical(&translated);

    let mut names = AHashSet::default();
    collect_relation_names(&translated, &mut names);

    let env = RelationEnv::new(config);
    for name in names {
        let canonical = canonical_name(&name).to_string();
        let column_types = schema.get(canonical.as_str()).cloned().unwrap_or_default();
        let relation_orders = orders.get(&canonical).cloned().unwrap_or_default();
        env.create(RelationRef::new(name, column_types), relation_orders);
    }

    (translated, env)
}

/// Compiles and evaluates `program` to a fixpoint in one call, returning the
/// environment its output relations live in.
pub fn run(program: &Program, config: Config) -> RelationEnv {
    let (translated, env) = compile(program, config);
    eval_statement(&translated, &env);
    env
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ir_a::{ArgumentA, AtomA, ClauseA};
    use std::sync::Arc;

    fn var(name: &str) -> ArgumentA {
        ArgumentA::Variable(Arc::from(name))
    }

    #[test]
    fn compile_registers_every_relation_including_deltas() {
        // path(x,y) :- edge(x,y). path(x,z) :- edge(x,y), path(y,z).
        let program = Program {
            clauses: vec![
                ClauseA {
                    head: AtomA { relation: RelationId::from("path"), args: vec![var("x"), var("y")] },
                    body: vec![LiteralA::Positive(AtomA {
                        relation: RelationId::from("edge"),
                        args: vec![var("x"), var("y")],
                    })],
                },
                ClauseA {
                    head: AtomA { relation: RelationId::from("path"), args: vec![var("x"), var("z")] },
                    body: vec![
                        LiteralA::Positive(AtomA {
                            relation: RelationId::from("edge"),
                            args: vec![var("x"), var("y")],
                        }),
                        LiteralA::Positive(AtomA {
                            relation: RelationId::from("path"),
                            args: vec![var("y"), var("z")],
                        }),
                    ],
                },
            ],
            outputs: vec![RelationId::from("path")],
            plan: None,
        };

        let (_, env) = compile(&program, Config::default());
        let names: AHashSet<RelationId> = env.names().into_iter().collect();
        assert!(names.contains("edge"));
        assert!(names.contains("path"));
        assert!(names.iter().any(|n| n.starts_with("delta_path")));
        assert!(names.iter().any(|n| n.starts_with("new_path")));
    }

    #[test]
    fn run_computes_the_transitive_closure_fixpoint() {
        let program = Program {
            clauses: vec![
                ClauseA {
                    head: AtomA { relation: RelationId::from("path"), args: vec![var("x"), var("y")] },
                    body: vec![LiteralA::Positive(AtomA {
                        relation: RelationId::from("edge"),
                        args: vec![var("x"), var("y")],
                    })],
                },
                ClauseA {
                    head: AtomA { relation: RelationId::from("path"), args: vec![var("x"), var("z")] },
                    body: vec![
                        LiteralA::Positive(AtomA {
                            relation: RelationId::from("edge"),
                            args: vec![var("x"), var("y")],
                        }),
                        LiteralA::Positive(AtomA {
                            relation: RelationId::from("path"),
                            args: vec![var("y"), var("z")],
                        }),
                    ],
                },
            ],
            outputs: vec![RelationId::from("path")],
            plan: None,
        };

        let (translated, env) = compile(&program, Config::default());
        let edge = env.get("edge").unwrap();
        edge.insert(Arc::from(vec![Value::Signed(1), Value::Signed(2)]));
        edge.insert(Arc::from(vec![Value::Signed(2), Value::Signed(3)]));
        edge.insert(Arc::from(vec![Value::Signed(3), Value::Signed(4)]));

        eval_statement(&translated, &env);

        let path = env.get("path").unwrap();
        assert!(path.contains(&[Value::Signed(1), Value::Signed(4)]));
        assert_eq!(path.size(), 6);
    }
}
