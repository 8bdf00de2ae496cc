// Statement/operation tree interpreter. Walks the IR-R the translator
// produces directly against `RelationEnv`-backed storage with no further
// lowering step: a recursive operation-tree walker over the nested
// scan/filter structure IR-R builds.

use crate::eval::context::Context;
use crate::eval::env::RelationEnv;
use crate::eval::expr::{eval_condition, eval_expression};
use crate::eval::io::{DirectiveOperation, Directives, IoKind};
use crate::eval::relation::StoredTuple;
use crate::models::ir_r::{AggregateOp, Expression, Operation, Statement};
use crate::models::value::Value;
use std::sync::Arc;

/// Runs `statement` to completion against `env`, stopping early if a fatal
/// condition (e.g. a missing user-functor symbol) was latched on
/// `env.diagnostics` -- by this statement or an
/// earlier sibling in the same `Sequence`/`Loop`.
pub fn eval_statement(statement: &Statement, env: &RelationEnv) {
    if env.diagnostics.has_fatal() {
        return;
    }
    match statement {
        Statement::Insert { target, operation } => {
            let Some(relation) = env.get(target) else { return };
            let ctx = Context::new();
            walk(operation, &ctx, env, &mut |ctx, values| {
                let tuple: StoredTuple =
                    Arc::from(values.iter().map(|e| eval_expression(e, ctx, env)).collect::<Vec<Value>>());
                relation.insert(tuple);
            });
        }
        Statement::Assign { target, source } => {
            if let (Some(target), Some(source)) = (env.get(target), env.get(source)) {
                target.insert_all(&source);
            }
        }
        Statement::Clear { target } => {
            if let Some(relation) = env.get(target) {
                relation.purge();
            }
        }
        Statement::Subtract { target, source } => {
            if let (Some(target), Some(source)) = (env.get(target), env.get(source)) {
                target.subtract(&source);
            }
        }
        Statement::Sequence(statements) => {
            for inner in statements {
                eval_statement(inner, env);
            }
        }
        Statement::Loop { watch, body } => {
            let span = tracing::info_span!("scc_fixpoint", relations = ?watch);
            let _enter = span.enter();
            let mut round = 0u32;
            loop {
                let before = sizes_of(watch, env);
                eval_statement(body, env);
                if env.diagnostics.has_fatal() {
                    break;
                }
                let after = sizes_of(watch, env);
                round += 1;
                if before == after {
                    tracing::trace!(rounds = round, sizes = ?after, "fixpoint reached");
                    break;
                }
            }
        }
        Statement::Parallel(statements) => {
            use rayon::prelude::*;
            statements.par_iter().for_each(|inner| eval_statement(inner, env));
        }
        Statement::Load { target, params } => {
            if let Err(source) = load(target, params, env) {
                env.diagnostics.warn(format!("load of `{target}` failed: {source}"));
            }
        }
        Statement::Store { source, params } => {
            if let Err(err) = store(source, params, env) {
                env.diagnostics.warn(format!("store of `{source}` failed: {err}"));
            }
        }
        Statement::Noop => {}
    }
}

fn sizes_of(relations: &[Arc<str>], env: &RelationEnv) -> Vec<usize> {
    relations.iter().map(|name| env.get(name).map(|r| r.size()).unwrap_or(0)).collect()
}

/// Recursively walks `op`, invoking `sink` at every `Project`/`Return`
/// leaf with the context accumulated along that path and the leaf's
/// output expressions.
fn walk(op: &Operation, ctx: &Context, env: &RelationEnv, sink: &mut dyn FnMut(&Context, &[Expression])) {
    match op {
        Operation::Scan { relation, level, then } => {
            let Some(relation) = env.get(relation) else { return };
            for tuple in relation.iter_all() {
                if env.diagnostics.has_fatal() {
                    return;
                }
                let ctx = ctx.bind(*level, tuple);
                walk(then, &ctx, env, sink);
            }
        }
        Operation::IndexScan { relation, level, pattern, then } => {
            let Some(relation) = env.get(relation) else { return };
            let values: Vec<Option<Value>> =
                pattern.iter().map(|slot| slot.as_ref().map(|e| eval_expression(e, ctx, env))).collect();
            for tuple in relation.range(&values) {
                if env.diagnostics.has_fatal() {
                    return;
                }
                let ctx = ctx.bind(*level, tuple);
                walk(then, &ctx, env, sink);
            }
        }
        Operation::Aggregate { op: agg_op, target, body, level, then } => {
            if let Some(value) = fold_aggregate(*agg_op, target, body, ctx, env) {
                let ctx = ctx.bind(*level, Arc::from(vec![value]));
                walk(then, &ctx, env, sink);
            }
        }
        Operation::Filter { condition, then } => {
            if eval_condition(condition, ctx, env) {
                walk(then, ctx, env, sink);
            }
        }
        Operation::UnpackRecord { source, arity, level, then } => {
            let record_id = eval_expression(source, ctx, env).unsigned_view() as u32;
            if crate::models::record_table::RecordTable::is_nil(record_id) {
                return;
            }
            let fields = env.records.unpack(record_id, *arity as u32);
            let ctx = ctx.bind(*level, Arc::from(fields.into_vec()));
            walk(then, &ctx, env, sink);
        }
        Operation::Project { values } => sink(ctx, values),
        Operation::Return { values } => sink(ctx, values),
    }
}

/// Folds `body`'s rows through `op`, evaluating `target` at each row that
/// reaches the body's leaf. Returns `None` when no row qualified, which
/// for `Min`/`Max` means the enclosing `Aggregate`'s `then` is skipped
/// entirely.
fn fold_aggregate(
    op: AggregateOp,
    target: &Expression,
    body: &Operation,
    ctx: &Context,
    env: &RelationEnv,
) -> Option<Value> {
    let mut count: i64 = 0;
    let mut sum_i: i64 = 0;
    let mut sum_f: f64 = 0.0;
    let mut saw_float = false;
    let mut min: Option<Value> = None;
    let mut max: Option<Value> = None;

    walk(body, ctx, env, &mut |inner_ctx, _| {
        count += 1;
        if matches!(op, AggregateOp::Count) {
            return;
        }
        let value = eval_expression(target, inner_ctx, env);
        match value {
            Value::Float(f) => {
                saw_float = true;
                sum_f += f.into_inner();
            }
            other => {
                sum_i = sum_i.wrapping_add(other.signed_view());
                sum_f += other.signed_view() as f64;
            }
        }
        min = Some(match min {
            Some(current) if current <= value => current,
            _ => value,
        });
        max = Some(match max {
            Some(current) if current >= value => current,
            _ => value,
        });
    });

    match op {
        AggregateOp::Count => Some(Value::Signed(count)),
        AggregateOp::Sum if saw_float => Some(Value::Float(ordered_float::OrderedFloat(sum_f))),
        AggregateOp::Sum => Some(Value::Signed(sum_i)),
        AggregateOp::Mean if count == 0 => None,
        AggregateOp::Mean => Some(Value::Float(ordered_float::OrderedFloat(sum_f / count as f64))),
        AggregateOp::Min => min,
        AggregateOp::Max => max,
    }
}

fn load(target: &str, params: &str, env: &RelationEnv) -> std::io::Result<()> {
    let directives = Directives::from_json(params)
        .map_err(|source| std::io::Error::new(std::io::ErrorKind::InvalidData, source))?;
    let Some(relation) = env.get(target) else { return Ok(()) };
    for row in env.reader_writer.read(&directives)? {
        relation.insert(Arc::from(row));
    }
    Ok(())
}

fn store(source: &str, params: &str, env: &RelationEnv) -> std::io::Result<()> {
    let directives = Directives::from_json(params)
        .map_err(|source| std::io::Error::new(std::io::ErrorKind::InvalidData, source))?;
    let Some(relation) = env.get(source) else { return Ok(()) };
    if directives.io == IoKind::StdoutPrintSize || directives.operation == DirectiveOperation::PrintSize {
        println!("{}: {}", directives.name, relation.size());
        return Ok(());
    }
    let rows: Vec<StoredTuple> = relation.iter_all().collect();
    env.reader_writer.write(&directives, &rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::models::ir_r::{CompareOp, Condition};
    use crate::models::relation::{ColumnType, RelationRef};

    fn env_with_edges() -> RelationEnv {
        let env = RelationEnv::new(Config::default());
        env.create(RelationRef::new("edge", vec![ColumnType::Signed, ColumnType::Signed]), vec![]);
        env.create(RelationRef::new("path", vec![ColumnType::Signed, ColumnType::Signed]), vec![]);
        let edge = env.get("edge").unwrap();
        edge.insert(Arc::from(vec![Value::Signed(1), Value::Signed(2)]));
        edge.insert(Arc::from(vec![Value::Signed(2), Value::Signed(3)]));
        env
    }

    #[test]
    fn insert_projects_a_scan_into_the_target_relation() {
        let env = env_with_edges();
        let operation = Operation::Scan {
            relation: Arc::from("edge"),
            level: 0,
            then: Box::new(Operation::Project {
                values: vec![
                    Expression::TupleElement { level: 0, column: 0 },
                    Expression::TupleElement { level: 0, column: 1 },
                ],
            }),
        };
        eval_statement(&Statement::Insert { target: Arc::from("path"), operation }, &env);
        assert_eq!(env.get("path").unwrap().size(), 2);
    }

    #[test]
    fn filter_drops_non_matching_rows() {
        let env = env_with_edges();
        let operation = Operation::Scan {
            relation: Arc::from("edge"),
            level: 0,
            then: Box::new(Operation::Filter {
                condition: Condition::Compare {
                    op: CompareOp::Eq,
                    lhs: Expression::TupleElement { level: 0, column: 0 },
                    rhs: Expression::Constant(Value::Signed(1)),
                },
                then: Box::new(Operation::Project {
                    values: vec![Expression::TupleElement { level: 0, column: 1 }],
                }),
            }),
        };
        env.create(RelationRef::new("out", vec![ColumnType::Signed]), vec![]);
        eval_statement(&Statement::Insert { target: Arc::from("out"), operation }, &env);
        assert_eq!(env.get("out").unwrap().size(), 1);
    }

    #[test]
    fn loop_runs_until_the_watched_relation_stops_growing() {
        let env = env_with_edges();
        env.create(RelationRef::new("closure", vec![ColumnType::Signed, ColumnType::Signed]), vec![]);
        let copy_edge = Statement::Insert {
            target: Arc::from("closure"),
            operation: Operation::Scan {
                relation: Arc::from("edge"),
                level: 0,
                then: Box::new(Operation::Project {
                    values: vec![
                        Expression::TupleElement { level: 0, column: 0 },
                        Expression::TupleElement { level: 0, column: 1 },
                    ],
                }),
            },
        };
        eval_statement(
            &Statement::Loop { watch: vec![Arc::from("closure")], body: Box::new(copy_edge) },
            &env,
        );
        assert_eq!(env.get("closure").unwrap().size(), 2);
    }

    #[test]
    fn count_aggregate_binds_the_row_count() {
        let env = env_with_edges();
        env.create(RelationRef::new("total", vec![ColumnType::Signed]), vec![]);
        let body = Operation::Scan {
            relation: Arc::from("edge"),
            level: 1,
            then: Box::new(Operation::Project { values: vec![] }),
        };
        let operation = Operation::Aggregate {
            op: AggregateOp::Count,
            target: Expression::Undefined,
            body: Box::new(body),
            level: 0,
            then: Box::new(Operation::Project {
                values: vec![Expression::TupleElement { level: 0, column: 0 }],
            }),
        };
        eval_statement(&Statement::Insert { target: Arc::from("total"), operation }, &env);
        let total = env.get("total").unwrap();
        assert!(total.contains(&[Value::Signed(2)]));
    }

    #[test]
    fn max_aggregate_skips_then_when_body_is_empty() {
        let env = RelationEnv::new(Config::default());
        env.create(RelationRef::new("empty", vec![ColumnType::Signed]), vec![]);
        env.create(RelationRef::new("out", vec![ColumnType::Signed]), vec![]);
        let body = Operation::Scan {
            relation: Arc::from("empty"),
            level: 1,
            then: Box::new(Operation::Project { values: vec![] }),
        };
        let operation = Operation::Aggregate {
            op: AggregateOp::Max,
            target: Expression::TupleElement { level: 1, column: 0 },
            body: Box::new(body),
            level: 0,
            then: Box::new(Operation::Project {
                values: vec![Expression::TupleElement { level: 0, column: 0 }],
            }),
        };
        eval_statement(&Statement::Insert { target: Arc::from("out"), operation }, &env);
        assert!(env.get("out").unwrap().empty());
    }

    #[test]
    fn a_fatal_statement_short_circuits_the_rest_of_a_sequence() {
        let env = env_with_edges();
        env.create(RelationRef::new("out", vec![ColumnType::Signed]), vec![]);
        let failing = Statement::Insert {
            target: Arc::from("out"),
            operation: Operation::Scan {
                relation: Arc::from("edge"),
                level: 0,
                then: Box::new(Operation::Project {
                    values: vec![Expression::UserFunctor {
                        name: Arc::from("frobnicate"),
                        args: vec![],
                        returns_symbol: false,
                    }],
                }),
            },
        };
        let then_ok = Statement::Insert {
            target: Arc::from("out"),
            operation: Operation::Scan {
                relation: Arc::from("edge"),
                level: 0,
                then: Box::new(Operation::Project {
                    values: vec![Expression::TupleElement { level: 0, column: 0 }],
                }),
            },
        };
        eval_statement(&Statement::Sequence(vec![failing, then_ok]), &env);
        assert!(env.diagnostics.has_fatal());
        // `then_ok` never ran -- every row in `out` came from the failing
        // statement's own scan, each a `Value::Undefined` sentinel, not the
        // real tuple-element values `then_ok` would have projected.
        let out = env.get("out").unwrap();
        assert!(out.iter_all().all(|row| row[0] == Value::Undefined));
    }

    #[test]
    fn unpack_record_silently_skips_a_nil_record() {
        let env = RelationEnv::new(Config::default());
        env.create(RelationRef::new("packed", vec![ColumnType::Record]), vec![]);
        env.create(RelationRef::new("out", vec![ColumnType::Signed]), vec![]);
        env.get("packed").unwrap().insert(Arc::from(vec![Value::Unsigned(0)]));
        let operation = Operation::Scan {
            relation: Arc::from("packed"),
            level: 0,
            then: Box::new(Operation::UnpackRecord {
                source: Expression::TupleElement { level: 0, column: 0 },
                arity: 2,
                level: 1,
                then: Box::new(Operation::Project {
                    values: vec![Expression::TupleElement { level: 1, column: 0 }],
                }),
            }),
        };
        eval_statement(&Statement::Insert { target: Arc::from("out"), operation }, &env);
        assert!(env.get("out").unwrap().empty());
    }
}
