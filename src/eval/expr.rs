// Expression and condition evaluation. Pure and effect-free except for
// interning through the symbol/record tables and warnings on the
// diagnostics sink: errors inside expression/condition evaluation bubble
// to the enclosing operation, which treats them as "this tuple does not
// qualify" -- propagation rule:
// nothing here returns `Result`, a malformed regex or out-of-range
// substring just warns and yields a sentinel.

use crate::eval::context::Context;
use crate::eval::env::RelationEnv;
use crate::eval::functors::{call_user_functor, eval_binop, eval_intrinsic};
use crate::models::ir_r::{CompareOp, Condition, Expression};
use crate::models::value::Value;
use regex::Regex;

pub fn eval_expression(expr: &Expression, ctx: &Context, env: &RelationEnv) -> Value {
    match expr {
        Expression::Constant(value) => *value,
        Expression::TupleElement { level, column } => ctx.element(*level, *column),
        Expression::BinOp { op, lhs, rhs } => {
            let l = eval_expression(lhs, ctx, env);
            let r = eval_expression(rhs, ctx, env);
            eval_binop(*op, l, r, &env.diagnostics)
        }
        Expression::Intrinsic { op, args } => {
            let values: Vec<Value> = args.iter().map(|a| eval_expression(a, ctx, env)).collect();
            eval_intrinsic(*op, &values, &env.symbols, &env.diagnostics)
        }
        Expression::PackRecord { fields } => {
            let values: Vec<Value> = fields.iter().map(|f| eval_expression(f, ctx, env)).collect();
            Value::Unsigned(env.records.pack(&values) as u64)
        }
        Expression::UnpackRecord { level, record_column, field_index, arity } => {
            let record_id = ctx.element(*level, *record_column).unsigned_view() as u32;
            if crate::models::record_table::RecordTable::is_nil(record_id) {
                return Value::Undefined;
            }
            let tuple = env.records.unpack(record_id, *arity as u32);
            tuple.get(*field_index).copied().unwrap_or(Value::Undefined)
        }
        Expression::AggregateResult => Value::Undefined,
        Expression::UserFunctor { name, args, returns_symbol } => {
            let values: Vec<Value> = args.iter().map(|a| eval_expression(a, ctx, env)).collect();
            match call_user_functor(env.user_functors.as_ref(), name, &values, *returns_symbol, &env.symbols) {
                Some(v) => v,
                None => {
                    // A missing user-functor symbol is fatal, not a
                    // warning -- latch it and let the tree walker short-circuit.
                    env.diagnostics.fail(format!("unknown user functor `{name}`"));
                    Value::Undefined
                }
            }
        }
        Expression::Undefined => Value::Undefined,
    }
}

fn compare(op: CompareOp, l: Value, r: Value) -> bool {
    match op {
        CompareOp::Eq => l == r,
        CompareOp::Ne => l != r,
        CompareOp::Lt => l < r,
        CompareOp::Le => l <= r,
        CompareOp::Gt => l > r,
        CompareOp::Ge => l >= r,
    }
}

fn resolve_text(value: Value, env: &RelationEnv) -> String {
    match value.symbol_view() {
        Some(id) => env.symbols.resolve(id).to_string(),
        None => value.to_string(),
    }
}

/// Builds the `[lo, hi]` search pattern for an existence/emptiness check:
/// a bound argument contributes its value to both ends, an unbound
/// position is left wildcard -- represented here simply as `None`, with
/// minimum/maximum-domain sentinel expansion happening inside
/// `Relation::range`.
fn eval_pattern(pattern: &[Option<Expression>], ctx: &Context, env: &RelationEnv) -> Vec<Option<Value>> {
    pattern.iter().map(|slot| slot.as_ref().map(|e| eval_expression(e, ctx, env))).collect()
}

pub fn eval_condition(condition: &Condition, ctx: &Context, env: &RelationEnv) -> bool {
    match condition {
        Condition::True => true,
        Condition::Compare { op, lhs, rhs } => {
            compare(*op, eval_expression(lhs, ctx, env), eval_expression(rhs, ctx, env))
        }
        Condition::Match { text, pattern } => {
            let text = resolve_text(eval_expression(text, ctx, env), env);
            let pattern = resolve_text(eval_expression(pattern, ctx, env), env);
            match Regex::new(&pattern) {
                Ok(re) => re.is_match(&text),
                Err(_) => {
                    env.diagnostics.warn(format!("malformed regex `{pattern}`"));
                    false
                }
            }
        }
        Condition::Contains { text, needle } => {
            let text = resolve_text(eval_expression(text, ctx, env), env);
            let needle = resolve_text(eval_expression(needle, ctx, env), env);
            text.contains(&needle)
        }
        Condition::ExistenceCheck { relation, pattern, provenance_floor: _ } => {
            let Some(relation) = env.get(relation) else { return false };
            let values = eval_pattern(pattern, ctx, env);
            if values.iter().all(Option::is_some) {
                let full: Vec<Value> = values.into_iter().map(Option::unwrap).collect();
                relation.contains(&full)
            } else {
                !relation.range(&values).is_empty()
            }
        }
        Condition::EmptinessCheck { relation, pattern } => {
            let Some(relation) = env.get(relation) else { return true };
            if pattern.is_empty() {
                relation.empty()
            } else {
                let values = eval_pattern(pattern, ctx, env);
                relation.range(&values).is_empty()
            }
        }
        Condition::Conjunction(conditions) => conditions.iter().all(|c| eval_condition(c, ctx, env)),
        Condition::Negation(inner) => !eval_condition(inner, ctx, env),
    }
}
