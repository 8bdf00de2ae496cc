// Clause translator: IR-A clause body -> IR-R operation tree, built as
// nested scans directly (Soufflé-style RAM) rather than a
// Cartesian-product-then-join rewrite -- that's the shape `crate::eval`
// actually walks.

use crate::models::ir_a::{
    AggregateA, AggregateOp as AggregateOpA, ArgumentA, AtomA, ClauseA, CompareOp as CompareOpA,
    LiteralA,
};
use crate::models::ir_r::{
    AggregateOp, CompareOp, Condition, Expression, Level, Operation, Statement,
};
use crate::models::relation::RelationId;
use ahash::{AHashMap, AHashSet};
use std::sync::Arc;

/// Tracks where each surface variable is bound as translation descends
/// through nested scans, so later literals can reference earlier bindings
/// by `(level, column)` instead of re-scanning.
#[derive(Default, Clone)]
struct Bindings {
    level_of_column: AHashMap<std::sync::Arc<str>, (Level, usize)>,
}

impl Bindings {
    fn lookup(&self, name: &str) -> Option<(Level, usize)> {
        self.level_of_column.get(name).copied()
    }

    fn bind(&mut self, name: std::sync::Arc<str>, level: Level, column: usize) {
        self.level_of_column.entry(name).or_insert((level, column));
    }
}

fn argument_to_expression(arg: &ArgumentA, bindings: &Bindings) -> Expression {
    match arg {
        ArgumentA::Variable(name) => match bindings.lookup(name) {
            Some((level, column)) => Expression::TupleElement { level, column },
            None => Expression::Undefined,
        },
        ArgumentA::Constant(value) => Expression::Constant(*value),
        ArgumentA::Underscore => Expression::Undefined,
        ArgumentA::BinOp { op, lhs, rhs } => Expression::BinOp {
            op: *op,
            lhs: Box::new(argument_to_expression(lhs, bindings)),
            rhs: Box::new(argument_to_expression(rhs, bindings)),
        },
        ArgumentA::Intrinsic { op, args } => Expression::Intrinsic {
            op: *op,
            args: args.iter().map(|a| argument_to_expression(a, bindings)).collect(),
        },
        ArgumentA::RecordCtor { fields, .. } => Expression::PackRecord {
            fields: fields.iter().map(|a| argument_to_expression(a, bindings)).collect(),
        },
        ArgumentA::UserFunctor { name, args, returns_symbol } => Expression::UserFunctor {
            name: name.clone(),
            args: args.iter().map(|a| argument_to_expression(a, bindings)).collect(),
            returns_symbol: *returns_symbol,
        },
    }
}

fn compare_op(op: CompareOpA) -> Option<CompareOp> {
    match op {
        CompareOpA::Eq => Some(CompareOp::Eq),
        CompareOpA::Ne => Some(CompareOp::Ne),
        CompareOpA::Lt => Some(CompareOp::Lt),
        CompareOpA::Le => Some(CompareOp::Le),
        CompareOpA::Gt => Some(CompareOp::Gt),
        CompareOpA::Ge => Some(CompareOp::Ge),
        CompareOpA::Match | CompareOpA::Contains => None,
    }
}

/// Builds the (pattern, equality-filters) pair for scanning `atom` at
/// `level` given what's already bound. A variable seen for the first time
/// anywhere in the atom becomes a fresh binding (pattern entry `None`); a
/// variable already bound, or a repeated variable within the same atom,
/// becomes an `Equal` pattern entry against its existing expression instead
/// of a free column -- this is exactly the information index analysis turns
/// into a concrete index choice.
fn atom_pattern(
    atom: &AtomA,
    level: Level,
    bindings: &mut Bindings,
) -> (Vec<Option<Expression>>, Vec<Condition>) {
    let mut pattern = Vec::with_capacity(atom.args.len());
    let mut extra_filters = Vec::new();
    let mut first_seen_in_atom: AHashMap<std::sync::Arc<str>, usize> = AHashMap::new();

    for (column, arg) in atom.args.iter().enumerate() {
        match arg {
            ArgumentA::Variable(name) => {
                if let Some((_, _)) = bindings.lookup(name) {
                    let existing = argument_to_expression(arg, bindings);
                    pattern.push(Some(existing));
                } else if let Some(&first_column) = first_seen_in_atom.get(name) {
                    pattern.push(None);
                    extra_filters.push(Condition::Compare {
                        op: CompareOp::Eq,
                        lhs: Expression::TupleElement { level, column: first_column },
                        rhs: Expression::TupleElement { level, column },
                    });
                } else {
                    first_seen_in_atom.insert(name.clone(), column);
                    pattern.push(None);
                }
            }
            ArgumentA::Constant(value) => pattern.push(Some(Expression::Constant(*value))),
            ArgumentA::Underscore => pattern.push(None),
            other => pattern.push(Some(argument_to_expression(other, bindings))),
        }
    }

    for (name, &column) in &first_seen_in_atom {
        bindings.bind(name.clone(), level, column);
    }

    (pattern, extra_filters)
}

fn build_aggregate(agg: &AggregateA, bindings: &Bindings, next_level: Level) -> (AggregateOp, Expression, Operation) {
    let op = match agg.op {
        AggregateOpA::Count => AggregateOp::Count,
        AggregateOpA::Sum => AggregateOp::Sum,
        AggregateOpA::Max => AggregateOp::Max,
        AggregateOpA::Min => AggregateOp::Min,
        AggregateOpA::Mean => AggregateOp::Mean,
    };
    let mut inner_bindings = bindings.clone();
    let body = build_operation(
        &agg.body,
        next_level,
        &mut inner_bindings,
        Operation::Project { values: vec![] },
    );
    let target = argument_to_expression(&agg.target, &inner_bindings);
    (op, target, body)
}

/// Recursively wraps `tail` in scans/filters for each remaining literal,
/// innermost-first.
fn build_operation(
    literals: &[LiteralA],
    level: Level,
    bindings: &mut Bindings,
    tail: Operation,
) -> Operation {
    let Some((literal, rest)) = literals.split_first() else {
        return tail;
    };

    match literal {
        LiteralA::Positive(atom) => {
            let (pattern, extra_filters) = atom_pattern(atom, level, bindings);
            let mut then = build_operation(rest, level + 1, bindings, tail);
            for condition in extra_filters.into_iter().rev() {
                then = Operation::Filter { condition, then: Box::new(then) };
            }
            // An atom with no bound argument at all (every column a fresh
            // variable or a wildcard) gains nothing from an index lookup --
            // emit a plain full scan instead of an IndexScan.
            if pattern.iter().all(Option::is_none) {
                Operation::Scan { relation: atom.relation.clone(), level, then: Box::new(then) }
            } else {
                Operation::IndexScan {
                    relation: atom.relation.clone(),
                    level,
                    pattern,
                    then: Box::new(then),
                }
            }
        }
        LiteralA::Negative(atom) => {
            let pattern: Vec<Option<Expression>> = atom
                .args
                .iter()
                .map(|a| match a {
                    ArgumentA::Underscore => None,
                    other => Some(argument_to_expression(other, bindings)),
                })
                .collect();
            let condition = Condition::Negation(Box::new(Condition::ExistenceCheck {
                relation: atom.relation.clone(),
                pattern,
                provenance_floor: None,
            }));
            let then = build_operation(rest, level, bindings, tail);
            Operation::Filter { condition, then: Box::new(then) }
        }
        LiteralA::Compare { op, lhs, rhs } => {
            let lhs_expr = argument_to_expression(lhs, bindings);
            let rhs_expr = argument_to_expression(rhs, bindings);
            let condition = match op {
                CompareOpA::Match => Condition::Match { text: lhs_expr, pattern: rhs_expr },
                CompareOpA::Contains => Condition::Contains { text: lhs_expr, needle: rhs_expr },
                _ => Condition::Compare {
                    op: compare_op(*op).expect("non-string compare op"),
                    lhs: lhs_expr,
                    rhs: rhs_expr,
                },
            };
            let then = build_operation(rest, level, bindings, tail);
            Operation::Filter { condition, then: Box::new(then) }
        }
        LiteralA::Aggregate { binding, aggregate } => {
            let (op, target, body) = build_aggregate(aggregate, bindings, level + 1);
            bindings.bind(binding.clone(), level, 0);
            let then = build_operation(rest, level + 1, bindings, tail);
            Operation::Aggregate { op, target, body: Box::new(body), level, then: Box::new(then) }
        }
        LiteralA::RecordMatch { source, fields } => {
            let source_expr = argument_to_expression(source, bindings);
            let mut extra_filters = Vec::new();
            for (column, field) in fields.iter().enumerate() {
                match field {
                    ArgumentA::Variable(name) => {
                        if bindings.lookup(name).is_some() {
                            extra_filters.push(Condition::Compare {
                                op: CompareOp::Eq,
                                lhs: Expression::TupleElement { level, column },
                                rhs: argument_to_expression(field, bindings),
                            });
                        } else {
                            bindings.bind(name.clone(), level, column);
                        }
                    }
                    ArgumentA::Constant(value) => extra_filters.push(Condition::Compare {
                        op: CompareOp::Eq,
                        lhs: Expression::TupleElement { level, column },
                        rhs: Expression::Constant(*value),
                    }),
                    _ => {}
                }
            }
            let mut then = build_operation(rest, level + 1, bindings, tail);
            for condition in extra_filters.into_iter().rev() {
                then = Operation::Filter { condition, then: Box::new(then) };
            }
            Operation::UnpackRecord { source: source_expr, arity: fields.len(), level, then: Box::new(then) }
        }
    }
}

fn collect_variables(arg: &ArgumentA, out: &mut AHashSet<Arc<str>>) {
    match arg {
        ArgumentA::Variable(name) => {
            out.insert(name.clone());
        }
        ArgumentA::Constant(_) | ArgumentA::Underscore => {}
        ArgumentA::BinOp { lhs, rhs, .. } => {
            collect_variables(lhs, out);
            collect_variables(rhs, out);
        }
        ArgumentA::Intrinsic { args, .. } | ArgumentA::UserFunctor { args, .. } => {
            for a in args {
                collect_variables(a, out);
            }
        }
        ArgumentA::RecordCtor { fields, .. } => {
            for a in fields {
                collect_variables(a, out);
            }
        }
    }
}

/// Splits a clause body into the indices of its positive atoms (the
/// "generators" that ground fresh variables) and everything else (the
/// comparisons/negations/record-matches that only constrain variables a
/// generator already bound). Translation itself never reorders a body --
/// `build_operation` walks it left to right -- so this split exists purely
/// to make the grounding invariant independently testable via
/// `body_respects_grounding_order` below.
pub fn partition_body(body: &[LiteralA]) -> (Vec<usize>, Vec<usize>) {
    let mut atoms = Vec::new();
    let mut constraints = Vec::new();
    for (idx, literal) in body.iter().enumerate() {
        match literal {
            LiteralA::Positive(_) | LiteralA::Aggregate { .. } | LiteralA::RecordMatch { .. } => {
                atoms.push(idx)
            }
            LiteralA::Negative(_) | LiteralA::Compare { .. } => constraints.push(idx),
        }
    }
    (atoms, constraints)
}

/// Checks the invariant `partition_body` exists to make testable: every
/// constraint literal (negation or comparison) in `body` only references
/// variables already grounded by an earlier literal. A body whose literals
/// were naively reordered (e.g. a comparison hoisted ahead of the atom that
/// binds its variable) would fail this check; `build_operation` itself
/// never produces such a tree since it walks `body` as given; this is a
/// property of the *input* clause, not of the translator.
pub fn body_respects_grounding_order(body: &[LiteralA]) -> bool {
    let mut bound: AHashSet<Arc<str>> = AHashSet::default();
    for literal in body {
        match literal {
            LiteralA::Positive(atom) => {
                for arg in &atom.args {
                    collect_variables(arg, &mut bound);
                }
            }
            LiteralA::Aggregate { binding, .. } => {
                bound.insert(binding.clone());
            }
            LiteralA::RecordMatch { fields, .. } => {
                for arg in fields {
                    collect_variables(arg, &mut bound);
                }
            }
            LiteralA::Negative(atom) => {
                let mut needed = AHashSet::default();
                for arg in &atom.args {
                    collect_variables(arg, &mut needed);
                }
                if !needed.is_subset(&bound) {
                    return false;
                }
            }
            LiteralA::Compare { lhs, rhs, .. } => {
                let mut needed = AHashSet::default();
                collect_variables(lhs, &mut needed);
                collect_variables(rhs, &mut needed);
                if !needed.is_subset(&bound) {
                    return false;
                }
            }
        }
    }
    true
}

/// Translates one IR-A clause into the `Statement::Insert` that derives its
/// head relation, scanning `source_override` instead of the head's own
/// body-atom relations when set -- used by the program translator to swap
/// in `@delta_R` for one body occurrence at a time during semi-naive
/// rewriting.
pub fn translate_clause(clause: &ClauseA, target: RelationId) -> Statement {
    if clause.is_fact() {
        let mut bindings = Bindings::default();
        let values = clause
            .head
            .args
            .iter()
            .map(|a| argument_to_expression(a, &mut bindings))
            .collect();
        return Statement::Insert {
            target,
            operation: Operation::Project { values },
        };
    }

    let mut bindings = Bindings::default();
    let project = Operation::Project {
        values: clause.head.args.iter().map(|_| Expression::Undefined).collect(),
    };
    let body_op = build_operation(&clause.body, 0, &mut bindings, project);

    let values = clause
        .head
        .args
        .iter()
        .map(|a| argument_to_expression(a, &bindings))
        .collect();
    let body_op = replace_head_project(body_op, values);

    Statement::Insert { target, operation: body_op }
}

fn replace_head_project(op: Operation, values: Vec<Expression>) -> Operation {
    match op {
        Operation::Project { .. } => Operation::Project { values },
        Operation::Scan { relation, level, then } => Operation::Scan {
            relation,
            level,
            then: Box::new(replace_head_project(*then, values)),
        },
        Operation::IndexScan { relation, level, pattern, then } => Operation::IndexScan {
            relation,
            level,
            pattern,
            then: Box::new(replace_head_project(*then, values)),
        },
        Operation::Filter { condition, then } => Operation::Filter {
            condition,
            then: Box::new(replace_head_project(*then, values)),
        },
        Operation::Aggregate { op: agg_op, target, body, level, then } => Operation::Aggregate {
            op: agg_op,
            target,
            body,
            level,
            then: Box::new(replace_head_project(*then, values)),
        },
        Operation::UnpackRecord { source, arity, level, then } => Operation::UnpackRecord {
            source,
            arity,
            level,
            then: Box::new(replace_head_project(*then, values)),
        },
        Operation::Return { .. } => Operation::Return { values },
    }
}

/// Replaces every `Project` leaf of `op` with a `Return` leaf collecting
/// `values` -- builds the provenance subproof variant of a clause's
/// operation tree from the ordinary one: the innermost operation becomes
/// a `Return` of every concrete value the body bound.
pub fn replace_tail_with_return(op: Operation, values: Vec<Expression>) -> Operation {
    match op {
        Operation::Project { .. } => Operation::Return { values },
        Operation::Return { .. } => Operation::Return { values },
        Operation::Scan { relation, level, then } => Operation::Scan {
            relation,
            level,
            then: Box::new(replace_tail_with_return(*then, values)),
        },
        Operation::IndexScan { relation, level, pattern, then } => Operation::IndexScan {
            relation,
            level,
            pattern,
            then: Box::new(replace_tail_with_return(*then, values)),
        },
        Operation::Filter { condition, then } => Operation::Filter {
            condition,
            then: Box::new(replace_tail_with_return(*then, values)),
        },
        Operation::Aggregate { op: agg_op, target, body, level, then } => Operation::Aggregate {
            op: agg_op,
            target,
            body,
            level,
            then: Box::new(replace_tail_with_return(*then, values)),
        },
        Operation::UnpackRecord { source, arity, level, then } => Operation::UnpackRecord {
            source,
            arity,
            level,
            then: Box::new(replace_tail_with_return(*then, values)),
        },
    }
}

/// Translates the provenance subproof variant of `clause`: seeds the head
/// variables as bound to the input tuple at level 0, translates the body
/// starting at level 1, and returns one row per body variable actually
/// bound -- the concrete witnesses a caller needs to reconstruct one
/// derivation of the head tuple. The second element is the
/// variable name each returned column corresponds to (sorted, the same
/// order the `Return` leaf emits values in), so callers like
/// `crate::explain` can rebind a witness row back onto the body's atoms.
pub fn translate_subproof(clause: &ClauseA) -> (Operation, Vec<std::sync::Arc<str>>) {
    let mut bindings = Bindings::default();
    for (column, arg) in clause.head.args.iter().enumerate() {
        if let ArgumentA::Variable(name) = arg {
            bindings.bind(name.clone(), 0, column);
        }
    }
    let placeholder = Operation::Return { values: vec![] };
    let body_op = build_operation(&clause.body, 1, &mut bindings, placeholder);

    let mut names: Vec<std::sync::Arc<str>> = bindings.level_of_column.keys().cloned().collect();
    names.sort();
    let values: Vec<Expression> = names
        .iter()
        .map(|name| {
            let (level, column) = bindings.level_of_column[name];
            Expression::TupleElement { level, column }
        })
        .collect();
    (replace_tail_with_return(body_op, values), names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::value::Value;

    fn var(name: &str) -> ArgumentA {
        ArgumentA::Variable(std::sync::Arc::from(name))
    }

    #[test]
    fn fact_translates_to_a_direct_project() {
        let clause = ClauseA {
            head: AtomA {
                relation: RelationId::from("edge"),
                args: vec![ArgumentA::Constant(Value::Signed(1)), ArgumentA::Constant(Value::Signed(2))],
            },
            body: vec![],
        };
        let stmt = translate_clause(&clause, RelationId::from("edge"));
        match stmt {
            Statement::Insert { operation: Operation::Project { values }, .. } => {
                assert_eq!(values.len(), 2);
            }
            _ => panic!("expected a direct project"),
        }
    }

    #[test]
    fn shared_variable_across_atoms_becomes_an_equality_pattern_entry() {
        // path(x, z) :- edge(x, y), edge(y, z).
        let clause = ClauseA {
            head: AtomA {
                relation: RelationId::from("path"),
                args: vec![var("x"), var("z")],
            },
            body: vec![
                LiteralA::Positive(AtomA {
                    relation: RelationId::from("edge"),
                    args: vec![var("x"), var("y")],
                }),
                LiteralA::Positive(AtomA {
                    relation: RelationId::from("edge"),
                    args: vec![var("y"), var("z")],
                }),
            ],
        };
        let stmt = translate_clause(&clause, RelationId::from("path"));
        match stmt {
            // The outer `edge(x, y)` binds two fresh variables -- no column
            // is constrained yet, so it's a plain full scan, not an index
            // lookup.
            Statement::Insert { operation: Operation::Scan { then, .. }, .. } => match *then {
                Operation::IndexScan { pattern, .. } => {
                    assert!(pattern[0].is_some(), "y should be bound from the first scan");
                }
                _ => panic!("expected nested index scan"),
            },
            _ => panic!("expected outer index scan"),
        }
    }

    #[test]
    fn partition_body_separates_atoms_from_constraints() {
        // path(x,z) :- edge(x,y), edge(y,z), x != z.
        let clause_body = vec![
            LiteralA::Positive(AtomA { relation: RelationId::from("edge"), args: vec![var("x"), var("y")] }),
            LiteralA::Positive(AtomA { relation: RelationId::from("edge"), args: vec![var("y"), var("z")] }),
            LiteralA::Compare { op: CompareOpA::Ne, lhs: var("x"), rhs: var("z") },
        ];
        let (atoms, constraints) = partition_body(&clause_body);
        assert_eq!(atoms, vec![0, 1]);
        assert_eq!(constraints, vec![2]);
    }

    #[test]
    fn grounding_order_holds_when_constraints_follow_their_atoms() {
        let clause_body = vec![
            LiteralA::Positive(AtomA { relation: RelationId::from("edge"), args: vec![var("x"), var("y")] }),
            LiteralA::Compare { op: CompareOpA::Ne, lhs: var("x"), rhs: var("y") },
            LiteralA::Negative(AtomA { relation: RelationId::from("blocked"), args: vec![var("x"), var("y")] }),
        ];
        assert!(body_respects_grounding_order(&clause_body));
    }

    #[test]
    fn grounding_order_fails_when_a_constraint_precedes_its_grounding_atom() {
        // x != y appears before anything binds x or y.
        let clause_body = vec![
            LiteralA::Compare { op: CompareOpA::Ne, lhs: var("x"), rhs: var("y") },
            LiteralA::Positive(AtomA { relation: RelationId::from("edge"), args: vec![var("x"), var("y")] }),
        ];
        assert!(!body_respects_grounding_order(&clause_body));
    }
}
