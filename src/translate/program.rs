// Program translator: whole IR-A program -> one IR-R `Statement`. Strata
// come from `crate::precedence`; each stratum becomes either a flat
// sequence of inserts (non-recursive) or a semi-naive fixpoint loop
// (recursive).

use crate::models::ir_a::{AtomA, ClauseA, LiteralA, Program};
use crate::models::ir_r::Statement;
use crate::models::relation::RelationId;
use crate::precedence::DependencyGraph;
use crate::translate::clause::translate_clause;
use ahash::AHashSet;
use std::sync::Arc;

pub const DELTA_PREFIX: &str = "delta_";
pub const NEW_PREFIX: &str = "new_";

fn delta_name(relation: &RelationId) -> RelationId {
    Arc::from(format!("{DELTA_PREFIX}{relation}"))
}

fn new_name(relation: &RelationId) -> RelationId {
    Arc::from(format!("{NEW_PREFIX}{relation}"))
}

/// Replaces one positive body occurrence of an in-stratum relation with its
/// `@delta_` counterpart -- one rewritten clause per occurrence. For every
/// later in-stratum body atom `A_k`, adds a `!@delta_{rel(A_k)}` anti-join
/// over the same arguments: without it, a clause with more than one
/// recursive body atom would re-derive the same head tuple once per version
/// within a single iteration, inflating `@new_R` with work already done by
/// an earlier version.
fn delta_variants(clause: &ClauseA, stratum: &AHashSet<RelationId>) -> Vec<ClauseA> {
    let mut variants = Vec::new();
    for (idx, literal) in clause.body.iter().enumerate() {
        if let LiteralA::Positive(atom) = literal {
            if stratum.contains(&atom.relation) {
                let mut rewritten = clause.clone();
                if let LiteralA::Positive(rewritten_atom) = &mut rewritten.body[idx] {
                    rewritten_atom.relation = delta_name(&atom.relation);
                }
                for later in (idx + 1)..clause.body.len() {
                    if let LiteralA::Positive(later_atom) = &clause.body[later] {
                        if stratum.contains(&later_atom.relation) {
                            rewritten.body.push(LiteralA::Negative(AtomA {
                                relation: delta_name(&later_atom.relation),
                                args: later_atom.args.clone(),
                            }));
                        }
                    }
                }
                variants.push(rewritten);
            }
        }
    }
    variants
}

fn is_recursive_clause(clause: &crate::models::ir_a::ClauseA, stratum: &AHashSet<RelationId>) -> bool {
    clause.body.iter().any(|literal| match literal {
        LiteralA::Positive(atom) => stratum.contains(&atom.relation),
        _ => false,
    })
}

fn translate_stratum(program: &Program, stratum: &[RelationId]) -> Statement {
    let members: AHashSet<RelationId> = stratum.iter().cloned().collect();
    let clauses: Vec<_> = program
        .clauses
        .iter()
        .filter(|c| members.contains(&c.head.relation))
        .collect();

    let recursive = members.len() > 1
        || clauses.iter().any(|c| is_recursive_clause(c, &members));

    if !recursive {
        let statements = clauses
            .iter()
            .map(|clause| translate_clause(clause, clause.head.relation.clone()))
            .collect();
        return Statement::Sequence(statements);
    }

    let mut seed = Vec::new();
    let mut delta_init = Vec::new();
    for clause in &clauses {
        if is_recursive_clause(clause, &members) {
            continue;
        }
        seed.push(translate_clause(clause, clause.head.relation.clone()));
        delta_init.push(Statement::Assign {
            target: delta_name(&clause.head.relation),
            source: clause.head.relation.clone(),
        });
    }

    let mut loop_body = Vec::new();
    for clause in &clauses {
        if !is_recursive_clause(clause, &members) {
            continue;
        }
        for variant in delta_variants(clause, &members) {
            loop_body.push(translate_clause(&variant, new_name(&clause.head.relation)));
        }
    }

    let mut merge = Vec::new();
    let mut watch = Vec::new();
    for relation in stratum {
        let new_r = new_name(relation);
        let delta_r = delta_name(relation);
        // new_R \ R first, so delta_R only ever holds genuinely new tuples
        // -- otherwise re-deriving an already-known tuple would keep the
        // fixpoint loop spinning forever.
        merge.push(Statement::Subtract { target: new_r.clone(), source: relation.clone() });
        merge.push(Statement::Clear { target: delta_r.clone() });
        merge.push(Statement::Assign { target: delta_r, source: new_r.clone() });
        merge.push(Statement::Assign { target: relation.clone(), source: new_r.clone() });
        merge.push(Statement::Clear { target: new_r });
        watch.push(relation.clone());
    }

    let mut body = loop_body;
    body.extend(merge);

    let mut prelude = Vec::new();
    for relation in stratum {
        prelude.push(Statement::Clear { target: delta_name(relation) });
        prelude.push(Statement::Clear { target: new_name(relation) });
    }
    prelude.extend(seed);
    prelude.extend(delta_init);

    Statement::Sequence(vec![
        Statement::Sequence(prelude),
        Statement::Loop {
            watch,
            body: Box::new(Statement::Sequence(body)),
        },
    ])
}

/// Translates a whole program into one top-level statement: strata run in
/// dependency order, each either a flat insert sequence or a semi-naive
/// loop, per `crate::precedence`'s recursiveness determination.
pub fn translate_program(program: &Program) -> Statement {
    let graph = DependencyGraph::build(program);
    let mut strata = graph.strata();
    // kosaraju_scc yields components in reverse topological order already
    // matching bottom-up evaluation (sources first); see petgraph docs.
    strata.reverse();

    let statements = strata
        .iter()
        .map(|stratum| translate_stratum(program, stratum))
        .collect();
    Statement::Sequence(statements)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ir_a::{AtomA, ClauseA};

    fn atom(name: &str, arity: usize) -> AtomA {
        AtomA {
            relation: RelationId::from(name),
            args: (0..arity)
                .map(|i| crate::models::ir_a::ArgumentA::Variable(Arc::from(format!("v{i}"))))
                .collect(),
        }
    }

    #[test]
    fn delta_variant_adds_an_anti_join_for_a_later_in_stratum_atom() {
        // sg(x,y) :- edge(x,p), sg(p,q), edge(q,y). -- `sg` recurses twice.
        let clause = ClauseA {
            head: atom("sg", 2),
            body: vec![
                LiteralA::Positive(atom("edge", 2)),
                LiteralA::Positive(atom("sg", 2)),
                LiteralA::Positive(atom("edge", 2)),
            ],
        };
        let stratum: AHashSet<RelationId> = [RelationId::from("sg")].into_iter().collect();
        let variants = delta_variants(&clause, &stratum);
        // Only one in-stratum positive atom (`sg` at index 1) -- one version.
        assert_eq!(variants.len(), 1);
        assert_eq!(variants[0].body.len(), clause.body.len());
    }

    #[test]
    fn delta_variant_anti_joins_a_later_recursive_occurrence() {
        // closure(x,z) :- closure(x,y), closure(y,z). -- two recursive atoms.
        let clause = ClauseA {
            head: atom("closure", 2),
            body: vec![
                LiteralA::Positive(atom("closure", 2)),
                LiteralA::Positive(atom("closure", 2)),
            ],
        };
        let stratum: AHashSet<RelationId> = [RelationId::from("closure")].into_iter().collect();
        let variants = delta_variants(&clause, &stratum);
        assert_eq!(variants.len(), 2);
        // The first version (delta on index 0) must anti-join the second
        // occurrence's delta to avoid double-deriving within one iteration.
        let first = &variants[0];
        assert_eq!(first.body.len(), 3);
        assert!(matches!(&first.body[2], LiteralA::Negative(a) if a.relation.starts_with(DELTA_PREFIX)));
        // The second version (delta on index 1, the last atom) has no later
        // in-stratum atom to anti-join.
        let second = &variants[1];
        assert_eq!(second.body.len(), 2);
    }

    #[test]
    fn transitive_closure_produces_a_loop_for_its_stratum() {
        // path(x,y) :- edge(x,y). path(x,z) :- edge(x,y), path(y,z).
        let program = Program {
            clauses: vec![
                ClauseA { head: atom("path", 2), body: vec![LiteralA::Positive(atom("edge", 2))] },
                ClauseA {
                    head: atom("path", 2),
                    body: vec![
                        LiteralA::Positive(atom("edge", 2)),
                        LiteralA::Positive(atom("path", 2)),
                    ],
                },
            ],
            outputs: vec![RelationId::from("path")],
            plan: None,
        };
        let stmt = translate_program(&program);
        match stmt {
            Statement::Sequence(strata) => {
                assert!(strata.iter().any(|s| matches!(s, Statement::Sequence(inner) if inner.iter().any(|x| matches!(x, Statement::Loop { .. })))));
            }
            _ => panic!("expected a sequence of strata"),
        }
    }
}
