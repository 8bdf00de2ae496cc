// Predicate dependency graph, strongly-connected components and
// stratification. Recursiveness is decided solely by SCC membership: a
// relation is recursive iff its own SCC contains more than one relation, or
// it has a self-edge -- there is no separate "explicitly declared
// recursive" concept. Built over relation-level nodes since IR-A clauses
// (not whole rules) are the translation unit here.

use crate::models::ir_a::{LiteralA, Program};
use crate::models::relation::RelationId;
use ahash::AHashMap;
use petgraph::algo::kosaraju_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;

#[derive(Debug)]
pub struct DependencyGraph {
    graph: DiGraph<RelationId, bool>,
    index_of: AHashMap<RelationId, NodeIndex>,
}

impl DependencyGraph {
    /// Builds one node per relation that appears as a clause head, with an
    /// edge `body -> head` for every positive or negative occurrence of
    /// `body` in the clause's literals. Edge weight is `true` for a negated
    /// occurrence.
    pub fn build(program: &Program) -> Self {
        let mut graph = DiGraph::new();
        let mut index_of: AHashMap<RelationId, NodeIndex> = AHashMap::new();

        let mut node_for = |graph: &mut DiGraph<RelationId, bool>,
                             index_of: &mut AHashMap<RelationId, NodeIndex>,
                             relation: &RelationId| {
            *index_of
                .entry(relation.clone())
                .or_insert_with(|| graph.add_node(relation.clone()))
        };

        for clause in &program.clauses {
            let head_idx = node_for(&mut graph, &mut index_of, &clause.head.relation);
            for literal in &clause.body {
                let (relation, negated) = match literal {
                    LiteralA::Positive(atom) => (&atom.relation, false),
                    LiteralA::Negative(atom) => (&atom.relation, true),
                    LiteralA::Compare { .. } => continue,
                    LiteralA::Aggregate { aggregate, .. } => {
                        for inner in &aggregate.body {
                            if let LiteralA::Positive(atom) | LiteralA::Negative(atom) = inner {
                                let body_idx = node_for(&mut graph, &mut index_of, &atom.relation);
                                graph.add_edge(body_idx, head_idx, matches!(inner, LiteralA::Negative(_)));
                            }
                        }
                        continue;
                    }
                };
                let body_idx = node_for(&mut graph, &mut index_of, relation);
                graph.add_edge(body_idx, head_idx, negated);
            }
        }

        Self { graph, index_of }
    }

    /// Strongly connected components in reverse-topological evaluation
    /// order: a component only depends on components earlier in this list.
    pub fn strata(&self) -> Vec<Vec<RelationId>> {
        kosaraju_scc(&self.graph)
            .into_iter()
            .map(|scc| scc.into_iter().map(|idx| self.graph[idx].clone()).collect())
            .collect()
    }

    /// A relation is recursive iff its SCC has more than one member or it
    /// has a direct self-edge.
    pub fn is_recursive(&self, relation: &RelationId) -> bool {
        let Some(&idx) = self.index_of.get(relation) else {
            return false;
        };
        if self.graph.find_edge(idx, idx).is_some() {
            return true;
        }
        self.strata()
            .iter()
            .any(|scc| scc.len() > 1 && scc.contains(relation))
    }

    /// `true` iff no stratum contains a negated edge whose source and
    /// target are both members of that same stratum -- i.e. the program is
    /// stratifiable.
    pub fn is_stratifiable(&self) -> bool {
        for scc in kosaraju_scc(&self.graph) {
            let members: std::collections::HashSet<_> = scc.iter().copied().collect();
            for &node in &scc {
                for edge in self.graph.edges_directed(node, petgraph::Direction::Outgoing) {
                    if *edge.weight() && members.contains(&edge.target()) {
                        return false;
                    }
                }
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ir_a::{AtomA, ClauseA};

    fn atom(relation: &str) -> AtomA {
        AtomA {
            relation: RelationId::from(relation),
            args: vec![],
        }
    }

    #[test]
    fn mutually_recursive_relations_share_a_stratum() {
        let program = Program {
            clauses: vec![
                ClauseA {
                    head: atom("even"),
                    body: vec![LiteralA::Positive(atom("odd"))],
                },
                ClauseA {
                    head: atom("odd"),
                    body: vec![LiteralA::Positive(atom("even"))],
                },
            ],
            outputs: vec![],
            plan: None,
        };
        let graph = DependencyGraph::build(&program);
        assert!(graph.is_recursive(&RelationId::from("even")));
        assert!(graph.is_recursive(&RelationId::from("odd")));
    }

    #[test]
    fn acyclic_chain_is_not_recursive() {
        let program = Program {
            clauses: vec![
                ClauseA {
                    head: atom("b"),
                    body: vec![LiteralA::Positive(atom("a"))],
                },
                ClauseA {
                    head: atom("c"),
                    body: vec![LiteralA::Positive(atom("b"))],
                },
            ],
            outputs: vec![],
            plan: None,
        };
        let graph = DependencyGraph::build(&program);
        assert!(!graph.is_recursive(&RelationId::from("b")));
        assert!(!graph.is_recursive(&RelationId::from("c")));
        assert!(graph.is_stratifiable());
    }

    #[test]
    fn negation_within_a_recursive_scc_is_unstratifiable() {
        let program = Program {
            clauses: vec![
                ClauseA {
                    head: atom("p"),
                    body: vec![LiteralA::Negative(atom("q"))],
                },
                ClauseA {
                    head: atom("q"),
                    body: vec![LiteralA::Positive(atom("p"))],
                },
            ],
            outputs: vec![],
            plan: None,
        };
        let graph = DependencyGraph::build(&program);
        assert!(!graph.is_stratifiable());
    }
}
