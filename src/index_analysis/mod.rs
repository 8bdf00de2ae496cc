// Index analysis: given the set of search signatures a relation is probed
// with, find the minimum set of lex-ordered indexes that covers every
// signature. The partial order on signatures is "is a subset of"
// (`crate::models::relation::is_subset`); by Dilworth's theorem the minimum
// chain cover of that order has size `|signatures| - maximum matching` in
// the bipartite graph of strict order edges, and each chain becomes one
// physical index. Matching uses Hopcroft-Karp, a hand-written matcher in
// the same register as `crate::precedence`'s own graph algorithms.

pub mod hopcroft_karp;
pub mod signatures;

use crate::models::relation::{is_subset, ColumnConstraint, SearchSignature};
use hopcroft_karp::{max_bipartite_matching, BipartiteGraph};

/// One physical index: columns in the order they should be compared, most
/// to least selective, plus the index of the signature (in the original
/// input order) that is its "maximal" member -- the search pattern that
/// exercises every column of the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chain {
    pub signatures: Vec<usize>,
    pub lex_order: Vec<usize>,
}

/// Builds the lexicographic column order for one chain: columns
/// constrained (`Equal` or `Inequal`) in the chain's most specific
/// signature come first, in column order, followed by the remaining
/// columns. `Inequal` columns -- which can only ever be a chain's least
/// specific element, since they have no outgoing order edges
/// (`has_inequality`) -- are placed last among the constrained columns so a
/// range scan only ever needs to look at the final constrained key.
fn lex_order_for(signature: &SearchSignature) -> Vec<usize> {
    let mut equal_cols = Vec::new();
    let mut inequal_cols = Vec::new();
    let mut free_cols = Vec::new();
    for (col, constraint) in signature.iter().enumerate() {
        match constraint {
            ColumnConstraint::Equal => equal_cols.push(col),
            ColumnConstraint::Inequal => inequal_cols.push(col),
            ColumnConstraint::None => free_cols.push(col),
        }
    }
    equal_cols.into_iter().chain(inequal_cols).chain(free_cols).collect()
}

/// Computes a minimum chain cover of `signatures` under the subset partial
/// order, returning one `Chain` per cover element.
pub fn chain_cover(signatures: &[SearchSignature]) -> Vec<Chain> {
    let n = signatures.len();
    if n == 0 {
        return Vec::new();
    }

    // Strict order edge i -> j iff sig[i] ⊊ sig[j] (i is allowed to precede
    // j in a chain, i.e. a search under j's pattern can reuse an index built
    // for i's pattern as a prefix).
    let mut graph = BipartiteGraph::new(n, n);
    for i in 0..n {
        for j in 0..n {
            if i != j && is_subset(&signatures[i], &signatures[j]) && signatures[i] != signatures[j] {
                graph.add_edge(i, j);
            }
        }
    }

    let matching = max_bipartite_matching(&graph);

    // Follow matched left->right edges to assemble chains; a left node with
    // no outgoing match starts a chain only if no right node matched into
    // it either (otherwise it's covered mid-chain).
    let matched_from_right: std::collections::HashMap<usize, usize> =
        matching.iter().map(|&(l, r)| (r, l)).collect();

    let mut chains = Vec::new();
    let mut visited = vec![false; n];
    for start in 0..n {
        if matched_from_right.contains_key(&start) {
            continue; // not a chain head
        }
        let mut members = vec![start];
        visited[start] = true;
        let mut current = start;
        while let Some(&(_, next)) = matching.iter().find(|&&(l, _)| l == current) {
            members.push(next);
            visited[next] = true;
            current = next;
        }
        chains.push(members);
    }
    // Any signature left unvisited (shouldn't happen given the loop above
    // covers every node exactly once) becomes a singleton chain.
    for (idx, seen) in visited.iter().enumerate() {
        if !seen {
            chains.push(vec![idx]);
        }
    }

    chains
        .into_iter()
        .map(|members| {
            let maximal = members
                .iter()
                .max_by_key(|&&m| signatures[m].iter().filter(|c| **c != ColumnConstraint::None).count())
                .copied()
                .unwrap();
            Chain {
                signatures: members,
                lex_order: lex_order_for(&signatures[maximal]),
            }
        })
        .collect()
}
