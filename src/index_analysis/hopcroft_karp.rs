// Hopcroft-Karp maximum bipartite matching. Standard BFS-layering + DFS
// augmenting-path algorithm, O(E * sqrt(V)); used by `chain_cover` to turn
// Dilworth's theorem into a concrete minimum chain decomposition.

const NIL: usize = usize::MAX;

pub struct BipartiteGraph {
    left_size: usize,
    right_size: usize,
    adjacency: Vec<Vec<usize>>,
}

impl BipartiteGraph {
    pub fn new(left_size: usize, right_size: usize) -> Self {
        Self {
            left_size,
            right_size,
            adjacency: vec![Vec::new(); left_size],
        }
    }

    pub fn add_edge(&mut self, left: usize, right: usize) {
        self.adjacency[left].push(right);
    }
}

fn bfs(graph: &BipartiteGraph, match_left: &[usize], match_right: &[usize], dist: &mut [u32]) -> bool {
    let mut queue = std::collections::VecDeque::new();
    for l in 0..graph.left_size {
        if match_left[l] == NIL {
            dist[l] = 0;
            queue.push_back(l);
        } else {
            dist[l] = u32::MAX;
        }
    }
    let mut found_augmenting_path = false;
    while let Some(l) = queue.pop_front() {
        for &r in &graph.adjacency[l] {
            let matched_left = match_right[r];
            if matched_left == NIL {
                found_augmenting_path = true;
            } else if dist[matched_left] == u32::MAX {
                dist[matched_left] = dist[l] + 1;
                queue.push_back(matched_left);
            }
        }
    }
    found_augmenting_path
}

fn dfs(
    graph: &BipartiteGraph,
    l: usize,
    match_left: &mut [usize],
    match_right: &mut [usize],
    dist: &mut [u32],
) -> bool {
    for i in 0..graph.adjacency[l].len() {
        let r = graph.adjacency[l][i];
        let matched_left = match_right[r];
        let advances = matched_left == NIL || (dist[matched_left] == dist[l] + 1 && dfs(graph, matched_left, match_left, match_right, dist));
        if advances {
            match_left[l] = r;
            match_right[r] = l;
            return true;
        }
    }
    dist[l] = u32::MAX;
    false
}

/// Returns the matched `(left, right)` pairs of a maximum matching.
pub fn max_bipartite_matching(graph: &BipartiteGraph) -> Vec<(usize, usize)> {
    let mut match_left = vec![NIL; graph.left_size];
    let mut match_right = vec![NIL; graph.right_size];
    let mut dist = vec![u32::MAX; graph.left_size];

    while bfs(graph, &match_left, &match_right, &mut dist) {
        for l in 0..graph.left_size {
            if match_left[l] == NIL {
                dfs(graph, l, &mut match_left, &mut match_right, &mut dist);
            }
        }
    }

    match_left
        .into_iter()
        .enumerate()
        .filter(|&(_, r)| r != NIL)
        .map(|(l, r)| (l, r))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perfect_matching_on_a_complete_bipartite_graph() {
        let mut g = BipartiteGraph::new(3, 3);
        for l in 0..3 {
            for r in 0..3 {
                g.add_edge(l, r);
            }
        }
        let matching = max_bipartite_matching(&g);
        assert_eq!(matching.len(), 3);
    }

    #[test]
    fn matching_respects_a_chain_shaped_graph() {
        // 0 -> 0, 1 -> 0, 1 -> 1: max matching size 2.
        let mut g = BipartiteGraph::new(2, 2);
        g.add_edge(0, 0);
        g.add_edge(1, 0);
        g.add_edge(1, 1);
        let matching = max_bipartite_matching(&g);
        assert_eq!(matching.len(), 2);
    }

    #[test]
    fn no_edges_means_no_matching() {
        let g = BipartiteGraph::new(2, 2);
        assert!(max_bipartite_matching(&g).is_empty());
    }
}
