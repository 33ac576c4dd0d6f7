//! Betweenness centrality (Brandes 2001).
//!
//! Unweighted shortest paths, O(V·E). Directed graphs follow edge
//! direction. Scores are normalized to the fraction of node pairs, so they
//! fall in [0, 1] for any graph with more than two nodes.

use crate::graph::InteractionGraph;
use petgraph::EdgeType;
use petgraph::stable_graph::NodeIndex;
use rayon::prelude::*;
use std::collections::{HashMap, VecDeque};

/// Sources handled by one rayon task. Partial sums are combined in chunk
/// order, so the result is identical whatever the thread count.
const SOURCES_PER_TASK: usize = 64;

#[derive(Debug, Clone, Default)]
pub struct Betweenness {
    scores: HashMap<NodeIndex, f64>,
}

impl Betweenness {
    /// Zero for nodes that were not part of the computed graph.
    pub fn score(&self, idx: NodeIndex) -> f64 {
        self.scores.get(&idx).copied().unwrap_or(0.0)
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeIndex, f64)> + '_ {
        self.scores.iter().map(|(idx, score)| (*idx, *score))
    }

    pub fn max(&self) -> Option<(NodeIndex, f64)> {
        self.iter().max_by(|a, b| a.1.total_cmp(&b.1))
    }
}

pub fn betweenness_centrality<Ty: EdgeType>(graph: &InteractionGraph<Ty>) -> Betweenness {
    let order = graph.sorted_nodes();
    let n = order.len();
    if n == 0 || graph.edge_count() == 0 {
        return Betweenness {
            scores: order.into_iter().map(|idx| (idx, 0.0)).collect(),
        };
    }

    let successors = graph.successor_lists(&order);
    let sources: Vec<usize> = (0..n).collect();
    let wave = SOURCES_PER_TASK * rayon::current_num_threads().max(1);

    let mut centrality = vec![0.0f64; n];
    for wave_sources in sources.chunks(wave) {
        let partials: Vec<Vec<f64>> = wave_sources
            .par_chunks(SOURCES_PER_TASK)
            .map(|chunk| {
                let mut partial = vec![0.0f64; n];
                for &source in chunk {
                    accumulate_from(&successors, source, &mut partial);
                }
                partial
            })
            .collect();
        for partial in partials {
            for (total, part) in centrality.iter_mut().zip(partial) {
                *total += part;
            }
        }
    }

    // Undirected paths are counted from both ends; halving them and dividing
    // by the (n-1)(n-2)/2 unordered pairs is the same as dividing by the
    // ordered pair count used for directed graphs.
    if n > 2 {
        let scale = 1.0 / ((n - 1) * (n - 2)) as f64;
        for score in &mut centrality {
            *score *= scale;
        }
    }

    Betweenness {
        scores: order.into_iter().zip(centrality).collect(),
    }
}

/// Single-source shortest paths from `source` plus dependency
/// accumulation, added into `centrality`.
fn accumulate_from(successors: &[Vec<usize>], source: usize, centrality: &mut [f64]) {
    let n = successors.len();
    let mut stack: Vec<usize> = Vec::with_capacity(n);
    let mut predecessors: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut sigma = vec![0.0f64; n];
    let mut dist = vec![-1i64; n];
    sigma[source] = 1.0;
    dist[source] = 0;

    let mut queue = VecDeque::new();
    queue.push_back(source);
    while let Some(v) = queue.pop_front() {
        stack.push(v);
        for &w in &successors[v] {
            if dist[w] < 0 {
                dist[w] = dist[v] + 1;
                queue.push_back(w);
            }
            if dist[w] == dist[v] + 1 {
                sigma[w] += sigma[v];
                predecessors[w].push(v);
            }
        }
    }

    let mut delta = vec![0.0f64; n];
    while let Some(w) = stack.pop() {
        for &v in &predecessors[w] {
            delta[v] += sigma[v] / sigma[w] * (1.0 + delta[w]);
        }
        if w != source {
            centrality[w] += delta[w];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{AgentRef, PersonGraph, ReplyGraph};

    fn link<Ty: EdgeType>(graph: &mut InteractionGraph<Ty>, a: &str, b: &str) {
        graph.add_interaction(AgentRef::new(a, a), AgentRef::new(b, b));
    }

    fn score_of<Ty: EdgeType>(graph: &InteractionGraph<Ty>, bc: &Betweenness, key: &str) -> f64 {
        bc.score(graph.node(key).unwrap())
    }

    #[test]
    fn star_center_carries_every_path() {
        let mut graph = PersonGraph::new();
        for leaf in ["a", "b", "c", "d"] {
            link(&mut graph, "hub", leaf);
        }
        let bc = betweenness_centrality(&graph);
        assert!((score_of(&graph, &bc, "hub") - 1.0).abs() < 1e-12);
        assert_eq!(score_of(&graph, &bc, "a"), 0.0);
    }

    #[test]
    fn path_middle_node() {
        // A - B - C: B lies on the only A..C path, normalized over 1 pair.
        let mut graph = PersonGraph::new();
        link(&mut graph, "A", "B");
        link(&mut graph, "B", "C");
        let bc = betweenness_centrality(&graph);
        assert!((score_of(&graph, &bc, "B") - 1.0).abs() < 1e-12);
        assert_eq!(score_of(&graph, &bc, "A"), 0.0);
    }

    #[test]
    fn directed_paths_follow_direction() {
        // A -> B -> C: only the ordered pair (A, C) goes through B, out of
        // (n-1)(n-2) = 2 ordered pairs.
        let mut graph = ReplyGraph::new();
        link(&mut graph, "A", "B");
        link(&mut graph, "B", "C");
        let bc = betweenness_centrality(&graph);
        assert!((score_of(&graph, &bc, "B") - 0.5).abs() < 1e-12);
    }

    #[test]
    fn split_shortest_paths_share_credit() {
        // Square A-B-D and A-C-D: B and C each carry half of the A..D paths.
        let mut graph = PersonGraph::new();
        link(&mut graph, "A", "B");
        link(&mut graph, "A", "C");
        link(&mut graph, "B", "D");
        link(&mut graph, "C", "D");
        let bc = betweenness_centrality(&graph);
        let b = score_of(&graph, &bc, "B");
        let c = score_of(&graph, &bc, "C");
        assert!((b - c).abs() < 1e-12);
        assert!((b - 1.0 / 6.0).abs() < 1e-12);
    }

    #[test]
    fn degenerate_graphs_score_zero() {
        let empty = PersonGraph::new();
        assert!(betweenness_centrality(&empty).is_empty());

        let mut pair = PersonGraph::new();
        link(&mut pair, "A", "B");
        let bc = betweenness_centrality(&pair);
        assert_eq!(bc.len(), 2);
        assert!(bc.iter().all(|(_, score)| score == 0.0));
    }

    #[test]
    fn large_graph_matches_across_chunking() {
        // Long path: interior nodes get 2 * left * right / ((n-1)(n-2)).
        let mut graph = PersonGraph::new();
        let keys: Vec<String> = (0..200).map(|i| format!("n{i:03}")).collect();
        for pair in keys.windows(2) {
            link(&mut graph, &pair[0], &pair[1]);
        }
        let bc = betweenness_centrality(&graph);
        let n = keys.len() as f64;
        let idx = 50usize;
        let left = idx as f64;
        let right = n - idx as f64 - 1.0;
        let expected = 2.0 * left * right / ((n - 1.0) * (n - 2.0));
        assert!((score_of(&graph, &bc, &keys[idx]) - expected).abs() < 1e-9);
    }
}
