//! Greedy modularity maximization (Clauset, Newman & Moore 2004).
//!
//! Every node starts alone. At each step the pair of connected communities
//! whose merge raises modularity the most is merged, until no merge helps.
//! Candidate merges live in a max-heap; entries made stale by earlier
//! merges are detected on pop by recomputing their gain.

use super::{CommunityDetection, Partition};
use crate::graph::InteractionGraph;
use petgraph::EdgeType;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BinaryHeap};

#[derive(Debug, Clone)]
pub struct GreedyModularity {
    resolution: f64,
    weighted: bool,
}

impl GreedyModularity {
    pub fn new() -> Self {
        GreedyModularity {
            resolution: 1.0,
            weighted: false,
        }
    }

    pub fn with_resolution(mut self, resolution: f64) -> Self {
        self.resolution = resolution;
        self
    }

    pub fn with_weighted(mut self, weighted: bool) -> Self {
        self.weighted = weighted;
        self
    }

    pub fn is_weighted(&self) -> bool {
        self.weighted
    }

    fn gain(&self, between: f64, a_i: f64, a_j: f64) -> f64 {
        2.0 * (between - self.resolution * a_i * a_j)
    }

    /// Community label per dense node position. `edges` holds `i < j` pairs.
    fn merge_labels(&self, n: usize, edges: &[(usize, usize, f64)]) -> Vec<usize> {
        let total: f64 = edges.iter().map(|e| e.2).sum();
        if total == 0.0 {
            return (0..n).collect();
        }
        let two_m = 2.0 * total;

        // links[i][j]: fraction of edge ends joining communities i and j.
        // a[i]: fraction of edge ends attached to community i.
        let mut links: Vec<BTreeMap<usize, f64>> = vec![BTreeMap::new(); n];
        let mut a = vec![0.0f64; n];
        for &(i, j, w) in edges {
            let share = w / two_m;
            *links[i].entry(j).or_insert(0.0) += share;
            *links[j].entry(i).or_insert(0.0) += share;
            a[i] += share;
            a[j] += share;
        }

        let mut heap = BinaryHeap::new();
        for (i, row) in links.iter().enumerate() {
            for (&j, &between) in row.range(i + 1..) {
                heap.push(Merge {
                    gain: self.gain(between, a[i], a[j]),
                    keep: i,
                    absorb: j,
                });
            }
        }

        let mut members: Vec<Vec<usize>> = (0..n).map(|i| vec![i]).collect();
        while let Some(merge) = heap.pop() {
            if merge.gain <= 0.0 {
                // Every live pair has an entry no larger than this one.
                break;
            }
            let (i, j) = (merge.keep, merge.absorb);
            let Some(&between) = links[i].get(&j) else {
                continue;
            };
            if self.gain(between, a[i], a[j]) != merge.gain {
                continue;
            }

            let absorbed = std::mem::take(&mut links[j]);
            links[i].remove(&j);
            for (k, share) in absorbed {
                if k == i {
                    continue;
                }
                links[k].remove(&j);
                *links[i].entry(k).or_insert(0.0) += share;
                *links[k].entry(i).or_insert(0.0) += share;
            }
            a[i] += a[j];
            a[j] = 0.0;
            let moved = std::mem::take(&mut members[j]);
            members[i].extend(moved);

            for (&k, &between) in &links[i] {
                heap.push(Merge {
                    gain: self.gain(between, a[i], a[k]),
                    keep: i.min(k),
                    absorb: i.max(k),
                });
            }
        }

        let mut labels = vec![0usize; n];
        for (community, nodes) in members.iter().enumerate() {
            for &node in nodes {
                labels[node] = community;
            }
        }
        labels
    }
}

impl Default for GreedyModularity {
    fn default() -> Self {
        Self::new()
    }
}

impl CommunityDetection for GreedyModularity {
    fn detect<Ty: EdgeType>(&self, graph: &InteractionGraph<Ty>) -> Partition {
        let order = graph.sorted_nodes();
        if order.is_empty() {
            return Partition::default();
        }
        let edges = graph.undirected_edge_list(&order, self.weighted);
        let labels = self.merge_labels(order.len(), &edges);
        Partition::from_labels(&order, &labels)
    }

    fn resolution(&self) -> f64 {
        self.resolution
    }
}

/// Heap entry. Larger gain first; equal gains go to the lowest pair.
#[derive(Debug, Clone, Copy)]
struct Merge {
    gain: f64,
    keep: usize,
    absorb: usize,
}

impl Ord for Merge {
    fn cmp(&self, other: &Self) -> Ordering {
        self.gain
            .total_cmp(&other.gain)
            .then_with(|| other.keep.cmp(&self.keep))
            .then_with(|| other.absorb.cmp(&self.absorb))
    }
}

impl PartialOrd for Merge {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Merge {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Merge {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::community::modularity;
    use crate::community::tests::two_triangles;
    use crate::graph::{AgentRef, PersonGraph, ReplyGraph};

    #[test]
    fn splits_two_triangles() {
        let graph = two_triangles();
        let partition = GreedyModularity::new().detect(&graph);
        let c = |key: &str| partition.community_of(graph.node(key).unwrap()).unwrap();

        assert_eq!(partition.community_count(), 2);
        assert_eq!(c("a1"), c("a2"));
        assert_eq!(c("a2"), c("a3"));
        assert_eq!(c("b1"), c("b3"));
        assert_ne!(c("a1"), c("b1"));
        // Equal sizes: the side holding "a1" gets id 0.
        assert_eq!(c("a1"), 0);

        let q = modularity(&graph, &partition, 1.0, false);
        assert!(q > 0.3);
    }

    #[test]
    fn deterministic_across_insertion_order() {
        let forward = two_triangles();
        let mut backward = PersonGraph::new();
        let mut edges: Vec<(String, String)> = forward
            .edges()
            .map(|(s, t, _)| (forward.agent(s).key.clone(), forward.agent(t).key.clone()))
            .collect();
        edges.reverse();
        for (s, t) in &edges {
            backward.add_interaction(AgentRef::new(t, t), AgentRef::new(s, s));
        }

        let p1 = GreedyModularity::new().detect(&forward);
        let p2 = GreedyModularity::new().detect(&backward);
        for (idx, agent) in forward.agents() {
            let other = backward.node(&agent.key).unwrap();
            assert_eq!(p1.community_of(idx), p2.community_of(other));
        }
    }

    #[test]
    fn edgeless_and_empty_graphs() {
        assert!(GreedyModularity::new().detect(&PersonGraph::new()).is_empty());

        let mut graph = PersonGraph::new();
        graph.add_interaction(AgentRef::new("A", "A"), AgentRef::new("B", "B"));
        graph.retain_edges(|_| false);
        let partition = GreedyModularity::new().detect(&graph);
        assert_eq!(partition.community_count(), 2);
    }

    #[test]
    fn directed_graph_uses_projection() {
        let mut graph = ReplyGraph::new();
        graph.add_interaction(AgentRef::new("A", "A"), AgentRef::new("B", "B"));
        graph.add_interaction(AgentRef::new("B", "B"), AgentRef::new("A", "A"));
        graph.add_interaction(AgentRef::new("C", "C"), AgentRef::new("D", "D"));
        let partition = GreedyModularity::new().detect(&graph);
        assert_eq!(partition.community_count(), 2);
        assert_eq!(partition.len(), 4);
    }

    #[test]
    fn high_resolution_keeps_nodes_apart() {
        let graph = two_triangles();
        let partition = GreedyModularity::new().with_resolution(10.0).detect(&graph);
        assert_eq!(partition.community_count(), graph.node_count());
    }
}
