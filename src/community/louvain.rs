//! Louvain community detection (Blondel et al. 2008).
//!
//! 1. **Local moving**: every node, visited in shuffled order, moves to the
//!    neighboring community with the best modularity gain until a full
//!    pass moves nothing.
//! 2. **Aggregation**: communities become nodes; edges between them are
//!    summed and edges inside them become self-loops.
//!
//! Levels repeat until modularity stops improving. The visiting order is
//! the only source of randomness, so a fixed seed gives a fixed partition.

use super::{CommunityDetection, Partition, modularity_of};
use crate::graph::InteractionGraph;
use petgraph::EdgeType;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{RngCore, SeedableRng, thread_rng};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone)]
pub struct Louvain {
    resolution: f64,
    weighted: bool,
    seed: Option<u64>,
    /// Passes over all nodes per level.
    max_iter: usize,
    max_levels: usize,
    min_modularity_gain: f64,
}

impl Louvain {
    pub fn new() -> Self {
        Louvain {
            resolution: 1.0,
            weighted: false,
            seed: None,
            max_iter: 100,
            max_levels: 10,
            min_modularity_gain: 1e-7,
        }
    }

    /// Higher values produce smaller communities.
    pub fn with_resolution(mut self, resolution: f64) -> Self {
        self.resolution = resolution;
        self
    }

    pub fn with_weighted(mut self, weighted: bool) -> Self {
        self.weighted = weighted;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn with_max_levels(mut self, levels: usize) -> Self {
        self.max_levels = levels;
        self
    }

    pub fn is_weighted(&self) -> bool {
        self.weighted
    }

    /// Phase 1 on one level. Returns the community of each level node and
    /// whether any node moved.
    fn local_moving(
        &self,
        n: usize,
        edges: &[(usize, usize, f64)],
        self_loops: &[f64],
        rng: &mut dyn RngCore,
    ) -> (Vec<usize>, bool) {
        let mut adj: Vec<Vec<(usize, f64)>> = vec![Vec::new(); n];
        for &(i, j, w) in edges {
            adj[i].push((j, w));
            adj[j].push((i, w));
        }

        let m: f64 = edges.iter().map(|e| e.2).sum::<f64>() + self_loops.iter().sum::<f64>();
        if m == 0.0 {
            return ((0..n).collect(), false);
        }

        let mut degrees: Vec<f64> = adj
            .iter()
            .map(|row| row.iter().map(|(_, w)| w).sum())
            .collect();
        for (degree, loop_weight) in degrees.iter_mut().zip(self_loops) {
            *degree += 2.0 * loop_weight;
        }

        let mut communities: Vec<usize> = (0..n).collect();
        let mut totals = degrees.clone();
        let mut visit: Vec<usize> = (0..n).collect();
        visit.shuffle(rng);

        let mut moved = false;
        for _ in 0..self.max_iter {
            let mut improved = false;

            for &node in &visit {
                let current = communities[node];
                let ki = degrees[node];

                let mut links: BTreeMap<usize, f64> = BTreeMap::new();
                for &(neighbor, w) in &adj[node] {
                    *links.entry(communities[neighbor]).or_insert(0.0) += w;
                }

                totals[current] -= ki;
                let gain = |community: usize, weight: f64, totals: &[f64]| {
                    weight / m - self.resolution * totals[community] * ki / (2.0 * m * m)
                };

                let mut best = current;
                let mut best_gain = gain(current, links.get(&current).copied().unwrap_or(0.0), &totals);
                for (&community, &weight) in &links {
                    let candidate = gain(community, weight, &totals);
                    if candidate - best_gain > 1e-12 {
                        best = community;
                        best_gain = candidate;
                    }
                }
                totals[best] += ki;

                if best != current {
                    communities[node] = best;
                    improved = true;
                    moved = true;
                }
            }

            if !improved {
                break;
            }
        }

        (communities, moved)
    }
}

impl Default for Louvain {
    fn default() -> Self {
        Self::new()
    }
}

impl CommunityDetection for Louvain {
    fn detect<Ty: EdgeType>(&self, graph: &InteractionGraph<Ty>) -> Partition {
        let order = graph.sorted_nodes();
        let n = order.len();
        if n == 0 {
            return Partition::default();
        }

        let mut edges = graph.undirected_edge_list(&order, self.weighted);
        let mut self_loops = vec![0.0; n];
        let mut level_n = n;
        // Original node position -> node on the current level.
        let mut assignment: Vec<usize> = (0..n).collect();

        let mut rng: Box<dyn RngCore> = match self.seed {
            Some(seed) => Box::new(StdRng::seed_from_u64(seed)),
            None => Box::new(thread_rng()),
        };

        let mut best_q = modularity_of(n, &edges, &self_loops, &assignment, self.resolution);
        for _ in 0..self.max_levels {
            let (labels, moved) = self.local_moving(level_n, &edges, &self_loops, rng.as_mut());
            if !moved {
                break;
            }

            let q = modularity_of(level_n, &edges, &self_loops, &labels, self.resolution);
            if q - best_q < self.min_modularity_gain {
                break;
            }
            best_q = q;

            let (dense, count) = compact(&labels);
            for node in assignment.iter_mut() {
                *node = dense[*node];
            }
            let (next_edges, next_loops) = aggregate(&edges, &self_loops, &dense, count);
            edges = next_edges;
            self_loops = next_loops;
            level_n = count;
        }

        Partition::from_labels(&order, &assignment)
    }

    fn resolution(&self) -> f64 {
        self.resolution
    }
}

/// Maps arbitrary labels to `0..count` in order of first appearance.
fn compact(labels: &[usize]) -> (Vec<usize>, usize) {
    let mut ids: HashMap<usize, usize> = HashMap::new();
    let dense = labels
        .iter()
        .map(|label| {
            let next = ids.len();
            *ids.entry(*label).or_insert(next)
        })
        .collect();
    (dense, ids.len())
}

/// Phase 2: one node per community. Internal edges fold into self-loops.
fn aggregate(
    edges: &[(usize, usize, f64)],
    self_loops: &[f64],
    community: &[usize],
    count: usize,
) -> (Vec<(usize, usize, f64)>, Vec<f64>) {
    let mut loops = vec![0.0; count];
    for (node, &weight) in self_loops.iter().enumerate() {
        loops[community[node]] += weight;
    }

    let mut between: BTreeMap<(usize, usize), f64> = BTreeMap::new();
    for &(i, j, w) in edges {
        let (ci, cj) = (community[i], community[j]);
        if ci == cj {
            loops[ci] += w;
        } else {
            let key = if ci < cj { (ci, cj) } else { (cj, ci) };
            *between.entry(key).or_insert(0.0) += w;
        }
    }

    let edges = between.into_iter().map(|((i, j), w)| (i, j, w)).collect();
    (edges, loops)
}
