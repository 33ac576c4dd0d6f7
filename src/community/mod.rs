//! Community detection on interaction graphs.
//!
//! Both algorithms optimize modularity
//!
//! ```text
//! Q = (1/2m) Σ_ij [A_ij - γ k_i k_j / 2m] δ(c_i, c_j)
//! ```
//!
//! - [`greedy`]: Clauset–Newman–Moore agglomeration. Deterministic.
//! - [`louvain`]: local moving plus aggregation, repeated per level.
//!   Deterministic only when seeded.
//!
//! Directed graphs are analysed through their undirected projection;
//! reciprocal replies add up into one heavier tie.
//!
//! Community ids are dense and ordered by community size, largest first,
//! with ties going to the community holding the smallest agent key.

mod greedy;
mod louvain;

pub use greedy::GreedyModularity;
pub use louvain::Louvain;

use crate::builder::GraphVariant;
use crate::config::{AnalysisConfig, CommunityAlgorithm};
use crate::graph::InteractionGraph;
use petgraph::EdgeType;
use petgraph::stable_graph::NodeIndex;
use std::collections::HashMap;
use tracing::info;

/// Node → community id for every node of a graph.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Partition {
    membership: HashMap<NodeIndex, usize>,
    communities: Vec<Vec<NodeIndex>>,
}

impl Partition {
    pub fn community_of(&self, idx: NodeIndex) -> Option<usize> {
        self.membership.get(&idx).copied()
    }

    /// Members per community id, each sorted by agent key.
    pub fn communities(&self) -> &[Vec<NodeIndex>] {
        &self.communities
    }

    pub fn community_count(&self) -> usize {
        self.communities.len()
    }

    pub fn len(&self) -> usize {
        self.membership.len()
    }

    pub fn is_empty(&self) -> bool {
        self.membership.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeIndex, usize)> + '_ {
        self.membership.iter().map(|(idx, c)| (*idx, *c))
    }

    /// Builds a partition from per-position labels over `order` (nodes
    /// sorted by key), renumbering labels into the canonical id order.
    pub(crate) fn from_labels(order: &[NodeIndex], labels: &[usize]) -> Self {
        let mut groups: HashMap<usize, Vec<usize>> = HashMap::new();
        for (pos, label) in labels.iter().enumerate() {
            groups.entry(*label).or_default().push(pos);
        }

        // Positions are key-sorted, so each group's first position is its
        // smallest key.
        let mut groups: Vec<Vec<usize>> = groups.into_values().collect();
        groups.sort_by(|a, b| b.len().cmp(&a.len()).then(a[0].cmp(&b[0])));

        let mut membership = HashMap::with_capacity(order.len());
        let mut communities = Vec::with_capacity(groups.len());
        for (id, members) in groups.into_iter().enumerate() {
            let nodes: Vec<NodeIndex> = members.into_iter().map(|pos| order[pos]).collect();
            for idx in &nodes {
                membership.insert(*idx, id);
            }
            communities.push(nodes);
        }

        Partition {
            membership,
            communities,
        }
    }
}

/// Common interface of the detection algorithms.
pub trait CommunityDetection {
    /// Partition `graph`. An empty graph gives an empty partition and an
    /// edgeless graph gives one community per node.
    fn detect<Ty: EdgeType>(&self, graph: &InteractionGraph<Ty>) -> Partition;

    fn resolution(&self) -> f64 {
        1.0
    }
}

/// The detector selected by configuration.
#[derive(Debug, Clone)]
pub enum CommunityDetector {
    Greedy(GreedyModularity),
    Louvain(Louvain),
}

impl CommunityDetector {
    /// The detector for `variant`. A configured algorithm applies to every
    /// variant; otherwise the weighted reply graph gets Louvain and the
    /// other variants get greedy modularity. Edge weights count only for
    /// weighted variants.
    pub fn for_variant(config: &AnalysisConfig, variant: GraphVariant) -> Self {
        let community = &config.community;
        let weighted = variant.is_weighted();
        let algorithm = community.algorithm.unwrap_or(match variant {
            GraphVariant::WeightedReply => CommunityAlgorithm::Louvain,
            _ => CommunityAlgorithm::GreedyModularity,
        });
        match algorithm {
            CommunityAlgorithm::GreedyModularity => CommunityDetector::Greedy(
                GreedyModularity::new()
                    .with_resolution(community.resolution)
                    .with_weighted(weighted),
            ),
            CommunityAlgorithm::Louvain => CommunityDetector::Louvain(
                Louvain::new()
                    .with_resolution(community.resolution)
                    .with_weighted(weighted)
                    .with_seed(community.seed),
            ),
        }
    }

    pub fn algorithm(&self) -> CommunityAlgorithm {
        match self {
            CommunityDetector::Greedy(_) => CommunityAlgorithm::GreedyModularity,
            CommunityDetector::Louvain(_) => CommunityAlgorithm::Louvain,
        }
    }

    pub fn is_weighted(&self) -> bool {
        match self {
            CommunityDetector::Greedy(greedy) => greedy.is_weighted(),
            CommunityDetector::Louvain(louvain) => louvain.is_weighted(),
        }
    }
}

impl CommunityDetection for CommunityDetector {
    fn detect<Ty: EdgeType>(&self, graph: &InteractionGraph<Ty>) -> Partition {
        let partition = match self {
            CommunityDetector::Greedy(greedy) => greedy.detect(graph),
            CommunityDetector::Louvain(louvain) => louvain.detect(graph),
        };
        info!(communities = partition.community_count(), "detected communities");
        partition
    }

    fn resolution(&self) -> f64 {
        match self {
            CommunityDetector::Greedy(greedy) => greedy.resolution(),
            CommunityDetector::Louvain(louvain) => louvain.resolution(),
        }
    }
}

/// Modularity of `partition` over the undirected projection of `graph`.
/// Zero for graphs without edges.
pub fn modularity<Ty: EdgeType>(
    graph: &InteractionGraph<Ty>,
    partition: &Partition,
    resolution: f64,
    weighted: bool,
) -> f64 {
    let order = graph.sorted_nodes();
    let edges = graph.undirected_edge_list(&order, weighted);
    let labels: Vec<usize> = order
        .iter()
        .map(|idx| partition.community_of(*idx).unwrap_or(usize::MAX))
        .collect();
    modularity_of(order.len(), &edges, &[], &labels, resolution)
}

/// Modularity over a dense edge list (`i < j`) with optional self-loop
/// weights, as used on aggregated Louvain levels.
pub(crate) fn modularity_of(
    n: usize,
    edges: &[(usize, usize, f64)],
    self_loops: &[f64],
    labels: &[usize],
    resolution: f64,
) -> f64 {
    let m: f64 = edges.iter().map(|e| e.2).sum::<f64>() + self_loops.iter().sum::<f64>();
    if m == 0.0 {
        return 0.0;
    }

    let mut internal: HashMap<usize, f64> = HashMap::new();
    let mut totals: HashMap<usize, f64> = HashMap::new();
    for &(i, j, w) in edges {
        *totals.entry(labels[i]).or_insert(0.0) += w;
        *totals.entry(labels[j]).or_insert(0.0) += w;
        if labels[i] == labels[j] {
            *internal.entry(labels[i]).or_insert(0.0) += w;
        }
    }
    for (i, &w) in self_loops.iter().enumerate().take(n) {
        *totals.entry(labels[i]).or_insert(0.0) += 2.0 * w;
        *internal.entry(labels[i]).or_insert(0.0) += w;
    }

    totals
        .iter()
        .map(|(label, total)| {
            let inside = internal.get(label).copied().unwrap_or(0.0);
            inside / m - resolution * (total / (2.0 * m)).powi(2)
        })
        .sum()
}
