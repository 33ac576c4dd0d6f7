//! Post-construction filtering.
//!
//! Steps run in a fixed order: degree filter, weight filter (with isolate
//! removal), largest component. Each one is optional.

use crate::builder::GraphVariant;
use crate::config::AnalysisConfig;
use crate::graph::InteractionGraph;
use petgraph::EdgeType;
use petgraph::stable_graph::NodeIndex;
use std::collections::HashSet;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GraphCleaner {
    min_degree: Option<usize>,
    min_edge_weight: Option<u32>,
    largest_component: bool,
}

/// Node and edge counts around a cleaning run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CleaningSummary {
    pub nodes_before: usize,
    pub edges_before: usize,
    pub nodes_after: usize,
    pub edges_after: usize,
}

impl GraphCleaner {
    /// A cleaner that does nothing until steps are enabled.
    pub fn new() -> Self {
        Self::default()
    }

    /// The plan each variant's analysis has always used: the person graphs
    /// are degree-filtered, the weighted graph is weight-filtered, and all
    /// of them are cut down to their largest component.
    pub fn for_variant(variant: GraphVariant, config: &AnalysisConfig) -> Self {
        let cleaner = GraphCleaner::new().with_largest_component(true);
        match variant {
            GraphVariant::Reply => cleaner,
            GraphVariant::Answer | GraphVariant::Discussion => {
                cleaner.with_min_degree(config.min_degree_filter)
            }
            GraphVariant::WeightedReply => cleaner.with_min_edge_weight(config.min_edge_weight),
        }
    }

    pub fn with_min_degree(mut self, min_degree: usize) -> Self {
        self.min_degree = Some(min_degree);
        self
    }

    pub fn with_min_edge_weight(mut self, min_edge_weight: u32) -> Self {
        self.min_edge_weight = Some(min_edge_weight);
        self
    }

    pub fn with_largest_component(mut self, enabled: bool) -> Self {
        self.largest_component = enabled;
        self
    }

    pub fn clean<Ty: EdgeType>(&self, graph: &mut InteractionGraph<Ty>) -> CleaningSummary {
        let nodes_before = graph.node_count();
        let edges_before = graph.edge_count();

        if let Some(min_degree) = self.min_degree {
            filter_by_degree(graph, min_degree);
        }
        if let Some(min_edge_weight) = self.min_edge_weight {
            filter_by_weight(graph, min_edge_weight);
        }
        if self.largest_component {
            keep_largest_component(graph);
        }

        let summary = CleaningSummary {
            nodes_before,
            edges_before,
            nodes_after: graph.node_count(),
            edges_after: graph.edge_count(),
        };
        info!(
            nodes = summary.nodes_after,
            edges = summary.edges_after,
            removed_nodes = nodes_before - summary.nodes_after,
            "cleaned graph"
        );
        summary
    }
}

/// Removes every node whose degree is below `min_degree`, judged on the
/// degrees before any removal. This is one pass, not a fixpoint: a node can
/// fall below the threshold because a neighbor was removed and still stay.
pub fn filter_by_degree<Ty: EdgeType>(graph: &mut InteractionGraph<Ty>, min_degree: usize) -> usize {
    let low: Vec<NodeIndex> = graph
        .node_indices()
        .filter(|idx| graph.degree(*idx) < min_degree)
        .collect();
    graph.remove_agents(low)
}

/// Drops edges lighter than `min_edge_weight`, then the nodes left without
/// edges. Returns `(edges_removed, nodes_removed)`.
pub fn filter_by_weight<Ty: EdgeType>(
    graph: &mut InteractionGraph<Ty>,
    min_edge_weight: u32,
) -> (usize, usize) {
    let edges = graph.retain_edges(|weight| weight >= min_edge_weight);
    let nodes = graph.remove_isolates();
    (edges, nodes)
}

/// Keeps only the largest weakly connected component. Equal-sized
/// components are decided in favour of the one holding the smallest agent
/// key. An empty graph is left as is.
pub fn keep_largest_component<Ty: EdgeType>(graph: &mut InteractionGraph<Ty>) -> usize {
    if graph.is_empty() {
        return 0;
    }

    let components = graph.connected_components();
    // Components arrive ordered by smallest key; keep the first of the largest.
    let mut largest = &components[0];
    for component in &components[1..] {
        if component.len() > largest.len() {
            largest = component;
        }
    }

    let keep: HashSet<NodeIndex> = largest.iter().copied().collect();
    let drop: Vec<NodeIndex> = graph
        .node_indices()
        .filter(|idx| !keep.contains(idx))
        .collect();
    graph.remove_agents(drop)
}
