//! Read-only summaries of a cleaned graph.

use crate::community::Partition;
use crate::graph::InteractionGraph;
use crate::roles::{RoleCounts, RoleMap};
use petgraph::EdgeType;
use petgraph::stable_graph::NodeIndex;
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BasicStats {
    pub directed: bool,
    pub nodes: usize,
    pub edges: usize,
    /// `2E / (V(V-1))` undirected, `E / (V(V-1))` directed, 0 below two nodes.
    pub density: f64,
    pub average_degree: f64,
}

impl BasicStats {
    pub fn of<Ty: EdgeType>(graph: &InteractionGraph<Ty>) -> Self {
        let nodes = graph.node_count();
        let edges = graph.edge_count();
        let density = if nodes > 1 {
            let possible = (nodes * (nodes - 1)) as f64;
            let factor = if graph.is_directed() { 1.0 } else { 2.0 };
            factor * edges as f64 / possible
        } else {
            0.0
        };
        let average_degree = if nodes > 0 {
            let total: usize = graph.node_indices().map(|idx| graph.degree(idx)).sum();
            total as f64 / nodes as f64
        } else {
            0.0
        };
        BasicStats {
            directed: graph.is_directed(),
            nodes,
            edges,
            density,
            average_degree,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DegreeKind {
    Total,
    In,
    Out,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedAgent {
    pub key: String,
    pub label: String,
    pub value: usize,
}

/// The `k` agents with the highest degree of the given kind, ties broken
/// by key.
pub fn top_by<Ty: EdgeType>(graph: &InteractionGraph<Ty>, kind: DegreeKind, k: usize) -> Vec<RankedAgent> {
    let labels = graph.display_labels();
    let mut ranked: Vec<(NodeIndex, usize)> = graph
        .node_indices()
        .map(|idx| {
            let value = match kind {
                DegreeKind::Total => graph.degree(idx),
                DegreeKind::In => graph.in_degree(idx),
                DegreeKind::Out => graph.out_degree(idx),
            };
            (idx, value)
        })
        .collect();
    ranked.sort_by(|a, b| {
        b.1.cmp(&a.1)
            .then_with(|| graph.agent(a.0).key.cmp(&graph.agent(b.0).key))
    });
    ranked
        .into_iter()
        .take(k)
        .map(|(idx, value)| RankedAgent {
            key: graph.agent(idx).key.clone(),
            label: labels[&idx].clone(),
            value,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommunitySummary {
    pub id: usize,
    pub size: usize,
    pub leader: RankedAgent,
}

/// Per community: size and the member with the highest degree inside the
/// community's own subgraph. Communities with no node left in `graph` are
/// skipped.
pub fn community_summaries<Ty: EdgeType>(
    graph: &InteractionGraph<Ty>,
    partition: &Partition,
) -> Vec<CommunitySummary> {
    let mut internal: HashMap<NodeIndex, usize> = HashMap::new();
    for (source, target, _) in graph.edges() {
        let same = partition
            .community_of(source)
            .zip(partition.community_of(target))
            .is_some_and(|(a, b)| a == b);
        if same {
            *internal.entry(source).or_insert(0) += 1;
            *internal.entry(target).or_insert(0) += 1;
        }
    }

    let labels = graph.display_labels();
    partition
        .communities()
        .iter()
        .enumerate()
        .filter_map(|(id, members)| {
            let present: Vec<NodeIndex> = members
                .iter()
                .copied()
                .filter(|idx| labels.contains_key(idx))
                .collect();
            // Members are key-sorted; the first maximum wins ties.
            let mut leader: Option<(NodeIndex, usize)> = None;
            for idx in &present {
                let degree = internal.get(idx).copied().unwrap_or(0);
                if leader.is_none_or(|(_, best)| degree > best) {
                    leader = Some((*idx, degree));
                }
            }
            let (idx, degree) = leader?;
            Some(CommunitySummary {
                id,
                size: present.len(),
                leader: RankedAgent {
                    key: graph.agent(idx).key.clone(),
                    label: labels[&idx].clone(),
                    value: degree,
                },
            })
        })
        .collect()
}

/// Everything printed for one analysed graph.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphReport {
    pub basic: BasicStats,
    pub top_degree: Vec<RankedAgent>,
    /// Only filled for directed graphs.
    pub top_in_degree: Vec<RankedAgent>,
    pub top_out_degree: Vec<RankedAgent>,
    pub communities: Vec<CommunitySummary>,
    pub roles: Option<RoleCounts>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsReporter {
    top_k: usize,
}

impl StatsReporter {
    pub fn new(top_k: usize) -> Self {
        StatsReporter { top_k }
    }

    pub fn report<Ty: EdgeType>(
        &self,
        graph: &InteractionGraph<Ty>,
        partition: Option<&Partition>,
        roles: Option<&RoleMap>,
    ) -> GraphReport {
        let (top_in_degree, top_out_degree) = if graph.is_directed() {
            (
                top_by(graph, DegreeKind::In, self.top_k),
                top_by(graph, DegreeKind::Out, self.top_k),
            )
        } else {
            (Vec::new(), Vec::new())
        };
        GraphReport {
            basic: BasicStats::of(graph),
            top_degree: top_by(graph, DegreeKind::Total, self.top_k),
            top_in_degree,
            top_out_degree,
            communities: partition
                .map(|p| community_summaries(graph, p))
                .unwrap_or_default(),
            roles: roles.map(RoleMap::counts),
        }
    }
}

impl fmt::Display for BasicStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "BASIC NETWORK STATS")?;
        writeln!(f, "Total Nodes: {}", self.nodes)?;
        writeln!(f, "Total Edges: {}", self.edges)?;
        writeln!(f, "Density: {:.6}", self.density)?;
        write!(f, "Average Degree: {:.3}", self.average_degree)
    }
}

fn write_ranking(
    f: &mut fmt::Formatter<'_>,
    title: &str,
    ranking: &[RankedAgent],
    unit: &str,
) -> fmt::Result {
    writeln!(f)?;
    writeln!(f, "{title}")?;
    for (rank, agent) in ranking.iter().enumerate() {
        writeln!(f, "{}. {} - {} {}", rank + 1, agent.label, agent.value, unit)?;
    }
    Ok(())
}

impl fmt::Display for GraphReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.basic)?;
        write_ranking(f, "TOP HUB AGENTS (BY TOTAL DEGREE)", &self.top_degree, "connections")?;
        if self.basic.directed {
            write_ranking(
                f,
                "MOST REPLIED-TO AGENTS (IN-DEGREE)",
                &self.top_in_degree,
                "replies received",
            )?;
            write_ranking(
                f,
                "MOST ACTIVE REPLYING AGENTS (OUT-DEGREE)",
                &self.top_out_degree,
                "agents replied to",
            )?;
        }
        if !self.communities.is_empty() {
            writeln!(f)?;
            writeln!(f, "COMMUNITY ANALYSIS")?;
            for community in &self.communities {
                writeln!(
                    f,
                    "Community {}: size {}, central agent {} ({} connections)",
                    community.id, community.size, community.leader.label, community.leader.value
                )?;
            }
        }
        if let Some(roles) = &self.roles {
            writeln!(f)?;
            writeln!(f, "STRUCTURAL ROLE SUMMARY")?;
            writeln!(f, "Hubs: {}", roles.hubs)?;
            writeln!(f, "Bridges: {}", roles.bridges)?;
            writeln!(f, "Peripheral: {}", roles.peripheral)?;
        }
        Ok(())
    }
}
