//! Agent interaction graphs.
//!
//! [`InteractionGraph`] wraps a petgraph [`StableGraph`] so that node
//! removal during cleaning keeps every other `NodeIndex` valid. Nodes are
//! [`Agent`]s looked up by their key; every edge carries a `u32` weight
//! (always 1 for the unweighted variants).

use petgraph::stable_graph::{NodeIndex, StableGraph};
use petgraph::unionfind::UnionFind;
use petgraph::visit::{EdgeRef, IntoEdgeReferences};
use petgraph::{Directed, Direction, EdgeType, Undirected};
use std::collections::{BTreeMap, HashMap, HashSet};

/// A node: the agent key the graph is indexed by, plus a display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Agent {
    pub key: String,
    pub name: String,
}

/// Borrowed form used when inserting interactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgentRef<'a> {
    pub key: &'a str,
    pub name: &'a str,
}

impl<'a> AgentRef<'a> {
    pub fn new(key: &'a str, name: &'a str) -> Self {
        AgentRef { key, name }
    }
}

#[derive(Debug, Clone)]
pub struct InteractionGraph<Ty: EdgeType = Undirected> {
    graph: StableGraph<Agent, u32, Ty>,
    index: HashMap<String, NodeIndex>,
}

/// Directed child → parent reply graph.
pub type ReplyGraph = InteractionGraph<Directed>;
/// Undirected person-to-person graph.
pub type PersonGraph = InteractionGraph<Undirected>;

impl<Ty: EdgeType> Default for InteractionGraph<Ty> {
    fn default() -> Self {
        InteractionGraph {
            graph: StableGraph::default(),
            index: HashMap::new(),
        }
    }
}

impl<Ty: EdgeType> InteractionGraph<Ty> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_directed(&self) -> bool {
        Ty::is_directed()
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// The underlying petgraph structure, for renderers and petgraph
    /// algorithms.
    pub fn inner(&self) -> &StableGraph<Agent, u32, Ty> {
        &self.graph
    }

    fn ensure_agent(&mut self, agent: AgentRef<'_>) -> NodeIndex {
        if let Some(&idx) = self.index.get(agent.key) {
            return idx;
        }
        let idx = self.graph.add_node(Agent {
            key: agent.key.to_owned(),
            name: agent.name.to_owned(),
        });
        self.index.insert(agent.key.to_owned(), idx);
        idx
    }

    /// Adds an edge `from -> to` unless it already exists. Self-interactions
    /// are refused and leave the graph untouched.
    pub fn add_interaction(&mut self, from: AgentRef<'_>, to: AgentRef<'_>) -> bool {
        if from.key == to.key {
            return false;
        }
        let a = self.ensure_agent(from);
        let b = self.ensure_agent(to);
        if self.graph.find_edge(a, b).is_none() {
            self.graph.add_edge(a, b, 1);
        }
        true
    }

    /// Like [`add_interaction`](Self::add_interaction) but an existing edge
    /// has its weight incremented.
    pub fn record_interaction(&mut self, from: AgentRef<'_>, to: AgentRef<'_>) -> bool {
        if from.key == to.key {
            return false;
        }
        let a = self.ensure_agent(from);
        let b = self.ensure_agent(to);
        match self.graph.find_edge(a, b) {
            Some(edge) => self.graph[edge] += 1,
            None => {
                self.graph.add_edge(a, b, 1);
            }
        }
        true
    }

    pub fn node(&self, key: &str) -> Option<NodeIndex> {
        self.index.get(key).copied()
    }

    pub fn contains_agent(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    pub fn agent(&self, idx: NodeIndex) -> &Agent {
        &self.graph[idx]
    }

    /// Weight of the edge between two agents, direction-sensitive only for
    /// directed graphs.
    pub fn weight(&self, from: &str, to: &str) -> Option<u32> {
        let a = self.node(from)?;
        let b = self.node(to)?;
        self.graph.find_edge(a, b).map(|edge| self.graph[edge])
    }

    pub fn has_edge(&self, from: &str, to: &str) -> bool {
        self.weight(from, to).is_some()
    }

    /// Total degree: in + out for directed graphs.
    pub fn degree(&self, idx: NodeIndex) -> usize {
        if Ty::is_directed() {
            self.in_degree(idx) + self.out_degree(idx)
        } else {
            self.graph.neighbors(idx).count()
        }
    }

    /// Same as [`degree`](Self::degree) on undirected graphs.
    pub fn in_degree(&self, idx: NodeIndex) -> usize {
        if Ty::is_directed() {
            self.graph
                .neighbors_directed(idx, Direction::Incoming)
                .count()
        } else {
            self.degree(idx)
        }
    }

    /// Same as [`degree`](Self::degree) on undirected graphs.
    pub fn out_degree(&self, idx: NodeIndex) -> usize {
        if Ty::is_directed() {
            self.graph
                .neighbors_directed(idx, Direction::Outgoing)
                .count()
        } else {
            self.degree(idx)
        }
    }

    /// Neighbors regardless of direction, deduplicated.
    pub fn neighbors(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut seen = HashSet::new();
        self.graph
            .neighbors_undirected(idx)
            .filter(|n| seen.insert(*n))
            .collect()
    }

    pub fn node_indices(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.node_indices()
    }

    pub fn agents(&self) -> impl Iterator<Item = (NodeIndex, &Agent)> + '_ {
        self.graph
            .node_indices()
            .map(move |idx| (idx, &self.graph[idx]))
    }

    /// `(source, target, weight)` for every edge.
    pub fn edges(&self) -> impl Iterator<Item = (NodeIndex, NodeIndex, u32)> + '_ {
        self.graph
            .edge_references()
            .map(|edge| (edge.source(), edge.target(), *edge.weight()))
    }

    /// Node indices ordered by agent key. Every algorithm that has to break
    /// ties walks nodes in this order, so results do not depend on the order
    /// records were inserted.
    pub fn sorted_nodes(&self) -> Vec<NodeIndex> {
        let mut nodes: Vec<NodeIndex> = self.graph.node_indices().collect();
        nodes.sort_by(|a, b| self.graph[*a].key.cmp(&self.graph[*b].key));
        nodes
    }

    pub fn remove_agents<I>(&mut self, nodes: I) -> usize
    where
        I: IntoIterator<Item = NodeIndex>,
    {
        let mut removed = 0;
        for idx in nodes {
            if let Some(agent) = self.graph.remove_node(idx) {
                self.index.remove(&agent.key);
                removed += 1;
            }
        }
        removed
    }

    /// Keeps only edges whose weight satisfies `keep`; returns how many
    /// were dropped.
    pub fn retain_edges<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(u32) -> bool,
    {
        let before = self.graph.edge_count();
        self.graph.retain_edges(|g, edge| keep(g[edge]));
        before - self.graph.edge_count()
    }

    pub fn remove_isolates(&mut self) -> usize {
        let isolated: Vec<NodeIndex> = self
            .graph
            .node_indices()
            .filter(|idx| self.graph.neighbors_undirected(*idx).next().is_none())
            .collect();
        self.remove_agents(isolated)
    }

    /// Weakly connected components. Each component is sorted by key and the
    /// components are ordered by their smallest key.
    pub fn connected_components(&self) -> Vec<Vec<NodeIndex>> {
        let order = self.sorted_nodes();
        let position = positions(&order);

        let mut sets = UnionFind::<usize>::new(order.len());
        for (source, target, _) in self.edges() {
            sets.union(position[&source], position[&target]);
        }

        let mut groups: BTreeMap<usize, Vec<NodeIndex>> = BTreeMap::new();
        let mut first_seen: HashMap<usize, usize> = HashMap::new();
        for (pos, idx) in order.iter().enumerate() {
            let root = sets.find(pos);
            let first = *first_seen.entry(root).or_insert(pos);
            groups.entry(first).or_default().push(*idx);
        }
        groups.into_values().collect()
    }

    /// Radius-one neighborhood of `center`, with every edge among those
    /// nodes. Directed graphs reach out along successors only, so agents
    /// that merely replied to `center` are left out. Empty when `center` is
    /// not in the graph.
    pub fn ego_graph(&self, center: NodeIndex) -> Self {
        let mut ego = Self::new();
        if self.graph.node_weight(center).is_none() {
            return ego;
        }

        let mut members: HashSet<NodeIndex> = self
            .graph
            .neighbors_directed(center, Direction::Outgoing)
            .collect();
        members.insert(center);

        let center_agent = &self.graph[center];
        ego.ensure_agent(AgentRef::new(&center_agent.key, &center_agent.name));
        for edge in self.graph.edge_references() {
            if members.contains(&edge.source()) && members.contains(&edge.target()) {
                let from = &self.graph[edge.source()];
                let to = &self.graph[edge.target()];
                let a = ego.ensure_agent(AgentRef::new(&from.key, &from.name));
                let b = ego.ensure_agent(AgentRef::new(&to.key, &to.name));
                ego.graph.add_edge(a, b, *edge.weight());
            }
        }
        ego
    }

    /// Display label per node. Names shared by more than one node get the
    /// key appended so they stay distinguishable.
    pub fn display_labels(&self) -> HashMap<NodeIndex, String> {
        let mut name_counts: HashMap<&str, usize> = HashMap::new();
        for (_, agent) in self.agents() {
            *name_counts.entry(agent.name.as_str()).or_insert(0) += 1;
        }
        self.agents()
            .map(|(idx, agent)| {
                let label = if name_counts[agent.name.as_str()] > 1 {
                    format!("{} ({})", agent.name, agent.key)
                } else {
                    agent.name.clone()
                };
                (idx, label)
            })
            .collect()
    }

    /// Per-node successor lists over `order` positions: outgoing
    /// neighbors for directed graphs, all neighbors otherwise. Lists are
    /// sorted.
    pub(crate) fn successor_lists(&self, order: &[NodeIndex]) -> Vec<Vec<usize>> {
        let position = positions(order);
        order
            .iter()
            .map(|idx| {
                // Undirected graphs report every neighbor as outgoing.
                let mut next: Vec<usize> = self
                    .graph
                    .neighbors_directed(*idx, Direction::Outgoing)
                    .map(|n| position[&n])
                    .collect();
                next.sort_unstable();
                next.dedup();
                next
            })
            .collect()
    }

    /// Undirected edge list over `order` positions with `i < j`. Reciprocal
    /// directed edges collapse into one pair whose weight is their sum.
    /// Unweighted mode counts every edge as 1.
    pub(crate) fn undirected_edge_list(
        &self,
        order: &[NodeIndex],
        weighted: bool,
    ) -> Vec<(usize, usize, f64)> {
        let position = positions(order);
        let mut pairs: BTreeMap<(usize, usize), f64> = BTreeMap::new();
        for (source, target, weight) in self.edges() {
            let (i, j) = (position[&source], position[&target]);
            let key = if i < j { (i, j) } else { (j, i) };
            let w = if weighted { f64::from(weight) } else { 1.0 };
            *pairs.entry(key).or_insert(0.0) += w;
        }
        pairs.into_iter().map(|((i, j), w)| (i, j, w)).collect()
    }
}

pub(crate) fn positions(order: &[NodeIndex]) -> HashMap<NodeIndex, usize> {
    order.iter().enumerate().map(|(pos, idx)| (*idx, pos)).collect()
}
