use crate::centrality::{Betweenness, betweenness_centrality};
use crate::config::AnalysisConfig;
use crate::graph::InteractionGraph;
use petgraph::EdgeType;
use petgraph::stable_graph::NodeIndex;
use std::collections::HashMap;
use std::fmt;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Role {
    Hub,
    Bridge,
    Peripheral,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Hub, Role::Bridge, Role::Peripheral];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Hub => "Hub",
            Role::Bridge => "Bridge",
            Role::Peripheral => "Peripheral",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One role per node of the classified graph.
#[derive(Debug, Clone, Default)]
pub struct RoleMap {
    roles: HashMap<NodeIndex, Role>,
    betweenness: Betweenness,
}

impl RoleMap {
    pub fn role(&self, idx: NodeIndex) -> Option<Role> {
        self.roles.get(&idx).copied()
    }

    pub fn len(&self) -> usize {
        self.roles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeIndex, Role)> + '_ {
        self.roles.iter().map(|(idx, role)| (*idx, *role))
    }

    /// The centrality scores the classification was based on.
    pub fn betweenness(&self) -> &Betweenness {
        &self.betweenness
    }

    pub fn counts(&self) -> RoleCounts {
        let mut counts = RoleCounts::default();
        for role in self.roles.values() {
            match role {
                Role::Hub => counts.hubs += 1,
                Role::Bridge => counts.bridges += 1,
                Role::Peripheral => counts.peripheral += 1,
            }
        }
        counts
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RoleCounts {
    pub hubs: usize,
    pub bridges: usize,
    pub peripheral: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoleClassifier {
    hub_threshold: usize,
    bridge_threshold: f64,
}

impl RoleClassifier {
    pub fn new(hub_threshold: usize, bridge_threshold: f64) -> Self {
        RoleClassifier {
            hub_threshold,
            bridge_threshold,
        }
    }

    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self::new(config.hub_threshold, config.bridge_threshold)
    }

    /// Betweenness is computed on `graph` itself, so classify the cleaned
    /// graph rather than the raw one.
    pub fn classify<Ty: EdgeType>(&self, graph: &InteractionGraph<Ty>) -> RoleMap {
        let betweenness = betweenness_centrality(graph);
        let roles: HashMap<NodeIndex, Role> = graph
            .node_indices()
            .map(|idx| (idx, self.role_for(graph.degree(idx), betweenness.score(idx))))
            .collect();

        let map = RoleMap { roles, betweenness };
        let counts = map.counts();
        info!(hubs = counts.hubs, bridges = counts.bridges, peripheral = counts.peripheral, "classified roles");
        map
    }

    /// Degree is checked first: a hub stays a hub whatever its betweenness.
    pub fn role_for(&self, degree: usize, betweenness: f64) -> Role {
        if degree >= self.hub_threshold {
            Role::Hub
        } else if betweenness >= self.bridge_threshold {
            Role::Bridge
        } else {
            Role::Peripheral
        }
    }
}

impl Default for RoleClassifier {
    fn default() -> Self {
        Self::from_config(&AnalysisConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{AgentRef, PersonGraph};

    fn link(graph: &mut PersonGraph, a: &str, b: &str) {
        graph.add_interaction(AgentRef::new(a, a), AgentRef::new(b, b));
    }

    #[test]
    fn hub_takes_priority_over_bridge() {
        let classifier = RoleClassifier::new(3, 0.01);
        assert_eq!(classifier.role_for(3, 0.9), Role::Hub);
        assert_eq!(classifier.role_for(2, 0.9), Role::Bridge);
        assert_eq!(classifier.role_for(2, 0.001), Role::Peripheral);
    }

    #[test]
    fn barbell_roles() {
        // Two triangles joined through "mid": mid and the two attachment
        // points carry all cross traffic.
        let mut graph = PersonGraph::new();
        link(&mut graph, "a1", "a2");
        link(&mut graph, "a2", "a3");
        link(&mut graph, "a1", "a3");
        link(&mut graph, "b1", "b2");
        link(&mut graph, "b2", "b3");
        link(&mut graph, "b1", "b3");
        link(&mut graph, "a3", "mid");
        link(&mut graph, "mid", "b1");

        let roles = RoleClassifier::new(10, 0.1).classify(&graph);
        assert_eq!(roles.len(), graph.node_count());
        assert_eq!(roles.role(graph.node("mid").unwrap()), Some(Role::Bridge));
        assert_eq!(roles.role(graph.node("a3").unwrap()), Some(Role::Bridge));
        assert_eq!(roles.role(graph.node("a1").unwrap()), Some(Role::Peripheral));

        let hubs = RoleClassifier::new(3, 0.1).classify(&graph);
        assert_eq!(hubs.role(graph.node("a3").unwrap()), Some(Role::Hub));
        assert_eq!(hubs.role(graph.node("mid").unwrap()), Some(Role::Bridge));
        assert_eq!(hubs.counts().hubs, 2);
    }

    #[test]
    fn empty_graph_has_no_roles() {
        let roles = RoleClassifier::default().classify(&PersonGraph::new());
        assert!(roles.is_empty());
        assert_eq!(roles.counts(), RoleCounts::default());
    }
}
