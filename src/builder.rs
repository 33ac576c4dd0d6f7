use crate::config::{AnalysisConfig, NodeIdentity};
use crate::graph::{AgentRef, PersonGraph, ReplyGraph};
use crate::records::{CommentRecord, RecordIndex};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, info};

/// Which interaction graph to derive from the comment records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum GraphVariant {
    /// Directed, child author → parent author.
    Reply,
    /// Undirected reply graph.
    Answer,
    /// Undirected co-participation cliques per thread.
    Discussion,
    /// Undirected, weight = number of replies between the pair.
    #[value(name = "weighted")]
    WeightedReply,
}

impl GraphVariant {
    pub const ALL: [GraphVariant; 4] = [
        GraphVariant::Reply,
        GraphVariant::Answer,
        GraphVariant::Discussion,
        GraphVariant::WeightedReply,
    ];

    pub fn name(self) -> &'static str {
        match self {
            GraphVariant::Reply => "reply",
            GraphVariant::Answer => "answer",
            GraphVariant::Discussion => "discussion",
            GraphVariant::WeightedReply => "weighted_reply",
        }
    }

    pub fn is_directed(self) -> bool {
        matches!(self, GraphVariant::Reply)
    }

    pub fn is_weighted(self) -> bool {
        matches!(self, GraphVariant::WeightedReply)
    }
}

impl fmt::Display for GraphVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A built graph of either directedness.
#[derive(Debug, Clone)]
pub enum AnyGraph {
    Directed(ReplyGraph),
    Undirected(PersonGraph),
}

impl AnyGraph {
    pub fn node_count(&self) -> usize {
        match self {
            AnyGraph::Directed(graph) => graph.node_count(),
            AnyGraph::Undirected(graph) => graph.node_count(),
        }
    }

    pub fn edge_count(&self) -> usize {
        match self {
            AnyGraph::Directed(graph) => graph.edge_count(),
            AnyGraph::Undirected(graph) => graph.edge_count(),
        }
    }
}

/// Derives every graph variant from one immutable record set.
pub struct GraphBuilder<'a> {
    records: &'a [CommentRecord],
    index: &'a RecordIndex,
    identity: NodeIdentity,
    max_thread_size: usize,
}

impl<'a> GraphBuilder<'a> {
    pub fn new(records: &'a [CommentRecord], index: &'a RecordIndex, config: &AnalysisConfig) -> Self {
        GraphBuilder {
            records,
            index,
            identity: config.node_identity,
            max_thread_size: config.max_thread_size,
        }
    }

    pub fn build(&self, variant: GraphVariant) -> AnyGraph {
        match variant {
            GraphVariant::Reply => AnyGraph::Directed(self.reply_graph()),
            GraphVariant::Answer => AnyGraph::Undirected(self.answer_graph()),
            GraphVariant::Discussion => AnyGraph::Undirected(self.discussion_graph()),
            GraphVariant::WeightedReply => AnyGraph::Undirected(self.weighted_reply_graph()),
        }
    }

    /// Edge child → parent for every resolvable reply between two agents.
    pub fn reply_graph(&self) -> ReplyGraph {
        let mut graph = ReplyGraph::new();
        self.for_each_reply(|child, parent| {
            graph.add_interaction(child, parent);
        });
        info!(variant = %GraphVariant::Reply, nodes = graph.node_count(), edges = graph.edge_count(), "built graph");
        graph
    }

    pub fn answer_graph(&self) -> PersonGraph {
        let mut graph = PersonGraph::new();
        self.for_each_reply(|child, parent| {
            graph.add_interaction(parent, child);
        });
        info!(variant = %GraphVariant::Answer, nodes = graph.node_count(), edges = graph.edge_count(), "built graph");
        graph
    }

    /// Repeated replies between a pair raise the edge weight instead of
    /// adding parallel edges.
    pub fn weighted_reply_graph(&self) -> PersonGraph {
        let mut graph = PersonGraph::new();
        self.for_each_reply(|child, parent| {
            graph.record_interaction(child, parent);
        });
        info!(variant = %GraphVariant::WeightedReply, nodes = graph.node_count(), edges = graph.edge_count(), "built graph");
        graph
    }

    /// Clique over the distinct authors of each thread. Threads with more
    /// than `max_thread_size` authors contribute nothing.
    pub fn discussion_graph(&self) -> PersonGraph {
        let mut threads: BTreeMap<&str, BTreeMap<&str, &str>> = BTreeMap::new();
        for record in self.records {
            let author = self.record_agent(record);
            threads
                .entry(record.thread_root())
                .or_default()
                .insert(author.key, author.name);
        }

        let mut graph = PersonGraph::new();
        let mut oversized = 0usize;
        for participants in threads.values() {
            if participants.len() > self.max_thread_size {
                oversized += 1;
                continue;
            }
            let members: Vec<AgentRef<'_>> = participants
                .iter()
                .map(|(key, name)| AgentRef::new(key, name))
                .collect();
            for (i, u) in members.iter().enumerate() {
                for v in &members[i + 1..] {
                    graph.add_interaction(*u, *v);
                }
            }
        }

        if oversized > 0 {
            debug!(oversized, max_thread_size = self.max_thread_size, "skipped oversized threads");
        }
        info!(
            variant = %GraphVariant::Discussion,
            threads = threads.len(),
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "built graph"
        );
        graph
    }

    /// Calls `f(child, parent)` for each reply whose parent resolves to a
    /// different agent.
    fn for_each_reply<F>(&self, mut f: F)
    where
        F: FnMut(AgentRef<'a>, AgentRef<'a>),
    {
        let mut unresolved = 0usize;
        let mut self_replies = 0usize;
        for record in self.records {
            let Some(parent_id) = record.parent_id.as_deref() else {
                continue;
            };
            let Some(parent) = self.comment_agent(parent_id) else {
                unresolved += 1;
                continue;
            };
            let child = self.record_agent(record);
            if child.key == parent.key {
                self_replies += 1;
                continue;
            }
            f(child, parent);
        }
        debug!(unresolved, self_replies, "skipped replies");
    }

    fn record_agent(&self, record: &'a CommentRecord) -> AgentRef<'a> {
        match self.identity {
            NodeIdentity::AgentId => {
                let name = self
                    .index
                    .agent_name(&record.agent_id)
                    .unwrap_or(&record.agent_name);
                AgentRef::new(&record.agent_id, name)
            }
            NodeIdentity::AgentName => AgentRef::new(&record.agent_name, &record.agent_name),
        }
    }

    fn comment_agent(&self, comment_id: &str) -> Option<AgentRef<'a>> {
        match self.identity {
            NodeIdentity::AgentId => {
                let agent_id = self.index.comment_agent(comment_id)?;
                let name = self.index.agent_name(agent_id)?;
                Some(AgentRef::new(agent_id, name))
            }
            NodeIdentity::AgentName => {
                let name = self.index.comment_author(comment_id)?;
                Some(AgentRef::new(name, name))
            }
        }
    }
}
