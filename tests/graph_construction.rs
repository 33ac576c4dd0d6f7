use agent_network::cleaner::{GraphCleaner, filter_by_weight};
use agent_network::config::{AnalysisConfig, NodeIdentity};
use agent_network::{CommentRecord, GraphBuilder, InteractionGraph, RecordIndex};
use petgraph::EdgeType;
use proptest::prelude::*;

fn rec(id: &str, parent: Option<&str>, agent: &str) -> CommentRecord {
    CommentRecord::new(id, parent, agent, agent)
}

fn small_thread() -> Vec<CommentRecord> {
    vec![
        rec("c1", None, "A"),
        rec("c2", Some("c1"), "B"),
        rec("c3", Some("c1"), "C"),
        rec("c4", Some("c2"), "A"),
    ]
}

fn edge_set<Ty: EdgeType>(graph: &InteractionGraph<Ty>) -> Vec<(String, String, u32)> {
    let mut edges: Vec<(String, String, u32)> = graph
        .edges()
        .map(|(s, t, w)| {
            let (a, b) = (graph.agent(s).key.clone(), graph.agent(t).key.clone());
            if graph.is_directed() || a <= b { (a, b, w) } else { (b, a, w) }
        })
        .collect();
    edges.sort();
    edges
}

#[test]
fn answer_graph_merges_reverse_replies() {
    let records = small_thread();
    let index = RecordIndex::new(&records);
    let config = AnalysisConfig::default();
    let graph = GraphBuilder::new(&records, &index, &config).answer_graph();

    assert_eq!(graph.edge_count(), 2);
    assert!(graph.has_edge("A", "B"));
    assert!(graph.has_edge("C", "A"));
    assert!(!graph.has_edge("B", "C"));
}

#[test]
fn reply_graph_points_child_to_parent() {
    let records = small_thread();
    let index = RecordIndex::new(&records);
    let config = AnalysisConfig::default();
    let graph = GraphBuilder::new(&records, &index, &config).reply_graph();

    assert_eq!(graph.edge_count(), 3);
    assert!(graph.has_edge("B", "A"));
    assert!(graph.has_edge("C", "A"));
    assert!(graph.has_edge("A", "B"));
    assert!(!graph.has_edge("A", "C"));
}

#[test]
fn discussion_graph_is_a_clique_per_thread() {
    let records = small_thread();
    let index = RecordIndex::new(&records);
    let config = AnalysisConfig::default();
    let graph = GraphBuilder::new(&records, &index, &config).discussion_graph();

    assert_eq!(
        edge_set(&graph),
        vec![
            ("A".to_string(), "B".to_string(), 1),
            ("A".to_string(), "C".to_string(), 1),
            ("B".to_string(), "C".to_string(), 1),
        ]
    );
}

#[test]
fn oversized_threads_add_no_edges() {
    let mut records = Vec::new();
    // Thread "small" has 4 distinct authors, thread "big" has 5.
    records.push(rec("small", None, "s0"));
    for i in 1..4 {
        records.push(rec(&format!("s-reply{i}"), Some("small"), &format!("s{i}")));
    }
    records.push(rec("big", None, "b0"));
    for i in 1..5 {
        records.push(rec(&format!("b-reply{i}"), Some("big"), &format!("b{i}")));
    }

    let index = RecordIndex::new(&records);
    let config = AnalysisConfig {
        max_thread_size: 4,
        ..AnalysisConfig::default()
    };
    let graph = GraphBuilder::new(&records, &index, &config).discussion_graph();

    assert_eq!(graph.edge_count(), 4 * 3 / 2);
    assert!(graph.has_edge("s0", "s3"));
    assert!(!graph.contains_agent("b0"));
}

#[test]
fn weight_counts_replies_and_filter_respects_threshold() {
    let records = vec![
        rec("c1", None, "A"),
        rec("c2", Some("c1"), "B"),
        rec("c3", Some("c2"), "A"),
        rec("c4", Some("c3"), "B"),
    ];
    let index = RecordIndex::new(&records);
    let config = AnalysisConfig::default();
    let builder = GraphBuilder::new(&records, &index, &config);

    let mut graph = builder.weighted_reply_graph();
    assert_eq!(graph.weight("A", "B"), Some(3));
    assert_eq!(filter_by_weight(&mut graph, 2), (0, 0));
    assert_eq!(graph.edge_count(), 1);

    let mut graph = builder.weighted_reply_graph();
    assert_eq!(filter_by_weight(&mut graph, 4), (1, 2));
    assert!(graph.is_empty());
}

#[test]
fn replies_to_unknown_parents_and_self_are_skipped() {
    let records = vec![
        rec("c1", None, "A"),
        rec("c2", Some("c1"), "A"),
        rec("c3", Some("missing"), "B"),
    ];
    let index = RecordIndex::new(&records);
    let config = AnalysisConfig::default();
    let builder = GraphBuilder::new(&records, &index, &config);

    assert!(builder.reply_graph().is_empty());
    assert!(builder.weighted_reply_graph().is_empty());
}

#[test]
fn name_identity_merges_agents_sharing_a_name() {
    let records = vec![
        CommentRecord::new("c1", None, "id-1", "echo"),
        CommentRecord::new("c2", Some("c1"), "id-2", "echo"),
        CommentRecord::new("c3", Some("c1"), "id-3", "nova"),
    ];
    let index = RecordIndex::new(&records);

    let by_id = AnalysisConfig::default();
    let graph = GraphBuilder::new(&records, &index, &by_id).answer_graph();
    assert_eq!(graph.node_count(), 3);

    let by_name = AnalysisConfig {
        node_identity: NodeIdentity::AgentName,
        ..AnalysisConfig::default()
    };
    let graph = GraphBuilder::new(&records, &index, &by_name).answer_graph();
    assert_eq!(graph.node_count(), 2);
    assert!(graph.has_edge("echo", "nova"));
}

#[test]
fn person_graph_cleaning_keeps_dense_core() {
    // A triangle plus a pendant agent hanging off it, and a separate pair.
    let records = vec![
        rec("t1", None, "A"),
        rec("t2", Some("t1"), "B"),
        rec("t3", Some("t2"), "C"),
        rec("t4", Some("t3"), "A"),
        rec("t5", Some("t1"), "D"),
        rec("p1", None, "X"),
        rec("p2", Some("p1"), "Y"),
    ];
    let index = RecordIndex::new(&records);
    let config = AnalysisConfig::default();
    let mut graph = GraphBuilder::new(&records, &index, &config).answer_graph();
    let cleaner = GraphCleaner::for_variant(agent_network::GraphVariant::Answer, &config);
    let summary = cleaner.clean(&mut graph);

    assert_eq!(summary.nodes_before, 6);
    assert_eq!(summary.nodes_after, 3);
    for key in ["A", "B", "C"] {
        assert!(graph.contains_agent(key));
    }
}

fn records_strategy() -> impl Strategy<Value = Vec<CommentRecord>> {
    proptest::collection::vec((0usize..6, proptest::option::of(0usize..40)), 1..40).prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(i, (agent, parent))| {
                let parent = parent.filter(|p| *p < i).map(|p| format!("c{p}"));
                CommentRecord::new(format!("c{i}"), parent.as_deref(), format!("a{agent}"), format!("a{agent}"))
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn graphs_ignore_record_order(
        (records, shuffled) in records_strategy().prop_flat_map(|r| (Just(r.clone()), Just(r).prop_shuffle()))
    ) {
        let config = AnalysisConfig::default();
        let index = RecordIndex::new(&records);
        let shuffled_index = RecordIndex::new(&shuffled);
        let a = GraphBuilder::new(&records, &index, &config);
        let b = GraphBuilder::new(&shuffled, &shuffled_index, &config);

        prop_assert_eq!(edge_set(&a.reply_graph()), edge_set(&b.reply_graph()));
        prop_assert_eq!(edge_set(&a.answer_graph()), edge_set(&b.answer_graph()));
        prop_assert_eq!(edge_set(&a.discussion_graph()), edge_set(&b.discussion_graph()));
        prop_assert_eq!(edge_set(&a.weighted_reply_graph()), edge_set(&b.weighted_reply_graph()));
    }

    #[test]
    fn no_graph_has_self_loops(records in records_strategy()) {
        let config = AnalysisConfig::default();
        let index = RecordIndex::new(&records);
        let builder = GraphBuilder::new(&records, &index, &config);

        for (a, b, _) in edge_set(&builder.reply_graph())
            .into_iter()
            .chain(edge_set(&builder.answer_graph()))
            .chain(edge_set(&builder.discussion_graph()))
            .chain(edge_set(&builder.weighted_reply_graph()))
        {
            prop_assert_ne!(a, b);
        }
    }
}
