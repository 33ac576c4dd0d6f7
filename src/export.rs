//! Hand-off to renderers: Graphviz DOT files, PNG rendering through the
//! Graphviz command line tools, and flat CSV node/edge tables.

use crate::community::Partition;
use crate::error::{Error, Result};
use crate::graph::{Agent, InteractionGraph};
use crate::roles::{Role, RoleMap};
use crate::stats::{DegreeKind, top_by};
use petgraph::EdgeType;
use petgraph::dot::{Config, Dot};
use petgraph::stable_graph::{NodeIndex, StableGraph};
use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;
use std::process::Command;
use tracing::{debug, info};

/// What the node styling of a DOT file encodes.
#[derive(Debug, Clone, Copy)]
pub enum DotView<'a> {
    Plain,
    Communities(&'a Partition),
    Roles(&'a RoleMap),
    /// Node size follows degree; only the `top_k` highest-degree nodes are
    /// labelled.
    Degree { top_k: usize },
}

fn escape(label: &str) -> String {
    label.replace('\\', "\\\\").replace('"', "\\\"")
}

fn role_color(role: Role) -> &'static str {
    match role {
        Role::Hub => "red",
        Role::Bridge => "orange",
        Role::Peripheral => "lightblue",
    }
}

/// Spreads community hues around the color wheel.
fn community_hue(id: usize) -> f64 {
    (id as f64 * 0.618_033_988_75).fract()
}

pub fn to_dot<Ty: EdgeType>(graph: &InteractionGraph<Ty>, view: DotView<'_>) -> String {
    let labels = graph.display_labels();
    let labelled: HashSet<String> = match view {
        DotView::Degree { top_k } => top_by(graph, DegreeKind::Total, top_k)
            .into_iter()
            .map(|agent| agent.key)
            .collect(),
        _ => HashSet::new(),
    };

    let node_attributes = |_: &StableGraph<Agent, u32, Ty>, (idx, agent): (NodeIndex, &Agent)| {
        let label = escape(&labels[&idx]);
        match view {
            DotView::Plain => format!("label=\"{label}\""),
            DotView::Communities(partition) => match partition.community_of(idx) {
                Some(id) => format!(
                    "label=\"{label}\", style=filled, fillcolor=\"{:.3} 0.5 0.9\"",
                    community_hue(id)
                ),
                None => format!("label=\"{label}\""),
            },
            DotView::Roles(roles) => match roles.role(idx) {
                Some(role) => format!(
                    "label=\"{label}\", style=filled, fillcolor=\"{}\"",
                    role_color(role)
                ),
                None => format!("label=\"{label}\""),
            },
            DotView::Degree { .. } => {
                let size = 0.1 + 0.05 * graph.degree(idx) as f64;
                let shown = if labelled.contains(&agent.key) { label.as_str() } else { "" };
                format!("label=\"{shown}\", width={size:.2}, height={size:.2}, fixedsize=true")
            }
        }
    };

    let dot = Dot::with_attr_getters(
        graph.inner(),
        &[Config::EdgeNoLabel, Config::NodeNoLabel],
        &|_, edge| {
            let weight = *edge.weight();
            if weight > 1 {
                format!("penwidth={:.1}", 1.0 + f64::from(weight).ln())
            } else {
                String::new()
            }
        },
        &node_attributes,
    );
    format!("{:?}", dot)
}

pub fn write_dot<Ty: EdgeType>(
    graph: &InteractionGraph<Ty>,
    view: DotView<'_>,
    path: impl AsRef<Path>,
) -> Result<()> {
    let path = path.as_ref();
    std::fs::write(path, to_dot(graph, view))?;
    debug!(path = %path.display(), "wrote dot file");
    Ok(())
}

/// Lays out `dot_file` with Graphviz `sfdp` and writes a PNG.
/// `layout_iterations` caps the force-directed layout.
pub fn render_png(dot_file: &Path, output_image: &Path, layout_iterations: usize) -> Result<()> {
    let status = Command::new("sfdp")
        .arg("-Tpng")
        .arg(format!("-Gmaxiter={layout_iterations}"))
        .arg(dot_file)
        .arg("-o")
        .arg(output_image)
        .status()
        .map_err(|e| Error::Render(format!("could not run sfdp: {e}")))?;

    if !status.success() {
        return Err(Error::Render(format!(
            "sfdp exited with {status} for {}",
            dot_file.display()
        )));
    }
    info!(path = %output_image.display(), "rendered image");
    Ok(())
}

#[derive(Debug, Serialize)]
struct NodeRow<'a> {
    key: &'a str,
    name: &'a str,
    label: &'a str,
    degree: usize,
    in_degree: usize,
    out_degree: usize,
    community: Option<usize>,
    role: Option<&'static str>,
    betweenness: Option<f64>,
}

#[derive(Debug, Serialize)]
struct EdgeRow<'a> {
    source: &'a str,
    target: &'a str,
    weight: u32,
}

/// One row per node with its degree, community and role. Rows follow key
/// order.
pub fn write_node_table<Ty: EdgeType>(
    graph: &InteractionGraph<Ty>,
    partition: Option<&Partition>,
    roles: Option<&RoleMap>,
    path: impl AsRef<Path>,
) -> Result<()> {
    let labels = graph.display_labels();
    let mut writer = csv::Writer::from_path(path)?;
    for idx in graph.sorted_nodes() {
        let agent = graph.agent(idx);
        writer.serialize(NodeRow {
            key: &agent.key,
            name: &agent.name,
            label: &labels[&idx],
            degree: graph.degree(idx),
            in_degree: graph.in_degree(idx),
            out_degree: graph.out_degree(idx),
            community: partition.and_then(|p| p.community_of(idx)),
            role: roles.and_then(|r| r.role(idx)).map(Role::as_str),
            betweenness: roles.map(|r| r.betweenness().score(idx)),
        })?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_edge_table<Ty: EdgeType>(graph: &InteractionGraph<Ty>, path: impl AsRef<Path>) -> Result<()> {
    let mut rows: Vec<EdgeRow<'_>> = graph
        .edges()
        .map(|(source, target, weight)| EdgeRow {
            source: &graph.agent(source).key,
            target: &graph.agent(target).key,
            weight,
        })
        .collect();
    rows.sort_by(|a, b| (a.source, a.target).cmp(&(b.source, b.target)));

    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::community::{CommunityDetection, GreedyModularity};
    use crate::graph::{AgentRef, PersonGraph, ReplyGraph};
    use crate::roles::RoleClassifier;

    fn sample() -> PersonGraph {
        let mut graph = PersonGraph::new();
        graph.record_interaction(AgentRef::new("a", "Ann \"A\""), AgentRef::new("b", "Bo"));
        graph.record_interaction(AgentRef::new("a", "Ann \"A\""), AgentRef::new("b", "Bo"));
        graph.record_interaction(AgentRef::new("b", "Bo"), AgentRef::new("c", "Cy"));
        graph
    }

    #[test]
    fn dot_escapes_labels_and_styles_views() {
        let graph = sample();
        let plain = to_dot(&graph, DotView::Plain);
        assert!(plain.starts_with("graph {"));
        assert!(plain.contains("label=\"Ann \\\"A\\\"\""));
        assert!(plain.contains("penwidth"));

        let roles = RoleClassifier::new(2, 0.5).classify(&graph);
        let colored = to_dot(&graph, DotView::Roles(&roles));
        assert!(colored.contains("fillcolor=\"red\""));

        let partition = GreedyModularity::new().detect(&graph);
        let communities = to_dot(&graph, DotView::Communities(&partition));
        assert!(communities.contains("style=filled"));

        let degree = to_dot(&graph, DotView::Degree { top_k: 1 });
        assert!(degree.contains("label=\"Bo\""));
        assert!(degree.contains("label=\"\""));
    }

    #[test]
    fn directed_dot_uses_digraph() {
        let mut graph = ReplyGraph::new();
        graph.add_interaction(AgentRef::new("a", "a"), AgentRef::new("b", "b"));
        assert!(to_dot(&graph, DotView::Plain).starts_with("digraph {"));
    }

    #[test]
    fn tables_round_out_to_csv() {
        let graph = sample();
        let roles = RoleClassifier::new(2, 0.5).classify(&graph);
        let dir = tempfile::tempdir().unwrap();
        let nodes = dir.path().join("nodes.csv");
        let edges = dir.path().join("edges.csv");

        write_node_table(&graph, None, Some(&roles), &nodes).unwrap();
        write_edge_table(&graph, &edges).unwrap();

        let node_text = std::fs::read_to_string(&nodes).unwrap();
        let mut lines = node_text.lines();
        assert_eq!(
            lines.next(),
            Some("key,name,label,degree,in_degree,out_degree,community,role,betweenness")
        );
        assert!(lines.next().unwrap().starts_with("a,"));
        assert!(node_text.contains(",Hub,"));

        let edge_text = std::fs::read_to_string(&edges).unwrap();
        assert!(edge_text.contains("a,b,2"));
        assert!(edge_text.contains("b,c,1"));
    }
}
