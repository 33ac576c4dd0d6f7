//! Build → clean → communities, roles and stats → export, per graph variant.

use crate::builder::{AnyGraph, GraphBuilder, GraphVariant};
use crate::cleaner::{CleaningSummary, GraphCleaner};
use crate::community::{CommunityDetection, CommunityDetector, Partition, modularity};
use crate::config::{AnalysisConfig, CommunityAlgorithm};
use crate::error::Result;
use crate::export::{DotView, render_png, write_dot, write_edge_table, write_node_table};
use crate::graph::InteractionGraph;
use crate::records::{CommentRecord, RecordIndex};
use crate::roles::{RoleClassifier, RoleMap};
use crate::stats::{DegreeKind, GraphReport, StatsReporter, top_by};
use petgraph::{Directed, EdgeType, Undirected};
use std::fmt;
use std::path::PathBuf;
use tracing::{info, warn};

/// Results for one non-empty cleaned graph.
#[derive(Debug, Clone)]
pub struct Analysis<Ty: EdgeType> {
    pub variant: GraphVariant,
    pub cleaning: CleaningSummary,
    pub graph: InteractionGraph<Ty>,
    pub algorithm: CommunityAlgorithm,
    pub partition: Partition,
    pub modularity: f64,
    pub roles: RoleMap,
    pub report: GraphReport,
}

#[derive(Debug, Clone)]
pub enum Outcome {
    /// Nothing survived cleaning; downstream steps were skipped.
    Empty {
        variant: GraphVariant,
        cleaning: CleaningSummary,
    },
    Directed(Analysis<Directed>),
    Undirected(Analysis<Undirected>),
}

impl Outcome {
    pub fn variant(&self) -> GraphVariant {
        match self {
            Outcome::Empty { variant, .. } => *variant,
            Outcome::Directed(analysis) => analysis.variant,
            Outcome::Undirected(analysis) => analysis.variant,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Outcome::Empty { .. })
    }

    pub fn report(&self) -> Option<&GraphReport> {
        match self {
            Outcome::Empty { .. } => None,
            Outcome::Directed(analysis) => Some(&analysis.report),
            Outcome::Undirected(analysis) => Some(&analysis.report),
        }
    }
}

pub struct Pipeline {
    config: AnalysisConfig,
}

impl Pipeline {
    pub fn new(config: AnalysisConfig) -> Self {
        Pipeline { config }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn detector(&self, variant: GraphVariant) -> CommunityDetector {
        CommunityDetector::for_variant(&self.config, variant)
    }

    /// Runs every requested variant over the same record index.
    pub fn run_all(&self, records: &[CommentRecord], variants: &[GraphVariant]) -> Vec<Outcome> {
        let index = RecordIndex::new(records);
        info!(comments = index.comment_count(), agents = index.agent_count(), "indexed records");
        let builder = GraphBuilder::new(records, &index, &self.config);
        variants
            .iter()
            .map(|variant| self.run(&builder, *variant))
            .collect()
    }

    pub fn run(&self, builder: &GraphBuilder<'_>, variant: GraphVariant) -> Outcome {
        match builder.build(variant) {
            AnyGraph::Directed(graph) => self.analyze(variant, graph).map_or_else(
                |cleaning| Outcome::Empty { variant, cleaning },
                Outcome::Directed,
            ),
            AnyGraph::Undirected(graph) => self.analyze(variant, graph).map_or_else(
                |cleaning| Outcome::Empty { variant, cleaning },
                Outcome::Undirected,
            ),
        }
    }

    /// Cleans and analyses `graph`. An empty cleaned graph comes back as
    /// `Err` with the cleaning summary.
    fn analyze<Ty: EdgeType>(
        &self,
        variant: GraphVariant,
        mut graph: InteractionGraph<Ty>,
    ) -> std::result::Result<Analysis<Ty>, CleaningSummary> {
        let cleaning = GraphCleaner::for_variant(variant, &self.config).clean(&mut graph);
        if graph.is_empty() {
            warn!(%variant, "graph is empty after cleaning, skipping analysis");
            return Err(cleaning);
        }

        let detector = self.detector(variant);
        let partition = detector.detect(&graph);
        let modularity = modularity(&graph, &partition, detector.resolution(), detector.is_weighted());

        let roles = RoleClassifier::from_config(&self.config).classify(&graph);
        let report = StatsReporter::new(self.config.top_k).report(&graph, Some(&partition), Some(&roles));

        Ok(Analysis {
            variant,
            cleaning,
            graph,
            algorithm: detector.algorithm(),
            partition,
            modularity,
            roles,
            report,
        })
    }

    /// Writes node/edge tables and DOT views under
    /// `results_dir/<variant>/`, optionally rendering each view to PNG.
    /// Returns the files written.
    pub fn export(&self, outcome: &Outcome, render: bool) -> Result<Vec<PathBuf>> {
        match outcome {
            Outcome::Empty { .. } => Ok(Vec::new()),
            Outcome::Directed(analysis) => self.export_analysis(analysis, render),
            Outcome::Undirected(analysis) => self.export_analysis(analysis, render),
        }
    }

    fn export_analysis<Ty: EdgeType>(&self, analysis: &Analysis<Ty>, render: bool) -> Result<Vec<PathBuf>> {
        let dir = self.config.results_dir.join(analysis.variant.name());
        std::fs::create_dir_all(&dir)?;
        let graph = &analysis.graph;

        let mut written = Vec::new();
        let nodes = dir.join("nodes.csv");
        write_node_table(graph, Some(&analysis.partition), Some(&analysis.roles), &nodes)?;
        written.push(nodes);
        let edges = dir.join("edges.csv");
        write_edge_table(graph, &edges)?;
        written.push(edges);

        let mut dots = Vec::new();
        for (name, view) in [
            ("communities", DotView::Communities(&analysis.partition)),
            ("roles", DotView::Roles(&analysis.roles)),
            ("degree", DotView::Degree { top_k: 5 }),
        ] {
            let path = dir.join(format!("{name}.dot"));
            write_dot(graph, view, &path)?;
            dots.push(path);
        }

        let top_hub = top_by(graph, DegreeKind::Total, 1);
        if let Some(center) = top_hub.first().and_then(|top| graph.node(&top.key)) {
            let path = dir.join("ego_top_hub.dot");
            write_dot(&graph.ego_graph(center), DotView::Plain, &path)?;
            dots.push(path);
        }

        if render {
            for dot in &dots {
                let png = dot.with_extension("png");
                render_png(dot, &png, self.config.layout_iterations)?;
                written.push(png);
            }
        }
        written.extend(dots);

        info!(variant = %analysis.variant, dir = %dir.display(), files = written.len(), "exported results");
        Ok(written)
    }
}

impl<Ty: EdgeType> fmt::Display for Analysis<Ty> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== {} graph ===", self.variant)?;
        writeln!(
            f,
            "Cleaning: {} -> {} nodes, {} -> {} edges",
            self.cleaning.nodes_before,
            self.cleaning.nodes_after,
            self.cleaning.edges_before,
            self.cleaning.edges_after
        )?;
        writeln!(
            f,
            "Communities: {} via {:?} (modularity {:.4})",
            self.partition.community_count(),
            self.algorithm,
            self.modularity
        )?;
        writeln!(f)?;
        write!(f, "{}", self.report)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Empty { variant, cleaning } => writeln!(
                f,
                "=== {variant} graph ===\nEmpty after cleaning ({} nodes before); nothing to analyse.",
                cleaning.nodes_before
            ),
            Outcome::Directed(analysis) => write!(f, "{analysis}"),
            Outcome::Undirected(analysis) => write!(f, "{analysis}"),
        }
    }
}
