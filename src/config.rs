use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// How agents are keyed as graph nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeIdentity {
    /// Stable agent identifier; display names ride along as an attribute.
    #[default]
    AgentId,
    /// Display name. Distinct agents sharing a name collapse into one node.
    AgentName,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommunityAlgorithm {
    #[default]
    GreedyModularity,
    Louvain,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommunityConfig {
    /// Unset: Louvain for the weighted reply graph, greedy modularity for
    /// the other variants.
    pub algorithm: Option<CommunityAlgorithm>,
    /// Modularity resolution (gamma). Higher values give smaller communities.
    pub resolution: f64,
    /// Seed for Louvain's node visiting order. Configured runs are always
    /// seeded.
    pub seed: u64,
}

impl Default for CommunityConfig {
    fn default() -> Self {
        CommunityConfig {
            algorithm: None,
            resolution: 1.0,
            seed: 42,
        }
    }
}

/// Every tunable of a run, loaded once and validated at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub results_dir: PathBuf,
    /// Threads with more distinct authors than this are left out of the
    /// discussion graph.
    pub max_thread_size: usize,
    pub min_degree_filter: usize,
    pub min_edge_weight: u32,
    pub hub_threshold: usize,
    pub bridge_threshold: f64,
    pub top_k: usize,
    pub layout_iterations: usize,
    pub node_identity: NodeIdentity,
    pub community: CommunityConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            results_dir: PathBuf::from("results"),
            max_thread_size: 40,
            min_degree_filter: 2,
            min_edge_weight: 2,
            hub_threshold: 50,
            bridge_threshold: 0.01,
            top_k: 10,
            layout_iterations: 1500,
            node_identity: NodeIdentity::AgentId,
            community: CommunityConfig::default(),
        }
    }
}

impl AnalysisConfig {
    /// Read a TOML file. Missing keys fall back to defaults.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        let config: AnalysisConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_thread_size < 2 {
            return Err(Error::invalid_config(
                "max_thread_size",
                format!("must be at least 2, got {}", self.max_thread_size),
            ));
        }
        if self.min_edge_weight == 0 {
            return Err(Error::invalid_config("min_edge_weight", "must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.bridge_threshold) {
            return Err(Error::invalid_config(
                "bridge_threshold",
                format!("must lie in [0, 1], got {}", self.bridge_threshold),
            ));
        }
        if !(self.community.resolution.is_finite() && self.community.resolution > 0.0) {
            return Err(Error::invalid_config(
                "community.resolution",
                format!("must be positive, got {}", self.community.resolution),
            ));
        }
        if self.top_k == 0 {
            return Err(Error::invalid_config("top_k", "must be at least 1"));
        }
        Ok(())
    }
}
