//! Interaction graphs of agents commenting and replying to each other.
//!
//! Comment records become reply, answer, discussion or weighted reply
//! graphs. Each graph is cleaned, split into communities, and its agents
//! get structural roles. The results go out as text reports, CSV tables
//! and Graphviz files.

pub mod builder;
pub mod centrality;
pub mod cleaner;
pub mod community;
pub mod config;
pub mod error;
pub mod export;
pub mod graph;
pub mod pipeline;
pub mod records;
pub mod roles;
pub mod stats;
pub mod synth;

pub use builder::{AnyGraph, GraphBuilder, GraphVariant};
pub use cleaner::{CleaningSummary, GraphCleaner};
pub use community::{CommunityDetection, CommunityDetector, GreedyModularity, Louvain, Partition};
pub use config::AnalysisConfig;
pub use error::{Error, Result};
pub use graph::{Agent, AgentRef, InteractionGraph, PersonGraph, ReplyGraph};
pub use pipeline::{Analysis, Outcome, Pipeline};
pub use records::{CommentRecord, RecordIndex, read_comments};
pub use roles::{Role, RoleClassifier, RoleMap};
pub use stats::{GraphReport, StatsReporter};
pub use synth::{SynthSpec, generate_comment_csv};
