//! Synthetic comment datasets for demo runs and benchmarks.
//!
//! Threads are generated in parallel, each with its own RNG seeded from the
//! run seed and the thread number, so the same seed always writes the same
//! file regardless of how rayon schedules the work.

use crate::error::Result;
use crate::records::CommentRecord;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use std::collections::HashSet;
use std::path::Path;
use tracing::info;

pub struct AgentNameGenerator {
    prefixes: Vec<&'static str>,
    suffixes: Vec<&'static str>,
}

impl AgentNameGenerator {
    pub fn new() -> Self {
        AgentNameGenerator {
            prefixes: vec![
                "quiet", "rapid", "lucid", "brave", "amber", "cobalt", "silver", "hollow",
                "swift", "gentle", "cosmic", "rusty", "vivid", "stoic", "nimble",
            ],
            suffixes: vec![
                "oracle", "scribe", "weaver", "pilot", "sage", "tinker", "herald", "warden",
                "muse", "critic", "nomad", "archivist", "ranger", "mentor", "skeptic",
            ],
        }
    }

    /// `count` agent names. Names repeat once the combinations run out, the
    /// way real display names collide.
    pub fn names(&self, count: usize, rng: &mut impl Rng) -> Vec<String> {
        let mut used = HashSet::new();
        (0..count)
            .map(|_| {
                for _ in 0..8 {
                    let name = self.pick(rng);
                    if used.insert(name.clone()) {
                        return name;
                    }
                }
                self.pick(rng)
            })
            .collect()
    }

    fn pick(&self, rng: &mut impl Rng) -> String {
        let prefix = self.prefixes.choose(rng).copied().unwrap_or("agent");
        let suffix = self.suffixes.choose(rng).copied().unwrap_or("bot");
        let num = rng.gen_range(1..999);
        format!("{}_{}{}", prefix, suffix, num)
    }
}

impl Default for AgentNameGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Shape of a generated dataset.
#[derive(Debug, Clone, Copy)]
pub struct SynthSpec {
    pub agents: usize,
    pub threads: usize,
    pub max_replies: usize,
    pub seed: u64,
}

impl Default for SynthSpec {
    fn default() -> Self {
        SynthSpec {
            agents: 140,
            threads: 500,
            max_replies: 12,
            seed: 42,
        }
    }
}

/// Builds comment records: each thread has a root post and up to
/// `max_replies` replies, each answering a random earlier comment of the
/// same thread. Agents are picked with a skew so a few of them post a lot.
pub fn generate_comments(spec: &SynthSpec) -> Vec<CommentRecord> {
    let agents = spec.agents.max(2);
    let mut rng = StdRng::seed_from_u64(spec.seed);
    let names = AgentNameGenerator::new().names(agents, &mut rng);

    let threads: Vec<Vec<CommentRecord>> = (0..spec.threads)
        .into_par_iter()
        .map(|thread| {
            let mut rng = StdRng::seed_from_u64(spec.seed ^ (thread as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15));
            let pick_agent = |rng: &mut StdRng| {
                // Squaring a uniform draw favours low agent numbers.
                let u: f64 = rng.gen_range(0.0..1.0);
                ((u * u) * agents as f64) as usize % agents
            };

            let replies = rng.gen_range(0..=spec.max_replies);
            let mut comments = Vec::with_capacity(replies + 1);
            for position in 0..=replies {
                let agent = pick_agent(&mut rng);
                let parent = (position > 0).then(|| {
                    let target = rng.gen_range(0..position);
                    format!("t{thread}-c{target}")
                });
                comments.push(CommentRecord {
                    comment_id: format!("t{thread}-c{position}"),
                    parent_id: parent,
                    agent_id: format!("agent-{agent:04}"),
                    agent_name: names[agent].clone(),
                });
            }
            comments
        })
        .collect();

    threads.into_iter().flatten().collect()
}

pub fn generate_comment_csv(spec: &SynthSpec, path: impl AsRef<Path>) -> Result<usize> {
    let records = generate_comments(spec);
    let mut writer = csv::Writer::from_path(path.as_ref())?;
    for record in &records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    info!(rows = records.len(), path = %path.as_ref().display(), "wrote synthetic comments");
    Ok(records.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{RecordIndex, read_comments};

    #[test]
    fn same_seed_same_dataset() {
        let spec = SynthSpec {
            threads: 50,
            ..SynthSpec::default()
        };
        assert_eq!(generate_comments(&spec), generate_comments(&spec));

        let other = SynthSpec { seed: 7, ..spec };
        assert_ne!(generate_comments(&spec), generate_comments(&other));
    }

    #[test]
    fn replies_point_inside_their_thread() {
        let records = generate_comments(&SynthSpec {
            threads: 30,
            ..SynthSpec::default()
        });
        let index = RecordIndex::new(&records);
        for record in &records {
            if let Some(parent) = &record.parent_id {
                assert!(index.comment_agent(parent).is_some());
                let thread = record.comment_id.split('-').next().unwrap();
                assert!(parent.starts_with(&format!("{thread}-")));
            }
        }
    }

    #[test]
    fn csv_round_trip_through_loader() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("comments.csv");
        let spec = SynthSpec {
            threads: 20,
            ..SynthSpec::default()
        };
        let written = generate_comment_csv(&spec, &path).unwrap();
        let loaded = read_comments(&path).unwrap();
        assert_eq!(loaded.len(), written);
        assert_eq!(loaded, generate_comments(&spec));
    }
}
