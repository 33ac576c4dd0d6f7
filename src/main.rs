use agent_network::{
    AnalysisConfig, GraphVariant, Pipeline, Result, SynthSpec, generate_comment_csv, read_comments,
};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "agent-network")]
#[command(about = "Community and role analysis of agent reply networks", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build, clean and analyse interaction graphs from a comment CSV
    Analyze {
        /// CSV with comment_id, parent_id, agent_id, agent_name columns
        #[arg(short, long)]
        input: PathBuf,

        /// TOML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Graph variants to analyse (repeatable, default: all)
        #[arg(short, long, value_enum)]
        variant: Vec<GraphVariant>,

        /// Overrides the configured results directory
        #[arg(long)]
        results_dir: Option<PathBuf>,

        /// Render every DOT view to PNG with Graphviz
        #[arg(long)]
        render: bool,
    },

    /// Write a synthetic comment CSV
    Generate {
        #[arg(short, long, default_value = "comments.csv")]
        output: PathBuf,

        #[arg(long, default_value_t = 140)]
        agents: usize,

        #[arg(long, default_value_t = 500)]
        threads: usize,

        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Analyze {
            input,
            config,
            variant,
            results_dir,
            render,
        } => {
            // `from_path` validates; the results directory has no constraints.
            let mut config = match config {
                Some(path) => AnalysisConfig::from_path(path)?,
                None => AnalysisConfig::default(),
            };
            if let Some(dir) = results_dir {
                config.results_dir = dir;
            }

            let variants = if variant.is_empty() {
                GraphVariant::ALL.to_vec()
            } else {
                variant
            };

            let records = read_comments(&input)?;
            let pipeline = Pipeline::new(config);
            for outcome in pipeline.run_all(&records, &variants) {
                println!("{outcome}");
                pipeline.export(&outcome, render)?;
            }
        }
        Commands::Generate {
            output,
            agents,
            threads,
            seed,
        } => {
            let spec = SynthSpec {
                agents,
                threads,
                seed,
                ..SynthSpec::default()
            };
            let rows = generate_comment_csv(&spec, &output)?;
            info!(rows, path = %output.display(), "done");
        }
    }

    Ok(())
}
