//! Coloring Runner CLI.
//!
//! Commands:
//! - run: Color one generated graph
//! - sweep: Run the same configuration over a range of seeds
//! - generate: Generate a graph and print its statistics

use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::Local;
use clap::{Args, Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use coloring_kernel::{ColoringConfig, GraphGenerator};
use coloring_runner::experiment::{EngineKind, ExperimentRunner};
use coloring_runner::results::format_duration;

/// Generate a timestamped output path from the given path.
/// e.g., "results.json" -> "results-20260108-010530.json"
fn timestamped_path(path: &Path) -> PathBuf {
    let timestamp = Local::now().format("%Y%m%d-%H%M%S");
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("results");
    let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("json");
    let parent = path.parent().unwrap_or(std::path::Path::new("."));
    parent.join(format!("{}-{}.{}", stem, timestamp, ext))
}

#[derive(Parser)]
#[command(name = "coloring-runner")]
#[command(version)]
#[command(about = "Round-based distributed graph coloring")]
struct Cli {
    /// Run partitions in-process instead of on actors
    #[arg(long)]
    local: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Graph and protocol parameters. Flags override values from `--config`.
#[derive(Args, Debug, Clone)]
struct GraphArgs {
    /// JSON config file
    #[arg(long, env = "COLORING_CONFIG")]
    config: Option<PathBuf>,

    /// Number of nodes [default: 1000]
    #[arg(long)]
    num_nodes: Option<usize>,

    /// Maximum node degree [default: 2]
    #[arg(long)]
    max_degree: Option<usize>,

    /// Random seed [default: 42]
    #[arg(long)]
    seed: Option<u64>,

    /// Number of partitions [default: 4]
    #[arg(long)]
    partitions: Option<usize>,

    /// Round cap, 0 for none [default: 0]
    #[arg(long)]
    max_rounds: Option<usize>,
}

impl GraphArgs {
    fn resolve(&self) -> Result<ColoringConfig> {
        let mut config = match &self.config {
            Some(path) => ColoringConfig::from_json_file(path)?,
            None => ColoringConfig::default(),
        };
        if let Some(v) = self.num_nodes {
            config.num_nodes = v;
        }
        if let Some(v) = self.max_degree {
            config.max_degree = v;
        }
        if let Some(v) = self.seed {
            config.seed = v;
        }
        if let Some(v) = self.partitions {
            config.partitions = v;
        }
        if let Some(v) = self.max_rounds {
            config.max_rounds = v;
        }
        config.validate()?;
        Ok(config)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Color a single generated graph
    Run {
        #[command(flatten)]
        graph: GraphArgs,

        /// Print every node's final color
        #[arg(long)]
        print_colors: bool,

        /// Output file for results
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Run one configuration over a range of seeds
    Sweep {
        #[command(flatten)]
        graph: GraphArgs,

        /// Number of seeds, starting at --seed
        #[arg(long, default_value = "10")]
        trials: u64,

        /// Output file for results
        #[arg(long, default_value = "sweep.json")]
        output: PathBuf,
    },

    /// Generate a graph and display its statistics
    Generate {
        #[command(flatten)]
        graph: GraphArgs,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .compact()
        .init();

    let engine = if cli.local {
        EngineKind::Local
    } else {
        EngineKind::Actor
    };
    let runner = ExperimentRunner::new(engine);

    match cli.command {
        Commands::Run {
            graph,
            print_colors,
            output,
        } => {
            let config = graph.resolve()?;
            let result = runner.run(&config).await?;

            if print_colors {
                println!("{}", serde_json::to_string_pretty(&result.colors)?);
            }

            println!("\n=== Coloring Result ===");
            println!("Engine: {}", result.engine);
            println!(
                "Graph: {} nodes, max degree {}, seed {}",
                config.num_nodes, config.max_degree, config.seed
            );
            println!("Rounds: {}", result.rounds);
            println!("Converged: {}", result.converged);
            println!("Colors used: {}", result.colors_used);
            println!("Valid: {}", result.valid);
            if let Some(violation) = &result.violation {
                println!("Violation: {:?}", violation);
            }
            println!("Duration: {}", format_duration(result.duration_ms()));

            if let Some(output) = output {
                let output_path = timestamped_path(&output);
                result.save(&output_path)?;
                info!(path = %output_path.display(), "Results saved");
            }
        }

        Commands::Sweep {
            graph,
            trials,
            output,
        } => {
            let config = graph.resolve()?;
            let first = config.seed;
            let results = runner.sweep(&config, first..first + trials).await?;

            let output_path = timestamped_path(&output);
            results.save(&output_path)?;

            println!("\n=== Sweep Complete ===");
            println!("Runs: {}", results.summary.runs);
            println!("Convergence rate: {:.2}", results.summary.convergence_rate);
            println!("Validity rate: {:.2}", results.summary.validity_rate);
            println!("Mean rounds: {:.2}", results.summary.mean_rounds);
            println!("Max rounds: {}", results.summary.max_rounds);
            println!("Results saved to: {}", output_path.display());
        }

        Commands::Generate { graph } => {
            let config = graph.resolve()?;
            let graph = GraphGenerator::new(config.generator()).generate()?;

            let degrees: Vec<usize> = graph.nodes().iter().map(|n| n.degree()).collect();
            let max_seen = degrees.iter().copied().max().unwrap_or(0);
            let isolated = degrees.iter().filter(|&&d| d == 0).count();

            println!("Nodes: {}", graph.len());
            println!("Edges: {}", graph.edge_count());
            println!("Max degree: {} (bound {})", max_seen, graph.max_degree());
            println!("Isolated nodes: {}", isolated);
            println!("Symmetric: {}", graph.is_symmetric());
        }
    }

    Ok(())
}
