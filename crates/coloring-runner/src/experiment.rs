//! Experiment runner for coloring runs.
//!
//! Orchestrates the run lifecycle:
//! 1. Validate configuration
//! 2. Generate graph and spawn the chosen engine
//! 3. Run rounds until every node is colored or the cap is hit
//! 4. Collect metrics and results

use anyhow::Result;
use chrono::Utc;
use tracing::info;

use coloring_kernel::{color_graph, color_graph_local, ColoringConfig};

use crate::results::{RunResult, SweepResults};

/// Execution substrate for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineKind {
    /// One acton-reactive actor per partition
    Actor,
    /// All partitions in-process
    Local,
}

impl EngineKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Actor => "actor",
            Self::Local => "local",
        }
    }
}

/// Runs coloring experiments.
pub struct ExperimentRunner {
    engine: EngineKind,
}

impl ExperimentRunner {
    pub fn new(engine: EngineKind) -> Self {
        Self { engine }
    }

    /// Color one generated graph.
    pub async fn run(&self, config: &ColoringConfig) -> Result<RunResult> {
        config.validate()?;
        let started_at = Utc::now();

        info!(
            engine = self.engine.name(),
            num_nodes = config.num_nodes,
            max_degree = config.max_degree,
            seed = config.seed,
            partitions = config.partitions,
            "Starting coloring run"
        );

        let outcome = match self.engine {
            EngineKind::Actor => color_graph(config).await?,
            EngineKind::Local => color_graph_local(config).await?,
        };

        Ok(RunResult::from_outcome(
            config.clone(),
            self.engine.name(),
            started_at,
            outcome,
        ))
    }

    /// Run the same configuration once per seed in `seeds`.
    pub async fn sweep(&self, config: &ColoringConfig, seeds: impl IntoIterator<Item = u64>) -> Result<SweepResults> {
        let mut results = SweepResults::new();
        for seed in seeds {
            let run_config = ColoringConfig {
                seed,
                ..config.clone()
            };
            let result = self.run(&run_config).await?;
            info!(
                seed,
                rounds = result.rounds,
                converged = result.converged,
                valid = result.valid,
                "Completed sweep run"
            );
            results.add(result);
        }
        results.compute_summary();
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> ColoringConfig {
        ColoringConfig {
            num_nodes: 30,
            max_degree: 3,
            seed: 5,
            partitions: 2,
            max_rounds: 200,
        }
    }

    #[tokio::test]
    async fn test_local_run_produces_valid_result() {
        let result = ExperimentRunner::new(EngineKind::Local).run(&small()).await.unwrap();
        assert!(result.converged);
        assert!(result.valid);
        assert_eq!(result.colors.len(), 30);
        assert!(result.colors_used <= 4);
        assert_eq!(result.round_metrics.len(), result.rounds);
    }

    #[tokio::test]
    async fn test_sweep_summarizes_every_seed() {
        let results = ExperimentRunner::new(EngineKind::Local)
            .sweep(&small(), 0..5)
            .await
            .unwrap();
        assert_eq!(results.summary.runs, 5);
        assert!((results.summary.validity_rate - 1.0).abs() < 1e-9);
        assert_eq!(
            results.runs.iter().map(|r| r.config.seed).collect::<Vec<_>>(),
            vec![0, 1, 2, 3, 4]
        );
    }

    #[tokio::test]
    async fn test_invalid_config_is_rejected() {
        let config = ColoringConfig {
            num_nodes: 0,
            ..small()
        };
        assert!(ExperimentRunner::new(EngineKind::Local).run(&config).await.is_err());
    }
}
