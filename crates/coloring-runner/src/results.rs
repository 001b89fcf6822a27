//! Results collection and output for coloring runs.
//!
//! Captures metrics like:
//! - Rounds to convergence
//! - Commits and retries per round
//! - Final validity of the coloring

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use coloring_kernel::{Color, ColoringConfig, ColoringOutcome, NodeId, RoundResult, Violation};

/// Results from a single coloring run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    /// Run configuration
    pub config: ColoringConfig,
    /// Substrate the run executed on ("actor" or "local")
    pub engine: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    /// Rounds executed
    pub rounds: usize,
    /// Whether every node was colored
    pub converged: bool,
    /// Whether the final coloring is proper
    pub valid: bool,
    /// First defect found, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub violation: Option<Violation>,
    /// Distinct colors used
    pub colors_used: usize,
    /// Per-round metrics
    pub round_metrics: Vec<RoundResult>,
    /// Final color per node id
    pub colors: BTreeMap<NodeId, Color>,
}

impl RunResult {
    pub fn from_outcome(
        config: ColoringConfig,
        engine: &str,
        started_at: DateTime<Utc>,
        outcome: ColoringOutcome,
    ) -> Self {
        let mut palette: Vec<Color> = outcome.colors.values().copied().collect();
        palette.sort_unstable();
        palette.dedup();

        Self {
            config,
            engine: engine.to_string(),
            started_at,
            ended_at: Utc::now(),
            rounds: outcome.report.rounds,
            converged: outcome.report.converged,
            valid: outcome.validation.is_valid(),
            violation: outcome.validation.violation,
            colors_used: palette.len(),
            round_metrics: outcome.report.history,
            colors: outcome.colors,
        }
    }

    pub fn duration_ms(&self) -> u64 {
        (self.ended_at - self.started_at).num_milliseconds().max(0) as u64
    }

    /// Save results to a JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// Aggregate statistics over a seed sweep.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SweepSummary {
    pub runs: usize,
    /// Fraction of runs that converged
    pub convergence_rate: f64,
    /// Fraction of runs with a proper coloring
    pub validity_rate: f64,
    pub mean_rounds: f64,
    pub max_rounds: usize,
}

/// Results from running the same configuration over many seeds.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SweepResults {
    pub runs: Vec<RunResult>,
    pub summary: SweepSummary,
}

impl SweepResults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, result: RunResult) {
        self.runs.push(result);
    }

    pub fn compute_summary(&mut self) {
        let n = self.runs.len();
        if n == 0 {
            self.summary = SweepSummary::default();
            return;
        }
        let converged = self.runs.iter().filter(|r| r.converged).count();
        let valid = self.runs.iter().filter(|r| r.valid).count();
        let total_rounds: usize = self.runs.iter().map(|r| r.rounds).sum();

        self.summary = SweepSummary {
            runs: n,
            convergence_rate: converged as f64 / n as f64,
            validity_rate: valid as f64 / n as f64,
            mean_rounds: total_rounds as f64 / n as f64,
            max_rounds: self.runs.iter().map(|r| r.rounds).max().unwrap_or(0),
        };
    }

    /// Save results to a JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// Format a duration in milliseconds for display.
pub fn format_duration(ms: u64) -> String {
    if ms < 1000 {
        format!("{}ms", ms)
    } else if ms < 60_000 {
        format!("{:.1}s", ms as f64 / 1000.0)
    } else {
        format!("{:.1}m", ms as f64 / 60_000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(rounds: usize, converged: bool) -> RunResult {
        RunResult {
            config: ColoringConfig::default(),
            engine: "local".to_string(),
            started_at: Utc::now(),
            ended_at: Utc::now(),
            rounds,
            converged,
            valid: converged,
            violation: None,
            colors_used: 3,
            round_metrics: vec![],
            colors: BTreeMap::new(),
        }
    }

    #[test]
    fn test_sweep_summary() {
        let mut results = SweepResults::new();
        results.add(run(3, true));
        results.add(run(5, true));
        results.add(run(10, false));
        results.compute_summary();

        assert_eq!(results.summary.runs, 3);
        assert!((results.summary.convergence_rate - 0.666).abs() < 0.01);
        assert!((results.summary.mean_rounds - 6.0).abs() < 1e-9);
        assert_eq!(results.summary.max_rounds, 10);
    }

    #[test]
    fn test_empty_sweep_summary() {
        let mut results = SweepResults::new();
        results.compute_summary();
        assert_eq!(results.summary.runs, 0);
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(250), "250ms");
        assert_eq!(format_duration(1500), "1.5s");
        assert_eq!(format_duration(120_000), "2.0m");
    }
}
