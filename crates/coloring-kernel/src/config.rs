//! Configuration types for a coloring run.

use std::path::Path;

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};

use crate::generator::GeneratorConfig;

/// Top-level run configuration.
///
/// Loaded from JSON at runtime or built in code; every field has a default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColoringConfig {
    /// Number of nodes in the generated graph
    pub num_nodes: usize,

    /// Degree bound; the palette is `{0 ..= max_degree}`
    pub max_degree: usize,

    /// Seed for graph wiring and per-node color draws
    pub seed: u64,

    /// Number of partitions the node set is split across
    pub partitions: usize,

    /// Safety cap on rounds (0 = run until every node is colored)
    pub max_rounds: usize,
}

impl Default for ColoringConfig {
    fn default() -> Self {
        Self {
            num_nodes: 1000,
            max_degree: 2,
            seed: 42,
            partitions: 4,
            max_rounds: 0,
        }
    }
}

impl ColoringConfig {
    /// Read a config from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: Self = serde_json::from_str(&raw)
            .with_context(|| format!("parsing config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the protocol cannot run on.
    pub fn validate(&self) -> Result<()> {
        ensure!(self.num_nodes > 0, "num_nodes must be positive, got {}", self.num_nodes);
        ensure!(self.partitions > 0, "partitions must be positive, got {}", self.partitions);
        Ok(())
    }

    pub fn generator(&self) -> GeneratorConfig {
        GeneratorConfig {
            num_nodes: self.num_nodes,
            max_degree: self.max_degree,
            seed: self.seed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: ColoringConfig = serde_json::from_str(r#"{"num_nodes": 10}"#).unwrap();
        assert_eq!(config.num_nodes, 10);
        assert_eq!(config.max_degree, 2);
        assert_eq!(config.seed, 42);
        assert_eq!(config.partitions, 4);
        assert_eq!(config.max_rounds, 0);
    }

    #[test]
    fn test_negative_max_degree_is_rejected() {
        let parsed = serde_json::from_str::<ColoringConfig>(r#"{"max_degree": -1}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_zero_nodes_is_rejected() {
        let config = ColoringConfig {
            num_nodes: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
