//! Post-hoc properness check of a final coloring.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::graph::{Color, Node, NodeId};

/// The first defect found in a coloring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    /// Two adjacent nodes share a color.
    SameColor { u: NodeId, v: NodeId, color: Color },
    /// A node never committed a color (run stopped by the round cap).
    Uncolored { node: NodeId },
}

/// Result of validating a coloring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validation {
    pub violation: Option<Violation>,
}

impl Validation {
    pub fn is_valid(&self) -> bool {
        self.violation.is_none()
    }
}

/// Check every adjacent pair in `topology` against `colors`.
pub fn validate(colors: &BTreeMap<NodeId, Color>, topology: &[Node]) -> Validation {
    for node in topology {
        let Some(&color) = colors.get(&node.id) else {
            warn!(node = %node.id, "Coloring check failed: node is uncolored");
            return Validation {
                violation: Some(Violation::Uncolored { node: node.id }),
            };
        };
        for &neighbor in node.neighbors.iter() {
            if colors.get(&neighbor) == Some(&color) {
                warn!(
                    node = %node.id,
                    neighbor = %neighbor,
                    color,
                    "Coloring check failed: adjacent nodes share a color"
                );
                return Validation {
                    violation: Some(Violation::SameColor {
                        u: node.id,
                        v: neighbor,
                        color,
                    }),
                };
            }
        }
    }
    Validation { violation: None }
}
