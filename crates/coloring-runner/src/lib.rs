//! Coloring Runner: experiment harness for the coloring kernel.
//!
//! This crate runs the round-based coloring protocol end to end:
//! - Generates seeded bounded-degree graphs
//! - Runs them on the actor or in-process engine
//! - Records per-round metrics and validity as JSON

pub mod experiment;
pub mod results;
