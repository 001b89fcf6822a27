//! Coloring Kernel: decentralized graph coloring in synchronized rounds.
//!
//! This crate implements a randomized, round-based vertex coloring protocol
//! where every node sees only its neighbors' values from the current phase.
//! Nodes are split across partitions that exchange neighbor messages through
//! a scatter/shuffle/gather step, with a barrier between every phase.

pub mod actors;
pub mod config;
pub mod coordinator;
pub mod dataflow;
pub mod engine;
pub mod generator;
pub mod graph;
pub mod kernel;
pub mod messages;
pub mod protocol;
pub mod validator;

pub use config::ColoringConfig;
pub use coordinator::{color_graph, color_graph_local, color_with_engine, ColoringOutcome, RoundCoordinator, RoundReport};
pub use engine::{Engine, LocalEngine, PhaseStats, RoundResult};
pub use generator::{GeneratorConfig, GraphGenerator};
pub use graph::{Color, Generation, Graph, Node, NodeId};
pub use kernel::ActorEngine;
pub use messages::{Superstep, SuperstepComplete};
pub use protocol::{propose_candidate, resolve_candidate, Phase};
pub use validator::{validate, Validation, Violation};
