//! The actor-based superstep engine.
//!
//! ## Usage
//!
//! ```ignore
//! use coloring_kernel::{ActorEngine, Engine};
//! use acton_reactive::prelude::*;
//!
//! let runtime = ActonApp::launch_async().await;
//! let mut engine = ActorEngine::spawn(runtime, &graph, 4, 42).await;
//!
//! let result = engine.superstep(1).await?;
//! let nodes = engine.collect().await?;
//! engine.shutdown().await?;
//! ```

use acton_reactive::prelude::*;
use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::actors::{spawn_nodes_observer, spawn_superstep_observer, PartitionActor, SuperstepCoordinator};
use crate::dataflow::Partitioner;
use crate::engine::{Engine, RoundResult, StepParams};
use crate::graph::{Graph, Node};
use crate::messages::{CollectNodes, RegisterPartitions, Superstep};

/// Engine running each partition in its own actor.
///
/// The runtime is handed in by the caller and released in
/// [`Engine::shutdown`].
pub struct ActorEngine {
    runtime: ActorRuntime,
    coordinator: ActorHandle,
    rounds: mpsc::Receiver<RoundResult>,
    snapshots: mpsc::Receiver<Vec<Node>>,
}

impl ActorEngine {
    /// Launch a fresh runtime and spawn the engine into it.
    pub async fn launch(graph: &Graph, partitions: usize, seed: u64) -> Self {
        let runtime = ActonApp::launch_async().await;
        Self::spawn(runtime, graph, partitions, seed).await
    }

    /// Spawn the coordinator, observers, and one actor per partition.
    pub async fn spawn(mut runtime: ActorRuntime, graph: &Graph, partitions: usize, seed: u64) -> Self {
        let partitioner = Partitioner::new(partitions);
        let params = StepParams {
            max_degree: graph.max_degree(),
            seed,
        };

        // Coordinator and observers subscribe before any partition can answer
        let coordinator = SuperstepCoordinator::spawn(&mut runtime).await;

        let (rounds_tx, rounds) = mpsc::channel(16);
        spawn_superstep_observer(&mut runtime, rounds_tx).await;
        let (snapshots_tx, snapshots) = mpsc::channel(1);
        spawn_nodes_observer(&mut runtime, snapshots_tx).await;

        let mut actors = Vec::with_capacity(partitioner.partitions());
        for (partition, nodes) in partitioner.split(graph.nodes()).into_iter().enumerate() {
            let handle = PartitionActor::new(partition, nodes, params)
                .spawn(&mut runtime)
                .await;
            actors.push(handle);
        }

        debug!(
            partitions = actors.len(),
            nodes = graph.len(),
            "Spawned partition actors"
        );

        coordinator.send(RegisterPartitions { actors }).await;

        Self {
            runtime,
            coordinator,
            rounds,
            snapshots,
        }
    }
}

impl Engine for ActorEngine {
    async fn superstep(&mut self, round: usize) -> Result<RoundResult> {
        self.coordinator.send(Superstep { round }).await;
        self.rounds
            .recv()
            .await
            .context("superstep channel closed before the round completed")
    }

    async fn collect(&mut self) -> Result<Vec<Node>> {
        self.coordinator.send(CollectNodes).await;
        self.snapshots
            .recv()
            .await
            .context("snapshot channel closed before collection completed")
    }

    async fn shutdown(mut self) -> Result<()> {
        if let Err(e) = self.runtime.shutdown_all().await {
            warn!(error = ?e, "Actor runtime did not shut down cleanly");
        }
        Ok(())
    }
}
