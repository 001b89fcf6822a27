//! Observer actors bridging coordinator broadcasts to mpsc channels.
//!
//! The engine awaits round and collection results on the receiving end.

use acton_reactive::prelude::*;
use tokio::sync::mpsc;

use crate::engine::RoundResult;
use crate::graph::Node;
use crate::messages::{NodesCollected, SuperstepComplete};

/// Spawn an observer actor that forwards SuperstepComplete broadcasts.
pub async fn spawn_superstep_observer(runtime: &mut ActorRuntime, tx: mpsc::Sender<RoundResult>) {
    #[derive(Default, Clone, Debug)]
    struct State {
        tx: Option<mpsc::Sender<RoundResult>>,
    }

    let mut actor = runtime.new_actor_with_name::<State>("SuperstepObserver".to_string());
    actor.model.tx = Some(tx);

    actor.handle().subscribe::<SuperstepComplete>().await;

    actor.act_on::<SuperstepComplete>(|actor, context| {
        let result = context.message().result;
        let tx = actor.model.tx.clone();
        Reply::pending(async move {
            if let Some(tx) = tx {
                // Receiver may have been dropped
                let _ = tx.send(result).await;
            }
        })
    });

    actor.start().await;
}

/// Spawn an observer actor that forwards NodesCollected broadcasts.
pub async fn spawn_nodes_observer(runtime: &mut ActorRuntime, tx: mpsc::Sender<Vec<Node>>) {
    #[derive(Default, Clone, Debug)]
    struct State {
        tx: Option<mpsc::Sender<Vec<Node>>>,
    }

    let mut actor = runtime.new_actor_with_name::<State>("NodesObserver".to_string());
    actor.model.tx = Some(tx);

    actor.handle().subscribe::<NodesCollected>().await;

    actor.act_on::<NodesCollected>(|actor, context| {
        let nodes = context.message().nodes.clone();
        let tx = actor.model.tx.clone();
        Reply::pending(async move {
            if let Some(tx) = tx {
                let _ = tx.send(nodes).await;
            }
        })
    });

    actor.start().await;
}
