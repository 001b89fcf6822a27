//! Acton-reactive actors for the superstep kernel.
//!
//! Uses message correlation (via mti) to count responses against barriers:
//!
//! ```text
//! Superstep → Coordinator
//!   ├─ Scatter(Propose) → PartitionActors
//!   │   └─ ScatterResult (broadcast) → Coordinator   [barrier, shuffle]
//!   ├─ Gather(Propose) → PartitionActors
//!   │   └─ GatherResult (broadcast) → Coordinator    [barrier]
//!   ├─ Scatter(Resolve) → PartitionActors
//!   │   └─ ScatterResult (broadcast) → Coordinator   [barrier, shuffle]
//!   ├─ Gather(Resolve) → PartitionActors
//!   │   └─ GatherResult (broadcast) → Coordinator    [barrier]
//!   └─ SuperstepComplete (broadcast)
//! ```
//!
//! PartitionActors own their generation of node records and replace it
//! wholesale on every `Gather`.

mod observer;
mod partition_actor;
mod superstep_coordinator;

pub use observer::{spawn_nodes_observer, spawn_superstep_observer};
pub use partition_actor::{PartitionActor, PartitionActorState};
pub use superstep_coordinator::{SuperstepCoordinator, SuperstepCoordinatorState};
