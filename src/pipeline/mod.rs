//! Node-based dataflow engine.
//!
//! Data flows through typed pins: a source node decodes a file one record at
//! a time, transforms react to every new input value, and collector/merge
//! nodes aggregate records into shared ephemeris stores.
//!
//! # Architecture
//!
//! ```text
//! [RinexNavFile] ──GnssNavInfo──────────────────────► [GnssNavInfoMerge]
//!                └─Ephemeris──► [SatelliteFilter] ──► [EphemerisCollector]
//! ```
//!
//! # Design
//!
//! - **Enum dispatch** — `BuiltinNode` enum for all built-in nodes, `NodePlugin`
//!   trait objects for everything else.
//! - **Validated at load** — `GraphBuilder` rejects bad links and cycles, so a
//!   `Graph` is always structurally valid.
//! - **Per-record scheduling** — sources are polled earliest record first
//!   (or round-robin), and the propagation queue drains after every poll.
//! - **Per-run completion** — callbacks live in the executor, fire once.

pub mod compiled_plan;
pub mod compiler;
pub mod completion;
pub mod error;
pub mod executor;
pub mod graph;
pub mod id;
pub mod loader;
pub mod node;
pub mod node_type;
pub mod nodes;
pub mod params;
pub mod pin;
pub mod port;
pub mod report;

pub use compiled_plan::{CompiledPlan, PlanStats};
pub use completion::{CompletionCallback, CompletionRegistry};
pub use error::{PipelineError, PipelineResult};
pub use executor::{Executor, FinishedRun, RunHandle, SchedulePolicy, SchedulerConfig};
pub use graph::{Graph, GraphBuilder, Link, NodeSlot};
pub use id::{LinkId, NodeId, PinId};
pub use loader::{GraphDescription, GraphLoader, LinkDescription, NodeDescription};
pub use node::{
    AnyNode, BuiltinNode, NodeAction, NodeContext, NodePlugin, NodeStats, NodeStatus, StreamEnd,
};
pub use node_type::{NodeFactory, NodeType};
pub use params::{ConfigValue, NodeParams};
pub use pin::{InputPin, OutputPin, PinKind, PinValue};
pub use port::{PortDescriptor, PortDirection};
pub use report::{NodeReport, RunReport};
