//! Node abstraction for the pipeline.
//!
//! Two-layer design:
//! - **`NodePlugin` trait** — for node types defined outside this crate.
//! - **`BuiltinNode` enum** — for all built-in nodes. The compiler can inline
//!   match arms, eliminating dynamic dispatch overhead on the hot path.
//!
//! `AnyNode` wraps either variant so the executor can handle both uniformly.

use crate::gnss::Epoch;
use crate::pipeline::error::PipelineResult;
use crate::pipeline::id::NodeId;
use crate::pipeline::nodes::{
    EphemerisCollectorNode, GnssNavInfoMergeNode, RinexNavFileNode, SatelliteFilterNode,
};
use crate::pipeline::pin::{InputPin, OutputPin, PinValue};
use crate::pipeline::port::PortDescriptor;
use std::fmt;

/// Context passed to node lifecycle hooks.
pub struct NodeContext<'a> {
    pub node: NodeId,
    /// Handle of the node in the graph description.
    pub handle: &'a str,
    pub inputs: &'a [InputPin],
    pub outputs: &'a mut [OutputPin],
}

impl<'a> NodeContext<'a> {
    /// Latest value on input port `index`.
    pub fn input(&self, index: usize) -> Option<&'a PinValue> {
        let inputs: &'a [InputPin] = self.inputs;
        inputs.get(index).and_then(InputPin::value)
    }

    /// Write output port `index`. Writes to unknown ports are dropped.
    pub fn write(&mut self, index: usize, value: PinValue) {
        match self.outputs.get_mut(index) {
            Some(pin) => pin.write(value),
            None => tracing::warn!("Node '{}' wrote to unknown output {}", self.handle, index),
        }
    }
}

/// Why a node stopped producing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEnd {
    /// All input consumed.
    Exhausted,
    /// Stopped by a fatal, node-local error.
    Failed(String),
}

/// Outcome of a node reaction or poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeAction {
    /// At least one output pin was written.
    Produced,
    NoOutputYet,
    EndOfStream(StreamEnd),
}

/// Lifecycle state of a node within one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeStatus {
    /// Built, not yet activated.
    Idle,
    Active,
    /// Reached end-of-stream or was stopped at completion.
    Finished,
    Failed(String),
}

impl NodeStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, NodeStatus::Finished | NodeStatus::Failed(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, NodeStatus::Failed(_))
    }
}

impl fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeStatus::Idle => f.write_str("idle"),
            NodeStatus::Active => f.write_str("active"),
            NodeStatus::Finished => f.write_str("finished"),
            NodeStatus::Failed(reason) => write!(f, "failed: {}", reason),
        }
    }
}

/// Counters reported by a node at the end of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeStats {
    /// Records produced (decoded, passed, collected or merged)
    pub records: u64,
    /// Recoverable problems, one line each
    pub warnings: Vec<String>,
}

/// Trait for pluggable/user-defined nodes.
pub trait NodePlugin: Send {
    /// Type name of this node.
    fn name(&self) -> &str;

    /// Port descriptors for this node.
    fn ports(&self) -> &[PortDescriptor];

    /// Called once before any propagation. An error aborts the run.
    fn on_activate(&mut self, _ctx: &mut NodeContext) -> PipelineResult<()> {
        Ok(())
    }

    /// Called when input port `port` received a new value.
    fn on_input_updated(&mut self, port: usize, ctx: &mut NodeContext) -> NodeAction;

    /// Called by the scheduler on nodes without input ports.
    fn poll_next(&mut self, _ctx: &mut NodeContext) -> NodeAction {
        NodeAction::EndOfStream(StreamEnd::Exhausted)
    }

    /// Time tag of the record the next `poll_next` produces, if known.
    /// Sources without one are polled ahead of timed sources.
    fn next_epoch(&mut self) -> Option<Epoch> {
        None
    }

    /// Called once when the graph completes.
    fn on_deactivate(&mut self, _ctx: &mut NodeContext) {}

    fn stats(&self) -> NodeStats {
        NodeStats::default()
    }
}

/// Enum dispatch for built-in nodes — zero dynamic dispatch overhead.
pub enum BuiltinNode {
    RinexNavFile(RinexNavFileNode),
    SatelliteFilter(SatelliteFilterNode),
    EphemerisCollector(EphemerisCollectorNode),
    GnssNavInfoMerge(GnssNavInfoMergeNode),
}

impl BuiltinNode {
    pub fn name(&self) -> &str {
        match self {
            BuiltinNode::RinexNavFile(n) => n.name(),
            BuiltinNode::SatelliteFilter(n) => n.name(),
            BuiltinNode::EphemerisCollector(n) => n.name(),
            BuiltinNode::GnssNavInfoMerge(n) => n.name(),
        }
    }

    pub fn ports(&self) -> &[PortDescriptor] {
        match self {
            BuiltinNode::RinexNavFile(n) => n.ports(),
            BuiltinNode::SatelliteFilter(n) => n.ports(),
            BuiltinNode::EphemerisCollector(n) => n.ports(),
            BuiltinNode::GnssNavInfoMerge(n) => n.ports(),
        }
    }

    pub fn on_activate(&mut self, ctx: &mut NodeContext) -> PipelineResult<()> {
        match self {
            BuiltinNode::RinexNavFile(n) => n.on_activate(ctx),
            BuiltinNode::SatelliteFilter(n) => n.on_activate(ctx),
            BuiltinNode::EphemerisCollector(n) => n.on_activate(ctx),
            BuiltinNode::GnssNavInfoMerge(n) => n.on_activate(ctx),
        }
    }

    pub fn on_input_updated(&mut self, port: usize, ctx: &mut NodeContext) -> NodeAction {
        match self {
            BuiltinNode::RinexNavFile(_) => NodeAction::NoOutputYet,
            BuiltinNode::SatelliteFilter(n) => n.on_input_updated(port, ctx),
            BuiltinNode::EphemerisCollector(n) => n.on_input_updated(port, ctx),
            BuiltinNode::GnssNavInfoMerge(n) => n.on_input_updated(port, ctx),
        }
    }

    pub fn poll_next(&mut self, ctx: &mut NodeContext) -> NodeAction {
        match self {
            BuiltinNode::RinexNavFile(n) => n.poll_next(ctx),
            _ => NodeAction::EndOfStream(StreamEnd::Exhausted),
        }
    }

    pub fn next_epoch(&mut self) -> Option<Epoch> {
        match self {
            BuiltinNode::RinexNavFile(n) => n.next_epoch(),
            _ => None,
        }
    }

    pub fn on_deactivate(&mut self, ctx: &mut NodeContext) {
        match self {
            BuiltinNode::RinexNavFile(n) => n.on_deactivate(ctx),
            BuiltinNode::SatelliteFilter(_) => {}
            BuiltinNode::EphemerisCollector(_) => {}
            BuiltinNode::GnssNavInfoMerge(_) => {}
        }
    }

    pub fn stats(&self) -> NodeStats {
        match self {
            BuiltinNode::RinexNavFile(n) => n.stats(),
            BuiltinNode::SatelliteFilter(n) => n.stats(),
            BuiltinNode::EphemerisCollector(n) => n.stats(),
            BuiltinNode::GnssNavInfoMerge(n) => n.stats(),
        }
    }
}

/// Wrapper that holds either a built-in node (enum dispatch) or a plugin (trait object).
pub enum AnyNode {
    Builtin(BuiltinNode),
    Plugin(Box<dyn NodePlugin>),
}

impl AnyNode {
    pub fn name(&self) -> &str {
        match self {
            AnyNode::Builtin(n) => n.name(),
            AnyNode::Plugin(n) => n.name(),
        }
    }

    pub fn ports(&self) -> &[PortDescriptor] {
        match self {
            AnyNode::Builtin(n) => n.ports(),
            AnyNode::Plugin(n) => n.ports(),
        }
    }

    pub fn on_activate(&mut self, ctx: &mut NodeContext) -> PipelineResult<()> {
        match self {
            AnyNode::Builtin(n) => n.on_activate(ctx),
            AnyNode::Plugin(n) => n.on_activate(ctx),
        }
    }

    pub fn on_input_updated(&mut self, port: usize, ctx: &mut NodeContext) -> NodeAction {
        match self {
            AnyNode::Builtin(n) => n.on_input_updated(port, ctx),
            AnyNode::Plugin(n) => n.on_input_updated(port, ctx),
        }
    }

    pub fn poll_next(&mut self, ctx: &mut NodeContext) -> NodeAction {
        match self {
            AnyNode::Builtin(n) => n.poll_next(ctx),
            AnyNode::Plugin(n) => n.poll_next(ctx),
        }
    }

    pub fn next_epoch(&mut self) -> Option<Epoch> {
        match self {
            AnyNode::Builtin(n) => n.next_epoch(),
            AnyNode::Plugin(n) => n.next_epoch(),
        }
    }

    pub fn on_deactivate(&mut self, ctx: &mut NodeContext) {
        match self {
            AnyNode::Builtin(n) => n.on_deactivate(ctx),
            AnyNode::Plugin(n) => n.on_deactivate(ctx),
        }
    }

    pub fn stats(&self) -> NodeStats {
        match self {
            AnyNode::Builtin(n) => n.stats(),
            AnyNode::Plugin(n) => n.stats(),
        }
    }
}

impl From<BuiltinNode> for AnyNode {
    fn from(node: BuiltinNode) -> Self {
        AnyNode::Builtin(node)
    }
}
