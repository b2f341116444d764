//! Live node graph and its builder.
//!
//! Nodes live in a flat `Vec<NodeSlot>` indexed by `NodeId`. Pins are owned by
//! their node slot; the graph keeps a lookup table from `PinId` to the pin's
//! location so observers can resolve handles without walking every node.

use crate::pipeline::compiled_plan::CompiledPlan;
use crate::pipeline::compiler::PipelineCompiler;
use crate::pipeline::error::{malformed, PipelineError, PipelineResult};
use crate::pipeline::id::{LinkId, NodeId, PinAllocator, PinId};
use crate::pipeline::node::{AnyNode, NodeStatus};
use crate::pipeline::pin::{InputPin, OutputPin, PinValue};
use crate::pipeline::port::PortDirection;
use std::collections::HashMap;

/// A directed edge from an output pin to an input pin.
#[derive(Debug, Clone)]
pub struct Link {
    pub id: LinkId,
    pub from: PinId,
    pub to: PinId,
    pub from_node: NodeId,
    pub to_node: NodeId,
}

/// A slot holding a node and its pins.
pub struct NodeSlot {
    pub node: AnyNode,
    /// Handle of the node in the graph description
    pub handle: String,
    pub label: String,
    pub inputs: Vec<InputPin>,
    pub outputs: Vec<OutputPin>,
    pub status: NodeStatus,
}

impl NodeSlot {
    /// Whether the node has no input ports and is polled by the scheduler.
    pub fn is_source(&self) -> bool {
        self.inputs.is_empty()
    }

    /// Whether the node has no output ports.
    pub fn is_sink(&self) -> bool {
        self.outputs.is_empty()
    }
}

/// Where a pin lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PinLocation {
    pub node: NodeId,
    pub direction: PortDirection,
    pub index: usize,
}

/// A fully wired, validated graph.
pub struct Graph {
    pub(crate) name: Option<String>,
    pub(crate) nodes: Vec<NodeSlot>,
    pub(crate) links: Vec<Link>,
    pub(crate) pins: HashMap<PinId, PinLocation>,
    pub(crate) plan: CompiledPlan,
    pub(crate) finished: bool,
}

impl Graph {
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &NodeSlot)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, slot)| (NodeId(i as u32), slot))
    }

    pub fn node(&self, id: NodeId) -> PipelineResult<&NodeSlot> {
        self.nodes
            .get(id.index())
            .ok_or_else(|| PipelineError::NodeNotFound(id.to_string()))
    }

    /// Resolve a node by its description handle.
    pub fn node_by_handle(&self, handle: &str) -> PipelineResult<&NodeSlot> {
        self.nodes
            .iter()
            .find(|slot| slot.handle == handle)
            .ok_or_else(|| PipelineError::NodeNotFound(handle.to_string()))
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// Execution plan computed when the graph was built.
    pub fn plan(&self) -> &CompiledPlan {
        &self.plan
    }

    /// Whether the graph has completed a run.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Resolve an output pin by handle.
    ///
    /// Fails with [`PipelineError::PinNotFound`] for unknown handles and for
    /// handles of input pins.
    pub fn find_output_pin(&self, id: PinId) -> PipelineResult<&OutputPin> {
        match self.pins.get(&id) {
            Some(loc) if loc.direction == PortDirection::Output => {
                Ok(&self.nodes[loc.node.index()].outputs[loc.index])
            }
            _ => Err(PipelineError::PinNotFound(id)),
        }
    }

    /// Resolve an input pin by handle.
    pub fn find_input_pin(&self, id: PinId) -> PipelineResult<&InputPin> {
        match self.pins.get(&id) {
            Some(loc) if loc.direction == PortDirection::Input => {
                Ok(&self.nodes[loc.node.index()].inputs[loc.index])
            }
            _ => Err(PipelineError::PinNotFound(id)),
        }
    }

    /// Latest value of an output pin.
    pub fn output_value(&self, id: PinId) -> PipelineResult<Option<&PinValue>> {
        Ok(self.find_output_pin(id)?.value())
    }

    pub(crate) fn location(&self, id: PinId) -> Option<PinLocation> {
        self.pins.get(&id).copied()
    }
}

/// Incremental, validating graph construction.
///
/// Every check the graph description needs happens here, so a `Graph` that
/// exists is structurally valid.
#[derive(Default)]
pub struct GraphBuilder {
    name: Option<String>,
    nodes: Vec<NodeSlot>,
    links: Vec<Link>,
    pins: HashMap<PinId, PinLocation>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Add a node, assigning fresh pin handles above any already in use.
    pub fn add_node(&mut self, handle: impl Into<String>, node: AnyNode) -> PipelineResult<NodeId> {
        let handle = handle.into();
        let (n_in, n_out) = port_counts(&node);
        let mut allocator = PinAllocator::new(self.pins.keys().copied());
        let mut fresh: Vec<PinId> = (0..n_in + n_out)
            .map(|_| allocator.allocate())
            .collect::<Option<_>>()
            .ok_or_else(|| {
                PipelineError::MalformedGraph(format!(
                    "node '{}': pin handle space exhausted",
                    handle
                ))
            })?;
        let outputs = fresh.split_off(n_in);
        self.add_node_with_pins(handle, None, node, &fresh, &outputs)
    }

    /// Add a node with explicit pin handles, one per port in port order.
    pub fn add_node_with_pins(
        &mut self,
        handle: impl Into<String>,
        label: Option<String>,
        node: AnyNode,
        inputs: &[PinId],
        outputs: &[PinId],
    ) -> PipelineResult<NodeId> {
        let handle = handle.into();
        if self.nodes.iter().any(|slot| slot.handle == handle) {
            return malformed(format!("duplicate node handle '{}'", handle));
        }
        let (n_in, n_out) = port_counts(&node);
        if inputs.len() != n_in || outputs.len() != n_out {
            return malformed(format!(
                "node '{}' declares {} inputs and {} outputs, {} has {} and {}",
                handle,
                inputs.len(),
                outputs.len(),
                node.name(),
                n_in,
                n_out
            ));
        }

        let id = NodeId(self.nodes.len() as u32);
        let mut input_pins = Vec::with_capacity(n_in);
        let mut output_pins = Vec::with_capacity(n_out);
        for port in node.ports() {
            match port.direction {
                PortDirection::Input => {
                    let pin_id = inputs[input_pins.len()];
                    input_pins.push(InputPin::new(pin_id, port.name.clone(), port.kind));
                }
                PortDirection::Output => {
                    let pin_id = outputs[output_pins.len()];
                    output_pins.push(OutputPin::new(pin_id, port.name.clone(), port.kind));
                }
            }
        }

        let mut new_pins = HashMap::new();
        let located = input_pins
            .iter()
            .enumerate()
            .map(|(i, p)| (p.id, PortDirection::Input, i))
            .chain(
                output_pins
                    .iter()
                    .enumerate()
                    .map(|(i, p)| (p.id, PortDirection::Output, i)),
            );
        for (pin_id, direction, index) in located {
            let location = PinLocation {
                node: id,
                direction,
                index,
            };
            if self.pins.contains_key(&pin_id) || new_pins.insert(pin_id, location).is_some() {
                return malformed(format!("duplicate pin handle {} on node '{}'", pin_id, handle));
            }
        }
        self.pins.extend(new_pins);

        tracing::debug!("Added node {:?} '{}' of type {}", id, handle, node.name());
        self.nodes.push(NodeSlot {
            label: label.unwrap_or_else(|| handle.clone()),
            handle,
            node,
            inputs: input_pins,
            outputs: output_pins,
            status: NodeStatus::Idle,
        });
        Ok(id)
    }

    /// Connect an output pin to an input pin.
    pub fn link(&mut self, from: PinId, to: PinId) -> PipelineResult<LinkId> {
        let Some(src) = self.pins.get(&from).copied() else {
            return malformed(format!("link {} -> {}: no pin {}", from, to, from));
        };
        let Some(dst) = self.pins.get(&to).copied() else {
            return malformed(format!("link {} -> {}: no pin {}", from, to, to));
        };
        if src.direction != PortDirection::Output {
            return malformed(format!("link {} -> {}: pin {} is an input", from, to, from));
        }
        if dst.direction != PortDirection::Input {
            return malformed(format!("link {} -> {}: pin {} is an output", from, to, to));
        }

        let src_kind = self.nodes[src.node.index()].outputs[src.index].kind;
        let input = &self.nodes[dst.node.index()].inputs[dst.index];
        if let Some(existing) = input.source {
            return malformed(format!(
                "link {} -> {}: input already linked from {}",
                from, to, existing
            ));
        }
        if src_kind != input.kind {
            return malformed(format!(
                "link {} -> {}: cannot connect {} to {}",
                from, to, src_kind, input.kind
            ));
        }

        let id = LinkId(self.links.len() as u32);
        self.nodes[dst.node.index()].inputs[dst.index].source = Some(from);
        self.nodes[src.node.index()].outputs[src.index].targets.push(to);
        self.links.push(Link {
            id,
            from,
            to,
            from_node: src.node,
            to_node: dst.node,
        });
        tracing::debug!("Added link {:?}: {} -> {}", id, from, to);
        Ok(id)
    }

    /// Validate the topology and produce the graph.
    pub fn build(self) -> PipelineResult<Graph> {
        let plan = PipelineCompiler::compile(&self.nodes, &self.links)?;

        tracing::info!(
            "Graph compiled: {} nodes, {} sources, {} sinks, {} links",
            plan.stats.total_nodes,
            plan.stats.source_nodes,
            plan.stats.sink_nodes,
            plan.stats.links,
        );
        for &idx in &plan.unreachable_nodes {
            tracing::warn!(
                "Node '{}' (idx {}) is disconnected from data sources",
                self.nodes[idx].handle,
                idx
            );
        }

        Ok(Graph {
            name: self.name,
            nodes: self.nodes,
            links: self.links,
            pins: self.pins,
            plan,
            finished: false,
        })
    }
}

fn port_counts(node: &AnyNode) -> (usize, usize) {
    let inputs = node
        .ports()
        .iter()
        .filter(|p| p.direction == PortDirection::Input)
        .count();
    (inputs, node.ports().len() - inputs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::node::BuiltinNode;
    use crate::pipeline::nodes::{
        EphemerisCollectorNode, GnssNavInfoMergeNode, RinexNavFileNode, SatelliteFilterNode,
    };

    fn source() -> AnyNode {
        AnyNode::Builtin(BuiltinNode::RinexNavFile(RinexNavFileNode::new("x.rnx")))
    }

    fn filter() -> AnyNode {
        AnyNode::Builtin(BuiltinNode::SatelliteFilter(SatelliteFilterNode::new()))
    }

    fn collector() -> AnyNode {
        AnyNode::Builtin(BuiltinNode::EphemerisCollector(
            EphemerisCollectorNode::new(),
        ))
    }

    #[test]
    fn test_find_output_pin() {
        let mut b = GraphBuilder::new();
        b.add_node_with_pins("gps", None, source(), &[], &[PinId(1), PinId(2)])
            .unwrap();
        let graph = b.build().unwrap();

        let pin = graph.find_output_pin(PinId(1)).unwrap();
        assert_eq!(pin.name, "GnssNavInfo");
        assert!(pin.value().is_none());
        assert!(matches!(
            graph.find_output_pin(PinId(99)),
            Err(PipelineError::PinNotFound(PinId(99)))
        ));
    }

    #[test]
    fn test_input_handle_is_not_an_output() {
        let mut b = GraphBuilder::new();
        b.add_node_with_pins("f", None, filter(), &[PinId(3)], &[PinId(4)])
            .unwrap();
        let graph = b.build().unwrap();
        assert!(graph.find_output_pin(PinId(3)).is_err());
        assert!(graph.find_input_pin(PinId(3)).is_ok());
    }

    #[test]
    fn test_auto_pins_do_not_collide() {
        let mut b = GraphBuilder::new();
        b.add_node_with_pins("gps", None, source(), &[], &[PinId(7), PinId(8)])
            .unwrap();
        b.add_node("f", filter()).unwrap();
        let graph = b.build().unwrap();
        let f = graph.node_by_handle("f").unwrap();
        assert_eq!(f.inputs[0].id, PinId(9));
        assert_eq!(f.outputs[0].id, PinId(10));
    }

    #[test]
    fn test_auto_pins_after_highest_handle() {
        let mut b = GraphBuilder::new();
        b.add_node_with_pins("gps", None, source(), &[], &[PinId(u32::MAX), PinId(1)])
            .unwrap();
        b.add_node("f", filter()).unwrap();
        let graph = b.build().unwrap();
        let f = graph.node_by_handle("f").unwrap();
        assert_eq!(f.inputs[0].id, PinId(2));
        assert_eq!(f.outputs[0].id, PinId(3));
    }

    #[test]
    fn test_duplicate_pin_and_handle() {
        let mut b = GraphBuilder::new();
        b.add_node_with_pins("a", None, source(), &[], &[PinId(1), PinId(2)])
            .unwrap();
        assert!(b
            .add_node_with_pins("b", None, source(), &[], &[PinId(2), PinId(3)])
            .is_err());
        assert!(b
            .add_node_with_pins("a", None, source(), &[], &[PinId(4), PinId(5)])
            .is_err());
        assert!(b
            .add_node_with_pins("c", None, source(), &[], &[PinId(6), PinId(6)])
            .is_err());
    }

    #[test]
    fn test_link_validation() {
        let mut b = GraphBuilder::new();
        b.add_node_with_pins("gps", None, source(), &[], &[PinId(1), PinId(2)])
            .unwrap();
        b.add_node_with_pins("f", None, filter(), &[PinId(3)], &[PinId(4)])
            .unwrap();
        b.add_node_with_pins("c", None, collector(), &[PinId(5)], &[PinId(6)])
            .unwrap();

        // NavInfo into an Ephemeris input
        assert!(b.link(PinId(1), PinId(3)).is_err());
        // Input as source, output as target, unknown pin
        assert!(b.link(PinId(3), PinId(5)).is_err());
        assert!(b.link(PinId(2), PinId(4)).is_err());
        assert!(b.link(PinId(2), PinId(42)).is_err());

        b.link(PinId(2), PinId(3)).unwrap();
        // Second link into the same input
        assert!(b.link(PinId(4), PinId(3)).is_err());
        // Fan-out is fine
        b.link(PinId(2), PinId(5)).unwrap();

        let graph = b.build().unwrap();
        assert_eq!(graph.links().len(), 2);
        assert_eq!(
            graph.find_output_pin(PinId(2)).unwrap().targets,
            vec![PinId(3), PinId(5)]
        );
    }

    #[test]
    fn test_cycle_is_rejected() {
        let mut b = GraphBuilder::new();
        let merge = || {
            AnyNode::Builtin(BuiltinNode::GnssNavInfoMerge(GnssNavInfoMergeNode::new(1)))
        };
        b.add_node_with_pins("m1", None, merge(), &[PinId(1)], &[PinId(2)])
            .unwrap();
        b.add_node_with_pins("m2", None, merge(), &[PinId(3)], &[PinId(4)])
            .unwrap();
        b.link(PinId(2), PinId(3)).unwrap();
        b.link(PinId(4), PinId(1)).unwrap();
        assert!(matches!(
            b.build(),
            Err(PipelineError::MalformedGraph(msg)) if msg.contains("cycle")
        ));
    }
}
