//! Graph descriptions and their loader.
//!
//! A description is a JSON document:
//!
//! ```json
//! {
//!   "name": "gps",
//!   "nodes": [
//!     { "id": "gps", "type": "RinexNavFile",
//!       "params": { "path": "GPS.rnx" }, "outputs": [1, 2] },
//!     { "id": "keep", "type": "SatelliteFilter", "inputs": [3], "outputs": [4] }
//!   ],
//!   "links": [ { "from": 2, "to": 3 } ]
//! }
//! ```
//!
//! Pin lists are optional; omitted handles are assigned above the largest
//! handle declared anywhere in the description.

use crate::pipeline::error::{PipelineError, PipelineResult};
use crate::pipeline::graph::{Graph, GraphBuilder};
use crate::pipeline::id::{PinAllocator, PinId};
use crate::pipeline::node_type::{NodeFactory, NodeType};
use crate::pipeline::params::NodeParams;
use crate::pipeline::port::PortDirection;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GraphDescription {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub nodes: Vec<NodeDescription>,
    #[serde(default)]
    pub links: Vec<LinkDescription>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NodeDescription {
    /// Node handle, unique in the graph
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub params: NodeParams,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inputs: Option<Vec<PinId>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outputs: Option<Vec<PinId>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LinkDescription {
    pub from: PinId,
    pub to: PinId,
}

/// Builds graphs from descriptions.
#[derive(Debug, Clone, Default)]
pub struct GraphLoader {
    factory: NodeFactory,
}

impl GraphLoader {
    /// Loader resolving source paths against the working directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loader resolving source paths against `root`.
    pub fn with_fixture_root(root: impl Into<PathBuf>) -> Self {
        Self {
            factory: NodeFactory::new(root),
        }
    }

    /// Read, parse and build a description file.
    pub fn load_file(&self, path: impl AsRef<Path>) -> PipelineResult<Graph> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            PipelineError::Startup(format!("cannot read graph {}: {}", path.display(), e))
        })?;
        tracing::info!("Loading graph from {}", path.display());
        self.load_str(&text)
    }

    pub fn load_str(&self, json: &str) -> PipelineResult<Graph> {
        let description: GraphDescription = serde_json::from_str(json)
            .map_err(|e| PipelineError::Startup(format!("invalid graph description: {}", e)))?;
        self.build(&description)
    }

    /// Validate a description and build the graph.
    pub fn build(&self, description: &GraphDescription) -> PipelineResult<Graph> {
        let mut allocator = PinAllocator::new(
            description
                .nodes
                .iter()
                .flat_map(|n| n.inputs.iter().chain(n.outputs.iter()).flatten())
                .copied(),
        );

        let mut builder = GraphBuilder::new();
        if let Some(name) = &description.name {
            builder = builder.name(name.clone());
        }

        for desc in &description.nodes {
            let node_type: NodeType = desc.node_type.parse()?;
            let node = self
                .factory
                .create(node_type, &desc.params)
                .map_err(|e| match e {
                    PipelineError::MalformedGraph(msg) => {
                        PipelineError::MalformedGraph(format!("node '{}': {}", desc.id, msg))
                    }
                    other => other,
                })?;

            let n_in = node
                .ports()
                .iter()
                .filter(|p| p.direction == PortDirection::Input)
                .count();
            let n_out = node.ports().len() - n_in;
            let mut pins = |declared: &Option<Vec<PinId>>, count: usize| match declared {
                Some(pins) => Ok(pins.clone()),
                None => (0..count)
                    .map(|_| allocator.allocate())
                    .collect::<Option<Vec<_>>>()
                    .ok_or_else(|| {
                        PipelineError::MalformedGraph(format!(
                            "node '{}': pin handle space exhausted",
                            desc.id
                        ))
                    }),
            };
            let inputs = pins(&desc.inputs, n_in)?;
            let outputs = pins(&desc.outputs, n_out)?;

            builder.add_node_with_pins(
                desc.id.clone(),
                desc.label.clone(),
                node,
                &inputs,
                &outputs,
            )?;
        }

        for link in &description.links {
            builder.link(link.from, link.to)?;
        }

        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(json: &str) -> PipelineResult<Graph> {
        GraphLoader::new().load_str(json)
    }

    fn assert_malformed(json: &str, needle: &str) {
        match load(json) {
            Err(PipelineError::MalformedGraph(msg)) => {
                assert!(msg.contains(needle), "'{}' does not mention '{}'", msg, needle)
            }
            Err(other) => panic!("expected MalformedGraph, got {:?}", other),
            Ok(_) => panic!("expected MalformedGraph, graph was built"),
        }
    }

    #[test]
    fn test_load_with_auto_pins() {
        let graph = load(
            r#"{
                "name": "filtered",
                "nodes": [
                    { "id": "gps", "type": "RinexNavFile",
                      "params": { "path": "a.rnx" }, "outputs": [1, 2] },
                    { "id": "keep", "type": "SatelliteFilter",
                      "params": { "satellites": "G01" } },
                    { "id": "out", "type": "EphemerisCollector", "inputs": [7] }
                ],
                "links": [ { "from": 2, "to": 8 }, { "from": 9, "to": 7 } ]
            }"#,
        )
        .unwrap();

        assert_eq!(graph.name(), Some("filtered"));
        assert_eq!(graph.node_count(), 3);
        let keep = graph.node_by_handle("keep").unwrap();
        assert_eq!(keep.inputs[0].id, PinId(8));
        assert_eq!(keep.outputs[0].id, PinId(9));
        assert_eq!(graph.node_by_handle("out").unwrap().outputs[0].id, PinId(10));
        assert_eq!(graph.links().len(), 2);
    }

    #[test]
    fn test_auto_pins_next_to_max_handle() {
        let graph = load(
            r#"{
                "nodes": [
                    { "id": "a", "type": "RinexNavFile",
                      "params": { "path": "x.rnx" }, "outputs": [4294967295, 1] },
                    { "id": "c", "type": "EphemerisCollector" }
                ]
            }"#,
        )
        .unwrap();

        let c = graph.node_by_handle("c").unwrap();
        assert_eq!(c.inputs[0].id, PinId(2));
        assert_eq!(c.outputs[0].id, PinId(3));
        assert!(graph.find_output_pin(PinId(u32::MAX)).is_ok());
    }

    #[test]
    fn test_invalid_json_is_startup_error() {
        assert!(matches!(load("{ nodes: "), Err(PipelineError::Startup(_))));
        assert!(matches!(
            GraphLoader::new().load_file("/nonexistent/graph.flow"),
            Err(PipelineError::Startup(_))
        ));
    }

    #[test]
    fn test_malformed_variants() {
        assert_malformed(
            r#"{ "nodes": [ { "id": "a", "type": "Oscilloscope" } ] }"#,
            "unknown node type",
        );
        assert_malformed(
            r#"{ "nodes": [ { "id": "a", "type": "RinexNavFile" } ] }"#,
            "requires parameter 'path'",
        );
        assert_malformed(
            r#"{ "nodes": [
                { "id": "a", "type": "EphemerisCollector" },
                { "id": "a", "type": "EphemerisCollector" } ] }"#,
            "duplicate node handle",
        );
        assert_malformed(
            r#"{ "nodes": [
                { "id": "a", "type": "EphemerisCollector", "inputs": [1], "outputs": [2] },
                { "id": "b", "type": "EphemerisCollector", "inputs": [2], "outputs": [3] } ] }"#,
            "duplicate pin handle",
        );
        assert_malformed(
            r#"{ "nodes": [
                { "id": "a", "type": "EphemerisCollector", "inputs": [1, 2] } ] }"#,
            "declares 2 inputs",
        );
        assert_malformed(
            r#"{ "nodes": [
                { "id": "a", "type": "EphemerisCollector", "inputs": [1], "outputs": [2] } ],
              "links": [ { "from": 2, "to": 5 } ] }"#,
            "no pin 5",
        );
        assert_malformed(
            r#"{ "nodes": [
                { "id": "a", "type": "SatelliteFilter", "inputs": [1], "outputs": [2] },
                { "id": "b", "type": "EphemerisCollector", "inputs": [3], "outputs": [4] } ],
              "links": [ { "from": 2, "to": 4 } ] }"#,
            "is an output",
        );
        assert_malformed(
            r#"{ "nodes": [
                { "id": "a", "type": "EphemerisCollector", "inputs": [1], "outputs": [2] },
                { "id": "b", "type": "EphemerisCollector", "inputs": [3], "outputs": [4] } ],
              "links": [ { "from": 2, "to": 3 } ] }"#,
            "cannot connect GnssNavInfo to Ephemeris",
        );
        assert_malformed(
            r#"{ "nodes": [
                { "id": "a", "type": "SatelliteFilter", "inputs": [1], "outputs": [2] },
                { "id": "b", "type": "SatelliteFilter", "inputs": [3], "outputs": [4] } ],
              "links": [ { "from": 2, "to": 3 }, { "from": 4, "to": 1 } ] }"#,
            "cycle",
        );
        assert_malformed(
            r#"{ "nodes": [
                { "id": "a", "type": "SatelliteFilter", "params": { "invert": "yes" } } ] }"#,
            "node 'a'",
        );
    }

    #[test]
    fn test_description_serializes() {
        let description = GraphDescription {
            name: None,
            nodes: vec![NodeDescription {
                id: "merge".into(),
                node_type: "GnssNavInfoMerge".into(),
                label: None,
                params: NodeParams::default(),
                inputs: None,
                outputs: None,
            }],
            links: Vec::new(),
        };
        let json = serde_json::to_string(&description).unwrap();
        let back: GraphDescription = serde_json::from_str(&json).unwrap();
        assert_eq!(back, description);
        assert!(GraphLoader::new().build(&back).is_ok());
    }
}
