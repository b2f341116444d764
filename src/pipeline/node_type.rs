//! Node type enumeration for dynamic node creation.
//!
//! This module defines the node types a graph description can instantiate
//! and the factory that builds them from their parameters.

use crate::pipeline::error::{PipelineError, PipelineResult};
use crate::pipeline::node::{AnyNode, BuiltinNode};
use crate::pipeline::nodes::{
    EphemerisCollectorNode, GnssNavInfoMergeNode, RinexNavFileNode, SatelliteFilterNode,
};
use crate::pipeline::params::NodeParams;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

/// Types of nodes that can be instantiated from a description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeType {
    // Source nodes
    /// Decodes a RINEX navigation file.
    RinexNavFile,

    // Transform nodes
    /// Passes ephemerides of selected satellites.
    SatelliteFilter,
    /// Aggregates an ephemeris stream into a store.
    EphemerisCollector,
    /// Merges several stores into one.
    GnssNavInfoMerge,
}

impl NodeType {
    /// Name used in graph descriptions.
    pub fn type_name(&self) -> &'static str {
        match self {
            NodeType::RinexNavFile => "RinexNavFile",
            NodeType::SatelliteFilter => "SatelliteFilter",
            NodeType::EphemerisCollector => "EphemerisCollector",
            NodeType::GnssNavInfoMerge => "GnssNavInfoMerge",
        }
    }

    /// Get all available node types.
    pub fn all() -> &'static [NodeType] {
        &[
            NodeType::RinexNavFile,
            NodeType::SatelliteFilter,
            NodeType::EphemerisCollector,
            NodeType::GnssNavInfoMerge,
        ]
    }

    /// Check if this node type is a source node.
    pub fn is_source(&self) -> bool {
        matches!(self, NodeType::RinexNavFile)
    }

    /// Get a detailed description of what this node does.
    pub fn description(&self) -> &'static str {
        match self {
            NodeType::RinexNavFile =>
                "Decodes a RINEX navigation file, one message per poll.\n\
                 Params: path (relative to the fixture root).\n\
                 Outputs: GnssNavInfo store, Ephemeris stream.",

            NodeType::SatelliteFilter =>
                "Filters an ephemeris stream by satellite.\n\
                 Params: constellations, satellites, invert.\n\
                 Empty lists pass everything through.",

            NodeType::EphemerisCollector =>
                "Collects an ephemeris stream into a store.\n\
                 Input: Ephemeris. Output: GnssNavInfo.",

            NodeType::GnssNavInfoMerge =>
                "Merges several stores into one.\n\
                 Params: inputs (default 2).\n\
                 Only new records are copied on each update.",
        }
    }
}

impl FromStr for NodeType {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NodeType::all()
            .iter()
            .copied()
            .find(|t| t.type_name() == s)
            .ok_or_else(|| PipelineError::MalformedGraph(format!("unknown node type '{}'", s)))
    }
}

impl std::fmt::Display for NodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.type_name())
    }
}

/// Factory for creating nodes from description parameters.
///
/// Relative source paths resolve against the fixture root.
#[derive(Debug, Clone, Default)]
pub struct NodeFactory {
    fixture_root: PathBuf,
}

impl NodeFactory {
    pub fn new(fixture_root: impl Into<PathBuf>) -> Self {
        Self {
            fixture_root: fixture_root.into(),
        }
    }

    /// Create a node based on the NodeType and its parameters.
    pub fn create(&self, node_type: NodeType, params: &NodeParams) -> PipelineResult<AnyNode> {
        let node = match node_type {
            NodeType::RinexNavFile => BuiltinNode::RinexNavFile(RinexNavFileNode::from_params(
                params,
                &self.fixture_root,
            )?),
            NodeType::SatelliteFilter => {
                BuiltinNode::SatelliteFilter(SatelliteFilterNode::from_params(params)?)
            }
            NodeType::EphemerisCollector => {
                params.expect_only(node_type.type_name(), &[])?;
                BuiltinNode::EphemerisCollector(EphemerisCollectorNode::new())
            }
            NodeType::GnssNavInfoMerge => {
                BuiltinNode::GnssNavInfoMerge(GnssNavInfoMergeNode::from_params(params)?)
            }
        };
        Ok(AnyNode::Builtin(node))
    }
}
