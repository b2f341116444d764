//! Outcome of a graph run.

use crate::pipeline::id::NodeId;
use crate::pipeline::node::NodeStatus;
use std::fmt;
use std::time::Duration;

/// Final state of one node.
#[derive(Debug, Clone)]
pub struct NodeReport {
    pub node: NodeId,
    pub handle: String,
    pub label: String,
    /// Type name of the node
    pub kind: String,
    pub status: NodeStatus,
    pub records: u64,
    pub warnings: Vec<String>,
}

/// Summary handed to completion callbacks and returned by the executor.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub graph_name: Option<String>,
    /// One entry per node, in declaration order
    pub nodes: Vec<NodeReport>,
    pub elapsed: Duration,
}

impl RunReport {
    /// Whether any node ended in the failed state.
    pub fn has_failures(&self) -> bool {
        self.nodes.iter().any(|n| n.status.is_failed())
    }

    pub fn warning_count(&self) -> usize {
        self.nodes.iter().map(|n| n.warnings.len()).sum()
    }

    /// No failures and no warnings.
    pub fn is_clean(&self) -> bool {
        !self.has_failures() && self.warning_count() == 0
    }

    pub fn node(&self, handle: &str) -> Option<&NodeReport> {
        self.nodes.iter().find(|n| n.handle == handle)
    }

    pub fn failures(&self) -> impl Iterator<Item = &NodeReport> {
        self.nodes.iter().filter(|n| n.status.is_failed())
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "graph {} finished in {:.3}s",
            self.graph_name.as_deref().unwrap_or("<unnamed>"),
            self.elapsed.as_secs_f64()
        )?;
        for node in &self.nodes {
            write!(
                f,
                "  {:<16} {:<20} {:>8} records  {}",
                node.handle, node.kind, node.records, node.status
            )?;
            if !node.warnings.is_empty() {
                write!(f, "  ({} warnings)", node.warnings.len())?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
