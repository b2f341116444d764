/// Compiled execution plan for a graph.
/// Holds every node in topological order plus the source/sink classification.
#[derive(Debug, Clone)]
pub struct CompiledPlan {
    /// Node indices in topological order
    pub order: Vec<usize>,

    /// Nodes without input ports, in topological order
    pub sources: Vec<usize>,

    /// Nodes without output ports
    pub sinks: Vec<usize>,

    /// Nodes that no source can reach
    pub unreachable_nodes: Vec<usize>,

    /// Compilation statistics
    pub stats: PlanStats,
}

/// Statistics about the compiled plan
#[derive(Debug, Clone, Default)]
pub struct PlanStats {
    /// Total number of nodes in the graph
    pub total_nodes: usize,

    /// Number of source nodes (no inputs)
    pub source_nodes: usize,

    /// Number of sink nodes (no outputs)
    pub sink_nodes: usize,

    /// Number of links
    pub links: usize,

    /// Number of nodes no source can reach
    pub unreachable_nodes: usize,

    /// Compilation time in microseconds
    pub compile_time_us: u64,
}

impl CompiledPlan {
    /// Create a new empty compiled plan
    pub fn new() -> Self {
        Self {
            order: Vec::new(),
            sources: Vec::new(),
            sinks: Vec::new(),
            unreachable_nodes: Vec::new(),
            stats: PlanStats::default(),
        }
    }

    /// Check if the plan has any nodes
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl Default for CompiledPlan {
    fn default() -> Self {
        Self::new()
    }
}
