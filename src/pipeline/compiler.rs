use super::compiled_plan::{CompiledPlan, PlanStats};
use super::error::{malformed, PipelineResult};
use super::graph::{Link, NodeSlot};
use std::collections::VecDeque;

/// Compiles a graph topology into an execution plan
pub struct PipelineCompiler;

impl PipelineCompiler {
    /// Compile a graph into an execution plan.
    ///
    /// Orders every node topologically, classifies sources and sinks by port
    /// structure and runs a forward reachability pass from the sources.
    ///
    /// # Errors
    /// `MalformedGraph` if the links form a cycle.
    pub fn compile(nodes: &[NodeSlot], links: &[Link]) -> PipelineResult<CompiledPlan> {
        let start_time = std::time::Instant::now();

        let n = nodes.len();
        if n == 0 {
            return Ok(CompiledPlan::new());
        }

        let fwd_adj = Self::build_adjacency(n, links);

        let order = Self::topological_sort(&fwd_adj)?;

        // Sources are polled in topological order so their first writes reach
        // downstream nodes in a stable sequence.
        let sources: Vec<usize> = order
            .iter()
            .copied()
            .filter(|&idx| nodes[idx].is_source())
            .collect();

        let sinks: Vec<usize> = (0..n).filter(|&idx| nodes[idx].is_sink()).collect();

        let fwd_reachable = Self::forward_reachability(&sources, &fwd_adj, n);
        let unreachable_nodes: Vec<usize> = (0..n).filter(|&idx| !fwd_reachable[idx]).collect();

        let stats = PlanStats {
            total_nodes: n,
            source_nodes: sources.len(),
            sink_nodes: sinks.len(),
            links: links.len(),
            unreachable_nodes: unreachable_nodes.len(),
            compile_time_us: start_time.elapsed().as_micros() as u64,
        };

        Ok(CompiledPlan {
            order,
            sources,
            sinks,
            unreachable_nodes,
            stats,
        })
    }

    /// Build the forward adjacency list
    fn build_adjacency(n: usize, links: &[Link]) -> Vec<Vec<usize>> {
        let mut fwd_adj = vec![Vec::new(); n];
        for link in links {
            let from = link.from_node.index();
            let to = link.to_node.index();
            if from < n && to < n {
                fwd_adj[from].push(to);
            }
        }
        fwd_adj
    }

    /// Perform forward reachability analysis from sources using DFS
    fn forward_reachability(sources: &[usize], fwd_adj: &[Vec<usize>], n: usize) -> Vec<bool> {
        let mut reachable = vec![false; n];
        let mut stack = Vec::new();

        for &src in sources {
            reachable[src] = true;
            stack.push(src);
        }

        while let Some(node) = stack.pop() {
            for &neighbor in &fwd_adj[node] {
                if !reachable[neighbor] {
                    reachable[neighbor] = true;
                    stack.push(neighbor);
                }
            }
        }

        reachable
    }

    /// Topological sort using Kahn's algorithm
    fn topological_sort(fwd_adj: &[Vec<usize>]) -> PipelineResult<Vec<usize>> {
        let n = fwd_adj.len();
        let mut in_degree = vec![0usize; n];
        for targets in fwd_adj {
            for &to in targets {
                in_degree[to] += 1;
            }
        }

        let mut queue: VecDeque<usize> = (0..n).filter(|&i| in_degree[i] == 0).collect();
        let mut result = Vec::with_capacity(n);

        while let Some(node) = queue.pop_front() {
            result.push(node);
            for &neighbor in &fwd_adj[node] {
                in_degree[neighbor] -= 1;
                if in_degree[neighbor] == 0 {
                    queue.push_back(neighbor);
                }
            }
        }

        if result.len() != n {
            let stuck: Vec<usize> = (0..n).filter(|&i| in_degree[i] > 0).collect();
            return malformed(format!("links form a cycle through nodes {:?}", stuck));
        }
        Ok(result)
    }
}
