//! Graph executor: activation, source polling and propagation.
//!
//! A run goes through three phases:
//! 1. Activate every node in topological order.
//! 2. Poll sources, earliest next record first or round-robin, draining the
//!    propagation queue after every poll so each record reaches all
//!    consumers before the next is decoded.
//! 3. Once every source reached end-of-stream, deactivate all nodes, mark the
//!    graph finished and notify the completion registry.

use crate::pipeline::completion::CompletionRegistry;
use crate::pipeline::error::{PipelineError, PipelineResult};
use crate::pipeline::graph::{Graph, NodeSlot};
use crate::pipeline::id::{NodeId, PinId};
use crate::pipeline::node::{AnyNode, NodeAction, NodeContext, NodeStatus, StreamEnd};
use crate::pipeline::pin::PinValue;
use crate::pipeline::report::{NodeReport, RunReport};
use crossbeam_channel::{Receiver, RecvTimeoutError};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// Order in which sources are polled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulePolicy {
    /// Poll the source whose next record has the earliest time of clock,
    /// so records from all files interleave in time order
    #[default]
    Chronological,
    /// Fixed turns of `records_per_turn` polls per source
    RoundRobin,
}

/// Scheduler tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub policy: SchedulePolicy,
    /// Polls granted to each source per round-robin turn
    pub records_per_turn: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            policy: SchedulePolicy::default(),
            records_per_turn: 1,
        }
    }
}

/// A completed run: the graph, now read-only, and its report.
pub struct FinishedRun {
    pub graph: Graph,
    pub report: RunReport,
}

/// Runs one graph to completion.
pub struct Executor {
    graph: Graph,
    config: SchedulerConfig,
    completion: CompletionRegistry,
}

/// Pending propagation: value for an input pin.
type Message = (PinId, PinValue);

impl Executor {
    pub fn new(graph: Graph) -> Self {
        Self {
            graph,
            config: SchedulerConfig::default(),
            completion: CompletionRegistry::new(),
        }
    }

    pub fn with_config(mut self, config: SchedulerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Register a callback invoked once when the run completes.
    pub fn on_completion<F>(&mut self, callback: F) -> &mut Self
    where
        F: FnOnce(&Graph, &RunReport) + Send + 'static,
    {
        self.completion.register(callback);
        self
    }

    /// Channel receiving the report when the run completes.
    pub fn completion_signal(&mut self) -> Receiver<RunReport> {
        self.completion.subscribe()
    }

    /// Run the graph on the calling thread.
    ///
    /// # Errors
    /// - `AlreadyRun` if the graph finished a previous run.
    /// - `Startup` (or the node's own error) if a node fails to activate; no
    ///   data is propagated and no completion callback fires.
    pub fn run(self) -> PipelineResult<FinishedRun> {
        let Executor {
            mut graph,
            config,
            completion,
        } = self;
        if graph.finished {
            return Err(PipelineError::AlreadyRun);
        }

        let start_time = Instant::now();
        let graph_name = graph.name.clone().unwrap_or_else(|| "<unnamed>".into());
        tracing::info!(
            "Graph '{}' starting: {} nodes, {} sources",
            graph_name,
            graph.nodes.len(),
            graph.plan.sources.len()
        );

        let mut queue = VecDeque::new();
        activate_all(&mut graph, &mut queue)?;
        drain(&mut graph, &mut queue);

        let active: Vec<usize> = graph
            .plan
            .sources
            .iter()
            .copied()
            .filter(|&idx| graph.nodes[idx].status == NodeStatus::Active)
            .collect();

        match config.policy {
            SchedulePolicy::Chronological => poll_chronological(&mut graph, &mut queue, active),
            SchedulePolicy::RoundRobin => {
                let per_turn = config.records_per_turn.max(1);
                poll_round_robin(&mut graph, &mut queue, active, per_turn)
            }
        }

        deactivate_all(&mut graph);
        graph.finished = true;

        let report = build_report(&graph, start_time.elapsed());
        tracing::info!(
            "Graph '{}' finished in {:.3}s: {} warnings{}",
            graph_name,
            report.elapsed.as_secs_f64(),
            report.warning_count(),
            if report.has_failures() {
                ", with failed nodes"
            } else {
                ""
            }
        );

        completion.fire(&graph, &report);
        Ok(FinishedRun { graph, report })
    }

    /// Run the graph on a dedicated thread.
    pub fn spawn(self) -> PipelineResult<RunHandle> {
        let (tx, rx) = crossbeam_channel::bounded(1);
        let thread = std::thread::Builder::new()
            .name("navflow-executor".into())
            .spawn(move || {
                let _ = tx.send(self.run());
            })
            .map_err(|e| PipelineError::Startup(format!("cannot spawn executor thread: {}", e)))?;
        Ok(RunHandle {
            rx,
            thread: Some(thread),
        })
    }
}

/// Handle to a run started with [`Executor::spawn`].
pub struct RunHandle {
    rx: Receiver<PipelineResult<FinishedRun>>,
    thread: Option<JoinHandle<()>>,
}

impl RunHandle {
    /// Block until the run ends.
    pub fn wait(mut self) -> PipelineResult<FinishedRun> {
        let result = self.rx.recv().map_err(|_| PipelineError::ExecutorLost);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
        result?
    }

    /// Block for at most `timeout`; `Ok(None)` if the run is still going.
    pub fn wait_timeout(&self, timeout: Duration) -> PipelineResult<Option<FinishedRun>> {
        match self.rx.recv_timeout(timeout) {
            Ok(result) => result.map(Some),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(PipelineError::ExecutorLost),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().map_or(true, |t| t.is_finished())
    }
}

fn with_context<T>(
    slot: &mut NodeSlot,
    idx: usize,
    f: impl FnOnce(&mut AnyNode, &mut NodeContext) -> T,
) -> T {
    let NodeSlot {
        node,
        handle,
        inputs,
        outputs,
        ..
    } = slot;
    let mut ctx = NodeContext {
        node: NodeId(idx as u32),
        handle: handle.as_str(),
        inputs: inputs.as_slice(),
        outputs: outputs.as_mut_slice(),
    };
    f(node, &mut ctx)
}

/// Poll source `idx` once and propagate what it wrote. Returns false once the
/// source reached end-of-stream.
fn poll_source(graph: &mut Graph, queue: &mut VecDeque<Message>, idx: usize) -> bool {
    let action = with_context(&mut graph.nodes[idx], idx, |node, ctx| node.poll_next(ctx));
    collect_outputs(&mut graph.nodes[idx], queue);
    drain(graph, queue);
    if let NodeAction::EndOfStream(end) = action {
        end_stream(&mut graph.nodes[idx], end);
        return false;
    }
    true
}

/// One record at a time from the source with the earliest next record.
/// Ties go to the source listed first; untimed sources come before timed ones.
fn poll_chronological(graph: &mut Graph, queue: &mut VecDeque<Message>, mut active: Vec<usize>) {
    while !active.is_empty() {
        let Some(pos) = active
            .iter()
            .enumerate()
            .map(|(pos, &idx)| {
                let next = graph.nodes[idx].node.next_epoch();
                (pos, next.map(|epoch| epoch.gps_time()))
            })
            .min_by_key(|&(_, time)| time)
            .map(|(pos, _)| pos)
        else {
            break;
        };
        if !poll_source(graph, queue, active[pos]) {
            active.remove(pos);
        }
    }
}

fn poll_round_robin(
    graph: &mut Graph,
    queue: &mut VecDeque<Message>,
    mut active: Vec<usize>,
    per_turn: usize,
) {
    while !active.is_empty() {
        for &idx in &active {
            for _ in 0..per_turn {
                if !poll_source(graph, queue, idx) {
                    break;
                }
            }
        }
        active.retain(|&idx| graph.nodes[idx].status == NodeStatus::Active);
    }
}

fn activate_all(graph: &mut Graph, queue: &mut VecDeque<Message>) -> PipelineResult<()> {
    let order = graph.plan.order.clone();
    for (pos, &idx) in order.iter().enumerate() {
        let slot = &mut graph.nodes[idx];
        slot.status = NodeStatus::Active;
        if let Err(e) = with_context(slot, idx, |node, ctx| node.on_activate(ctx)) {
            tracing::error!("Node '{}' failed to activate: {}", slot.handle, e);
            slot.status = NodeStatus::Failed(e.to_string());
            for &prev in &order[..pos] {
                let slot = &mut graph.nodes[prev];
                with_context(slot, prev, |node, ctx| node.on_deactivate(ctx));
                slot.status = NodeStatus::Idle;
            }
            return Err(match e {
                PipelineError::Startup(_) => e,
                other => PipelineError::Startup(other.to_string()),
            });
        }
    }
    // Writes made during activation propagate only once every node is active.
    for &idx in &order {
        collect_outputs(&mut graph.nodes[idx], queue);
    }
    Ok(())
}

fn deactivate_all(graph: &mut Graph) {
    let order = graph.plan.order.clone();
    for idx in order {
        let slot = &mut graph.nodes[idx];
        with_context(slot, idx, |node, ctx| node.on_deactivate(ctx));
        if !slot.status.is_failed() {
            slot.status = NodeStatus::Finished;
        }
    }
}

fn end_stream(slot: &mut NodeSlot, end: StreamEnd) {
    match end {
        StreamEnd::Exhausted => {
            tracing::debug!("Node '{}' exhausted", slot.handle);
            slot.status = NodeStatus::Finished;
        }
        StreamEnd::Failed(reason) => {
            tracing::warn!("Node '{}' failed: {}", slot.handle, reason);
            slot.status = NodeStatus::Failed(reason);
        }
    }
}

/// Enqueue one message per downstream link of every written output.
fn collect_outputs(slot: &mut NodeSlot, queue: &mut VecDeque<Message>) {
    for pin in &mut slot.outputs {
        if let Some(value) = pin.take_dirty() {
            for &target in &pin.targets {
                queue.push_back((target, value.clone()));
            }
        }
    }
}

fn drain(graph: &mut Graph, queue: &mut VecDeque<Message>) {
    while let Some((pin, value)) = queue.pop_front() {
        let Some(loc) = graph.location(pin) else {
            continue;
        };
        let idx = loc.node.index();
        let slot = &mut graph.nodes[idx];
        slot.inputs[loc.index].set(value);
        if slot.status != NodeStatus::Active {
            continue;
        }
        let action = with_context(slot, idx, |node, ctx| node.on_input_updated(loc.index, ctx));
        if let NodeAction::EndOfStream(end) = action {
            end_stream(slot, end);
        }
        collect_outputs(slot, queue);
    }
}

fn build_report(graph: &Graph, elapsed: Duration) -> RunReport {
    let nodes = graph
        .nodes()
        .map(|(id, slot)| {
            let stats = slot.node.stats();
            NodeReport {
                node: id,
                handle: slot.handle.clone(),
                label: slot.label.clone(),
                kind: slot.node.name().to_string(),
                status: slot.status.clone(),
                records: stats.records,
                warnings: stats.warnings,
            }
        })
        .collect();
    RunReport {
        graph_name: graph.name.clone(),
        nodes,
        elapsed,
    }
}
