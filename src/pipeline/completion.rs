//! Completion notification.
//!
//! Callbacks and channel subscribers registered before a run are notified
//! exactly once, after every node has been deactivated. Firing consumes the
//! registry, so a second notification is impossible by construction.

use crate::pipeline::graph::Graph;
use crate::pipeline::report::RunReport;
use crossbeam_channel::{Receiver, Sender};

/// A callback invoked with the finished graph and its report.
pub type CompletionCallback = Box<dyn FnOnce(&Graph, &RunReport) + Send + 'static>;

#[derive(Default)]
pub struct CompletionRegistry {
    callbacks: Vec<CompletionCallback>,
    signals: Vec<Sender<RunReport>>,
}

impl CompletionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback. Callbacks fire in registration order.
    pub fn register<F>(&mut self, callback: F)
    where
        F: FnOnce(&Graph, &RunReport) + Send + 'static,
    {
        self.callbacks.push(Box::new(callback));
    }

    /// Receiver that gets a copy of the report on completion.
    pub fn subscribe(&mut self) -> Receiver<RunReport> {
        let (tx, rx) = crossbeam_channel::bounded(1);
        self.signals.push(tx);
        rx
    }

    pub fn len(&self) -> usize {
        self.callbacks.len() + self.signals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Notify everyone. Dropped receivers are ignored.
    pub(crate) fn fire(self, graph: &Graph, report: &RunReport) {
        tracing::debug!(
            "Firing {} completion callbacks, {} signals",
            self.callbacks.len(),
            self.signals.len()
        );
        for callback in self.callbacks {
            callback(graph, report);
        }
        for signal in self.signals {
            let _ = signal.try_send(report.clone());
        }
    }
}

impl std::fmt::Debug for CompletionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionRegistry")
            .field("callbacks", &self.callbacks.len())
            .field("signals", &self.signals.len())
            .finish()
    }
}
