//! Pipeline-specific error types.

use crate::pipeline::id::PinId;
use thiserror::Error;

/// Errors that can occur while building or running a graph.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The graph description is structurally invalid.
    #[error("Malformed graph: {0}")]
    MalformedGraph(String),

    /// The run could not start (description unreadable, source file missing).
    #[error("Startup error: {0}")]
    Startup(String),

    #[error("No output pin with handle {0}")]
    PinNotFound(PinId),

    #[error("No node with handle '{0}'")]
    NodeNotFound(String),

    /// The graph has already been run to completion.
    #[error("Graph has already run")]
    AlreadyRun,

    /// The executor thread ended without reporting a result.
    #[error("Executor thread lost")]
    ExecutorLost,
}

pub type PipelineResult<T> = std::result::Result<T, PipelineError>;

/// Shorthand for a [`PipelineError::MalformedGraph`] result.
pub(crate) fn malformed<T>(message: impl Into<String>) -> PipelineResult<T> {
    Err(PipelineError::MalformedGraph(message.into()))
}
