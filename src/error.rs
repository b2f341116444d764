//! Error handling for navflow
//!
//! This module defines the crate-level error type and a Result alias. The
//! decoder and the pipeline keep their own error enums; both convert into
//! [`NavFlowError`].

use crate::gnss::rinex::RinexError;
use crate::pipeline::PipelineError;
use thiserror::Error;

/// Main error type for navflow operations
#[derive(Error, Debug)]
pub enum NavFlowError {
    /// Errors raised while decoding a navigation file
    #[error("RINEX error: {0}")]
    Rinex(#[from] RinexError),

    /// Errors raised while building or running a graph
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Errors related to configuration loading/saving
    #[error("Configuration error: {0}")]
    Config(String),

    /// Errors related to logger installation
    #[error("Logging error: {0}")]
    Logging(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<NavFlowError>,
    },
}

impl NavFlowError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        NavFlowError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    fn from_err(err: impl Into<NavFlowError>) -> Self {
        err.into()
    }
}

impl From<serde_json::Error> for NavFlowError {
    fn from(err: serde_json::Error) -> Self {
        NavFlowError::Serialization(err.to_string())
    }
}

/// Result type alias for navflow operations
pub type Result<T> = std::result::Result<T, NavFlowError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<NavFlowError>,
{
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| NavFlowError::from_err(e).with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| NavFlowError::from_err(e).with_context(f()))
    }
}
