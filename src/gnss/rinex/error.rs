//! Decoder error and warning types.

use crate::gnss::types::SatId;
use std::fmt;
use thiserror::Error;

/// Errors that stop a decoder.
#[derive(Error, Debug)]
pub enum RinexError {
    /// Version or file type the decoder cannot read.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Malformed header at line {line}: {message}")]
    MalformedHeader { line: usize, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RinexError {
    /// Whether the error comes from the file content rather than from I/O.
    pub fn is_format_error(&self) -> bool {
        !matches!(self, RinexError::Io(_))
    }
}

/// A recoverable problem: the offending message (or header line) was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseWarning {
    /// 1-based line number where the skipped message starts
    pub line: usize,
    /// Satellite of the message, if the header line was readable
    pub sat: Option<SatId>,
    pub message: String,
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.sat {
            Some(sat) => write!(f, "line {} ({}): {}", self.line, sat, self.message),
            None => write!(f, "line {}: {}", self.line, self.message),
        }
    }
}
