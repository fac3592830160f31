use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("invalid line range [{start}, {end}] for document of {line_count} lines")]
    Range {
        start: usize,
        end: usize,
        line_count: usize,
    },

    #[error("insertion target line {target} is beyond the append position {append_line}")]
    OutOfRange { target: usize, append_line: usize },

    #[error("invalid operation: {reason}")]
    InvalidOperation { reason: String },

    #[error("invalid pattern '{pattern}': {message}")]
    Pattern { pattern: String, message: String },
}

impl EngineError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        EngineError::InvalidOperation {
            reason: reason.into(),
        }
    }
}

/// An engine failure tagged with the batch index of the offending operation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("operation at index {index}: {source}")]
pub struct BatchError {
    pub index: usize,
    #[source]
    pub source: EngineError,
}

impl BatchError {
    pub fn new(index: usize, source: EngineError) -> Self {
        Self { index, source }
    }

    pub fn kind(&self) -> &EngineError {
        &self.source
    }
}
