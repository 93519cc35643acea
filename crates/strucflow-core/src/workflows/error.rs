use crate::core::assertions::{AssertionError, SuccessTier};
use crate::core::turntable::TurntableError;
use crate::core::utils::identifiers::IdentifierError;
use crate::engine::error::EngineError;
use crate::tools::invoker::ToolError;
use thiserror::Error;

/// Broad classification of why a pipeline stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A required tool, input file, object or selection was missing.
    Precondition,
    /// An engine call did not reach partial success where that was required.
    PartialResult,
    /// An engine call did not reach full success where that was required.
    FullResult,
    /// An external tool failed or did not produce its expected output.
    ToolFailure,
    /// The engine transport or the filesystem failed.
    Environment,
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{0}")]
    Precondition(String),

    #[error(transparent)]
    Assertion(#[from] AssertionError),

    #[error("{message}")]
    ToolFailure { tool: String, message: String },

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Tool(#[from] ToolError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to use {label}: {source}")]
    Context {
        label: String,
        #[source]
        source: Box<PipelineError>,
    },
}

impl PipelineError {
    pub fn precondition(message: impl Into<String>) -> Self {
        PipelineError::Precondition(message.into())
    }

    pub fn tool_failure(tool: impl Into<String>, message: impl Into<String>) -> Self {
        PipelineError::ToolFailure {
            tool: tool.into(),
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::Precondition(_) => ErrorKind::Precondition,
            PipelineError::Assertion(e) => match e.required {
                SuccessTier::Full => ErrorKind::FullResult,
                SuccessTier::Partial => ErrorKind::PartialResult,
            },
            PipelineError::ToolFailure { .. } => ErrorKind::ToolFailure,
            PipelineError::Engine(_) | PipelineError::Io(_) => ErrorKind::Environment,
            PipelineError::Tool(ToolError::NotFound { .. }) => ErrorKind::Precondition,
            PipelineError::Tool(_) => ErrorKind::ToolFailure,
            PipelineError::Context { source, .. } => source.kind(),
        }
    }

    /// Prefixes the message with `Failed to use <label>: ` while keeping the kind.
    pub fn with_context(self, label: impl Into<String>) -> Self {
        PipelineError::Context {
            label: label.into(),
            source: Box::new(self),
        }
    }
}

impl From<TurntableError> for PipelineError {
    fn from(e: TurntableError) -> Self {
        PipelineError::Precondition(e.to_string())
    }
}

impl From<IdentifierError> for PipelineError {
    fn from(e: IdentifierError) -> Self {
        PipelineError::Precondition(e.to_string())
    }
}
